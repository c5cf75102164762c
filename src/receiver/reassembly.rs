use std::io::Write;

use crate::segment::{Segment, INITIAL_SEQ_NUMBER};
use crate::Error;

/*
Out-of-order segments parked by slot index until the hole before them fills.
Slot i holds the segment covering bytes [i * MAX_DATA_SIZE, ...) of the
file; a missing slot is None. Slots are kept after flushing because the
cumulative ack is derived from the last in-order segment's seq and length.
*/
#[derive(Debug)]
pub struct ReassemblyBuffer {
    slots: Vec<Option<Segment>>,
    pub last_in_order: i64,
    pub last_received: i64,
    pub fin_received: bool,
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        ReassemblyBuffer {
            slots: Vec::new(),
            last_in_order: -1,
            last_received: -1,
            fin_received: false,
        }
    }

    /* Next in-order sequence number, which doubles as the cumulative ack
       value. */
    pub fn expected_seq(&self) -> u32 {
        if self.last_in_order == -1 {
            INITIAL_SEQ_NUMBER
        } else {
            self.slots[self.last_in_order as usize].as_ref().unwrap().end()
        }
    }

    /* Holes between the old high mark and the new slot pad out as None. An
       occupied slot is simply overwritten; duplicates carry the same
       bytes. */
    pub fn insert(&mut self, index: i64, segment: Segment) {
        let index = index as usize;

        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        if index as i64 > self.last_received {
            self.last_received = index as i64;
        }

        self.slots[index] = Some(segment);
    }

    /* Append every contiguous segment past the flush point, strictly in
       slot order. */
    pub fn flush(&mut self, out: &mut impl Write) -> Result<(), Error> {
        while let Some(Some(segment)) = self.slots.get((self.last_in_order + 1) as usize) {
            out.write_all(&segment.payload)?;
            self.last_in_order += 1;
        }

        Ok(())
    }

    pub fn complete(&self) -> bool {
        self.fin_received && self.last_in_order == self.last_received
    }
}
