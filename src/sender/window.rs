use std::time::Instant;

/* Bookkeeping for one transmitted segment. The payload itself is never
   stored here; retransmissions re-read it from the file. */
#[derive(Debug, Clone, Copy)]
pub struct WindowEntry {
    pub first_byte: u64,
    pub data_length: usize,
    pub seq_num: u32,
    pub time_sent: Instant,
}

impl WindowEntry {
    /* First sequence number past this entry. A cumulative ack at or above
       this value retires the entry. */
    pub fn end(&self) -> u32 {
        self.seq_num + self.data_length as u32
    }
}

/*
Grow-only store of everything ever put on the wire. Entries are appended in
first-transmission order and never removed, so an entry's index is stable
for the whole transfer and entry[i].first_byte == i * MAX_DATA_SIZE.

The -1 sentinels mirror the cumulative-ack state machine: nothing sent and
nothing acked look the same as "index before the first entry".
*/
#[derive(Debug)]
pub struct SlidingWindow {
    entries: Vec<WindowEntry>,
    pub last_packet_sent: i64,
    pub last_acked_packet: i64,
    pub send_base: i64,
    pub dup_ack: u32,
}

impl SlidingWindow {
    pub fn new() -> Self {
        SlidingWindow {
            entries: Vec::new(),
            last_packet_sent: -1,
            last_acked_packet: -1,
            send_base: -1,
            dup_ack: 0,
        }
    }

    pub fn append(&mut self, entry: WindowEntry) -> i64 {
        self.entries.push(entry);
        (self.entries.len() - 1) as i64
    }

    pub fn get(&self, index: i64) -> &WindowEntry {
        &self.entries[index as usize]
    }

    pub fn update_time(&mut self, index: i64, now: Instant) {
        self.entries[index as usize].time_sent = now;
    }

    pub fn in_flight(&self) -> i64 {
        self.last_packet_sent - self.last_acked_packet
    }

    pub fn drained(&self) -> bool {
        self.last_acked_packet == self.last_packet_sent
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{INITIAL_SEQ_NUMBER, MAX_DATA_SIZE};
    use std::time::Duration;

    fn entry(index: u64, data_length: usize, time_sent: Instant) -> WindowEntry {
        let first_byte = index * MAX_DATA_SIZE as u64;
        WindowEntry {
            first_byte,
            data_length,
            seq_num: INITIAL_SEQ_NUMBER + first_byte as u32,
            time_sent,
        }
    }

    #[test]
    fn append_returns_stable_indices() {
        let now = Instant::now();
        let mut window = SlidingWindow::new();

        assert_eq!(window.append(entry(0, MAX_DATA_SIZE, now)), 0);
        assert_eq!(window.append(entry(1, MAX_DATA_SIZE, now)), 1);
        assert_eq!(window.append(entry(2, 100, now)), 2);

        for i in 0..3 {
            assert_eq!(window.get(i).first_byte, i as u64 * MAX_DATA_SIZE as u64);
        }
        assert_eq!(window.get(2).end(), INITIAL_SEQ_NUMBER + 2 * 1460 + 100);
    }

    #[test]
    fn update_time_refreshes_a_retransmitted_entry() {
        let first = Instant::now();
        let mut window = SlidingWindow::new();
        window.append(entry(0, MAX_DATA_SIZE, first));

        let again = first + Duration::from_millis(40);
        window.update_time(0, again);

        assert_eq!(window.get(0).time_sent, again);
    }

    #[test]
    fn fresh_window_is_drained_with_nothing_in_flight() {
        let window = SlidingWindow::new();

        assert!(window.is_empty());
        assert!(window.drained());
        assert_eq!(window.in_flight(), 0);
        assert_eq!(window.send_base, -1);
    }
}
