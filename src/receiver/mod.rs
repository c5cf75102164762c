use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::Path;
use std::thread;

use log::{debug, error, info};

use crate::segment::{Segment, MAX_DATA_SIZE, MAX_PACKET_SIZE};
use crate::{Error, DEFAULT_RWND};

mod fault;
mod reassembly;

pub use fault::*;
pub use reassembly::*;

/* Downloaded files land under this directory when the client binary picks
   the destination. */
pub const CLIENT_FILE_PATH: &str = "client_files";

const NOT_FOUND_REPLY: &[u8] = b"FILE NOT FOUND";

/* Slot index for an incoming segment, relative to the flush point. The gap
   is negative for a segment from before the flush point (only a
   retransmitted fin reaches this computation that way); floor division maps
   a short fin back onto its own slot instead of a fresh one. */
fn slot_index(last_in_order: i64, expected_seq: u32, seq: u32) -> i64 {
    let gap = (i64::from(seq) - i64::from(expected_seq)).div_euclid(MAX_DATA_SIZE as i64);
    last_in_order + 1 + gap
}

pub struct Receiver {
    socket: UdpSocket,
    server: SocketAddr,
    rwnd: u64,
    fault: FaultInjector,
    packet: [u8; MAX_PACKET_SIZE],
}

impl Receiver {
    /* An rwnd of zero means "use the default". */
    pub fn connect(host: &str, port: u16, rwnd: u64, fault: FaultInjector) -> Result<Self, Error> {
        let server = (host, port)
            .to_socket_addrs()
            .map_err(Error::SocketSetup)?
            .next()
            .ok_or_else(|| {
                Error::SocketSetup(io::Error::new(io::ErrorKind::NotFound, "no such host"))
            })?;
        let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(Error::SocketSetup)?;

        Ok(Receiver {
            socket,
            server,
            rwnd: if rwnd == 0 { DEFAULT_RWND } else { rwnd },
            fault,
            packet: [0; MAX_PACKET_SIZE],
        })
    }

    /*
    Request file_name and reassemble the reply into dest. The request
    datagram is the bare file name; everything after that is segments in,
    cumulative acks out, until the fin segment arrives with no holes in
    front of it.
    */
    pub fn fetch(&mut self, file_name: &str, dest: &Path) -> Result<(), Error> {
        self.socket.send_to(file_name.as_bytes(), self.server)?;
        info!("Requested {:?} from {}", file_name, self.server);

        let mut buffer = ReassemblyBuffer::new();
        // Created lazily so a FILE NOT FOUND reply leaves no file behind.
        let mut out: Option<BufWriter<File>> = None;
        let mut buf = [0u8; MAX_PACKET_SIZE];

        loop {
            let (n, _) = self.socket.recv_from(&mut buf)?;
            let datagram = &buf[..n];

            if datagram.starts_with(NOT_FOUND_REPLY) {
                error!("Server has no file named {:?}", file_name);
                return Err(Error::FileNotFound(file_name.to_owned()));
            }

            let segment = match Segment::decode(datagram) {
                Ok(segment) => segment,
                Err(err) => {
                    debug!("Dropping malformed datagram: {}", err);
                    continue;
                }
            };

            if self.fault.should_drop() {
                debug!("Fault injection: dropping seq {}", segment.seq);
                continue;
            }
            if let Some(delay) = self.fault.delay() {
                debug!("Fault injection: holding seq {} for {:?}", segment.seq, delay);
                thread::sleep(delay);
            }

            let expected_seq = buffer.expected_seq();

            // A segment from before the flush point only needs its ack
            // again; a retransmitted fin falls through to the insert path.
            if expected_seq > segment.seq && !segment.fin_flag {
                debug!("Stale seq {}, expecting {}", segment.seq, expected_seq);
                self.send_ack(expected_seq)?;
                continue;
            }

            let index = slot_index(buffer.last_in_order, expected_seq, segment.seq);
            if index < 0 {
                self.send_ack(expected_seq)?;
                continue;
            }
            if index - buffer.last_in_order > self.rwnd as i64 {
                debug!("Receive window full, dropping seq {}", segment.seq);
                continue;
            }

            if segment.fin_flag {
                debug!("Fin received, seq {}", segment.seq);
                buffer.fin_received = true;
            }

            debug!("Packet received: seq {} -> slot {}", segment.seq, index);
            buffer.insert(index, segment);

            if out.is_none() {
                out = Some(BufWriter::new(File::create(dest)?));
            }
            buffer.flush(out.as_mut().unwrap())?;

            self.send_ack(buffer.expected_seq())?;

            if buffer.complete() {
                break;
            }
        }

        if let Some(mut writer) = out {
            writer.flush()?;
        }
        info!(
            "Transfer complete: {} segments into {}",
            buffer.last_received + 1,
            dest.display()
        );

        Ok(())
    }

    fn send_ack(&mut self, ack_number: u32) -> Result<(), Error> {
        debug!("Sending ack {}", ack_number);
        Segment::ack(ack_number).encode(&mut self.packet);
        self.socket.send_to(&self.packet, self.server)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::INITIAL_SEQ_NUMBER;

    #[test]
    fn first_segment_lands_in_slot_zero() {
        assert_eq!(slot_index(-1, INITIAL_SEQ_NUMBER, INITIAL_SEQ_NUMBER), 0);
    }

    #[test]
    fn a_gap_maps_to_the_matching_slot() {
        // Two segments in flight beyond the expected one.
        let seq = INITIAL_SEQ_NUMBER + 2 * MAX_DATA_SIZE as u32;
        assert_eq!(slot_index(-1, INITIAL_SEQ_NUMBER, seq), 2);

        // Same gap later in the transfer.
        let expected = INITIAL_SEQ_NUMBER + 5 * MAX_DATA_SIZE as u32;
        assert_eq!(slot_index(4, expected, expected), 5);
        assert_eq!(
            slot_index(4, expected, expected + MAX_DATA_SIZE as u32),
            6
        );
    }

    #[test]
    fn a_retransmitted_fin_maps_back_onto_its_old_slot() {
        // Full-size fin for slot 1 arriving again after both slots flushed.
        let expected = INITIAL_SEQ_NUMBER + 2 * MAX_DATA_SIZE as u32;
        let fin_seq = INITIAL_SEQ_NUMBER + MAX_DATA_SIZE as u32;
        assert_eq!(slot_index(1, expected, fin_seq), 1);

        // Short fin: the gap is a fraction of a segment, which still may
        // not spill into a fresh slot.
        let fin_seq = INITIAL_SEQ_NUMBER + MAX_DATA_SIZE as u32;
        let expected = fin_seq + 100;
        assert_eq!(slot_index(1, expected, fin_seq), 1);
    }
}
