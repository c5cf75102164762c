use std::cmp;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::net::{SocketAddr, UdpSocket};
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use log::{debug, info};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};

use crate::segment::{Segment, INITIAL_SEQ_NUMBER, MAX_DATA_SIZE, MAX_PACKET_SIZE};
use crate::{Error, DEFAULT_RWND};

mod congestion;
mod rtt;
mod stats;
mod window;

pub use congestion::*;
pub use rtt::*;
pub use stats::*;
pub use window::*;

pub fn bind(port: u16) -> Result<UdpSocket, Error> {
    UdpSocket::bind(("127.0.0.1", port)).map_err(Error::SocketSetup)
}

/* One request per server run. The whole payload of the first datagram is
   the file name; the peer address is kept for the rest of the transfer. */
pub fn get_request(socket: &UdpSocket) -> Result<(String, SocketAddr), Error> {
    let mut buf = [0u8; MAX_PACKET_SIZE];
    let (n, peer) = socket.recv_from(&mut buf)?;

    let file_name = String::from_utf8_lossy(&buf[..n]).into_owned();
    info!("Request received for {:?} from {}", file_name, peer);

    Ok((file_name, peer))
}

/* The open-failure reply carries no header, just the bare token. */
pub fn send_error(socket: &UdpSocket, peer: SocketAddr) -> Result<(), Error> {
    socket.send_to(b"FILE NOT FOUND", peer)?;
    Ok(())
}

pub struct Sender {
    socket: UdpSocket,
    peer: SocketAddr,
    file: File,
    file_length: u64,
    start_byte: u64,
    rwnd: u64,
    window: SlidingWindow,
    congestion: Congestion,
    rtt: RttEstimator,
    stats: PacketStats,
    packet: [u8; MAX_PACKET_SIZE],
}

impl Sender {
    pub fn new(
        socket: UdpSocket,
        peer: SocketAddr,
        mut file: File,
        rwnd: u64,
    ) -> Result<Self, Error> {
        let file_length = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        Ok(Sender {
            socket,
            peer,
            file,
            file_length,
            start_byte: 0,
            rwnd: if rwnd == 0 { DEFAULT_RWND } else { rwnd },
            window: SlidingWindow::new(),
            congestion: Congestion::new(),
            rtt: RttEstimator::new(),
            stats: PacketStats::new(),
            packet: [0; MAX_PACKET_SIZE],
        })
    }

    /*
    The transfer alternates between a windowed send burst and a single wait
    on the socket: readable processes exactly one ack, a timeout fires the
    retransmission path. New data goes out again only once the whole
    in-flight window has drained or a timeout has cut it down.
    */
    pub fn run(&mut self) -> Result<PacketStats, Error> {
        let started = Instant::now();
        info!(
            "Starting the file transfer: {} bytes to {}",
            self.file_length, self.peer
        );

        while !self.done() {
            self.send_burst()?;

            loop {
                let rto = self.rtt.rto();

                if self.wait_readable(rto)? {
                    self.process_one_ack()?;
                    self.congestion.maybe_leave_slow_start();

                    if self.window.drained() {
                        self.congestion.on_window_drained();
                        break;
                    }
                } else {
                    debug!("Ack wait timed out after {:?}", rto);
                    self.congestion.on_timeout();
                    self.retransmit_unacked()?;
                    break;
                }
            }
        }

        self.stats.log_summary(started.elapsed());
        Ok(self.stats.clone())
    }

    fn done(&self) -> bool {
        !self.has_unsent_data() && self.window.drained()
    }

    fn has_unsent_data(&self) -> bool {
        // An empty file still owes the receiver its lone fin segment.
        self.start_byte < self.file_length || (self.file_length == 0 && self.window.is_empty())
    }

    /* Both the in-flight count and the per-burst count are capped by
       min(rwnd, cwnd). */
    fn send_burst(&mut self) -> Result<(), Error> {
        let limit = cmp::min(self.rwnd, self.congestion.cwnd) as i64;
        let mut sent_count = 1i64;

        debug!(
            "Send burst: rwnd {} cwnd {} in flight {}",
            self.rwnd,
            self.congestion.cwnd,
            self.window.in_flight()
        );

        while self.window.in_flight() <= limit && sent_count <= limit && self.has_unsent_data() {
            self.send_new_segment()?;
            self.stats.record_send(self.congestion.phase);

            self.start_byte += MAX_DATA_SIZE as u64;
            sent_count += 1;
        }

        Ok(())
    }

    /* The partition is fixed at first transmission: every entry covers
       MAX_DATA_SIZE bytes of file except the last. */
    fn send_new_segment(&mut self) -> Result<(), Error> {
        let remaining = self.file_length - self.start_byte;
        let data_length = cmp::min(remaining, MAX_DATA_SIZE as u64) as usize;
        let fin_flag = remaining <= MAX_DATA_SIZE as u64;

        let index = self.window.append(WindowEntry {
            first_byte: self.start_byte,
            data_length,
            seq_num: INITIAL_SEQ_NUMBER + self.start_byte as u32,
            time_sent: Instant::now(),
        });
        self.window.last_packet_sent = index;

        self.read_file_and_send(self.start_byte, data_length, fin_flag)
    }

    /* Payload bytes never live in the window; every (re)transmission reads
       them back out of the file. */
    fn read_file_and_send(
        &mut self,
        first_byte: u64,
        data_length: usize,
        fin_flag: bool,
    ) -> Result<(), Error> {
        let mut payload = vec![0u8; data_length];
        self.file.seek(SeekFrom::Start(first_byte))?;
        self.file.read_exact(&mut payload)?;

        let seq = INITIAL_SEQ_NUMBER + first_byte as u32;
        Segment::data(seq, fin_flag, payload).encode(&mut self.packet);
        self.socket.send_to(&self.packet, self.peer)?;

        debug!("Packet sent: seq {} len {} fin {}", seq, data_length, fin_flag);
        Ok(())
    }

    fn wait_readable(&self, timeout: Duration) -> Result<bool, Error> {
        let mut fds = [PollFd::new(self.socket.as_raw_fd(), PollFlags::POLLIN)];
        let millis = cmp::max(1, (timeout.as_micros() as i64 + 999) / 1000);

        loop {
            match poll(&mut fds, millis as i32) {
                Ok(n) => return Ok(n > 0),
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(io::Error::from_raw_os_error(errno as i32).into()),
            }
        }
    }

    fn process_one_ack(&mut self) -> Result<(), Error> {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let (n, _) = self.socket.recv_from(&mut buf)?;

        let segment = match Segment::decode(&buf[..n]) {
            Ok(segment) => segment,
            Err(err) => {
                debug!("Dropping malformed datagram: {}", err);
                return Ok(());
            }
        };
        if !segment.ack_flag {
            return Ok(());
        }

        let ack = i64::from(segment.ack);

        if ack == self.window.send_base {
            self.window.dup_ack += 1;
            debug!("Dup ack {} for {}", self.window.dup_ack, segment.ack);

            if self.window.dup_ack == 3 {
                self.fast_retransmit(segment.ack)?;
            }
        } else if ack > self.window.send_base {
            self.congestion.on_new_ack();
            self.window.dup_ack = 0;
            self.window.send_base = ack;
            self.advance_acked(segment.ack);
        }
        // Anything below send_base is stale and ignored.

        Ok(())
    }

    /* Cumulative ack: retire every entry whose last byte sits below the ack
       number, then take one RTT sample from the newest retired entry. */
    fn advance_acked(&mut self, ack: u32) {
        let before = self.window.last_acked_packet;

        while self.window.last_acked_packet < self.window.last_packet_sent
            && self.window.get(self.window.last_acked_packet + 1).end() <= ack
        {
            self.window.last_acked_packet += 1;
        }

        if self.window.last_acked_packet > before {
            let entry = self.window.get(self.window.last_acked_packet);
            self.rtt.sample(entry.time_sent.elapsed());
            debug!(
                "Ack {} retired entries up to {}, rto now {:?}",
                ack,
                self.window.last_acked_packet,
                self.rtt.rto()
            );
        }
    }

    /* Third duplicate ack: resend the hole at send_base without waiting for
       the timer. */
    fn fast_retransmit(&mut self, ack: u32) -> Result<(), Error> {
        self.window.dup_ack = 0;

        if ack < INITIAL_SEQ_NUMBER {
            return Ok(());
        }
        let first_byte = u64::from(ack - INITIAL_SEQ_NUMBER);
        let index = (first_byte / MAX_DATA_SIZE as u64) as i64;
        if index > self.window.last_packet_sent {
            return Ok(());
        }

        info!("Fast retransmit: seq {}", ack);
        self.retransmit_entry(index)?;
        self.stats.retransmits += 1;
        self.congestion.on_triple_dup_ack();

        Ok(())
    }

    fn retransmit_entry(&mut self, index: i64) -> Result<(), Error> {
        self.window.update_time(index, Instant::now());

        let entry = *self.window.get(index);
        let fin_flag = entry.first_byte + entry.data_length as u64 >= self.file_length;

        self.read_file_and_send(entry.first_byte, entry.data_length, fin_flag)
    }

    /* Timeout path: every in-flight entry goes out again with a fresh send
       time. */
    fn retransmit_unacked(&mut self) -> Result<(), Error> {
        for index in (self.window.last_acked_packet + 1)..=self.window.last_packet_sent {
            debug!("Timeout retransmit: seq {}", self.window.get(index).seq_num);
            self.retransmit_entry(index)?;
            self.stats.retransmits += 1;
        }

        Ok(())
    }
}
