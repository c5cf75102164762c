use crate::Error;

/* Every datagram on the wire is exactly this many bytes. */
pub const MAX_PACKET_SIZE: usize = 1472;
/* Payload bytes that fit behind the header. */
pub const MAX_DATA_SIZE: usize = 1460;
pub const HEADER_LEN: usize = 12;

/* Sequence numbers are byte offsets into the file, shifted by this value. */
pub const INITIAL_SEQ_NUMBER: u32 = 67;

/*
Fixed 12-byte header, all integers little-endian:

     0              4              8      9      10         12
     +--------------+--------------+------+------+----------+-----------
     |     seq      |     ack      | ackf | finf |  length  |  payload
     +--------------+--------------+------+------+----------+-----------

A data segment carries a nonzero length (the FIN may be short, or empty for
an empty file) and no ack flag. A pure ack carries seq = 0, length = 0 and
the ack flag.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub seq: u32,
    pub ack: u32,
    pub ack_flag: bool,
    pub fin_flag: bool,
    pub payload: Vec<u8>,
}

impl Segment {
    pub fn data(seq: u32, fin_flag: bool, payload: Vec<u8>) -> Self {
        Segment {
            seq,
            ack: 0,
            ack_flag: false,
            fin_flag,
            payload,
        }
    }

    pub fn ack(ack: u32) -> Self {
        Segment {
            seq: 0,
            ack,
            ack_flag: true,
            fin_flag: false,
            payload: Vec::new(),
        }
    }

    /* First sequence number past this segment's payload. */
    pub fn end(&self) -> u32 {
        self.seq + self.payload.len() as u32
    }

    /* The packet buffer is caller-owned scratch; whatever sits past the
       payload goes out as zero filler and must be ignored by the peer. */
    pub fn encode(&self, packet: &mut [u8; MAX_PACKET_SIZE]) {
        packet.fill(0);

        packet[0..4].copy_from_slice(&self.seq.to_le_bytes());
        packet[4..8].copy_from_slice(&self.ack.to_le_bytes());
        packet[8] = self.ack_flag as u8;
        packet[9] = self.fin_flag as u8;
        packet[10..12].copy_from_slice(&(self.payload.len() as u16).to_le_bytes());
        packet[HEADER_LEN..HEADER_LEN + self.payload.len()].copy_from_slice(&self.payload);
    }

    /* Only the length field decides how much payload is real; the datagram
       itself is always padded to the full packet size. */
    pub fn decode(datagram: &[u8]) -> Result<Segment, Error> {
        if datagram.len() < HEADER_LEN {
            return Err(Error::Malformed("datagram shorter than the header"));
        }

        let seq = u32::from_le_bytes(datagram[0..4].try_into().unwrap());
        let ack = u32::from_le_bytes(datagram[4..8].try_into().unwrap());
        let ack_flag = datagram[8] != 0;
        let fin_flag = datagram[9] != 0;
        let length = u16::from_le_bytes(datagram[10..12].try_into().unwrap()) as usize;

        if length > datagram.len() - HEADER_LEN {
            return Err(Error::Malformed("length runs past the datagram"));
        }

        Ok(Segment {
            seq,
            ack,
            ack_flag,
            fin_flag,
            payload: datagram[HEADER_LEN..HEADER_LEN + length].to_vec(),
        })
    }
}
