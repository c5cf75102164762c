mod err;
pub use err::*;

pub mod receiver;
pub mod segment;
pub mod sender;

pub use receiver::{FaultInjector, Receiver};
pub use segment::{Segment, INITIAL_SEQ_NUMBER, MAX_DATA_SIZE, MAX_PACKET_SIZE};
pub use sender::Sender;

/* Flow-control convention: the receiver's window is never advertised on the
   wire, so both peers fall back to the same constant unless the client was
   started with an explicit window. */
pub const DEFAULT_RWND: u64 = 100;
