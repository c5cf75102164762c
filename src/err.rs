use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Socket setup failed: {0}")]
    SocketSetup(#[source] io::Error),

    #[error("Server has no file named: {0}")]
    FileNotFound(String),

    #[error("Malformed segment: {0}")]
    Malformed(&'static str),

    #[error("Io error: {0}")]
    Io(#[from] io::Error),
}
