//! Byte-stream framing layer beneath an adapter.

pub mod http;
pub mod line;

use std::io;

use crate::error::AliceError;

/// A transport exposes three operations. `send` is atomic at the
/// granularity of one message so the request thread and the event thread
/// can share a transport without interleaving partial writes.
pub trait Transport: Send + Sync {
    /// Bytes up to and including the next newline.
    fn read_line(&self) -> io::Result<String>;

    /// Exactly `n` bytes; fails on EOF with fewer.
    fn read(&self, n: usize) -> io::Result<Vec<u8>>;

    /// Write and flush.
    fn send(&self, bytes: &[u8]) -> io::Result<()>;
}

/// The message-level view of a transport that understands
/// `Content-Length`-framed bodies, as the DAP adapter needs.
pub trait FramedTransport: Send + Sync {
    fn recv_message(&self) -> Result<Vec<u8>, AliceError>;
    fn send_message(&self, body: &[u8]) -> io::Result<()>;
}

impl<R, W> FramedTransport for http::HttpTransport<R, W>
where
    R: std::io::Read + Send,
    W: std::io::Write + Send,
{
    fn recv_message(&self) -> Result<Vec<u8>, AliceError> {
        http::HttpTransport::recv_message(self)
    }

    fn send_message(&self, body: &[u8]) -> io::Result<()> {
        http::HttpTransport::send_message(self, body)
    }
}
