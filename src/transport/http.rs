//! HTTP-over-stdio transport: the same three operations as the line
//! transport, plus message-level framing understood by the DAP adapter.
//! Request = `Content-Length: <N>\r\n\r\n<body-of-N-bytes>`; only the
//! `Content-Length` header is recognized, every other header is rejected.

use std::io::{self, BufReader, Read, Write};
use std::sync::Mutex;

use super::Transport;
use crate::error::AliceError;

/// Internal bound on an accepted `Content-Length`, to reject obviously
/// bogus or hostile framing rather than allocate unboundedly.
const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

pub struct HttpTransport<R, W> {
    reader: Mutex<BufReader<R>>,
    writer: Mutex<W>,
}

impl<R: Read + Send, W: Write + Send> HttpTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader)),
            writer: Mutex::new(writer),
        }
    }

    /// Read one length-framed message: header lines until an empty line,
    /// then exactly `Content-Length` bytes.
    pub fn recv_message(&self) -> Result<Vec<u8>, AliceError> {
        let mut content_length: Option<usize> = None;
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                return Err(AliceError::ProtocolFraming(
                    "transport closed while reading headers".to_string(),
                ));
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                break;
            }
            let (name, value) = trimmed.split_once(':').ok_or_else(|| {
                AliceError::ProtocolFraming(format!("malformed header line: {:?}", trimmed))
            })?;
            if name.eq_ignore_ascii_case("content-length") {
                let value = value.trim();
                let n: usize = value.parse().map_err(|_| {
                    AliceError::ProtocolFraming(format!("non-integer Content-Length: {:?}", value))
                })?;
                content_length = Some(n);
            } else {
                return Err(AliceError::ProtocolFraming(format!(
                    "unrecognized header: {:?}",
                    name
                )));
            }
        }
        let n = content_length.ok_or_else(|| {
            AliceError::ProtocolFraming("missing Content-Length header".to_string())
        })?;
        if n < 2 {
            return Err(AliceError::ProtocolFraming(format!(
                "Content-Length too small: {}",
                n
            )));
        }
        if n > MAX_CONTENT_LENGTH {
            return Err(AliceError::ProtocolFraming(format!(
                "Content-Length too large: {}",
                n
            )));
        }
        Ok(self.read(n)?)
    }

    /// Frame and write one message.
    pub fn send_message(&self, body: &[u8]) -> io::Result<()> {
        let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        framed.extend_from_slice(body);
        self.send(&framed)
    }
}

impl<R: Read + Send, W: Write + Send> Transport for HttpTransport<R, W> {
    fn read_line(&self) -> io::Result<String> {
        use std::io::BufRead;
        let mut reader = self.reader.lock().unwrap();
        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "transport closed"));
        }
        Ok(line)
    }

    fn read(&self, n: usize) -> io::Result<Vec<u8>> {
        let mut reader = self.reader.lock().unwrap();
        let mut buf = vec![0u8; n];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn send(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap();
        writer.write_all(bytes)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_a_framed_message() {
        let raw = b"Content-Length: 5\r\n\r\nhello".to_vec();
        let t = HttpTransport::new(Cursor::new(raw), Vec::new());
        assert_eq!(t.recv_message().unwrap(), b"hello");
    }

    #[test]
    fn rejects_missing_content_length() {
        let raw = b"X-Other: 1\r\n\r\nhello".to_vec();
        let t = HttpTransport::new(Cursor::new(raw), Vec::new());
        assert!(matches!(
            t.recv_message(),
            Err(AliceError::ProtocolFraming(_))
        ));
    }

    #[test]
    fn rejects_non_integer_content_length() {
        let raw = b"Content-Length: abc\r\n\r\n".to_vec();
        let t = HttpTransport::new(Cursor::new(raw), Vec::new());
        assert!(matches!(
            t.recv_message(),
            Err(AliceError::ProtocolFraming(_))
        ));
    }

    #[test]
    fn rejects_length_below_two() {
        let raw = b"Content-Length: 1\r\n\r\nx".to_vec();
        let t = HttpTransport::new(Cursor::new(raw), Vec::new());
        assert!(matches!(
            t.recv_message(),
            Err(AliceError::ProtocolFraming(_))
        ));
    }

    #[test]
    fn rejects_unrecognized_headers() {
        let raw = b"Content-Type: application/json\r\nContent-Length: 2\r\n\r\nhi".to_vec();
        let t = HttpTransport::new(Cursor::new(raw), Vec::new());
        assert!(matches!(
            t.recv_message(),
            Err(AliceError::ProtocolFraming(_))
        ));
    }

    #[test]
    fn send_message_frames_with_content_length() {
        use std::sync::{Arc, Mutex as StdMutex};

        #[derive(Clone)]
        struct SharedBuf(Arc<StdMutex<Vec<u8>>>);
        impl Write for SharedBuf {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let buf = Arc::new(StdMutex::new(Vec::new()));
        let t = HttpTransport::new(Cursor::new(Vec::new()), SharedBuf(buf.clone()));
        t.send_message(b"{}").unwrap();
        assert_eq!(
            buf.lock().unwrap().as_slice(),
            b"Content-Length: 2\r\n\r\n{}".as_slice()
        );
    }
}
