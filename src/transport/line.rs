//! Stdio line transport: one request per line terminated by `\n`; CRLF is
//! tolerated on input, output always uses `\n`.

use std::io::{self, BufReader, Read, Write};
use std::sync::Mutex;

use super::Transport;

pub struct LineTransport<R, W> {
    reader: Mutex<BufReader<R>>,
    writer: Mutex<W>,
}

impl<R: Read + Send, W: Write + Send> LineTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader)),
            writer: Mutex::new(writer),
        }
    }
}

impl LineTransport<io::Stdin, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout())
    }
}

impl<R: Read + Send, W: Write + Send> Transport for LineTransport<R, W> {
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
