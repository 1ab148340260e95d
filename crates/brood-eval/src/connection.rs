use brood_core::Result;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::TcpStream;

/// Both directions of a master/slave socket, optionally wrapped in deflate
/// streams. The compressed writer stays open across messages; `flush`
/// performs a sync flush so every buffered byte becomes visible to the
/// peer's decoder at message boundaries.
pub struct Connection {
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
}

impl Connection {
    pub fn wrap(stream: TcpStream, compress: bool) -> Result<Self> {
        stream.set_nodelay(true)?;
        let read_half = stream.try_clone()?;

        Ok(if compress {
            Connection {
                reader: Box::new(DeflateDecoder::new(read_half)),
                writer: Box::new(DeflateEncoder::new(stream, Compression::default())),
            }
        } else {
            Connection {
                reader: Box::new(BufReader::new(read_half)),
                writer: Box::new(BufWriter::new(stream)),
            }
        })
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
