use std::io::{self, Read, Seek, SeekFrom};

/// A [`Read`] + [`Seek`] window over `len` bytes of an inner stream, starting at the inner
/// stream's position at creation time. Works like [`std::io::Take`], except that it can seek.
///
/// Positions are the inner stream's absolute positions, so node headers read through the window
/// stay valid outside of it. Seeks outside of the window are rejected.
#[derive(Debug)]
pub struct SeekableTake<T: Read + Seek> {
    inner: T,
    start: u64,
    end: u64,
    position: u64,
}

impl<T: Read + Seek> SeekableTake<T> {
    pub fn new(mut inner: T, len: u64) -> io::Result<Self> {
        let start = inner.stream_position()?;
        Ok(Self {
            inner,
            start,
            end: start + len,
            position: start,
        })
    }

    /// Bytes left until the end of the window.
    pub fn remaining(&self) -> u64 {
        self.end - self.position
    }
}

impl<T: Read + Seek> Read for SeekableTake<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = (buf.len() as u64).min(self.remaining()) as usize;
        if max == 0 {
            return Ok(0);
        }

        let n = self.inner.read(&mut buf[..max])?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<T: Read + Seek> Seek for SeekableTake<T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(n) => self.position.checked_add_signed(n),
            SeekFrom::End(n) => self.end.checked_add_signed(n),
        };

        match target {
            Some(target) if (self.start..=self.end).contains(&target) => {
                self.inner.seek(SeekFrom::Start(target))?;
                self.position = target;
                Ok(target)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seeking outside the SeekableTake range",
            )),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

pub trait SeekableTakeExt: Read + Seek {
    fn seekable_take(&mut self, n: u64) -> io::Result<SeekableTake<&mut Self>>;
}

impl<T: Read + Seek> SeekableTakeExt for T {
    fn seekable_take(&mut self, n: u64) -> io::Result<SeekableTake<&mut Self>> {
        SeekableTake::new(self, n)
    }
}
