//! Stream adapters for the reader traits the parser is generic over.

use core::convert::Infallible;
use embedded_io::{ErrorType, Read, Seek, SeekFrom};

/// Seekable reader over an in-memory byte slice
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_slice(&mut self, buf: &mut [u8]) -> usize {
        if self.pos >= self.data.len() {
            return 0;
        }
        let remaining = self.data.len() - self.pos;
        let to_read = remaining.min(buf.len());
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        to_read
    }

    fn seek_slice(&mut self, pos: SeekFrom) -> u64 {
        let (base, offset) = match pos {
            SeekFrom::Start(offset) => (0, i128::from(offset)),
            SeekFrom::Current(offset) => (self.pos, i128::from(offset)),
            SeekFrom::End(offset) => (self.data.len(), i128::from(offset)),
        };
        let target = (base as i128).saturating_add(offset).max(0);
        self.pos = usize::try_from(target).map_or(self.data.len(), |p| p.min(self.data.len()));
        self.pos as u64
    }
}

impl ErrorType for SliceReader<'_> {
    type Error = Infallible;
}

impl Read for SliceReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(self.read_slice(buf))
    }
}

impl Seek for SliceReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        Ok(self.seek_slice(pos))
    }
}

#[cfg(feature = "async")]
impl embedded_io_async::Read for SliceReader<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(self.read_slice(buf))
    }
}

#[cfg(feature = "async")]
impl embedded_io_async::Seek for SliceReader<'_> {
    async fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        Ok(self.seek_slice(pos))
    }
}

fn std_seek_from(pos: SeekFrom) -> std::io::SeekFrom {
    match pos {
        SeekFrom::Start(offset) => std::io::SeekFrom::Start(offset),
        SeekFrom::End(offset) => std::io::SeekFrom::End(offset),
        SeekFrom::Current(offset) => std::io::SeekFrom::Current(offset),
    }
}

/// Wrapper for [`std::fs::File`], opened read-only by the path based entry points
pub struct File(pub std::fs::File);

impl File {
    /// Open `path` for reading
    pub fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        std::fs::File::open(path).map(File)
    }
}

impl ErrorType for File {
    type Error = std::io::Error;
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf)
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        std::io::Seek::seek(&mut self.0, std_seek_from(pos))
    }
}

#[cfg(feature = "async")]
mod tokio_wrapper {
    use super::std_seek_from;
    use embedded_io::{ErrorType, SeekFrom};
    use tokio::io::{AsyncReadExt, AsyncSeekExt};

    /// Wrapper for [`tokio::fs::File`], used by the async path based entry points
    pub struct TokioFile(pub tokio::fs::File);

    impl TokioFile {
        /// Open `path` for reading
        pub async fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
            tokio::fs::File::open(path).await.map(TokioFile)
        }
    }

    impl ErrorType for TokioFile {
        type Error = std::io::Error;
    }

    impl embedded_io_async::Read for TokioFile {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            self.0.read(buf).await
        }
    }

    impl embedded_io_async::Seek for TokioFile {
        async fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
            self.0.seek(std_seek_from(pos)).await
        }
    }
}

#[cfg(feature = "async")]
pub use tokio_wrapper::TokioFile;
