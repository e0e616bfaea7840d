use crate::error::{Error, ReadError};
use embedded_io::{Read, ReadExactError, Seek, SeekFrom};

/// Position-tracked reads of fixed-width little-endian fields from a borrowed stream
pub struct Cursor<'r, R> {
    reader: &'r mut R,
    pos: u64,
}

impl<'r, R> Cursor<'r, R>
where
    R: Read + Seek,
{
    /// Wrap a reader, the cursor starts wherever the reader currently is
    pub fn new(reader: &'r mut R) -> Result<Self, ReadError<R::Error>> {
        let pos = reader.stream_position().map_err(ReadError::Reader)?;
        Ok(Self { reader, pos })
    }

    /// Total stream length. Leaves the cursor at offset 0.
    pub fn stream_len(&mut self) -> Result<u64, ReadError<R::Error>> {
        let len = self
            .reader
            .seek(SeekFrom::End(0))
            .map_err(ReadError::Reader)?;
        self.seek_to(0)?;
        Ok(len)
    }

    /// Current offset from the start of the stream
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Jump to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> Result<(), ReadError<R::Error>> {
        self.pos = self
            .reader
            .seek(SeekFrom::Start(offset))
            .map_err(ReadError::Reader)?;
        Ok(())
    }

    /// Fill `buf` completely or fail with [`Error::TruncatedRead`]
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<(), ReadError<R::Error>> {
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(ReadExactError::UnexpectedEof) => Err(ReadError::Parser(Error::TruncatedRead {
                offset: self.pos,
                wanted: buf.len(),
            })),
            Err(ReadExactError::Other(e)) => Err(ReadError::Reader(e)),
        }
    }

    /// Read exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError<R::Error>> {
        let mut buf = [0; N];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Read a four character chunk tag
    pub fn read_tag(&mut self) -> Result<[u8; 4], ReadError<R::Error>> {
        self.read_array()
    }

    /// Read a little-endian `u16`
    pub fn read_u16_le(&mut self) -> Result<u16, ReadError<R::Error>> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`
    pub fn read_u32_le(&mut self) -> Result<u32, ReadError<R::Error>> {
        self.read_array().map(u32::from_le_bytes)
    }
}
