use crate::error::{Error, HeaderFault};
use core::fmt;
use log::{debug, info};

/// Smallest stream that can hold a RIFF preamble, a 16 byte `fmt ` chunk and a `data` header
pub const MIN_STREAM_LEN: u64 = 44;

/// Largest stream accepted, chunk lengths are 32-bit and offsets must stay in the signed domain
pub const MAX_STREAM_LEN: u64 = i32::MAX as u64;

const HEADER_LEN: u64 = 8;

/// Four byte identifier at the start of every chunk
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ChunkTag {
    /// `RIFF`
    Riff,
    /// `WAVE`
    Wave,
    /// `fmt `
    Fmt,
    /// `data`
    Data,
    /// anything else, kept verbatim
    Unknown([u8; 4]),
}

impl ChunkTag {
    /// Map four raw bytes to a tag
    pub fn from_bytes(bytes: &[u8; 4]) -> Self {
        match bytes {
            b"RIFF" => ChunkTag::Riff,
            b"WAVE" => ChunkTag::Wave,
            b"fmt " => ChunkTag::Fmt,
            b"data" => ChunkTag::Data,
            _ => ChunkTag::Unknown(*bytes),
        }
    }

    /// Raw bytes as they appear in the stream
    pub fn to_bytes(self) -> [u8; 4] {
        match self {
            ChunkTag::Riff => *b"RIFF",
            ChunkTag::Wave => *b"WAVE",
            ChunkTag::Fmt => *b"fmt ",
            ChunkTag::Data => *b"data",
            ChunkTag::Unknown(bytes) => bytes,
        }
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// Location of one chunk inside the stream
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Chunk {
    /// chunk identifier
    pub id: ChunkTag,
    /// byte offset of the payload, just past the 8 byte header
    pub offset: u64,
    /// payload length in bytes
    pub len: u32,
}

impl Chunk {
    /// First byte past the payload
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.len)
    }
}

/// Every chunk of a scanned stream with the `fmt ` and `data` chunks singled out
#[derive(Debug, PartialEq, Clone)]
pub(crate) struct ChunkInventory {
    pub chunks: Vec<Chunk>,
    pub fmt: usize,
    pub data: usize,
}

impl ChunkInventory {
    pub fn fmt_chunk(&self) -> Chunk {
        self.chunks[self.fmt]
    }

    pub fn data_chunk(&self) -> Chunk {
        self.chunks[self.data]
    }
}

/// Walks the chunk sequence of a RIFF/WAVE stream.
///
/// The scanner does no I/O itself: the caller reads the fields it asks for and
/// seeks to [`ChunkScanner::position`] after every chunk. This keeps the walk a
/// flat loop shared by the blocking and async readers.
#[derive(Debug)]
pub(crate) struct ChunkScanner {
    stream_len: u64,
    pos: u64,
    chunks: Vec<Chunk>,
    fmt: Option<usize>,
    data: Option<usize>,
}

impl ChunkScanner {
    pub fn new(stream_len: u64) -> Result<Self, Error> {
        if !(MIN_STREAM_LEN..=MAX_STREAM_LEN).contains(&stream_len) {
            return Err(Error::SizeBounds { len: stream_len });
        }

        Ok(ChunkScanner {
            stream_len,
            pos: 0,
            chunks: vec![],
            fmt: None,
            data: None,
        })
    }

    /// Check the 12 byte preamble: `RIFF`, body length, `WAVE`
    pub fn open(&mut self, riff: [u8; 4], declared: u32, wave: [u8; 4]) -> Result<(), Error> {
        if ChunkTag::from_bytes(&riff) != ChunkTag::Riff {
            return Err(Error::MalformedHeader(HeaderFault::NoRiffTag(riff)));
        }

        // The body length must account for every byte after itself, no slack either way
        let actual = self.stream_len - HEADER_LEN;
        if u64::from(declared) != actual {
            return Err(Error::MalformedHeader(HeaderFault::BodyLength {
                declared,
                actual,
            }));
        }

        if ChunkTag::from_bytes(&wave) != ChunkTag::Wave {
            return Err(Error::MalformedHeader(HeaderFault::NoWaveTag(wave)));
        }

        self.pos = 12;
        Ok(())
    }

    /// Offset of the next chunk header, or of the end of the stream once done
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.stream_len
    }

    /// Fails if fewer than 8 bytes remain for the next chunk header
    pub fn expect_header(&self) -> Result<(), Error> {
        let end = self.pos + HEADER_LEN;
        if end > self.stream_len {
            return Err(Error::TruncatedChunk {
                tag: None,
                offset: self.pos,
                end,
                stream_len: self.stream_len,
            });
        }
        Ok(())
    }

    /// Record the chunk whose header was just read and advance past its payload
    pub fn push(&mut self, tag: [u8; 4], len: u32) -> Result<Chunk, Error> {
        let id = ChunkTag::from_bytes(&tag);
        let chunk = Chunk {
            id,
            offset: self.pos + HEADER_LEN,
            len,
        };

        if chunk.end() > self.stream_len {
            return Err(Error::TruncatedChunk {
                tag: Some(id),
                offset: self.pos,
                end: chunk.end(),
                stream_len: self.stream_len,
            });
        }

        let index = self.chunks.len();
        let slot = match id {
            ChunkTag::Fmt => Some(&mut self.fmt),
            ChunkTag::Data => Some(&mut self.data),
            _ => None,
        };

        match slot {
            Some(Some(_)) => {
                return Err(Error::DuplicateChunk {
                    tag: id,
                    offset: chunk.offset,
                });
            }
            Some(slot) => *slot = Some(index),
            None => info!("ignoring chunk `{}`, {} bytes at {}", id, len, chunk.offset),
        }

        debug!("chunk `{}` at {} ({} bytes)", id, chunk.offset, len);

        self.chunks.push(chunk);
        self.pos = chunk.end();
        Ok(chunk)
    }

    pub fn finish(self) -> Result<ChunkInventory, Error> {
        let fmt = self.fmt.ok_or(Error::MissingChunk(ChunkTag::Fmt))?;
        let data = self.data.ok_or(Error::MissingChunk(ChunkTag::Data))?;

        Ok(ChunkInventory {
            chunks: self.chunks,
            fmt,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(len: u64) -> ChunkScanner {
        let mut scanner = ChunkScanner::new(len).unwrap();
        scanner.open(*b"RIFF", (len - 8) as u32, *b"WAVE").unwrap();
        scanner
    }

    #[test]
    fn tag_round_trips_known_and_unknown() {
        assert_eq!(ChunkTag::from_bytes(b"fmt "), ChunkTag::Fmt);
        assert_eq!(ChunkTag::from_bytes(b"data"), ChunkTag::Data);
        assert_eq!(ChunkTag::from_bytes(b"LIST"), ChunkTag::Unknown(*b"LIST"));
        assert_eq!(ChunkTag::Unknown(*b"LIST").to_bytes(), *b"LIST");
    }

    #[test]
    fn tag_display_escapes_binary() {
        assert_eq!(ChunkTag::Fmt.to_string(), "fmt ");
        assert_eq!(ChunkTag::Unknown([b'a', 0, b'b', 0xff]).to_string(), "a\\x00b\\xff");
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        assert_eq!(
            ChunkScanner::new(43).unwrap_err(),
            Error::SizeBounds { len: 43 }
        );
        assert_eq!(
            ChunkScanner::new(MAX_STREAM_LEN + 1).unwrap_err(),
            Error::SizeBounds {
                len: MAX_STREAM_LEN + 1
            }
        );
        assert!(ChunkScanner::new(MIN_STREAM_LEN).is_ok());
    }

    #[test]
    fn preamble_faults_are_checked_in_order() {
        let mut scanner = ChunkScanner::new(44).unwrap();
        assert_eq!(
            scanner.open(*b"RIFX", 36, *b"WAVE").unwrap_err(),
            Error::MalformedHeader(HeaderFault::NoRiffTag(*b"RIFX"))
        );
        assert_eq!(
            scanner.open(*b"RIFF", 35, *b"WAVE").unwrap_err(),
            Error::MalformedHeader(HeaderFault::BodyLength {
                declared: 35,
                actual: 36
            })
        );
        assert_eq!(
            scanner.open(*b"RIFF", 37, *b"WAVE").unwrap_err(),
            Error::MalformedHeader(HeaderFault::BodyLength {
                declared: 37,
                actual: 36
            })
        );
        assert_eq!(
            scanner.open(*b"RIFF", 36, *b"AVI ").unwrap_err(),
            Error::MalformedHeader(HeaderFault::NoWaveTag(*b"AVI "))
        );
    }

    #[test]
    fn walks_chunks_in_order() {
        let mut scanner = opened(64);
        assert_eq!(scanner.position(), 12);

        let fmt = scanner.push(*b"fmt ", 16).unwrap();
        assert_eq!(fmt.offset, 20);
        assert_eq!(scanner.position(), 36);

        let list = scanner.push(*b"LIST", 4).unwrap();
        assert_eq!(list.id, ChunkTag::Unknown(*b"LIST"));
        assert_eq!(list.offset, 44);

        let data = scanner.push(*b"data", 8).unwrap();
        assert_eq!(data.offset, 56);
        assert!(scanner.is_done());

        let inventory = scanner.finish().unwrap();
        assert_eq!(inventory.chunks.len(), 3);
        assert_eq!(inventory.fmt_chunk(), fmt);
        assert_eq!(inventory.data_chunk(), data);
    }

    #[test]
    fn payload_past_end_is_truncated() {
        let mut scanner = opened(44);
        scanner.push(*b"fmt ", 16).unwrap();
        assert_eq!(
            scanner.push(*b"data", 1).unwrap_err(),
            Error::TruncatedChunk {
                tag: Some(ChunkTag::Data),
                offset: 36,
                end: 45,
                stream_len: 44
            }
        );
    }

    #[test]
    fn header_past_end_is_truncated() {
        let mut scanner = opened(48);
        scanner.push(*b"fmt ", 16).unwrap();
        scanner.push(*b"data", 0).unwrap();
        assert!(!scanner.is_done());
        assert_eq!(
            scanner.expect_header().unwrap_err(),
            Error::TruncatedChunk {
                tag: None,
                offset: 44,
                end: 52,
                stream_len: 48
            }
        );
    }

    #[test]
    fn duplicate_fmt_and_data_are_rejected() {
        let mut scanner = opened(100);
        scanner.push(*b"fmt ", 16).unwrap();
        assert_eq!(
            scanner.push(*b"fmt ", 16).unwrap_err(),
            Error::DuplicateChunk {
                tag: ChunkTag::Fmt,
                offset: 44
            }
        );

        let mut scanner = opened(100);
        scanner.push(*b"data", 0).unwrap();
        assert_eq!(
            scanner.push(*b"data", 0).unwrap_err(),
            Error::DuplicateChunk {
                tag: ChunkTag::Data,
                offset: 28
            }
        );
    }

    #[test]
    fn missing_chunks_are_named() {
        let mut scanner = opened(44);
        scanner.push(*b"JUNK", 24).unwrap();
        assert_eq!(
            scanner.finish().unwrap_err(),
            Error::MissingChunk(ChunkTag::Fmt)
        );

        let mut scanner = opened(44);
        scanner.push(*b"fmt ", 24).unwrap();
        assert_eq!(
            scanner.finish().unwrap_err(),
            Error::MissingChunk(ChunkTag::Data)
        );
    }

    #[test]
    fn many_small_chunks_do_not_recurse() {
        let count = 100_000u64;
        let len = 12 + 8 * count + 24 + 8;
        let mut scanner = opened(len);
        scanner.push(*b"fmt ", 16).unwrap();
        scanner.push(*b"data", 0).unwrap();
        while !scanner.is_done() {
            scanner.expect_header().unwrap();
            scanner.push(*b"pad ", 0).unwrap();
        }
        let inventory = scanner.finish().unwrap();
        assert_eq!(inventory.chunks.len() as u64, count + 2);
        assert!(
            inventory
                .chunks
                .windows(2)
                .all(|w| w[0].offset < w[1].offset)
        );
    }
}
