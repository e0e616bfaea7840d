use crate::chunk::ChunkTag;
use crate::fmt::Fmt;

/// Error type for the different ways a WAVE stream can fail to parse
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Stream is shorter than a minimal WAVE file or longer than the supported length domain
    #[error("stream length {len} is outside the supported range")]
    SizeBounds {
        /// total stream length in bytes
        len: u64,
    },
    /// RIFF/WAVE preamble is broken
    #[error("malformed header: {0}")]
    MalformedHeader(HeaderFault),
    /// A chunk header or payload extends past the end of the stream
    #[error("chunk {} at offset {offset} ends at {end}, past stream end {stream_len}", display_tag(.tag))]
    TruncatedChunk {
        /// tag of the chunk, `None` if the header itself did not fit
        tag: Option<ChunkTag>,
        /// offset of the chunk header
        offset: u64,
        /// first byte past the chunk
        end: u64,
        /// total stream length in bytes
        stream_len: u64,
    },
    /// More than one `fmt ` or `data` chunk
    #[error("second `{tag}` chunk at offset {offset}")]
    DuplicateChunk {
        /// the duplicated tag
        tag: ChunkTag,
        /// payload offset of the second occurrence
        offset: u64,
    },
    /// No `fmt ` or `data` chunk after a full scan
    #[error("no `{0}` chunk found")]
    MissingChunk(ChunkTag),
    /// The `fmt ` payload is too short to hold the fixed fields
    #[error("format chunk holds {len} bytes, at least 16 required")]
    ShortFormatChunk {
        /// declared payload length
        len: u32,
    },
    /// Format fields contradict each other
    #[error("inconsistent format ({rule}): {fmt}")]
    InconsistentFormat {
        /// the arithmetic rule that failed
        rule: FormatRule,
        /// every field as read from the stream
        fmt: Fmt,
    },
    /// Bit depth the RMS engine cannot interpret
    #[error("unsupported bit depth {0} for RMS, expected 8 or 16")]
    UnsupportedBitDepth(u16),
    /// Data chunk holds no complete sample, so there is nothing to average
    #[error("data chunk holds no complete sample")]
    EmptyData,
    /// RMS requested from a model that was only shallow parsed
    #[error("RMS is only available after a deep parse")]
    PrematureAccess,
    /// Fewer bytes left in the stream than a field needs
    #[error("wanted {wanted} bytes at offset {offset}, stream ended")]
    TruncatedRead {
        /// position where the read started
        offset: u64,
        /// number of bytes requested
        wanted: usize,
    },
}

fn display_tag(tag: &Option<ChunkTag>) -> String {
    match tag {
        Some(tag) => format!("`{tag}`"),
        None => String::from("header"),
    }
}

/// What is wrong with the RIFF/WAVE preamble
#[derive(Debug, PartialEq, Clone, Copy, thiserror::Error)]
pub enum HeaderFault {
    /// First four bytes are not `RIFF`
    #[error("expected `RIFF`, found {0:?}")]
    NoRiffTag([u8; 4]),
    /// Bytes 8..12 are not `WAVE`
    #[error("expected `WAVE`, found {0:?}")]
    NoWaveTag([u8; 4]),
    /// RIFF body length does not match the actual stream length
    #[error("RIFF body declares {declared} bytes, stream holds {actual}")]
    BodyLength {
        /// length stored in the header
        declared: u32,
        /// stream length minus the eight preamble bytes
        actual: u64,
    },
}

/// Format invariant broken by a `fmt ` chunk
#[derive(Debug, PartialEq, Clone, Copy, thiserror::Error)]
pub enum FormatRule {
    /// channel count, sample rate, byte rate or block align is zero
    #[error("zero channel count, rate or block align")]
    NonZero,
    /// `byte_rate != sample_rate * block_align`
    #[error("byte rate != sample rate * block align")]
    ByteRate,
    /// `bit_depth * num_channels != 8 * block_align`
    #[error("bits per sample * channels != 8 * block align")]
    BlockAlign,
}

/// Error returned by every stream-reading operation
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ReadError<E> {
    /// Error from the underlying reader
    #[error("reader error: {0:?}")]
    Reader(E),
    /// Error from the parser
    #[error(transparent)]
    Parser(Error),
}

impl<E> From<Error> for ReadError<E> {
    fn from(e: Error) -> Self {
        ReadError::Parser(e)
    }
}

impl<E> ReadError<E> {
    /// The parser error, if this is not a reader failure
    pub fn parser(&self) -> Option<&Error> {
        match self {
            ReadError::Parser(e) => Some(e),
            ReadError::Reader(_) => None,
        }
    }
}
