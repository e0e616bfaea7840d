//! Structural scanner for RIFF/WAVE streams.
//!
//! A shallow parse walks every chunk, checks the RIFF preamble and validates
//! the `fmt ` chunk. A deep parse additionally streams the `data` chunk and
//! computes the root-mean-square of all samples.
//!
//! Shallow parsing an in-memory file:
//! ```
//! use wavscan::{SliceReader, shallow_parse};
//!
//! let bytes: [u8; 52] = [
//!     0x52, 0x49, 0x46, 0x46, // RIFF
//!     0x2c, 0x00, 0x00, 0x00, // chunk size
//!     0x57, 0x41, 0x56, 0x45, // WAVE
//!     0x66, 0x6d, 0x74, 0x20, // fmt_
//!     0x10, 0x00, 0x00, 0x00, // chunk size
//!     0x01, 0x00, // audio format
//!     0x02, 0x00, // num channels
//!     0x80, 0xbb, 0x00, 0x00, // sample rate
//!     0x00, 0xee, 0x02, 0x00, // byte rate
//!     0x04, 0x00, // block align
//!     0x10, 0x00, // bits per sample
//!     0x64, 0x61, 0x74, 0x61, // data
//!     0x08, 0x00, 0x00, 0x00, // chunk size
//!     0x01, 0x00, 0x02, 0x00, // samples
//!     0x03, 0x00, 0xff, 0xff, // samples
//! ];
//!
//! let wave = shallow_parse(&mut SliceReader::new(&bytes)).unwrap();
//!
//! assert_eq!(wave.fmt().num_channels, 2);
//! assert_eq!(wave.fmt().bit_depth, 16);
//! assert_eq!(wave.fmt().sample_rate, 48_000);
//! assert_eq!(wave.chunks().len(), 2);
//! ```
//!
//! Deep parsing adds the RMS, which only exists on the deep model:
//! ```
//! use wavscan::{SliceReader, deep_parse};
//!
//! let bytes: [u8; 48] = [
//!     0x52, 0x49, 0x46, 0x46, // RIFF
//!     0x28, 0x00, 0x00, 0x00, // chunk size
//!     0x57, 0x41, 0x56, 0x45, // WAVE
//!     0x66, 0x6d, 0x74, 0x20, // fmt_
//!     0x10, 0x00, 0x00, 0x00, // chunk size
//!     0x01, 0x00, // audio format
//!     0x01, 0x00, // num channels
//!     0x80, 0x3e, 0x00, 0x00, // sample rate
//!     0x00, 0x7d, 0x00, 0x00, // byte rate
//!     0x02, 0x00, // block align
//!     0x10, 0x00, // bits per sample
//!     0x64, 0x61, 0x74, 0x61, // data
//!     0x04, 0x00, 0x00, 0x00, // chunk size
//!     0x64, 0x00, 0x9c, 0xff, // +100, -100
//! ];
//!
//! let wave = deep_parse(&mut SliceReader::new(&bytes)).unwrap();
//!
//! assert_eq!(wave.rms(), 100.0);
//! ```
//!
//! When the depth is only known at runtime, [`parse`] returns a [`ParsedWave`]
//! whose RMS accessor fails with [`Error::PrematureAccess`] on shallow models.
//!
//! Files can be parsed by path, the file is closed again before returning:
//! ```no_run
//! let wave = wavscan::deep_parse_file("recording.wav").unwrap();
//! println!("{} s, rms {}", wave.audio_length(), wave.rms());
//! ```

#![warn(missing_docs)]

mod chunk;
mod cursor;
mod error;
mod fmt;
pub mod io;
mod rms;
mod wave;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(test)]
mod test_util;

pub use chunk::{Chunk, ChunkTag, MAX_STREAM_LEN, MIN_STREAM_LEN};
pub use cursor::Cursor;
pub use error::{Error, FormatRule, HeaderFault, ReadError};
pub use fmt::{AudioFormat, FMT_FIELDS_LEN, Fmt};
pub use io::SliceReader;
pub use rms::{RMS_BUFFER_FRAMES, RmsAccumulator};
pub use wave::{
    Deep, Mode, ParsedWave, Shallow, Wave, deep_parse, deep_parse_file, parse, shallow_parse,
    shallow_parse_file,
};
