use crate::chunk::Chunk;
use crate::error::{Error, FormatRule};
use core::fmt;

/// Number of bytes of the `fmt ` payload that are decoded, anything after is extension data
pub const FMT_FIELDS_LEN: usize = 16;

/// Audio format declared by the `fmt ` chunk
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AudioFormat {
    /// PCM (Pulse Code Modulation) - integer samples
    Pcm,
    /// IEEE float - floating point samples
    IeeeFloat,
    /// `WAVE_FORMAT_EXTENSIBLE`, the real format lives in the extension bytes
    Extensible,
    /// any other registered or vendor code
    Other(u16),
}

impl AudioFormat {
    /// Map a raw format tag
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => AudioFormat::Pcm,
            3 => AudioFormat::IeeeFloat,
            0xfffe => AudioFormat::Extensible,
            other => AudioFormat::Other(other),
        }
    }
}

/// Struct representing the fixed fields of the `fmt ` section of a WAV file
///
/// for more information see [`here`]
///
/// [`here`]: http://soundfile.sapp.org/doc/WaveFormat/
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Fmt {
    /// raw format tag, `1` for PCM
    pub format_tag: u16,
    /// number of audio channels in the sample data, channels are interleaved
    pub num_channels: u16,
    /// sample rate, typical values are `16_000`, `44_100` or `48_000`
    pub sample_rate: u32,
    /// bytes per second of audio
    pub byte_rate: u32,
    /// bytes per frame, one sample for every channel
    pub block_align: u16,
    /// bit depth for each sample, typical values are `8` or `16`
    pub bit_depth: u16,
}

impl Fmt {
    /// Decode the fixed fields in stream order.
    ///
    /// ```
    /// use wavscan::Fmt;
    ///
    /// let fmt = Fmt::from_bytes(&[
    ///     0x01, 0x00, // audio format
    ///     0x01, 0x00, // num channels
    ///     0x80, 0x3e, 0x00, 0x00, // sample rate
    ///     0x00, 0x7d, 0x00, 0x00, // byte rate
    ///     0x02, 0x00, // block align
    ///     0x10, 0x00, // bits per sample
    /// ]);
    ///
    /// assert_eq!(fmt.sample_rate, 16_000);
    /// assert!(fmt.validate().is_ok());
    /// ```
    pub fn from_bytes(bytes: &[u8; FMT_FIELDS_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let u32_at =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        Fmt {
            format_tag: u16_at(0),
            num_channels: u16_at(2),
            sample_rate: u32_at(4),
            byte_rate: u32_at(8),
            block_align: u16_at(12),
            bit_depth: u16_at(14),
        }
    }

    /// Typed view of [`Fmt::format_tag`]
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::from_u16(self.format_tag)
    }

    /// Check that the fields describe a consistent frame layout
    pub fn validate(&self) -> Result<(), Error> {
        let fail = |rule| {
            Err(Error::InconsistentFormat {
                rule,
                fmt: *self,
            })
        };

        if self.num_channels == 0
            || self.sample_rate == 0
            || self.byte_rate == 0
            || self.block_align == 0
        {
            return fail(FormatRule::NonZero);
        }

        if u64::from(self.byte_rate) != u64::from(self.sample_rate) * u64::from(self.block_align) {
            return fail(FormatRule::ByteRate);
        }

        if u32::from(self.bit_depth) * u32::from(self.num_channels)
            != 8 * u32::from(self.block_align)
        {
            return fail(FormatRule::BlockAlign);
        }

        Ok(())
    }

    /// Duration in seconds of a data chunk under this format
    pub fn audio_length(&self, data: &Chunk) -> f64 {
        f64::from(data.len) / f64::from(self.byte_rate)
    }
}

impl fmt::Display for Fmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "format tag {}, {} channels, {} Hz, {} bytes/s, block align {}, {} bits",
            self.format_tag,
            self.num_channels,
            self.sample_rate,
            self.byte_rate,
            self.block_align,
            self.bit_depth
        )
    }
}

/// Check the `fmt ` chunk can hold the fixed fields before they are read
pub(crate) fn check_fmt_chunk(chunk: &Chunk) -> Result<(), Error> {
    if (chunk.len as usize) < FMT_FIELDS_LEN {
        return Err(Error::ShortFormatChunk { len: chunk.len });
    }
    Ok(())
}
