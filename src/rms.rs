use crate::error::Error;

/// Frames per read while streaming the `data` chunk, keeps memory use independent of file size
pub const RMS_BUFFER_FRAMES: usize = 10_000;

/// Running sum of squared samples over a `data` chunk.
///
/// 8-bit samples are squared as their raw unsigned byte value and 16-bit
/// samples as signed values. The two depths are therefore not on a common
/// scale: a silent 8-bit file sits at 128, not 0.
#[derive(Debug, Clone)]
pub struct RmsAccumulator {
    bytes_per_sample: usize,
    sum_sq: u128,
    samples: u64,
    dropped: usize,
}

impl RmsAccumulator {
    /// Start an accumulator for the given bits per sample, only 8 and 16 are supported
    pub fn new(bit_depth: u16) -> Result<Self, Error> {
        let bytes_per_sample = match bit_depth {
            8 => 1,
            16 => 2,
            other => return Err(Error::UnsupportedBitDepth(other)),
        };

        Ok(Self {
            bytes_per_sample,
            sum_sq: 0,
            samples: 0,
            dropped: 0,
        })
    }

    /// Buffer length in bytes for a given frame size, never more than the `data` payload
    pub fn buffer_len(block_align: u16, data_len: u32) -> usize {
        let frames = RMS_BUFFER_FRAMES * usize::from(block_align);
        usize::try_from(data_len).map_or(frames, |len| frames.min(len))
    }

    /// Add every complete sample in `bytes`. A trailing partial sample is counted as dropped.
    pub fn feed(&mut self, bytes: &[u8]) {
        let chunks = bytes.chunks_exact(self.bytes_per_sample);
        self.dropped += chunks.remainder().len();

        let sum: u128 = match self.bytes_per_sample {
            1 => chunks.map(|b| u128::from(b[0]) * u128::from(b[0])).sum(),
            _ => chunks
                .map(|b| {
                    let s = i64::from(i16::from_le_bytes([b[0], b[1]]));
                    (s * s) as u128
                })
                .sum(),
        };

        self.sum_sq += sum;
        self.samples += (bytes.len() / self.bytes_per_sample) as u64;
    }

    /// Number of complete samples seen so far
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Bytes that did not form a complete sample
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// `sqrt(sum of squares / sample count)`
    pub fn finish(self) -> Result<f64, Error> {
        if self.samples == 0 {
            return Err(Error::EmptyData);
        }

        Ok((self.sum_sq as f64 / self.samples as f64).sqrt())
    }
}
