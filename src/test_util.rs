use crate::fmt::Fmt;
use crate::io::SliceReader;
use embedded_io::{ErrorType, Read, Seek, SeekFrom};

/// In-memory WAVE file description for building test streams
#[derive(Clone)]
pub(crate) struct WaveImage {
    fmt: Fmt,
    fmt_extension: Vec<u8>,
    data: Option<Vec<u8>>,
    before: Vec<([u8; 4], Vec<u8>)>,
    after: Vec<([u8; 4], Vec<u8>)>,
}

/// 16-bit mono at 16 kHz holding `samples`
pub(crate) fn mono_16k(samples: &[i16]) -> WaveImage {
    WaveImage::new(1, 16_000, 16).samples_i16(samples)
}

impl WaveImage {
    /// PCM image with a consistent frame layout and an empty `data` chunk
    pub fn new(num_channels: u16, sample_rate: u32, bit_depth: u16) -> Self {
        let block_align = num_channels * bit_depth / 8;
        WaveImage {
            fmt: Fmt {
                format_tag: 1,
                num_channels,
                sample_rate,
                byte_rate: sample_rate * u32::from(block_align),
                block_align,
                bit_depth,
            },
            fmt_extension: vec![],
            data: Some(vec![]),
            before: vec![],
            after: vec![],
        }
    }

    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.data = Some(bytes.to_vec());
        self
    }

    pub fn samples_i16(self, samples: &[i16]) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.data(&bytes)
    }

    pub fn samples_u8(self, samples: &[u8]) -> Self {
        self.data(samples)
    }

    pub fn without_data(mut self) -> Self {
        self.data = None;
        self
    }

    pub fn byte_rate(mut self, byte_rate: u32) -> Self {
        self.fmt.byte_rate = byte_rate;
        self
    }

    pub fn fmt_extension(mut self, bytes: &[u8]) -> Self {
        self.fmt_extension = bytes.to_vec();
        self
    }

    /// Extra chunk placed before `fmt `
    pub fn chunk_before(mut self, tag: [u8; 4], payload: &[u8]) -> Self {
        self.before.push((tag, payload.to_vec()));
        self
    }

    /// Extra chunk placed after `data`
    pub fn chunk_after(mut self, tag: [u8; 4], payload: &[u8]) -> Self {
        self.after.push((tag, payload.to_vec()));
        self
    }

    /// The `fmt ` payload including any extension bytes
    pub fn fmt_bytes(&self) -> Vec<u8> {
        let f = &self.fmt;
        let mut bytes = vec![];
        bytes.extend_from_slice(&f.format_tag.to_le_bytes());
        bytes.extend_from_slice(&f.num_channels.to_le_bytes());
        bytes.extend_from_slice(&f.sample_rate.to_le_bytes());
        bytes.extend_from_slice(&f.byte_rate.to_le_bytes());
        bytes.extend_from_slice(&f.block_align.to_le_bytes());
        bytes.extend_from_slice(&f.bit_depth.to_le_bytes());
        bytes.extend_from_slice(&self.fmt_extension);
        bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let fmt = self.fmt_bytes();
        let mut chunks: Vec<([u8; 4], &[u8])> = vec![];
        chunks.extend(self.before.iter().map(|(t, p)| (*t, p.as_slice())));
        chunks.push((*b"fmt ", fmt.as_slice()));
        if let Some(data) = &self.data {
            chunks.push((*b"data", data.as_slice()));
        }
        chunks.extend(self.after.iter().map(|(t, p)| (*t, p.as_slice())));
        Self::raw(&chunks)
    }

    /// RIFF/WAVE stream holding exactly the given chunks
    pub fn raw(chunks: &[([u8; 4], &[u8])]) -> Vec<u8> {
        let mut bytes = vec![
            0x52, 0x49, 0x46, 0x46, // RIFF
            0x00, 0x00, 0x00, 0x00, // chunk size (kept empty for later)
            0x57, 0x41, 0x56, 0x45, // WAVE
        ];

        for (tag, payload) in chunks {
            bytes.extend_from_slice(tag);
            bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            bytes.extend_from_slice(payload);
        }

        // Subtract 8 for initial two words
        let chunk_size = (bytes.len() as u32 - 8).to_le_bytes();
        bytes[4..8].copy_from_slice(&chunk_size);

        bytes
    }
}

/// Slice reader that counts every byte handed out by `read`
pub(crate) struct CountingReader<'a> {
    inner: SliceReader<'a>,
    read: usize,
}

impl<'a> CountingReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: SliceReader::new(data),
            read: 0,
        }
    }

    pub fn bytes_read(&self) -> usize {
        self.read
    }
}

impl ErrorType for CountingReader<'_> {
    type Error = core::convert::Infallible;
}

impl Read for CountingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = Read::read(&mut self.inner, buf)?;
        self.read += n;
        Ok(n)
    }
}

impl Seek for CountingReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        Seek::seek(&mut self.inner, pos)
    }
}

#[cfg(feature = "async")]
impl embedded_io_async::Read for CountingReader<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = embedded_io_async::Read::read(&mut self.inner, buf).await?;
        self.read += n;
        Ok(n)
    }
}

#[cfg(feature = "async")]
impl embedded_io_async::Seek for CountingReader<'_> {
    async fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        embedded_io_async::Seek::seek(&mut self.inner, pos).await
    }
}
