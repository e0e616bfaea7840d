//! Async entry points over [`embedded_io_async`] streams.
//!
//! The chunk walk, format checks and RMS accumulation are the same state
//! machines the blocking API drives, only the reads and seeks are awaited.

use crate::chunk::{Chunk, ChunkInventory, ChunkScanner};
use crate::error::{Error, ReadError};
use crate::fmt::{AudioFormat, FMT_FIELDS_LEN, Fmt, check_fmt_chunk};
use crate::io::TokioFile;
use crate::rms::RmsAccumulator;
use crate::wave::{Deep, Mode, ParsedWave, Shallow, Wave, WaveBuilder};
use embedded_io_async::{Read, ReadExactError, Seek, SeekFrom};
use log::{debug, warn};

/// Async version of [`crate::Cursor`]
pub struct Cursor<'r, R> {
    reader: &'r mut R,
    pos: u64,
}

impl<'r, R> Cursor<'r, R>
where
    R: Read + Seek,
{
    /// Wrap a reader, the cursor starts wherever the reader currently is
    pub async fn new(reader: &'r mut R) -> Result<Self, ReadError<R::Error>> {
        let pos = reader.stream_position().await.map_err(ReadError::Reader)?;
        Ok(Self { reader, pos })
    }

    /// Total stream length. Leaves the cursor at offset 0.
    pub async fn stream_len(&mut self) -> Result<u64, ReadError<R::Error>> {
        let len = self
            .reader
            .seek(SeekFrom::End(0))
            .await
            .map_err(ReadError::Reader)?;
        self.seek_to(0).await?;
        Ok(len)
    }

    /// Current offset from the start of the stream
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Jump to an absolute offset
    pub async fn seek_to(&mut self, offset: u64) -> Result<(), ReadError<R::Error>> {
        self.pos = self
            .reader
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(ReadError::Reader)?;
        Ok(())
    }

    /// Fill `buf` completely or fail with [`Error::TruncatedRead`]
    pub async fn read_into(&mut self, buf: &mut [u8]) -> Result<(), ReadError<R::Error>> {
        match self.reader.read_exact(buf).await {
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
    pub async fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError<R::Error>> {
        let mut buf = [0; N];
        self.read_into(&mut buf).await?;
        Ok(buf)
    }

    /// Read a four character chunk tag
    pub async fn read_tag(&mut self) -> Result<[u8; 4], ReadError<R::Error>> {
        self.read_array().await
    }

    /// Read a little-endian `u32`
    pub async fn read_u32_le(&mut self) -> Result<u32, ReadError<R::Error>> {
        self.read_array().await.map(u32::from_le_bytes)
    }
}

async fn scan<R>(cursor: &mut Cursor<'_, R>) -> Result<ChunkInventory, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let stream_len = cursor.stream_len().await?;
    let mut scanner = ChunkScanner::new(stream_len)?;

    let riff = cursor.read_tag().await?;
    let declared = cursor.read_u32_le().await?;
    let wave = cursor.read_tag().await?;
    scanner.open(riff, declared, wave)?;

    while !scanner.is_done() {
        scanner.expect_header()?;
        let tag = cursor.read_tag().await?;
        let len = cursor.read_u32_le().await?;
        scanner.push(tag, len)?;
        cursor.seek_to(scanner.position()).await?;
    }

    Ok(scanner.finish()?)
}

async fn read_fmt<R>(
    cursor: &mut Cursor<'_, R>,
    inventory: &ChunkInventory,
) -> Result<Fmt, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let chunk = inventory.fmt_chunk();
    check_fmt_chunk(&chunk)?;

    cursor.seek_to(chunk.offset).await?;
    let fmt = Fmt::from_bytes(&cursor.read_array::<FMT_FIELDS_LEN>().await?);
    fmt.validate()?;

    Ok(fmt)
}

async fn compute_rms<R>(
    cursor: &mut Cursor<'_, R>,
    fmt: &Fmt,
    data: &Chunk,
) -> Result<f64, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let mut acc = RmsAccumulator::new(fmt.bit_depth)?;
    if fmt.audio_format() != AudioFormat::Pcm {
        warn!(
            "computing RMS over non-PCM format tag {:#06x} as integer samples",
            fmt.format_tag
        );
    }

    cursor.seek_to(data.offset).await?;
    let mut buffer = vec![0; RmsAccumulator::buffer_len(fmt.block_align, data.len)];
    let mut remaining = data.len as usize;

    while remaining > 0 {
        let n = remaining.min(buffer.len());
        cursor.read_into(&mut buffer[..n]).await?;
        acc.feed(&buffer[..n]);
        remaining -= n;
    }

    if acc.dropped() > 0 {
        warn!("ignoring {} trailing bytes of a partial sample", acc.dropped());
    }

    Ok(acc.finish()?)
}

async fn parse_with<R>(reader: &mut R, mode: Mode) -> Result<WaveBuilder, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let mut cursor = Cursor::new(reader).await?;

    let inventory = scan(&mut cursor).await?;
    let fmt = read_fmt(&mut cursor, &inventory).await?;
    debug!("{} chunks, {}", inventory.chunks.len(), fmt);

    let data = inventory.data_chunk();
    let mut builder = WaveBuilder::new(inventory, fmt);
    if mode == Mode::Deep {
        builder.rms(compute_rms(&mut cursor, &fmt, &data).await?);
    }

    Ok(builder)
}

/// Async version of [`crate::shallow_parse`]
pub async fn shallow_parse<R>(reader: &mut R) -> Result<Wave<Shallow>, ReadError<R::Error>>
where
    R: Read + Seek,
{
    Ok(parse_with(reader, Mode::Shallow).await?.build_shallow())
}

/// Async version of [`crate::deep_parse`]
pub async fn deep_parse<R>(reader: &mut R) -> Result<Wave<Deep>, ReadError<R::Error>>
where
    R: Read + Seek,
{
    Ok(parse_with(reader, Mode::Deep).await?.build_deep()?)
}

/// Async version of [`crate::parse`]
pub async fn parse<R>(reader: &mut R, mode: Mode) -> Result<ParsedWave, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let builder = parse_with(reader, mode).await?;
    Ok(match mode {
        Mode::Shallow => ParsedWave::Shallow(builder.build_shallow()),
        Mode::Deep => ParsedWave::Deep(builder.build_deep()?),
    })
}

/// Open `path` with tokio and [`shallow_parse`] it
pub async fn shallow_parse_file(
    path: impl AsRef<std::path::Path>,
) -> Result<Wave<Shallow>, ReadError<std::io::Error>> {
    let mut file = TokioFile::open(path).await.map_err(ReadError::Reader)?;
    shallow_parse(&mut file).await
}

/// Open `path` with tokio and [`deep_parse`] it
pub async fn deep_parse_file(
    path: impl AsRef<std::path::Path>,
) -> Result<Wave<Deep>, ReadError<std::io::Error>> {
    let mut file = TokioFile::open(path).await.map_err(ReadError::Reader)?;
    deep_parse(&mut file).await
}
