use crate::chunk::{Chunk, ChunkInventory, ChunkScanner};
use crate::cursor::Cursor;
use crate::error::{Error, ReadError};
use crate::fmt::{AudioFormat, FMT_FIELDS_LEN, Fmt, check_fmt_chunk};
use crate::io::File;
use crate::rms::RmsAccumulator;
use embedded_io::{Read, Seek};
use log::{debug, warn};

/// Processing depth requested from [`parse`]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// chunk walk and format validation only
    Shallow,
    /// additionally stream the `data` chunk and compute its RMS
    Deep,
}

/// Depth marker of a [`Wave`] that was only shallow parsed, it carries no RMS
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Shallow;

/// Depth marker of a deep parsed [`Wave`]
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Deep {
    rms: f64,
}

/// Structural view of a parsed WAVE stream.
///
/// The model is immutable and owns no stream. `D` records how deep the parse
/// went: only `Wave<Deep>` has an [`rms`](Wave::rms) accessor.
#[derive(Debug, PartialEq, Clone)]
pub struct Wave<D = Shallow> {
    fmt: Fmt,
    inventory: ChunkInventory,
    depth: D,
}

impl<D> Wave<D> {
    /// Validated fields of the `fmt ` chunk
    pub fn fmt(&self) -> &Fmt {
        &self.fmt
    }

    /// Every chunk in file order
    pub fn chunks(&self) -> &[Chunk] {
        &self.inventory.chunks
    }

    /// The single `fmt ` chunk
    pub fn fmt_chunk(&self) -> Chunk {
        self.inventory.fmt_chunk()
    }

    /// The single `data` chunk
    pub fn data_chunk(&self) -> Chunk {
        self.inventory.data_chunk()
    }

    /// Duration in seconds, the `data` chunk length over the byte rate
    pub fn audio_length(&self) -> f64 {
        self.fmt.audio_length(&self.data_chunk())
    }
}

impl Wave<Shallow> {
    /// Compute the RMS of this model's `data` chunk from `reader`.
    ///
    /// `reader` must hold the same bytes this model was parsed from, only the
    /// `data` payload is read again.
    pub fn deepen<R>(self, reader: &mut R) -> Result<Wave<Deep>, ReadError<R::Error>>
    where
        R: Read + Seek,
    {
        let mut cursor = Cursor::new(reader)?;
        let rms = compute_rms(&mut cursor, &self.fmt, &self.data_chunk())?;
        Ok(Wave {
            fmt: self.fmt,
            inventory: self.inventory,
            depth: Deep { rms },
        })
    }
}

impl Wave<Deep> {
    /// Root-mean-square over every sample of the `data` chunk
    pub fn rms(&self) -> f64 {
        self.depth.rms
    }
}

/// A [`Wave`] whose depth was chosen at runtime through [`Mode`]
#[derive(Debug, PartialEq, Clone)]
pub enum ParsedWave {
    /// result of [`Mode::Shallow`]
    Shallow(Wave<Shallow>),
    /// result of [`Mode::Deep`]
    Deep(Wave<Deep>),
}

impl ParsedWave {
    /// Depth this model was parsed at
    pub fn mode(&self) -> Mode {
        match self {
            ParsedWave::Shallow(_) => Mode::Shallow,
            ParsedWave::Deep(_) => Mode::Deep,
        }
    }

    /// RMS of the `data` chunk, [`Error::PrematureAccess`] unless deep parsed
    pub fn rms(&self) -> Result<f64, Error> {
        match self {
            ParsedWave::Deep(wave) => Ok(wave.rms()),
            ParsedWave::Shallow(_) => Err(Error::PrematureAccess),
        }
    }

    /// Validated fields of the `fmt ` chunk
    pub fn fmt(&self) -> &Fmt {
        match self {
            ParsedWave::Shallow(wave) => wave.fmt(),
            ParsedWave::Deep(wave) => wave.fmt(),
        }
    }

    /// Every chunk in file order
    pub fn chunks(&self) -> &[Chunk] {
        match self {
            ParsedWave::Shallow(wave) => wave.chunks(),
            ParsedWave::Deep(wave) => wave.chunks(),
        }
    }

    /// Duration in seconds
    pub fn audio_length(&self) -> f64 {
        match self {
            ParsedWave::Shallow(wave) => wave.audio_length(),
            ParsedWave::Deep(wave) => wave.audio_length(),
        }
    }
}

/// Collects validated pieces of a parse and freezes them into a [`Wave`]
#[derive(Debug)]
pub(crate) struct WaveBuilder {
    inventory: ChunkInventory,
    fmt: Fmt,
    rms: Option<f64>,
}

impl WaveBuilder {
    pub fn new(inventory: ChunkInventory, fmt: Fmt) -> Self {
        Self {
            inventory,
            fmt,
            rms: None,
        }
    }

    pub fn rms(&mut self, rms: f64) -> &mut Self {
        self.rms = Some(rms);
        self
    }

    pub fn build_shallow(self) -> Wave<Shallow> {
        Wave {
            fmt: self.fmt,
            inventory: self.inventory,
            depth: Shallow,
        }
    }

    pub fn build_deep(self) -> Result<Wave<Deep>, Error> {
        let rms = self.rms.ok_or(Error::PrematureAccess)?;
        Ok(Wave {
            fmt: self.fmt,
            inventory: self.inventory,
            depth: Deep { rms },
        })
    }
}

fn scan<R>(cursor: &mut Cursor<'_, R>) -> Result<ChunkInventory, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let stream_len = cursor.stream_len()?;
    let mut scanner = ChunkScanner::new(stream_len)?;

    let riff = cursor.read_tag()?;
    let declared = cursor.read_u32_le()?;
    let wave = cursor.read_tag()?;
    scanner.open(riff, declared, wave)?;

    while !scanner.is_done() {
        scanner.expect_header()?;
        let tag = cursor.read_tag()?;
        let len = cursor.read_u32_le()?;
        scanner.push(tag, len)?;
        cursor.seek_to(scanner.position())?;
    }

    Ok(scanner.finish()?)
}

fn read_fmt<R>(
    cursor: &mut Cursor<'_, R>,
    inventory: &ChunkInventory,
) -> Result<Fmt, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let chunk = inventory.fmt_chunk();
    check_fmt_chunk(&chunk)?;

    cursor.seek_to(chunk.offset)?;
    let fmt = Fmt::from_bytes(&cursor.read_array::<FMT_FIELDS_LEN>()?);
    fmt.validate()?;

    Ok(fmt)
}

fn compute_rms<R>(
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

    cursor.seek_to(data.offset)?;
    let mut buffer = vec![0; RmsAccumulator::buffer_len(fmt.block_align, data.len)];
    let mut remaining = data.len as usize;

    while remaining > 0 {
        let n = remaining.min(buffer.len());
        cursor.read_into(&mut buffer[..n])?;
        acc.feed(&buffer[..n]);
        remaining -= n;
    }

    if acc.dropped() > 0 {
        warn!("ignoring {} trailing bytes of a partial sample", acc.dropped());
    }

    Ok(acc.finish()?)
}

fn parse_with<R>(reader: &mut R, mode: Mode) -> Result<WaveBuilder, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let mut cursor = Cursor::new(reader)?;

    let inventory = scan(&mut cursor)?;
    let fmt = read_fmt(&mut cursor, &inventory)?;
    debug!("{} chunks, {}", inventory.chunks.len(), fmt);

    let data = inventory.data_chunk();
    let mut builder = WaveBuilder::new(inventory, fmt);
    if mode == Mode::Deep {
        builder.rms(compute_rms(&mut cursor, &fmt, &data)?);
    }

    Ok(builder)
}

/// Walk the chunks of a WAVE stream and validate its format.
///
/// The stream is read from offset 0 and is left open, the caller owns it.
///
/// ```
/// use wavscan::{SliceReader, shallow_parse};
///
/// let bytes: [u8; 48] = [
///     0x52, 0x49, 0x46, 0x46, // RIFF
///     0x28, 0x00, 0x00, 0x00, // chunk size
///     0x57, 0x41, 0x56, 0x45, // WAVE
///     0x66, 0x6d, 0x74, 0x20, // fmt_
///     0x10, 0x00, 0x00, 0x00, // chunk size
///     0x01, 0x00, // audio format
///     0x01, 0x00, // num channels
///     0x80, 0x3e, 0x00, 0x00, // sample rate
///     0x00, 0x7d, 0x00, 0x00, // byte rate
///     0x02, 0x00, // block align
///     0x10, 0x00, // bits per sample
///     0x64, 0x61, 0x74, 0x61, // data
///     0x04, 0x00, 0x00, 0x00, // chunk size
///     0x64, 0x00, 0x9c, 0xff, // samples
/// ];
///
/// let wave = shallow_parse(&mut SliceReader::new(&bytes)).unwrap();
///
/// assert_eq!(wave.fmt().sample_rate, 16_000);
/// assert_eq!(wave.fmt().num_channels, 1);
/// assert_eq!(wave.audio_length(), 4.0 / 32_000.0);
/// ```
pub fn shallow_parse<R>(reader: &mut R) -> Result<Wave<Shallow>, ReadError<R::Error>>
where
    R: Read + Seek,
{
    Ok(parse_with(reader, Mode::Shallow)?.build_shallow())
}

/// Like [`shallow_parse`], then stream the `data` chunk to compute its RMS
pub fn deep_parse<R>(reader: &mut R) -> Result<Wave<Deep>, ReadError<R::Error>>
where
    R: Read + Seek,
{
    Ok(parse_with(reader, Mode::Deep)?.build_deep()?)
}

/// Parse at a depth chosen at runtime
pub fn parse<R>(reader: &mut R, mode: Mode) -> Result<ParsedWave, ReadError<R::Error>>
where
    R: Read + Seek,
{
    let builder = parse_with(reader, mode)?;
    Ok(match mode {
        Mode::Shallow => ParsedWave::Shallow(builder.build_shallow()),
        Mode::Deep => ParsedWave::Deep(builder.build_deep()?),
    })
}

/// Open `path` read-only and [`shallow_parse`] it. The file is closed on return.
pub fn shallow_parse_file(
    path: impl AsRef<std::path::Path>,
) -> Result<Wave<Shallow>, ReadError<std::io::Error>> {
    let mut file = File::open(path).map_err(ReadError::Reader)?;
    shallow_parse(&mut file)
}

/// Open `path` read-only and [`deep_parse`] it. The file is closed on return.
pub fn deep_parse_file(
    path: impl AsRef<std::path::Path>,
) -> Result<Wave<Deep>, ReadError<std::io::Error>> {
    let mut file = File::open(path).map_err(ReadError::Reader)?;
    deep_parse(&mut file)
}
