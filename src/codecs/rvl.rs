//! Encoding and decoding of RVL compressed depth buffers
//!
//! RVL (run-length + variable-length) is a lossless compression scheme for 16-bit quantized
//! depth buffers: runs of zero (invalid) samples are run-length encoded, and nonzero samples
//! are stored as zigzag-encoded deltas from the previous nonzero sample, chunked into 3-bit
//! nibbles with a continuation bit. The container wraps one compressed buffer in a fixed
//! header:
//!
//! | Bytes | Description                              |
//! |-------|------------------------------------------|
//! | 4     | `"RVL\n"` magic value                    |
//! | 4     | 32-bit LE unsigned integer (width)       |
//! | 4     | 32-bit LE unsigned integer (height)      |
//! | 4     | 32-bit LE float (near plane)             |
//! | 4     | 32-bit LE float (far plane)              |
//! | n     | compressed payload                       |
//!
//! Nibbles are packed eight to a 32-bit word, most-significant nibble first; completed words
//! are serialized little-endian. A partial final word is left-shifted so unused low nibbles
//! are zero.
//!
//! # Related Links
//! * Wilson, A. D.: Fast Lossless Depth Image Compression. ISS 2017.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::buffer::Plane;
use crate::error::{
    AssetFormat, DecodingError, LimitError, LimitErrorKind, PanoError, PanoResult,
};
use crate::quantize::DepthRange;

const MAGIC: &[u8; 4] = b"RVL\n";

/// Decoded buffers larger than this many samples are rejected rather than allocated.
const MAX_SAMPLES: u64 = 1 << 31;

#[inline]
fn zigzag_encode(delta: i32) -> u32 {
    ((delta << 1) ^ (delta >> 31)) as u32
}

#[inline]
fn zigzag_decode(code: u32) -> i32 {
    ((code >> 1) as i32) ^ -((code & 1) as i32)
}

fn truncated() -> PanoError {
    PanoError::Decoding(DecodingError::new(
        AssetFormat::Rvl,
        "unexpected end of compressed stream",
    ))
}

/// Packs variable-length nibble codes into 32-bit words.
///
/// Created for one buffer's encode call and consumed by [`finish`](NibbleWriter::finish);
/// never shared across buffers.
struct NibbleWriter {
    out: Vec<u8>,
    word: u32,
    nibbles: u32,
}

impl NibbleWriter {
    fn with_capacity(samples: usize) -> NibbleWriter {
        NibbleWriter {
            // Two bytes per sample is the worst case for typical depth data.
            out: Vec::with_capacity(samples * 2),
            word: 0,
            nibbles: 0,
        }
    }

    #[inline]
    fn put_nibble(&mut self, nibble: u32) {
        self.word = (self.word << 4) | nibble;
        self.nibbles += 1;
        if self.nibbles == 8 {
            self.out.extend_from_slice(&self.word.to_le_bytes());
            self.word = 0;
            self.nibbles = 0;
        }
    }

    /// Emit `value` as 3-bit chunks, least significant first, bit 3 flagging continuation.
    fn put_vle(&mut self, mut value: u32) {
        loop {
            let mut nibble = value & 0x7;
            value >>= 3;
            if value != 0 {
                nibble |= 0x8;
            }
            self.put_nibble(nibble);
            if value == 0 {
                break;
            }
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nibbles != 0 {
            let word = self.word << (4 * (8 - self.nibbles));
            self.out.extend_from_slice(&word.to_le_bytes());
        }
        self.out
    }
}

/// Unpacks variable-length nibble codes from a packed byte stream.
struct NibbleReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    word: u32,
    nibbles: u32,
}

impl<'a> NibbleReader<'a> {
    fn new(bytes: &'a [u8]) -> NibbleReader<'a> {
        NibbleReader {
            bytes,
            pos: 0,
            word: 0,
            nibbles: 0,
        }
    }

    #[inline]
    fn get_nibble(&mut self) -> PanoResult<u32> {
        if self.nibbles == 0 {
            if self.pos + 4 > self.bytes.len() {
                return Err(truncated());
            }
            self.word = u32::from_le_bytes([
                self.bytes[self.pos],
                self.bytes[self.pos + 1],
                self.bytes[self.pos + 2],
                self.bytes[self.pos + 3],
            ]);
            self.pos += 4;
            self.nibbles = 8;
        }
        let nibble = self.word >> 28;
        self.word <<= 4;
        self.nibbles -= 1;
        Ok(nibble)
    }

    fn get_vle(&mut self) -> PanoResult<u32> {
        let mut value = 0u32;
        let mut shift = 0u32;
        loop {
            let nibble = self.get_nibble()?;
            value |= (nibble & 0x7) << shift;
            if nibble & 0x8 == 0 {
                return Ok(value);
            }
            shift += 3;
            if shift > 30 {
                return Err(PanoError::Decoding(DecodingError::new(
                    AssetFormat::Rvl,
                    "variable-length code exceeds 32 bits",
                )));
            }
        }
    }
}

/// Compress a flat sequence of 16-bit quantized depth samples.
pub fn compress(values: &[u16]) -> Vec<u8> {
    let mut writer = NibbleWriter::with_capacity(values.len());
    let mut previous = 0i32;
    let mut i = 0;
    while i < values.len() {
        let zeros = values[i..].iter().take_while(|&&v| v == 0).count();
        i += zeros;
        writer.put_vle(zeros as u32);

        let nonzeros = values[i..].iter().take_while(|&&v| v != 0).count();
        writer.put_vle(nonzeros as u32);
        for &value in &values[i..i + nonzeros] {
            let current = i32::from(value);
            writer.put_vle(zigzag_encode(current - previous));
            previous = current;
        }
        i += nonzeros;
    }
    writer.finish()
}

/// Decompress a packed RVL stream back into `count` samples.
///
/// Fails if the stream is truncated, if a run overruns the declared sample count, or if a
/// delta leaves the 16-bit range.
pub fn decompress(bytes: &[u8], count: usize) -> PanoResult<Vec<u16>> {
    let mut reader = NibbleReader::new(bytes);
    let mut values = Vec::with_capacity(count);
    let mut previous = 0i32;
    while values.len() < count {
        let zeros = reader.get_vle()? as usize;
        let nonzeros = reader.get_vle()? as usize;
        if zeros + nonzeros > count - values.len() {
            return Err(PanoError::Decoding(DecodingError::new(
                AssetFormat::Rvl,
                "run lengths overrun the declared sample count",
            )));
        }
        values.resize(values.len() + zeros, 0);
        for _ in 0..nonzeros {
            let current = previous + zigzag_decode(reader.get_vle()?);
            let sample = u16::try_from(current).map_err(|_| {
                PanoError::Decoding(DecodingError::new(
                    AssetFormat::Rvl,
                    "delta leaves the 16-bit sample range",
                ))
            })?;
            values.push(sample);
            previous = current;
        }
    }
    Ok(values)
}

/// RVL container encoder
pub struct RvlEncoder<W: Write> {
    w: W,
}

impl<W: Write> RvlEncoder<W> {
    /// Create a new encoder that writes its output to `w`. The writer should be buffered.
    pub fn new(buffered_writer: W) -> RvlEncoder<W> {
        RvlEncoder { w: buffered_writer }
    }

    /// Write one quantized depth buffer and its depth range as a complete container.
    pub fn encode(mut self, quantized: &Plane<u16>, range: DepthRange) -> PanoResult<()> {
        let (width, height) = quantized.dimensions();
        self.w.write_all(MAGIC)?;
        self.w.write_u32::<LittleEndian>(width)?;
        self.w.write_u32::<LittleEndian>(height)?;
        self.w.write_f32::<LittleEndian>(range.near())?;
        self.w.write_f32::<LittleEndian>(range.far())?;
        self.w.write_all(&compress(quantized.as_raw()))?;
        self.w.flush()?;
        Ok(())
    }
}

/// RVL container decoder. Immediately reads the header from the stream.
pub struct RvlDecoder<R: Read> {
    r: R,
    width: u32,
    height: u32,
    range: DepthRange,
}

impl<R: Read> RvlDecoder<R> {
    /// Create a new decoder that decodes from the stream `r`, validating the magic bytes
    /// and header. The reader should be buffered.
    pub fn new(mut r: R) -> PanoResult<RvlDecoder<R>> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)
            .map_err(|err| PanoError::Decoding(DecodingError::new(AssetFormat::Rvl, err)))?;
        if &magic != MAGIC {
            return Err(PanoError::Decoding(DecodingError::new(
                AssetFormat::Rvl,
                format!("invalid magic: {magic:02x?}"),
            )));
        }

        let mut read_field = |r: &mut R| {
            r.read_u32::<LittleEndian>()
                .map_err(|err| PanoError::Decoding(DecodingError::new(AssetFormat::Rvl, err)))
        };
        let width = read_field(&mut r)?;
        let height = read_field(&mut r)?;
        let near = f32::from_bits(read_field(&mut r)?);
        let far = f32::from_bits(read_field(&mut r)?);
        let range = DepthRange::new(near, far)?;

        if u64::from(width) * u64::from(height) > MAX_SAMPLES {
            return Err(PanoError::Limits(LimitError::from_kind(
                LimitErrorKind::DimensionError,
            )));
        }

        Ok(RvlDecoder {
            r,
            width,
            height,
            range,
        })
    }

    /// The dimensions of the contained buffer.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The near/far planes the buffer was quantized against.
    pub fn depth_range(&self) -> DepthRange {
        self.range
    }

    /// Read and decompress the payload.
    pub fn decode(mut self) -> PanoResult<Plane<u16>> {
        let mut payload = Vec::new();
        self.r.read_to_end(&mut payload)?;
        let count = self.width as usize * self.height as usize;
        let values = decompress(&payload, count)?;
        Ok(Plane::from_raw(self.width, self.height, values)
            .expect("decompress returns exactly count samples"))
    }
}

/// Write one quantized depth buffer as an RVL container file, replacing any existing file.
pub fn write_rvl_file(
    path: impl AsRef<Path>,
    quantized: &Plane<u16>,
    range: DepthRange,
) -> PanoResult<()> {
    RvlEncoder::new(BufWriter::new(File::create(path)?)).encode(quantized, range)
}

/// Read an RVL container file back into a quantized depth buffer and its depth range.
pub fn read_rvl_file(path: impl AsRef<Path>) -> PanoResult<(Plane<u16>, DepthRange)> {
    let decoder = RvlDecoder::new(BufReader::new(File::open(path)?))?;
    let range = decoder.depth_range();
    Ok((decoder.decode()?, range))
}
