//! Gravitas-Pack: symbolic metadata compression.
//!
//! Rewrites well-known field names and common string fragments (path
//! prefixes, URL schemes, file extensions) to single-byte glyphs and
//! serializes the record compactly. Unknown keys and values pass through
//! as literals, so arbitrary records still round-trip, just with a lower
//! compression ratio.
//!
//! # Wire format (version 1)
//!
//! ```text
//! [0xE5][version][field_count u16 LE] field*
//! field  := key value
//! key    := 0x80|idx                      known field glyph
//!         | 0x00 len:u16 bytes            literal key
//! value  := 0x10 seg* 0xFF                string (segment stream)
//!         | 0x11 zigzag-varint            integer
//!         | 0x12 f64 LE                   float
//!         | 0x13 0x00|0x01                bool
//!         | 0x14                          null
//!         | 0x15 zigzag-varint            UTC timestamp folded to epoch seconds
//! seg    := 0x80|idx                      segment glyph
//!         | 0x00 len:u16 bytes            literal run
//! ```
//!
//! Timestamps are folded only when re-rendering the epoch seconds
//! reproduces the original string byte-for-byte, so the round trip stays
//! exact for every input.

mod glyphs;
mod stats;

#[cfg(test)]
mod tests;

pub use stats::{PackStats, PackStatsSnapshot};

use chrono::{DateTime, NaiveDateTime};
use tracing::trace;

use crate::error::PackError;
use crate::types::{MetadataValue, Record};

use glyphs::{field_glyph, longest_segment_match, FIELD_GLYPHS, SEGMENT_GLYPHS};

/// First byte of every packed record.
const MAGIC: u8 = 0xE5;
/// Format version this build writes and reads.
const VERSION: u8 = 1;

/// Timestamp shape eligible for epoch folding.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const KEY_LITERAL: u8 = 0x00;
const SEG_LITERAL: u8 = 0x00;
const SEG_END: u8 = 0xFF;
const GLYPH_BIT: u8 = 0x80;

const TAG_STR: u8 = 0x10;
const TAG_INT: u8 = 0x11;
const TAG_FLOAT: u8 = 0x12;
const TAG_BOOL: u8 = 0x13;
const TAG_NULL: u8 = 0x14;
const TAG_EPOCH: u8 = 0x15;

// ============================================================================
// PACKER
// ============================================================================

/// Symbolic metadata compressor with atomic statistics.
///
/// Stateless apart from counters; cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct GravitasPacker {
    stats: PackStats,
}

impl GravitasPacker {
    /// New packer with zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress a metadata record to its packed byte form.
    ///
    /// # Errors
    /// [`PackError::FieldTooLarge`] when a key name or the field count
    /// exceeds the encodable limits.
    pub fn compress(&self, record: &Record) -> Result<Vec<u8>, PackError> {
        if record.len() > u16::MAX as usize {
            return Err(PackError::FieldTooLarge {
                key: String::new(),
                reason: format!("{} fields exceed the u16 field count", record.len()),
            });
        }

        let mut out = Vec::with_capacity(16 + record.len() * 8);
        out.push(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&(record.len() as u16).to_le_bytes());

        for (key, value) in record {
            encode_key(&mut out, key)?;
            encode_value(&mut out, value);
        }

        // Raw size measured as the JSON rendering, the uncompressed form
        // the API layer would otherwise store.
        let raw = serde_json::to_vec(record).map(|v| v.len()).unwrap_or(0);
        self.stats.record_pack(raw, out.len());
        trace!(raw, packed = out.len(), "packed metadata record");
        Ok(out)
    }

    /// Decompress a packed byte form back to the exact original record.
    ///
    /// # Errors
    /// [`PackError::Corrupted`] at the first byte that does not parse;
    /// [`PackError::UnsupportedVersion`] for records written by an
    /// unknown format version.
    pub fn decompress(&self, bytes: &[u8]) -> Result<Record, PackError> {
        let mut reader = Reader::new(bytes);

        let magic = reader.u8("magic byte")?;
        if magic != MAGIC {
            return Err(reader.corrupt(format!("bad magic byte 0x{magic:02X}")));
        }
        let version = reader.u8("version byte")?;
        if version != VERSION {
            return Err(PackError::UnsupportedVersion {
                found: version,
                expected: VERSION,
            });
        }

        let field_count = reader.u16("field count")?;
        let mut record = Record::new();
        for _ in 0..field_count {
            let key = decode_key(&mut reader)?;
            let value = decode_value(&mut reader)?;
            record.insert(key, value);
        }

        if !reader.is_empty() {
            return Err(reader.corrupt("trailing bytes after final field".to_string()));
        }

        self.stats.record_unpack();
        Ok(record)
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> PackStatsSnapshot {
        self.stats.snapshot()
    }

    /// Reset statistics to zero.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

// ============================================================================
// ENCODING
// ============================================================================

fn encode_key(out: &mut Vec<u8>, key: &str) -> Result<(), PackError> {
    if let Some(idx) = field_glyph(key) {
        out.push(GLYPH_BIT | idx);
        return Ok(());
    }
    let bytes = key.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(PackError::FieldTooLarge {
            key: key.chars().take(32).collect(),
            reason: format!("key name of {} bytes exceeds the u16 limit", bytes.len()),
        });
    }
    out.push(KEY_LITERAL);
    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn encode_value(out: &mut Vec<u8>, value: &MetadataValue) {
    match value {
        MetadataValue::Str(s) => {
            if let Some(epoch) = fold_timestamp(s) {
                out.push(TAG_EPOCH);
                encode_varint(out, zigzag(epoch));
            } else {
                out.push(TAG_STR);
                encode_segments(out, s.as_bytes());
                out.push(SEG_END);
            }
        }
        MetadataValue::Int(i) => {
            out.push(TAG_INT);
            encode_varint(out, zigzag(*i));
        }
        MetadataValue::Float(f) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&f.to_le_bytes());
        }
        MetadataValue::Bool(b) => {
            out.push(TAG_BOOL);
            out.push(*b as u8);
        }
        MetadataValue::Null => out.push(TAG_NULL),
    }
}

/// Greedy longest-match glyph substitution over a string's bytes.
fn encode_segments(out: &mut Vec<u8>, mut input: &[u8]) {
    let mut literal: Vec<u8> = Vec::new();
    while !input.is_empty() {
        if let Some((idx, len)) = longest_segment_match(input) {
            flush_literal(out, &mut literal);
            out.push(GLYPH_BIT | idx);
            input = &input[len..];
        } else {
            literal.push(input[0]);
            input = &input[1..];
        }
    }
    flush_literal(out, &mut literal);
}

fn flush_literal(out: &mut Vec<u8>, literal: &mut Vec<u8>) {
    // Runs longer than u16::MAX split into consecutive literal segments.
    for chunk in literal.chunks(u16::MAX as usize) {
        out.push(SEG_LITERAL);
        out.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
        out.extend_from_slice(chunk);
    }
    literal.clear();
}

/// Fold an ISO-8601 UTC second-precision timestamp to epoch seconds,
/// but only when re-rendering reproduces the input exactly.
fn fold_timestamp(s: &str) -> Option<i64> {
    let parsed = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()?;
    let rendered = parsed.format(TIMESTAMP_FORMAT).to_string();
    (rendered == s).then(|| parsed.and_utc().timestamp())
}

fn unfold_timestamp(epoch: i64) -> Option<String> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.naive_utc().format(TIMESTAMP_FORMAT).to_string())
}

// ============================================================================
// DECODING
// ============================================================================

/// Cursor over packed bytes; every failure carries the byte offset.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn corrupt(&self, reason: String) -> PackError {
        PackError::Corrupted {
            offset: self.pos,
            reason,
        }
    }

    fn u8(&mut self, what: &str) -> Result<u8, PackError> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| self.corrupt(format!("truncated before {what}")))?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self, what: &str) -> Result<u16, PackError> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn f64(&mut self, what: &str) -> Result<f64, PackError> {
        let bytes = self.take(8, what)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(arr))
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], PackError> {
        if self.pos + n > self.buf.len() {
            return Err(self.corrupt(format!("truncated inside {what}")));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn varint(&mut self, what: &str) -> Result<u64, PackError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.u8(what)?;
            if shift >= 64 {
                return Err(self.corrupt(format!("varint overflow in {what}")));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}

fn decode_key(reader: &mut Reader<'_>) -> Result<String, PackError> {
    let head = reader.u8("key atom")?;
    if head & GLYPH_BIT != 0 {
        let idx = (head & 0x7F) as usize;
        return FIELD_GLYPHS
            .get(idx)
            .map(|k| (*k).to_string())
            .ok_or_else(|| reader.corrupt(format!("unknown field glyph {idx}")));
    }
    if head != KEY_LITERAL {
        return Err(reader.corrupt(format!("bad key atom head 0x{head:02X}")));
    }
    let len = reader.u16("key length")? as usize;
    let bytes = reader.take(len, "key bytes")?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| reader.corrupt("key is not valid UTF-8".to_string()))
}

fn decode_value(reader: &mut Reader<'_>) -> Result<MetadataValue, PackError> {
    let tag = reader.u8("value tag")?;
    match tag {
        TAG_STR => {
            let mut assembled: Vec<u8> = Vec::new();
            loop {
                let head = reader.u8("segment head")?;
                if head == SEG_END {
                    break;
                }
                if head & GLYPH_BIT != 0 {
                    let idx = (head & 0x7F) as usize;
                    let fragment = SEGMENT_GLYPHS
                        .get(idx)
                        .ok_or_else(|| reader.corrupt(format!("unknown segment glyph {idx}")))?;
                    assembled.extend_from_slice(fragment.as_bytes());
                } else if head == SEG_LITERAL {
                    let len = reader.u16("literal run length")? as usize;
                    assembled.extend_from_slice(reader.take(len, "literal run")?);
                } else {
                    return Err(reader.corrupt(format!("bad segment head 0x{head:02X}")));
                }
            }
            String::from_utf8(assembled)
                .map(MetadataValue::Str)
                .map_err(|_| reader.corrupt("string value is not valid UTF-8".to_string()))
        }
        TAG_INT => Ok(MetadataValue::Int(unzigzag(reader.varint("integer value")?))),
        TAG_FLOAT => Ok(MetadataValue::Float(reader.f64("float value")?)),
        TAG_BOOL => match reader.u8("bool value")? {
            0 => Ok(MetadataValue::Bool(false)),
            1 => Ok(MetadataValue::Bool(true)),
            other => Err(reader.corrupt(format!("bad bool byte 0x{other:02X}"))),
        },
        TAG_NULL => Ok(MetadataValue::Null),
        TAG_EPOCH => {
            let epoch = unzigzag(reader.varint("epoch value")?);
            unfold_timestamp(epoch)
                .map(MetadataValue::Str)
                .ok_or_else(|| reader.corrupt(format!("epoch {epoch} out of timestamp range")))
        }
        other => Err(reader.corrupt(format!("unknown value tag 0x{other:02X}"))),
    }
}

// ============================================================================
// VARINT
// ============================================================================

fn encode_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

#[inline]
fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[inline]
fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}
