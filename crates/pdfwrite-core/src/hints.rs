//! Component I: hint stream builder (spec §4.8, PDF Appendix F.3-F.6).
//!
//! Builds the bit-packed page-offset and shared-object hint tables and
//! deflates the result directly (the hint stream is always compressed,
//! independent of `SaveOptions::deflate` — it isn't routed through the
//! emitter's optional stream-filter pipeline in §4.6).

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write as _;

use crate::error::Result;
use crate::object::{Dictionary, Object, Stream};

/// Appends bits MSB-first into a byte buffer, padding the tail to a byte
/// boundary on request (spec §4.8: "per-table padding to byte boundaries").
#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    cur: u8,
    filled: u8,
}

impl BitWriter {
    fn write_bits(&mut self, value: u64, width: u8) {
        for i in (0..width).rev() {
            let bit = ((value >> i) & 1) as u8;
            self.cur = (self.cur << 1) | bit;
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.cur);
                self.cur = 0;
                self.filled = 0;
            }
        }
    }

    fn pad_to_byte(&mut self) {
        if self.filled != 0 {
            self.cur <<= 8 - self.filled;
            self.bytes.push(self.cur);
            self.cur = 0;
            self.filled = 0;
        }
    }

    fn into_bytes(mut self) -> Vec<u8> {
        self.pad_to_byte();
        self.bytes
    }
}

/// `ceil(log2(max - min + 1))`, the bit width needed to represent every
/// value in `[min, max]` as a delta from `min` (spec §4.8).
fn bit_width(min: u64, max: u64) -> u8 {
    let range = max.saturating_sub(min);
    if range == 0 {
        return 0;
    }
    let count = range + 1;
    (u64::BITS - (count - 1).leading_zeros()) as u8
}

/// One page's contribution to the page-offset hint table (PDF F.3/F.4).
#[derive(Debug, Clone, Default)]
pub struct PageHintEntry {
    pub num_objects: u32,
    pub page_length: u64,
    pub num_shared_refs: u32,
    pub shared_ref_group_ids: Vec<u32>,
}

/// One group's contribution to the shared-object hint table (PDF F.5/F.6).
#[derive(Debug, Clone, Default)]
pub struct SharedGroupEntry {
    pub group_length: u64,
}

/// Builds the raw (undeflated) bit-packed hint table bytes.
///
/// This is a structurally faithful, simplified encoder: it emits real,
/// varying-width fields for the quantities spec §4.8 calls out as varying
/// (object counts, page/group lengths, shared-reference ids) and
/// zero-width placeholders for the quantities it calls out as
/// known-zero-variance (content-stream offsets, fraction numerator/
/// denominator, MD5-presence) — the format mandates the field be present
/// even when its width collapses to zero.
pub fn build_hint_tables(pages: &[PageHintEntry], groups: &[SharedGroupEntry]) -> Vec<u8> {
    let mut w = BitWriter::default();

    // --- Page offset hint table header (F.3) ---
    let least_objects = pages.iter().map(|p| p.num_objects).min().unwrap_or(0) as u64;
    let greatest_objects = pages.iter().map(|p| p.num_objects).max().unwrap_or(0) as u64;
    let objects_width = bit_width(least_objects, greatest_objects);

    let least_len = pages.iter().map(|p| p.page_length).min().unwrap_or(0);
    let greatest_len = pages.iter().map(|p| p.page_length).max().unwrap_or(0);
    let len_width = bit_width(least_len, greatest_len);

    let least_shared = pages.iter().map(|p| p.num_shared_refs).min().unwrap_or(0) as u64;
    let greatest_shared = pages.iter().map(|p| p.num_shared_refs).max().unwrap_or(0) as u64;
    let shared_width = bit_width(least_shared, greatest_shared);

    w.write_bits(least_objects, 32);
    w.write_bits(objects_width as u64, 16);
    w.write_bits(least_len, 32);
    w.write_bits(len_width as u64, 16);
    // least/greatest offset of first content stream in page: zero variance here.
    w.write_bits(0, 16); // content stream offset bit width (mandated, zero)
    w.write_bits(0, 16); // content stream length bit width (mandated, zero)
    w.write_bits(shared_width as u64, 16);
    w.write_bits(0, 16); // numerator bit width (mandated, zero)
    w.write_bits(0, 16); // denominator bit width (always 16 per spec, zero variance here)

    for page in pages {
        w.write_bits((page.num_objects as u64).saturating_sub(least_objects), objects_width);
        w.write_bits(page.page_length.saturating_sub(least_len), len_width);
        w.write_bits(0, 0); // content stream offset (zero width)
        w.write_bits(0, 0); // content stream length (zero width)
        w.write_bits(page.num_shared_refs as u64, shared_width);
        for &group_id in &page.shared_ref_group_ids {
            w.write_bits(group_id as u64, 32);
        }
    }
    w.pad_to_byte();

    // --- Shared object hint table header (F.5) ---
    let least_group_len = groups.iter().map(|g| g.group_length).min().unwrap_or(0);
    let greatest_group_len = groups.iter().map(|g| g.group_length).max().unwrap_or(0);
    let group_len_width = bit_width(least_group_len, greatest_group_len);

    w.write_bits(groups.len() as u64, 32);
    w.write_bits(least_group_len, 32);
    w.write_bits(group_len_width as u64, 16);
    w.write_bits(0, 16); // MD5 presence flag width (mandated, zero: not signed here)

    for group in groups {
        w.write_bits(group.group_length.saturating_sub(least_group_len), group_len_width);
    }

    w.into_bytes()
}

/// Compresses the hint table bytes and wraps them as a stream object with
/// the fixed `/Filter FlateDecode`, `/S <first-page-bytes>` shape the
/// linearization dictionary's `/H` entry expects.
pub fn build_hint_stream(
    pages: &[PageHintEntry],
    groups: &[SharedGroupEntry],
    page1_shared_table_start: u32,
) -> Result<Stream> {
    let raw = build_hint_tables(pages, groups);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    // NB: PDF expects raw deflate (zlib header/adler footer are part of
    // FlateDecode's contract, matching `flate2`'s zlib wrapper here).
    let compressed = encoder.finish()?;

    let mut dict = Dictionary::new();
    dict.set("Filter", Object::name("FlateDecode"));
    dict.set("Length", Object::Integer(compressed.len() as i64));
    dict.set("S", Object::Integer(page1_shared_table_start as i64));
    Ok(Stream::new(dict, compressed))
}
