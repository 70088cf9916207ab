//! Stream filter transforms (spec §4.6): Expand, Deflate, ASCII-hex, applied
//! in that order and each independently gated by configuration.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write as _};

use crate::config::{ExpandPolicy, SaveOptions};
use crate::error::Result;
use crate::object::{Object, Stream};

const EXCLUDED_EXPAND_FILTERS: &[&str] = &[
    "CCITTFaxDecode",
    "DCTDecode",
    "RunLengthDecode",
    "JBIG2Decode",
    "JPXDecode",
];

fn filter_names(stream: &Stream) -> Vec<String> {
    match stream.dict.get(b"Filter") {
        Some(Object::Name(n)) => vec![String::from_utf8_lossy(n).into_owned()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn is_excluded_from_expansion(stream: &Stream) -> bool {
    if stream.dict.has(b"Width") && stream.dict.has(b"Height") {
        return true;
    }
    let subtype_is_image = stream
        .dict
        .get(b"Subtype")
        .and_then(|v| v.as_name_str())
        .map(|s| s == "Image")
        .unwrap_or(false);
    if subtype_is_image {
        return true;
    }
    filter_names(stream)
        .iter()
        .any(|f| EXCLUDED_EXPAND_FILTERS.contains(&f.as_str()) || f == "Type1C" || f == "CIDFontType0C")
}

fn policy_allows(policy: ExpandPolicy, stream: &Stream) -> bool {
    match policy {
        ExpandPolicy::Off => false,
        ExpandPolicy::All => true,
        ExpandPolicy::Images => stream
            .dict
            .get(b"Subtype")
            .and_then(|v| v.as_name_str())
            .map(|s| s == "Image")
            .unwrap_or(false),
        ExpandPolicy::Fonts => stream
            .dict
            .get(b"Subtype")
            .and_then(|v| v.as_name_str())
            .map(|s| s.contains("Font"))
            .unwrap_or(false),
    }
}

/// Decodes the filters this crate itself knows how to produce
/// (`FlateDecode`, `ASCIIHexDecode`) back to raw bytes, innermost filter
/// last in the chain decoded first.
///
/// An *unrecognized* filter leaves the stream untouched (`Ok(None)`) —
/// decoding arbitrary PDF filters is outside this crate's scope (spec §1
/// Non-goals: "compression codecs beyond the assumed deflate facility").
/// A *recognized* filter whose bytes don't actually decode (a corrupt
/// zlib header, truncated hex) is the "broken stream headers" Corrupt
/// error kind spec §7 names, and is surfaced as such rather than silently
/// skipped, so `continue_on_error` has a real per-object failure to catch.
fn try_decode(stream: &Stream) -> Result<Option<Vec<u8>>> {
    let names = filter_names(stream);
    let mut data = stream.content.clone();
    for name in names.iter().rev() {
        data = match name.as_str() {
            "FlateDecode" => {
                let mut decoder = ZlibDecoder::new(&data[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).map_err(|e| {
                    crate::error::PdfWriteError::Corrupt(format!("broken FlateDecode stream header: {e}"))
                })?;
                out
            }
            "ASCIIHexDecode" => decode_ascii_hex(&data).ok_or_else(|| {
                crate::error::PdfWriteError::Corrupt("broken ASCIIHexDecode stream: invalid hex digit".into())
            })?,
            _ => return Ok(None),
        };
    }
    Ok(Some(data))
}

fn decode_ascii_hex(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut hi: Option<u8> = None;
    for &b in data {
        if b == b'>' {
            break;
        }
        let v = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ if b.is_ascii_whitespace() => continue,
            _ => return None,
        };
        match hi {
            None => hi = Some(v),
            Some(h) => {
                out.push((h << 4) | v);
                hi = None;
            }
        }
    }
    if let Some(h) = hi {
        out.push(h << 4);
    }
    Some(out)
}

/// Applies the Expand/Deflate/ASCII-hex transforms in order, per §4.6.
pub fn apply_filters(stream: &mut Stream, options: &SaveOptions) -> Result<()> {
    if options.expand != ExpandPolicy::Off && !is_excluded_from_expansion(stream) && policy_allows(options.expand, stream) {
        if let Some(decoded) = try_decode(stream)? {
            stream.content = decoded;
            stream.dict.remove(b"Filter");
            stream.dict.remove(b"DecodeParms");
        }
    }

    if options.deflate && !stream.dict.has(b"Filter") {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&stream.content)?;
        stream.content = encoder.finish()?;
        stream.dict.set("Filter", Object::name("FlateDecode"));
    }

    if options.ascii && stream.content.iter().any(|&b| !is_pdf_text_byte(b)) {
        let hex = encode_ascii_hex(&stream.content);
        stream.content = hex;
        prepend_filter(stream, "ASCIIHexDecode");
    }

    stream.dict.set("Length", Object::Integer(stream.content.len() as i64));
    Ok(())
}

fn is_pdf_text_byte(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r') || (32..127).contains(&b)
}

fn encode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2 + 1);
    for &b in data {
        out.extend_from_slice(format!("{b:02X}").as_bytes());
    }
    out.push(b'>');
    out
}

fn prepend_filter(stream: &mut Stream, name: &'static str) {
    let existing = stream.dict.remove(b"Filter");
    let new_filter = match existing {
        Some(Object::Name(n)) => Object::Array(vec![Object::name(name), Object::Name(n)]),
        Some(Object::Array(mut items)) => {
            items.insert(0, Object::name(name));
            Object::Array(items)
        }
        _ => Object::name(name),
    };
    stream.dict.set("Filter", new_filter);

    if stream.dict.has(b"DecodeParms") {
        let existing_parms = stream.dict.remove(b"DecodeParms");
        let new_parms = match existing_parms {
            Some(Object::Array(mut items)) => {
                items.insert(0, Object::Null);
                Object::Array(items)
            }
            Some(other) => Object::Array(vec![Object::Null, other]),
            None => return,
        };
        stream.dict.set("DecodeParms", new_parms);
    }
}
