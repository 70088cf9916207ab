//! Per-object byte serialization (spec §4.6, §6 "File format").

use crate::object::{Dictionary, Object, StringFormat};

/// Writes `"num gen obj\n"`, the serialized value, then `"endobj\n\n"`
/// (spec §4.6). Streams are expected to already have their filter
/// transforms applied and `/Length` set to the post-transform byte count;
/// this function only emits the wrapper.
pub fn write_indirect_object(buf: &mut Vec<u8>, num: u32, gen: u16, value: &Object, tight: bool) {
    buf.extend_from_slice(format!("{num} {gen} obj\n").as_bytes());
    match value {
        Object::Stream(stream) => {
            write_value(buf, &Object::Dictionary(stream.dict.clone()), tight);
            buf.extend_from_slice(b"\nstream\n");
            buf.extend_from_slice(&stream.content);
            buf.extend_from_slice(b"\nendstream\n");
        }
        other => {
            write_value(buf, other, tight);
            buf.push(b'\n');
        }
    }
    buf.extend_from_slice(b"endobj\n\n");
}

/// Emits a `continue_on_error` placeholder (spec §7): `"num gen obj\nnull\nendobj\n"`.
pub fn write_placeholder_object(buf: &mut Vec<u8>, num: u32, gen: u16) {
    buf.extend_from_slice(format!("{num} {gen} obj\nnull\nendobj\n").as_bytes());
}

/// Digit width reserved for every numeric field in the linearization
/// parameter dictionary, matching `finalize.rs`'s `SENTINEL` convention:
/// pass 0 writes this object with placeholder (zero) values, pass 1
/// writes the real ones, and because every field is zero-padded to the
/// same fixed width in both passes, the object's byte length — and so
/// every subsequent object's offset — never moves between passes (spec
/// §9 "two-pass offset prediction").
const LINEARIZATION_FIELD_WIDTH: usize = 10;

/// The six values spec §6 lists for a linearized file's parameter dict,
/// plus the two `/H` array entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearizationParams {
    pub file_length: u64,
    pub hint_offset: u64,
    pub hint_length: u64,
    pub first_page_object: u32,
    pub end_of_first_page: u64,
    pub page_count: u32,
    pub main_xref_offset: u64,
}

fn write_padded(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(format!("{value:0width$}", width = LINEARIZATION_FIELD_WIDTH).as_bytes());
}

/// Writes the linearization parameter dictionary object with every
/// numeric field zero-padded to [`LINEARIZATION_FIELD_WIDTH`] digits, so
/// its serialized length is identical whether `params` is all zeroes
/// (pass 0's placeholder) or the real measured values (pass 1).
pub fn write_linearization_params(buf: &mut Vec<u8>, num: u32, params: &LinearizationParams) {
    buf.extend_from_slice(format!("{num} 0 obj\n<< /Linearized 1.0 /L ").as_bytes());
    write_padded(buf, params.file_length);
    buf.extend_from_slice(b" /H [ ");
    write_padded(buf, params.hint_offset);
    buf.push(b' ');
    write_padded(buf, params.hint_length);
    buf.extend_from_slice(b" ] /O ");
    write_padded(buf, params.first_page_object as u64);
    buf.extend_from_slice(b" /E ");
    write_padded(buf, params.end_of_first_page);
    buf.extend_from_slice(b" /N ");
    write_padded(buf, params.page_count as u64);
    buf.extend_from_slice(b" /T ");
    write_padded(buf, params.main_xref_offset);
    buf.extend_from_slice(b" >>\nendobj\n\n");
}

pub fn write_value(buf: &mut Vec<u8>, value: &Object, tight: bool) {
    match value {
        Object::Null => buf.extend_from_slice(b"null"),
        Object::Boolean(true) => buf.extend_from_slice(b"true"),
        Object::Boolean(false) => buf.extend_from_slice(b"false"),
        Object::Integer(i) => buf.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => buf.extend_from_slice(format_real(*r).as_bytes()),
        Object::Name(name) => write_name(buf, name),
        Object::String(bytes, format) => write_string(buf, bytes, *format),
        Object::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_value(buf, item, tight);
            }
            buf.push(b']');
        }
        Object::Dictionary(dict) => write_dict(buf, dict, tight),
        Object::Stream(stream) => write_dict(buf, &stream.dict, tight),
        Object::Reference((num, gen)) => {
            buf.extend_from_slice(format!("{num} {gen} R").as_bytes());
        }
    }
}

fn write_dict(buf: &mut Vec<u8>, dict: &Dictionary, tight: bool) {
    buf.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        if !tight {
            buf.push(b' ');
        }
        write_name(buf, key);
        buf.push(b' ');
        write_value(buf, value, tight);
    }
    if !tight {
        buf.push(b' ');
    }
    buf.extend_from_slice(b">>");
}

fn write_name(buf: &mut Vec<u8>, name: &[u8]) {
    buf.push(b'/');
    for &b in name {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
            buf.push(b);
        } else {
            buf.extend_from_slice(format!("#{b:02X}").as_bytes());
        }
    }
}

fn write_string(buf: &mut Vec<u8>, bytes: &[u8], format: StringFormat) {
    match format {
        StringFormat::Literal => {
            buf.push(b'(');
            for &b in bytes {
                match b {
                    b'(' | b')' | b'\\' => {
                        buf.push(b'\\');
                        buf.push(b);
                    }
                    b'\n' => buf.extend_from_slice(b"\\n"),
                    b'\r' => buf.extend_from_slice(b"\\r"),
                    _ => buf.push(b),
                }
            }
            buf.push(b')');
        }
        StringFormat::Hexadecimal => {
            buf.push(b'<');
            for &b in bytes {
                buf.extend_from_slice(format!("{b:02X}").as_bytes());
            }
            buf.push(b'>');
        }
    }
}

fn format_real(r: f64) -> String {
    if r == r.trunc() && r.is_finite() && r.abs() < 1e15 {
        format!("{}", r as i64)
    } else {
        let s = format!("{r:.6}");
        let trimmed = s.trim_end_matches('0');
        let trimmed = trimmed.trim_end_matches('.');
        trimmed.to_string()
    }
}

/// Returns true when this object must never be (re-)emitted directly
/// (spec §4.6): object streams are unpacked at sweep time (§10.5) and
/// never re-packed; xref streams are regenerated wholesale by the xref
/// writer, never carried over from the source document.
pub fn is_suppressed_object_type(value: &Object) -> bool {
    value
        .as_dict()
        .map(|d| d.type_is(b"ObjStm") || d.type_is(b"XRef"))
        .unwrap_or(false)
}
