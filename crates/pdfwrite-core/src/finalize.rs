//! Signature finalization post-pass (spec §6 "Signature finalization",
//! SPEC_FULL §10.5), grounded on `docsign-web`'s `signer.rs`: a
//! placeholder `/ByteRange` and `/Contents` are written during the normal
//! save, then this pass reopens the bytes, locates every sentinel,
//! rewrites the real spans, and splices in the caller's digest.

use crate::error::{PdfWriteError, Result};

/// The pre-sized sentinel values `signer.rs`'s placeholder pass writes:
/// four `INT_MAX`-style markers so the `/ByteRange` array's byte width
/// never changes when the real offsets are patched in.
const SENTINEL: &str = "9999999999";

/// A located `/ByteRange [...]` placeholder plus its paired `/Contents` hex
/// string, both as byte-offset spans into the file buffer.
#[derive(Debug, Clone, Copy)]
pub struct SignatureSlot {
    pub byte_range_span: (usize, usize),
    pub contents_span: (usize, usize),
}

/// Scans `data` for every `/ByteRange [0 9999999999 9999999999 9999999999]`
/// sentinel array and its associated `/Contents <...>` hex string
/// (spec §10.5: "generalized ... to scanning for all sentinel ...
/// arrays produced by the writer").
pub fn locate_signature_slots(data: &[u8]) -> Vec<SignatureSlot> {
    let needle = format!("/ByteRange [0 {SENTINEL} {SENTINEL} {SENTINEL}]");
    let mut slots = Vec::new();
    let mut search_from = 0;
    while let Some(rel) = find_subslice(&data[search_from..], needle.as_bytes()) {
        let byte_range_start = search_from + rel;
        let byte_range_end = byte_range_start + needle.len();
        if let Some(contents_span) = find_contents_span(data, byte_range_end) {
            slots.push(SignatureSlot {
                byte_range_span: (byte_range_start, byte_range_end),
                contents_span,
            });
        }
        search_from = byte_range_end;
    }
    slots
}

fn find_contents_span(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let needle = b"/Contents <";
    let rel = find_subslice(&data[from..], needle)?;
    let start = from + rel + needle.len() - 1; // include the opening '<'
    let close = start + find_subslice(&data[start..], b">")?;
    Some((start, close + 1))
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Rewrites one signature slot in place: the real `[lo_start lo_len hi_start
/// hi_len]` byte range (excluding the `/Contents` hex span itself), then the
/// digest produced by `sign` over exactly those two spans, hex-encoded into
/// the pre-sized `/Contents` field.
///
/// `sign` stands in for the cryptographic signing primitive the spec
/// treats as an external collaborator (§1 Non-goals) — this crate only
/// computes the byte spans and performs the splice.
pub fn finalize_signature(data: &mut Vec<u8>, slot: SignatureSlot, sign: impl Fn(&[u8]) -> Vec<u8>) -> Result<()> {
    let (contents_start, contents_end) = slot.contents_span;
    let placeholder_len = contents_end - contents_start;

    let first_span = &data[..contents_start];
    let second_span = &data[contents_end..];
    let mut signed_bytes = Vec::with_capacity(first_span.len() + second_span.len());
    signed_bytes.extend_from_slice(first_span);
    signed_bytes.extend_from_slice(second_span);

    let digest = sign(&signed_bytes);
    let hex_len = digest.len() * 2 + 2; // surrounding '<' '>'
    if hex_len > placeholder_len {
        return Err(PdfWriteError::Corrupt(format!(
            "signature digest ({hex_len} hex bytes) does not fit the reserved /Contents placeholder ({placeholder_len} bytes)"
        )));
    }

    let mut hex = Vec::with_capacity(placeholder_len);
    hex.push(b'<');
    for b in &digest {
        hex.extend_from_slice(format!("{b:02X}").as_bytes());
    }
    while hex.len() < placeholder_len - 1 {
        hex.push(b'0');
    }
    hex.push(b'>');

    // Each field is zero-padded to the sentinel's own digit width so the
    // rewritten array is always exactly as long as the placeholder it
    // replaces, no matter how small the real offsets turn out to be.
    let width = SENTINEL.len();
    let byte_range_text = format!(
        "/ByteRange [0 {:0width$} {:0width$} {:0width$}]",
        contents_start,
        contents_end,
        data.len() - contents_end,
        width = width
    );
    let (br_start, br_end) = slot.byte_range_span;
    if byte_range_text.len() != br_end - br_start {
        return Err(PdfWriteError::Corrupt(
            "real /ByteRange text does not fit the sentinel's reserved width".into(),
        ));
    }

    data.splice(contents_start..contents_end, hex);
    data.splice(br_start..br_end, byte_range_text.into_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_placeholder_doc() -> Vec<u8> {
        let contents_hex = format!("<{}>", "0".repeat(16));
        format!(
            "1 0 obj\n<< /ByteRange [0 {SENTINEL} {SENTINEL} {SENTINEL}] /Contents {contents_hex} >>\nendobj\n"
        )
        .into_bytes()
    }

    #[test]
    fn locates_a_single_slot() {
        let data = make_placeholder_doc();
        let slots = locate_signature_slots(&data);
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn finalize_rewrites_byte_range_and_contents() {
        let mut data = make_placeholder_doc();
        let slot = locate_signature_slots(&data)[0];
        finalize_signature(&mut data, slot, |bytes| vec![0xAB, 0xCD, bytes.len() as u8]).unwrap();
        let text = String::from_utf8_lossy(&data);
        assert!(!text.contains(SENTINEL));
        assert!(text.contains("ABCD"));
    }

    #[test]
    fn finalize_pads_realistic_short_offsets_to_sentinel_width() {
        // A real file's offsets are nearly always far shorter than the
        // 10-digit sentinel; the zero-padded /ByteRange must still fit the
        // reserved span exactly.
        let mut data = make_placeholder_doc();
        let slot = locate_signature_slots(&data)[0];
        finalize_signature(&mut data, slot, |_| vec![0x01]).unwrap();
        let text = String::from_utf8_lossy(&data);
        assert!(text.contains("/ByteRange [0 0000000069 0000000087 0000000011]"));
    }
}
