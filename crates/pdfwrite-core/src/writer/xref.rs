//! Component H: xref/trailer writer (spec §4.7).

use std::collections::{BTreeMap, HashMap};

use crate::document::Trailer;
use crate::object::{Dictionary, Object};
use crate::writer::object_serializer::write_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefRowEntry {
    Free { next: u32, gen: u16 },
    InUse { offset: u64, gen: u16 },
}

#[derive(Debug, Clone)]
pub struct XrefSubsection {
    pub start: u32,
    pub entries: Vec<XrefRowEntry>,
}

/// `"%010d %05d %c \n"` — exactly 20 bytes per entry (spec §4.7).
fn format_row(entry: &XrefRowEntry) -> String {
    match entry {
        XrefRowEntry::Free { next, gen } => format!("{next:010} {gen:05} f \n"),
        XrefRowEntry::InUse { offset, gen } => format!("{offset:010} {gen:05} n \n"),
    }
}

pub fn write_classic_xref(buf: &mut Vec<u8>, subsections: &[XrefSubsection]) {
    buf.extend_from_slice(b"xref\n");
    for sub in subsections {
        buf.extend_from_slice(format!("{} {}\n", sub.start, sub.entries.len()).as_bytes());
        for entry in &sub.entries {
            buf.extend_from_slice(format_row(entry).as_bytes());
        }
    }
}

pub fn write_trailer(buf: &mut Vec<u8>, trailer: &Dictionary, startxref: u64) {
    buf.extend_from_slice(b"trailer\n");
    write_value(buf, &Object::Dictionary(trailer.clone()), false);
    buf.extend_from_slice(format!("\nstartxref\n{startxref}\n%%EOF\n").as_bytes());
}

/// Builds the free-list chain for a full (non-incremental) save: slot 0
/// heads the chain; every id in `[1, highest]` with no entry in
/// `present` is free; the chain is built by walking free ids ascending
/// and threading `ofs[lastfree] := num` (spec §4.7), terminating at 0.
/// Generation numbers for freed slots are bumped modulo 65535.
pub fn build_full_xref(
    present: &std::collections::HashSet<u32>,
    offsets: &HashMap<u32, u64>,
    gens: &HashMap<u32, u16>,
    highest: u32,
) -> Vec<XrefSubsection> {
    let mut free_ids: Vec<u32> = (1..=highest).filter(|i| !present.contains(i)).collect();
    free_ids.insert(0, 0);

    let mut next_free: HashMap<u32, u32> = HashMap::new();
    for w in free_ids.windows(2) {
        next_free.insert(w[0], w[1]);
    }
    if let Some(&last) = free_ids.last() {
        next_free.insert(last, 0);
    }

    let mut entries = Vec::with_capacity(highest as usize + 1);
    for num in 0..=highest {
        let entry = if num == 0 {
            XrefRowEntry::Free {
                next: next_free.get(&0).copied().unwrap_or(0),
                gen: 65535,
            }
        } else if present.contains(&num) {
            XrefRowEntry::InUse {
                offset: offsets.get(&num).copied().unwrap_or(0),
                gen: gens.get(&num).copied().unwrap_or(0),
            }
        } else {
            let prior_gen = gens.get(&num).copied().unwrap_or(0);
            XrefRowEntry::Free {
                next: next_free.get(&num).copied().unwrap_or(0),
                gen: prior_gen.wrapping_add(1) % 65535,
            }
        };
        entries.push(entry);
    }

    vec![XrefSubsection { start: 0, entries }]
}

/// Splits the ids present in an incremental update into contiguous
/// subsections (spec §4.7: "splitting subsections at gaps in
/// incrementally-added ids").
pub fn build_incremental_subsections(
    changed: &BTreeMap<u32, u64>,
    gens: &HashMap<u32, u16>,
) -> Vec<XrefSubsection> {
    let mut subs = Vec::new();
    let mut current: Option<XrefSubsection> = None;
    let mut expected_next = None;

    for (&num, &offset) in changed.iter() {
        let gen = gens.get(&num).copied().unwrap_or(0);
        let entry = XrefRowEntry::InUse { offset, gen };
        match (&mut current, expected_next) {
            (Some(sub), Some(exp)) if exp == num => {
                sub.entries.push(entry);
            }
            _ => {
                if let Some(sub) = current.take() {
                    subs.push(sub);
                }
                current = Some(XrefSubsection {
                    start: num,
                    entries: vec![entry],
                });
            }
        }
        expected_next = Some(num + 1);
    }
    if let Some(sub) = current {
        subs.push(sub);
    }
    subs
}

/// Assembles the trailer dictionary for a save (spec §3 "Trailer").
pub fn build_trailer_dict(trailer: &Trailer, size: u32, prev: Option<u64>) -> Dictionary {
    let mut t = trailer.clone();
    t.size = size;
    t.prev = prev;
    t.to_dictionary()
}

/// Packs one row into a cross-reference *stream*'s fixed `/W=[1 4 1]`
/// field widths: a 1-byte type tag, a 4-byte big-endian second field, and
/// a 1-byte generation (spec §4.7's "Stream" encoding). Real PDF writers
/// commonly widen the generation field to 2 bytes to avoid truncating
/// generations past 255; this crate follows the spec's literal `/W`
/// verbatim instead of the more permissive convention.
fn pack_xref_stream_row(buf: &mut Vec<u8>, entry: &XrefRowEntry) {
    match entry {
        XrefRowEntry::Free { next, gen } => {
            buf.push(0);
            buf.extend_from_slice(&next.to_be_bytes());
            buf.push(*gen as u8);
        }
        XrefRowEntry::InUse { offset, gen } => {
            buf.push(1);
            buf.extend_from_slice(&(*offset as u32).to_be_bytes());
            buf.push(*gen as u8);
        }
    }
}

/// The xref stream's body: every subsection's rows, back to back, each
/// exactly 6 bytes (spec §4.7 `(flag, ofs_be32, gen_u8)`).
pub fn build_xref_stream_content(subsections: &[XrefSubsection]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(subsections.iter().map(|s| s.entries.len()).sum::<usize>() * 6);
    for sub in subsections {
        for entry in &sub.entries {
            pack_xref_stream_row(&mut buf, entry);
        }
    }
    buf
}

/// The xref stream's own dictionary: the trailer fields plus `/Type
/// /XRef`, `/W [1 4 1]`, and an `/Index` listing each subsection's
/// `[from count]` pair (spec §4.7).
pub fn build_xref_stream_dict(trailer_dict: &Dictionary, subsections: &[XrefSubsection]) -> Dictionary {
    let mut dict = trailer_dict.clone();
    dict.set("Type", Object::name("XRef"));
    dict.set(
        "W",
        Object::Array(vec![Object::Integer(1), Object::Integer(4), Object::Integer(1)]),
    );
    let mut index = Vec::new();
    for sub in subsections {
        index.push(Object::Integer(sub.start as i64));
        index.push(Object::Integer(sub.entries.len() as i64));
    }
    dict.set("Index", Object::Array(index));
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_row_is_twenty_bytes() {
        let row = format_row(&XrefRowEntry::InUse { offset: 17, gen: 0 });
        assert_eq!(row.len(), 20);
    }

    #[test]
    fn full_xref_free_list_terminates_at_zero() {
        let present: std::collections::HashSet<u32> = [1, 3].into_iter().collect();
        let offsets = HashMap::new();
        let gens = HashMap::new();
        let subs = build_full_xref(&present, &offsets, &gens, 3);
        let entries = &subs[0].entries;
        // slot 0 -> free, next points at first free id (2)
        assert_eq!(entries[0], XrefRowEntry::Free { next: 2, gen: 65535 });
        assert_eq!(entries[2], XrefRowEntry::Free { next: 0, gen: 1 });
        assert!(matches!(entries[1], XrefRowEntry::InUse { .. }));
        assert!(matches!(entries[3], XrefRowEntry::InUse { .. }));
    }

    #[test]
    fn incremental_splits_at_gaps() {
        let mut changed = BTreeMap::new();
        changed.insert(5, 100);
        changed.insert(6, 200);
        changed.insert(9, 300);
        let subs = build_incremental_subsections(&changed, &HashMap::new());
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].start, 5);
        assert_eq!(subs[0].entries.len(), 2);
        assert_eq!(subs[1].start, 9);
        assert_eq!(subs[1].entries.len(), 1);
    }

    #[test]
    fn xref_stream_row_is_six_bytes_with_big_endian_offset() {
        let subs = vec![XrefSubsection {
            start: 0,
            entries: vec![
                XrefRowEntry::Free { next: 0, gen: 65535 },
                XrefRowEntry::InUse { offset: 0x0100, gen: 0 },
            ],
        }];
        let content = build_xref_stream_content(&subs);
        assert_eq!(content.len(), 12);
        assert_eq!(&content[0..6], &[0, 0, 0, 0, 0, 0xFF]);
        assert_eq!(&content[6..12], &[1, 0, 0, 0x01, 0x00, 0]);
    }

    #[test]
    fn xref_stream_dict_carries_type_w_and_index() {
        let trailer = Dictionary::new();
        let subs = vec![
            XrefSubsection {
                start: 0,
                entries: vec![XrefRowEntry::Free { next: 0, gen: 65535 }],
            },
            XrefSubsection {
                start: 5,
                entries: vec![XrefRowEntry::InUse { offset: 10, gen: 0 }; 2],
            },
        ];
        let dict = build_xref_stream_dict(&trailer, &subs);
        assert_eq!(dict.get(b"Type"), Some(&Object::name("XRef")));
        assert_eq!(
            dict.get(b"W"),
            Some(&Object::Array(vec![Object::Integer(1), Object::Integer(4), Object::Integer(1)]))
        );
        assert_eq!(
            dict.get(b"Index"),
            Some(&Object::Array(vec![
                Object::Integer(0),
                Object::Integer(1),
                Object::Integer(5),
                Object::Integer(2),
            ]))
        );
    }
}
