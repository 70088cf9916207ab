//! Component D: renumber/compact (spec §4.3).

use std::collections::{HashMap, HashSet};

use crate::document::{Document, XrefEntry};
use crate::object::{Dictionary, Object, Stream};

/// Compact sub-phase: sweeps ids ascending, building a monotone new-id
/// counter over the surviving (post-dedupe) objects.
///
/// `dedupe_renumber` maps every live old id to its dedupe survivor (the
/// identity map for ids that didn't participate in a merge). Returns the
/// full old→new map (index = old id, 0 = dropped) and the new table's
/// object count.
///
/// Invariant preserved throughout: `renumber[i] <= i`.
pub fn compact(highest: u32, live: &HashSet<u32>, dedupe_renumber: &HashMap<u32, u32>) -> (Vec<u32>, u32) {
    let n = highest as usize + 1;
    let mut renumber = vec![0u32; n];
    for i in 1..=highest {
        if let Some(&r) = dedupe_renumber.get(&i) {
            renumber[i as usize] = r;
        }
    }

    let mut next_id = 1u32;
    for i in 1..=highest {
        let ri = renumber[i as usize];
        if ri == 0 {
            continue;
        }
        if !live.contains(&ri) {
            renumber[i as usize] = 0;
            continue;
        }
        if ri == i {
            renumber[i as usize] = next_id;
            next_id += 1;
        } else {
            debug_assert!(ri < i);
            renumber[i as usize] = renumber[ri as usize];
        }
    }

    (renumber, next_id - 1)
}

/// Rewrite sub-phase: replaces every indirect reference with its renumbered
/// target (or `null` when the target was dropped or out of range),
/// installs a freshly keyed object table, and re-parents resident values to
/// their new ids.
///
/// The new xref table's entry `renumber[i]` receives the *contents* of the
/// old entry `i` (spec §4.3) — generation number and, for an entry packed
/// into an object stream, its parent stream id (itself renumbered) — rather
/// than a fresh default. Losing this would silently reset every
/// surviving object's generation to 0 on every garbage-collecting save.
pub fn rewrite(doc: &Document, renumber: &[u32]) -> Document {
    let highest = (renumber.len() - 1) as u32;
    let mut out = Document::new();
    out.trailer = doc.trailer.clone();

    for (&old_num, value) in doc.objects.iter() {
        let new_num = renumber.get(old_num as usize).copied().unwrap_or(0);
        if new_num == 0 {
            continue;
        }
        let mut value = value.clone();
        rewrite_refs(&mut value, renumber, highest);
        out.objects.insert(new_num, value);
        out.xref.insert(new_num, rewrite_xref_entry(doc, old_num, renumber, highest));
    }

    if let Some((old_num, gen)) = doc.trailer.root {
        out.trailer.root = lookup(renumber, highest, old_num).map(|n| (n, gen));
    }
    if let Some((old_num, gen)) = doc.trailer.info {
        out.trailer.info = lookup(renumber, highest, old_num).map(|n| (n, gen));
    }
    if let Some((old_num, gen)) = doc.trailer.encrypt {
        out.trailer.encrypt = lookup(renumber, highest, old_num).map(|n| (n, gen));
    }

    out
}

fn rewrite_xref_entry(doc: &Document, old_num: u32, renumber: &[u32], highest: u32) -> XrefEntry {
    match doc.xref.get(&old_num) {
        Some(XrefEntry::Compressed { stream_id, index }) => XrefEntry::Compressed {
            stream_id: lookup(renumber, highest, *stream_id).unwrap_or(0),
            index: *index,
        },
        Some(entry) => entry.clone(),
        None => XrefEntry::InUse { offset: 0, gen: 0 },
    }
}

fn lookup(renumber: &[u32], highest: u32, old_num: u32) -> Option<u32> {
    if old_num == 0 || old_num > highest {
        return None;
    }
    let new_num = renumber[old_num as usize];
    if new_num == 0 {
        None
    } else {
        Some(new_num)
    }
}

fn rewrite_refs(value: &mut Object, renumber: &[u32], highest: u32) {
    match value {
        Object::Reference((num, gen)) => match lookup(renumber, highest, *num) {
            Some(new_num) => *value = Object::Reference((new_num, *gen)),
            None => *value = Object::Null,
        },
        Object::Array(items) => {
            for item in items.iter_mut() {
                rewrite_refs(item, renumber, highest);
            }
        }
        Object::Dictionary(dict) => rewrite_dict(dict, renumber, highest),
        Object::Stream(Stream { dict, .. }) => rewrite_dict(dict, renumber, highest),
        _ => {}
    }
}

fn rewrite_dict(dict: &mut Dictionary, renumber: &[u32], highest: u32) {
    for v in dict.iter_mut() {
        rewrite_refs(v, renumber, highest);
    }
}
