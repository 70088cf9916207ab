//! Component C: structural deduplication (spec §4.2).

use std::collections::{HashMap, HashSet};

use crate::document::Document;
use crate::object::{structural_equal, Object};

/// Collapses structurally-equal objects to the lowest id.
///
/// Returns a renumber map (`old id -> survivor id`, identity for ids that
/// don't participate in a merge) and the set of ids that were dropped
/// (the higher id of each matched pair, per "at most one match per `j`,
/// first `i<j` wins").
///
/// `aggressive` gates whether two streams can be considered equal at all
/// (spec §4.2: "only when the caller has requested aggressive dedup AND
/// both raw buffers match byte-for-byte").
pub fn dedupe(doc: &Document, live: &HashSet<u32>, aggressive: bool) -> (HashMap<u32, u32>, HashSet<u32>) {
    let mut ids: Vec<u32> = live.iter().copied().collect();
    ids.sort_unstable();

    let mut renumber: HashMap<u32, u32> = ids.iter().map(|&i| (i, i)).collect();
    let mut dropped: HashSet<u32> = HashSet::new();

    for (pos, &j) in ids.iter().enumerate() {
        if dropped.contains(&j) {
            continue;
        }
        let obj_j = match doc.get(j) {
            Some(o) => o,
            None => continue,
        };
        for &i in &ids[..pos] {
            // A dropped `i` already merged into some lower survivor; a
            // still-live `i` (including one that already absorbed an
            // earlier `j`) remains a valid candidate for every later `j`,
            // so chains of three or more equal objects all collapse to the
            // lowest id rather than stopping after the first pair.
            if dropped.contains(&i) {
                continue;
            }
            let obj_i = match doc.get(i) {
                Some(o) => o,
                None => continue,
            };
            if objects_equal(obj_i, obj_j, aggressive) {
                renumber.insert(j, i);
                dropped.insert(j);
                break;
            }
        }
    }

    (renumber, dropped)
}

fn objects_equal(a: &Object, b: &Object, aggressive: bool) -> bool {
    match (a, b) {
        (Object::Stream(sa), Object::Stream(sb)) => {
            aggressive && sa.content == sb.content && structural_equal(a, b)
        }
        (Object::Stream(_), _) | (_, Object::Stream(_)) => false,
        _ => structural_equal(a, b),
    }
}
