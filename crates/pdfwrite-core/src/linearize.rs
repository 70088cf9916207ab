//! Component F: linearization planner (spec §4.5).
//!
//! Spec §4.5's layout table and its §4.5.1 comparator don't agree on where
//! the hint stream and the first xref's `start` boundary fall relative to
//! "remaining pages" — see `DESIGN.md`'s Open Questions for the reading
//! this crate settled on, anchored on two things §4.5.1's narrative table
//! can't override: §6 ("the linearization parameter dictionary is the
//! first object emitted after the header") and seed scenario S3 ("last
//! object is the hint stream").
//!
//! Ascending new-id order (lowest id first):
//! `PARAMS(id 1) < CATALOGUE < PAGE1 < [remaining pages, ascending by page
//! index] < SHARED < (no section tag) < OTHER < HINTS(last)`.
//! Within a tied section, a `PAGE_OBJECT` entry sorts before its
//! dependents, then ties break by ascending page index, then by old id
//! for determinism.

use std::collections::HashMap;

use crate::document::flags;

#[derive(Debug, Clone)]
pub struct LinearizationPlan {
    /// Old ids in final ascending-new-id order, including the two
    /// synthetic objects allocated for the linearization parameter
    /// dictionary and the hint stream.
    pub ordering: Vec<u32>,
    /// Index into `ordering` of the first entry past the front-loaded
    /// "first page region" (params dict, catalogue/document objects, and
    /// page 1's own objects) — the `start` boundary from spec §4.5
    /// separating sections 4-6 from 7-9. Everything from this index
    /// onward, up to (but excluding) the trailing hint stream, is the
    /// "remaining objects" region §4.9's pass 0 measures separately.
    pub start_index: usize,
    pub params_old_id: u32,
    pub hints_old_id: u32,
}

impl LinearizationPlan {
    /// old id -> new id (1-based), including the two synthetic objects.
    pub fn renumber_map(&self) -> HashMap<u32, u32> {
        self.ordering
            .iter()
            .enumerate()
            .map(|(i, &old)| (old, (i + 1) as u32))
            .collect()
    }

    pub fn new_count(&self) -> u32 {
        self.ordering.len() as u32
    }
}

/// The highest rank among the three "front-loaded" sections (params,
/// catalogue, page 1) — everything with a higher rank than this belongs
/// to the "remaining objects" region that pass 0 measures after the
/// fact (spec §4.9).
const FRONT_REGION_MAX_RANK: u8 = 2;

fn section_rank(bits: u32) -> u8 {
    if bits & flags::PARAMS != 0 {
        0
    } else if bits & flags::CATALOGUE != 0 {
        1
    } else if bits & flags::PAGE1 != 0 {
        2
    } else if flags::page_index(bits) > 0 {
        3
    } else if bits & flags::SHARED != 0 {
        4
    } else if bits & flags::OTHER != 0 {
        6
    } else if bits & flags::HINTS != 0 {
        7
    } else {
        5
    }
}

/// Builds the final emission order and the `start` boundary from the
/// page-classifier's accumulated `use[]` bits. `live` must contain every
/// surviving (post-dedupe/compact) object number; `highest` is that
/// table's current high-water mark, used only to allocate the two fresh
/// ids for the params dict and hint stream (spec §10.5: "new objects
/// appended to the table with USE_PARAMS/USE_HINTS flags only").
pub fn plan(live_flags: &HashMap<u32, u32>, highest: u32) -> LinearizationPlan {
    let params_old_id = highest + 1;
    let hints_old_id = highest + 2;

    let mut entries: Vec<(u32, u32)> = live_flags.iter().map(|(&id, &bits)| (id, bits)).collect();
    entries.push((params_old_id, flags::PARAMS));
    entries.push((hints_old_id, flags::HINTS));

    entries.sort_by(|(id_a, bits_a), (id_b, bits_b)| {
        let rank_a = section_rank(*bits_a);
        let rank_b = section_rank(*bits_b);
        rank_a
            .cmp(&rank_b)
            .then_with(|| {
                let page_object_a = bits_a & flags::PAGE_OBJECT != 0;
                let page_object_b = bits_b & flags::PAGE_OBJECT != 0;
                page_object_b.cmp(&page_object_a)
            })
            .then_with(|| flags::page_index(*bits_a).cmp(&flags::page_index(*bits_b)))
            .then_with(|| id_a.cmp(id_b))
    });

    let ordering: Vec<u32> = entries.iter().map(|(id, _)| *id).collect();
    let start_index = entries
        .iter()
        .position(|(_, bits)| section_rank(*bits) > FRONT_REGION_MAX_RANK)
        .unwrap_or(ordering.len());

    LinearizationPlan {
        ordering,
        start_index,
        params_old_id,
        hints_old_id,
    }
}
