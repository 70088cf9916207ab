//! Component B: reachability mark/sweep (spec §4.1).
//!
//! Per §9's design notes, the in-place "mark bit + paired unmark" from the
//! original is replaced with an external visited-set threaded through the
//! recursion, which is reentrant and needs no guaranteed-release scope of
//! its own — it simply goes out of scope with the call.

use std::collections::HashSet;

use crate::document::{Document, ObjectSource};
use crate::error::Result;
use crate::object::{Object, ObjectId};

/// Walks the object graph from the trailer, marking every transitively
/// reachable object number `use[i] = 1` (any nonzero value; component E
/// later ORs in the real section flags) and collecting the set of
/// indirect-reference slots that must be nulled out because they resolved
/// to nothing or pointed out of range ("duff", spec §4.1).
///
/// Returns the set of live object numbers. Duff reference rewriting is
/// applied to the document afterward by [`null_out_duff_references`] — kept
/// as a separate pass so this function only needs `&Document`, sidestepping
/// a `&mut` borrow while the traversal itself is still in flight.
pub fn mark<S: ObjectSource>(source: &S, roots: &[ObjectId]) -> Result<HashSet<u32>> {
    let mut live = HashSet::new();
    let mut in_progress = HashSet::new();
    for &root in roots {
        mark_ref(source, root, &mut live, &mut in_progress)?;
    }
    Ok(live)
}

fn mark_ref<S: ObjectSource>(
    source: &S,
    id: ObjectId,
    live: &mut HashSet<u32>,
    in_progress: &mut HashSet<u32>,
) -> Result<()> {
    let (num, _gen) = id;
    if num == 0 || live.contains(&num) || in_progress.contains(&num) {
        return Ok(());
    }
    in_progress.insert(num);
    match source.resolve(num)? {
        Some(value) => {
            live.insert(num);
            mark_value(source, &value, live, in_progress)?;
        }
        None => {
            // Duff: resolution yielded nothing. The caller nulls the slot
            // that pointed here; this traversal just doesn't mark it live.
        }
    }
    in_progress.remove(&num);
    Ok(())
}

fn mark_value<S: ObjectSource>(
    source: &S,
    value: &Object,
    live: &mut HashSet<u32>,
    in_progress: &mut HashSet<u32>,
) -> Result<()> {
    match value {
        Object::Reference(id) => mark_ref(source, *id, live, in_progress)?,
        Object::Array(items) => {
            for item in items {
                mark_value(source, item, live, in_progress)?;
            }
        }
        Object::Dictionary(dict) => {
            for (_, v) in dict.iter() {
                mark_value(source, v, live, in_progress)?;
            }
        }
        Object::Stream(stream) => {
            for (_, v) in stream.dict.iter() {
                mark_value(source, v, live, in_progress)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Replaces every indirect reference resolving outside `[1, N)` or to a
/// missing slot with a literal `null`, and inlines a stream's `/Length`
/// when it is itself indirect (spec §4.1: "the linearizer later needs a
/// stable length"). Mutates `doc` in place; run after [`mark`] so the
/// reachability result isn't disturbed mid-traversal by these edits.
pub fn null_out_duff_references(doc: &mut Document, live: &HashSet<u32>) -> Result<()> {
    let highest = doc.highest_object_number();
    let nums: Vec<u32> = doc.objects.keys().copied().collect();
    for num in nums {
        if !live.contains(&num) {
            continue;
        }
        let mut value = doc.objects.remove(&num).expect("present");
        scrub_value(&mut value, live, highest);
        inline_stream_length(&mut value, doc);
        doc.objects.insert(num, value);
    }
    Ok(())
}

fn scrub_value(value: &mut Object, live: &HashSet<u32>, highest: u32) {
    match value {
        Object::Reference((num, _)) => {
            if *num == 0 || *num > highest || !live.contains(num) {
                *value = Object::Null;
            }
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                scrub_value(item, live, highest);
            }
        }
        Object::Dictionary(dict) => {
            for v in dict.iter_mut() {
                scrub_value(v, live, highest);
            }
        }
        Object::Stream(stream) => {
            for v in stream.dict.iter_mut() {
                scrub_value(v, live, highest);
            }
        }
        _ => {}
    }
}

fn inline_stream_length(value: &mut Object, doc: &Document) {
    if let Object::Stream(stream) = value {
        let len = stream.content.len() as i64;
        if let Some(Object::Reference((num, _))) = stream.dict.get(b"Length") {
            if let Some(resolved) = doc.get(*num) {
                if let Some(n) = resolved.as_i64() {
                    stream.dict.set("Length", Object::Integer(n));
                    return;
                }
            }
            stream.dict.set("Length", Object::Integer(len));
        }
    }
}
