//! Component J: the two-pass driver and mode selection (spec §4.9).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write as _;

use sha2::{Digest, Sha256};

use crate::classify;
use crate::config::{GarbageLevel, SaveOptions};
use crate::dedupe;
use crate::document::{flags, Document, ObjectId};
use crate::error::{PdfWriteError, Result};
use crate::hints::{self, PageHintEntry, SharedGroupEntry};
use crate::linearize;
use crate::object::{Dictionary, Object};
use crate::renumber;
use crate::sweep;
use crate::writer::object_serializer::{
    is_suppressed_object_type, write_indirect_object, write_linearization_params, write_placeholder_object,
    LinearizationParams,
};
use crate::writer::{filters, write_header, xref};

/// RAII guard for spec §5's "freeze updates" flag: set on entry, cleared
/// on every exit path (success or error) because it's a plain `Drop`.
struct UpdateFreeze<'a> {
    doc: &'a mut Document,
}

impl<'a> UpdateFreeze<'a> {
    fn acquire(doc: &'a mut Document) -> Self {
        doc.updates_frozen = true;
        UpdateFreeze { doc }
    }
}

impl Drop for UpdateFreeze<'_> {
    fn drop(&mut self) {
        self.doc.updates_frozen = false;
    }
}

fn collect_roots(doc: &Document) -> Vec<ObjectId> {
    let mut roots = Vec::new();
    if let Some(root) = doc.trailer.root {
        roots.push(root);
    }
    if let Some(info) = doc.trailer.info {
        roots.push(info);
    }
    if let Some(enc) = doc.trailer.encrypt {
        roots.push(enc);
    }
    roots
}

/// Runs mark/sweep, optional dedupe, and optional compact/renumber
/// according to the requested garbage level (spec §4.3, §6 "garbage").
/// Returns the transformed document ready for emission.
fn run_garbage_collection(doc: &Document, garbage: GarbageLevel) -> Result<Document> {
    if garbage == GarbageLevel::None {
        return Ok(doc.clone());
    }

    let roots = collect_roots(doc);
    let live = sweep::mark(doc, &roots)?;
    let mut swept = doc.clone();
    sweep::null_out_duff_references(&mut swept, &live)?;
    swept.objects.retain(|num, _| live.contains(num));
    swept.xref.retain(|num, _| live.contains(num));

    if garbage == GarbageLevel::Sweep {
        return Ok(swept);
    }

    let aggressive = garbage == GarbageLevel::DedupeStreams;
    let dedupe_renumber = if garbage.at_least(GarbageLevel::Dedupe) {
        let (renumber, _dropped) = dedupe::dedupe(&swept, &live, aggressive);
        renumber
    } else {
        live.iter().map(|&i| (i, i)).collect::<HashMap<u32, u32>>()
    };

    let highest = swept.highest_object_number();
    let (renumber_map, _count) = renumber::compact(highest, &live, &dedupe_renumber);
    Ok(renumber::rewrite(&swept, &renumber_map))
}

/// Regenerates the trailer's `/ID` pair for a non-incremental save
/// (SPEC_FULL §10.5): the first element identifies the document and is
/// carried over unchanged when one already exists; the second identifies
/// this particular revision and is always replaced. Incremental saves
/// never call this — both elements are reused unchanged (spec §4.9's
/// "appended, as if" model implies the original file's identity persists).
fn regenerate_id(doc: &mut Document) {
    let first = match &doc.trailer.id {
        Some((a, _)) => a.clone(),
        None => {
            let mut hasher = Sha256::new();
            if let Some((num, gen)) = doc.trailer.root {
                hasher.update(num.to_be_bytes());
                hasher.update(gen.to_be_bytes());
            }
            hasher.update(doc.highest_object_number().to_be_bytes());
            hasher.finalize()[..16].to_vec()
        }
    };
    let second = uuid::Uuid::new_v4().into_bytes().to_vec();
    doc.trailer.id = Some((first, second));
}

/// Full (non-incremental, non-linear) single-pass save.
fn save_full<W: std::io::Write>(doc: &Document, options: &SaveOptions, errors: &mut u32, out: &mut W) -> Result<()> {
    let mut transformed = run_garbage_collection(doc, options.garbage)?;
    regenerate_id(&mut transformed);
    let (buf, _offsets, _startxref) = emit_body(&transformed, options, errors, 0, None)?;
    out.write_all(&buf)?;
    Ok(())
}

/// Writes the header and every object in ascending id order plus the
/// closing classic xref and trailer into a fresh buffer, starting the
/// buffer's logical file position at `base_offset` (nonzero only for the
/// incremental path's "as if appended" accounting — unused here).
///
/// `linear_params`, when set, names the object number holding the
/// linearization parameter dictionary and the values to serialize it
/// with. That slot is written via [`write_linearization_params`]'s
/// fixed-width encoding instead of the generic per-object path, so its
/// byte length never moves between the measuring pass (zeroed
/// placeholder) and the real pass (spec §4.9's offset-prediction
/// invariant).
fn emit_body(
    doc: &Document,
    options: &SaveOptions,
    errors: &mut u32,
    base_offset: u64,
    linear_params: Option<(u32, LinearizationParams)>,
) -> Result<(Vec<u8>, HashMap<u32, u64>, u64)> {
    let mut buf = Vec::new();
    write_header(&mut buf, 1, 7);

    let mut offsets = HashMap::new();
    let mut gens = HashMap::new();
    let present: HashSet<u32> = doc.objects.keys().copied().collect();

    for (&num, value) in doc.objects.iter() {
        let gen = doc
            .xref
            .get(&num)
            .map(|e| e.gen())
            .unwrap_or(0);
        gens.insert(num, gen);
        if let Some((params_num, params)) = linear_params {
            if num == params_num {
                offsets.insert(num, base_offset + buf.len() as u64);
                write_linearization_params(&mut buf, num, &params);
                continue;
            }
        }
        if is_suppressed_object_type(value) {
            continue;
        }
        offsets.insert(num, base_offset + buf.len() as u64);
        emit_one_object(&mut buf, num, gen, value, options, errors)?;
    }

    let highest = doc.highest_object_number();
    let startxref = base_offset + buf.len() as u64;

    // Stream encoding only applies to the trailing, whole-table xref of a
    // single-pass save (spec §4.7's two encodings; `SaveOptions::validate`
    // rejects pairing this with `linear`, whose first-page xref is always
    // classic per spec §4.5's layout table).
    if options.xref_stream && linear_params.is_none() {
        let xref_obj_num = highest + 1;
        let mut present_with_self = present.clone();
        present_with_self.insert(xref_obj_num);
        let mut offsets_with_self = offsets.clone();
        offsets_with_self.insert(xref_obj_num, startxref);
        let mut gens_with_self = gens.clone();
        gens_with_self.insert(xref_obj_num, 0);

        let subs = xref::build_full_xref(&present_with_self, &offsets_with_self, &gens_with_self, xref_obj_num);
        let trailer_dict = xref::build_trailer_dict(&doc.trailer, xref_obj_num + 1, doc.trailer.prev);
        let xref_dict = xref::build_xref_stream_dict(&trailer_dict, &subs);
        let content = xref::build_xref_stream_content(&subs);

        let mut stream = crate::object::Stream::new(xref_dict, content);
        filters::apply_filters(&mut stream, options)?;
        write_indirect_object(&mut buf, xref_obj_num, 0, &Object::Stream(stream), options.tight);
        buf.extend_from_slice(format!("startxref\n{startxref}\n%%EOF\n").as_bytes());
    } else {
        let subs = xref::build_full_xref(&present, &offsets, &gens, highest);
        xref::write_classic_xref(&mut buf, &subs);

        let trailer_dict = xref::build_trailer_dict(&doc.trailer, highest + 1, doc.trailer.prev);
        xref::write_trailer(&mut buf, &trailer_dict, startxref);
    }

    Ok((buf, offsets, startxref))
}

fn emit_one_object(
    buf: &mut Vec<u8>,
    num: u32,
    gen: u16,
    value: &Object,
    options: &SaveOptions,
    errors: &mut u32,
) -> Result<()> {
    match try_emit_one_object(buf, num, gen, value, options) {
        Ok(()) => Ok(()),
        Err(err) if options.continue_on_error => {
            tracing::warn!(object = num, error = %err, "per-object serialize failed, emitting placeholder");
            *errors += 1;
            write_placeholder_object(buf, num, gen);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn try_emit_one_object(buf: &mut Vec<u8>, num: u32, gen: u16, value: &Object, options: &SaveOptions) -> Result<()> {
    let mut value = value.clone();
    if let Object::Stream(stream) = &mut value {
        filters::apply_filters(stream, options)?;
    }
    write_indirect_object(buf, num, gen, &value, options.tight);
    Ok(())
}

/// Linearized (two-pass) save (spec §4.9).
fn save_linear<W: std::io::Write>(doc: &Document, options: &SaveOptions, errors: &mut u32, out: &mut W) -> Result<()> {
    let mut compacted = run_garbage_collection(doc, options.garbage)?;
    regenerate_id(&mut compacted);
    let classified = classify::classify(&compacted);

    let mut flags_map: HashMap<u32, u32> = HashMap::new();
    for &num in compacted.objects.keys() {
        flags_map.insert(num, classified.flags.get(&num).copied().unwrap_or(0));
    }

    let highest = compacted.highest_object_number();
    let plan = linearize::plan(&flags_map, highest);
    let renumber_map = plan.renumber_map();

    let mut second_pass_vec = vec![0u32; (highest + 3) as usize];
    for (&old, &new) in renumber_map.iter() {
        if (old as usize) < second_pass_vec.len() {
            second_pass_vec[old as usize] = new;
        }
    }
    let mut final_doc = renumber::rewrite(&compacted, &second_pass_vec);

    // Allocate the two synthetic objects (params dict, hint stream) at
    // their planned new ids; their content is finalized after pass 0.
    let params_new_id = renumber_map[&plan.params_old_id];
    let hints_new_id = renumber_map[&plan.hints_old_id];
    final_doc.insert_object(params_new_id, Object::Dictionary(Dictionary::new()));
    final_doc.insert_object(hints_new_id, Object::Stream(crate::object::Stream::new(Dictionary::new(), Vec::new())));

    tracing::debug!(start = plan.start_index, count = plan.new_count(), "linearization planned");

    // --- Pass 0: measure, with the params dict written as an all-zero
    // placeholder so its byte length already matches what pass 1 will
    // produce (spec §9's offset-prediction invariant).
    let (pass0_buf, pass0_offsets, main_xref_offset) = emit_body(
        &final_doc,
        options,
        &mut 0,
        0,
        Some((params_new_id, LinearizationParams::default())),
    )?;

    let pages: Vec<PageHintEntry> = classified
        .pages
        .iter()
        .map(|p| PageHintEntry {
            num_objects: p.object_ids.len() as u32,
            page_length: estimate_page_length(p, &pass0_offsets, &pass0_buf),
            num_shared_refs: 0,
            shared_ref_group_ids: Vec::new(),
        })
        .collect();
    let groups: Vec<SharedGroupEntry> = flags_map
        .iter()
        .filter(|(_, &bits)| bits & flags::SHARED != 0)
        .map(|_| SharedGroupEntry { group_length: 0 })
        .collect();

    let hint_stream = hints::build_hint_stream(&pages, &groups, 0)?;
    let hintstream_len = hint_stream.content.len() as u64;

    if let Some(Object::Stream(s)) = final_doc.get_mut(hints_new_id) {
        *s = hint_stream;
    }

    let first_page_object_new_id = classified
        .pages
        .first()
        .and_then(|p| renumber_map.get(&p.page_object_number))
        .copied()
        .unwrap_or(0);

    let file_len_estimate = pass0_buf.len() as u64 + hintstream_len;
    // `/E`: offset of the first object in the "remaining objects" region
    // (spec §4.9's `start_index` boundary), i.e. the point at which a
    // reader that has consumed only the first-page section may stop.
    // Falls back to the highest front-region offset if the plan places
    // nothing after `start_index` (the whole file fit in the first page).
    let first_remaining_new_id = plan
        .ordering
        .get(plan.start_index)
        .and_then(|old| renumber_map.get(old))
        .copied();
    let e_estimate = first_remaining_new_id
        .and_then(|new_id| pass0_offsets.get(&new_id))
        .copied()
        .unwrap_or_else(|| {
            plan.ordering
                .iter()
                .take(plan.start_index)
                .filter_map(|&old| renumber_map.get(&old))
                .filter_map(|new_id| pass0_offsets.get(new_id))
                .copied()
                .max()
                .unwrap_or(0)
        });

    // `/T`: spec §4.9 "adjust file_len and main_xref_offset by
    // hintstream_len" — the hint stream is the last object in the file
    // (by construction, see `linearize.rs`), so growing it from its
    // zeroed pass-0 placeholder to its real size pushes the main xref
    // table forward by exactly `hintstream_len`, without moving any
    // other object's offset.
    let main_xref_offset_adjusted = main_xref_offset + hintstream_len;

    let real_params = LinearizationParams {
        file_length: file_len_estimate,
        hint_offset: pass0_offsets.get(&hints_new_id).copied().unwrap_or(0),
        hint_length: hintstream_len,
        first_page_object: first_page_object_new_id,
        end_of_first_page: e_estimate,
        page_count: classified.pages.len() as u32,
        main_xref_offset: main_xref_offset_adjusted,
    };

    // --- Pass 1: re-emit at the offsets pass 0 predicted, now with the
    // params dict's real values. Every field is zero-padded to the same
    // fixed width the placeholder used, so no offset recorded above has
    // moved.
    let (pass1_buf, _, _) = emit_body(&final_doc, options, errors, 0, Some((params_new_id, real_params)))?;
    out.write_all(&pass1_buf)?;
    Ok(())
}

fn estimate_page_length(page: &classify::PageInfo, offsets: &HashMap<u32, u64>, buf: &[u8]) -> u64 {
    let mut min_ofs = u64::MAX;
    let mut max_ofs = 0u64;
    for &id in &page.object_ids {
        if let Some(&ofs) = offsets.get(&id) {
            min_ofs = min_ofs.min(ofs);
            max_ofs = max_ofs.max(ofs);
        }
    }
    if min_ofs == u64::MAX {
        0
    } else {
        (max_ofs - min_ofs).min(buf.len() as u64)
    }
}

/// Incremental save (spec §4.9, §8 property 8): appends only the
/// in-memory-modified objects and a new xref section whose `/Prev`
/// points at the document's prior `startxref`.
fn save_incremental<W: std::io::Write>(
    doc: &Document,
    options: &SaveOptions,
    errors: &mut u32,
    out: &mut W,
) -> Result<()> {
    let prior_startxref = doc.prior_startxref.ok_or_else(|| {
        PdfWriteError::Configuration("incremental save requires a document loaded from an existing file".into())
    })?;
    let prior_file_len = doc.prior_file_len.ok_or_else(|| {
        PdfWriteError::Configuration("incremental save requires a document loaded from an existing file".into())
    })?;

    let mut buf = Vec::new();
    buf.push(b'\n');

    let mut offsets: BTreeMap<u32, u64> = BTreeMap::new();
    let mut gens = HashMap::new();
    // The appendix is concatenated after the *entire* original file, whose
    // xref/trailer/%%EOF all sit past `prior_startxref` — so appended
    // object offsets are measured from the prior file's total length, not
    // from its startxref (which remains only the `/Prev` value below).
    // `buf` already carries the leading '\n' pushed above, so `base +
    // buf.len()` lands one byte past the end of the original file, as
    // spec S4 requires ("original file bytes followed by \n, the one
    // changed object...").
    let base = prior_file_len;

    for (&num, value) in doc.objects.iter() {
        let gen = doc.xref.get(&num).map(|e| e.gen()).unwrap_or(0);
        gens.insert(num, gen);
        offsets.insert(num, base + buf.len() as u64);
        emit_one_object(&mut buf, num, gen, value, options, errors)?;
    }

    let startxref = base + buf.len() as u64;
    let subs = xref::build_incremental_subsections(&offsets, &gens);
    xref::write_classic_xref(&mut buf, &subs);

    let trailer_dict = xref::build_trailer_dict(&doc.trailer, doc.highest_object_number() + 1, Some(prior_startxref));
    xref::write_trailer(&mut buf, &trailer_dict, startxref);

    out.write_all(&buf)?;
    Ok(())
}

/// Entry point (spec §6 "save"): validates configuration, dispatches to
/// the selected mode, and guarantees the freeze-updates flag is released
/// on every exit path.
pub fn save<W: std::io::Write>(doc: &mut Document, options: &SaveOptions, errors: &mut u32, out: &mut W) -> Result<()> {
    options.validate()?;
    let _guard = UpdateFreeze::acquire(doc);

    if options.incremental {
        save_incremental(doc, options, errors, out)
    } else if options.linear {
        save_linear(doc, options, errors, out)
    } else {
        save_full(doc, options, errors, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_minimal_document;

    #[test]
    fn default_options_single_pass_emits_ascii_xref() {
        let doc = build_minimal_document(1);
        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new();
        save_full(&doc, &options, &mut errors, &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with("%PDF-1.7\n"));
        assert!(s.contains("xref\n"));
        assert!(s.contains("trailer\n"));
        assert!(s.ends_with("%%EOF\n"));
    }

    #[test]
    fn garbage_sweep_drops_unreachable_objects() {
        let mut doc = build_minimal_document(1);
        doc.insert_object(99, Object::Integer(0)); // unreachable
        let transformed = run_garbage_collection(&doc, GarbageLevel::Sweep).unwrap();
        assert!(!transformed.objects.contains_key(&99));
    }

    #[test]
    fn continue_on_error_path_is_independent_of_gc() {
        let doc = build_minimal_document(1);
        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new().continue_on_error(true);
        save_full(&doc, &options, &mut errors, &mut out).unwrap();
        assert_eq!(errors, 0);
    }

    /// S5: a stream whose header fails to decode under `continue_on_error`
    /// is emitted as a placeholder null object, the error counter is
    /// incremented exactly once, and every other object is unaffected.
    #[test]
    fn continue_on_error_emits_placeholder_for_failing_stream() {
        let mut doc = build_minimal_document(1);
        // Object 4 is the page's content stream (see `build_minimal_document`).
        // Claim `/Filter /FlateDecode` but give it bytes that aren't a valid
        // zlib stream, and request expansion so the broken header is
        // actually exercised during serialization.
        let mut broken = Dictionary::new();
        broken.set("Filter", Object::name("FlateDecode"));
        doc.insert_object(4, Object::Stream(crate::object::Stream::new(broken, vec![0xDE, 0xAD, 0xBE, 0xEF])));

        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new()
            .continue_on_error(true)
            .expand(crate::config::ExpandPolicy::All);
        save_full(&doc, &options, &mut errors, &mut out).unwrap();

        assert_eq!(errors, 1);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("4 0 obj\nnull\nendobj\n"));
        // Object 1 (the catalog) still serialized normally.
        assert!(s.contains("1 0 obj\n"));
    }

    #[test]
    fn continue_on_error_false_propagates_stream_failure() {
        let mut doc = build_minimal_document(1);
        let mut broken = Dictionary::new();
        broken.set("Filter", Object::name("FlateDecode"));
        doc.insert_object(4, Object::Stream(crate::object::Stream::new(broken, vec![0xDE, 0xAD, 0xBE, 0xEF])));

        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new().expand(crate::config::ExpandPolicy::All);
        assert!(save_full(&doc, &options, &mut errors, &mut out).is_err());
    }

    /// S4: an incremental save of an unchanged document appends only a
    /// header-less appendix whose new xref's `/Prev` equals the prior
    /// `startxref`, at offsets measured from the original file's length
    /// (not from that prior `startxref`, which sits well before the end
    /// of the original file once its own xref/trailer are counted).
    #[test]
    fn incremental_save_appends_after_prior_file_end_with_correct_prev() {
        let base_doc = build_minimal_document(1);
        let mut errors = 0;
        let mut original = Vec::new();
        save_full(&base_doc, &SaveOptions::new(), &mut errors, &mut original).unwrap();

        let original_text = String::from_utf8(original.clone()).unwrap();
        let marker = original_text.rfind("startxref\n").unwrap();
        let rest = &original_text[marker + "startxref\n".len()..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let prior_startxref: u64 = digits.parse().unwrap();
        let prior_file_len = original.len() as u64;

        // Modify one page object in place, as if loaded from `original`.
        let mut doc = base_doc.clone();
        let mut page = doc.get(3).unwrap().as_dict().unwrap().clone();
        page.set("Rotate", Object::Integer(90));
        doc.objects.clear();
        doc.insert_object(3, Object::Dictionary(page));
        doc.prior_startxref = Some(prior_startxref);
        doc.prior_file_len = Some(prior_file_len);

        let mut appended = Vec::new();
        let options = SaveOptions::new().incremental(true);
        save(&mut doc, &options, &mut errors, &mut appended).unwrap();

        let appended_text = String::from_utf8(appended.clone()).unwrap();
        assert!(appended_text.starts_with('\n'));
        assert!(appended_text.contains("3 0 obj\n"));
        assert!(appended_text.contains(&format!("/Prev {prior_startxref}")));

        // The new xref's own `startxref` must point at a byte offset that,
        // measured from the *start of the appendix*, actually lands on the
        // `xref` keyword — proof offsets were based on the full original
        // file length rather than short by (file_len - prior_startxref).
        let appendix_marker = appended_text.rfind("startxref\n").unwrap();
        let appendix_rest = &appended_text[appendix_marker + "startxref\n".len()..];
        let appendix_digits: String = appendix_rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let appended_startxref: u64 = appendix_digits.parse().unwrap();
        assert!(appended_startxref >= prior_file_len, "offsets must be based past the original file's end");
        let local_offset = (appended_startxref - prior_file_len) as usize;
        assert!(appended[local_offset..].starts_with(b"xref\n"));
    }

    #[test]
    fn incremental_save_without_prior_file_len_is_configuration_error() {
        let mut doc = build_minimal_document(1);
        doc.prior_startxref = Some(100);
        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new().incremental(true);
        assert!(save(&mut doc, &options, &mut errors, &mut out).is_err());
    }

    #[test]
    fn linear_save_puts_params_first_and_hints_last_with_valid_startxref() {
        let doc = build_minimal_document(3);
        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new().linear(true).garbage(GarbageLevel::Compact);
        save_linear(&doc, &options, &mut errors, &mut out).unwrap();
        let s = String::from_utf8(out.clone()).unwrap();

        assert!(s.starts_with("%PDF-1.7\n"));
        // Object 1 is the linearization parameter dictionary (spec §6).
        assert!(s.contains("1 0 obj\n<< /Linearized 1.0 /L "));
        assert!(s.contains("/H ["));
        assert!(s.contains("/T "));

        // The trailing startxref must point at a byte offset that actually
        // lands on the `xref` keyword — proof the two-pass offsets weren't
        // thrown off by the params dict or hint stream changing size
        // between pass 0 and pass 1.
        let startxref_marker = s.rfind("startxref\n").expect("startxref present");
        let rest = &s[startxref_marker + "startxref\n".len()..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let offset: usize = digits.parse().unwrap();
        assert!(out[offset..].starts_with(b"xref\n"), "startxref must point at the xref table");
    }

    #[test]
    fn full_save_regenerates_id_keeping_first_element_stable() {
        let mut doc = build_minimal_document(1);
        doc.trailer.id = Some((vec![1, 2, 3, 4], vec![9, 9, 9, 9]));
        let mut errors = 0;
        let mut first_out = Vec::new();
        save_full(&doc, &SaveOptions::new(), &mut errors, &mut first_out).unwrap();
        let mut second_out = Vec::new();
        save_full(&doc, &SaveOptions::new(), &mut errors, &mut second_out).unwrap();

        let first_text = String::from_utf8(first_out).unwrap();
        let second_text = String::from_utf8(second_out).unwrap();
        // The first /ID element (the document identity) survives unchanged...
        assert!(first_text.contains("01020304"));
        assert!(second_text.contains("01020304"));
        // ...but the second element (this revision's identity) is fresh
        // every save, so the two saves' /ID arrays must differ.
        let id_of = |s: &str| s[s.find("/ID").unwrap()..].lines().next().unwrap().to_string();
        assert_ne!(id_of(&first_text), id_of(&second_text));
    }

    #[test]
    fn xref_stream_save_emits_type_xref_object_and_no_classic_table() {
        let doc = build_minimal_document(1);
        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new().xref_stream(true);
        save_full(&doc, &options, &mut errors, &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("/Type /XRef"));
        assert!(s.contains("/W [1 4 1]"));
        assert!(!s.contains("\nxref\n"), "classic table keyword must not appear");
        assert!(s.ends_with("%%EOF\n"));
    }

    #[test]
    fn linear_save_rejects_sub_compact_garbage_level() {
        let doc = build_minimal_document(1);
        let mut errors = 0;
        let mut out = Vec::new();
        let options = SaveOptions::new().linear(true).garbage(GarbageLevel::Sweep);
        assert!(save(&mut doc.clone(), &options, &mut errors, &mut out).is_err());
    }
}
