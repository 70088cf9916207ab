//! Fixture builders for tests (SPEC_FULL §10.4), in the style of
//! `pdfjoin_core`'s `create_test_pdf`: construct a minimal document
//! directly against this crate's own object model — never by parsing.

use crate::document::Document;
use crate::object::{Dictionary, Object, Stream};

/// Builds a minimal `num_pages`-page document: one Catalog, one Pages
/// container, `num_pages` Page objects each with a tiny content stream.
/// Object numbers are assigned sequentially starting at 1, matching the
/// seed scenarios' "ascending id order" expectations (spec §8 S1).
pub fn build_minimal_document(num_pages: u32) -> Document {
    let mut doc = Document::new();

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::name("Catalog"));
    catalog.set("Pages", Object::Reference((2, 0)));
    doc.insert_object(1, Object::Dictionary(catalog));

    let mut next_id = 3u32;
    let mut kid_refs = Vec::new();
    for _ in 0..num_pages {
        let page_id = next_id;
        let content_id = next_id + 1;
        next_id += 2;

        let mut content = Dictionary::new();
        content.set("Length", Object::Integer(0));
        doc.insert_object(content_id, Object::Stream(Stream::new(content, b"BT ET".to_vec())));

        let mut page = Dictionary::new();
        page.set("Type", Object::name("Page"));
        page.set("Parent", Object::Reference((2, 0)));
        page.set("Contents", Object::Reference((content_id, 0)));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        doc.insert_object(page_id, Object::Dictionary(page));
        kid_refs.push(Object::Reference((page_id, 0)));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::name("Pages"));
    pages.set("Count", Object::Integer(num_pages as i64));
    pages.set("Kids", Object::Array(kid_refs));
    doc.insert_object(2, Object::Dictionary(pages));

    doc.trailer.root = Some((1, 0));
    doc
}

/// Adds a second page whose `Resources` dictionary is shared (same
/// object id) with the first page — the S2/shared-object fixture shape.
pub fn build_document_with_shared_resource(num_pages: u32) -> Document {
    let mut doc = build_minimal_document(num_pages);
    let shared_id = doc.highest_object_number() + 1;
    doc.insert_object(shared_id, Object::Dictionary(Dictionary::new()));

    let page_ids: Vec<u32> = doc
        .objects
        .iter()
        .filter(|(_, v)| v.as_dict().map(|d| d.type_is(b"Page")).unwrap_or(false))
        .map(|(&num, _)| num)
        .collect();

    for num in page_ids {
        let mut page = doc.get(num).unwrap().as_dict().unwrap().clone();
        page.set("Resources", Object::Reference((shared_id, 0)));
        doc.insert_object(num, Object::Dictionary(page));
    }
    doc
}
