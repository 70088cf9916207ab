//! Component E: page classifier (spec §4.4).
//!
//! Walks the catalog, assigning every reachable object exactly one primary
//! section tag plus `SHARED` where a second page context reaches it. A
//! transient "in-progress" style guard isn't needed here the way mark/sweep
//! needed one: once an object has been visited the first time, later
//! arrivals only update flags (primary tag unchanged, `SHARED` added) and
//! never recurse again, which is itself cycle-safe.

use std::collections::HashSet;

use crate::document::{flags, Document};
use crate::object::Object;

#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    /// The `Page` dictionary's own (old, pre-second-renumber) id.
    pub page_object_number: u32,
    /// Every object id this page's subtree touched, unsorted, possibly
    /// with duplicates — heap-ordered during collection per spec §3,
    /// sorted and deduplicated once by [`PageInfo::finish`].
    pub object_ids: Vec<u32>,
}

impl PageInfo {
    pub fn finish(&mut self) {
        self.object_ids.sort_unstable();
        self.object_ids.dedup();
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassifyResult {
    /// Accumulated `use[]`-style bits per object number (section flags in
    /// the low byte, page index in bits ≥8), to be OR'd into the write
    /// state by the orchestrator.
    pub flags: std::collections::HashMap<u32, u32>,
    pub pages: Vec<PageInfo>,
}

#[derive(Clone, Copy)]
enum TagMode {
    Page(u32),
    Flat(u32),
}

struct Classifier<'a> {
    doc: &'a Document,
    flags: std::collections::HashMap<u32, u32>,
    visited: HashSet<u32>,
    pages: Vec<PageInfo>,
    /// Index into `pages` that subsequently-visited objects belong to,
    /// set only while the current leaf page's own subtree is being walked
    /// (never while descending through a container on the path to it).
    current_page_idx: Option<usize>,
}

pub fn classify(doc: &Document) -> ClassifyResult {
    let mut c = Classifier {
        doc,
        flags: std::collections::HashMap::new(),
        visited: HashSet::new(),
        pages: Vec::new(),
        current_page_idx: None,
    };

    let Some(root_id) = doc.trailer.root else {
        return ClassifyResult::default();
    };

    let use_outlines = doc
        .get(root_id.0)
        .and_then(|v| v.as_dict())
        .and_then(|d| d.get(b"PageMode"))
        .and_then(|v| v.as_name_str())
        .map(|s| s == "UseOutlines")
        .unwrap_or(false);

    c.tag(root_id.0, TagMode::Flat(flags::CATALOGUE));
    if c.visited.insert(root_id.0) {
        if let Some(dict) = doc.get(root_id.0).and_then(|v| v.as_dict()).cloned() {
            for (key, value) in dict.iter() {
                match key {
                    b"Pages" => {
                        if let Some(id) = value.as_reference() {
                            let mut counter = 0u32;
                            c.walk_pages(id, &mut counter);
                        }
                    }
                    b"Names" | b"Dests" => {
                        if let Some(id) = value.as_reference() {
                            c.walk_flat(id, flags::OTHER);
                        }
                    }
                    b"Outlines" => {
                        if let Some(id) = value.as_reference() {
                            let tag = if use_outlines {
                                flags::PAGE1
                            } else {
                                flags::OTHER
                            };
                            c.walk_flat(id, tag);
                        }
                    }
                    _ => {
                        c.mark_value(value, TagMode::Flat(flags::CATALOGUE));
                    }
                }
            }
        }
    }

    for page in c.pages.iter_mut() {
        page.finish();
    }

    ClassifyResult {
        flags: c.flags,
        pages: c.pages,
    }
}

fn is_page_dict(value: &Object) -> bool {
    value.as_dict().map(|d| d.type_is(b"Page")).unwrap_or(false)
}

fn is_container(value: &Object) -> bool {
    value
        .as_dict()
        .map(|d| d.has(b"Kids"))
        .unwrap_or(false)
}

impl<'a> Classifier<'a> {
    fn tag(&mut self, num: u32, mode: TagMode) {
        if num == 0 {
            return;
        }
        let existing = self.flags.get(&num).copied().unwrap_or(0);
        let had_any = existing != 0;
        match mode {
            TagMode::Page(page_index) => {
                let had_page_tag =
                    existing & flags::PAGE1 != 0 || flags::page_index(existing) != 0;
                if had_page_tag {
                    self.flags.entry(num).and_modify(|f| *f |= flags::SHARED).or_insert(flags::SHARED);
                } else if page_index == 0 {
                    self.flags.entry(num).and_modify(|f| *f |= flags::PAGE1).or_insert(flags::PAGE1);
                } else {
                    let entry = self.flags.entry(num).or_insert(0);
                    *entry = flags::with_page_index(*entry & 0xff, page_index);
                }
                if let Some(idx) = self.current_page_idx {
                    self.pages[idx].object_ids.push(num);
                }
            }
            TagMode::Flat(bits) => {
                if had_any {
                    self.flags.entry(num).and_modify(|f| *f |= bits);
                } else {
                    self.flags.insert(num, bits);
                }
            }
        }
    }

    fn walk_pages(&mut self, id: crate::object::ObjectId, counter: &mut u32) {
        let num = id.0;
        if num == 0 {
            return;
        }
        self.tag(num, TagMode::Page(*counter));
        if !self.visited.insert(num) {
            return;
        }
        let Some(value) = self.doc.get(num).cloned() else {
            return;
        };
        if is_container(&value) {
            if let Some(dict) = value.as_dict() {
                if let Some(Object::Array(kids)) = dict.get(b"Kids") {
                    for kid in kids.clone() {
                        if let Some(kid_id) = kid.as_reference() {
                            self.walk_pages(kid_id, counter);
                        }
                    }
                }
                for (key, v) in dict.iter() {
                    if key != b"Kids" && key != b"Parent" {
                        self.mark_value(v, TagMode::Page(*counter));
                    }
                }
            }
        } else {
            if is_page_dict(&value) {
                self.pages.push(PageInfo {
                    page_object_number: num,
                    object_ids: vec![num],
                });
                self.tag(num, TagMode::Flat(flags::PAGE_OBJECT));
                self.current_page_idx = Some(self.pages.len() - 1);
            }
            if let Some(dict) = value.as_dict() {
                for (key, v) in dict.iter() {
                    if key != b"Parent" {
                        self.mark_value(v, TagMode::Page(*counter));
                    }
                }
            }
            self.current_page_idx = None;
            *counter += 1;
        }
    }

    fn walk_flat(&mut self, id: crate::object::ObjectId, bits: u32) {
        let num = id.0;
        if num == 0 {
            return;
        }
        self.tag(num, TagMode::Flat(bits));
        if !self.visited.insert(num) {
            return;
        }
        if let Some(value) = self.doc.get(num).cloned() {
            self.mark_value(&value, TagMode::Flat(bits));
        }
    }

    fn mark_value(&mut self, value: &Object, mode: TagMode) {
        match value {
            Object::Reference(id) => match mode {
                TagMode::Page(counter) => {
                    let num = id.0;
                    if num == 0 {
                        return;
                    }
                    self.tag(num, TagMode::Page(counter));
                    if self.visited.insert(num) {
                        if let Some(v) = self.doc.get(num).cloned() {
                            self.mark_value(&v, mode);
                        }
                    }
                }
                TagMode::Flat(bits) => self.walk_flat(*id, bits),
            },
            Object::Array(items) => {
                for item in items {
                    self.mark_value(item, mode);
                }
            }
            Object::Dictionary(dict) => {
                for (_, v) in dict.iter() {
                    self.mark_value(v, mode);
                }
            }
            Object::Stream(stream) => {
                for (_, v) in stream.dict.iter() {
                    self.mark_value(v, mode);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dictionary;

    fn page(parent: u32, kids_of: Option<&str>) -> Dictionary {
        let mut d = Dictionary::new();
        d.set("Type", Object::name("Page"));
        d.set("Parent", Object::Reference((parent, 0)));
        let _ = kids_of;
        d
    }

    fn build_two_page_doc() -> Document {
        let mut doc = Document::new();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::name("Catalog"));
        catalog.set("Pages", Object::Reference((2, 0)));
        doc.insert_object(1, Object::Dictionary(catalog));

        let mut pages = Dictionary::new();
        pages.set("Type", Object::name("Pages"));
        pages.set(
            "Kids",
            Object::Array(vec![Object::Reference((3, 0)), Object::Reference((4, 0))]),
        );
        doc.insert_object(2, Object::Dictionary(pages));

        doc.insert_object(3, Object::Dictionary(page(2, None)));
        doc.insert_object(4, Object::Dictionary(page(2, None)));

        doc.trailer.root = Some((1, 0));
        doc
    }

    #[test]
    fn first_page_tagged_page1_second_gets_page_index() {
        let doc = build_two_page_doc();
        let result = classify(&doc);
        assert_eq!(result.flags.get(&3).copied().unwrap() & flags::PAGE1, flags::PAGE1);
        let page4 = result.flags.get(&4).copied().unwrap();
        assert_eq!(flags::page_index(page4), 1);
    }

    #[test]
    fn catalog_tagged_catalogue() {
        let doc = build_two_page_doc();
        let result = classify(&doc);
        assert_eq!(result.flags.get(&1).copied(), Some(flags::CATALOGUE));
    }

    #[test]
    fn shared_resource_gets_shared_flag() {
        let mut doc = build_two_page_doc();
        let mut p3 = doc.get(3).unwrap().as_dict().unwrap().clone();
        p3.set("Resources", Object::Reference((5, 0)));
        doc.insert_object(3, Object::Dictionary(p3));
        let mut p4 = doc.get(4).unwrap().as_dict().unwrap().clone();
        p4.set("Resources", Object::Reference((5, 0)));
        doc.insert_object(4, Object::Dictionary(p4));
        doc.insert_object(5, Object::Dictionary(Dictionary::new()));

        let result = classify(&doc);
        let shared = result.flags.get(&5).copied().unwrap();
        assert_eq!(shared & flags::SHARED, flags::SHARED);
    }

    #[test]
    fn two_pages_recorded_in_page_list() {
        let doc = build_two_page_doc();
        let result = classify(&doc);
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.pages[0].page_object_number, 3);
        assert_eq!(result.pages[1].page_object_number, 4);
    }
}
