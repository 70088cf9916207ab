//! The resident document model: xref table, trailer, and object resolution
//! (spec §3 "Indirect Object" / "Trailer", component A "Object Table View").

use std::collections::BTreeMap;

use crate::error::{PdfWriteError, Result};
use crate::object::{Dictionary, Object, ObjectId};

/// Usage-flag bits for the write state's `use[]` array (spec §3).
///
/// The low byte carries the section tag(s); bits 8 and up carry the page
/// index for objects belonging to a page other than page 1. `PAGE1` and a
/// nonzero page index are mutually exclusive on the same entry.
pub mod flags {
    pub const CATALOGUE: u32 = 2;
    pub const PAGE1: u32 = 4;
    pub const SHARED: u32 = 8;
    pub const PARAMS: u32 = 16;
    pub const HINTS: u32 = 32;
    pub const PAGE_OBJECT: u32 = 64;
    pub const OTHER: u32 = 128;

    pub const PAGE_INDEX_SHIFT: u32 = 8;

    pub fn page_index(use_bits: u32) -> u32 {
        use_bits >> PAGE_INDEX_SHIFT
    }

    pub fn with_page_index(flags_low: u32, page_index: u32) -> u32 {
        flags_low | (page_index << PAGE_INDEX_SHIFT)
    }
}

/// One cross-reference table entry (spec §3 "Indirect Object").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XrefEntry {
    /// Not yet allocated / dropped by compaction.
    Free { next_free: u32, gen: u16 },
    /// Resident or on-disk object at a byte offset.
    InUse { offset: u64, gen: u16 },
    /// Packed inside an object stream (spec §10.5 "object-stream aware free list").
    Compressed { stream_id: u32, index: u32 },
}

impl XrefEntry {
    pub fn is_free(&self) -> bool {
        matches!(self, XrefEntry::Free { .. })
    }

    pub fn gen(&self) -> u16 {
        match self {
            XrefEntry::Free { gen, .. } => *gen,
            XrefEntry::InUse { gen, .. } => *gen,
            XrefEntry::Compressed { .. } => 0,
        }
    }
}

/// Trailer dictionary fields (spec §3 "Trailer").
#[derive(Debug, Clone, Default)]
pub struct Trailer {
    pub root: Option<ObjectId>,
    pub info: Option<ObjectId>,
    pub id: Option<(Vec<u8>, Vec<u8>)>,
    pub encrypt: Option<ObjectId>,
    pub size: u32,
    pub prev: Option<u64>,
}

impl Trailer {
    pub fn to_dictionary(&self) -> Dictionary {
        let mut d = Dictionary::new();
        d.set("Size", Object::Integer(self.size as i64));
        if let Some(root) = self.root {
            d.set("Root", Object::Reference(root));
        }
        if let Some(info) = self.info {
            d.set("Info", Object::Reference(info));
        }
        if let Some((a, b)) = &self.id {
            d.set(
                "ID",
                Object::Array(vec![
                    Object::String(a.clone(), crate::object::StringFormat::Hexadecimal),
                    Object::String(b.clone(), crate::object::StringFormat::Hexadecimal),
                ]),
            );
        }
        if let Some(enc) = self.encrypt {
            d.set("Encrypt", Object::Reference(enc));
        }
        if let Some(prev) = self.prev {
            d.set("Prev", Object::Integer(prev as i64));
        }
        d
    }
}

/// Resolves an object number to its current value.
///
/// `Document` is the in-process implementation over a resident
/// `BTreeMap`. The trait exists so tests can exercise the "retryable vs.
/// duff" distinction (spec §4.1, §7) with a resolver that simulates a
/// lazily-loading, possibly-flaky backing store without this crate
/// depending on any actual parser.
pub trait ObjectSource {
    fn resolve(&self, num: u32) -> Result<Option<Object>>;
    fn highest_id(&self) -> u32;
}

/// The in-memory document: a numbered object table plus a trailer.
///
/// Mirrors `lopdf::Document`'s `objects: BTreeMap<ObjectId, Object>` shape
/// (see `pdfjoin_core`'s usage) but keyed by object number alone — this
/// crate always treats the current generation as the live one, consistent
/// with the write-state arrays in spec §3 being indexed purely by number.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub objects: BTreeMap<u32, Object>,
    pub xref: BTreeMap<u32, XrefEntry>,
    pub trailer: Trailer,
    /// Offset of this document's own prior `startxref`, if it was loaded
    /// from an existing file and is now the base of an incremental update.
    /// This is the value an appended xref's `/Prev` must point at — it is
    /// *not* where appended bytes start (see `prior_file_len`).
    pub prior_startxref: Option<u64>,
    /// Total byte length of the file this document was loaded from. An
    /// incremental save concatenates its appendix after this many bytes
    /// (the prior file's xref, trailer and `%%EOF` all sit after
    /// `prior_startxref` but before this length), so appended object
    /// offsets must be measured from here, not from `prior_startxref`.
    pub prior_file_len: Option<u64>,
    /// Spec §5's "freeze updates" flag: set for the duration of one `save`
    /// call via a guaranteed-release scope, cleared on every exit path.
    pub updates_frozen: bool,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Object numbers currently in the table, regardless of reachability.
    pub fn highest_object_number(&self) -> u32 {
        self.objects.keys().copied().max().unwrap_or(0)
    }

    pub fn insert_object(&mut self, num: u32, value: Object) {
        self.objects.insert(num, value);
        self.xref
            .entry(num)
            .or_insert(XrefEntry::InUse { offset: 0, gen: 0 });
    }

    pub fn get(&self, num: u32) -> Option<&Object> {
        self.objects.get(&num)
    }

    pub fn get_mut(&mut self, num: u32) -> Option<&mut Object> {
        self.objects.get_mut(&num)
    }

    /// Resolve a reference one level, per §4.1: a reference to an id
    /// outside `[1, N)`, or to a table slot holding no value, yields
    /// `Ok(None)` ("duff") rather than an error — only a genuinely
    /// retryable failure from a resolver collaborator is an `Err`.
    pub fn resolve(&self, id: ObjectId) -> Result<Option<&Object>> {
        let (num, _gen) = id;
        if num == 0 || num > self.highest_object_number() {
            return Ok(None);
        }
        Ok(self.objects.get(&num))
    }
}

impl ObjectSource for Document {
    fn resolve(&self, num: u32) -> Result<Option<Object>> {
        if num == 0 || num > self.highest_object_number() {
            return Ok(None);
        }
        Ok(self.objects.get(&num).cloned())
    }

    fn highest_id(&self) -> u32 {
        self.highest_object_number()
    }
}

/// Validates an object number is in the legal range for this table, used
/// by the mark/sweep pass to classify a reference as duff vs. resolvable.
pub fn in_range(num: u32, highest: u32) -> bool {
    num >= 1 && num <= highest
}

/// A test-only `ObjectSource` that can be told to fail specific object
/// numbers, either as a duff (silently-null) reference or as a retryable
/// error that must propagate. Grounded on spec §4.1/§7's distinction
/// between the two failure kinds, which a purely in-memory `Document`
/// never actually exercises on its own.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use std::collections::HashSet;

    pub struct FlakyResolver {
        pub inner: Document,
        pub retryable: HashSet<u32>,
    }

    impl FlakyResolver {
        pub fn new(inner: Document) -> Self {
            FlakyResolver {
                inner,
                retryable: HashSet::new(),
            }
        }

        pub fn mark_retryable(mut self, num: u32) -> Self {
            self.retryable.insert(num);
            self
        }
    }

    impl ObjectSource for FlakyResolver {
        fn resolve(&self, num: u32) -> Result<Option<Object>> {
            if self.retryable.contains(&num) {
                return Err(PdfWriteError::Retryable(format!(
                    "object {num} temporarily unavailable"
                )));
            }
            self.inner.resolve(num)
        }

        fn highest_id(&self) -> u32 {
            self.inner.highest_id()
        }
    }
}
