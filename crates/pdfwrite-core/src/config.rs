//! Save configuration (spec §6 "Configuration", SPEC_FULL §10.3).

use crate::error::{PdfWriteError, Result};

/// Which stream classes the caller wants decoded back to raw bytes before
/// re-filtering (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandPolicy {
    #[default]
    Off,
    Images,
    Fonts,
    All,
}

/// Garbage-collection level (spec §6): each level is a strict superset of
/// the previous one's work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum GarbageLevel {
    #[default]
    None,
    Sweep,
    Compact,
    Dedupe,
    DedupeStreams,
}

impl GarbageLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            GarbageLevel::None => 0,
            GarbageLevel::Sweep => 1,
            GarbageLevel::Compact => 2,
            GarbageLevel::Dedupe => 3,
            GarbageLevel::DedupeStreams => 4,
        }
    }

    pub fn at_least(self, other: GarbageLevel) -> bool {
        self.as_u8() >= other.as_u8()
    }
}

impl From<u8> for GarbageLevel {
    fn from(v: u8) -> Self {
        match v {
            0 => GarbageLevel::None,
            1 => GarbageLevel::Sweep,
            2 => GarbageLevel::Compact,
            3 => GarbageLevel::Dedupe,
            _ => GarbageLevel::DedupeStreams,
        }
    }
}

/// Save-time options, matching spec §6's recognized option set.
///
/// Builder-style setters returning `Self`, following the workspace's other
/// option-struct conventions (see `docsign-web`'s signing-options builder).
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub incremental: bool,
    pub expand: ExpandPolicy,
    pub deflate: bool,
    pub ascii: bool,
    pub garbage: GarbageLevel,
    pub linear: bool,
    pub clean: bool,
    pub tight: bool,
    pub continue_on_error: bool,
    pub xref_stream: bool,
}

impl SaveOptions {
    pub fn new() -> Self {
        SaveOptions::default()
    }

    pub fn incremental(mut self, v: bool) -> Self {
        self.incremental = v;
        self
    }

    pub fn expand(mut self, v: ExpandPolicy) -> Self {
        self.expand = v;
        self
    }

    pub fn deflate(mut self, v: bool) -> Self {
        self.deflate = v;
        self
    }

    pub fn ascii(mut self, v: bool) -> Self {
        self.ascii = v;
        self
    }

    pub fn garbage(mut self, v: GarbageLevel) -> Self {
        self.garbage = v;
        self
    }

    pub fn linear(mut self, v: bool) -> Self {
        self.linear = v;
        self
    }

    pub fn clean(mut self, v: bool) -> Self {
        self.clean = v;
        self
    }

    pub fn tight(mut self, v: bool) -> Self {
        self.tight = v;
        self
    }

    pub fn continue_on_error(mut self, v: bool) -> Self {
        self.continue_on_error = v;
        self
    }

    /// Selects xref-stream ("Stream") encoding over the classic table
    /// (spec §4.7's two encodings) for single-pass, non-incremental saves.
    pub fn xref_stream(mut self, v: bool) -> Self {
        self.xref_stream = v;
        self
    }

    /// Rejects the configuration-error combinations named in spec §4.9 /
    /// §7 before any write-state allocation happens.
    pub fn validate(&self) -> Result<()> {
        if self.incremental && self.garbage != GarbageLevel::None {
            return Err(PdfWriteError::Configuration(
                "incremental saves cannot also run garbage collection".into(),
            ));
        }
        if self.incremental && self.linear {
            return Err(PdfWriteError::Configuration(
                "incremental saves cannot also linearize".into(),
            ));
        }
        if self.linear && !self.garbage.at_least(GarbageLevel::Compact) {
            return Err(PdfWriteError::Configuration(
                "linearized output requires garbage collection at Compact or higher".into(),
            ));
        }
        if self.linear && self.xref_stream {
            return Err(PdfWriteError::Configuration(
                "linearized output always uses a classic first-page xref; xref_stream applies only to single-pass saves".into(),
            ));
        }
        Ok(())
    }
}
