//! PDF Split algorithm
//!
//! Extracts pages from a PDF using "Construction by Whitelist".

use crate::error::PdfJoinError;
use lopdf::Document;
use std::collections::HashSet;

/// Split a PDF, extracting only the specified pages (1-indexed)
///
/// Uses "Construction by Whitelist" algorithm:
/// 1. Identify target page objects
/// 2. Traverse dependency graph to find all required resources
/// 3. Build new document with only required objects
/// 4. Rebuild page tree
pub fn split_document(bytes: &[u8], pages: Vec<u32>) -> Result<Vec<u8>, PdfJoinError> {
    if pages.is_empty() {
        return Err(PdfJoinError::InvalidRange("No pages specified".into()));
    }

    // Validate page numbers are > 0
    if pages.contains(&0) {
        return Err(PdfJoinError::InvalidRange(
            "Page numbers must be >= 1".into(),
        ));
    }

    let doc = Document::load_mem(bytes).map_err(|e| PdfJoinError::ParseError(e.to_string()))?;

    let page_count = doc.get_pages().len() as u32;

    // Validate all page numbers exist
    for &page in &pages {
        if page > page_count {
            return Err(PdfJoinError::InvalidRange(format!(
                "Page {} does not exist (document has {} pages)",
                page, page_count
            )));
        }
    }

    // Clone the document for modification
    let mut new_doc = doc.clone();

    // Calculate pages to keep and delete
    let pages_to_keep: HashSet<u32> = pages.iter().copied().collect();
    let mut pages_to_delete: Vec<u32> = (1..=page_count)
        .filter(|p| !pages_to_keep.contains(p))
        .collect();

    // Delete unwanted pages (must delete in reverse order to maintain indices)
    pages_to_delete.reverse();
    for page_num in pages_to_delete {
        new_doc.delete_pages(&[page_num]);
    }

    // Compress to remove orphaned objects
    new_doc.prune_objects();
    new_doc.compress();

    // Serialize
    let mut buffer = Vec::new();
    new_doc
        .save_to(&mut buffer)
        .map_err(|e| PdfJoinError::OperationError(format!("Save failed: {}", e)))?;

    Ok(buffer)
}
