//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document.

use crate::error::PdfJoinError;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Merge multiple PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. If single document, return it as-is
/// 3. Create a new destination document
/// 4. For each source document:
///    a. Calculate ID offset to avoid conflicts
///    b. Import all objects with remapped IDs
///    c. Append pages to the destination
/// 5. Compress and return the merged result
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfJoinError> {
    if documents.is_empty() {
        return Err(PdfJoinError::OperationError("No documents to merge".into()));
    }

    // Single document - return as-is
    if documents.len() == 1 {
        return Ok(documents.into_iter().next().unwrap());
    }

    // Load all documents first
    let mut loaded_docs = Vec::new();
    for (i, doc_bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(doc_bytes).map_err(|e| {
            PdfJoinError::ParseError(format!("Failed to load document {}: {}", i, e))
        })?;
        loaded_docs.push(doc);
    }

    // Start with the first document as the base
    let mut dest = loaded_docs.remove(0);
    let mut dest_max_id = dest.max_id;

    // Get the destination page list
    let mut dest_page_refs = get_page_references(&dest)?;

    // Merge each remaining document
    for source in loaded_docs.into_iter() {
        // Get source pages before we start modifying the document
        let source_pages = get_page_references(&source)?;

        // Calculate offset for object IDs to avoid conflicts
        let id_offset = dest_max_id;

        // Remap all object IDs in the source document
        let mut remapped_objects = BTreeMap::new();
        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            let remapped_object = remap_object_refs(object, id_offset);
            remapped_objects.insert(new_id, remapped_object);
        }

        // Add all remapped objects to destination
        for (id, object) in remapped_objects {
            dest.objects.insert(id, object);
        }

        // Remap and add source pages to destination page list
        for old_page_ref in source_pages {
            let new_page_ref = (old_page_ref.0 + id_offset, old_page_ref.1);
            dest_page_refs.push(new_page_ref);
        }

        // Update destination max_id
        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
    }

    // Update the pages array in the destination document
    update_page_tree(&mut dest, dest_page_refs)?;

    // Update max_id
    dest.max_id = dest_max_id;

    // Compress and serialize
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfJoinError::OperationError(format!("Failed to save merged PDF: {}", e)))?;

    Ok(buffer)
}

/// Get all page object references from a document
fn get_page_references(doc: &Document) -> Result<Vec<ObjectId>, PdfJoinError> {
    let pages = doc.get_pages();
    Ok(pages.values().copied().collect())
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Update the page tree in the destination document with new page references
fn update_page_tree(doc: &mut Document, page_refs: Vec<ObjectId>) -> Result<(), PdfJoinError> {
    // Get the catalog
    let root_obj = doc
        .trailer
        .get(b"Root")
        .map_err(|_| PdfJoinError::OperationError("No Root in trailer".into()))?;

    let catalog_id = root_obj
        .as_reference()
        .map_err(|_| PdfJoinError::OperationError("Root is not a reference".into()))?;

    let catalog = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| PdfJoinError::OperationError("Catalog not found".into()))?
        .as_dict()
        .map_err(|_| PdfJoinError::OperationError("Invalid catalog".into()))?;

    let pages_obj = catalog
        .get(b"Pages")
        .map_err(|_| PdfJoinError::OperationError("No Pages in catalog".into()))?;

    let pages_id = pages_obj
        .as_reference()
        .map_err(|_| PdfJoinError::OperationError("Pages is not a reference".into()))?;

    // Update the pages dictionary
    if let Some(Object::Dictionary(ref mut pages_dict)) = doc.objects.get_mut(&pages_id) {
        // Update the Kids array
        let kids = page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        pages_dict.set("Kids", Object::Array(kids));

        // Update the Count
        pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
    } else {
        return Err(PdfJoinError::OperationError(
            "Invalid pages dictionary".into(),
        ));
    }

    Ok(())
}
