//! Page range parsing for PDF split/merge operations
//!
//! This module provides Rust implementations of page range parsing that mirror
//! the TypeScript logic in page-operations.ts. Having Rust versions enables
//! property testing with proptest.

use std::collections::BTreeSet;

/// Parse a page ranges string into a sorted, deduplicated list of page numbers.
///
/// # Arguments
/// * `range_str` - Range string like "1-3, 5, 8-10"
/// * `total_pages` - Total pages in the document (for bounds checking)
///
/// # Returns
/// Sorted Vec of page numbers (1-indexed)
///
/// # Examples
/// ```
/// use agentpdf_wasm::page_ranges::parse_page_ranges;
///
/// assert_eq!(parse_page_ranges("1-3", 10), vec![1, 2, 3]);
/// assert_eq!(parse_page_ranges("1, 3, 5", 10), vec![1, 3, 5]);
/// assert_eq!(parse_page_ranges("1-3, 5, 8-10", 10), vec![1, 2, 3, 5, 8, 9, 10]);
/// ```
pub fn parse_page_ranges(range_str: &str, total_pages: usize) -> Vec<usize> {
    let mut pages = BTreeSet::new();

    for part in range_str.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.contains('-') {
            // Range like "1-3"
            let parts: Vec<&str> = part.split('-').collect();
            if parts.len() == 2 {
                if let (Ok(start), Ok(end)) = (
                    parts[0].trim().parse::<usize>(),
                    parts[1].trim().parse::<usize>(),
                ) {
                    let start = start.max(1);
                    let end = end.min(total_pages);
                    for i in start..=end {
                        pages.insert(i);
                    }
                }
            }
        } else {
            // Single page like "5"
            if let Ok(num) = part.parse::<usize>() {
                if num >= 1 && num <= total_pages {
                    pages.insert(num);
                }
            }
        }
    }

    pages.into_iter().collect()
}

/// Validate a page range string without parsing it
///
/// Returns None if valid, Some(error_message) if invalid
pub fn validate_page_range(range_str: &str, total_pages: usize) -> Option<String> {
    if range_str.trim().is_empty() {
        return Some("Page range cannot be empty".to_string());
    }

    for part in range_str.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part.contains('-') {
            let parts: Vec<&str> = part.split('-').collect();
            if parts.len() != 2 {
                return Some(format!("Invalid range format: {}", part));
            }

            let start = parts[0].trim().parse::<usize>();
            let end = parts[1].trim().parse::<usize>();

            match (start, end) {
                (Ok(s), Ok(e)) => {
                    if s > e {
                        return Some(format!("Invalid range: start {} > end {}", s, e));
                    }
                    if s < 1 {
                        return Some(format!("Page number must be >= 1, got {}", s));
                    }
                    if e > total_pages {
                        return Some(format!("Page {} exceeds total pages {}", e, total_pages));
                    }
                }
                _ => return Some(format!("Invalid numbers in range: {}", part)),
            }
        } else {
            match part.parse::<usize>() {
                Ok(n) => {
                    if n < 1 {
                        return Some(format!("Page number must be >= 1, got {}", n));
                    }
                    if n > total_pages {
                        return Some(format!("Page {} exceeds total pages {}", n, total_pages));
                    }
                }
                Err(_) => return Some(format!("Invalid page number: {}", part)),
            }
        }
    }

    None
}

/// Field placement constraints for WCAG accessibility
pub mod field_constraints {
    /// Minimum width for interactive fields (WCAG touch target)
    pub const MIN_FIELD_WIDTH: f64 = 100.0;

    /// Minimum height for interactive fields (WCAG touch target)
    pub const MIN_FIELD_HEIGHT: f64 = 44.0;

    /// Minimum font size for text fields
    pub const MIN_FONT_SIZE: f64 = 11.0;

    /// Maximum font size for text fields
    pub const MAX_FONT_SIZE: f64 = 72.0;

    /// Default signature field dimensions
    pub const SIGNATURE_WIDTH: f64 = 200.0;
    pub const SIGNATURE_HEIGHT: f64 = 50.0;

    /// Default initials field dimensions
    pub const INITIALS_WIDTH: f64 = 60.0;
    pub const INITIALS_HEIGHT: f64 = 44.0;

    /// Checkbox dimensions
    pub const CHECKBOX_SIZE: f64 = 24.0;

    /// Validate field dimensions meet WCAG requirements
    pub fn validate_field_dimensions(width: f64, height: f64) -> Result<(), String> {
        if width < MIN_FIELD_WIDTH {
            return Err(format!(
                "Field width {} is below WCAG minimum of {}",
                width, MIN_FIELD_WIDTH
            ));
        }
        if height < MIN_FIELD_HEIGHT {
            return Err(format!(
                "Field height {} is below WCAG minimum of {}",
                height, MIN_FIELD_HEIGHT
            ));
        }
        Ok(())
    }

    /// Validate font size is within acceptable range
    pub fn validate_font_size(size: f64) -> Result<(), String> {
        if size < MIN_FONT_SIZE {
            return Err(format!(
                "Font size {} is below minimum of {}",
                size, MIN_FONT_SIZE
            ));
        }
        if size > MAX_FONT_SIZE {
            return Err(format!(
                "Font size {} exceeds maximum of {}",
                size, MAX_FONT_SIZE
            ));
        }
        Ok(())
    }
}
