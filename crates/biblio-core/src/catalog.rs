//! # Catalog Normalization
//!
//! Pure mapping from raw imported records to canonical book fields.
//!
//! Catalog data arrives from heterogeneous sources (manual entry, CSV
//! imports) that disagree on key names: `Title` vs `title`, `Genre` vs
//! `category`. Normalization happens once, at the store boundary, so the
//! circulation core only ever sees canonical books.

use serde::Deserialize;

use crate::error::ValidationError;
use crate::validation::{validate_author, validate_category, validate_title};

/// A raw book record as submitted, tolerating alternate field spellings.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBookRecord {
    #[serde(default, alias = "Title")]
    pub title: Option<String>,

    #[serde(default, alias = "Author")]
    pub author: Option<String>,

    /// `Genre` is the spelling used by common CSV export tools.
    #[serde(default, alias = "Genre", alias = "genre")]
    pub category: Option<String>,
}

/// Canonical, validated book fields ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBookFields {
    pub title: String,
    pub author: String,
    pub category: String,
}

/// Normalizes a raw record into canonical fields.
///
/// Trims whitespace and validates each field; a missing or empty field fails
/// with the canonical field name regardless of the spelling used.
pub fn normalize(raw: RawBookRecord) -> Result<CanonicalBookFields, ValidationError> {
    let title = raw.title.unwrap_or_default().trim().to_string();
    let author = raw.author.unwrap_or_default().trim().to_string();
    let category = raw.category.unwrap_or_default().trim().to_string();

    validate_title(&title)?;
    validate_author(&author)?;
    validate_category(&category)?;

    Ok(CanonicalBookFields {
        title,
        author,
        category,
    })
}
