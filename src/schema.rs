use std::collections::HashSet;

use crate::error::ExtractError;
use crate::model::TocEntry;

/// Checks one TOC record against the output schema: non-empty `section_id`,
/// `title` and `full_path`, `page >= 1`, `level >= 1`, and a `parent_id` that
/// is only present below the top level.
pub fn validate_toc_entry(entry: &TocEntry) -> Result<(), ExtractError> {
    let violation = |reason: &str| ExtractError::Schema {
        section_id: entry.section_id.clone(),
        reason: reason.to_string(),
    };

    if entry.section_id.trim().is_empty() {
        return Err(violation("section_id must not be empty"));
    }
    if entry.title.trim().is_empty() {
        return Err(violation("title must not be empty"));
    }
    if entry.full_path.trim().is_empty() {
        return Err(violation("full_path must not be empty"));
    }
    if entry.page < 1 {
        return Err(violation("page must be >= 1"));
    }
    if entry.level < 1 {
        return Err(violation("level must be >= 1"));
    }
    match (&entry.parent_id, entry.level) {
        (Some(_), 1) => return Err(violation("top-level entry must not have a parent_id")),
        (None, level) if level > 1 => {
            return Err(violation("nested entry must have a parent_id"));
        }
        _ => {}
    }
    if entry.tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(violation("tags must not contain empty strings"));
    }

    Ok(())
}

/// Validates every entry and the uniqueness of `section_id` across the list.
pub fn validate_toc(entries: &[TocEntry]) -> Result<(), ExtractError> {
    let mut seen = HashSet::<&str>::new();
    for entry in entries {
        validate_toc_entry(entry)?;
        if !seen.insert(entry.section_id.as_str()) {
            return Err(ExtractError::Schema {
                section_id: entry.section_id.clone(),
                reason: "section_id is not unique".to_string(),
            });
        }
    }
    Ok(())
}
