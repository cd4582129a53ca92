//! Strict identifier validation for handles.
//!
//! Handles become physical schema identifiers (table names, column names), so
//! they are validated at the boundary before any DDL interpolation: ASCII
//! lowercase first character, then lowercase letters, digits, or underscores.

use crate::error::{DbError, Result};

/// Longest accepted handle. Keeps composed table names well under SQLite's
/// identifier comfort zone.
pub const MAX_HANDLE_LEN: usize = 64;

/// Check whether a handle is a valid schema identifier.
pub fn is_valid_handle(handle: &str) -> bool {
    if handle.is_empty() || handle.len() > MAX_HANDLE_LEN {
        return false;
    }
    let mut chars = handle.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Validate a handle, naming what it identifies in the error.
pub fn ensure_valid_handle(what: &str, handle: &str) -> Result<()> {
    if is_valid_handle(handle) {
        Ok(())
    } else {
        Err(DbError::invalid_identifier(format!(
            "{what} {handle:?} must start with a lowercase letter and contain only lowercase letters, digits, and underscores (max {MAX_HANDLE_LEN} chars)"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_handles() {
        assert!(is_valid_handle("blog"));
        assert!(is_valid_handle("main"));
        assert!(is_valid_handle("press_releases"));
        assert!(is_valid_handle("a1_b2"));
    }

    #[test]
    fn rejects_bad_handles() {
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("Blog"));
        assert!(!is_valid_handle("1blog"));
        assert!(!is_valid_handle("_blog"));
        assert!(!is_valid_handle("blog post"));
        assert!(!is_valid_handle("blog-post"));
        assert!(!is_valid_handle("blog;drop"));
        assert!(!is_valid_handle(&"a".repeat(MAX_HANDLE_LEN + 1)));
    }

    #[test]
    fn ensure_names_the_offender() {
        let err = ensure_valid_handle("field handle", "Bad One").unwrap_err();
        match err {
            DbError::InvalidIdentifier(msg) => {
                assert!(msg.contains("field handle"));
                assert!(msg.contains("Bad One"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
