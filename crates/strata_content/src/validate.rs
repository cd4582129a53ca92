//! Validation of content-types and fields before they reach the store.
//!
//! Validation failures are values, not errors: `save`-style operations hand
//! the invalid, unsaved entity back to the caller together with its issues.

use crate::model::{ContentType, Field};
use std::fmt;
use strata_db::ident::is_valid_handle;

/// One reason an entity failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Attribute at fault
    pub attribute: &'static str,
    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    pub fn new(attribute: &'static str, message: impl Into<String>) -> Self {
        Self {
            attribute,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.message)
    }
}

/// Result of a save-style operation.
///
/// `Invalid` carries the entity back unsaved so the caller can inspect and
/// correct it; only store failures become `Err`.
#[derive(Debug)]
pub enum SaveOutcome<T> {
    /// Persisted; the entity carries its assigned id and timestamps.
    Saved(T),
    /// Rejected by validation; nothing was written.
    Invalid {
        entity: T,
        issues: Vec<ValidationIssue>,
    },
}

impl<T> SaveOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// The saved entity, or None if validation rejected it.
    pub fn saved(self) -> Option<T> {
        match self {
            Self::Saved(entity) => Some(entity),
            Self::Invalid { .. } => None,
        }
    }

    /// The validation issues, empty for saved outcomes.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Saved(_) => &[],
            Self::Invalid { issues, .. } => issues,
        }
    }
}

fn check_handle(issues: &mut Vec<ValidationIssue>, handle: &str) {
    if handle.is_empty() {
        issues.push(ValidationIssue::new("handle", "is required"));
    } else if !is_valid_handle(handle) {
        issues.push(ValidationIssue::new(
            "handle",
            "must start with a lowercase letter and contain only lowercase letters, digits, and underscores",
        ));
    }
}

fn check_label(issues: &mut Vec<ValidationIssue>, label: &str) {
    if label.trim().is_empty() {
        issues.push(ValidationIssue::new("label", "is required"));
    }
}

impl ContentType {
    /// Validate required attributes. Empty result means valid.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        check_handle(&mut issues, &self.handle);
        check_label(&mut issues, &self.label);
        if let Some(max_entries) = self.max_entries {
            if max_entries < 1 {
                issues.push(ValidationIssue::new("max_entries", "must be at least 1"));
            }
        }
        if self.id.is_some() && self.id == self.parent_id {
            issues.push(ValidationIssue::new("parent_id", "cannot be itself"));
        }
        issues
    }
}

impl Field {
    /// Validate required attributes. Empty result means valid.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        check_handle(&mut issues, &self.handle);
        check_label(&mut issues, &self.label);
        if self.sort_order < 0 {
            issues.push(ValidationIssue::new("sort_order", "cannot be negative"));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;

    #[test]
    fn valid_entities_produce_no_issues() {
        assert!(ContentType::new(1, "blog", "Blog").validate().is_empty());
        assert!(Field::new("title", "Title", FieldType::Text)
            .validate()
            .is_empty());
    }

    #[test]
    fn missing_attributes_are_reported() {
        let issues = ContentType::new(1, "", "  ").validate();
        let attributes: Vec<&str> = issues.iter().map(|i| i.attribute).collect();
        assert_eq!(attributes, vec!["handle", "label"]);
    }

    #[test]
    fn handles_must_be_identifiers() {
        let issues = ContentType::new(1, "Blog Posts", "Blog").validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].attribute, "handle");
    }

    #[test]
    fn bounds_are_checked() {
        let ct = ContentType::new(1, "blog", "Blog").with_max_entries(0);
        assert_eq!(ct.validate()[0].attribute, "max_entries");

        let field = Field::new("title", "Title", FieldType::Text).with_sort_order(-1);
        assert_eq!(field.validate()[0].attribute, "sort_order");
    }

    #[test]
    fn a_content_type_cannot_parent_itself() {
        let mut ct = ContentType::new(1, "blog", "Blog");
        ct.id = Some(7);
        ct.parent_id = Some(7);
        assert_eq!(ct.validate()[0].attribute, "parent_id");
    }
}
