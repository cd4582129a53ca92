//! Helpful error types for CLI commands.
//!
//! Every error includes what went wrong, context about the situation, and
//! suggestions for how to fix it.

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    /// Create a new helpful error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggestion for fixing the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    // === Common error constructors ===

    /// Database file does not exist yet
    pub fn database_not_found(path: &Path) -> Self {
        Self::new("Database not found")
            .with_context(format!("Expected database at: {}", path.display()))
            .with_suggestion("TRY: strata init   # Create the database")
    }

    /// Named site does not exist
    pub fn site_not_found(handle: &str) -> Self {
        Self::new(format!("Site not found: {:?}", handle))
            .with_context("No site with this handle exists in the database")
            .with_suggestion("TRY: strata site list          # See available sites")
            .with_suggestion(format!("TRY: strata site add {handle}   # Create it"))
    }

    /// Named content-type does not exist on the current site
    pub fn content_type_not_found(handle: &str) -> Self {
        Self::new(format!("Content-type not found: {:?}", handle))
            .with_context("No content-type with this handle exists on the current site")
            .with_suggestion("TRY: strata type list   # See the site's content-types")
    }

    /// Named field does not exist on the content-type
    pub fn field_not_found(type_handle: &str, handle: &str) -> Self {
        Self::new(format!("Field not found: {:?}", handle))
            .with_context(format!(
                "Content-type {:?} has no field with this handle",
                type_handle
            ))
            .with_suggestion(format!("TRY: strata field list {type_handle}"))
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Report a failed command as JSON on stdout (machine-readable mode).
pub fn print_json_error(err: &anyhow::Error) {
    let payload = serde_json::json!({
        "error": format!("{:#}", err),
    });
    println!("{}", payload);
}

/// Render validation issues as a helpful error.
pub fn validation_failed(
    what: &str,
    issues: &[strata_content::ValidationIssue],
) -> HelpfulError {
    let mut err = HelpfulError::new(format!("{} failed validation", what))
        .with_context("Nothing was saved");
    for issue in issues {
        err = err.with_suggestion(format!("FIX: {}", issue));
    }
    err
}
