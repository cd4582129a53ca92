//! Domain types for the content layer.
//!
//! These types are the single source of truth for content-type, field, and
//! entry records. All interfaces (CLI, service callers) should use them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_db::dynamic::ColumnType;
use strata_db::{DbError, Result, StrataDb};
use uuid::Uuid;

/// A site scopes content-types and the names of their data tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Unique identifier
    pub id: i64,
    /// Scoping handle, unique across sites
    pub handle: String,
    /// Human-readable name
    pub name: String,
    /// Created timestamp (epoch millis)
    pub date_created: i64,
    /// Updated timestamp (epoch millis)
    pub date_updated: i64,
    /// External identity
    pub uid: String,
}

/// A user-defined category of content records ("section").
///
/// Each saved content-type owns one dynamic entry data table named
/// `entrydata_<site>_<handle>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    /// None until the first successful save
    pub id: Option<i64>,
    /// Owning site
    pub site_id: i64,
    /// Optional parent content-type (nesting)
    pub parent_id: Option<i64>,
    /// Handle, unique per site; becomes part of the table name
    pub handle: String,
    /// Display label
    pub label: String,
    /// URL-format template
    pub url_format: Option<String>,
    /// Per-instance entry cap
    pub max_entries: Option<i64>,
    /// Whether entries are manually sortable
    pub sortable: bool,
    /// Created timestamp (epoch millis, set on save)
    pub date_created: i64,
    /// Updated timestamp (epoch millis, set on save)
    pub date_updated: i64,
    /// External identity
    pub uid: String,
}

impl ContentType {
    /// New unsaved content-type draft.
    pub fn new(site_id: i64, handle: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            site_id,
            parent_id: None,
            handle: handle.into(),
            label: label.into(),
            url_format: None,
            max_entries: None,
            sortable: false,
            date_created: 0,
            date_updated: 0,
            uid: Uuid::new_v4().to_string(),
        }
    }

    /// Nest under a parent content-type.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the URL-format template.
    pub fn with_url_format(mut self, url_format: impl Into<String>) -> Self {
        self.url_format = Some(url_format.into());
        self
    }

    /// Cap the number of entries.
    pub fn with_max_entries(mut self, max_entries: i64) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Mark entries as manually sortable.
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Created timestamp as a DateTime.
    pub fn created_at(&self) -> DateTime<Utc> {
        StrataDb::millis_to_datetime(self.date_created)
    }
}

/// Declared value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Json,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "timestamp" => Ok(Self::Timestamp),
            "json" => Ok(Self::Json),
            other => Err(DbError::invalid_state(format!(
                "unknown field type: {other}"
            ))),
        }
    }

    /// Physical column type backing this field.
    ///
    /// Booleans and timestamps are stored as integers; JSON as text.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Text | Self::Json => ColumnType::Text,
            Self::Integer | Self::Boolean | Self::Timestamp => ColumnType::Integer,
            Self::Float => ColumnType::Real,
        }
    }
}

/// A user-defined attribute of a content-type ("block").
///
/// Each saved field is backed by one physical column named
/// `field_<handle>` in the owning content-type's data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// None until the first successful save
    pub id: Option<i64>,
    /// Owning content-type, assigned on save
    pub content_type_id: Option<i64>,
    /// Handle, unique within the content-type; becomes the column suffix
    pub handle: String,
    /// Display label
    pub label: String,
    /// Declared value type
    pub field_type: FieldType,
    /// Position among the content-type's fields (auto-assigned when 0)
    pub sort_order: i64,
    /// Author-facing instructions
    pub instructions: Option<String>,
    /// Whether a value is required
    pub required: bool,
    /// Created timestamp (epoch millis, set on save)
    pub date_created: i64,
    /// Updated timestamp (epoch millis, set on save)
    pub date_updated: i64,
    /// External identity
    pub uid: String,
}

impl Field {
    /// New unsaved field draft.
    pub fn new(
        handle: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            id: None,
            content_type_id: None,
            handle: handle.into(),
            label: label.into(),
            field_type,
            sort_order: 0,
            instructions: None,
            required: false,
            date_created: 0,
            date_updated: 0,
            uid: Uuid::new_v4().to_string(),
        }
    }

    /// Set author-facing instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Mark the field as required.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Pin an explicit sort order (auto-assigned when left at 0).
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Physical column name backing this field.
    pub fn column_name(&self) -> String {
        format!("{}{}", strata_db::introspect::FIELD_COLUMN_PREFIX, self.handle)
    }
}

/// One item of a content-type's field-selection list.
///
/// Caller order becomes the persisted 1-based sort order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSelection {
    pub field_id: i64,
    pub required: bool,
}

/// A field joined through the selection junction, with its persisted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedField {
    pub field: Field,
    pub required: bool,
    pub sort_order: i64,
}

/// One content record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub content_type_id: i64,
    /// Optional parent entry (hierarchy)
    pub parent_id: Option<i64>,
    pub date_created: i64,
    pub date_updated: i64,
    pub uid: String,
}

impl Entry {
    /// Created timestamp as a DateTime.
    pub fn created_at(&self) -> DateTime<Utc> {
        StrataDb::millis_to_datetime(self.date_created)
    }
}

/// One revision of one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryVersion {
    pub id: i64,
    pub entry_id: i64,
    /// 1-based revision number, unique per entry
    pub num: i64,
    pub notes: Option<String>,
    pub date_created: i64,
    pub date_updated: i64,
    pub uid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_round_trips_through_strings() {
        for field_type in [
            FieldType::Text,
            FieldType::Integer,
            FieldType::Float,
            FieldType::Boolean,
            FieldType::Timestamp,
            FieldType::Json,
        ] {
            assert_eq!(FieldType::parse(field_type.as_str()).unwrap(), field_type);
        }
        assert!(FieldType::parse("blob").is_err());
    }

    #[test]
    fn drafts_are_new_and_carry_identity() {
        let ct = ContentType::new(1, "blog", "Blog").with_max_entries(10);
        assert!(ct.id.is_none());
        assert_eq!(ct.max_entries, Some(10));
        assert!(!ct.uid.is_empty());

        let field = Field::new("title", "Title", FieldType::Text).with_required(true);
        assert!(field.id.is_none());
        assert_eq!(field.column_name(), "field_title");
        assert!(field.required);
    }
}
