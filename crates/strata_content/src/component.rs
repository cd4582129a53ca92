//! Savable component surface.
//!
//! Components declare exactly which of their attributes are settings through
//! a static descriptor, and produce those settings explicitly. Nothing is
//! discovered at runtime by inspecting the type.

use crate::model::{ContentType, Field};
use serde_json::{json, Value};

/// A component that can be persisted by the content service.
pub trait SavableComponent {
    /// Names of the attributes that constitute this component's settings.
    /// `settings()` returns an object with exactly these keys.
    const SETTINGS_FIELDS: &'static [&'static str];

    /// Persisted id, if the component has been saved.
    fn id(&self) -> Option<i64>;

    /// A component is new until its first successful save assigns an id.
    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Whether the component may appear in selection lists.
    fn is_selectable(&self) -> bool {
        false
    }

    /// Settings as a JSON object keyed by [`Self::SETTINGS_FIELDS`].
    fn settings(&self) -> Value;
}

impl SavableComponent for ContentType {
    const SETTINGS_FIELDS: &'static [&'static str] = &["url_format", "max_entries", "sortable"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn settings(&self) -> Value {
        json!({
            "url_format": self.url_format,
            "max_entries": self.max_entries,
            "sortable": self.sortable,
        })
    }
}

impl SavableComponent for Field {
    const SETTINGS_FIELDS: &'static [&'static str] =
        &["field_type", "instructions", "required", "sort_order"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn is_selectable(&self) -> bool {
        true
    }

    fn settings(&self) -> Value {
        json!({
            "field_type": self.field_type.as_str(),
            "instructions": self.instructions,
            "required": self.required,
            "sort_order": self.sort_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;

    fn assert_settings_match_descriptor<C: SavableComponent>(component: &C) {
        let settings = component.settings();
        let object = settings.as_object().expect("settings must be an object");

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut declared: Vec<&str> = C::SETTINGS_FIELDS.to_vec();
        declared.sort_unstable();

        assert_eq!(keys, declared);
    }

    #[test]
    fn content_type_settings_follow_the_descriptor() {
        let ct = ContentType::new(1, "blog", "Blog")
            .with_url_format("blog/{slug}")
            .with_max_entries(50);
        assert_settings_match_descriptor(&ct);
        assert!(ct.is_new());
        assert!(!ct.is_selectable());
    }

    #[test]
    fn field_settings_follow_the_descriptor() {
        let field = Field::new("title", "Title", FieldType::Text).with_required(true);
        assert_settings_match_descriptor(&field);
        assert!(field.is_new());
        assert!(field.is_selectable());
        assert_eq!(field.settings()["field_type"], "text");
    }
}
