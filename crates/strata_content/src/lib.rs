//! Content layer: user-defined content-types over dynamic SQLite tables.
//!
//! A [`ContentService`] wraps a [`StrataDb`] and coordinates two stores that
//! must never drift apart: the metadata catalog (content-types, fields, and
//! their selection) and the physical entry data tables (one per content-type,
//! reshaped with DDL as fields are added). Every mutation that touches both
//! runs in a single transaction.
//!
//! - [`model`] holds the domain types
//! - [`component`] is the savable-component surface shared by those types
//! - [`validate`] reports validation failures as values, not errors
//!
//! ```no_run
//! use strata_content::{ContentService, ContentType, Field, FieldType};
//!
//! # async fn demo() -> strata_content::Result<()> {
//! let service = ContentService::open("strata.db").await?;
//! let site = service.create_site("main", "Main site").await?;
//!
//! if let Some(blog) = service
//!     .create_content_type(&site, ContentType::new(site.id, "blog", "Blog"))
//!     .await?
//!     .saved()
//! {
//!     service
//!         .add_field(&site, &blog, Field::new("title", "Title", FieldType::Text))
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

mod entries;
mod mutation;
mod registry;
mod service;
mod sites;

pub mod component;
pub mod model;
pub mod validate;

pub use component::SavableComponent;
pub use model::{
    ContentType, Entry, EntryVersion, Field, FieldSelection, FieldType, SelectedField, Site,
};
pub use service::ContentService;
pub use validate::{SaveOutcome, ValidationIssue};

pub use strata_db::{DbError, Result, StrataDb};
