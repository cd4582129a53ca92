//! The content service: explicit context for every content operation.
//!
//! `ContentService` carries the store handle; each operation additionally
//! takes the site (or content-type) it acts on. There is no ambient global
//! state anywhere in this crate.

use std::path::Path;
use strata_db::{Result, StrataDb};

/// Coordinates registry reads and transactional schema + metadata mutations.
///
/// Cheap to clone; all clones share the underlying pool.
#[derive(Clone)]
pub struct ContentService {
    pub(crate) db: StrataDb,
}

impl ContentService {
    /// Wrap an already-open database.
    pub fn new(db: StrataDb) -> Self {
        Self { db }
    }

    /// Open or create the database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(StrataDb::open(path).await?))
    }

    /// Service over a private in-memory database (for testing).
    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(StrataDb::in_memory().await?))
    }

    /// The underlying database handle.
    pub fn db(&self) -> &StrataDb {
        &self.db
    }
}
