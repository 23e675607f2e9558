#[cfg(feature = "sqlite")]
use std::path::PathBuf;
use std::sync::Arc;

use bp_core::{BlogStorage, Result};
use chrono::FixedOffset;

pub mod backends;

pub use backends::*;

pub const DEFAULT_DB_PATH: &str = "blog_automation.db";

#[derive(Debug, Clone)]
pub enum StorageKind {
    #[cfg(feature = "sqlite")]
    Sqlite(PathBuf),
    Memory,
}

impl StorageKind {
    #[cfg(feature = "sqlite")]
    pub fn from_path(path: Option<PathBuf>) -> Self {
        StorageKind::Sqlite(path.unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)))
    }
}

/// Open a storage backend. `offset` decides which calendar day a post belongs to.
pub async fn create_storage(kind: StorageKind, offset: FixedOffset) -> Result<Arc<dyn BlogStorage>> {
    match kind {
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite(path) => Ok(Arc::new(
            SqliteStorage::new_with_path(&path).await?.with_offset(offset),
        )),
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::new().with_offset(offset))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
}
