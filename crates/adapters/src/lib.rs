//! fleet-inspect adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite and in-memory inspection stores
//! - `upload`: Filesystem upload loader

mod store_memory;
mod store_sqlite;
mod upload_fs;

/// Re-exports for inspection store adapters
pub mod store {
    pub use crate::store_memory::InMemoryInspectionStore;
    pub use crate::store_sqlite::SqliteInspectionStore;
}

/// Re-exports for upload adapters
pub mod upload {
    pub use crate::upload_fs::{DEFAULT_MAX_FILE_BYTES, FsUploadSource};
}
