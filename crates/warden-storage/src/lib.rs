//! Warden Storage Layer
//!
//! The storage collaborator behind the session store: an async key/value
//! contract with SQLite, file and in-memory backends.
//! Backends are eventually consistent and non-transactional across keys.

mod database;
mod error;
mod file;
mod memory;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::KeyValueStore;

pub type Result<T> = std::result::Result<T, StorageError>;
