//! Key/value storage contract

use async_trait::async_trait;

use crate::Result;

/// Asynchronous string key/value storage.
///
/// `delete` on a key that is not present succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>>;

    async fn write(&self, key: &str, value: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}
