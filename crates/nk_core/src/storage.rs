use async_trait::async_trait;
use crate::Result;

/// Durable string records addressed by name.
///
/// Each article collection lives in a single record, so every mutation is
/// a full read-modify-write of one value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a record, `None` when it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace a record.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a record; deleting a missing record is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Human readable backend name for logs.
    fn name(&self) -> &str;
}
