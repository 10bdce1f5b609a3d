//! Fallback blob store
//!
//! A single durable slot holding the whole task collection as one serialized
//! value. It is read once on initialization and rewritten in full after every
//! mutation.

mod file;
mod memory;

use async_trait::async_trait;

use crate::Result;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;

/// Durable key-value slot
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the slot, `None` if it has never been written
    async fn read(&self) -> Result<Option<String>>;

    /// Replace the slot contents
    async fn write(&self, contents: &str) -> Result<()>;
}
