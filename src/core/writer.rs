//! Writer trait for log output destinations

use super::error::Result;

/// A destination for encoded records.
///
/// Implementations guard their own resource, so `write` and `sync` take
/// `&self` and may be called from any thread.
pub trait WriteSyncer: Send + Sync {
    /// Write one encoded record in full, returning the number of bytes written
    fn write(&self, bytes: &[u8]) -> Result<usize>;

    /// Flush anything buffered to durable storage
    fn sync(&self) -> Result<()>;

    fn name(&self) -> &str;
}
