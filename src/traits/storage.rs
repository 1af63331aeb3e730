//! Persistent file storage abstraction.

extern crate alloc;
use alloc::vec::Vec;

/// Minimal flash filesystem used by the settings store.
///
/// Paths are absolute within the mounted filesystem (e.g. `/config.json`).
///
/// # Example
///
/// ```rust
/// use smart_blinds::traits::FileSystem;
/// use smart_blinds::hal::MockFileSystem;
///
/// let mut fs = MockFileSystem::new();
/// fs.mount(false).unwrap();
/// fs.write("/config.json", b"{}").unwrap();
/// assert!(fs.exists("/config.json"));
/// ```
pub trait FileSystem {
    /// Error type for filesystem operations.
    type Error: core::fmt::Debug;

    /// Mount the filesystem.
    ///
    /// With `format_if_failed` set, an unmountable partition is formatted
    /// and mounted again. Mounting an already mounted filesystem succeeds.
    fn mount(&mut self, format_if_failed: bool) -> Result<(), Self::Error>;

    /// Whether a file exists at `path`.
    fn exists(&mut self, path: &str) -> bool;

    /// Read the whole file at `path`.
    fn read(&mut self, path: &str) -> Result<Vec<u8>, Self::Error>;

    /// Create or truncate `path` and write `contents`.
    ///
    /// Returns the number of bytes actually written, which may be less
    /// than `contents.len()` when the partition is full.
    fn write(&mut self, path: &str, contents: &[u8]) -> Result<usize, Self::Error>;
}
