//! Directory-backed filesystem for desktop runs.
//!
//! Absolute paths such as `/config.json` are resolved inside a root
//! directory, so the desktop demo keeps its settings file in a folder of
//! its own instead of the host root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::traits::FileSystem;

/// [`FileSystem`] rooted at a host directory.
///
/// "Mounting" creates the root directory. Formatting removes and recreates
/// it, which mirrors what a flash format does to the stored files.
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::DirFileSystem;
/// use smart_blinds::traits::FileSystem;
///
/// let root = std::env::temp_dir().join("smart-blinds-doc");
/// let mut fs = DirFileSystem::new(&root);
/// fs.mount(true).unwrap();
/// fs.write("/config.json", b"{}").unwrap();
/// assert_eq!(fs.read("/config.json").unwrap(), b"{}");
/// # std::fs::remove_dir_all(&root).ok();
/// ```
#[derive(Debug, Clone)]
pub struct DirFileSystem {
    root: PathBuf,
    mounted: bool,
}

impl DirFileSystem {
    /// Filesystem rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mounted: false,
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn check_mounted(&self) -> io::Result<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "filesystem not mounted"))
        }
    }
}

impl FileSystem for DirFileSystem {
    type Error = io::Error;

    fn mount(&mut self, format_if_failed: bool) -> io::Result<()> {
        if self.mounted {
            return Ok(());
        }
        match fs::create_dir_all(&self.root) {
            Ok(()) if self.root.is_dir() => {}
            Ok(()) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "root is not a directory",
                ))
            }
            Err(e) if !format_if_failed => return Err(e),
            Err(_) => {
                log::warn!("fs: formatting {}", self.root.display());
                if self.root.is_file() {
                    fs::remove_file(&self.root)?;
                } else if self.root.exists() {
                    fs::remove_dir_all(&self.root)?;
                }
                fs::create_dir_all(&self.root)?;
            }
        }
        self.mounted = true;
        Ok(())
    }

    fn exists(&mut self, path: &str) -> bool {
        self.mounted && self.resolve(path).is_file()
    }

    fn read(&mut self, path: &str) -> io::Result<Vec<u8>> {
        self.check_mounted()?;
        fs::read(self.resolve(path))
    }

    fn write(&mut self, path: &str, contents: &[u8]) -> io::Result<usize> {
        self.check_mounted()?;
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, contents)?;
        Ok(contents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DeviceSettings, SettingsError, SettingsStore};

    fn temp_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "smart-blinds-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        root
    }

    #[test]
    fn requires_mount() {
        let root = temp_root("unmounted");
        let mut fs = DirFileSystem::new(&root);
        assert!(fs.read("/config.json").is_err());
        assert!(fs.write("/config.json", b"{}").is_err());
        assert!(!fs.exists("/config.json"));
    }

    #[test]
    fn paths_resolve_inside_root() {
        let root = temp_root("resolve");
        let mut fs = DirFileSystem::new(&root);
        fs.mount(false).unwrap();
        fs.write("/config.json", b"{}").unwrap();

        assert!(root.join("config.json").is_file());
        assert!(fs.exists("/config.json"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn settings_store_on_disk() {
        let root = temp_root("store");
        let mut store = SettingsStore::new(DirFileSystem::new(&root), "/config.json");
        assert_eq!(store.load(), Err(SettingsError::NotFound));

        let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "user", "pass");
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
        let _ = std::fs::remove_dir_all(&root);
    }
}
