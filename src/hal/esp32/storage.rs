//! SPIFFS flash filesystem.
//!
//! The partition is registered with the ESP-IDF VFS under `/spiffs`, after
//! which plain `std::fs` calls reach it. Settings paths such as
//! `/config.json` are resolved under that mount point.

use std::fs;
use std::os::raw::c_char;

use anyhow::{anyhow, Context};
use esp_idf_sys::{
    esp, esp_err_t, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, ESP_ERR_INVALID_STATE,
};

use crate::traits::FileSystem;

/// VFS mount point (NUL terminated for the C API).
const BASE_PATH: &[u8] = b"/spiffs\0";

/// SPIFFS-backed [`FileSystem`].
///
/// # Example
///
/// ```ignore
/// use smart_blinds::hal::esp32::Esp32Spiffs;
/// use smart_blinds::settings::SettingsStore;
///
/// let mut store = SettingsStore::new(Esp32Spiffs::new(), "/config.json");
/// let settings = store.load()?;
/// ```
pub struct Esp32Spiffs {
    mounted: bool,
}

impl Esp32Spiffs {
    /// Unmounted filesystem on the default SPIFFS partition.
    pub fn new() -> Self {
        Self { mounted: false }
    }

    fn resolve(path: &str) -> String {
        format!("/spiffs/{}", path.trim_start_matches('/'))
    }

    fn check_mounted(&self) -> anyhow::Result<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(anyhow!("SPIFFS not mounted"))
        }
    }
}

impl Default for Esp32Spiffs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for Esp32Spiffs {
    type Error = anyhow::Error;

    fn mount(&mut self, format_if_failed: bool) -> anyhow::Result<()> {
        if self.mounted {
            return Ok(());
        }

        let conf = esp_vfs_spiffs_conf_t {
            base_path: BASE_PATH.as_ptr() as *const c_char,
            partition_label: core::ptr::null(),
            max_files: 4,
            format_if_mount_failed: format_if_failed,
        };

        // Safe: conf and the base path outlive the call; IDF copies the path.
        let result = unsafe { esp_vfs_spiffs_register(&conf) };
        // Already registered counts as mounted.
        if result != ESP_ERR_INVALID_STATE as esp_err_t {
            esp!(result).context("SPIFFS mount failed")?;
        }

        log::info!("spiffs: mounted (format allowed: {})", format_if_failed);
        self.mounted = true;
        Ok(())
    }

    fn exists(&mut self, path: &str) -> bool {
        self.mounted && fs::metadata(Self::resolve(path)).is_ok()
    }

    fn read(&mut self, path: &str) -> anyhow::Result<Vec<u8>> {
        self.check_mounted()?;
        fs::read(Self::resolve(path)).with_context(|| format!("reading {}", path))
    }

    fn write(&mut self, path: &str, contents: &[u8]) -> anyhow::Result<usize> {
        use std::io::Write;

        self.check_mounted()?;
        let mut file =
            fs::File::create(Self::resolve(path)).with_context(|| format!("creating {}", path))?;

        // Count what actually lands; a full partition yields a short write.
        let mut written = 0;
        while written < contents.len() {
            match file.write(&contents[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if written > 0 => {
                    log::warn!("spiffs: write to {} stopped early: {}", path, e);
                    break;
                }
                Err(e) => return Err(e).with_context(|| format!("writing {}", path)),
            }
        }
        Ok(written)
    }
}
