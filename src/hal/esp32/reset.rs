//! Double-reset detection backed by NVS.
//!
//! A flag is set in NVS at boot and cleared once the device has been up
//! for the detection window. Finding the flag already set at boot means
//! the previous run was reset inside the window.

use crate::traits::ResetDetector;
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

const NAMESPACE: &str = "blinds";
const FLAG_KEY: &str = "drd";

/// Detection window in milliseconds.
pub const DOUBLE_RESET_WINDOW_MS: u64 = 10_000;

/// [`ResetDetector`] storing its flag in NVS.
pub struct Esp32ResetDetector {
    nvs: EspNvs<NvsDefault>,
    pending: bool,
    armed: bool,
    window_ms: u64,
}

impl Esp32ResetDetector {
    /// Check and arm the flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the NVS namespace cannot be opened or written.
    pub fn new(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let mut nvs = EspNvs::new(partition, NAMESPACE, true)?;
        let pending = matches!(nvs.get_u8(FLAG_KEY), Ok(Some(1)));
        nvs.set_u8(FLAG_KEY, 1)?;

        if pending {
            log::info!("reset: double reset detected");
        }

        Ok(Self {
            nvs,
            pending,
            armed: true,
            window_ms: DOUBLE_RESET_WINDOW_MS,
        })
    }
}

impl ResetDetector for Esp32ResetDetector {
    fn detected(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }

    fn tick(&mut self, now_ms: u64) {
        if self.armed && now_ms >= self.window_ms {
            if let Err(e) = self.nvs.set_u8(FLAG_KEY, 0) {
                log::warn!("reset: failed to clear flag: {:?}", e);
                return;
            }
            self.armed = false;
        }
    }
}
