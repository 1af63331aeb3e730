//! WiFi station plus on-demand access point.
//!
//! The station joins the home network with credentials baked in at build
//! time (or remembered by the IDF in NVS). While provisioning, an open
//! access point is added next to the station so a phone can reach the
//! portal even when the home network is unreachable.
//!
//! # Example
//!
//! ```ignore
//! use smart_blinds::hal::esp32::{Esp32Wifi, StationCredentials};
//!
//! let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs), StationCredentials {
//!     ssid: env!("WIFI_SSID"),
//!     password: env!("WIFI_PASSWORD"),
//! })?;
//! let network = wifi.link();
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::NetworkLink;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};

/// Minimum time between station reconnect attempts.
const RECONNECT_INTERVAL_MS: u64 = 10_000;

/// Home network credentials.
#[derive(Debug, Clone, Copy)]
pub struct StationCredentials<'a> {
    /// Network name.
    pub ssid: &'a str,
    /// WPA passphrase (empty for open networks).
    pub password: &'a str,
}

struct WifiInner {
    wifi: EspWifi<'static>,
    station: ClientConfiguration,
    last_attempt_ms: u64,
}

impl WifiInner {
    fn now_ms() -> u64 {
        // Safe: plain read of the boot timer.
        (unsafe { esp_idf_hal::sys::esp_timer_get_time() } / 1000) as u64
    }

    fn is_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.is_up().unwrap_or(false)
    }

    fn reconnect_if_due(&mut self) {
        let now = Self::now_ms();
        if now.saturating_sub(self.last_attempt_ms) < RECONNECT_INTERVAL_MS {
            return;
        }
        self.last_attempt_ms = now;
        if let Err(e) = self.wifi.connect() {
            log::debug!("wifi: reconnect failed: {:?}", e);
        }
    }
}

/// Shared WiFi driver.
///
/// Cloning shares the driver; the network link and the provisioning
/// portal each hold a clone.
#[derive(Clone)]
pub struct Esp32Wifi {
    inner: Arc<Mutex<WifiInner>>,
    identity: String,
}

impl Esp32Wifi {
    /// Start the driver in station mode and begin connecting.
    ///
    /// Does not wait for the connection; [`NetworkLink::is_up`] reports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot be created or started.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        credentials: StationCredentials<'_>,
    ) -> anyhow::Result<Self> {
        let mut wifi = EspWifi::new(modem, sysloop, nvs)?;

        let station = ClientConfiguration {
            ssid: credentials
                .ssid
                .try_into()
                .map_err(|_| anyhow::anyhow!("SSID too long"))?,
            password: credentials
                .password
                .try_into()
                .map_err(|_| anyhow::anyhow!("WiFi password too long"))?,
            ..Default::default()
        };

        wifi.set_configuration(&Configuration::Client(station.clone()))?;
        wifi.start()?;
        log::info!("wifi: connecting to '{}'", credentials.ssid);
        if let Err(e) = wifi.connect() {
            log::warn!("wifi: initial connect failed: {:?}", e);
        }

        let mac = wifi.sta_netif().get_mac()?;
        let identity = mac.iter().map(|b| format!("{:02x}", b)).collect();

        Ok(Self {
            inner: Arc::new(Mutex::new(WifiInner {
                wifi,
                station,
                last_attempt_ms: WifiInner::now_ms(),
            })),
            identity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, WifiInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an open access point named `ap_name` next to the station.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the configuration.
    pub fn start_access_point(&self, ap_name: &str) -> anyhow::Result<()> {
        let mut inner = self.lock();
        let ap = AccessPointConfiguration {
            ssid: ap_name
                .try_into()
                .map_err(|_| anyhow::anyhow!("AP name too long"))?,
            auth_method: AuthMethod::None,
            ..Default::default()
        };
        let station = inner.station.clone();
        inner
            .wifi
            .set_configuration(&Configuration::Mixed(station, ap))?;
        if let Err(e) = inner.wifi.connect() {
            log::debug!("wifi: station connect after AP start failed: {:?}", e);
        }
        log::info!("wifi: access point '{}' up", ap_name);
        Ok(())
    }

    /// Drop the access point, keeping the station.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the configuration.
    pub fn stop_access_point(&self) -> anyhow::Result<()> {
        let mut inner = self.lock();
        let station = inner.station.clone();
        inner
            .wifi
            .set_configuration(&Configuration::Client(station))?;
        if let Err(e) = inner.wifi.connect() {
            log::debug!("wifi: station connect after AP stop failed: {:?}", e);
        }
        log::info!("wifi: access point down");
        Ok(())
    }

    /// Network link view for the controller.
    pub fn link(&self) -> Esp32Network {
        Esp32Network { wifi: self.clone() }
    }
}

/// [`NetworkLink`] over the station interface.
///
/// Polling it also retries the station connection every few seconds while
/// it is down.
#[derive(Clone)]
pub struct Esp32Network {
    wifi: Esp32Wifi,
}

impl NetworkLink for Esp32Network {
    fn is_up(&self) -> bool {
        let mut inner = self.wifi.lock();
        if inner.is_up() {
            return true;
        }
        inner.reconnect_if_due();
        false
    }

    fn identity(&self) -> &str {
        &self.wifi.identity
    }
}
