//! Setup portal on the ESP32 HTTP server.
//!
//! Route handling lives in [`PortalSession`]; this module only moves bytes
//! between `EspHttpServer` and the session, and raises the setup access
//! point while the portal is open.
//!
//! # Endpoints
//!
//! - `GET /` - settings form
//! - `POST /save` - JSON settings submission
//! - `GET /api/settings` - current settings without the password

use crate::config::PortalConfig;
use crate::provisioning::{PortalResponse, PortalSession};
use crate::settings::{DeviceSettings, ProvisioningParams};
use crate::traits::Provisioner;
use esp_idf_hal::io::{Read, Write};
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use std::sync::{Arc, Mutex, MutexGuard};

use super::Esp32Wifi;

/// Largest accepted `POST /save` body.
const MAX_BODY: usize = 512;

type SharedSession = Arc<Mutex<PortalSession>>;

fn lock(session: &SharedSession) -> MutexGuard<'_, PortalSession> {
    session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn respond(
    req: Request<&mut EspHttpConnection<'_>>,
    response: PortalResponse,
) -> Result<(), EspIOError> {
    let mut resp = req.into_response(
        response.status,
        None,
        &[("Content-Type", response.content_type)],
    )?;
    resp.write_all(response.body.as_bytes())?;
    Ok(())
}

/// [`Provisioner`] serving the portal from `EspHttpServer`.
///
/// The server is started on the first `open` and kept for the life of the
/// device; a closed session answers 503.
pub struct Esp32Portal {
    wifi: Esp32Wifi,
    config: PortalConfig,
    session: SharedSession,
    server: Option<EspHttpServer<'static>>,
}

impl Esp32Portal {
    /// Portal that raises its access point through `wifi`.
    pub fn new(wifi: Esp32Wifi, config: PortalConfig) -> Self {
        let session = Arc::new(Mutex::new(PortalSession::new(config.ap_name.as_str())));
        Self {
            wifi,
            config,
            session,
            server: None,
        }
    }

    fn start_server(&mut self) -> anyhow::Result<()> {
        let mut server = EspHttpServer::new(&Configuration {
            http_port: self.config.port,
            ..Default::default()
        })?;

        let index_session = self.session.clone();
        server.fn_handler("/", Method::Get, move |req| {
            let response = lock(&index_session).handle_index();
            respond(req, response)
        })?;

        let save_session = self.session.clone();
        server.fn_handler("/save", Method::Post, move |mut req| {
            let mut buf = [0u8; MAX_BODY];
            let mut len = 0;
            while len < buf.len() {
                let n = req.read(&mut buf[len..])?;
                if n == 0 {
                    break;
                }
                len += n;
            }
            let response = match core::str::from_utf8(&buf[..len]) {
                Ok(body) => lock(&save_session).handle_save(body),
                // Not UTF-8; let the parser produce the malformed response.
                Err(_) => lock(&save_session).handle_save(""),
            };
            respond(req, response)
        })?;

        let settings_session = self.session.clone();
        server.fn_handler("/api/settings", Method::Get, move |req| {
            let response = lock(&settings_session).handle_settings();
            respond(req, response)
        })?;

        log::info!("portal: http server on port {}", self.config.port);
        self.server = Some(server);
        Ok(())
    }
}

impl Provisioner for Esp32Portal {
    type Error = anyhow::Error;

    fn open(&mut self, current: &DeviceSettings) -> Result<(), Self::Error> {
        self.wifi.start_access_point(self.config.ap_name.as_str())?;
        if self.server.is_none() {
            self.start_server()?;
        }
        lock(&self.session).open(current);
        Ok(())
    }

    fn close(&mut self) {
        lock(&self.session).close();
        if let Err(e) = self.wifi.stop_access_point() {
            log::warn!("portal: failed to stop access point: {:?}", e);
        }
    }

    fn is_open(&self) -> bool {
        lock(&self.session).is_open()
    }

    fn poll(&mut self) -> Option<ProvisioningParams> {
        lock(&self.session).take_submission()
    }
}
