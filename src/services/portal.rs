//! Axum-based provisioning portal for desktop runs.
//!
//! Serves the routes of [`PortalSession`]:
//! - GET `/` - Settings form
//! - POST `/save` - Submit settings (JSON)
//! - GET `/api/settings` - Current settings without the password
//!
//! The server starts on the first [`Provisioner::open`] and keeps running;
//! while the portal is closed every route answers 503.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::PortalConfig;
use crate::provisioning::{PortalResponse, PortalSession};
use crate::settings::{DeviceSettings, ProvisioningParams};
use crate::traits::Provisioner;

/// Portal state shared between the controller and the HTTP handlers.
pub type SharedPortal = Arc<Mutex<PortalSession>>;

fn lock(portal: &SharedPortal) -> MutexGuard<'_, PortalSession> {
    // A handler panicking mid-request leaves the session itself consistent.
    portal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET / - Settings form
async fn index(State(portal): State<SharedPortal>) -> PortalResponse {
    lock(&portal).handle_index()
}

/// POST /save - Accept submitted settings
async fn save(State(portal): State<SharedPortal>, body: Bytes) -> PortalResponse {
    let body_str = std::str::from_utf8(&body).unwrap_or("");
    lock(&portal).handle_save(body_str)
}

/// GET /api/settings - Current settings
async fn settings(State(portal): State<SharedPortal>) -> PortalResponse {
    lock(&portal).handle_settings()
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, r#"{"error":"not found"}"#)
}

/// Build the portal router.
pub fn build_portal_router(portal: SharedPortal, config: &PortalConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/save", post(save))
        .route("/api/settings", get(settings))
        .fallback(not_found)
        .with_state(portal);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

// ============================================================================
// Provisioner
// ============================================================================

/// Errors starting the portal server.
#[derive(Debug)]
pub enum PortalError {
    /// Tokio runtime or server thread could not be created.
    Runtime(std::io::Error),
    /// Listener could not bind.
    Bind(std::io::Error),
    /// Server thread exited before reporting.
    Stopped,
}

impl std::fmt::Display for PortalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortalError::Runtime(e) => write!(f, "portal runtime error: {}", e),
            PortalError::Bind(e) => write!(f, "portal bind error: {}", e),
            PortalError::Stopped => write!(f, "portal server stopped"),
        }
    }
}

impl std::error::Error for PortalError {}

/// [`Provisioner`] serving the portal over HTTP.
pub struct WebPortal {
    session: SharedPortal,
    config: PortalConfig,
    addr: SocketAddr,
    running: bool,
}

impl WebPortal {
    /// Portal listening on all interfaces at `config.port`.
    pub fn new(config: PortalConfig) -> Self {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        Self::with_addr(config, addr)
    }

    /// Portal listening on `addr`.
    pub fn with_addr(config: PortalConfig, addr: SocketAddr) -> Self {
        Self {
            session: Arc::new(Mutex::new(PortalSession::new(config.ap_name.as_str()))),
            config,
            addr,
            running: false,
        }
    }

    /// Shared state, for building extra routers or inspecting the session.
    pub fn session(&self) -> SharedPortal {
        Arc::clone(&self.session)
    }

    /// Listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn start_server(&mut self) -> Result<(), PortalError> {
        let router = build_portal_router(self.session(), &self.config);
        let addr = self.addr;
        let (ready_tx, ready_rx) = mpsc::channel();

        thread::Builder::new()
            .name("portal-http".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(PortalError::Runtime(e)));
                        return;
                    }
                };

                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::bind(addr).await {
                        Ok(listener) => listener,
                        Err(e) => {
                            let _ = ready_tx.send(Err(PortalError::Bind(e)));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));
                    log::info!("portal: listening on http://{}", addr);

                    if let Err(e) = axum::serve(listener, router).await {
                        log::error!("portal: server error: {}", e);
                    }
                });
            })
            .map_err(PortalError::Runtime)?;

        ready_rx.recv().map_err(|_| PortalError::Stopped)?
    }
}

impl Provisioner for WebPortal {
    type Error = PortalError;

    fn open(&mut self, current: &DeviceSettings) -> Result<(), PortalError> {
        lock(&self.session).open(current);
        if !self.running {
            self.start_server()?;
            self.running = true;
        }
        log::info!(
            "portal: open as '{}' on {}",
            self.config.ap_name.as_str(),
            self.addr
        );
        Ok(())
    }

    fn close(&mut self) {
        lock(&self.session).close();
    }

    fn is_open(&self) -> bool {
        lock(&self.session).is_open()
    }

    fn poll(&mut self) -> Option<ProvisioningParams> {
        lock(&self.session).take_submission()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_is_shared() {
        let portal = WebPortal::new(PortalConfig::default());
        let session = portal.session();
        lock(&session).open(&DeviceSettings::default());
        assert!(portal.is_open());
    }

    #[test]
    fn poll_returns_submission_once() {
        let mut portal = WebPortal::new(PortalConfig::default());
        lock(&portal.session).open(&DeviceSettings::default());
        lock(&portal.session).handle_save(r#"{"deviceName":"Den","mqttServer":"10.0.0.2"}"#);

        assert_eq!(portal.poll().unwrap().device_name, "Den");
        assert!(portal.poll().is_none());
    }
}
