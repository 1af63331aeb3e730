//! Provisioning portal logic shared by the desktop and ESP32 servers.
//!
//! [`PortalSession`] holds the portal state and answers the three portal
//! routes. Platform servers (axum on desktop, esp-idf-svc on the device)
//! only lock it, call a handler and copy the [`PortalResponse`] out.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /` | [`PortalSession::handle_index`] |
//! | `POST /save` | [`PortalSession::handle_save`] |
//! | `GET /api/settings` | [`PortalSession::handle_settings`] |
//!
//! The page posts the form as JSON using the settings file keys
//! (`deviceName`, `mqttServer`, `mqttUsername`, `mqttPassword`).

extern crate alloc;
use alloc::format;
use alloc::string::String;

use serde::Serialize;

use crate::config::{short_string, ShortString};
use crate::settings::{DeviceSettings, ProvisioningParams};

// ============================================================================
// Responses
// ============================================================================

/// HTTP response produced by a portal handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    /// Status code.
    pub status: u16,
    /// `Content-Type` header value.
    pub content_type: &'static str,
    /// Response body.
    pub body: String,
}

impl PortalResponse {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into(),
        }
    }

    fn closed() -> Self {
        Self::json(503, r#"{"error":"portal closed"}"#)
    }

    /// Whether the status is 2xx.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Axum integration: allow PortalResponse to be returned directly from handlers
#[cfg(feature = "portal")]
impl axum::response::IntoResponse for PortalResponse {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionError {
    /// Body is not a JSON settings object.
    Malformed,
    /// Device name is blank.
    MissingDeviceName,
    /// Device name contains `/`, `+` or `#`, which would break topics.
    InvalidDeviceName,
    /// Broker address is blank.
    MissingBroker,
}

impl SubmissionError {
    /// Message shown to the user.
    pub const fn message(&self) -> &'static str {
        match self {
            SubmissionError::Malformed => "invalid settings",
            SubmissionError::MissingDeviceName => "device name is required",
            SubmissionError::InvalidDeviceName => "device name may not contain / + or #",
            SubmissionError::MissingBroker => "MQTT server is required",
        }
    }
}

/// Parse and check a submitted settings form.
///
/// # Example
///
/// ```rust
/// use smart_blinds::provisioning::{parse_submission, SubmissionError};
///
/// let ok = parse_submission(r#"{"deviceName":"Kitchen","mqttServer":"10.0.0.2"}"#).unwrap();
/// assert_eq!(ok.device_name, "Kitchen");
/// assert_eq!(ok.broker_username, "");
///
/// assert_eq!(
///     parse_submission(r#"{"deviceName":"a/b","mqttServer":"10.0.0.2"}"#),
///     Err(SubmissionError::InvalidDeviceName)
/// );
/// ```
pub fn parse_submission(body: &str) -> Result<ProvisioningParams, SubmissionError> {
    let mut params: ProvisioningParams =
        serde_json::from_str(body).map_err(|_| SubmissionError::Malformed)?;

    params.device_name = params.device_name.trim().into();
    params.broker_address = params.broker_address.trim().into();

    if params.device_name.is_empty() {
        return Err(SubmissionError::MissingDeviceName);
    }
    if params.device_name.contains(['/', '+', '#']) {
        return Err(SubmissionError::InvalidDeviceName);
    }
    if params.broker_address.is_empty() {
        return Err(SubmissionError::MissingBroker);
    }
    Ok(params)
}

/// Settings as exposed by `GET /api/settings` (password withheld).
#[derive(Debug, Serialize)]
struct SettingsView<'a> {
    #[serde(rename = "deviceName")]
    device_name: &'a str,
    #[serde(rename = "mqttServer")]
    broker_address: &'a str,
    #[serde(rename = "mqttUsername")]
    broker_username: &'a str,
    #[serde(rename = "hasPassword")]
    has_password: bool,
}

// ============================================================================
// Session
// ============================================================================

/// State of the provisioning portal.
///
/// # Example
///
/// ```rust
/// use smart_blinds::provisioning::PortalSession;
/// use smart_blinds::settings::DeviceSettings;
///
/// let mut portal = PortalSession::new("SmartBlinds-Setup");
/// portal.open(&DeviceSettings::default());
///
/// let response = portal.handle_save(r#"{"deviceName":"Kitchen","mqttServer":"10.0.0.2"}"#);
/// assert!(response.is_ok());
/// assert_eq!(portal.take_submission().unwrap().device_name, "Kitchen");
/// assert!(portal.take_submission().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PortalSession {
    ap_name: ShortString,
    open: bool,
    current: ProvisioningParams,
    submitted: Option<ProvisioningParams>,
}

impl PortalSession {
    /// Closed portal advertising `ap_name`.
    pub fn new(ap_name: &str) -> Self {
        Self {
            ap_name: short_string(ap_name),
            open: false,
            current: ProvisioningParams::default(),
            submitted: None,
        }
    }

    /// Open, pre-filling the form from `current`.
    pub fn open(&mut self, current: &DeviceSettings) {
        self.current = ProvisioningParams::from(current);
        self.submitted = None;
        self.open = true;
    }

    /// Close; later requests get 503.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Whether the portal accepts requests.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Take the accepted submission, once.
    pub fn take_submission(&mut self) -> Option<ProvisioningParams> {
        if self.open {
            self.submitted.take()
        } else {
            None
        }
    }

    /// GET / - the settings form.
    pub fn handle_index(&self) -> PortalResponse {
        if !self.open {
            return PortalResponse::closed();
        }
        PortalResponse::html(render_form(self.ap_name.as_str(), &self.current))
    }

    /// POST /save - accept a JSON settings form.
    pub fn handle_save(&mut self, body: &str) -> PortalResponse {
        if !self.open {
            return PortalResponse::closed();
        }
        match parse_submission(body) {
            Ok(mut params) => {
                // The form never carries the stored password; blank keeps it.
                if params.broker_password.is_empty() {
                    params.broker_password = self.current.broker_password.clone();
                }
                log::info!("portal: settings submitted for '{}'", params.device_name);
                self.current = params.clone();
                self.submitted = Some(params);
                PortalResponse::json(200, r#"{"ok":true}"#)
            }
            Err(e) => {
                log::warn!("portal: rejected submission: {}", e.message());
                PortalResponse::json(400, format!(r#"{{"error":"{}"}}"#, e.message()))
            }
        }
    }

    /// GET /api/settings - current values, without the password.
    pub fn handle_settings(&self) -> PortalResponse {
        if !self.open {
            return PortalResponse::closed();
        }
        let view = SettingsView {
            device_name: &self.current.device_name,
            broker_address: &self.current.broker_address,
            broker_username: &self.current.broker_username,
            has_password: !self.current.broker_password.is_empty(),
        };
        match serde_json::to_string(&view) {
            Ok(json) => PortalResponse::json(200, json),
            Err(_) => PortalResponse::json(500, r#"{"error":"serialization failed"}"#),
        }
    }
}

// ============================================================================
// HTML
// ============================================================================

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the settings page, pre-filled with `current`.
pub fn render_form(ap_name: &str, current: &ProvisioningParams) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 24em; margin: 2em auto; }}
label {{ display: block; margin-top: 1em; }}
input {{ width: 100%; padding: 0.4em; }}
button {{ margin-top: 1.5em; padding: 0.6em 1.2em; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form id="settings">
<label>Device name <input name="deviceName" maxlength="15" required value="{name}"></label>
<label>MQTT server <input name="mqttServer" maxlength="15" required value="{server}"></label>
<label>MQTT username <input name="mqttUsername" maxlength="23" value="{user}"></label>
<label>MQTT password <input name="mqttPassword" type="password" maxlength="32" placeholder="{pass_hint}"></label>
<button type="submit">Save</button>
</form>
<p id="status"></p>
<script>
document.getElementById('settings').addEventListener('submit', async (e) => {{
  e.preventDefault();
  const body = JSON.stringify(Object.fromEntries(new FormData(e.target)));
  const res = await fetch('/save', {{ method: 'POST', headers: {{ 'Content-Type': 'application/json' }}, body }});
  const json = await res.json();
  document.getElementById('status').textContent = res.ok ? 'Saved. The blind is connecting.' : json.error;
}});
</script>
</body>
</html>
"#,
        title = escape_html(ap_name),
        name = escape_html(&current.device_name),
        server = escape_html(&current.broker_address),
        user = escape_html(&current.broker_username),
        pass_hint = if current.broker_password.is_empty() { "" } else { "unchanged" },
    )
}
