//! MQTT client for the ESP32.
//!
//! Wraps the esp-idf-svc client behind the [`MqttClient`] trait. The IDF
//! client reconnects on its own; a background thread drains its event
//! connection, tracks the connected flag and forwards received messages.
//!
//! # Example
//!
//! ```ignore
//! use smart_blinds::hal::esp32::Esp32Mqtt;
//! use smart_blinds::session::BrokerTarget;
//! use smart_blinds::traits::MqttClient;
//!
//! let target = BrokerTarget::new(&settings, network.identity(), &config.mqtt);
//! let mut mqtt = Esp32Mqtt::new(target);
//! mqtt.connect()?;
//! ```

use crate::session::BrokerTarget;
use crate::traits::{MqttClient, MqttMessage};
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Stack for the event thread.
const EVENT_THREAD_STACK: usize = 6 * 1024;

/// Error type for ESP32 MQTT operations.
#[derive(Debug)]
pub struct Esp32MqttError(pub String);

impl core::fmt::Display for Esp32MqttError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MQTT error: {}", self.0)
    }
}

impl std::error::Error for Esp32MqttError {}

/// [`MqttClient`] over `EspMqttClient`.
///
/// The IDF client is created on the first [`MqttClient::connect`], so
/// building one is infallible and cheap.
pub struct Esp32Mqtt {
    target: BrokerTarget,
    client: Option<EspMqttClient<'static>>,
    connected: Arc<AtomicBool>,
    message_rx: Receiver<MqttMessage>,
    message_tx: Sender<MqttMessage>,
}

impl Esp32Mqtt {
    /// Client for `target`; nothing is opened until `connect`.
    pub fn new(target: BrokerTarget) -> Self {
        let (message_tx, message_rx) = channel();
        Self {
            target,
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
            message_rx,
            message_tx,
        }
    }

    /// Broker this client talks to.
    pub fn target(&self) -> &BrokerTarget {
        &self.target
    }

    fn start(&mut self) -> Result<(), Esp32MqttError> {
        let url = self.target.url();
        let (username, password) = match &self.target.credentials {
            Some((user, pass)) => (Some(user.as_str()), Some(pass.as_str())),
            None => (None, None),
        };
        let conf = MqttClientConfiguration {
            client_id: Some(self.target.client_id.as_str()),
            username,
            password,
            keep_alive_interval: Some(Duration::from_secs(
                self.target.keep_alive_secs.max(5) as u64,
            )),
            reconnect_timeout: Some(Duration::from_millis(self.target.retry_delay_ms as u64)),
            ..Default::default()
        };

        let (client, connection) = EspMqttClient::new(&url, &conf)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;

        let connected = self.connected.clone();
        let message_tx = self.message_tx.clone();
        thread::Builder::new()
            .name("mqtt-events".into())
            .stack_size(EVENT_THREAD_STACK)
            .spawn(move || handle_mqtt_events(connection, connected, message_tx))
            .map_err(|e| Esp32MqttError(e.to_string()))?;

        log::info!("mqtt: client '{}' -> {}", self.target.client_id, url);
        self.client = Some(client);
        Ok(())
    }

    fn live_client(&mut self) -> Result<&mut EspMqttClient<'static>, Esp32MqttError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(Esp32MqttError("not connected".into()));
        }
        self.client
            .as_mut()
            .ok_or_else(|| Esp32MqttError("not connected".into()))
    }
}

impl MqttClient for Esp32Mqtt {
    type Error = Esp32MqttError;

    fn connect(&mut self) -> Result<(), Self::Error> {
        if self.client.is_none() {
            self.start()?;
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        self.live_client()?
            .publish(topic, QoS::AtMostOnce, retain, payload)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.live_client()?
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        match self.message_rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

// ============================================================================
// Event Thread
// ============================================================================

fn handle_mqtt_events(
    mut connection: EspMqttConnection,
    connected: Arc<AtomicBool>,
    message_tx: Sender<MqttMessage>,
) {
    loop {
        match connection.next() {
            Ok(event) => match event.payload() {
                EventPayload::Connected(_) => {
                    log::info!("mqtt: connected");
                    connected.store(true, Ordering::Release);
                }
                EventPayload::Disconnected => {
                    log::warn!("mqtt: disconnected");
                    connected.store(false, Ordering::Release);
                }
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    if message_tx
                        .send(MqttMessage::new(topic.to_string(), data.to_vec()))
                        .is_err()
                    {
                        break;
                    }
                }
                _ => {}
            },
            Err(e) => {
                // The connection ends when the client is dropped.
                log::debug!("mqtt: event loop ended: {:?}", e);
                connected.store(false, Ordering::Release);
                break;
            }
        }
    }
}
