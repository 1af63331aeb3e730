//! Desktop MQTT client built on `rumqttc`.
//!
//! The synchronous `rumqttc::Client` is paired with a background thread
//! that drives its `Connection`. Incoming publishes are forwarded over a
//! channel so [`MqttClient::try_recv`] never blocks, and the connection
//! state is mirrored in an atomic flag for [`MqttClient::is_connected`].
//!
//! `rumqttc` reconnects on its own once the connection thread is running,
//! so only the first [`MqttClient::connect`] call does any work. The
//! session state machine still sees every drop and resubscribes when the
//! flag comes back up.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rumqttc::{Client, ClientError, Connection, Event, MqttOptions, Packet, QoS};

use crate::session::BrokerTarget;
use crate::traits::{MqttClient, MqttMessage};

// ============================================================================
// Errors
// ============================================================================

/// Errors from [`RumqttClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttError {
    /// Request could not be queued (client closed or queue full).
    Client(String),
    /// The connection thread could not be started.
    Spawn(String),
    /// Operation needs a live broker connection.
    NotConnected,
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MqttError::Client(e) => write!(f, "MQTT client error: {}", e),
            MqttError::Spawn(e) => write!(f, "MQTT thread error: {}", e),
            MqttError::NotConnected => write!(f, "MQTT not connected"),
        }
    }
}

impl std::error::Error for MqttError {}

impl From<ClientError> for MqttError {
    fn from(e: ClientError) -> Self {
        MqttError::Client(e.to_string())
    }
}

// ============================================================================
// Client
// ============================================================================

fn mqtt_options(target: &BrokerTarget) -> MqttOptions {
    let mut options = MqttOptions::new(&target.client_id, &target.host, target.port);
    options.set_keep_alive(Duration::from_secs(target.keep_alive_secs.max(5) as u64));
    if let Some((user, pass)) = &target.credentials {
        options.set_credentials(user, pass);
    }
    options
}

/// [`MqttClient`] backed by `rumqttc`.
pub struct RumqttClient {
    target: BrokerTarget,
    client: Client,
    connection: Option<Connection>,
    connected: Arc<AtomicBool>,
    incoming_tx: Sender<MqttMessage>,
    incoming: Receiver<MqttMessage>,
}

impl RumqttClient {
    /// Create a client for `target`. Nothing touches the network until
    /// [`MqttClient::connect`].
    pub fn new(target: BrokerTarget) -> Self {
        let (client, connection) = Client::new(mqtt_options(&target), 16);
        let (incoming_tx, incoming) = mpsc::channel();
        Self {
            target,
            client,
            connection: Some(connection),
            connected: Arc::new(AtomicBool::new(false)),
            incoming_tx,
            incoming,
        }
    }

    /// The broker this client talks to.
    pub fn target(&self) -> &BrokerTarget {
        &self.target
    }

    fn spawn_connection(&mut self, mut connection: Connection) -> Result<(), MqttError> {
        let connected = Arc::clone(&self.connected);
        let tx = self.incoming_tx.clone();
        let retry = Duration::from_millis(self.target.retry_delay_ms as u64);
        let host = format!("{}:{}", self.target.host, self.target.port);

        thread::Builder::new()
            .name("mqtt-connection".into())
            .spawn(move || {
                for event in connection.iter() {
                    match event {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            log::info!("mqtt: connected to {}", host);
                            connected.store(true, Ordering::SeqCst);
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            let msg = MqttMessage::new(publish.topic, publish.payload.to_vec());
                            if tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Ok(Event::Incoming(Packet::Disconnect)) => {
                            connected.store(false, Ordering::SeqCst);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            if connected.swap(false, Ordering::SeqCst) {
                                log::warn!("mqtt: connection lost: {}", e);
                            } else {
                                log::debug!("mqtt: connect to {} failed: {}", host, e);
                            }
                            thread::sleep(retry);
                        }
                    }
                }
                connected.store(false, Ordering::SeqCst);
                log::info!("mqtt: connection thread stopped");
            })
            .map_err(|e| MqttError::Spawn(e.to_string()))?;
        Ok(())
    }
}

impl Drop for RumqttClient {
    fn drop(&mut self) {
        let _ = self.client.disconnect();
    }
}

impl MqttClient for RumqttClient {
    type Error = MqttError;

    fn connect(&mut self) -> Result<(), MqttError> {
        if let Some(connection) = self.connection.take() {
            log::info!(
                "mqtt: connecting to {}:{} as {}",
                self.target.host,
                self.target.port,
                self.target.client_id
            );
            self.spawn_connection(connection)?;
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected);
        }
        self.client
            .try_publish(topic, QoS::AtMostOnce, retain, payload.to_vec())?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected);
        }
        self.client.try_subscribe(topic, QoS::AtMostOnce)?;
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        self.incoming.try_recv().ok()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MqttConfig;
    use crate::settings::DeviceSettings;

    #[test]
    fn operations_need_connection() {
        let settings = DeviceSettings::new("Kitchen", "127.0.0.1", "", "");
        let mut client =
            RumqttClient::new(BrokerTarget::new(&settings, "test", &MqttConfig::default()));

        assert!(!client.is_connected());
        assert_eq!(
            client.publish("blinds/Kitchen/state", b"ON", true),
            Err(MqttError::NotConnected)
        );
        assert_eq!(
            client.subscribe("blinds/Kitchen/move"),
            Err(MqttError::NotConnected)
        );
        assert!(client.try_recv().is_none());
        assert_eq!(client.target().client_id, "Kitchen-test");
    }

    #[test]
    fn error_display() {
        assert_eq!(MqttError::NotConnected.to_string(), "MQTT not connected");
    }
}
