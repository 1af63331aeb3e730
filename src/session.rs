//! Network and broker connection tracking.
//!
//! [`Session`] is a timer-driven state machine polled from the main loop.
//! It never blocks: a failed broker attempt schedules the next one
//! `retry_delay_ms` later and returns, so serial commands and the setup
//! button keep working through an outage. There is no attempt limit.
//!
//! ```text
//!                 network up, retry due
//!  Disconnected ------------------------> Connecting
//!       ^  ^                                 |   |
//!       |  |  attempt failed / timed out     |   | broker connected
//!       |  +---------------------------------+   v
//!       +--------------------------------- Connected
//!                 broker or network lost
//! ```
//!
//! The network layer follows the same states. Network links rejoin on their
//! own, so once the first poll has seen the link down it stays `Connecting`
//! until it comes back; `Disconnected` only describes a session that has
//! not been polled yet.
//!
//! Entering `Connected` yields [`SessionAction::Establish`] exactly once.
//! The controller answers it by resubscribing and only then announcing
//! discovery; if the subscribe fails it calls [`Session::attempt_failed`]
//! and nothing is announced for that cycle.

extern crate alloc;
use alloc::string::{String, ToString};

use log::{info, warn};

use crate::config::MqttConfig;
use crate::settings::DeviceSettings;
use crate::topics::client_id;

/// Connection state of one layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and no attempt in progress.
    #[default]
    Disconnected,
    /// Attempt in progress.
    Connecting,
    /// Link usable.
    Connected,
}

/// What the caller should do after a [`Session::poll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Start a broker connection attempt.
    Connect,
    /// Broker link just came up: resubscribe, then announce.
    Establish,
    /// Broker link went down.
    Lost,
}

/// Tracks network and broker connectivity and schedules reconnects.
#[derive(Clone, Debug)]
pub struct Session {
    network: LinkState,
    broker: LinkState,
    retry_delay_ms: u64,
    next_attempt_ms: u64,
    attempt_started_ms: u64,
    attempts: u32,
    connections: u32,
}

impl Session {
    /// New session; the first broker attempt is due immediately.
    pub fn new(retry_delay_ms: u32) -> Self {
        Self {
            network: LinkState::Disconnected,
            broker: LinkState::Disconnected,
            retry_delay_ms: retry_delay_ms as u64,
            next_attempt_ms: 0,
            attempt_started_ms: 0,
            attempts: 0,
            connections: 0,
        }
    }

    /// Network layer state.
    pub fn network(&self) -> LinkState {
        self.network
    }

    /// Broker layer state.
    pub fn broker(&self) -> LinkState {
        self.broker
    }

    /// Whether broker traffic can flow.
    pub fn is_online(&self) -> bool {
        self.broker == LinkState::Connected
    }

    /// Broker connection attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Times the broker link has been established.
    pub fn connections(&self) -> u32 {
        self.connections
    }

    /// Advance the state machine.
    ///
    /// `network_up` and `broker_connected` are the current readings from the
    /// network link and MQTT client.
    pub fn poll(
        &mut self,
        now_ms: u64,
        network_up: bool,
        broker_connected: bool,
    ) -> Option<SessionAction> {
        if !network_up {
            match self.network {
                LinkState::Connected => warn!("session: network lost"),
                LinkState::Disconnected => info!("session: waiting for network"),
                LinkState::Connecting => {}
            }
            self.network = LinkState::Connecting;
            return self.drop_broker(now_ms);
        }

        if self.network != LinkState::Connected {
            info!("session: network up");
            self.network = LinkState::Connected;
        }

        match self.broker {
            LinkState::Connected if !broker_connected => {
                warn!("session: broker connection lost");
                self.drop_broker(now_ms)
            }
            LinkState::Connected => None,
            LinkState::Connecting if broker_connected => {
                self.broker = LinkState::Connected;
                self.connections += 1;
                info!("session: broker connected (attempt {})", self.attempts);
                Some(SessionAction::Establish)
            }
            LinkState::Connecting => {
                if now_ms.saturating_sub(self.attempt_started_ms) >= self.retry_delay_ms {
                    self.attempt_failed(now_ms);
                }
                None
            }
            LinkState::Disconnected if now_ms >= self.next_attempt_ms => {
                self.broker = LinkState::Connecting;
                self.attempt_started_ms = now_ms;
                self.attempts += 1;
                info!("session: connecting to broker (attempt {})", self.attempts);
                Some(SessionAction::Connect)
            }
            LinkState::Disconnected => None,
        }
    }

    /// Record a failed attempt (connect refused, subscribe failed, timeout).
    ///
    /// The next attempt becomes due `retry_delay_ms` from `now_ms`.
    pub fn attempt_failed(&mut self, now_ms: u64) {
        self.broker = LinkState::Disconnected;
        self.next_attempt_ms = now_ms + self.retry_delay_ms;
        warn!(
            "session: broker attempt failed, retrying in {} ms",
            self.retry_delay_ms
        );
    }

    /// Forget the broker link so the next poll reconnects right away.
    ///
    /// Used after new settings are provisioned.
    pub fn reset(&mut self) {
        self.broker = LinkState::Disconnected;
        self.next_attempt_ms = 0;
    }

    fn drop_broker(&mut self, now_ms: u64) -> Option<SessionAction> {
        let was_connected = self.broker == LinkState::Connected;
        self.broker = LinkState::Disconnected;
        if was_connected {
            // First reconnect is immediate; later ones follow the retry delay.
            self.next_attempt_ms = now_ms;
            Some(SessionAction::Lost)
        } else {
            None
        }
    }
}

/// Broker endpoint and identity for one set of settings.
///
/// Built fresh from the live settings whenever a client is created, so a
/// provisioned broker change only needs a new client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerTarget {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Client id, `<device name>-<identity>`.
    pub client_id: String,
    /// Username and password, when a username is configured.
    pub credentials: Option<(String, String)>,
    /// Keep-alive interval.
    pub keep_alive_secs: u16,
    /// Pause between failed connection attempts.
    pub retry_delay_ms: u32,
}

impl BrokerTarget {
    /// Resolve the target for `settings` on a device identified by `identity`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use smart_blinds::config::MqttConfig;
    /// use smart_blinds::session::BrokerTarget;
    /// use smart_blinds::settings::DeviceSettings;
    ///
    /// let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");
    /// let target = BrokerTarget::new(&settings, "a1b2c3", &MqttConfig::default());
    /// assert_eq!(target.client_id, "Kitchen-a1b2c3");
    /// assert_eq!(target.url(), "mqtt://10.0.0.2:1883");
    /// ```
    pub fn new(settings: &DeviceSettings, identity: &str, config: &MqttConfig) -> Self {
        let credentials = settings.has_credentials().then(|| {
            (
                settings.broker_username().to_string(),
                settings.broker_password().to_string(),
            )
        });
        Self {
            host: settings.broker_address().to_string(),
            port: config.port,
            client_id: client_id(settings, identity),
            credentials,
            keep_alive_secs: config.keep_alive_secs,
            retry_delay_ms: config.retry_delay_ms,
        }
    }

    /// `mqtt://host:port`
    pub fn url(&self) -> String {
        alloc::format!("mqtt://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETRY: u32 = 5000;

    fn connected_session() -> Session {
        let mut s = Session::new(RETRY);
        assert_eq!(s.poll(0, true, false), Some(SessionAction::Connect));
        assert_eq!(s.poll(10, true, true), Some(SessionAction::Establish));
        s
    }

    #[test]
    fn starts_disconnected() {
        let s = Session::new(RETRY);
        assert_eq!(s.network(), LinkState::Disconnected);
        assert_eq!(s.broker(), LinkState::Disconnected);
        assert!(!s.is_online());
    }

    #[test]
    fn waits_for_network() {
        let mut s = Session::new(RETRY);
        assert_eq!(s.poll(0, false, false), None);
        assert_eq!(s.network(), LinkState::Connecting);
        assert_eq!(s.poll(100, false, false), None);
        assert_eq!(s.attempts(), 0);

        assert_eq!(s.poll(200, true, false), Some(SessionAction::Connect));
        assert_eq!(s.network(), LinkState::Connected);
    }

    #[test]
    fn connect_then_establish() {
        let mut s = Session::new(RETRY);
        assert_eq!(s.poll(0, true, false), Some(SessionAction::Connect));
        assert_eq!(s.network(), LinkState::Connected);
        assert_eq!(s.broker(), LinkState::Connecting);

        assert_eq!(s.poll(50, true, false), None);
        assert_eq!(s.poll(100, true, true), Some(SessionAction::Establish));
        assert!(s.is_online());
        assert_eq!(s.connections(), 1);

        // Steady state: no further actions.
        assert_eq!(s.poll(200, true, true), None);
    }

    #[test]
    fn failed_attempt_retries_after_delay() {
        let mut s = Session::new(RETRY);
        assert_eq!(s.poll(0, true, false), Some(SessionAction::Connect));
        s.attempt_failed(0);

        assert_eq!(s.poll(1000, true, false), None);
        assert_eq!(s.poll(4999, true, false), None);
        assert_eq!(s.poll(5000, true, false), Some(SessionAction::Connect));
        assert_eq!(s.attempts(), 2);
    }

    #[test]
    fn stalled_attempt_times_out() {
        let mut s = Session::new(RETRY);
        assert_eq!(s.poll(0, true, false), Some(SessionAction::Connect));
        assert_eq!(s.poll(5000, true, false), None);
        assert_eq!(s.broker(), LinkState::Disconnected);
        assert_eq!(s.poll(9999, true, false), None);
        assert_eq!(s.poll(10_000, true, false), Some(SessionAction::Connect));
    }

    #[test]
    fn never_gives_up() {
        let mut s = Session::new(RETRY);
        let mut now = 0;
        for _ in 0..100 {
            assert_eq!(s.poll(now, true, false), Some(SessionAction::Connect));
            s.attempt_failed(now);
            now += RETRY as u64;
        }
        assert_eq!(s.attempts(), 100);
    }

    #[test]
    fn broker_loss_reconnects_and_reestablishes() {
        let mut s = connected_session();

        assert_eq!(s.poll(1000, true, false), Some(SessionAction::Lost));
        assert_eq!(s.poll(1001, true, false), Some(SessionAction::Connect));
        assert_eq!(s.poll(1100, true, true), Some(SessionAction::Establish));
        assert_eq!(s.connections(), 2);
    }

    #[test]
    fn network_loss_drops_broker() {
        let mut s = connected_session();

        assert_eq!(s.poll(1000, false, true), Some(SessionAction::Lost));
        assert_eq!(s.network(), LinkState::Connecting);
        assert_eq!(s.broker(), LinkState::Disconnected);

        // No broker attempts while the network is down.
        assert_eq!(s.poll(9000, false, false), None);

        assert_eq!(s.poll(9500, true, false), Some(SessionAction::Connect));
    }

    #[test]
    fn broker_target_credentials() {
        let config = MqttConfig::default();
        let with = DeviceSettings::new("Kitchen", "10.0.0.2", "ha", "secret");
        assert_eq!(
            BrokerTarget::new(&with, "x", &config).credentials,
            Some(("ha".into(), "secret".into()))
        );

        let without = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");
        assert_eq!(BrokerTarget::new(&without, "x", &config).credentials, None);
    }

    #[test]
    fn reset_forces_immediate_reconnect() {
        let mut s = connected_session();
        s.reset();
        assert_eq!(s.broker(), LinkState::Disconnected);
        assert_eq!(s.poll(20, true, true), Some(SessionAction::Connect));
        assert_eq!(s.poll(30, true, true), Some(SessionAction::Establish));
    }
}
