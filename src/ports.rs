//! Ports to the hardware and the broker client
//!
//! The link never touches a radio, a socket or a GPIO directly. Boards provide
//! these traits; tests provide mocks.

use core::net::Ipv4Addr;

use embassy_time::Duration;

use crate::error::FatalError;

/// MQTT delivery guarantee
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QoS {
    /// QoS 0, fire-and-forget
    AtMostOnce,
    /// QoS 1
    AtLeastOnce,
}

/// Message the broker publishes on our behalf when the session drops uncleanly
#[derive(Debug, Clone, Copy)]
pub struct LastWill<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub qos: QoS,
    pub retain: bool,
}

/// Parameters of a broker session
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions<'a> {
    pub client_id: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub keep_alive: Duration,
    pub last_will: LastWill<'a>,
}

/// Message received from the broker, valid for one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundMessage<'m> {
    pub topic: &'m str,
    pub payload: &'m [u8],
    pub retained: bool,
    pub duplicate: bool,
}

/// Broker client owned by the connection manager.
///
/// Implementations keep at most one session open. `poll` must return
/// immediately when nothing is pending, the watchdog shares the link with
/// the main loop.
#[allow(async_fn_in_trait)]
pub trait BrokerSession {
    type Error: core::fmt::Debug;

    /// Open a session, registering the last will first
    async fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), Self::Error>;

    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    async fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error>;

    /// Fetch one pending inbound message, if any
    async fn poll(&mut self) -> Result<Option<InboundMessage<'_>>, Self::Error>;

    /// Session is open and keep-alive is answered
    fn is_alive(&self) -> bool;

    /// The client observed a connectivity problem since the last connect
    fn has_fault(&self) -> bool;
}

/// WiFi station status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WifiStatus {
    #[default]
    Idle,
    Connecting,
    WrongPassword,
    NoApFound,
    ConnectFailed,
    /// Associated and addressed
    Up,
}

/// WiFi radio in station mode
pub trait WifiStation {
    /// Activate the interface and start associating
    fn begin(&mut self, ssid: &str, password: &str);

    fn status(&self) -> WifiStatus;

    fn ip_address(&self) -> Option<Ipv4Addr>;

    fn mac_address(&self) -> [u8; 6];
}

/// Activity indicator, usually the on-board LED
pub trait Indicator {
    fn on(&mut self);
    fn off(&mut self);
    fn toggle(&mut self);
}

/// Whole-device control
pub trait SystemControl {
    /// Reset the device. Never returns.
    fn restart(&mut self, reason: FatalError) -> !;
}
