//! Device link for WiFi microcontrollers publishing to Home Assistant over MQTT
//!
//! The crate keeps a single device connected to a broker and discoverable by
//! Home Assistant. It is structured in four layers:
//!
//! - **Naming** (`identity`, `topic`): hardware-derived device identity and the
//!   topic namespace scoped by it
//! - **Discovery** (`ha`): entity declarations and their Home Assistant
//!   discovery documents
//! - **Link** (`link`, `dispatch`): WiFi association, broker session, offline
//!   queue and inbound message routing
//! - **Supervision** (`watchdog`): periodic fault detection, reconnection and
//!   restart
//!
//! Hardware and the MQTT client are reached through the traits in [`ports`].
//!
//! # Example
//!
//! ```ignore
//! use myrtio_link::{
//!     BrokerConfig, ConnectionManager, DeviceIdentity, Dispatcher, EntityDescriptor,
//!     LinkConfig, Watchdog, WifiConfig,
//! };
//!
//! const CONFIG: LinkConfig = LinkConfig::new(
//!     WifiConfig::new("ssid", "password"),
//!     BrokerConfig::new("192.168.1.10"),
//! );
//!
//! let identity = DeviceIdentity::from_hardware_id("dev", &chip_id);
//! let mut link = ConnectionManager::new(&identity, CONFIG, session, wifi, led);
//! link.start(&mut delay).await.unwrap_or_else(|e| system.restart(e));
//! link.subscribe("switch/toggle/pump", false).await?;
//! link.register_entity(EntityDescriptor::switch("pump", "Pump"))?;
//! link.announce_entities().await?;
//!
//! let link = Mutex::new(link);
//! let watchdog = Watchdog::new(&link, &CONFIG.timings);
//! ```

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod ha;
pub mod identity;
pub mod link;
pub mod ports;
pub mod topic;
pub mod watchdog;

#[cfg(test)]
mod testing;

pub use config::{BrokerConfig, DeviceInfo, LinkConfig, LinkTimings, WifiConfig};
pub use dispatch::{Dispatcher, MessageHandler};
pub use error::{DiscoveryError, FatalError, Fault, SetupError};
pub use ha::{EntityDescriptor, EntityKind, NetworkIdentity, build_config};
pub use identity::DeviceIdentity;
pub use link::{
    ConnectionManager, ConnectionState, Delivery, LinkPhase, PublishOutbox, QueueOutcome,
    SharedLink,
};
pub use ports::{
    BrokerSession, InboundMessage, Indicator, QoS, SystemControl, WifiStation, WifiStatus,
};
pub use topic::Namespace;
pub use watchdog::{Verdict, Watchdog};
