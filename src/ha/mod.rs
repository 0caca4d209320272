//! Home Assistant MQTT discovery
//!
//! - `entity`: entity declarations made by the application
//! - `discovery`: JSON-serializable types matching Home Assistant's discovery schema
//! - `mapping`: conversion from declarations to wire documents

pub mod discovery;
pub mod entity;
pub mod mapping;

pub use discovery::{HaAvailability, HaDeviceInfo, HaEntityDiscovery};
pub use entity::{EntityDescriptor, EntityKind};
pub use mapping::{
    DiscoveryContext, DiscoveryDocument, NetworkIdentity, build_config, entity_to_discovery,
};
