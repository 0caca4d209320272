//! Home Assistant discovery payload structures
//!
//! These types match the exact JSON schema expected by Home Assistant
//! for MQTT discovery messages. Field order is the order of the emitted JSON.

use serde::Serialize;

/// Availability entry pointing at the device liveness topic
#[derive(Debug, Clone, Serialize)]
pub struct HaAvailability<'a> {
    pub topic: &'a str,
    pub payload_available: &'a str,
    pub payload_not_available: &'a str,
}

/// Device information for Home Assistant discovery payload
#[derive(Debug, Clone, Serialize)]
pub struct HaDeviceInfo<'a> {
    /// Device identifiers array
    pub identifiers: &'a [&'a str],
    /// Human-readable device name
    pub name: &'a str,
    pub manufacturer: &'a str,
    pub model: &'a str,
    pub sw_version: &'a str,
    /// `[["ip", ...], ["mac", ...]]`
    pub connections: &'a [&'a [&'a str]],
}

/// Discovery payload shared by sensors, binary sensors and switches
#[derive(Debug, Serialize)]
pub struct HaEntityDiscovery<'a> {
    /// Human-readable name
    pub name: &'a str,
    /// Topic for state updates
    pub state_topic: &'a str,
    pub availability: &'a [HaAvailability<'a>],
    /// Device information
    pub device: HaDeviceInfo<'a>,
    /// Unique identifier
    pub unique_id: &'a str,
    /// Device class (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<&'a str>,
    /// Unit of measurement (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'a str>,
    /// State class (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'a str>,
    /// Seconds
    pub expire_after: u64,
    /// Topic for commands (switches)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_off: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<&'a str>,
    /// MDI icon (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'a str>,
}
