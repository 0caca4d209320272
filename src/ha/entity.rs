//! Entity declarations
//!
//! An entity is one value the device exposes to Home Assistant. The
//! application declares it once at start-up.

use embassy_time::Duration;

/// Home Assistant component the entity maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Sensor,
    BinarySensor,
    Switch,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Sensor => "sensor",
            EntityKind::BinarySensor => "binary_sensor",
            EntityKind::Switch => "switch",
        }
    }
}

/// Entity metadata consumed by the discovery builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor<'a> {
    /// Key of the value inside the state document, also the last part of `unique_id`
    pub discovery_key: &'a str,
    /// Human-readable name
    pub name: &'a str,
    pub kind: EntityKind,
    /// Device class (optional)
    pub device_class: Option<&'a str>,
    /// Unit of measurement (optional)
    pub unit: Option<&'a str>,
    /// State class (optional)
    pub state_class: Option<&'a str>,
    /// Dedicated state topic suffix, replaces the shared state document
    pub state_topic: Option<&'a str>,
    /// Time after which Home Assistant marks the value unavailable
    pub expire_after: Duration,
}

impl<'a> EntityDescriptor<'a> {
    pub const fn new(discovery_key: &'a str, name: &'a str, kind: EntityKind) -> Self {
        Self {
            discovery_key,
            name,
            kind,
            device_class: None,
            unit: None,
            state_class: None,
            state_topic: None,
            expire_after: Duration::from_secs(60),
        }
    }

    pub const fn sensor(discovery_key: &'a str, name: &'a str) -> Self {
        Self::new(discovery_key, name, EntityKind::Sensor)
    }

    pub const fn binary_sensor(discovery_key: &'a str, name: &'a str) -> Self {
        Self::new(discovery_key, name, EntityKind::BinarySensor)
    }

    pub const fn switch(discovery_key: &'a str, name: &'a str) -> Self {
        Self::new(discovery_key, name, EntityKind::Switch)
    }

    #[must_use]
    pub const fn with_device_class(mut self, device_class: &'a str) -> Self {
        self.device_class = Some(device_class);
        self
    }

    #[must_use]
    pub const fn with_unit(mut self, unit: &'a str) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub const fn with_state_class(mut self, state_class: &'a str) -> Self {
        self.state_class = Some(state_class);
        self
    }

    /// Publish the value on `{identity}/{suffix}/state` instead of the shared state document
    #[must_use]
    pub const fn with_state_topic(mut self, suffix: &'a str) -> Self {
        self.state_topic = Some(suffix);
        self
    }

    #[must_use]
    pub const fn with_expire_after(mut self, expire_after: Duration) -> Self {
        self.expire_after = expire_after;
        self
    }

    pub fn is_connectivity(&self) -> bool {
        self.device_class == Some("connectivity")
    }
}
