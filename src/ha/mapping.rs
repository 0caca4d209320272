//! Mapping between entity declarations and Home Assistant wire types

use core::fmt::Write;
use core::net::Ipv4Addr;

use heapless::{String, Vec};

use crate::config::{DeviceInfo, MAX_PAYLOAD_LEN, MAX_TOPIC_LEN};
use crate::error::DiscoveryError;
use crate::ha::discovery::{HaAvailability, HaDeviceInfo, HaEntityDiscovery};
use crate::ha::entity::{EntityDescriptor, EntityKind};
use crate::topic::{
    Namespace, PAYLOAD_OFFLINE, PAYLOAD_ONLINE, STATE_SUFFIX, SWITCH_COMMAND_PREFIX, Topic,
};

/// Network identity reported in the `device.connections` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub ip: Option<Ipv4Addr>,
    pub mac: [u8; 6],
}

/// Serialized discovery config together with the topic it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryDocument {
    pub topic: Topic,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl DiscoveryDocument {
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

/// Strings derived from an entity before they are borrowed by [`HaEntityDiscovery`]
pub struct DiscoveryContext {
    pub config_topic: Topic,
    pub state_topic: Topic,
    pub status_topic: Topic,
    pub command_topic: Option<Topic>,
    pub unique_id: String<MAX_TOPIC_LEN>,
    pub value_template: Option<String<MAX_TOPIC_LEN>>,
    pub ip: String<15>,
    pub mac: String<12>,
}

impl DiscoveryContext {
    /// Build context for an entity.
    ///
    /// Fails when a topic or identifier derived from the discovery key does
    /// not fit its buffer.
    pub fn new(
        ns: &Namespace<'_>,
        entity: &EntityDescriptor<'_>,
        network: &NetworkIdentity,
    ) -> Result<Self, DiscoveryError> {
        let key = entity.discovery_key;

        let mut unique_id = String::new();
        write!(unique_id, "{}-{}", ns.identity(), key)?;

        let (state_topic, value_template) = match entity.state_topic {
            Some(suffix) => {
                let mut state_suffix: String<MAX_TOPIC_LEN> = String::new();
                write!(state_suffix, "{}/{}", suffix, STATE_SUFFIX)?;
                (ns.try_qualify(&state_suffix, false)?, None)
            }
            None => {
                let mut template = String::new();
                write!(template, "{{{{ value_json.{} }}}}", key)?;
                (ns.try_qualify(STATE_SUFFIX, false)?, Some(template))
            }
        };

        let command_topic = match entity.kind {
            EntityKind::Switch => {
                let mut command_suffix: String<MAX_TOPIC_LEN> = String::new();
                write!(command_suffix, "{}{}", SWITCH_COMMAND_PREFIX, key)?;
                Some(ns.try_qualify(&command_suffix, false)?)
            }
            _ => None,
        };

        let mut ip = String::new();
        write!(ip, "{}", network.ip.unwrap_or(Ipv4Addr::UNSPECIFIED))?;

        let mut mac = String::new();
        for byte in network.mac {
            write!(mac, "{:02x}", byte)?;
        }

        Ok(Self {
            config_topic: ns.discovery_topic(entity.kind.as_str(), key)?,
            state_topic,
            status_topic: ns.status_topic(),
            command_topic,
            unique_id,
            value_template,
            ip,
            mac,
        })
    }
}

/// Build [`HaEntityDiscovery`] from an [`EntityDescriptor`] and pre-built context
pub fn entity_to_discovery<'b>(
    entity: &'b EntityDescriptor<'_>,
    device: &'b DeviceInfo<'_>,
    ctx: &'b DiscoveryContext,
    availability: &'b [HaAvailability<'b>],
    identifiers: &'b [&'b str],
    connections: &'b [&'b [&'b str]],
) -> HaEntityDiscovery<'b> {
    let mut config = HaEntityDiscovery {
        name: entity.name,
        state_topic: ctx.state_topic.as_str(),
        availability,
        device: HaDeviceInfo {
            identifiers,
            name: device.name,
            manufacturer: device.manufacturer,
            model: device.model,
            sw_version: device.sw_version,
            connections,
        },
        unique_id: ctx.unique_id.as_str(),
        device_class: entity.device_class,
        value_template: ctx.value_template.as_ref().map(String::as_str),
        unit_of_measurement: entity.unit,
        state_class: entity.state_class,
        expire_after: entity.expire_after.as_secs(),
        command_topic: None,
        payload_on: None,
        payload_off: None,
        state_on: None,
        state_off: None,
        entity_category: None,
        icon: None,
    };

    match entity.kind {
        EntityKind::Sensor => {}
        EntityKind::BinarySensor => {
            config.payload_on = Some(true);
            config.payload_off = Some(false);
            if entity.is_connectivity() {
                config.entity_category = Some("diagnostic");
            }
        }
        EntityKind::Switch => {
            config.command_topic = ctx.command_topic.as_ref().map(String::as_str);
            config.payload_on = Some(true);
            config.payload_off = Some(false);
            config.state_on = Some(true);
            config.state_off = Some(false);
            config.icon = Some("mdi:power");
        }
    }

    config
}

/// Build the discovery config for one entity.
///
/// The result is meant to be published retained on [`DiscoveryDocument::topic`].
/// A discovery key too long for the topic buffers is an error, never a
/// truncated topic.
pub fn build_config(
    ns: &Namespace<'_>,
    device: &DeviceInfo<'_>,
    network: &NetworkIdentity,
    entity: &EntityDescriptor<'_>,
) -> Result<DiscoveryDocument, DiscoveryError> {
    let ctx = DiscoveryContext::new(ns, entity, network)?;
    let availability = [HaAvailability {
        topic: ctx.status_topic.as_str(),
        payload_available: PAYLOAD_ONLINE,
        payload_not_available: PAYLOAD_OFFLINE,
    }];
    let identifiers = [ns.identity().as_str()];
    let ip_pair = ["ip", ctx.ip.as_str()];
    let mac_pair = ["mac", ctx.mac.as_str()];
    let connections: [&[&str]; 2] = [&ip_pair, &mac_pair];

    let config = entity_to_discovery(
        entity,
        device,
        &ctx,
        &availability,
        &identifiers,
        &connections,
    );
    let payload = serde_json_core::to_vec::<_, MAX_PAYLOAD_LEN>(&config)?;

    Ok(DiscoveryDocument {
        topic: ctx.config_topic,
        payload,
    })
}
