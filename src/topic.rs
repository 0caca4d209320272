//! Topic namespacing
//!
//! Every device-owned topic lives under `{identity}/`. Topics owned by the hub
//! or by other devices are used verbatim ("absolute").

use core::fmt::{self, Write};

use heapless::String;

use crate::config::MAX_TOPIC_LEN;
use crate::identity::DeviceIdentity;

/// Fully-qualified broker topic
pub type Topic = String<MAX_TOPIC_LEN>;

/// Liveness topic, carries the last will and the birth message
pub const STATUS_SUFFIX: &str = "system/status";
/// Default state topic shared by all entities of the device
pub const STATE_SUFFIX: &str = "state";
/// Prefix of the command topic of switch entities
pub const SWITCH_COMMAND_PREFIX: &str = "switch/toggle/";
/// Discovery prefix watched by Home Assistant
pub const DISCOVERY_PREFIX: &str = "homeassistant";

pub const PAYLOAD_ONLINE: &str = "online";
pub const PAYLOAD_OFFLINE: &str = "offline";

/// Maps logical topic suffixes to broker topics scoped by the device identity.
#[derive(Debug, Clone, Copy)]
pub struct Namespace<'a> {
    identity: &'a DeviceIdentity,
}

impl<'a> Namespace<'a> {
    pub const fn new(identity: &'a DeviceIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &'a DeviceIdentity {
        self.identity
    }

    /// Qualify a topic suffix.
    ///
    /// Absolute topics are returned unchanged, everything else becomes
    /// `{identity}/{suffix}`.
    pub fn qualify(&self, suffix: &str, absolute: bool) -> Topic {
        let mut topic = Topic::new();
        if self.write_qualified(&mut topic, suffix, absolute).is_err() {
            log::warn!("topic: '{}' exceeds {} bytes, truncated", suffix, MAX_TOPIC_LEN);
        }
        topic
    }

    /// Same as [`Self::qualify`], failing instead of truncating
    pub fn try_qualify(&self, suffix: &str, absolute: bool) -> Result<Topic, fmt::Error> {
        let mut topic = Topic::new();
        self.write_qualified(&mut topic, suffix, absolute)?;
        Ok(topic)
    }

    fn write_qualified(&self, topic: &mut Topic, suffix: &str, absolute: bool) -> fmt::Result {
        if absolute {
            topic.push_str(suffix).map_err(|()| fmt::Error)
        } else {
            write!(topic, "{}/{}", self.identity, suffix)
        }
    }

    /// Strip exactly one leading `{identity}/`.
    ///
    /// Topics outside the namespace are returned unchanged.
    pub fn unqualify<'t>(&self, topic: &'t str) -> &'t str {
        topic
            .strip_prefix(self.identity.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(topic)
    }

    /// `{identity}/system/status`
    pub fn status_topic(&self) -> Topic {
        self.qualify(STATUS_SUFFIX, false)
    }

    /// Format: `homeassistant/{kind}/{identity}/{discovery_key}/config`
    ///
    /// Fails when the topic does not fit in [`MAX_TOPIC_LEN`] bytes.
    pub fn discovery_topic(&self, kind: &str, discovery_key: &str) -> Result<Topic, fmt::Error> {
        let mut topic = Topic::new();
        write!(
            topic,
            "{}/{}/{}/{}/config",
            DISCOVERY_PREFIX, kind, self.identity, discovery_key
        )?;
        Ok(topic)
    }
}
