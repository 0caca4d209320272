//! Device identity derived from the hardware id

use core::fmt::{self, Write};

use heapless::String;

/// Maximum length of a device identity
pub const MAX_IDENTITY_LEN: usize = 48;

/// Default identity prefix
pub const DEFAULT_PREFIX: &str = "dev";

/// Stable, hardware-derived name of the physical unit.
///
/// Computed once at start-up and used as the topic namespace and as the root
/// of every discovery `unique_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity(String<MAX_IDENTITY_LEN>);

impl DeviceIdentity {
    /// Build `{prefix}-{hex(hardware_id)}`, hex in lowercase.
    pub fn from_hardware_id(prefix: &str, hardware_id: &[u8]) -> Self {
        let mut id = String::new();
        if id.push_str(prefix).is_err() {
            log::warn!("identity: prefix '{}' exceeds {} bytes, dropped", prefix, MAX_IDENTITY_LEN);
        }
        let _ = id.push('-');
        for byte in hardware_id {
            if write!(id, "{:02x}", byte).is_err() {
                log::warn!("identity: hardware id truncated at {} bytes", id.len());
                break;
            }
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
