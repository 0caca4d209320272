//! Error types for the device link
//!
//! Faults come in two flavours. Transient faults are absorbed by the link and
//! retried by the watchdog. Fatal errors have no recovery path other than a full
//! device restart.

use core::fmt;

/// Recoverable failure of a link operation
#[derive(Debug)]
pub enum Fault<E> {
    /// The broker session or the network underneath it failed
    TransientNetwork(E),
    /// The operation needs a live broker session
    NotConnected,
    /// A JSON document could not be built
    Serialization,
}

impl<E: fmt::Debug> fmt::Display for Fault<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::TransientNetwork(e) => write!(f, "transient network fault: {:?}", e),
            Fault::NotConnected => write!(f, "broker session is not established"),
            Fault::Serialization => write!(f, "JSON serialization error"),
        }
    }
}

/// Failure while declaring subscriptions or entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// Maximum subscriptions reached
    TooManySubscriptions,
    /// Maximum entities reached
    TooManyEntities,
    /// Entities were already announced, the registry no longer accepts new ones
    RegistryFrozen,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::TooManySubscriptions => write!(f, "Maximum subscriptions reached"),
            SetupError::TooManyEntities => write!(f, "Maximum entities reached"),
            SetupError::RegistryFrozen => write!(f, "Entities already announced"),
        }
    }
}

/// Failure while building a discovery document
#[derive(Debug)]
pub enum DiscoveryError {
    /// A derived topic or identifier does not fit its buffer
    TopicTooLong,
    /// The document does not fit the payload buffer
    Serialization(serde_json_core::ser::Error),
}

impl From<fmt::Error> for DiscoveryError {
    fn from(_: fmt::Error) -> Self {
        DiscoveryError::TopicTooLong
    }
}

impl From<serde_json_core::ser::Error> for DiscoveryError {
    fn from(e: serde_json_core::ser::Error) -> Self {
        DiscoveryError::Serialization(e)
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::TopicTooLong => write!(f, "discovery topic or id too long"),
            DiscoveryError::Serialization(e) => write!(f, "discovery document: {:?}", e),
        }
    }
}

/// Unrecoverable condition, the only way out is a restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    /// WiFi did not associate within the configured number of polls
    UnrecoverableAssociationFailure { polls: u32 },
    /// The broker connection kept failing across watchdog ticks
    WatchdogThresholdExceeded { faults: u32 },
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::UnrecoverableAssociationFailure { polls } => {
                write!(f, "WiFi association failed after {} polls", polls)
            }
            FatalError::WatchdogThresholdExceeded { faults } => {
                write!(f, "connection lost for {} consecutive watchdog ticks", faults)
            }
        }
    }
}
