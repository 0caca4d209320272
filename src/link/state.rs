//! Connection state shared by the main loop and the watchdog

use crate::ports::WifiStatus;

/// Lifecycle of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPhase {
    #[default]
    Disconnected,
    WifiConnecting,
    WifiUp,
    BrokerConnecting,
    SessionEstablished,
}

/// Snapshot of the link health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub wifi_status: WifiStatus,
    pub phase: LinkPhase,
    /// Watchdog ticks in a row that found the connection faulted
    pub consecutive_fault_count: u32,
}

impl ConnectionState {
    pub const fn new() -> Self {
        Self {
            wifi_status: WifiStatus::Idle,
            phase: LinkPhase::Disconnected,
            consecutive_fault_count: 0,
        }
    }

    pub fn broker_connected(&self) -> bool {
        self.phase == LinkPhase::SessionEstablished
    }

    /// Drop back below the broker session, keeping WiFi if it was up
    pub(crate) fn session_lost(&mut self) {
        self.phase = if self.wifi_status == WifiStatus::Up {
            LinkPhase::WifiUp
        } else {
            LinkPhase::Disconnected
        };
    }
}
