//! Host-side doubles of the hardware ports

use std::cell::Cell;
use std::collections::VecDeque;

use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;

use crate::ports::{
    BrokerSession, InboundMessage, Indicator, QoS, SessionOptions, WifiStation, WifiStatus,
};

#[derive(Debug)]
pub(crate) struct MockError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Connect {
        client_id: String,
        will_topic: String,
        will_payload: Vec<u8>,
        will_retain: bool,
    },
    Disconnect,
    Subscribe(String),
    Publish {
        topic: String,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    },
}

#[derive(Default)]
pub(crate) struct MockSession {
    pub(crate) calls: Vec<Call>,
    pub(crate) connected: bool,
    pub(crate) fault: bool,
    pub(crate) fail_connect: bool,
    pub(crate) fail_publish: bool,
    pub(crate) fail_poll: bool,
    inbound: VecDeque<(String, Vec<u8>)>,
    current: Option<(String, Vec<u8>)>,
}

impl MockSession {
    pub(crate) fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back((topic.into(), payload.to_vec()));
    }

    /// `(topic, payload, retain)` of every publish, in order
    pub(crate) fn published(&self) -> Vec<(&str, &[u8], bool)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Publish {
                    topic,
                    payload,
                    retain,
                    ..
                } => Some((topic.as_str(), payload.as_slice(), *retain)),
                _ => None,
            })
            .collect()
    }

    /// Calls other than publishes
    pub(crate) fn session_calls(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| !matches!(call, Call::Publish { .. }))
            .collect()
    }
}

impl BrokerSession for MockSession {
    type Error = MockError;

    async fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), MockError> {
        self.calls.push(Call::Connect {
            client_id: options.client_id.into(),
            will_topic: options.last_will.topic.into(),
            will_payload: options.last_will.payload.to_vec(),
            will_retain: options.last_will.retain,
        });
        if self.fail_connect {
            return Err(MockError);
        }
        self.connected = true;
        self.fault = false;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), MockError> {
        self.calls.push(Call::Disconnect);
        self.connected = false;
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), MockError> {
        self.calls.push(Call::Subscribe(topic.into()));
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), MockError> {
        if self.fail_publish {
            self.fault = true;
            return Err(MockError);
        }
        self.calls.push(Call::Publish {
            topic: topic.into(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    async fn poll(&mut self) -> Result<Option<InboundMessage<'_>>, MockError> {
        if self.fail_poll {
            self.fault = true;
            return Err(MockError);
        }
        self.current = self.inbound.pop_front();
        Ok(self.current.as_ref().map(|(topic, payload)| InboundMessage {
            topic: topic.as_str(),
            payload: payload.as_slice(),
            retained: false,
            duplicate: false,
        }))
    }

    fn is_alive(&self) -> bool {
        self.connected
    }

    fn has_fault(&self) -> bool {
        self.fault
    }
}

/// Station that reports `Up` from the n-th status poll on
#[derive(Default)]
pub(crate) struct MockWifi {
    pub(crate) up_after: Option<u32>,
    pub(crate) begun: Option<String>,
    polls: Cell<u32>,
}

impl MockWifi {
    pub(crate) fn up_after(polls: u32) -> Self {
        Self {
            up_after: Some(polls),
            ..Self::default()
        }
    }

    pub(crate) fn never_up() -> Self {
        Self::default()
    }
}

impl WifiStation for MockWifi {
    fn begin(&mut self, ssid: &str, _password: &str) {
        self.begun = Some(ssid.into());
    }

    fn status(&self) -> WifiStatus {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        match self.up_after {
            Some(up_after) if polls >= up_after => WifiStatus::Up,
            _ => WifiStatus::Connecting,
        }
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 1, 42))
    }

    fn mac_address(&self) -> [u8; 6] {
        [0x28, 0xcd, 0xc1, 0x01, 0x02, 0x03]
    }
}

#[derive(Default)]
pub(crate) struct MockIndicator {
    pub(crate) lit: bool,
    pub(crate) on: u32,
    pub(crate) toggles: u32,
}

impl Indicator for MockIndicator {
    fn on(&mut self) {
        self.lit = true;
        self.on += 1;
    }

    fn off(&mut self) {
        self.lit = false;
    }

    fn toggle(&mut self) {
        self.lit = !self.lit;
        self.toggles += 1;
    }
}

/// Delay that returns at once and adds up what was asked for
#[derive(Default)]
pub(crate) struct NoopDelay {
    total_ns: u64,
}

impl NoopDelay {
    pub(crate) fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for NoopDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}
