//! Publish requests made from inside a message handler
//!
//! Handlers run synchronously while the link is busy dispatching, so they
//! never perform I/O. They queue requests through [`PublishOutbox`]; the
//! connection manager performs them right after the handler returns.

use heapless::Vec;
use serde::Serialize;

use crate::config::{MAX_PAYLOAD_LEN, MAX_STATE_LEN};
use crate::topic::Topic;

/// Sink for publish requests issued by handlers
pub trait PublishOutbox {
    /// Request a publish on `{identity}/{suffix}`
    fn publish(&mut self, suffix: &str, payload: &[u8], retain: bool);

    /// Request a status publish of an already serialized state document
    fn publish_status_json(&mut self, json: &[u8]);
}

impl dyn PublishOutbox + '_ {
    /// Serialize `document` and request a status publish
    pub fn publish_status<T: Serialize>(&mut self, document: &T) {
        match serde_json_core::to_vec::<_, MAX_STATE_LEN>(document) {
            Ok(json) => self.publish_status_json(&json),
            Err(e) => log::warn!("link: state document not serializable: {:?}", e),
        }
    }
}

/// Request recorded by [`DeferredPublishes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    Publish {
        suffix: Topic,
        payload: Vec<u8, MAX_PAYLOAD_LEN>,
        retain: bool,
    },
    Status {
        json: Vec<u8, MAX_STATE_LEN>,
    },
}

/// Fixed-capacity [`PublishOutbox`]
#[derive(Default)]
pub struct DeferredPublishes<const N: usize> {
    requests: Vec<Deferred, N>,
}

impl<const N: usize> DeferredPublishes<N> {
    pub const fn new() -> Self {
        Self {
            requests: Vec::new(),
        }
    }

    /// Take every recorded request, oldest first
    pub fn take(&mut self) -> Vec<Deferred, N> {
        core::mem::take(&mut self.requests)
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn record(&mut self, request: Deferred) {
        if self.requests.push(request).is_err() {
            log::warn!("link: more than {} publishes requested by handler, dropping", N);
        }
    }
}

impl<const N: usize> PublishOutbox for DeferredPublishes<N> {
    fn publish(&mut self, suffix: &str, payload: &[u8], retain: bool) {
        let (Ok(suffix), Ok(payload)) = (Topic::try_from(suffix), Vec::from_slice(payload)) else {
            log::warn!("link: deferred publish on '{}' too large, dropping", suffix);
            return;
        };
        self.record(Deferred::Publish {
            suffix,
            payload,
            retain,
        });
    }

    fn publish_status_json(&mut self, json: &[u8]) {
        let Ok(json) = Vec::from_slice(json) else {
            log::warn!("link: state document too large, dropping");
            return;
        };
        self.record(Deferred::Status { json });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct LedState {
        led: bool,
    }

    #[test]
    fn records_requests_in_order() {
        let mut outbox: DeferredPublishes<4> = DeferredPublishes::new();
        outbox.publish("system/status", b"online", false);
        (&mut outbox as &mut dyn PublishOutbox).publish_status(&LedState { led: true });

        let requests = outbox.take();
        assert_eq!(requests.len(), 2);
        assert!(matches!(
            &requests[0],
            Deferred::Publish { suffix, payload, retain: false }
                if suffix == "system/status" && payload == b"online"
        ));
        assert!(matches!(
            &requests[1],
            Deferred::Status { json } if json == br#"{"led":true}"#
        ));
        assert!(outbox.is_empty());
    }

    #[test]
    fn overflow_is_dropped() {
        let mut outbox: DeferredPublishes<1> = DeferredPublishes::new();
        outbox.publish("a", b"1", false);
        outbox.publish("b", b"2", false);
        assert_eq!(outbox.take().len(), 1);
    }
}
