//! Inbound message routing
//!
//! The dispatcher hands every message received on a subscribed topic to the
//! single application handler, with the device prefix already stripped.
//!
//! Handlers are dyn-compatible so the dispatcher can hold `&mut dyn
//! MessageHandler` without an allocator. They never perform I/O; publishes go
//! through the [`PublishOutbox`] they are given.

use log::{debug, warn};

use crate::identity::DeviceIdentity;
use crate::link::deferred::PublishOutbox;
use crate::ports::{InboundMessage, Indicator};
use crate::topic::Namespace;

/// Application callback for inbound messages.
///
/// `message.topic` is the logical topic: the suffix for device topics, the
/// full topic for absolute subscriptions. Must return promptly, the link is
/// held for the duration of the call.
pub trait MessageHandler {
    fn handle(&mut self, message: &InboundMessage<'_>, outbox: &mut dyn PublishOutbox);
}

impl<F> MessageHandler for F
where
    F: FnMut(&InboundMessage<'_>, &mut dyn PublishOutbox),
{
    fn handle(&mut self, message: &InboundMessage<'_>, outbox: &mut dyn PublishOutbox) {
        self(message, outbox);
    }
}

pub struct Dispatcher<'a> {
    ns: Namespace<'a>,
    handler: Option<&'a mut dyn MessageHandler>,
}

impl<'a> Dispatcher<'a> {
    pub const fn new(identity: &'a DeviceIdentity) -> Self {
        Self {
            ns: Namespace::new(identity),
            handler: None,
        }
    }

    /// Register the handler, replacing the previous one
    pub fn set_handler(&mut self, handler: &'a mut dyn MessageHandler) {
        if self.handler.replace(handler).is_some() {
            debug!("dispatch: handler replaced");
        }
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Route one inbound message.
    ///
    /// Returns `false` when there is no handler and the message was dropped.
    pub fn on_message(
        &mut self,
        message: &InboundMessage<'_>,
        indicator: &mut dyn Indicator,
        outbox: &mut dyn PublishOutbox,
    ) -> bool {
        let Some(handler) = self.handler.as_deref_mut() else {
            warn!("dispatch: no handler, dropping message on '{}'", message.topic);
            return false;
        };

        let logical = InboundMessage {
            topic: self.ns.unqualify(message.topic),
            ..*message
        };
        debug!(
            "dispatch: '{}' ({} bytes, retained: {}, duplicate: {})",
            logical.topic,
            logical.payload.len(),
            logical.retained,
            logical.duplicate
        );

        indicator.on();
        handler.handle(&logical, outbox);
        indicator.off();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::deferred::{Deferred, DeferredPublishes};
    use crate::testing::MockIndicator;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(String, Vec<u8>, bool, bool)>,
    }

    impl MessageHandler for Recorder {
        fn handle(&mut self, message: &InboundMessage<'_>, _outbox: &mut dyn PublishOutbox) {
            self.seen.push((
                message.topic.into(),
                message.payload.to_vec(),
                message.retained,
                message.duplicate,
            ));
        }
    }

    struct Echo;

    impl MessageHandler for Echo {
        fn handle(&mut self, message: &InboundMessage<'_>, outbox: &mut dyn PublishOutbox) {
            outbox.publish("echo", message.payload, false);
        }
    }

    fn identity() -> DeviceIdentity {
        DeviceIdentity::from_hardware_id("dev", &[0xab, 0x12])
    }

    fn message<'m>(topic: &'m str, payload: &'m [u8]) -> InboundMessage<'m> {
        InboundMessage {
            topic,
            payload,
            retained: true,
            duplicate: false,
        }
    }

    #[test]
    fn strips_device_prefix_and_keeps_flags() {
        let identity = identity();
        let mut recorder = Recorder::default();
        let mut indicator = MockIndicator::default();
        let mut outbox: DeferredPublishes<4> = DeferredPublishes::new();

        let mut dispatcher = Dispatcher::new(&identity);
        dispatcher.set_handler(&mut recorder);
        let handled = dispatcher.on_message(
            &message("dev-ab12/switch/toggle/x", b"True"),
            &mut indicator,
            &mut outbox,
        );
        drop(dispatcher);

        assert!(handled);
        assert_eq!(
            recorder.seen,
            [(String::from("switch/toggle/x"), b"True".to_vec(), true, false)]
        );
        assert_eq!(indicator.on, 1);
        assert!(!indicator.lit);
    }

    #[test]
    fn absolute_topics_are_passed_verbatim() {
        let identity = identity();
        let mut recorder = Recorder::default();
        let mut indicator = MockIndicator::default();
        let mut outbox: DeferredPublishes<4> = DeferredPublishes::new();

        let mut dispatcher = Dispatcher::new(&identity);
        dispatcher.set_handler(&mut recorder);
        dispatcher.on_message(
            &message("alarmo/interior/state", b"armed_away"),
            &mut indicator,
            &mut outbox,
        );
        drop(dispatcher);

        assert_eq!(recorder.seen[0].0, "alarmo/interior/state");
    }

    #[test]
    fn message_without_handler_is_dropped() {
        let identity = identity();
        let mut indicator = MockIndicator::default();
        let mut outbox: DeferredPublishes<4> = DeferredPublishes::new();
        let mut dispatcher = Dispatcher::new(&identity);

        let handled = dispatcher.on_message(
            &message("dev-ab12/state", b"{}"),
            &mut indicator,
            &mut outbox,
        );

        assert!(!handled);
        assert!(!dispatcher.has_handler());
        assert_eq!(indicator.on, 0);
    }

    #[test]
    fn second_handler_replaces_the_first() {
        let identity = identity();
        let mut first = Recorder::default();
        let mut second = Echo;
        let mut indicator = MockIndicator::default();
        let mut outbox: DeferredPublishes<4> = DeferredPublishes::new();

        let mut dispatcher = Dispatcher::new(&identity);
        dispatcher.set_handler(&mut first);
        dispatcher.set_handler(&mut second);
        dispatcher.on_message(&message("dev-ab12/ping", b"1"), &mut indicator, &mut outbox);
        drop(dispatcher);

        assert!(first.seen.is_empty());
        assert!(matches!(
            outbox.take().as_slice(),
            [Deferred::Publish { suffix, payload, .. }] if suffix == "echo" && payload == b"1"
        ));
    }
}
