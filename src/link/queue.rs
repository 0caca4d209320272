//! Bounded queue for messages published while the session is down
//!
//! Boundedness wins over delivery: fire-and-forget messages are not kept
//! unless asked for, duplicates are refused and a full queue forgets its
//! oldest entry.

use heapless::{Deque, Vec};

use crate::config::MAX_PAYLOAD_LEN;
use crate::ports::QoS;
use crate::topic::Topic;

/// Message waiting for the session to come back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub topic: Topic,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
    pub qos: QoS,
    pub retain: bool,
}

/// What the queue did with an offered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    Queued,
    /// Queued after dropping the oldest entry
    EvictedOldest,
    /// Same topic and payload already waiting
    Duplicate,
    /// QoS 0 messages are not kept
    DroppedFireAndForget,
    /// Topic or payload does not fit a queue slot
    TooLarge,
}

impl QueueOutcome {
    pub fn is_queued(self) -> bool {
        matches!(self, QueueOutcome::Queued | QueueOutcome::EvictedOldest)
    }
}

pub struct OfflineQueue<const N: usize> {
    messages: Deque<QueuedMessage, N>,
    keep_fire_and_forget: bool,
}

impl<const N: usize> OfflineQueue<N> {
    pub const fn new() -> Self {
        Self {
            messages: Deque::new(),
            keep_fire_and_forget: false,
        }
    }

    /// Queue QoS 0 messages too instead of dropping them
    #[must_use]
    pub const fn with_keep_fire_and_forget(mut self, keep: bool) -> Self {
        self.keep_fire_and_forget = keep;
        self
    }

    pub fn offer(&mut self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> QueueOutcome {
        if qos == QoS::AtMostOnce && !self.keep_fire_and_forget {
            return QueueOutcome::DroppedFireAndForget;
        }
        if self
            .messages
            .iter()
            .any(|queued| queued.topic == topic && queued.payload == payload)
        {
            return QueueOutcome::Duplicate;
        }
        let (Ok(topic), Ok(payload)) = (Topic::try_from(topic), Vec::from_slice(payload)) else {
            return QueueOutcome::TooLarge;
        };

        let mut outcome = QueueOutcome::Queued;
        if self.messages.is_full() {
            self.messages.pop_front();
            outcome = QueueOutcome::EvictedOldest;
        }
        match self.messages.push_back(QueuedMessage {
            topic,
            payload,
            qos,
            retain,
        }) {
            Ok(()) => outcome,
            Err(_) => QueueOutcome::TooLarge,
        }
    }

    pub fn front(&self) -> Option<&QueuedMessage> {
        self.messages.front()
    }

    pub fn pop_front(&mut self) -> Option<QueuedMessage> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<const N: usize> Default for OfflineQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_and_forget_is_not_queued() {
        let mut queue: OfflineQueue<2> = OfflineQueue::new();
        assert_eq!(
            queue.offer("dev-ab12/state", b"{}", QoS::AtMostOnce, false),
            QueueOutcome::DroppedFireAndForget
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn fire_and_forget_is_queued_when_kept() {
        let mut queue: OfflineQueue<2> = OfflineQueue::new().with_keep_fire_and_forget(true);
        assert_eq!(
            queue.offer("dev-ab12/state", b"{}", QoS::AtMostOnce, false),
            QueueOutcome::Queued
        );
        assert_eq!(queue.front().map(|queued| queued.qos), Some(QoS::AtMostOnce));
    }

    #[test]
    fn duplicates_are_refused() {
        let mut queue: OfflineQueue<2> = OfflineQueue::new();
        assert_eq!(
            queue.offer("dev-ab12/a", b"1", QoS::AtLeastOnce, false),
            QueueOutcome::Queued
        );
        assert_eq!(
            queue.offer("dev-ab12/a", b"1", QoS::AtLeastOnce, true),
            QueueOutcome::Duplicate
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn same_topic_with_other_payload_is_not_a_duplicate() {
        let mut queue: OfflineQueue<2> = OfflineQueue::new();
        queue.offer("dev-ab12/a", b"1", QoS::AtLeastOnce, false);
        assert_eq!(
            queue.offer("dev-ab12/a", b"2", QoS::AtLeastOnce, false),
            QueueOutcome::Queued
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn full_queue_drops_oldest() {
        let mut queue: OfflineQueue<2> = OfflineQueue::new();
        queue.offer("t/1", b"1", QoS::AtLeastOnce, false);
        queue.offer("t/2", b"2", QoS::AtLeastOnce, false);
        assert_eq!(
            queue.offer("t/3", b"3", QoS::AtLeastOnce, false),
            QueueOutcome::EvictedOldest
        );
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_front().unwrap().topic, "t/2");
        assert_eq!(queue.pop_front().unwrap().topic, "t/3");
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut queue: OfflineQueue<2> = OfflineQueue::new();
        let payload = [0u8; MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            queue.offer("t", &payload, QoS::AtLeastOnce, false),
            QueueOutcome::TooLarge
        );
        assert!(queue.is_empty());
    }
}
