//! Connection manager
//!
//! Owns the WiFi station, the broker session and everything that has to be
//! re-applied after a reconnect: the last will, the subscriptions and the
//! queue of messages published while offline.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::{
    BrokerConfig, DEFERRED_CAPACITY, DeviceInfo, LinkConfig, LinkTimings, MAX_ENTITIES,
    MAX_STATE_LEN, MAX_SUBSCRIPTIONS, QUEUE_CAPACITY, WifiConfig,
};
use crate::dispatch::Dispatcher;
use crate::error::{FatalError, Fault, SetupError};
use crate::ha::{EntityDescriptor, NetworkIdentity, build_config};
use crate::identity::DeviceIdentity;
use crate::link::deferred::{Deferred, DeferredPublishes};
use crate::link::queue::OfflineQueue;
use crate::link::state::{ConnectionState, LinkPhase};
use crate::ports::{
    BrokerSession, Indicator, LastWill, QoS, SessionOptions, WifiStation, WifiStatus,
};
use crate::topic::{Namespace, PAYLOAD_OFFLINE, PAYLOAD_ONLINE, STATE_SUFFIX};

/// Connection manager shared between the main loop and the watchdog
pub type SharedLink<'a, S, W, I> = Mutex<CriticalSectionRawMutex, ConnectionManager<'a, S, W, I>>;

/// Topic the device listens on, re-issued on every reconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription<'a> {
    pub topic_suffix: &'a str,
    /// Used verbatim instead of being scoped by the device identity
    pub is_absolute: bool,
}

/// What happened to a published message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the broker session
    Sent,
    /// Kept in the offline queue
    Queued,
    /// Discarded by the queue policy
    Dropped,
}

pub struct ConnectionManager<'a, S, W, I> {
    ns: Namespace<'a>,
    wifi_config: WifiConfig<'a>,
    broker: BrokerConfig<'a>,
    device: DeviceInfo<'a>,
    timings: LinkTimings,
    session: S,
    wifi: W,
    indicator: I,
    state: ConnectionState,
    subscriptions: Vec<Subscription<'a>, MAX_SUBSCRIPTIONS>,
    entities: Vec<EntityDescriptor<'a>, MAX_ENTITIES>,
    entities_announced: bool,
    queue: OfflineQueue<QUEUE_CAPACITY>,
    deferred: DeferredPublishes<DEFERRED_CAPACITY>,
}

impl<'a, S, W, I> ConnectionManager<'a, S, W, I>
where
    S: BrokerSession,
    W: WifiStation,
    I: Indicator,
{
    pub fn new(
        identity: &'a DeviceIdentity,
        config: LinkConfig<'a>,
        session: S,
        wifi: W,
        indicator: I,
    ) -> Self {
        Self {
            ns: Namespace::new(identity),
            wifi_config: config.wifi,
            broker: config.broker,
            device: config.device,
            timings: config.timings,
            session,
            wifi,
            indicator,
            state: ConnectionState::new(),
            subscriptions: Vec::new(),
            entities: Vec::new(),
            entities_announced: false,
            queue: OfflineQueue::new(),
            deferred: DeferredPublishes::new(),
        }
    }

    /// Bring the device online.
    ///
    /// Lights the indicator for the self-test duration, associates WiFi and
    /// opens the broker session. Only the association can fail here; a broker
    /// that is not reachable yet is left to the watchdog.
    pub async fn start<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), FatalError> {
        self.indicator.on();
        delay.delay_ms(millis(self.timings.self_test)).await;
        self.indicator.off();

        self.connect_wifi(delay).await?;

        if let Err(e) = self.connect_broker().await {
            warn!("link: broker not reachable at start-up: {}", e);
        }
        Ok(())
    }

    /// Associate with the configured access point.
    ///
    /// Polls the station status once per poll interval, blinking the
    /// indicator in between, up to the configured number of polls.
    pub async fn connect_wifi<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), FatalError> {
        info!("link: connecting to WiFi '{}'", self.wifi_config.ssid);
        self.wifi.begin(self.wifi_config.ssid, self.wifi_config.password);
        self.state.phase = LinkPhase::WifiConnecting;

        let polls = self.timings.association_polls;
        let blinks = self.timings.blink_hz.max(1);
        let blink_ms = millis(self.timings.association_poll_interval) / blinks;

        for poll in 1..=polls {
            let status = self.wifi.status();
            self.state.wifi_status = status;
            if status == WifiStatus::Up {
                self.state.phase = LinkPhase::WifiUp;
                self.indicator.off();
                info!("link: WiFi up, ip {:?}", self.wifi.ip_address());
                return Ok(());
            }
            debug!("link: waiting for WiFi ({}/{}), status {:?}", poll, polls, status);
            if poll == polls {
                break;
            }
            for _ in 0..blinks {
                self.indicator.toggle();
                delay.delay_ms(blink_ms).await;
            }
        }

        self.state.phase = LinkPhase::Disconnected;
        self.indicator.off();
        error!("link: WiFi did not come up after {} polls", polls);
        Err(FatalError::UnrecoverableAssociationFailure { polls })
    }

    /// Open the broker session.
    ///
    /// The last will (`offline` on the status topic, retained) is registered
    /// with the session; once connected the birth message `online` replaces it
    /// and every registered subscription is issued.
    pub async fn connect_broker(&mut self) -> Result<(), Fault<S::Error>> {
        self.state.wifi_status = self.wifi.status();
        if self.state.wifi_status != WifiStatus::Up {
            self.state.session_lost();
            warn!("link: WiFi is down ({:?}), broker connect skipped", self.state.wifi_status);
            return Err(Fault::NotConnected);
        }

        let status_topic = self.ns.status_topic();
        let options = SessionOptions {
            client_id: self.ns.identity().as_str(),
            host: self.broker.host,
            port: self.broker.port,
            username: self.broker.username,
            password: self.broker.password,
            keep_alive: self.broker.keep_alive,
            last_will: LastWill {
                topic: &status_topic,
                payload: PAYLOAD_OFFLINE.as_bytes(),
                qos: QoS::AtLeastOnce,
                retain: true,
            },
        };

        info!("link: connecting to broker {}:{}", self.broker.host, self.broker.port);
        self.state.phase = LinkPhase::BrokerConnecting;
        if let Err(e) = self.session.connect(&options).await {
            self.state.session_lost();
            return Err(Fault::TransientNetwork(e));
        }
        self.state.phase = LinkPhase::SessionEstablished;

        if let Err(e) = self
            .session
            .publish(&status_topic, PAYLOAD_ONLINE.as_bytes(), QoS::AtLeastOnce, true)
            .await
        {
            self.state.session_lost();
            return Err(Fault::TransientNetwork(e));
        }
        info!("link: session established as {}", self.ns.identity());
        self.subscribe_all().await
    }

    /// Publish on `{identity}/{suffix}` with QoS 0
    pub async fn publish(&mut self, suffix: &str, payload: &[u8], retain: bool) -> Delivery {
        self.publish_with_qos(suffix, payload, QoS::AtMostOnce, retain)
            .await
    }

    pub async fn publish_with_qos(
        &mut self,
        suffix: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Delivery {
        let topic = self.ns.qualify(suffix, false);
        self.send(&topic, payload, qos, retain).await
    }

    /// Publish the application state document.
    ///
    /// Does nothing unless the session is alive. Otherwise `online` goes to the
    /// status topic and the document to `{identity}/state`.
    pub async fn publish_status<T: Serialize>(&mut self, document: &T) {
        if !self.is_alive() {
            debug!("link: session not alive, status skipped");
            return;
        }
        match serde_json_core::to_vec::<_, MAX_STATE_LEN>(document) {
            Ok(json) => self.publish_status_json(&json).await,
            Err(e) => warn!("link: state document not serializable: {:?}", e),
        }
    }

    /// Same as [`Self::publish_status`] for an already serialized document
    pub async fn publish_status_json(&mut self, json: &[u8]) {
        if !self.is_alive() {
            debug!("link: session not alive, status skipped");
            return;
        }
        self.indicator.on();
        let status_topic = self.ns.status_topic();
        self.send(&status_topic, PAYLOAD_ONLINE.as_bytes(), QoS::AtMostOnce, true)
            .await;
        let state_topic = self.ns.qualify(STATE_SUFFIX, false);
        self.send(&state_topic, json, QoS::AtMostOnce, false).await;
        self.indicator.off();
    }

    /// Register a subscription and issue it right away when the session is up
    pub async fn subscribe(&mut self, suffix: &'a str, absolute: bool) -> Result<(), SetupError> {
        let subscription = Subscription {
            topic_suffix: suffix,
            is_absolute: absolute,
        };
        self.subscriptions
            .push(subscription)
            .map_err(|_| SetupError::TooManySubscriptions)?;

        if self.is_alive() {
            let topic = self.ns.qualify(suffix, absolute);
            if let Err(e) = self.session.subscribe(&topic).await {
                warn!("link: subscribe to '{}' failed: {:?}", topic, e);
                self.state.session_lost();
            }
        }
        Ok(())
    }

    /// Re-issue every registered subscription
    pub async fn subscribe_all(&mut self) -> Result<(), Fault<S::Error>> {
        for subscription in &self.subscriptions {
            let topic = self.ns.qualify(subscription.topic_suffix, subscription.is_absolute);
            if let Err(e) = self.session.subscribe(&topic).await {
                self.state.session_lost();
                return Err(Fault::TransientNetwork(e));
            }
            debug!("link: subscribed to '{}'", topic);
        }
        Ok(())
    }

    /// Add an entity to the discovery registry
    pub fn register_entity(&mut self, entity: EntityDescriptor<'a>) -> Result<(), SetupError> {
        if self.entities_announced {
            return Err(SetupError::RegistryFrozen);
        }
        self.entities
            .push(entity)
            .map_err(|_| SetupError::TooManyEntities)
    }

    /// Publish the discovery config of every registered entity.
    ///
    /// The registry does not accept new entities afterwards.
    pub async fn announce_entities(&mut self) -> Result<(), Fault<S::Error>> {
        self.entities_announced = true;
        let entities = self.entities.clone();
        for entity in &entities {
            self.publish_discovery(entity).await?;
        }
        info!("link: announced {} entities", entities.len());
        Ok(())
    }

    /// Publish the discovery config of one entity, retained
    pub async fn publish_discovery(
        &mut self,
        entity: &EntityDescriptor<'_>,
    ) -> Result<Delivery, Fault<S::Error>> {
        let network = NetworkIdentity {
            ip: self.wifi.ip_address(),
            mac: self.wifi.mac_address(),
        };
        let document = build_config(&self.ns, &self.device, &network, entity).map_err(|e| {
            error!("discovery: config for '{}' not built: {}", entity.discovery_key, e);
            Fault::Serialization
        })?;
        debug!("discovery: publishing '{}'", document.topic);
        Ok(self
            .send(&document.topic, &document.payload, QoS::AtLeastOnce, true)
            .await)
    }

    /// Name shown for the device in Home Assistant
    pub fn set_device_name(&mut self, name: &'a str) {
        self.device.name = name;
    }

    /// Run one iteration of the main loop.
    ///
    /// Polls one inbound message and dispatches it, performs the publishes
    /// its handler requested and drains the offline queue.
    pub async fn service(&mut self, dispatcher: &mut Dispatcher<'_>) {
        if self.is_alive() {
            let polled = match self.session.poll().await {
                Ok(Some(message)) => {
                    dispatcher.on_message(&message, &mut self.indicator, &mut self.deferred);
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            };
            if let Err(e) = polled {
                warn!("link: poll failed: {:?}", e);
                self.state.session_lost();
            }
        }
        self.flush_deferred().await;
        self.drain_queue().await;
    }

    /// Tear the session down and connect again
    pub async fn recover(&mut self) -> Result<(), Fault<S::Error>> {
        if let Err(e) = self.session.disconnect().await {
            debug!("link: disconnect failed: {:?}", e);
        }
        self.state.session_lost();
        self.connect_broker().await
    }

    /// Send queued messages while the session stays alive
    pub async fn drain_queue(&mut self) {
        while self.is_alive() {
            let Some(message) = self.queue.front() else {
                break;
            };
            let sent = self
                .session
                .publish(&message.topic, &message.payload, message.qos, message.retain)
                .await;
            match sent {
                Ok(()) => {
                    self.queue.pop_front();
                }
                Err(e) => {
                    warn!("link: queued publish failed: {:?}", e);
                    self.state.session_lost();
                    break;
                }
            }
        }
    }

    /// Session is established and answering keep-alives
    pub fn is_alive(&self) -> bool {
        self.state.broker_connected() && self.session.is_alive()
    }

    /// The watchdog has something to recover from
    pub fn connection_fault(&self) -> bool {
        !self.is_alive() || self.session.has_fault()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn namespace(&self) -> Namespace<'a> {
        self.ns
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn subscriptions(&self) -> &[Subscription<'a>] {
        &self.subscriptions
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Count one more faulted watchdog tick
    pub(crate) fn record_fault(&mut self) -> u32 {
        self.state.consecutive_fault_count = self.state.consecutive_fault_count.saturating_add(1);
        self.state.consecutive_fault_count
    }

    pub(crate) fn clear_faults(&mut self) {
        self.state.consecutive_fault_count = 0;
    }

    async fn send(&mut self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> Delivery {
        if self.is_alive() {
            match self.session.publish(topic, payload, qos, retain).await {
                Ok(()) => return Delivery::Sent,
                Err(e) => {
                    warn!("link: publish to '{}' failed: {:?}", topic, e);
                    self.state.session_lost();
                }
            }
        }
        let outcome = self.queue.offer(topic, payload, qos, retain);
        debug!("link: '{}' not sent: {:?}", topic, outcome);
        if outcome.is_queued() {
            Delivery::Queued
        } else {
            Delivery::Dropped
        }
    }

    async fn flush_deferred(&mut self) {
        for request in self.deferred.take() {
            match request {
                Deferred::Publish {
                    suffix,
                    payload,
                    retain,
                } => {
                    self.publish(&suffix, &payload, retain).await;
                }
                Deferred::Status { json } => self.publish_status_json(&json).await,
            }
        }
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
