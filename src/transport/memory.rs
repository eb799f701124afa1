//! In-process publish/subscribe broker
//!
//! Stands in for the hosted pub/sub service in tests and demos. It keeps
//! the properties the protocol relies on:
//!
//! - every publication carries the publisher's client identity;
//! - publications are delivered to every subscriber of the channel,
//!   including the publisher itself;
//! - delivery per subscriber is FIFO, optionally delayed or lossy
//!   according to a [`NetworkSimulator`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{ConnectInfo, DisconnectInfo, Transport, TransportEvent, TransportEvents};
use crate::error::{PlaysyncError, Result};
use crate::testing::NetworkSimulator;
use crate::types::ClientId;

type Delivery = (Instant, TransportEvent);

#[derive(Debug)]
struct Subscriber {
    client: ClientId,
    queue: mpsc::UnboundedSender<Delivery>,
}

#[derive(Debug, Default)]
struct BrokerState {
    channels: HashMap<String, Vec<Subscriber>>,
}

/// Shared in-memory broker
///
/// Cheap to clone; all clones route through the same channels.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
    simulator: NetworkSimulator,
}

impl MemoryBroker {
    /// Create a broker with perfect delivery
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a broker applying channel conditions to every delivery
    #[must_use]
    pub fn with_simulator(simulator: NetworkSimulator) -> Self {
        Self {
            state: Arc::default(),
            simulator,
        }
    }

    /// Create a client transport and its event stream
    #[must_use]
    pub fn transport(&self) -> (MemoryTransport, TransportEvents) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = MemoryTransport {
            broker: self.clone(),
            events: events_tx,
            link: Mutex::new(None),
        };
        (transport, events_rx)
    }

    /// Number of subscribers on a channel
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.lock().channels.get(channel).map_or(0, Vec::len)
    }

    /// Publish on behalf of an arbitrary client identity
    ///
    /// Useful for injecting third-party traffic in tests.
    pub fn inject(&self, channel: &str, sender: &ClientId, data: Value) {
        self.route(channel, sender, data);
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn route(&self, channel: &str, sender: &ClientId, data: Value) {
        let mut state = self.lock();
        let Some(subscribers) = state.channels.get_mut(channel) else {
            tracing::trace!(channel, "publication on channel without subscribers");
            return;
        };

        // Drop subscribers whose delivery task is gone
        subscribers.retain(|s| !s.queue.is_closed());

        for subscriber in subscribers.iter() {
            if self.simulator.should_drop() {
                tracing::trace!(channel, to = %subscriber.client, "publication dropped");
                continue;
            }
            let due = Instant::now() + self.simulator.get_delay();
            let event = TransportEvent::Publication {
                channel: channel.to_string(),
                sender: sender.clone(),
                data: data.clone(),
            };
            let _ = subscriber.queue.send((due, event));
        }
    }

    fn add_subscriber(&self, channel: &str, subscriber: Subscriber) {
        let mut state = self.lock();
        let subscribers = state.channels.entry(channel.to_string()).or_default();
        subscribers.retain(|s| s.client != subscriber.client);
        subscribers.push(subscriber);
    }

    fn remove_subscriber(&self, channel: &str, client: &ClientId) -> bool {
        let mut state = self.lock();
        let Some(subscribers) = state.channels.get_mut(channel) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| &s.client != client);
        before != subscribers.len()
    }

    fn remove_client(&self, client: &ClientId) -> Vec<String> {
        let mut state = self.lock();
        let mut left = Vec::new();
        for (channel, subscribers) in &mut state.channels {
            let before = subscribers.len();
            subscribers.retain(|s| &s.client != client);
            if before != subscribers.len() {
                left.push(channel.clone());
            }
        }
        left
    }
}

/// Live connection state of one client
#[derive(Debug)]
struct Link {
    client: ClientId,
    queue: mpsc::UnboundedSender<Delivery>,
    delivery: JoinHandle<()>,
}

/// One client's connection to a [`MemoryBroker`]
#[derive(Debug)]
pub struct MemoryTransport {
    broker: MemoryBroker,
    events: mpsc::UnboundedSender<TransportEvent>,
    link: Mutex<Option<Link>>,
}

impl MemoryTransport {
    /// Client identity of the current connection
    #[must_use]
    pub fn client_id(&self) -> Option<ClientId> {
        self.lock_link().as_ref().map(|link| link.client.clone())
    }

    /// Simulate the server dropping this connection
    pub fn sever(&self, reason: &str) {
        self.close(reason, true);
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TransportEvent) {
        // The session may already have stopped listening
        let _ = self.events.send(event);
    }

    fn connected(&self) -> Result<(ClientId, mpsc::UnboundedSender<Delivery>)> {
        self.lock_link()
            .as_ref()
            .map(|link| (link.client.clone(), link.queue.clone()))
            .ok_or_else(|| PlaysyncError::Transport {
                message: "not connected".to_string(),
                source: None,
            })
    }

    fn close(&self, reason: &str, reconnect: bool) {
        let Some(link) = self.lock_link().take() else {
            return;
        };
        // Pending deliveries die with the connection
        link.delivery.abort();
        for channel in self.broker.remove_client(&link.client) {
            self.emit(TransportEvent::Unsubscribed { channel });
        }
        tracing::debug!(client = %link.client, reason, "memory transport closed");
        self.emit(TransportEvent::Disconnected(DisconnectInfo {
            reason: reason.to_string(),
            reconnect,
        }));
    }
}

/// Forward queued deliveries in order, each no earlier than its due time
async fn deliver(
    mut queue: mpsc::UnboundedReceiver<Delivery>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some((due, event)) = queue.recv().await {
        tokio::time::sleep_until(due).await;
        if events.send(event).is_err() {
            break;
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self) -> Result<()> {
        let client = {
            let mut link = self.lock_link();
            if link.is_some() {
                return Ok(());
            }
            let client = ClientId::new(uuid::Uuid::new_v4().to_string());
            let (queue_tx, queue_rx) = mpsc::unbounded_channel();
            let delivery = tokio::spawn(deliver(queue_rx, self.events.clone()));
            *link = Some(Link {
                client: client.clone(),
                queue: queue_tx,
                delivery,
            });
            client
        };

        tracing::debug!(client = %client, "memory transport connected");
        self.emit(TransportEvent::Connected(ConnectInfo {
            client,
            latency_ms: self.broker.simulator.nominal_latency_ms(),
        }));
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.close("client disconnect", false);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<()> {
        let (client, queue) = self.connected()?;
        self.broker.add_subscriber(channel, Subscriber { client, queue });
        self.emit(TransportEvent::Subscribed {
            channel: channel.to_string(),
        });
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<()> {
        let (client, _) = self.connected()?;
        if self.broker.remove_subscriber(channel, &client) {
            self.emit(TransportEvent::Unsubscribed {
                channel: channel.to_string(),
            });
        }
        Ok(())
    }

    async fn publish(&self, channel: &str, data: Value) -> Result<()> {
        let (client, _) = self.connected()?;
        self.broker.route(channel, &client, data);
        Ok(())
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        if let Some(link) = self.lock_link().take() {
            link.delivery.abort();
            self.broker.remove_client(&link.client);
        }
    }
}
