use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::ClientId;

/// Details reported when the transport connects
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectInfo {
    /// Identity assigned to this client
    pub client: ClientId,
    /// Measured transport latency (ms)
    pub latency_ms: f64,
}

/// Details reported when the transport disconnects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectInfo {
    /// Human-readable reason
    pub reason: String,
    /// Whether the transport intends to reconnect on its own
    pub reconnect: bool,
}

/// Events delivered by the transport, in delivery order
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connection established
    Connected(ConnectInfo),
    /// Connection lost or closed
    Disconnected(DisconnectInfo),
    /// Channel subscription confirmed
    Subscribed {
        /// Channel name
        channel: String,
    },
    /// Channel subscription ended (including subscription errors)
    Unsubscribed {
        /// Channel name
        channel: String,
    },
    /// A message published on a subscribed channel
    Publication {
        /// Channel name
        channel: String,
        /// Identity of the publishing client
        sender: ClientId,
        /// Raw payload
        data: Value,
    },
}

/// Receiving end of a transport's event stream
pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// Publish/subscribe transport
///
/// Publishing is fire-and-forget; no delivery acknowledgment is modeled.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start connecting; completion is reported as `Connected`
    async fn connect(&self) -> Result<()>;

    /// Close the connection; reported as `Disconnected`
    async fn disconnect(&self) -> Result<()>;

    /// Subscribe to a channel; confirmed as `Subscribed`
    async fn subscribe(&self, channel: &str) -> Result<()>;

    /// Leave a channel; reported as `Unsubscribed`
    async fn unsubscribe(&self, channel: &str) -> Result<()>;

    /// Publish a payload to a channel
    async fn publish(&self, channel: &str, data: Value) -> Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn connect(&self) -> Result<()> {
        (**self).connect().await
    }

    async fn disconnect(&self) -> Result<()> {
        (**self).disconnect().await
    }

    async fn subscribe(&self, channel: &str) -> Result<()> {
        (**self).subscribe(channel).await
    }

    async fn unsubscribe(&self, channel: &str) -> Result<()> {
        (**self).unsubscribe(channel).await
    }

    async fn publish(&self, channel: &str, data: Value) -> Result<()> {
        (**self).publish(channel, data).await
    }
}
