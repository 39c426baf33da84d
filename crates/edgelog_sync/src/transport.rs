//! Transport layer abstraction for publishing.

use crate::config::PublishConfig;
use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Delivery guarantee requested for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QoS {
    /// Fire and forget.
    AtMostOnce = 0,
    /// Acknowledged delivery; duplicates are possible.
    AtLeastOnce = 1,
    /// Exactly-once handshake.
    ExactlyOnce = 2,
}

/// One message handed to the transport.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    /// Destination topic.
    pub topic: &'a str,
    /// Serialized payload.
    pub payload: &'a [u8],
    /// Delivery guarantee.
    pub qos: QoS,
    /// Whether the broker should retain the message.
    pub retained: bool,
}

/// Acknowledgment of a completed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryAck {
    /// Transport-assigned delivery token.
    pub token: u64,
}

/// A publish transport delivers messages to a broker.
///
/// Implementations own the network layer; the publisher only decides what
/// to send and when.
pub trait Transport: Send + Sync {
    /// Opens a broker session.
    fn connect(&self, config: &PublishConfig) -> SyncResult<()>;

    /// Delivers `message`, blocking until it is acknowledged or `timeout`
    /// elapses.
    fn publish(&self, message: &Message<'_>, timeout: Duration) -> SyncResult<DeliveryAck>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Closes the broker session, waiting at most `timeout`.
    fn disconnect(&self, timeout: Duration) -> SyncResult<()>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn connect(&self, config: &PublishConfig) -> SyncResult<()> {
        (**self).connect(config)
    }

    fn publish(&self, message: &Message<'_>, timeout: Duration) -> SyncResult<DeliveryAck> {
        (**self).publish(message, timeout)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn disconnect(&self, timeout: Duration) -> SyncResult<()> {
        (**self).disconnect(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn connect(&self, config: &PublishConfig) -> SyncResult<()> {
        (**self).connect(config)
    }

    fn publish(&self, message: &Message<'_>, timeout: Duration) -> SyncResult<DeliveryAck> {
        (**self).publish(message, timeout)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn disconnect(&self, timeout: Duration) -> SyncResult<()> {
        (**self).disconnect(timeout)
    }
}

/// A message recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    /// Destination topic.
    pub topic: String,
    /// Payload bytes.
    pub payload: Vec<u8>,
    /// Requested delivery guarantee.
    pub qos: QoS,
}

/// A mock transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    connected: AtomicBool,
    refuse_connect: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    attempts: AtomicUsize,
    next_token: AtomicU64,
    fail_attempts: Mutex<Vec<usize>>,
    delivered: Mutex<Vec<Delivered>>,
}

impl MockTransport {
    /// Creates a new, disconnected mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent connect fail.
    pub fn refuse_connect(&self, refuse: bool) {
        self.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    /// Makes the `n`-th publish attempt (1-based, counted over the mock's
    /// lifetime) time out.
    pub fn fail_attempt(&self, n: usize) {
        self.fail_attempts.lock().push(n);
    }

    /// Messages acknowledged so far, in order.
    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().clone()
    }

    /// Number of publish attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of connect calls.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of disconnect calls.
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn connect(&self, _config: &PublishConfig) -> SyncResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(SyncError::transport_fatal("connection refused"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn publish(&self, message: &Message<'_>, _timeout: Duration) -> SyncResult<DeliveryAck> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_attempts.lock().contains(&attempt) {
            return Err(SyncError::Timeout);
        }
        self.delivered.lock().push(Delivered {
            topic: message.topic.to_string(),
            payload: message.payload.to_vec(),
            qos: message.qos,
        });
        Ok(DeliveryAck {
            token: self.next_token.fetch_add(1, Ordering::SeqCst),
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&self, _timeout: Duration) -> SyncResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
