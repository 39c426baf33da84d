//! # edgelog sync
//!
//! Publishes local log entries to an upstream broker.
//!
//! The [`Publisher`] reads the entries a [`edgelog_core::LocalLog`] has not
//! yet published, hands each one to a [`Transport`] as a JSON document and
//! advances the log's persistent publish cursor after every acknowledged
//! delivery.
//!
//! Two transports ship with the crate:
//!
//! - [`SpoolTransport`] writes each delivery as a file under a directory,
//!   for a forwarding daemon to pick up.
//! - [`MockTransport`] records deliveries in memory and can inject failures.
//!
//! ## Key Invariants
//!
//! - Entries are delivered in sequence order
//! - The cursor only advances past acknowledged entries
//! - A failed run can be resumed without resending acknowledged entries

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod publisher;
mod spool;
mod transport;

pub use config::{PublishConfig, RetryConfig};
pub use error::{SyncError, SyncResult};
pub use publisher::{PublishReport, Publisher};
pub use spool::SpoolTransport;
pub use transport::{Delivered, DeliveryAck, Message, MockTransport, QoS, Transport};
