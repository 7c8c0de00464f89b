//! # backend_net
//!
//! NATS transport layer for the game backend.
//!
//! This crate provides:
//!
//! - [`subjects`]: NATS subject builders.
//! - [`codec`]: MessagePack serialisation/deserialisation helpers.
//! - [`connection`]: NATS connection management.
//! - [`transport`]: byte transports, including a broker-free loopback.
//! - [`caller`]: the network [`FacetCaller`](backend_facet::FacetCaller) strategy.
//! - [`server`]: the facet call serve loop.
//! - [`error`]: Network-layer error types.

pub mod caller;
pub mod codec;
pub mod connection;
pub mod error;
pub mod server;
pub mod subjects;
pub mod transport;

pub use caller::NetworkCaller;
pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use server::FacetServer;
pub use transport::{Loopback, NatsTransport, Transport};
