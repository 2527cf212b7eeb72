//! Replication Channel Module
//!
//! Topic-based publish/subscribe used to push accepted writes from the leader to
//! every subscribed replica.
//!
//! ## Delivery Semantics
//! - Fire-and-forget publish: no delivery confirmation reaches the publisher.
//! - Each subscriber sees payloads in the order the transport hands them over.
//! - No persistence, deduplication or gap detection. A dropped or duplicated
//!   payload surfaces as a log inconsistency on the replica.
//!
//! ## Submodules
//! - **`channel`**: The `ReplicationChannel` contract and delivery handler type.
//! - **`event`**: The replication event carried in each payload.
//! - **`memory`**: In-process broker built on `tokio::sync::broadcast`.
//! - **`http`**: Node-side channel talking to the registry's broker.
//! - **`broker`**: Registry-side fan-out to subscriber callback URLs.
//! - **`handlers`** / **`protocol`**: HTTP surface of the broker.

pub mod broker;
pub mod channel;
pub mod event;
pub mod handlers;
pub mod http;
pub mod memory;
pub mod protocol;

#[cfg(test)]
mod tests;
