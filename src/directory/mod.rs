//! Directory Module
//!
//! Name -> endpoint bindings used for leader discovery and election.
//!
//! ## Naming Scheme
//! - The leader always registers under the well-known name (`LEADER_NAME`).
//! - Each replica registers under `replica_<uuid>`, so peers can recover its
//!   identifier from the directory listing alone.
//!
//! ## Submodules
//! - **`client`**: The `Directory` contract plus the HTTP client used by nodes.
//! - **`memory`**: In-memory bindings, backing both the registry server and tests.
//! - **`handlers`**: Axum handlers exposing the in-memory bindings over HTTP.
//! - **`protocol`**: Endpoint paths and DTOs.
//! - **`types`**: Endpoint type and name helpers.

pub mod client;
pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod types;
