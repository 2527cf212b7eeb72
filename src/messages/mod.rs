//! Message Log Module
//!
//! The append-only, in-memory record of every message a node has accepted or
//! received through replication.
//!
//! Insertion order is arrival order at the owning node. The log is not shared:
//! each `EchoNode` owns exactly one and guards it together with its role.

pub mod log;
