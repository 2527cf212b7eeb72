//! Node Coordination Module
//!
//! The core of the system: one `EchoNode` per process, owning its message log
//! and its role.
//!
//! ## Lifecycle
//! 1. **Discovery**: look up the well-known leader name. A live leader makes this
//!    node a replica (snapshot, register, subscribe, start the failure detector);
//!    otherwise it registers itself as leader.
//! 2. **Replication**: the leader appends then publishes every write; replicas
//!    append whatever the channel delivers.
//! 3. **Failover**: when the detector loses the leader, the election protocol
//!    lets the lowest live identifier take over the well-known name.
//!
//! ## Known Gaps
//! Two replicas that each see no lower live competitor can both claim leadership.
//! The last registration wins the well-known name; the other keeps believing it
//! leads until restarted. Replication is best-effort, so logs may diverge after a
//! failover.

pub mod detector;
pub mod election;
pub mod handlers;
pub mod peer;
pub mod protocol;
pub mod service;
pub mod types;
