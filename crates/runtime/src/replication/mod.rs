//! Server-to-observer state replication.
//!
//! The server is the sole writer of every replicated field. Each write bumps
//! that field's version and is broadcast on [`Topic::State`]; observers keep
//! an [`ObserverReplica`] that applies only writes newer than what it holds,
//! so duplicate or replayed deliveries are harmless and per-field order is
//! preserved.
//!
//! [`Topic::State`]: crate::events::Topic::State

mod cell;
mod channel;
mod replica;

pub use cell::ReplicatedCell;
pub use channel::{ActorProfile, FieldUpdate, ReplicationChannel, ReplicationSnapshot};
pub use replica::{ActorView, ObserverReplica};
