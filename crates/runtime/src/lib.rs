//! Runtime orchestration for a server-authoritative tactical match.
//!
//! This crate wraps the deterministic [`tactics_core::TurnCoordinator`] in a
//! single server task, replicates its state to observers, and gives clients a
//! cloneable [`RuntimeHandle`] to submit requests and follow the match.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based bus behind observer feeds
//! - [`replication`] versions replicated fields and keeps observer replicas
//! - [`client`] and [`wire`] are the observer side and its message framing
//! - `workers` keeps the server task internal to the crate
pub mod api;
pub mod client;
pub mod config;
pub mod events;
pub mod navigation;
pub mod replication;
pub mod runtime;
pub mod session;
pub mod wire;

mod workers;

pub use api::{
    AckTicket, ActionProvider, PassProvider, Result, RuntimeError, RuntimeHandle,
    SkirmishProvider, TurnContext,
};
pub use client::ObserverClient;
pub use config::{RuntimeConfig, TickMode};
pub use events::{Event, EventBus, Topic};
pub use navigation::StraightLineNavigator;
pub use replication::{
    ActorProfile, ActorView, FieldUpdate, ObserverReplica, ReplicatedCell, ReplicationChannel,
    ReplicationSnapshot,
};
pub use runtime::{Runtime, RuntimeBuilder};
pub use session::{Connection, ConnectionId, SessionRegistry};
pub use wire::{ClientMessage, ServerMessage, WireSession};
