//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from match setup, worker coordination and observer streams
//! so clients can bubble them up with consistent context. Per-request
//! rejections are not errors here: they come back as [`tactics_core::Ack`].
use thiserror::Error;
use tokio::sync::oneshot;

use tactics_core::{SetupError, TeamId};

use crate::session::ConnectionId;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to start match")]
    Setup(#[from] SetupError),

    #[error("runtime requires a match setup before building")]
    MissingSetup,

    #[error("server worker command channel closed")]
    CommandChannelClosed,

    #[error("server worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("server worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("{team} is already owned by another connection")]
    TeamAlreadyOwned { team: TeamId },

    #[error("connection {connection} is not registered")]
    UnknownConnection { connection: ConnectionId },

    #[error("replica has no resolvable active actor")]
    NoActiveActor,

    #[error("observer event stream closed")]
    EventStreamClosed,

    #[error("failed to encode or decode wire message")]
    Wire(#[from] serde_json::Error),
}
