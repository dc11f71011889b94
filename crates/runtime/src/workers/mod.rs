//! Worker tasks that back the runtime orchestration.
//!
//! The server worker is the single execution context allowed to touch the
//! authoritative match.

mod server;

pub use server::{Command, ServerWorker};
