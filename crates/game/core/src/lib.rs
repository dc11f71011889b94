//! Deterministic match rules for two-team turn-based tactics.
//!
//! `tactics-core` owns the authoritative model (actors, rosters, turn state)
//! and exposes pure, single-threaded APIs that the runtime hosts. All state
//! mutation flows through [`engine::TurnCoordinator`]; every replicated write
//! and observer cue it makes is surfaced as a [`MatchEvent`].
pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod navigation;
pub mod state;
pub mod validator;

pub use action::{Ack, ActionKind, ActionRequest};
pub use config::{MatchRules, TimerScope};
pub use engine::{PendingEndTurn, TurnCoordinator};
pub use error::{ActionError, RejectionCategory, SetupError};
pub use event::{FieldKey, MatchEvent, Notification, StateChange};
pub use navigation::{InstantNavigator, Navigator};
pub use state::{
    ActionFlags, ActorId, ActorState, Archetype, DamageOutcome, MatchResult, MatchSetup,
    MatchState, Phase, Point, TeamId, TurnState, UnitStats,
};
pub use validator::{Obstacle, attack_candidates, has_line_of_sight, in_range};
