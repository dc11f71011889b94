//! Navigation collaborator consumed by the coordinator.
//!
//! Path-finding lives outside this crate. The coordinator only starts moves
//! and polls their progress once per tick; it never blocks on a walk.

use crate::state::{ActorId, Point};

pub trait Navigator {
    /// Plans a path and, when reachable, starts walking `actor` towards
    /// `destination`. Returns whether the destination is reachable.
    fn compute_path(&mut self, actor: ActorId, origin: Point, destination: Point) -> bool;

    fn is_moving(&self, actor: ActorId) -> bool;

    fn remaining_distance(&self, actor: ActorId) -> f32;

    /// Current position of a walking actor, if the navigator tracks one.
    fn position(&self, _actor: ActorId) -> Option<Point> {
        None
    }

    /// Stops any walk in progress (e.g. the actor was eliminated).
    fn cancel(&mut self, _actor: ActorId) {}

    /// Advances simulated movement by `delta` seconds.
    fn advance(&mut self, _delta: f32) {}
}

/// Navigator whose moves complete immediately and always succeed.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantNavigator;

impl Navigator for InstantNavigator {
    fn compute_path(&mut self, _actor: ActorId, _origin: Point, _destination: Point) -> bool {
        true
    }

    fn is_moving(&self, _actor: ActorId) -> bool {
        false
    }

    fn remaining_distance(&self, _actor: ActorId) -> f32 {
        0.0
    }
}
