//! Straight-line movement used by the headless server.
//!
//! Real path-finding is an external collaborator; this navigator walks each
//! agent directly towards its destination at a fixed speed and refuses
//! destinations that sit inside an obstacle.

use std::collections::HashMap;

use tracing::trace;

use tactics_core::{ActorId, Navigator, Obstacle, Point};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Walk {
    at: Point,
    destination: Point,
}

#[derive(Clone, Debug)]
pub struct StraightLineNavigator {
    /// World units per second.
    speed: f32,
    obstacles: Vec<Obstacle>,
    walks: HashMap<ActorId, Walk>,
}

impl StraightLineNavigator {
    pub const DEFAULT_SPEED: f32 = 4.0;

    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self::with_speed(obstacles, Self::DEFAULT_SPEED)
    }

    pub fn with_speed(obstacles: Vec<Obstacle>, speed: f32) -> Self {
        Self {
            speed: speed.max(f32::EPSILON),
            obstacles,
            walks: HashMap::new(),
        }
    }
}

impl Default for StraightLineNavigator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Navigator for StraightLineNavigator {
    fn compute_path(&mut self, actor: ActorId, origin: Point, destination: Point) -> bool {
        if self
            .obstacles
            .iter()
            .any(|obstacle| obstacle.contains(destination))
        {
            return false;
        }
        self.walks.insert(
            actor,
            Walk {
                at: origin,
                destination,
            },
        );
        true
    }

    fn is_moving(&self, actor: ActorId) -> bool {
        self.walks.contains_key(&actor)
    }

    fn remaining_distance(&self, actor: ActorId) -> f32 {
        self.walks
            .get(&actor)
            .map_or(0.0, |walk| walk.at.distance(walk.destination))
    }

    fn position(&self, actor: ActorId) -> Option<Point> {
        self.walks.get(&actor).map(|walk| walk.at)
    }

    fn cancel(&mut self, actor: ActorId) {
        self.walks.remove(&actor);
    }

    fn advance(&mut self, delta: f32) {
        let step = self.speed * delta.max(0.0);
        for (actor, walk) in &mut self.walks {
            walk.at = walk.at.move_towards(walk.destination, step);
            trace!(target: "runtime::navigation", actor = %actor, at = %walk.at, "walking");
        }
        self.walks.retain(|_, walk| walk.at != walk.destination);
    }
}
