//! Geometric action legality checks.
//!
//! Every function here is pure and side-effect free. The coordinator, the
//! actor checks and any client-side predictive preview call them with the
//! same inputs, so server enforcement and local previews always agree.

use glam::Vec3;

use crate::state::{ActorId, ActorState, MatchState, Point};

/// Tolerance absorbing floating point and grid rounding in range checks.
pub const RANGE_EPSILON: f32 = 1e-3;

/// Axis-aligned box that blocks line of sight and movement destinations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    pub min: Point,
    pub max: Point,
}

impl Obstacle {
    /// Builds a box from two opposite corners in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point(a.0.min(b.0)),
            max: Point(a.0.max(b.0)),
        }
    }

    /// Box standing on the ground, centred on `center` with the given footprint.
    pub fn pillar(center: Point, half_width: f32, half_depth: f32, height: f32) -> Self {
        Self::new(
            Point::new(center.x - half_width, 0.0, center.z - half_depth),
            Point::new(center.x + half_width, height, center.z + half_depth),
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        (point.0.cmpge(self.min.0) & point.0.cmple(self.max.0)).all()
    }

    /// Slab test: does the segment `from..=to` touch this box?
    pub fn intersects_segment(&self, from: Point, to: Point) -> bool {
        let origin = from.0;
        let delta = to.0 - origin;
        let parallel = delta.abs().cmple(Vec3::splat(f32::EPSILON));

        // Axes the segment runs parallel to must already lie within the slab.
        let inside = origin.cmpge(self.min.0) & origin.cmple(self.max.0);
        if (parallel & !inside).any() {
            return false;
        }

        let inv = delta.recip();
        let t0 = (self.min.0 - origin) * inv;
        let t1 = (self.max.0 - origin) * inv;
        let enter = Vec3::select(parallel, Vec3::NEG_INFINITY, t0.min(t1));
        let exit = Vec3::select(parallel, Vec3::INFINITY, t0.max(t1));

        enter.max_element().max(0.0) <= exit.min_element().min(1.0)
    }
}

/// Euclidean distance check with [`RANGE_EPSILON`] slack.
pub fn in_range(origin: Point, target: Point, range: f32) -> bool {
    origin.distance(target) <= range + RANGE_EPSILON
}

/// True iff no obstacle intersects the segment between the two points, both
/// lifted by `eye_height`.
pub fn has_line_of_sight(
    origin: Point,
    target: Point,
    obstacles: &[Obstacle],
    eye_height: f32,
) -> bool {
    let from = origin.raised(eye_height);
    let to = target.raised(eye_height);
    !obstacles
        .iter()
        .any(|obstacle| obstacle.intersects_segment(from, to))
}

/// Movement budget check: `distance <= move_range * tile_size`, or always
/// true when movement is unlimited.
pub fn within_move_budget(
    origin: Point,
    target: Point,
    move_range: u32,
    tile_size: f32,
    unlimited: bool,
) -> bool {
    unlimited || in_range(origin, target, move_range as f32 * tile_size)
}

/// Living enemies of `attacker` that are both in attack range and visible.
///
/// Sorted by distance, nearest first. Dead actors never appear.
pub fn attack_candidates(attacker: &ActorState, state: &MatchState) -> Vec<ActorId> {
    let mut candidates: Vec<(f32, ActorId)> = state
        .living(attacker.team.other())
        .filter(|enemy| {
            in_range(
                attacker.position,
                enemy.position,
                attacker.stats.attack_range as f32,
            ) && has_line_of_sight(
                attacker.position,
                enemy.position,
                &state.obstacles,
                state.rules.eye_height,
            )
        })
        .map(|enemy| (attacker.position.distance(enemy.position), enemy.id))
        .collect();

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    candidates.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_between() -> Obstacle {
        // Thin wall across the x axis at z = 5, two units tall.
        Obstacle::new(Point::new(-3.0, 0.0, 4.9), Point::new(3.0, 2.0, 5.1))
    }

    #[test]
    fn in_range_absorbs_rounding() {
        let origin = Point::ground(0.0, 0.0);
        assert!(in_range(origin, Point::ground(3.0, 0.0), 3.0));
        assert!(in_range(origin, Point::ground(3.0005, 0.0), 3.0));
        assert!(!in_range(origin, Point::ground(3.1, 0.0), 3.0));
    }

    #[test]
    fn wall_blocks_line_of_sight() {
        let obstacles = [wall_between()];
        let a = Point::ground(0.0, 0.0);
        let b = Point::ground(0.0, 10.0);

        assert!(!has_line_of_sight(a, b, &obstacles, 1.0));
        assert!(has_line_of_sight(a, b, &[], 1.0));
    }

    #[test]
    fn low_wall_does_not_block_above_eye_height() {
        let low = Obstacle::new(Point::new(-3.0, 0.0, 4.9), Point::new(3.0, 0.5, 5.1));
        let a = Point::ground(0.0, 0.0);
        let b = Point::ground(0.0, 10.0);

        assert!(has_line_of_sight(a, b, &[low], 1.0));
    }

    #[test]
    fn segment_passing_beside_box_is_clear() {
        let obstacles = [wall_between()];
        let a = Point::ground(5.0, 0.0);
        let b = Point::ground(5.0, 10.0);

        assert!(has_line_of_sight(a, b, &obstacles, 1.0));
    }

    #[test]
    fn segment_ending_before_box_is_clear() {
        let obstacles = [wall_between()];
        let a = Point::ground(0.0, 0.0);
        let b = Point::ground(0.0, 4.0);

        assert!(has_line_of_sight(a, b, &obstacles, 1.0));
    }

    #[test]
    fn move_budget_scales_with_tile_size() {
        let origin = Point::ground(0.0, 0.0);
        let target = Point::ground(5.0, 0.0);

        assert!(!within_move_budget(origin, target, 3, 1.0, false));
        assert!(within_move_budget(origin, target, 3, 2.0, false));
        assert!(within_move_budget(origin, Point::ground(500.0, 0.0), 3, 1.0, true));
    }

    #[test]
    fn diagonal_segment_through_a_corner_is_blocked() {
        let pillar = Obstacle::pillar(Point::ground(2.0, 2.0), 0.5, 0.5, 2.0);
        let a = Point::ground(0.0, 0.0);
        let b = Point::ground(4.0, 4.0);

        assert!(!has_line_of_sight(a, b, &[pillar], 1.0));
        assert!(has_line_of_sight(a, Point::ground(4.0, 0.0), &[pillar], 1.0));
    }

    #[test]
    fn obstacle_contains_is_inclusive() {
        let pillar = Obstacle::pillar(Point::ground(0.0, 0.0), 1.0, 1.0, 2.0);
        assert!(pillar.contains(Point::ground(1.0, 1.0)));
        assert!(!pillar.contains(Point::ground(1.5, 0.0)));
    }
}
