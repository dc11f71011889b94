//! Per-unit authoritative state.
//!
//! An actor only ever changes through the validated entry points below; the
//! coordinator drives them and nothing mutates another actor's fields
//! directly.

use bitflags::bitflags;

use super::{ActorId, Point, TeamId};
use crate::action::ActionKind;
use crate::config::MatchRules;
use crate::error::ActionError;
use crate::validator::{self, Obstacle};

bitflags! {
    /// Actions spent during the actor's current activation.
    ///
    /// Flags are monotonic within a turn and cleared only by
    /// [`ActorState::begin_activation`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ActionFlags: u8 {
        const MOVED = 1 << 0;
        const ATTACKED = 1 << 1;
    }
}

impl ActionFlags {
    /// Flag spent by an action kind; `EndTurn` spends nothing.
    pub const fn for_kind(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Move => Self::MOVED,
            ActionKind::Attack => Self::ATTACKED,
            ActionKind::EndTurn => Self::empty(),
        }
    }
}

/// Immutable stat block selected by [`Archetype`] at creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitStats {
    /// Movement budget in tiles.
    pub move_range: u32,
    /// Attack reach in world units.
    pub attack_range: u32,
    pub max_health: u32,
}

/// Unit kinds. They differ only in their stat block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Archetype {
    #[default]
    Standard,
    ShortRange,
    LongRange,
}

impl Archetype {
    pub const fn stats(self) -> UnitStats {
        match self {
            Archetype::Standard => UnitStats {
                move_range: 3,
                attack_range: 1,
                max_health: 10,
            },
            Archetype::ShortRange => UnitStats {
                move_range: 6,
                attack_range: 2,
                max_health: 6,
            },
            Archetype::LongRange => UnitStats {
                move_range: 4,
                attack_range: 10,
                max_health: 3,
            },
        }
    }
}

/// Result of [`ActorState::take_damage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageOutcome {
    pub remaining: u32,
    /// True only on the hit that brought health to zero.
    pub died: bool,
}

/// Authoritative state of a single unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorState {
    pub id: ActorId,
    pub team: TeamId,
    pub archetype: Archetype,
    pub stats: UnitStats,
    pub position: Point,
    pub health: u32,
    pub flags: ActionFlags,
    /// Destination of an in-flight move; cleared once navigation reports arrival.
    pub destination: Option<Point>,
}

impl ActorState {
    pub fn new(id: ActorId, team: TeamId, archetype: Archetype, position: Point) -> Self {
        let stats = archetype.stats();
        Self {
            id,
            team,
            archetype,
            stats,
            position,
            health: stats.max_health,
            flags: ActionFlags::empty(),
            destination: None,
        }
    }

    /// Overrides the archetype's stat block (used by custom rosters and tests).
    pub fn with_stats(mut self, stats: UnitStats) -> Self {
        self.stats = stats;
        self.health = stats.max_health;
        self
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.destination.is_some()
    }

    #[inline]
    pub fn has_moved(&self) -> bool {
        self.flags.contains(ActionFlags::MOVED)
    }

    #[inline]
    pub fn has_attacked(&self) -> bool {
        self.flags.contains(ActionFlags::ATTACKED)
    }

    /// Clears per-turn flags. Called exactly once, when this actor's own turn starts.
    pub(crate) fn begin_activation(&mut self) {
        self.flags = ActionFlags::empty();
    }

    pub(crate) fn mark_used(&mut self, kind: ActionKind) {
        self.flags.insert(ActionFlags::for_kind(kind));
    }

    /// Validates a move request against the per-turn flag and the movement budget.
    pub fn check_move(&self, target: Point, rules: &MatchRules) -> Result<(), ActionError> {
        if self.has_moved() {
            return Err(ActionError::MoveAlreadyUsed);
        }
        if !validator::within_move_budget(
            self.position,
            target,
            self.stats.move_range,
            rules.tile_size,
            rules.unlimited_movement,
        ) {
            return Err(ActionError::MoveOutOfRange);
        }
        Ok(())
    }

    /// Validates an attack on `target`: flag, team, range, then line of sight.
    pub fn check_attack(
        &self,
        target: &ActorState,
        obstacles: &[Obstacle],
        rules: &MatchRules,
    ) -> Result<(), ActionError> {
        if self.has_attacked() {
            return Err(ActionError::AttackAlreadyUsed);
        }
        if target.id == self.id {
            return Err(ActionError::SelfTarget);
        }
        if !target.is_alive() {
            return Err(ActionError::UnknownTarget { target: target.id });
        }
        if target.team == self.team {
            return Err(ActionError::TargetIsAlly { target: target.id });
        }
        if !validator::in_range(self.position, target.position, self.stats.attack_range as f32) {
            return Err(ActionError::OutOfRange);
        }
        if !validator::has_line_of_sight(self.position, target.position, obstacles, rules.eye_height)
        {
            return Err(ActionError::LineOfSightBlocked);
        }
        Ok(())
    }

    pub(crate) fn begin_move(&mut self, destination: Point) {
        self.destination = Some(destination);
    }

    /// Completes an in-flight move, snapping to the destination.
    pub(crate) fn finish_move(&mut self) {
        if let Some(destination) = self.destination.take() {
            self.position = destination;
        }
    }

    /// Applies damage with a floor of zero.
    pub(crate) fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        let was_alive = self.is_alive();
        self.health = self.health.saturating_sub(amount);
        DamageOutcome {
            remaining: self.health,
            died: was_alive && !self.is_alive(),
        }
    }

    /// Marks the actor logically dead; it keeps its slot in the registry as a
    /// tombstone so late requests resolve to `UnknownTarget`.
    pub(crate) fn die(&mut self) {
        debug_assert_eq!(self.health, 0, "die() called on a living actor");
        self.health = 0;
        self.destination = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: u32, team: TeamId, x: f32, z: f32) -> ActorState {
        ActorState::new(ActorId(id), team, Archetype::Standard, Point::ground(x, z))
    }

    #[test]
    fn damage_clamps_at_zero_and_reports_death_once() {
        let mut target = actor(1, TeamId::One, 0.0, 0.0).with_health(2);

        let first = target.take_damage(1);
        assert_eq!(first, DamageOutcome { remaining: 1, died: false });

        let second = target.take_damage(5);
        assert_eq!(second, DamageOutcome { remaining: 0, died: true });

        let third = target.take_damage(1);
        assert_eq!(third, DamageOutcome { remaining: 0, died: false });
    }

    #[test]
    fn move_is_checked_against_budget_and_flag() {
        let rules = MatchRules::default();
        let mut unit = actor(1, TeamId::Zero, 0.0, 0.0);

        assert_eq!(unit.check_move(Point::ground(3.0, 0.0), &rules), Ok(()));
        assert_eq!(
            unit.check_move(Point::ground(3.5, 0.0), &rules),
            Err(ActionError::MoveOutOfRange)
        );

        unit.mark_used(ActionKind::Move);
        assert_eq!(
            unit.check_move(Point::ground(1.0, 0.0), &rules),
            Err(ActionError::MoveAlreadyUsed)
        );

        unit.begin_activation();
        assert!(!unit.has_moved());
    }

    #[test]
    fn unlimited_movement_ignores_budget() {
        let rules = MatchRules {
            unlimited_movement: true,
            ..MatchRules::default()
        };
        let unit = actor(1, TeamId::Zero, 0.0, 0.0);

        assert_eq!(unit.check_move(Point::ground(250.0, 0.0), &rules), Ok(()));
    }

    #[test]
    fn attack_rejects_allies_and_self() {
        let rules = MatchRules::default();
        let attacker = actor(1, TeamId::Zero, 0.0, 0.0);
        let ally = actor(2, TeamId::Zero, 1.0, 0.0);

        assert_eq!(
            attacker.check_attack(&ally, &[], &rules),
            Err(ActionError::TargetIsAlly { target: ActorId(2) })
        );
        assert_eq!(
            attacker.check_attack(&attacker.clone(), &[], &rules),
            Err(ActionError::SelfTarget)
        );
    }

    #[test]
    fn archetypes_carry_distinct_stats() {
        assert_eq!(Archetype::ShortRange.stats().move_range, 6);
        assert_eq!(Archetype::LongRange.stats().attack_range, 10);
        assert_eq!(Archetype::Standard.stats().max_health, 10);
    }
}
