use std::collections::BTreeMap;

use tracing::debug;

use tactics_core::{
    ActorId, Archetype, FieldKey, MatchRules, Obstacle, Phase, Point, StateChange, TeamId,
    UnitStats, validator,
};

use super::cell::ReplicatedCell;
use super::channel::{ActorProfile, FieldUpdate, ReplicationSnapshot};

/// Observer-side read model of one actor, assembled from replicated fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorView {
    pub id: ActorId,
    pub team: TeamId,
    pub archetype: Archetype,
    pub stats: UnitStats,
    pub health: u32,
    pub position: Point,
    pub moving: bool,
}

impl ActorView {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Read-only, eventually consistent copy of the authoritative match.
///
/// Observers never write through a replica; they only merge versioned
/// updates from the server and send requests back.
#[derive(Clone, Debug, Default)]
pub struct ObserverReplica {
    rules: MatchRules,
    roster: BTreeMap<ActorId, ActorProfile>,
    obstacles: Vec<Obstacle>,
    fields: BTreeMap<FieldKey, ReplicatedCell<StateChange>>,
}

impl ObserverReplica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: &ReplicationSnapshot) -> Self {
        let mut replica = Self::new();
        replica.apply_snapshot(snapshot);
        replica
    }

    /// Replaces static match data and merges every field in the snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &ReplicationSnapshot) {
        self.rules = snapshot.rules.clone();
        self.roster = snapshot
            .roster
            .iter()
            .map(|profile| (profile.id, *profile))
            .collect();
        self.obstacles = snapshot.obstacles.clone();
        for update in &snapshot.fields {
            self.apply(update);
        }
    }

    /// Merges one update; returns false for stale or duplicate deliveries.
    pub fn apply(&mut self, update: &FieldUpdate) -> bool {
        let key = update.field();
        match self.fields.get_mut(&key) {
            Some(cell) => cell.merge(update.change, update.version),
            None => {
                self.fields
                    .insert(key, ReplicatedCell::at(update.change, update.version));
                true
            }
        }
    }

    pub fn version(&self, field: FieldKey) -> Option<u64> {
        self.fields.get(&field).map(ReplicatedCell::version)
    }

    fn field(&self, key: FieldKey) -> Option<StateChange> {
        self.fields.get(&key).map(|cell| *cell.get())
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn active_team(&self) -> Option<TeamId> {
        match self.field(FieldKey::ActiveTeam) {
            Some(StateChange::ActiveTeam(team)) => Some(team),
            _ => None,
        }
    }

    pub fn active_actor_id(&self) -> Option<ActorId> {
        match self.field(FieldKey::ActiveActor) {
            Some(StateChange::ActiveActor(actor)) => actor,
            _ => None,
        }
    }

    pub fn remaining_time(&self) -> f32 {
        match self.field(FieldKey::RemainingTime) {
            Some(StateChange::RemainingTime(time)) => time,
            _ => 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.field(FieldKey::Phase) {
            Some(StateChange::Phase(phase)) => phase,
            _ => Phase::Idle,
        }
    }

    /// Assembled view of `id`, if the replica knows that actor.
    pub fn actor(&self, id: ActorId) -> Option<ActorView> {
        let profile = self.roster.get(&id)?;

        let health = match self.field(FieldKey::Health(id)) {
            Some(StateChange::Health { health, .. }) => health,
            _ => profile.stats.max_health,
        };
        let position = match self.field(FieldKey::Position(id)) {
            Some(StateChange::Position { position, .. }) => position,
            _ => Point::ORIGIN,
        };
        let moving = matches!(
            self.field(FieldKey::Moving(id)),
            Some(StateChange::Moving { moving: true, .. })
        );

        Some(ActorView {
            id,
            team: profile.team,
            archetype: profile.archetype,
            stats: profile.stats,
            health,
            position,
            moving,
        })
    }

    /// The active actor, if its id resolves to a living actor here.
    ///
    /// Returns `None` while the replica is mid-race (e.g. the active id
    /// arrived before the roster, or names an actor already seen dead);
    /// presentation skips that update.
    pub fn active_actor_view(&self) -> Option<ActorView> {
        let id = self.active_actor_id()?;
        let view = self.actor(id).filter(ActorView::is_alive);
        if view.is_none() {
            debug!(target: "runtime::replica", actor = %id, "active actor unresolved");
        }
        view
    }

    /// Living actors of `team`, in id order.
    pub fn living(&self, team: TeamId) -> Vec<ActorView> {
        self.roster
            .values()
            .filter(|profile| profile.team == team)
            .filter_map(|profile| self.actor(profile.id))
            .filter(ActorView::is_alive)
            .collect()
    }

    /// Predictive preview of the enemies `actor` could attack right now.
    ///
    /// Uses the same range and line-of-sight checks as the server; the server
    /// remains the final word.
    pub fn visible_enemies(&self, actor: ActorId) -> Vec<ActorId> {
        let Some(attacker) = self.actor(actor) else {
            return Vec::new();
        };

        let mut enemies: Vec<(f32, ActorId)> = self
            .living(attacker.team.other())
            .into_iter()
            .filter(|enemy| {
                validator::in_range(
                    attacker.position,
                    enemy.position,
                    attacker.stats.attack_range as f32,
                ) && validator::has_line_of_sight(
                    attacker.position,
                    enemy.position,
                    &self.obstacles,
                    self.rules.eye_height,
                )
            })
            .map(|enemy| (attacker.position.distance(enemy.position), enemy.id))
            .collect();

        enemies.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        enemies.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ReplicationSnapshot {
        ReplicationSnapshot {
            rules: MatchRules::default(),
            roster: vec![
                ActorProfile {
                    id: ActorId(1),
                    team: TeamId::Zero,
                    archetype: Archetype::Standard,
                    stats: Archetype::Standard.stats(),
                },
                ActorProfile {
                    id: ActorId(2),
                    team: TeamId::One,
                    archetype: Archetype::LongRange,
                    stats: Archetype::LongRange.stats(),
                },
            ],
            obstacles: Vec::new(),
            fields: vec![
                FieldUpdate {
                    version: 1,
                    change: StateChange::ActiveActor(Some(ActorId(1))),
                },
                FieldUpdate {
                    version: 1,
                    change: StateChange::Position {
                        actor: ActorId(2),
                        position: Point::ground(0.0, 1.0),
                    },
                },
            ],
        }
    }

    #[test]
    fn duplicate_delivery_is_idempotent() {
        let mut replica = ObserverReplica::from_snapshot(&snapshot());
        let hit = FieldUpdate {
            version: 2,
            change: StateChange::Health {
                actor: ActorId(2),
                health: 2,
            },
        };

        assert!(replica.apply(&hit));
        assert!(!replica.apply(&hit));
        assert_eq!(replica.actor(ActorId(2)).unwrap().health, 2);
    }

    #[test]
    fn older_write_never_overrides_newer() {
        let mut replica = ObserverReplica::from_snapshot(&snapshot());
        let newer = FieldUpdate {
            version: 5,
            change: StateChange::RemainingTime(10.0),
        };
        let older = FieldUpdate {
            version: 4,
            change: StateChange::RemainingTime(11.0),
        };

        replica.apply(&newer);
        assert!(!replica.apply(&older));
        assert_eq!(replica.remaining_time(), 10.0);
    }

    #[test]
    fn unresolved_active_actor_is_tolerated() {
        let mut replica = ObserverReplica::from_snapshot(&snapshot());
        replica.apply(&FieldUpdate {
            version: 2,
            change: StateChange::ActiveActor(Some(ActorId(42))),
        });

        assert_eq!(replica.active_actor_id(), Some(ActorId(42)));
        assert_eq!(replica.active_actor_view(), None);
    }

    #[test]
    fn preview_matches_range_rules() {
        let replica = ObserverReplica::from_snapshot(&snapshot());

        // Unit 1 at the origin reaches one tile; unit 2 reaches ten.
        assert_eq!(replica.visible_enemies(ActorId(1)), vec![ActorId(2)]);
        assert_eq!(replica.visible_enemies(ActorId(2)), vec![ActorId(1)]);
    }
}
