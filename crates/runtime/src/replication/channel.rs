use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use tactics_core::{
    ActorId, Archetype, FieldKey, MatchEvent, MatchRules, MatchState, Notification, Obstacle,
    StateChange, TeamId, UnitStats,
};

use super::cell::ReplicatedCell;
use crate::events::{Event, EventBus};

/// One versioned write to a replicated field, as seen by observers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub version: u64,
    pub change: StateChange,
}

impl FieldUpdate {
    pub fn field(&self) -> FieldKey {
        self.change.field()
    }
}

/// Immutable per-actor data observers need to interpret field updates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: ActorId,
    pub team: TeamId,
    pub archetype: Archetype,
    pub stats: UnitStats,
}

/// Everything a late or lagging observer needs to rebuild its replica.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplicationSnapshot {
    pub rules: MatchRules,
    pub roster: Vec<ActorProfile>,
    pub obstacles: Vec<Obstacle>,
    pub fields: Vec<FieldUpdate>,
}

impl ReplicationSnapshot {
    pub fn capture(state: &MatchState, channel: &ReplicationChannel) -> Self {
        let roster = state
            .actors
            .values()
            .map(|actor| ActorProfile {
                id: actor.id,
                team: actor.team,
                archetype: actor.archetype,
                stats: actor.stats,
            })
            .collect();

        Self {
            rules: state.rules.clone(),
            roster,
            obstacles: state.obstacles.clone(),
            fields: channel.current(),
        }
    }
}

/// Server side of replication: versioned field cells plus the outbound feed.
pub struct ReplicationChannel {
    cells: BTreeMap<FieldKey, ReplicatedCell<StateChange>>,
    bus: EventBus,
}

impl ReplicationChannel {
    pub fn new(bus: EventBus) -> Self {
        Self {
            cells: BTreeMap::new(),
            bus,
        }
    }

    /// Records initial field values without broadcasting them.
    pub fn seed(&mut self, fields: impl IntoIterator<Item = StateChange>) {
        for change in fields {
            self.cells
                .entry(change.field())
                .and_modify(|cell| {
                    cell.set(change);
                })
                .or_insert_with(|| ReplicatedCell::new(change));
        }
    }

    /// Writes a field and broadcasts the versioned update.
    pub fn publish(&mut self, change: StateChange) -> FieldUpdate {
        let key = change.field();
        let version = match self.cells.get_mut(&key) {
            Some(cell) => cell.set(change),
            None => {
                let cell = ReplicatedCell::new(change);
                let version = cell.version();
                self.cells.insert(key, cell);
                version
            }
        };

        let update = FieldUpdate { version, change };
        trace!(target: "runtime::replication", field = ?key, version, "field published");
        self.bus.publish(Event::State(update));
        update
    }

    pub fn notify(&self, notification: Notification) {
        self.bus.publish(Event::Notification(notification));
    }

    /// Routes a coordinator event to the matching feed.
    pub fn dispatch(&mut self, event: MatchEvent) {
        match event {
            MatchEvent::State(change) => {
                self.publish(change);
            }
            MatchEvent::Notify(notification) => self.notify(notification),
        }
    }

    pub fn version(&self, field: FieldKey) -> Option<u64> {
        self.cells.get(&field).map(ReplicatedCell::version)
    }

    /// Latest value of every field, with its version.
    pub fn current(&self) -> Vec<FieldUpdate> {
        self.cells
            .values()
            .map(|cell| FieldUpdate {
                version: cell.version(),
                change: *cell.get(),
            })
            .collect()
    }
}
