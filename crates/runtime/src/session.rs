//! Observer connections and team ownership.
//!
//! A connection owns at most one team, and each team is owned by at most one
//! connection. Spectators connect without a team and can only observe.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use tactics_core::{ActionError, TeamId};

use crate::api::{Result, RuntimeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A registered observer connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub team: Option<TeamId>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    connections: BTreeMap<ConnectionId, Option<TeamId>>,
    next_id: u32,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection, optionally claiming ownership of `team`.
    pub fn connect(&mut self, team: Option<TeamId>) -> Result<Connection> {
        if let Some(team) = team
            && self.owner(team).is_some()
        {
            return Err(RuntimeError::TeamAlreadyOwned { team });
        }

        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.connections.insert(id, team);

        info!(
            target: "runtime::session",
            connection = %id,
            team = ?team,
            connections = self.len(),
            "observer connected"
        );
        Ok(Connection { id, team })
    }

    /// Drops a connection; its team becomes unowned.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<()> {
        if self.connections.remove(&id).is_none() {
            return Err(RuntimeError::UnknownConnection { connection: id });
        }
        info!(
            target: "runtime::session",
            connection = %id,
            connections = self.len(),
            "observer disconnected"
        );
        Ok(())
    }

    pub fn team_of(&self, id: ConnectionId) -> Option<TeamId> {
        self.connections.get(&id).copied().flatten()
    }

    pub fn owner(&self, team: TeamId) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|(_, owned)| **owned == Some(team))
            .map(|(id, _)| *id)
    }

    /// Remote requests are only accepted from the owner of the active team.
    pub fn authorize(
        &self,
        id: ConnectionId,
        active_team: TeamId,
    ) -> std::result::Result<(), ActionError> {
        if self.team_of(id) == Some(active_team) {
            Ok(())
        } else {
            Err(ActionError::NotTeamOwner)
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
