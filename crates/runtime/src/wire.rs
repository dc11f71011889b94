//! JSON message framing for remote observers.
//!
//! The transport itself is out of scope; anything that moves text frames
//! (a socket, a pipe, a test harness) can feed [`WireSession::handle_frame`]
//! and forward the server feed through [`ServerMessage::from`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use tactics_core::{Ack, ActionRequest, Notification, TeamId};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::Event;
use crate::replication::{FieldUpdate, ReplicationSnapshot};
use crate::session::Connection;

/// Frames sent by an observer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum ClientMessage {
    Connect { team: Option<TeamId> },
    Submit { request: ActionRequest },
    Resync,
    Disconnect,
}

/// Frames sent by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected(Connection),
    Ack(Ack),
    Update(FieldUpdate),
    Notification(Notification),
    Snapshot(ReplicationSnapshot),
    Disconnected,
    Error { message: String },
}

impl From<Event> for ServerMessage {
    fn from(event: Event) -> Self {
        match event {
            Event::State(update) => ServerMessage::Update(update),
            Event::Notification(notification) => ServerMessage::Notification(notification),
        }
    }
}

pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode<T: DeserializeOwned>(frame: &str) -> Result<T> {
    Ok(serde_json::from_str(frame)?)
}

/// Server-side state of one remote observer.
pub struct WireSession {
    handle: RuntimeHandle,
    connection: Option<Connection>,
}

impl WireSession {
    pub fn new(handle: RuntimeHandle) -> Self {
        Self {
            handle,
            connection: None,
        }
    }

    pub fn connection(&self) -> Option<Connection> {
        self.connection
    }

    /// Handles one inbound frame and produces the reply frame.
    ///
    /// Malformed frames and refused operations are answered with an error
    /// frame; only runtime failures propagate.
    pub async fn handle_frame(&mut self, frame: &str) -> Result<String> {
        let reply = match decode::<ClientMessage>(frame) {
            Ok(message) => self.handle_message(message).await?,
            Err(err) => {
                debug!(target: "runtime::wire", error = %err, "malformed frame");
                ServerMessage::Error {
                    message: err.to_string(),
                }
            }
        };
        encode(&reply)
    }

    async fn handle_message(&mut self, message: ClientMessage) -> Result<ServerMessage> {
        match message {
            ClientMessage::Connect { team } => {
                if self.connection.is_some() {
                    return Ok(ServerMessage::Error {
                        message: "already connected".to_owned(),
                    });
                }
                match self.handle.connect(team).await {
                    Ok(connection) => {
                        self.connection = Some(connection);
                        Ok(ServerMessage::Connected(connection))
                    }
                    Err(err @ RuntimeError::TeamAlreadyOwned { .. }) => Ok(ServerMessage::Error {
                        message: err.to_string(),
                    }),
                    Err(err) => Err(err),
                }
            }
            ClientMessage::Submit { request } => {
                let Some(connection) = self.connection else {
                    return Ok(ServerMessage::Error {
                        message: "not connected".to_owned(),
                    });
                };
                let ack = self.handle.submit(connection.id, request).await?.wait().await?;
                Ok(ServerMessage::Ack(ack))
            }
            ClientMessage::Resync => Ok(ServerMessage::Snapshot(self.handle.snapshot().await?)),
            ClientMessage::Disconnect => {
                if let Some(connection) = self.connection.take() {
                    self.handle.disconnect(connection.id).await?;
                }
                Ok(ServerMessage::Disconnected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::RuntimeConfig;
    use crate::runtime::Runtime;
    use tactics_core::{ActionError, ActorId, Archetype, MatchSetup, Point, StateChange};

    #[test]
    fn client_frames_are_tagged() {
        let frame = encode(&ClientMessage::Submit {
            request: ActionRequest::Move {
                requester: ActorId(2),
                target: Point::ground(1.0, 2.0),
            },
        })
        .unwrap();

        assert!(frame.contains(r#""type":"submit""#));
        let back: ClientMessage = decode(&frame).unwrap();
        assert!(matches!(
            back,
            ClientMessage::Submit {
                request: ActionRequest::Move { requester: ActorId(2), .. }
            }
        ));
    }

    #[test]
    fn rejections_keep_their_reason() {
        let message = ServerMessage::Ack(Ack::Rejected {
            reason: ActionError::TargetIsAlly { target: ActorId(4) },
        });

        let back: ServerMessage = decode(&encode(&message).unwrap()).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn feed_events_map_to_frames() {
        let update = FieldUpdate {
            version: 3,
            change: StateChange::Health {
                actor: ActorId(1),
                health: 2,
            },
        };

        assert_eq!(
            ServerMessage::from(Event::State(update)),
            ServerMessage::Update(update)
        );
    }

    #[test]
    fn garbage_is_a_wire_error() {
        let err = decode::<ClientMessage>("{not json").unwrap_err();
        assert!(matches!(err, RuntimeError::Wire(_)));
    }

    async fn reply(session: &mut WireSession, message: ClientMessage) -> ServerMessage {
        let frame = session.handle_frame(&encode(&message).unwrap()).await.unwrap();
        decode(&frame).unwrap()
    }

    #[tokio::test]
    async fn session_answers_every_frame() {
        let mut config = RuntimeConfig::default();
        config.tick_interval = Duration::from_millis(5);
        let mut setup = MatchSetup::new();
        setup
            .spawn(TeamId::Zero, Archetype::Standard, Point::ground(0.0, 0.0))
            .unwrap();
        setup
            .spawn(TeamId::One, Archetype::Standard, Point::ground(5.0, 0.0))
            .unwrap();
        let runtime = Runtime::builder()
            .config(config)
            .setup(setup)
            .build()
            .await
            .unwrap();

        let mut host = WireSession::new(runtime.handle());
        let end_turn = ClientMessage::Submit {
            request: ActionRequest::EndTurn {
                requester: ActorId(1),
            },
        };

        assert_eq!(
            reply(&mut host, end_turn.clone()).await,
            ServerMessage::Error {
                message: "not connected".to_owned()
            }
        );

        let ServerMessage::Connected(connection) = reply(
            &mut host,
            ClientMessage::Connect {
                team: Some(TeamId::Zero),
            },
        )
        .await
        else {
            panic!("expected a connected frame");
        };
        assert_eq!(connection.team, Some(TeamId::Zero));
        assert_eq!(host.connection(), Some(connection));

        let mut rival = WireSession::new(runtime.handle());
        assert_eq!(
            reply(
                &mut rival,
                ClientMessage::Connect {
                    team: Some(TeamId::Zero)
                }
            )
            .await,
            ServerMessage::Error {
                message: RuntimeError::TeamAlreadyOwned { team: TeamId::Zero }.to_string()
            }
        );
        assert!(rival.connection().is_none());

        assert_eq!(
            reply(&mut host, end_turn).await,
            ServerMessage::Ack(Ack::Accepted)
        );

        let garbage = host.handle_frame("{not json").await.unwrap();
        assert!(matches!(
            decode::<ServerMessage>(&garbage).unwrap(),
            ServerMessage::Error { .. }
        ));

        let ServerMessage::Snapshot(snapshot) = reply(&mut host, ClientMessage::Resync).await
        else {
            panic!("expected a snapshot frame");
        };
        assert!(!snapshot.fields.is_empty());

        assert_eq!(
            reply(&mut host, ClientMessage::Disconnect).await,
            ServerMessage::Disconnected
        );
        assert!(host.connection().is_none());

        runtime.shutdown().await.unwrap();
    }
}
