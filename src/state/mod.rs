//! State management module for PairWord.
//!
//! This module provides the core state types and managers:
//!
//! - `player` - Per-player round state
//! - `room` - Room aggregate and the directory that owns all rooms
//! - `game` - Phase transitions, pairing, turn rotation, guessing
//! - `scheduler` - At-most-one pending timer per room
//! - `catalog` - Word/hint entries and picking-phase sampling
//! - `protocol` - Inbound and outbound event types
//! - `config` - Tunables (timeouts, thresholds, inter-round policy)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           AppState                               │
//! │                                                                  │
//! │  ┌────────────────┐  ┌────────────────┐  ┌───────────────────┐  │
//! │  │  RoomDirectory │  │ TurnScheduler  │  │    GameMachine    │  │
//! │  │                │  │                │  │                   │  │
//! │  │ room code →    │  │ room code →    │  │ config + catalog; │  │
//! │  │   Room         │  │   deadline     │  │ phase transitions │  │
//! │  │                │  │   (one slot)   │  │ over rooms        │  │
//! │  │ handle →       │  │                │  │                   │  │
//! │  │   room code    │  │                │  │                   │  │
//! │  └────────────────┘  └────────────────┘  └───────────────────┘  │
//! │                                                                  │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │                    RoomPhase (per room)                    │  │
//! │  │                                                            │  │
//! │  │      Waiting ──▶ Picking ──▶ Playing ──▶ Waiting ...       │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All inbound actions and timer firings for a room must be serialized by
//! the caller onto one logical queue; each handler runs to completion and
//! returns its outbound events before the next is dispatched. Rooms never
//! interact, so they shard cleanly by room code.

pub mod catalog;
pub mod config;
pub mod game;
pub mod player;
pub mod protocol;
pub mod room;
pub mod scheduler;

use rand::prelude::*;
use tracing::debug;

// Re-export commonly used types
pub use catalog::{WordCatalog, WordCategory, WordEntry};
pub use config::{GameConfig, InterRoundPolicy};
pub use game::{GameError, GameMachine};
pub use player::Player;
pub use protocol::{ClientEvent, Outbound, Recipient, ServerEvent};
pub use room::{Room, RoomDirectory, RoomError, RoomPhase};
pub use scheduler::{TimerKind, TimerToken, TurnScheduler};

/// Combined application state.
///
/// Owns the room directory and timer table, and routes inbound events and
/// timer firings through the game state machine. The transport decodes a
/// [`ClientEvent`] per message, calls [`AppState::handle_event`] with the
/// sender's connection handle, and delivers the returned [`Outbound`]s.
#[derive(Debug)]
pub struct AppState {
    pub rooms: RoomDirectory,
    pub timers: TurnScheduler,
    pub machine: GameMachine,
    rng: StdRng,
}

impl AppState {
    pub fn new(config: GameConfig, catalog: WordCatalog) -> Self {
        Self {
            rooms: RoomDirectory::new(),
            timers: TurnScheduler::new(),
            machine: GameMachine::new(config, catalog),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic variant for tests.
    pub fn with_seed(config: GameConfig, catalog: WordCatalog, seed: u64) -> Self {
        Self {
            rooms: RoomDirectory::new(),
            timers: TurnScheduler::new(),
            machine: GameMachine::new(config, catalog),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Apply one player action and return the events to deliver.
    pub fn handle_event(&mut self, conn: &str, event: ClientEvent) -> Vec<Outbound> {
        let result = match event {
            ClientEvent::CreateRoom { player_name } => self.create_room(conn, &player_name),
            ClientEvent::JoinRoom {
                player_name,
                room_id,
            } => self.join_room(conn, &player_name, &room_id),
            ClientEvent::StartGame { room_id } => {
                self.machine
                    .start_game(&mut self.rooms, &room_id, conn, &mut self.rng)
            }
            ClientEvent::SubmitWord { room_id, word } => self.machine.submit_word(
                &mut self.rooms,
                &mut self.timers,
                &room_id,
                conn,
                &word,
            ),
            ClientEvent::SubmitCustomWord {
                room_id,
                custom_word,
                custom_hint,
            } => self.machine.submit_custom_word(
                &mut self.rooms,
                &mut self.timers,
                &room_id,
                conn,
                &custom_word,
                custom_hint.as_deref(),
            ),
            ClientEvent::SetReady { room_id } => {
                self.machine
                    .set_ready(&mut self.rooms, &mut self.timers, &room_id, conn)
            }
            ClientEvent::SetUnready { room_id } => {
                self.machine.set_unready(&mut self.rooms, &room_id, conn)
            }
            ClientEvent::MakeGuess { room_id, guess } => self.machine.make_guess(
                &mut self.rooms,
                &mut self.timers,
                &room_id,
                conn,
                &guess,
            ),
            ClientEvent::SkipTurn { room_id } => {
                self.machine
                    .skip_turn(&mut self.rooms, &mut self.timers, &room_id, conn)
            }
            ClientEvent::GetHint { room_id } => {
                self.machine.request_hint(&mut self.rooms, &room_id, conn)
            }
            ClientEvent::StartAgain { room_id } => {
                self.machine
                    .start_again(&mut self.rooms, &room_id, conn, &mut self.rng)
            }
        };

        match result {
            Ok(events) => events,
            Err(err) => game_error_events(conn, err),
        }
    }

    /// The connection registry reports a dropped connection.
    pub fn handle_disconnect(&mut self, conn: &str) -> Vec<Outbound> {
        self.machine
            .handle_disconnect(&mut self.rooms, &mut self.timers, conn)
    }

    /// Fire every due timer through the state machine.
    pub fn poll_timers(&mut self) -> Vec<Outbound> {
        let mut events = Vec::new();
        for (room_id, kind) in self.timers.expired() {
            match kind {
                TimerKind::TurnTimeout => {
                    events.extend(self.machine.handle_turn_timeout(
                        &mut self.rooms,
                        &mut self.timers,
                        &room_id,
                    ));
                }
                TimerKind::RoundReset => {
                    events.extend(self.machine.handle_round_reset(
                        &mut self.rooms,
                        &room_id,
                        &mut self.rng,
                    ));
                }
            }
        }
        events
    }

    fn create_room(&mut self, conn: &str, player_name: &str) -> Result<Vec<Outbound>, GameError> {
        if self.rooms.room_id_for_player(conn).is_some() {
            return Ok(vec![Outbound::unicast(
                conn,
                ServerEvent::JoinError {
                    message: "Already in a room".to_string(),
                },
            )]);
        }
        match self.rooms.create_room_with_rng(
            conn,
            player_name,
            self.machine.config.max_players,
            self.machine.config.code_attempts,
            &mut self.rng,
        ) {
            Ok(room) => Ok(vec![Outbound::unicast(
                conn,
                ServerEvent::RoomCreated {
                    room_id: room.id.clone(),
                    host_id: room.host_id.clone(),
                    players: room.players_json(),
                },
            )]),
            Err(err) => Ok(vec![Outbound::unicast(
                conn,
                ServerEvent::GameError {
                    message: err.to_string(),
                },
            )]),
        }
    }

    fn join_room(
        &mut self,
        conn: &str,
        player_name: &str,
        room_id: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        if self.rooms.room_id_for_player(conn).is_some() {
            return Ok(vec![Outbound::unicast(
                conn,
                ServerEvent::JoinError {
                    message: "Already in a room".to_string(),
                },
            )]);
        }
        match self.rooms.join_room(room_id, Player::new(conn, player_name)) {
            Ok(room) => Ok(vec![
                Outbound::unicast(
                    conn,
                    ServerEvent::JoinedRoom {
                        room_id: room.id.clone(),
                        host_id: room.host_id.clone(),
                        players: room.players_json(),
                    },
                ),
                Outbound::broadcast(
                    room_id,
                    ServerEvent::UpdatePlayers {
                        players: room.players_json(),
                    },
                ),
            ]),
            Err(err) => Ok(vec![Outbound::unicast(
                conn,
                ServerEvent::JoinError {
                    message: err.to_string(),
                },
            )]),
        }
    }
}

/// Map a game error onto the wire, or swallow it.
///
/// Only conditions the actor can do something about are reported; the
/// rest are stale or malformed actions that get dropped.
fn game_error_events(conn: &str, err: GameError) -> Vec<Outbound> {
    match err {
        GameError::NotEnoughPlayers => vec![Outbound::unicast(
            conn,
            ServerEvent::GameError {
                message: err.to_string(),
            },
        )],
        GameError::RoomNotFound | GameError::InvalidActor | GameError::WrongPhase => {
            debug!(conn, %err, "dropping invalid action");
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_catalog() -> WordCatalog {
        WordCatalog::from_categories(vec![WordCategory {
            name: "test".to_string(),
            entries: vec![
                WordEntry::new("Batman", "Wears a cape"),
                WordEntry::new("Toaster", "Kitchen appliance"),
            ],
        }])
    }

    fn make_app() -> AppState {
        AppState::with_seed(GameConfig::default(), make_catalog(), 42)
    }

    fn created_room_id(events: &[Outbound]) -> String {
        match &events[0].event {
            ServerEvent::RoomCreated { room_id, .. } => room_id.clone(),
            other => panic!("expected roomCreated, got {}", other.name()),
        }
    }

    #[test]
    fn test_create_and_join_flow() {
        let mut app = make_app();

        let events = app.handle_event(
            "conn-1",
            ClientEvent::CreateRoom {
                player_name: "Alice".to_string(),
            },
        );
        let room_id = created_room_id(&events);
        assert_eq!(events[0].to, Recipient::Player("conn-1".to_string()));

        let events = app.handle_event(
            "conn-2",
            ClientEvent::JoinRoom {
                player_name: "Bob".to_string(),
                room_id: room_id.clone(),
            },
        );
        assert_eq!(events[0].event.name(), "joinedRoom");
        assert_eq!(events[1].event.name(), "updatePlayers");
        assert_eq!(events[1].to, Recipient::Room(room_id));
    }

    #[test]
    fn test_join_missing_room_reports_error() {
        let mut app = make_app();
        let events = app.handle_event(
            "conn-1",
            ClientEvent::JoinRoom {
                player_name: "Alice".to_string(),
                room_id: "NOPE42".to_string(),
            },
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.name(), "joinError");
    }

    #[test]
    fn test_double_join_rejected() {
        let mut app = make_app();
        let events = app.handle_event(
            "conn-1",
            ClientEvent::CreateRoom {
                player_name: "Alice".to_string(),
            },
        );
        let room_id = created_room_id(&events);

        let events = app.handle_event(
            "conn-1",
            ClientEvent::JoinRoom {
                player_name: "Alice".to_string(),
                room_id,
            },
        );
        assert_eq!(events[0].event.name(), "joinError");
    }

    #[test]
    fn test_start_with_one_player_reports_error() {
        let mut app = make_app();
        let events = app.handle_event(
            "conn-1",
            ClientEvent::CreateRoom {
                player_name: "Alice".to_string(),
            },
        );
        let room_id = created_room_id(&events);

        let events = app.handle_event("conn-1", ClientEvent::StartGame { room_id });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.name(), "gameError");
    }

    #[test]
    fn test_invalid_actor_is_silent() {
        let mut app = make_app();
        let events = app.handle_event(
            "conn-1",
            ClientEvent::StartGame {
                room_id: "NOPE42".to_string(),
            },
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_disconnect_unknown_handle_is_noop() {
        let mut app = make_app();
        assert!(app.handle_disconnect("ghost").is_empty());
    }

    #[test]
    fn test_poll_timers_empty() {
        let mut app = make_app();
        assert!(app.poll_timers().is_empty());
    }
}
