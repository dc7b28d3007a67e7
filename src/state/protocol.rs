//! Wire-facing event types.
//!
//! Inbound events are what the transport decodes off a connection; outbound
//! events are what the state machine hands back for delivery. The crate
//! never touches a socket: `Outbound` values name a recipient and the
//! connection registry on the other side of the boundary does the rest.

use serde::Deserialize;
use serde_json::json;

/// An action received from a player.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    CreateRoom { player_name: String },
    #[serde(rename_all = "camelCase")]
    JoinRoom { player_name: String, room_id: String },
    #[serde(rename_all = "camelCase")]
    StartGame { room_id: String },
    #[serde(rename_all = "camelCase")]
    SubmitWord { room_id: String, word: String },
    #[serde(rename_all = "camelCase")]
    SubmitCustomWord {
        room_id: String,
        custom_word: String,
        custom_hint: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SetReady { room_id: String },
    #[serde(rename_all = "camelCase")]
    SetUnready { room_id: String },
    #[serde(rename_all = "camelCase")]
    MakeGuess { room_id: String, guess: String },
    #[serde(rename_all = "camelCase")]
    SkipTurn { room_id: String },
    #[serde(rename_all = "camelCase")]
    GetHint { room_id: String },
    #[serde(rename_all = "camelCase")]
    StartAgain { room_id: String },
}

/// An event to deliver to one player or a whole room.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    RoomCreated {
        room_id: String,
        host_id: String,
        players: serde_json::Value,
    },
    JoinedRoom {
        room_id: String,
        host_id: String,
        players: serde_json::Value,
    },
    JoinError {
        message: String,
    },
    UpdatePlayers {
        players: serde_json::Value,
    },
    PickingStarted {
        partner_name: String,
        choices: Vec<String>,
    },
    WordSubmitted,
    AllWordsSubmitted,
    GuessMade {
        player_id: String,
        guess: String,
        is_correct: bool,
    },
    TurnChanged {
        current_turn: String,
        turn_count: u32,
    },
    TurnSkipped {
        player_id: String,
    },
    TurnEnded {
        player_id: String,
    },
    RoundFinished,
    BackToLobby,
    Hint {
        hint: String,
    },
    GameError {
        message: String,
    },
    GameAborted {
        message: String,
    },
}

impl ServerEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "roomCreated",
            Self::JoinedRoom { .. } => "joinedRoom",
            Self::JoinError { .. } => "joinError",
            Self::UpdatePlayers { .. } => "updatePlayers",
            Self::PickingStarted { .. } => "pickingStarted",
            Self::WordSubmitted => "wordSubmitted",
            Self::AllWordsSubmitted => "allWordsSubmitted",
            Self::GuessMade { .. } => "guessMade",
            Self::TurnChanged { .. } => "turnChanged",
            Self::TurnSkipped { .. } => "turnSkipped",
            Self::TurnEnded { .. } => "turnEnded",
            Self::RoundFinished => "roundFinished",
            Self::BackToLobby => "backToLobby",
            Self::Hint { .. } => "hint",
            Self::GameError { .. } => "gameError",
            Self::GameAborted { .. } => "gameAborted",
        }
    }

    /// Serialize for the wire: the event name under `type`, payload fields
    /// alongside it.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = match self {
            Self::RoomCreated {
                room_id,
                host_id,
                players,
            }
            | Self::JoinedRoom {
                room_id,
                host_id,
                players,
            } => json!({
                "roomId": room_id,
                "hostId": host_id,
                "players": players
            }),
            Self::JoinError { message }
            | Self::GameError { message }
            | Self::GameAborted { message } => json!({ "message": message }),
            Self::UpdatePlayers { players } => json!({ "players": players }),
            Self::PickingStarted {
                partner_name,
                choices,
            } => json!({
                "partnerName": partner_name,
                "choices": choices
            }),
            Self::GuessMade {
                player_id,
                guess,
                is_correct,
            } => json!({
                "playerId": player_id,
                "guess": guess,
                "isCorrect": is_correct
            }),
            Self::TurnChanged {
                current_turn,
                turn_count,
            } => json!({
                "currentTurn": current_turn,
                "turnCount": turn_count
            }),
            Self::TurnSkipped { player_id } | Self::TurnEnded { player_id } => {
                json!({ "playerId": player_id })
            }
            Self::Hint { hint } => json!({ "hint": hint }),
            Self::WordSubmitted
            | Self::AllWordsSubmitted
            | Self::RoundFinished
            | Self::BackToLobby => json!({}),
        };
        value["type"] = json!(self.name());
        value
    }
}

/// Delivery target for an outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A single connection handle.
    Player(String),
    /// Every member of a room.
    Room(String),
}

/// An outbound event paired with its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn unicast(handle: impl Into<String>, event: ServerEvent) -> Self {
        Self {
            to: Recipient::Player(handle.into()),
            event,
        }
    }

    pub fn broadcast(room_id: impl Into<String>, event: ServerEvent) -> Self {
        Self {
            to: Recipient::Room(room_id.into()),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_create_room() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type": "createRoom", "playerName": "Alice"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::CreateRoom {
                player_name: "Alice".to_string()
            }
        );
    }

    #[test]
    fn test_deserialize_custom_word_without_hint() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type": "submitCustomWord", "roomId": "ABC123", "customWord": "Batman"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::SubmitCustomWord {
                room_id: "ABC123".to_string(),
                custom_word: "Batman".to_string(),
                custom_hint: None
            }
        );
    }

    #[test]
    fn test_deserialize_guess() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type": "makeGuess", "roomId": "ABC123", "guess": "batman"}"#,
        )
        .unwrap();
        assert!(matches!(event, ClientEvent::MakeGuess { .. }));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type": "launchMissiles"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_to_json() {
        let event = ServerEvent::TurnChanged {
            current_turn: "conn-1".to_string(),
            turn_count: 3,
        };
        let json = event.to_json();
        assert_eq!(json["type"], "turnChanged");
        assert_eq!(json["currentTurn"], "conn-1");
        assert_eq!(json["turnCount"], 3);
    }

    #[test]
    fn test_payload_free_events() {
        let json = ServerEvent::RoundFinished.to_json();
        assert_eq!(json["type"], "roundFinished");
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_outbound_targets() {
        let unicast = Outbound::unicast("conn-1", ServerEvent::WordSubmitted);
        assert_eq!(unicast.to, Recipient::Player("conn-1".to_string()));

        let broadcast = Outbound::broadcast("ABC123", ServerEvent::RoundFinished);
        assert_eq!(broadcast.to, Recipient::Room("ABC123".to_string()));
    }
}
