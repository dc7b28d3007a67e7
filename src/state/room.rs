//! Room state management.
//!
//! A room is one isolated game session: its players, phase, pairing, and
//! turn state. The `RoomDirectory` owns every room and is the only way to
//! create or destroy one.

use std::collections::HashMap;

use rand::prelude::*;
use tracing::info;

use crate::state::player::Player;

/// Length of a room code.
pub const CODE_LEN: usize = 6;

/// Alphabet room codes are drawn from.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Room phase state machine.
///
/// Transitions are monotone within a round: waiting -> picking -> playing
/// -> waiting, never skipping a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomPhase {
    /// Lobby; accepting joins.
    #[default]
    Waiting,
    /// Each giver choosing a secret word for their receiver.
    Picking,
    /// Turn-based guessing.
    Playing,
}

impl RoomPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Picking => "picking",
            Self::Playing => "playing",
        }
    }

    /// Whether a round is in progress (joins are rejected, player loss can
    /// abort the room).
    pub fn is_in_round(&self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

/// One game session.
#[derive(Debug, Clone)]
pub struct Room {
    /// Short shareable code, unique within the directory.
    pub id: String,

    /// Handle of the player who created the room.
    pub host_id: String,

    /// Current phase.
    pub phase: RoomPhase,

    /// Giver handle -> receiver handle. A single cycle over all players
    /// with no fixed point; mutual pairing in the two-player case.
    pub pairs: HashMap<String, String>,

    /// Player handles in turn sequence. A permutation of the members while
    /// a round is in progress, empty in the waiting phase.
    pub turn_order: Vec<String>,

    /// Players whose word has not yet been assigned this round.
    pub words_to_submit: usize,

    /// Handle currently holding the turn.
    pub current_turn: Option<String>,

    /// Turns taken this round, monotone within the round.
    pub turn_count: u32,

    /// Maximum members allowed.
    pub max_players: usize,

    /// When the room was created.
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Members indexed by handle.
    players: HashMap<String, Player>,
}

impl Room {
    pub fn new(id: String, host_id: String, max_players: usize) -> Self {
        Self {
            id,
            host_id,
            phase: RoomPhase::Waiting,
            pairs: HashMap::new(),
            turn_order: Vec::new(),
            words_to_submit: 0,
            current_turn: None,
            turn_count: 0,
            max_players,
            created_at: chrono::Utc::now(),
            players: HashMap::new(),
        }
    }

    /// Add a member to the room.
    pub fn add_player(&mut self, player: Player) -> Result<(), RoomError> {
        if self.phase != RoomPhase::Waiting {
            return Err(RoomError::GameInProgress);
        }
        if self.is_full() {
            return Err(RoomError::Full);
        }
        self.players.insert(player.id.clone(), player);
        Ok(())
    }

    /// Remove a member, keeping `turn_order` and `pairs` consistent.
    ///
    /// The departed player's giver is re-pointed at the departed player's
    /// receiver, so the pairing stays a single cycle over the remaining
    /// members. `current_turn` is cleared if the departed player held it,
    /// and a departing host hands the role to any remaining member.
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        let player = self.players.remove(player_id)?;

        self.turn_order.retain(|id| id != player_id);
        self.bypass_in_pairs(player_id);
        if self.current_turn.as_deref() == Some(player_id) {
            self.current_turn = None;
        }
        if self.host_id == player_id {
            if let Some(next_host) = self.players.keys().next() {
                self.host_id = next_host.clone();
            }
        }

        Some(player)
    }

    /// Splice a handle out of the pairing cycle.
    fn bypass_in_pairs(&mut self, player_id: &str) {
        let receiver = match self.pairs.remove(player_id) {
            Some(r) => r,
            None => return,
        };
        let giver = self
            .pairs
            .iter()
            .find(|(_, r)| r.as_str() == player_id)
            .map(|(g, _)| g.clone());
        if let Some(giver) = giver {
            if giver == receiver {
                // The cycle collapsed to a single member; no edge remains.
                self.pairs.remove(&giver);
            } else {
                self.pairs.insert(giver, receiver);
            }
        }
    }

    pub fn get_player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn get_player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.get_mut(player_id)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id == player_id
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &String> {
        self.players.keys()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Position of a handle in the turn order.
    pub fn turn_position(&self, player_id: &str) -> Option<usize> {
        self.turn_order.iter().position(|id| id == player_id)
    }

    /// Handles in turn order that have not yet guessed this round.
    pub fn active_player_ids(&self) -> Vec<String> {
        self.turn_order
            .iter()
            .filter(|id| {
                self.players
                    .get(id.as_str())
                    .is_some_and(|p| p.is_active())
            })
            .cloned()
            .collect()
    }

    /// Ready gate predicate: every member is ready and has a word.
    pub fn all_ready_with_words(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .values()
                .all(|p| p.is_ready && p.current_word.is_some())
    }

    /// Whether every member has guessed correctly this round.
    pub fn all_guessed(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.has_guessed)
    }

    /// Members whose word is still unassigned this round.
    pub fn unpicked_count(&self) -> usize {
        self.players.values().filter(|p| !p.picked).count()
    }

    /// Full player snapshot keyed by handle, as sent in `updatePlayers`.
    pub fn players_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .players
            .values()
            .map(|p| (p.id.clone(), p.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Room-level errors, reported only to the acting player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    NotFound,
    Full,
    GameInProgress,
    Capacity,
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Room does not exist"),
            Self::Full => write!(f, "Room is full"),
            Self::GameInProgress => write!(f, "Game has already started"),
            Self::Capacity => write!(f, "Could not allocate a room code"),
        }
    }
}

impl std::error::Error for RoomError {}

/// Room directory - owns all rooms and their lifecycle.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    /// Rooms by code.
    rooms: HashMap<String, Room>,

    /// Player handle to room code mapping.
    player_index: HashMap<String, String>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with a fresh code and the creator as host and sole
    /// member. Code generation retries up to `attempts` times before
    /// failing with `Capacity`.
    pub fn create_room(
        &mut self,
        handle: &str,
        host_name: &str,
        max_players: usize,
        attempts: u32,
    ) -> Result<&Room, RoomError> {
        self.create_room_with_rng(handle, host_name, max_players, attempts, &mut rand::rng())
    }

    /// Create a room with a caller-provided RNG.
    pub fn create_room_with_rng<R: Rng + ?Sized>(
        &mut self,
        handle: &str,
        host_name: &str,
        max_players: usize,
        attempts: u32,
        rng: &mut R,
    ) -> Result<&Room, RoomError> {
        let mut code = None;
        for _ in 0..attempts {
            let candidate = generate_code(rng);
            if !self.rooms.contains_key(&candidate) {
                code = Some(candidate);
                break;
            }
        }
        let code = code.ok_or(RoomError::Capacity)?;

        let mut room = Room::new(code.clone(), handle.to_string(), max_players);
        room.add_player(Player::new(handle, host_name))
            .expect("fresh room accepts its host");
        self.player_index.insert(handle.to_string(), code.clone());
        self.rooms.insert(code.clone(), room);

        info!(room = %code, host = %handle, "room created");
        Ok(&self.rooms[&code])
    }

    /// Add a player to an existing room.
    pub fn join_room(&mut self, room_id: &str, player: Player) -> Result<&Room, RoomError> {
        let room = self.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
        let handle = player.id.clone();
        room.add_player(player)?;
        self.player_index.insert(handle, room_id.to_string());
        Ok(&self.rooms[room_id])
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Room code for a player handle.
    pub fn room_id_for_player(&self, handle: &str) -> Option<&str> {
        self.player_index.get(handle).map(|s| s.as_str())
    }

    pub fn get_for_player(&self, handle: &str) -> Option<&Room> {
        self.player_index
            .get(handle)
            .and_then(|id| self.rooms.get(id))
    }

    pub fn get_for_player_mut(&mut self, handle: &str) -> Option<&mut Room> {
        let id = self.player_index.get(handle)?.clone();
        self.rooms.get_mut(&id)
    }

    /// Remove a player from their room, keeping the index consistent.
    ///
    /// Teardown decisions (empty room, abort below the player minimum) are
    /// the state machine's; this only removes membership.
    pub fn remove_player(&mut self, handle: &str) -> Option<(String, Player)> {
        let room_id = self.player_index.remove(handle)?;
        let room = self.rooms.get_mut(&room_id)?;
        let player = room.remove_player(handle)?;
        Some((room_id, player))
    }

    /// Tear down a room entirely.
    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        let room = self.rooms.remove(room_id)?;
        for id in room.player_ids() {
            self.player_index.remove(id);
        }
        info!(room = %room_id, "room removed");
        Some(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &String> {
        self.rooms.keys()
    }
}

/// Generate a candidate room code.
fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
