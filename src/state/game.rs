//! Game state machine.
//!
//! Phase transitions, partner pairing, turn rotation, and guess handling
//! for a room. Every handler validates the acting player against the
//! room's current phase, mutates room state, and returns the outbound
//! events the transport should deliver. Timer arming and cancelling go
//! through the [`TurnScheduler`] so a stale timeout can never fire after
//! a turn has advanced.

use std::collections::HashMap;

use rand::prelude::*;
use tracing::{debug, info, warn};

use crate::state::catalog::{WordCatalog, WordEntry};
use crate::state::config::{GameConfig, InterRoundPolicy};
use crate::state::protocol::{Outbound, ServerEvent};
use crate::state::room::{Room, RoomDirectory, RoomPhase};
use crate::state::scheduler::{TimerKind, TurnScheduler};

/// Hint stored for a custom word submitted without one.
pub const DEFAULT_CUSTOM_HINT: &str = "Custom word";

/// Message broadcast when a room is aborted for lack of players.
const ABORT_MESSAGE: &str = "Not enough players to continue. The game has ended.";

/// Game-level errors. None of these are fatal to a room; the dispatch
/// layer reports them to the acting player or drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    RoomNotFound,
    NotEnoughPlayers,
    /// Action from a handle that does not hold the required role: not a
    /// member, not the host, or not the current turn holder.
    InvalidActor,
    /// Action that the room's current phase does not accept.
    WrongPhase,
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomNotFound => write!(f, "Room does not exist"),
            Self::NotEnoughPlayers => write!(f, "At least 2 players are needed to start"),
            Self::InvalidActor => write!(f, "Action not allowed for this player"),
            Self::WrongPhase => write!(f, "Action not allowed in this phase"),
        }
    }
}

impl std::error::Error for GameError {}

/// Phase-transition logic operating on rooms.
///
/// Holds the configuration and the word catalog; all mutable state lives
/// in the [`RoomDirectory`] and [`TurnScheduler`] passed into each call.
#[derive(Debug)]
pub struct GameMachine {
    pub config: GameConfig,
    pub catalog: WordCatalog,
}

impl GameMachine {
    pub fn new(config: GameConfig, catalog: WordCatalog) -> Self {
        Self { config, catalog }
    }

    /// `waiting -> picking`: any member may start the first round.
    pub fn start_game<R: Rng + ?Sized>(
        &self,
        rooms: &mut RoomDirectory,
        room_id: &str,
        actor: &str,
        rng: &mut R,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if !room.has_player(actor) {
            return Err(GameError::InvalidActor);
        }
        if room.phase != RoomPhase::Waiting {
            return Err(GameError::WrongPhase);
        }
        if room.player_count() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers);
        }
        Ok(self.begin_picking(room, rng))
    }

    /// Host-initiated restart from the lobby after a finished round.
    pub fn start_again<R: Rng + ?Sized>(
        &self,
        rooms: &mut RoomDirectory,
        room_id: &str,
        actor: &str,
        rng: &mut R,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if room.phase != RoomPhase::Waiting {
            return Err(GameError::WrongPhase);
        }
        if !room.is_host(actor) {
            return Err(GameError::InvalidActor);
        }
        if room.player_count() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers);
        }
        let mut events = self.begin_picking(room, rng);
        events.push(Outbound::broadcast(
            room_id,
            ServerEvent::UpdatePlayers {
                players: room.players_json(),
            },
        ));
        Ok(events)
    }

    /// Enter the picking phase: shuffle the turn order, derive the pairing
    /// cycle from it, and deal word choices to every giver.
    ///
    /// The shuffle is retried up to the configured bound until no giver is
    /// paired with their previous round's receiver; if the bound runs out
    /// the last candidate is accepted, repeats and all.
    fn begin_picking<R: Rng + ?Sized>(&self, room: &mut Room, rng: &mut R) -> Vec<Outbound> {
        room.phase = RoomPhase::Picking;

        let mut order: Vec<String> = room.player_ids().cloned().collect();
        order.shuffle(rng);
        for attempt in 0..self.config.pairing_attempts {
            if pairing_avoids_repeats(room, &order) {
                break;
            }
            if attempt + 1 == self.config.pairing_attempts {
                debug!(room = %room.id, "no repeat-free pairing found, accepting repeats");
            }
            order.shuffle(rng);
        }

        let n = order.len();
        let mut pairs = HashMap::with_capacity(n);
        for i in 0..n {
            pairs.insert(order[i].clone(), order[(i + 1) % n].clone());
        }
        room.turn_order = order;
        room.pairs = pairs;
        room.words_to_submit = n;
        room.current_turn = None;
        room.turn_count = 0;

        debug!(room = %room.id, players = n, "picking phase started");

        room.turn_order
            .iter()
            .map(|giver| {
                let receiver = &room.pairs[giver];
                let partner_name = room
                    .get_player(receiver)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                Outbound::unicast(
                    giver.clone(),
                    ServerEvent::PickingStarted {
                        partner_name,
                        choices: self
                            .catalog
                            .sample_choices_with_rng(self.config.word_choices, rng),
                    },
                )
            })
            .collect()
    }

    /// A giver picks a catalog word for their receiver.
    ///
    /// Words not in the catalog are dropped without a reply, matching the
    /// treatment of any other malformed input.
    pub fn submit_word(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        room_id: &str,
        actor: &str,
        word: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        let entry = match self.catalog.find(word) {
            Some(entry) => entry.clone(),
            None => {
                debug!(room = %room_id, word, "ignoring unknown catalog word");
                return Ok(vec![]);
            }
        };
        self.assign_word(rooms, timers, room_id, actor, entry)
    }

    /// A giver submits a free-text word for their receiver.
    pub fn submit_custom_word(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        room_id: &str,
        actor: &str,
        custom_word: &str,
        custom_hint: Option<&str>,
    ) -> Result<Vec<Outbound>, GameError> {
        let word = custom_word.trim();
        if word.is_empty() {
            return Ok(vec![]);
        }
        let hint = custom_hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_CUSTOM_HINT);
        self.assign_word(
            rooms,
            timers,
            room_id,
            actor,
            WordEntry::new(word, hint),
        )
    }

    /// Write a word onto the actor's receiver. The receiver's `picked`
    /// flag guards the counter: only the first assignment of the round
    /// decrements it, so a giver may revise freely before lock-in.
    fn assign_word(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        room_id: &str,
        actor: &str,
        entry: WordEntry,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if room.phase != RoomPhase::Picking {
            return Err(GameError::WrongPhase);
        }
        let receiver_id = room
            .pairs
            .get(actor)
            .cloned()
            .ok_or(GameError::InvalidActor)?;

        let first_assignment = {
            let receiver = room
                .get_player_mut(&receiver_id)
                .ok_or(GameError::InvalidActor)?;
            let first = !receiver.picked;
            receiver.picked = true;
            receiver.current_word = Some(entry);
            first
        };
        if first_assignment {
            room.words_to_submit = room.words_to_submit.saturating_sub(1);
        }

        let mut events = vec![
            Outbound::unicast(actor, ServerEvent::WordSubmitted),
            Outbound::broadcast(
                room_id,
                ServerEvent::UpdatePlayers {
                    players: room.players_json(),
                },
            ),
        ];
        events.extend(self.fire_ready_gate(room, timers));
        Ok(events)
    }

    /// A player locks in for the playing phase.
    pub fn set_ready(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        room_id: &str,
        actor: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if room.phase != RoomPhase::Picking {
            return Err(GameError::WrongPhase);
        }
        let player = room.get_player_mut(actor).ok_or(GameError::InvalidActor)?;
        player.is_ready = true;

        let mut events = vec![Outbound::broadcast(
            room_id,
            ServerEvent::UpdatePlayers {
                players: room.players_json(),
            },
        )];
        events.extend(self.fire_ready_gate(room, timers));
        Ok(events)
    }

    /// A player backs out before the round starts.
    pub fn set_unready(
        &self,
        rooms: &mut RoomDirectory,
        room_id: &str,
        actor: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if room.phase != RoomPhase::Picking {
            return Err(GameError::WrongPhase);
        }
        let player = room.get_player_mut(actor).ok_or(GameError::InvalidActor)?;
        player.is_ready = false;

        Ok(vec![Outbound::broadcast(
            room_id,
            ServerEvent::UpdatePlayers {
                players: room.players_json(),
            },
        )])
    }

    /// `picking -> playing`, once every player is ready with a word.
    ///
    /// Evaluated after every mutation that can satisfy the gate: ready
    /// toggles, word submissions, and departures during picking.
    fn fire_ready_gate(&self, room: &mut Room, timers: &mut TurnScheduler) -> Vec<Outbound> {
        if room.phase != RoomPhase::Picking || !room.all_ready_with_words() {
            return vec![];
        }

        // Snapshot each giver's receiver for next round's anti-repeat check.
        let pairs: Vec<(String, String)> = room
            .pairs
            .iter()
            .map(|(g, r)| (g.clone(), r.clone()))
            .collect();
        for (giver, receiver) in pairs {
            if let Some(player) = room.get_player_mut(&giver) {
                player.last_partner_id = Some(receiver);
            }
        }
        for player in room.players_mut() {
            player.picked = false;
        }
        room.phase = RoomPhase::Playing;
        debug!(room = %room.id, "playing phase started");

        let mut events = vec![
            Outbound::broadcast(&room.id, ServerEvent::AllWordsSubmitted),
            Outbound::broadcast(
                &room.id,
                ServerEvent::UpdatePlayers {
                    players: room.players_json(),
                },
            ),
        ];
        events.extend(self.next_turn(room, timers));
        events
    }

    /// Advance the turn to the next active player after the current holder.
    pub fn next_turn(&self, room: &mut Room, timers: &mut TurnScheduler) -> Vec<Outbound> {
        let start = room
            .current_turn
            .as_deref()
            .and_then(|id| room.turn_position(id))
            .map(|pos| pos + 1)
            .unwrap_or(0);
        self.advance_turn_from(room, timers, start)
    }

    /// Rotation core: scan forward from `start` (wrapping) for the first
    /// player who has not guessed yet. Visits each slot at most once.
    ///
    /// With no active players left this is a no-op; ending the round is
    /// the guess/departure paths' job.
    fn advance_turn_from(
        &self,
        room: &mut Room,
        timers: &mut TurnScheduler,
        start: usize,
    ) -> Vec<Outbound> {
        timers.cancel(&room.id);

        let len = room.turn_order.len();
        let mut next = None;
        for i in 0..len {
            let candidate = &room.turn_order[(start + i) % len];
            if room
                .get_player(candidate)
                .is_some_and(|p| p.is_active())
            {
                next = Some(candidate.clone());
                break;
            }
        }
        let Some(next) = next else {
            return vec![];
        };

        room.turn_count += 1;
        room.current_turn = Some(next.clone());
        timers.arm(&room.id, TimerKind::TurnTimeout, self.config.turn_timeout());
        debug!(room = %room.id, turn = %next, count = room.turn_count, "turn advanced");

        vec![Outbound::broadcast(
            &room.id,
            ServerEvent::TurnChanged {
                current_turn: next,
                turn_count: room.turn_count,
            },
        )]
    }

    /// The turn holder guesses their own word.
    ///
    /// An incorrect guess is broadcast but keeps the turn and the running
    /// timer; the holder may try again until the timeout.
    pub fn make_guess(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        room_id: &str,
        actor: &str,
        guess: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if room.phase != RoomPhase::Playing {
            return Err(GameError::WrongPhase);
        }
        if room.current_turn.as_deref() != Some(actor) {
            return Err(GameError::InvalidActor);
        }
        let player = room.get_player(actor).ok_or(GameError::InvalidActor)?;
        if player.has_guessed {
            // Stale turn holder during the inter-round pause.
            return Err(GameError::InvalidActor);
        }
        let word = match &player.current_word {
            Some(entry) => entry.word.clone(),
            None => {
                warn!(room = %room_id, player = %actor, "turn holder has no word assigned");
                return Ok(vec![]);
            }
        };

        let is_correct = guess.trim().to_lowercase() == word.trim().to_lowercase();
        let mut events = vec![Outbound::broadcast(
            room_id,
            ServerEvent::GuessMade {
                player_id: actor.to_string(),
                guess: guess.to_string(),
                is_correct,
            },
        )];
        if !is_correct {
            return Ok(events);
        }

        let player = room.get_player_mut(actor).expect("guesser is live");
        player.score += 1;
        player.has_guessed = true;
        events.push(Outbound::broadcast(
            room_id,
            ServerEvent::UpdatePlayers {
                players: room.players_json(),
            },
        ));

        if room.all_guessed() {
            events.extend(self.finish_round(room, timers));
        } else {
            events.extend(self.next_turn(room, timers));
        }
        Ok(events)
    }

    /// The turn holder passes voluntarily.
    pub fn skip_turn(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        room_id: &str,
        actor: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if room.phase != RoomPhase::Playing {
            return Err(GameError::WrongPhase);
        }
        if room.current_turn.as_deref() != Some(actor) {
            return Err(GameError::InvalidActor);
        }
        let player = room.get_player_mut(actor).ok_or(GameError::InvalidActor)?;
        if player.has_guessed {
            return Err(GameError::InvalidActor);
        }
        player.skip_count += 1;

        let mut events = vec![
            Outbound::broadcast(
                room_id,
                ServerEvent::UpdatePlayers {
                    players: room.players_json(),
                },
            ),
            Outbound::broadcast(
                room_id,
                ServerEvent::TurnSkipped {
                    player_id: actor.to_string(),
                },
            ),
        ];
        events.extend(self.next_turn(room, timers));
        Ok(events)
    }

    /// One-time hint reveal, unlocked by accumulated skips.
    pub fn request_hint(
        &self,
        rooms: &mut RoomDirectory,
        room_id: &str,
        actor: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        let room = rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        if room.phase != RoomPhase::Playing {
            return Err(GameError::WrongPhase);
        }
        if room.current_turn.as_deref() != Some(actor) {
            return Err(GameError::InvalidActor);
        }
        let player = room.get_player_mut(actor).ok_or(GameError::InvalidActor)?;
        if player.skip_count < self.config.skip_hint_threshold || player.hint_used {
            debug!(room = %room_id, player = %actor, "hint not available");
            return Ok(vec![]);
        }
        let hint = match &player.current_word {
            Some(entry) => entry.hint.clone(),
            None => return Ok(vec![]),
        };
        player.hint_used = true;

        Ok(vec![Outbound::unicast(actor, ServerEvent::Hint { hint })])
    }

    /// A turn timer fired: the holder loses the turn without penalty.
    pub fn handle_turn_timeout(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        room_id: &str,
    ) -> Vec<Outbound> {
        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                warn!(room = %room_id, "turn timeout for vanished room");
                return vec![];
            }
        };
        if room.phase != RoomPhase::Playing {
            warn!(room = %room_id, phase = room.phase.as_str(), "turn timeout outside playing phase");
            return vec![];
        }
        let Some(holder) = room.current_turn.clone() else {
            return vec![];
        };

        let mut events = vec![Outbound::broadcast(
            room_id,
            ServerEvent::TurnEnded { player_id: holder },
        )];
        events.extend(self.next_turn(room, timers));
        events
    }

    /// Every player guessed: announce, stop the clock, schedule the reset.
    fn finish_round(&self, room: &mut Room, timers: &mut TurnScheduler) -> Vec<Outbound> {
        timers.cancel(&room.id);
        timers.arm(
            &room.id,
            TimerKind::RoundReset,
            self.config.round_reset_delay(),
        );
        info!(room = %room.id, turns = room.turn_count, "round finished");

        vec![Outbound::broadcast(&room.id, ServerEvent::RoundFinished)]
    }

    /// The inter-round pause elapsed: clear round state and either return
    /// to the lobby or roll straight into the next picking phase.
    pub fn handle_round_reset<R: Rng + ?Sized>(
        &self,
        rooms: &mut RoomDirectory,
        room_id: &str,
        rng: &mut R,
    ) -> Vec<Outbound> {
        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                warn!(room = %room_id, "round reset for vanished room");
                return vec![];
            }
        };

        for player in room.players_mut() {
            player.reset_round();
        }
        room.pairs.clear();
        room.turn_order.clear();
        room.words_to_submit = 0;
        room.current_turn = None;
        room.turn_count = 0;
        room.phase = RoomPhase::Waiting;

        let restart = self.config.inter_round == InterRoundPolicy::Restart
            && room.player_count() >= self.config.min_players;
        if restart {
            let mut events = self.begin_picking(room, rng);
            events.push(Outbound::broadcast(
                room_id,
                ServerEvent::UpdatePlayers {
                    players: room.players_json(),
                },
            ));
            return events;
        }

        debug!(room = %room_id, "room back in lobby");
        vec![
            Outbound::broadcast(
                room_id,
                ServerEvent::UpdatePlayers {
                    players: room.players_json(),
                },
            ),
            Outbound::broadcast(room_id, ServerEvent::BackToLobby),
        ]
    }

    /// A player's connection dropped.
    ///
    /// Empty rooms are torn down silently. Dropping below the player
    /// minimum mid-round aborts the room: the pairing and turn-order
    /// invariants cannot be repaired below two players. Otherwise the
    /// room shrinks and the affected phase is patched up around the gap.
    pub fn handle_disconnect(
        &self,
        rooms: &mut RoomDirectory,
        timers: &mut TurnScheduler,
        handle: &str,
    ) -> Vec<Outbound> {
        let Some(room_id) = rooms.room_id_for_player(handle).map(String::from) else {
            return vec![];
        };
        let (was_current, vacated_slot) = {
            let room = match rooms.get(&room_id) {
                Some(room) => room,
                None => return vec![],
            };
            (
                room.current_turn.as_deref() == Some(handle),
                room.turn_position(handle),
            )
        };

        let _ = rooms.remove_player(handle);
        let room = match rooms.get_mut(&room_id) {
            Some(room) => room,
            None => return vec![],
        };

        if room.is_empty() {
            timers.cancel(&room_id);
            rooms.remove(&room_id);
            return vec![];
        }

        if room.phase.is_in_round() && room.player_count() < self.config.min_players {
            info!(room = %room_id, "aborting room, not enough players");
            timers.cancel(&room_id);
            rooms.remove(&room_id);
            return vec![Outbound::broadcast(
                &room_id,
                ServerEvent::GameAborted {
                    message: ABORT_MESSAGE.to_string(),
                },
            )];
        }

        let mut events = vec![Outbound::broadcast(
            &room_id,
            ServerEvent::UpdatePlayers {
                players: room.players_json(),
            },
        )];

        match room.phase {
            RoomPhase::Waiting => {}
            RoomPhase::Picking => {
                // The departed player may have been the last unpicked
                // receiver, or the last one holding the gate shut.
                room.words_to_submit = room.unpicked_count();
                events.extend(self.fire_ready_gate(room, timers));
            }
            RoomPhase::Playing => {
                if room.all_guessed() {
                    events.extend(self.finish_round(room, timers));
                } else if was_current {
                    // The vacated slot's index now points at the next
                    // player in the shrunk order.
                    events.extend(self.advance_turn_from(
                        room,
                        timers,
                        vacated_slot.unwrap_or(0),
                    ));
                }
            }
        }
        events
    }
}

/// Whether the cyclic pairing induced by `order` avoids every giver's
/// previous-round receiver.
fn pairing_avoids_repeats(room: &Room, order: &[String]) -> bool {
    let n = order.len();
    (0..n).all(|i| {
        let giver = &order[i];
        let receiver = &order[(i + 1) % n];
        room.get_player(giver)
            .map_or(true, |p| p.last_partner_id.as_ref() != Some(receiver))
    })
}
