//! PairWord State Library
//!
//! This crate provides state management for PairWord game logic: a
//! turn-based party game where each player's secret word is chosen by a
//! partner, and players take rotating, time-limited turns guessing their
//! own word.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Room Directory** - Creates rooms with collision-resistant codes,
//!   resolves players to rooms, owns every room's lifecycle.
//!
//! - **Game State Machine** - Phase transitions (waiting → picking →
//!   playing), partner pairing with an anti-repeat shuffle, turn rotation
//!   that skips finished players, guess/skip/hint handling, and graceful
//!   degradation when players disconnect mid-round.
//!
//! - **Turn Scheduler** - At most one pending timeout per room; arming a
//!   new timer atomically invalidates the previous one, so a stale turn
//!   timeout can never fire after the turn has advanced.
//!
//! - **Protocol Types** - Inbound player actions and outbound events with
//!   their delivery targets.
//!
//! # Design Principles
//!
//! 1. **Handlers validate against the phase** - Actions that do not fit
//!    the room's current phase are rejected or dropped, never applied.
//!
//! 2. **No networking** - This crate is pure state; the transport decodes
//!    inbound events, drives [`state::AppState`], and delivers the
//!    returned outbound events.
//!
//! 3. **Single queue per room** - All actions and timer firings for a
//!    room are serialized by the caller; handlers run to completion, so
//!    room state never races.
//!
//! 4. **Serialization-ready** - All client-facing state converts to JSON.
//!
//! # Example
//!
//! ```rust
//! use pairword_state::state::{
//!     AppState, ClientEvent, GameConfig, ServerEvent,
//!     WordCatalog, WordCategory, WordEntry,
//! };
//!
//! let catalog = WordCatalog::from_categories(vec![WordCategory {
//!     name: "heroes".to_string(),
//!     entries: vec![WordEntry::new("Batman", "Wears a cape")],
//! }]);
//! let mut app = AppState::new(GameConfig::default(), catalog);
//!
//! // A connection creates a room...
//! let events = app.handle_event(
//!     "conn-1",
//!     ClientEvent::CreateRoom { player_name: "Alice".to_string() },
//! );
//! let room_id = match &events[0].event {
//!     ServerEvent::RoomCreated { room_id, .. } => room_id.clone(),
//!     _ => unreachable!(),
//! };
//!
//! // ...and another joins it.
//! let events = app.handle_event(
//!     "conn-2",
//!     ClientEvent::JoinRoom { player_name: "Bob".to_string(), room_id },
//! );
//! assert_eq!(events[0].event.name(), "joinedRoom");
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
