//! Game configuration.
//!
//! Tunables observed to vary between deployments (turn timeout, hint
//! threshold, inter-round behavior) live here instead of being hardcoded.
//! Everything has a default so `GameConfig::default()` is a playable setup.

use std::time::Duration;

use serde::Deserialize;

/// Default maximum players per room.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// Default minimum players to start or continue a round.
pub const DEFAULT_MIN_PLAYERS: usize = 2;

/// Default per-turn timeout in seconds.
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 45;

/// Default skips required before the hint unlocks.
pub const DEFAULT_SKIP_HINT_THRESHOLD: u32 = 12;

/// Default pause between round end and the next phase, in seconds.
pub const DEFAULT_ROUND_RESET_SECS: u64 = 5;

/// Default number of word choices offered to each giver.
pub const DEFAULT_WORD_CHOICES: usize = 6;

/// Default bound on pairing reshuffle attempts.
pub const DEFAULT_PAIRING_ATTEMPTS: u32 = 50;

/// Default bound on room code generation attempts.
pub const DEFAULT_CODE_ATTEMPTS: u32 = 16;

/// What happens once the inter-round pause elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterRoundPolicy {
    /// Return to the waiting phase; the host starts the next round.
    #[default]
    ReturnToLobby,
    /// Begin the next picking phase immediately.
    Restart,
}

/// Game tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maximum players allowed to join a room.
    pub max_players: usize,

    /// Minimum players to start a round; dropping below this mid-round
    /// aborts the room.
    pub min_players: usize,

    /// Seconds the turn holder has before the turn times out.
    pub turn_timeout_secs: u64,

    /// Skips a player must accumulate before they may reveal their hint.
    pub skip_hint_threshold: u32,

    /// Seconds between round completion and the next phase.
    pub round_reset_secs: u64,

    /// Catalog words offered to each giver.
    pub word_choices: usize,

    /// Reshuffles attempted before accepting a repeat pairing.
    pub pairing_attempts: u32,

    /// Room codes tried before giving up with a capacity error.
    pub code_attempts: u32,

    /// Behavior after the inter-round pause.
    pub inter_round: InterRoundPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            min_players: DEFAULT_MIN_PLAYERS,
            turn_timeout_secs: DEFAULT_TURN_TIMEOUT_SECS,
            skip_hint_threshold: DEFAULT_SKIP_HINT_THRESHOLD,
            round_reset_secs: DEFAULT_ROUND_RESET_SECS,
            word_choices: DEFAULT_WORD_CHOICES,
            pairing_attempts: DEFAULT_PAIRING_ATTEMPTS,
            code_attempts: DEFAULT_CODE_ATTEMPTS,
            inter_round: InterRoundPolicy::ReturnToLobby,
        }
    }
}

impl GameConfig {
    /// Per-turn timeout as a `Duration`.
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    /// Inter-round pause as a `Duration`.
    pub fn round_reset_delay(&self) -> Duration {
        Duration::from_secs(self.round_reset_secs)
    }
}
