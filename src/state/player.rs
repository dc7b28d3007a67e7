//! Per-player state.
//!
//! A player exists from join until disconnect or room teardown. Most fields
//! are round-scoped and reset between rounds; score and the previous-round
//! partner survive so the next pairing can avoid repeats.

use crate::state::catalog::WordEntry;

/// A player's state within a room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Opaque connection handle, stable for the connection's lifetime.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Correct guesses across all rounds in this room.
    pub score: u32,

    /// Secret word assigned by this player's giver, once submitted.
    pub current_word: Option<WordEntry>,

    /// Whether the player has locked in for the playing phase.
    pub is_ready: bool,

    /// Whether the player has guessed their word this round.
    pub has_guessed: bool,

    /// Turns this player has skipped this round.
    pub skip_count: u32,

    /// Receiver this player gave to in the previous round.
    pub last_partner_id: Option<String>,

    /// Guard on the words-to-submit counter: set on this player's first
    /// word assignment of the round, so a giver revising their choice does
    /// not decrement twice.
    pub picked: bool,

    /// Whether the one hint reveal of this round has been spent.
    pub hint_used: bool,

    /// When the player joined the room.
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0,
            current_word: None,
            is_ready: false,
            has_guessed: false,
            skip_count: 0,
            last_partner_id: None,
            picked: false,
            hint_used: false,
            joined_at: chrono::Utc::now(),
        }
    }

    /// Clear round-scoped fields, keeping score and the anti-repeat partner.
    pub fn reset_round(&mut self) {
        self.current_word = None;
        self.is_ready = false;
        self.has_guessed = false;
        self.skip_count = 0;
        self.picked = false;
        self.hint_used = false;
    }

    /// Whether this player still has a turn coming this round.
    pub fn is_active(&self) -> bool {
        !self.has_guessed
    }

    /// Snapshot sent to clients in `updatePlayers`.
    ///
    /// Includes the assigned word: every player sees the others' words, and
    /// hiding one's own is the client's job.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "score": self.score,
            "currentWord": self.current_word.as_ref().map(|w| w.to_json()),
            "isReady": self.is_ready,
            "hasGuessed": self.has_guessed,
            "skipCount": self.skip_count
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_new_defaults() {
        let player = Player::new("conn-1", "Alice");
        assert_eq!(player.score, 0);
        assert!(player.current_word.is_none());
        assert!(!player.is_ready);
        assert!(!player.has_guessed);
        assert_eq!(player.skip_count, 0);
        assert!(player.last_partner_id.is_none());
        assert!(player.is_active());
    }

    #[test]
    fn test_reset_round_preserves_score_and_partner() {
        let mut player = Player::new("conn-1", "Alice");
        player.score = 3;
        player.current_word = Some(WordEntry::new("Batman", "Wears a cape"));
        player.is_ready = true;
        player.has_guessed = true;
        player.skip_count = 12;
        player.last_partner_id = Some("conn-2".to_string());
        player.picked = true;
        player.hint_used = true;

        player.reset_round();

        assert_eq!(player.score, 3);
        assert_eq!(player.last_partner_id.as_deref(), Some("conn-2"));
        assert!(player.current_word.is_none());
        assert!(!player.is_ready);
        assert!(!player.has_guessed);
        assert_eq!(player.skip_count, 0);
        assert!(!player.picked);
        assert!(!player.hint_used);
    }

    #[test]
    fn test_to_json_includes_word() {
        let mut player = Player::new("conn-1", "Alice");
        player.current_word = Some(WordEntry::new("Batman", "Wears a cape"));

        let json = player.to_json();
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["currentWord"]["word"], "Batman");
        assert_eq!(json["hasGuessed"], false);
    }
}
