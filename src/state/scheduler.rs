//! Turn scheduler.
//!
//! At most one pending timer exists per room. Arming a timer for a room
//! replaces whatever was pending, so a timeout armed for an old turn can
//! never fire after the turn has legitimately advanced. The scheduler owns
//! no game state; it maps room codes to deadlines and hands back due
//! entries for the state machine to act on.
//!
//! Two driving styles are supported: polling `expired()` from an event
//! loop tick, or arming real timers externally and validating each firing
//! through `try_fire` with the token returned by `arm`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// What a pending timer means when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The turn holder ran out of time; equivalent to a skip.
    TurnTimeout,
    /// The inter-round pause elapsed; reset the room for the next round.
    RoundReset,
}

/// Identifies one arming of a timer. Re-arming or cancelling invalidates
/// all previously issued tokens for that room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// A single armed timer.
#[derive(Debug, Clone)]
struct PendingTimer {
    kind: TimerKind,
    deadline: Instant,
    token: TimerToken,
}

/// Per-room single-slot timer table.
#[derive(Debug, Default)]
pub struct TurnScheduler {
    timers: HashMap<String, PendingTimer>,
    next_token: u64,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for a room, replacing any pending one.
    pub fn arm(&mut self, room_id: &str, kind: TimerKind, delay: Duration) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.timers.insert(
            room_id.to_string(),
            PendingTimer {
                kind,
                deadline: Instant::now() + delay,
                token,
            },
        );
        token
    }

    /// Discard the pending timer for a room, if any.
    pub fn cancel(&mut self, room_id: &str) -> bool {
        self.timers.remove(room_id).is_some()
    }

    /// Kind of the pending timer for a room.
    pub fn pending(&self, room_id: &str) -> Option<TimerKind> {
        self.timers.get(room_id).map(|t| t.kind)
    }

    /// Remaining time until the room's timer fires.
    pub fn time_remaining(&self, room_id: &str) -> Option<Duration> {
        self.timers
            .get(room_id)
            .map(|t| t.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Remove and return every timer whose deadline has passed.
    pub fn expired(&mut self) -> Vec<(String, TimerKind)> {
        let now = Instant::now();
        let due: Vec<String> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();

        due.into_iter()
            .filter_map(|id| self.timers.remove(&id).map(|t| (id, t.kind)))
            .collect()
    }

    /// Consume the pending timer if `token` still identifies it.
    ///
    /// Returns `None` when the timer was re-armed or cancelled since the
    /// token was issued; the caller must then drop the firing.
    pub fn try_fire(&mut self, room_id: &str, token: TimerToken) -> Option<TimerKind> {
        match self.timers.get(room_id) {
            Some(t) if t.token == token => self.timers.remove(room_id).map(|t| t.kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_expire() {
        let mut scheduler = TurnScheduler::new();
        scheduler.arm("ABC123", TimerKind::TurnTimeout, Duration::ZERO);

        assert_eq!(scheduler.pending("ABC123"), Some(TimerKind::TurnTimeout));

        let fired = scheduler.expired();
        assert_eq!(fired, vec![("ABC123".to_string(), TimerKind::TurnTimeout)]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_not_yet_due() {
        let mut scheduler = TurnScheduler::new();
        scheduler.arm("ABC123", TimerKind::TurnTimeout, Duration::from_secs(3600));

        assert!(scheduler.expired().is_empty());
        assert_eq!(scheduler.pending_count(), 1);
        assert!(scheduler.time_remaining("ABC123").unwrap() > Duration::from_secs(3000));
    }

    #[test]
    fn test_rearm_replaces() {
        let mut scheduler = TurnScheduler::new();
        scheduler.arm("ABC123", TimerKind::TurnTimeout, Duration::ZERO);
        scheduler.arm("ABC123", TimerKind::RoundReset, Duration::from_secs(3600));

        // The first timer would be due, but re-arming replaced it.
        assert!(scheduler.expired().is_empty());
        assert_eq!(scheduler.pending("ABC123"), Some(TimerKind::RoundReset));
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = TurnScheduler::new();
        scheduler.arm("ABC123", TimerKind::TurnTimeout, Duration::ZERO);

        assert!(scheduler.cancel("ABC123"));
        assert!(!scheduler.cancel("ABC123"));
        assert!(scheduler.expired().is_empty());
    }

    #[test]
    fn test_stale_token_does_not_fire() {
        let mut scheduler = TurnScheduler::new();
        let stale = scheduler.arm("ABC123", TimerKind::TurnTimeout, Duration::ZERO);
        let live = scheduler.arm("ABC123", TimerKind::TurnTimeout, Duration::ZERO);

        assert_eq!(scheduler.try_fire("ABC123", stale), None);
        assert_eq!(
            scheduler.try_fire("ABC123", live),
            Some(TimerKind::TurnTimeout)
        );
        // Consumed; a second firing of the same token is a no-op.
        assert_eq!(scheduler.try_fire("ABC123", live), None);
    }

    #[test]
    fn test_rooms_are_independent() {
        let mut scheduler = TurnScheduler::new();
        scheduler.arm("AAAAAA", TimerKind::TurnTimeout, Duration::ZERO);
        scheduler.arm("BBBBBB", TimerKind::TurnTimeout, Duration::from_secs(3600));

        let fired = scheduler.expired();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, "AAAAAA");
        assert_eq!(scheduler.pending("BBBBBB"), Some(TimerKind::TurnTimeout));
    }
}
