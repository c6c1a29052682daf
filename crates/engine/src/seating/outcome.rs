use std::fmt;

use infra::models::BalancingResult;
use uuid::Uuid;

/// Why one input of a best-effort batch operation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No open table had an empty seat left.
    NoSeatAvailable,
    /// Optimistic retries were exhausted while committing the move.
    RetriesExhausted,
    /// Another session took the target seat after planning.
    SeatTaken,
    /// The participant's seat changed after planning.
    Displaced,
    /// The participant no longer exists.
    Missing,
    /// The participant is not active.
    NotActive,
    /// The participant already holds a seat.
    AlreadySeated,
    /// The participant holds no seat; chip balancing reseats seated players only.
    NotSeated,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoSeatAvailable => "no empty seat available",
            SkipReason::RetriesExhausted => "optimistic retries exhausted",
            SkipReason::SeatTaken => "target seat taken concurrently",
            SkipReason::Displaced => "seat changed after planning",
            SkipReason::Missing => "participant not found",
            SkipReason::NotActive => "participant not active",
            SkipReason::AlreadySeated => "participant already seated",
            SkipReason::NotSeated => "participant not seated",
        };
        f.write_str(text)
    }
}

/// One batch input that was not applied, and why. Batch operations never
/// silently drop inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedParticipant {
    pub participant_id: Uuid,
    pub reason: SkipReason,
}

/// Partial-success result of a best-effort batch operation. Moves listed
/// here are committed and stay committed even when later inputs fail.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub moves: Vec<BalancingResult>,
    pub skipped: Vec<SkippedParticipant>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
