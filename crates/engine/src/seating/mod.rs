mod outcome;
mod service;

pub use outcome::{BatchOutcome, SkipReason, SkippedParticipant};
pub use service::{SeatAssignmentEngine, SeatRef, DEFAULT_MAX_SEATS};
