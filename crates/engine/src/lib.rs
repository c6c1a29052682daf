//! Seat assignment and table balancing engine for live poker tournaments.
//!
//! The engine is the sole mutator of table and participant documents. Every
//! seat-owner change writes the affected table document(s) and participant
//! document(s) inside one optimistic transaction, which is what keeps the
//! denormalized seat fields consistent under concurrent admin sessions.

pub mod balancing;
pub mod error;
pub mod seating;
pub mod txn;

pub use error::{EngineError, EngineResult};
pub use seating::{
    BatchOutcome, SeatAssignmentEngine, SeatRef, SkipReason, SkippedParticipant,
};
pub use txn::TxnCoordinator;
