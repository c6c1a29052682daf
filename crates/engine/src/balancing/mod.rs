//! Balancing policies: pure, deterministic decision functions. They plan
//! moves over detached occupancy snapshots and never touch storage, so
//! identical inputs always produce identical plans.

mod chips;
mod redistribute;
mod uniform;

pub use chips::balance_by_chips;
pub use redistribute::{redistribute, CapacityShortfall};
pub use uniform::uniform_fill;

use uuid::Uuid;

/// Seat coordinates: a table number plus a 0-based seat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatPos {
    pub table_number: u32,
    pub seat_index: usize,
}

/// Occupancy snapshot of one open table.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub id: Uuid,
    pub table_number: u32,
    pub seats: Vec<Option<Uuid>>,
}

impl TableLayout {
    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.is_some()).count()
    }

    pub fn empty_seat_count(&self) -> usize {
        self.seats.len() - self.occupied_count()
    }

    pub fn has_empty_seat(&self) -> bool {
        self.seats.iter().any(|seat| seat.is_none())
    }

    pub fn first_empty_seat(&self) -> Option<usize> {
        self.seats.iter().position(|seat| seat.is_none())
    }
}

/// A participant eligible for placement.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub chips: i64,
    pub current: Option<SeatPos>,
}

/// One planned relocation. Nothing is written until the engine commits it.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    pub participant_id: Uuid,
    pub participant_name: String,
    pub from: Option<SeatPos>,
    pub to_table_id: Uuid,
    pub to: SeatPos,
}

/// Outcome of a fill policy: planned moves plus the candidates that found
/// no seat anywhere.
#[derive(Debug, Clone, Default)]
pub struct FillPlan {
    pub moves: Vec<PlannedMove>,
    pub unassigned: Vec<Uuid>,
}
