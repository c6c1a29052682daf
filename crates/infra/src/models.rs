use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Upcoming,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentDoc {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub status: TournamentStatus,
    /// Seats per table for tables opened into this tournament.
    pub default_max_seats: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Standby,
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDoc {
    pub id: Uuid,
    /// `None` places the table in the unassigned pool.
    pub tournament_id: Option<Uuid>,
    pub table_number: u32,
    pub name: String,
    /// Fixed-length seat array, index to participant id. Always `max_seats` long.
    pub seats: Vec<Option<Uuid>>,
    pub max_seats: usize,
    pub status: TableStatus,
    pub display_order: u32,
    pub created_at: DateTime<Utc>,
}

impl TableDoc {
    pub fn is_open(&self) -> bool {
        self.status == TableStatus::Open
    }

    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.is_some()).count()
    }

    /// Seat index currently held by the participant, if any.
    pub fn seat_of(&self, participant_id: Uuid) -> Option<usize> {
        self.seats
            .iter()
            .position(|seat| *seat == Some(participant_id))
    }

    pub fn occupants(&self) -> impl Iterator<Item = (usize, Uuid)> + '_ {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(index, seat)| seat.map(|id| (index, id)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Busted,
    NoShow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDoc {
    pub id: Uuid,
    pub tournament_id: Option<Uuid>,
    pub name: String,
    pub chips: i64,
    pub status: ParticipantStatus,
    /// Denormalized seat location; must always match the owning table's
    /// seat array. `seat_number` is 1-based, both are `None` when unseated.
    pub table_number: Option<u32>,
    pub seat_number: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl ParticipantDoc {
    pub fn is_active(&self) -> bool {
        self.status == ParticipantStatus::Active
    }

    pub fn is_seated(&self) -> bool {
        self.table_number.is_some() && self.seat_number.is_some()
    }
}

/// Audit record of one committed relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancingResult {
    pub participant_id: Uuid,
    pub participant_name: String,
    pub from_table_number: Option<u32>,
    pub from_seat_index: Option<usize>,
    pub to_table_number: u32,
    pub to_seat_index: usize,
}

/// Which tables and participants an operation may look at. Balancing never
/// crosses tournament boundaries unless `All` is passed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every tournament plus the unassigned pool.
    All,
    Tournament(Uuid),
}

impl Scope {
    /// The scope a table's own occupants are balanced within.
    pub fn of_table(table: &TableDoc) -> Scope {
        match table.tournament_id {
            Some(id) => Scope::Tournament(id),
            None => Scope::All,
        }
    }

    pub fn contains_table(&self, table: &TableDoc) -> bool {
        match self {
            Scope::All => true,
            Scope::Tournament(id) => table.tournament_id == Some(*id),
        }
    }

    pub fn contains_participant(&self, participant: &ParticipantDoc) -> bool {
        match self {
            Scope::All => true,
            Scope::Tournament(id) => participant.tournament_id == Some(*id),
        }
    }
}
