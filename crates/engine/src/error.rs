use infra::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("seat {seat_index} on table {table_number} is already occupied")]
    SeatOccupied { table_number: u32, seat_index: usize },

    #[error("not enough empty seats: {required} needed, {available} available")]
    CapacityExceeded { required: usize, available: usize },

    #[error("transaction conflict: optimistic retries exhausted")]
    Conflict,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("store error")]
    Store(#[source] StoreError),
}

impl EngineError {
    /// Transient errors are retried by the transaction coordinator; the
    /// rest are user-actionable and surface immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Conflict | EngineError::NotFound { .. })
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => EngineError::Conflict,
            other => EngineError::Store(other),
        }
    }
}
