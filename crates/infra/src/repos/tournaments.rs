use uuid::Uuid;

use crate::models::TournamentDoc;
use crate::store::{Collection, DocumentStore, StoreResult, TxnSession, Versioned};

pub async fn get<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    id: Uuid,
) -> StoreResult<Option<Versioned<TournamentDoc>>> {
    tx.get(Collection::Tournaments, id).await
}
