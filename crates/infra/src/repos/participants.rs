//! Read-only participant directory.

use uuid::Uuid;

use crate::models::{ParticipantDoc, Scope};
use crate::store::{Collection, DocumentStore, StoreResult, TxnSession, Versioned};

pub async fn get<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    id: Uuid,
) -> StoreResult<Option<Versioned<ParticipantDoc>>> {
    tx.get(Collection::Participants, id).await
}

pub async fn list<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    scope: Scope,
) -> StoreResult<Vec<Versioned<ParticipantDoc>>> {
    let participants = tx.list::<ParticipantDoc>(Collection::Participants).await?;
    Ok(participants
        .into_iter()
        .filter(|participant| scope.contains_participant(&participant.doc))
        .collect())
}
