//! Read-only table registry. All writes go through the seat assignment
//! engine; these helpers only observe a transaction's snapshot.

use uuid::Uuid;

use crate::models::{Scope, TableDoc};
use crate::store::{Collection, DocumentStore, StoreResult, TxnSession, Versioned};

pub async fn get<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    id: Uuid,
) -> StoreResult<Option<Versioned<TableDoc>>> {
    tx.get(Collection::Tables, id).await
}

/// Every table in scope, regardless of status.
pub async fn list<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    scope: Scope,
) -> StoreResult<Vec<Versioned<TableDoc>>> {
    let tables = tx.list::<TableDoc>(Collection::Tables).await?;
    Ok(tables
        .into_iter()
        .filter(|table| scope.contains_table(&table.doc))
        .collect())
}

/// Open tables in scope, sorted by display order with ascending table
/// number as the tie-break.
pub async fn list_open<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    scope: Scope,
) -> StoreResult<Vec<Versioned<TableDoc>>> {
    let mut tables: Vec<Versioned<TableDoc>> = list(tx, scope)
        .await?
        .into_iter()
        .filter(|table| table.doc.is_open())
        .collect();
    tables.sort_by_key(|table| (table.doc.display_order, table.doc.table_number));
    Ok(tables)
}

/// The table whose seat array contains the participant, if any.
pub async fn find_holding<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    participant_id: Uuid,
) -> StoreResult<Option<Versioned<TableDoc>>> {
    let tables = tx.list::<TableDoc>(Collection::Tables).await?;
    Ok(tables
        .into_iter()
        .find(|table| table.doc.seat_of(participant_id).is_some()))
}

/// Ascending indices of the empty seats on a table.
pub fn empty_seats(table: &TableDoc) -> Vec<usize> {
    table
        .seats
        .iter()
        .enumerate()
        .filter_map(|(index, seat)| seat.is_none().then_some(index))
        .collect()
}

/// Summed empty seats across a set of tables; used to fail fast before
/// attempting an assignment that cannot fit.
pub fn total_empty_capacity(tables: &[Versioned<TableDoc>]) -> usize {
    tables
        .iter()
        .map(|table| table.doc.max_seats - table.doc.occupied_count())
        .sum()
}

/// Next free table number within the scope.
pub async fn next_table_number<S: DocumentStore + ?Sized>(
    tx: &mut TxnSession<'_, S>,
    scope: Scope,
) -> StoreResult<u32> {
    let tables = list(tx, scope).await?;
    Ok(tables
        .iter()
        .map(|table| table.doc.table_number)
        .max()
        .unwrap_or(0)
        + 1)
}
