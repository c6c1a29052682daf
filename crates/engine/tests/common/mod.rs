#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use engine::SeatAssignmentEngine;
use infra::models::{
    ParticipantDoc, ParticipantStatus, Scope, TableDoc, TableStatus, TournamentDoc,
    TournamentStatus,
};
use infra::repos::{participants, tables};
use infra::store::{
    Collection, DocumentStore, MemoryStore, RawDoc, StoreError, StoreResult, Txn, TxnSession,
};

pub fn engine_on(store: &MemoryStore) -> SeatAssignmentEngine<MemoryStore> {
    SeatAssignmentEngine::new(store.clone())
}

pub fn tournament_doc(name: &str, default_max_seats: usize) -> TournamentDoc {
    TournamentDoc {
        id: Uuid::new_v4(),
        name: name.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 14).expect("valid date"),
        status: TournamentStatus::InProgress,
        default_max_seats,
        created_at: Utc::now(),
    }
}

pub fn table_doc(
    tournament_id: Option<Uuid>,
    table_number: u32,
    max_seats: usize,
    status: TableStatus,
) -> TableDoc {
    TableDoc {
        id: Uuid::new_v4(),
        tournament_id,
        table_number,
        name: format!("T{table_number}"),
        seats: vec![None; max_seats],
        max_seats,
        status,
        display_order: table_number,
        created_at: Utc::now(),
    }
}

pub fn open_table_doc(tournament_id: Option<Uuid>, table_number: u32, max_seats: usize) -> TableDoc {
    table_doc(tournament_id, table_number, max_seats, TableStatus::Open)
}

pub fn active_participant(tournament_id: Option<Uuid>, name: &str, chips: i64) -> ParticipantDoc {
    ParticipantDoc {
        id: Uuid::new_v4(),
        tournament_id,
        name: name.to_string(),
        chips,
        status: ParticipantStatus::Active,
        table_number: None,
        seat_number: None,
        created_at: Utc::now(),
    }
}

/// Wire both sides of a seat assignment on local fixture documents.
pub fn seat_into(table: &mut TableDoc, participant: &mut ParticipantDoc, seat_index: usize) {
    table.seats[seat_index] = Some(participant.id);
    participant.table_number = Some(table.table_number);
    participant.seat_number = Some(seat_index as u32 + 1);
}

pub async fn put_tournament(store: &MemoryStore, tournament: &TournamentDoc) {
    let mut tx = TxnSession::begin(store);
    tx.put(Collection::Tournaments, tournament.id, tournament)
        .expect("serialize tournament");
    tx.commit().await.expect("commit tournament");
}

pub async fn put_table(store: &MemoryStore, table: &TableDoc) {
    let mut tx = TxnSession::begin(store);
    tx.put(Collection::Tables, table.id, table)
        .expect("serialize table");
    tx.commit().await.expect("commit table");
}

pub async fn put_participant(store: &MemoryStore, participant: &ParticipantDoc) {
    let mut tx = TxnSession::begin(store);
    tx.put(Collection::Participants, participant.id, participant)
        .expect("serialize participant");
    tx.commit().await.expect("commit participant");
}

pub async fn get_table(store: &MemoryStore, id: Uuid) -> TableDoc {
    try_get_table(store, id).await.expect("table exists")
}

pub async fn try_get_table(store: &MemoryStore, id: Uuid) -> Option<TableDoc> {
    let mut tx = TxnSession::begin(store);
    tables::get(&mut tx, id)
        .await
        .expect("read table")
        .map(|table| table.doc)
}

pub async fn get_participant(store: &MemoryStore, id: Uuid) -> ParticipantDoc {
    let mut tx = TxnSession::begin(store);
    participants::get(&mut tx, id)
        .await
        .expect("read participant")
        .expect("participant exists")
        .doc
}

/// Raw stored payload of a table, for byte-for-byte comparisons.
pub async fn table_value(store: &MemoryStore, id: Uuid) -> Value {
    store
        .read(Collection::Tables, id)
        .await
        .expect("read table")
        .expect("table exists")
        .value
}

pub async fn participant_value(store: &MemoryStore, id: Uuid) -> Value {
    store
        .read(Collection::Participants, id)
        .await
        .expect("read participant")
        .expect("participant exists")
        .value
}

/// Assert the dual-entity seating invariants over the whole store: every
/// occupied seat matches its participant's denormalized fields, nobody
/// holds two seats, seat arrays match their max, closed tables are empty,
/// and only active participants are seated.
pub async fn assert_seating_consistent(store: &MemoryStore) {
    let mut tx = TxnSession::begin(store);
    let all_tables: Vec<TableDoc> = tables::list(&mut tx, Scope::All)
        .await
        .expect("list tables")
        .into_iter()
        .map(|table| table.doc)
        .collect();
    let all_participants: Vec<ParticipantDoc> = participants::list(&mut tx, Scope::All)
        .await
        .expect("list participants")
        .into_iter()
        .map(|participant| participant.doc)
        .collect();

    let by_id: HashMap<Uuid, &ParticipantDoc> =
        all_participants.iter().map(|p| (p.id, p)).collect();
    let mut seen: HashSet<Uuid> = HashSet::new();

    for table in &all_tables {
        assert_eq!(
            table.seats.len(),
            table.max_seats,
            "table {} seat array drifted from max_seats",
            table.table_number
        );
        if table.status == TableStatus::Closed {
            assert_eq!(
                table.occupied_count(),
                0,
                "closed table {} still has occupants",
                table.table_number
            );
        }
        for (seat_index, id) in table.occupants() {
            assert!(seen.insert(id), "participant {id} holds two seats");
            let participant = by_id.get(&id).unwrap_or_else(|| {
                panic!(
                    "table {} seat {} holds unknown participant {}",
                    table.table_number, seat_index, id
                )
            });
            assert!(
                participant.is_active(),
                "participant {} holds a seat while {:?}",
                participant.name,
                participant.status
            );
            assert_eq!(
                participant.table_number,
                Some(table.table_number),
                "participant {} table number out of sync",
                participant.name
            );
            assert_eq!(
                participant.seat_number,
                Some(seat_index as u32 + 1),
                "participant {} seat number out of sync",
                participant.name
            );
        }
    }

    for participant in &all_participants {
        if participant.is_seated() {
            assert!(
                seen.contains(&participant.id),
                "participant {} claims a seat no table holds",
                participant.name
            );
        }
    }
}

/// Store wrapper that fails the first N commits with an optimistic
/// conflict, then delegates to the wrapped store.
pub struct FlakyStore {
    inner: MemoryStore,
    failures_left: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn read(&self, collection: Collection, id: Uuid) -> StoreResult<Option<RawDoc>> {
        self.inner.read(collection, id).await
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<RawDoc>> {
        self.inner.list(collection).await
    }

    async fn commit(&self, txn: Txn) -> StoreResult<()> {
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(StoreError::Conflict);
        }
        self.inner.commit(txn).await
    }
}
