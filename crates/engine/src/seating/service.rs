use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use infra::models::{
    BalancingResult, ParticipantDoc, ParticipantStatus, Scope, TableDoc, TableStatus,
};
use infra::repos::{participants, tables, tournaments};
use infra::store::{Collection, DocumentStore, TxnSession, Versioned};

use crate::balancing::{
    balance_by_chips, redistribute, uniform_fill, Candidate, PlannedMove, SeatPos, TableLayout,
};
use crate::error::{EngineError, EngineResult};
use crate::seating::outcome::{BatchOutcome, SkipReason, SkippedParticipant};
use crate::txn::TxnCoordinator;

/// Seats for tables opened into the unassigned pool, where no tournament
/// default applies.
pub const DEFAULT_MAX_SEATS: usize = 9;

/// Address of one seat: a table document plus a 0-based seat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatRef {
    pub table_id: Uuid,
    pub seat_index: usize,
}

#[derive(Debug, Clone, Copy)]
enum Teardown {
    Close,
    Delete,
}

enum Placement {
    Placed(BalancingResult),
    Skipped(SkipReason),
}

/// Sole mutator of table and participant documents.
///
/// Every operation re-reads fresh state inside an optimistic transaction,
/// and whenever a seat changes owner the table document(s) and the
/// participant document(s) are written in that same transaction. There is
/// no in-process lock; concurrent sessions coordinate purely through the
/// store's conflict detection.
pub struct SeatAssignmentEngine<S: DocumentStore> {
    store: S,
    coordinator: TxnCoordinator,
}

impl<S: DocumentStore> SeatAssignmentEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            coordinator: TxnCoordinator::default(),
        }
    }

    pub fn with_coordinator(store: S, coordinator: TxnCoordinator) -> Self {
        Self { store, coordinator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a standby table in a tournament, or in the unassigned pool
    /// when `tournament_id` is `None`. Seat count falls back to the
    /// tournament's default.
    pub async fn open_table(
        &self,
        tournament_id: Option<Uuid>,
        max_seats: Option<usize>,
    ) -> EngineResult<TableDoc> {
        self.coordinator
            .run(|| self.try_open_table(tournament_id, max_seats))
            .await
    }

    async fn try_open_table(
        &self,
        tournament_id: Option<Uuid>,
        max_seats: Option<usize>,
    ) -> EngineResult<TableDoc> {
        let mut tx = TxnSession::begin(&self.store);

        let default_seats = match tournament_id {
            Some(id) => {
                let tournament = tournaments::get(&mut tx, id)
                    .await?
                    .ok_or(EngineError::NotFound {
                        entity: "tournament",
                        id,
                    })?;
                tournament.doc.default_max_seats
            }
            None => DEFAULT_MAX_SEATS,
        };
        let max_seats = max_seats.unwrap_or(default_seats);
        if max_seats == 0 {
            return Err(EngineError::InvalidState(
                "a table needs at least one seat".to_string(),
            ));
        }

        let scope = tournament_id.map(Scope::Tournament).unwrap_or(Scope::All);
        let table_number = tables::next_table_number(&mut tx, scope).await?;
        let table = TableDoc {
            id: Uuid::new_v4(),
            tournament_id,
            table_number,
            name: format!("T{table_number}"),
            seats: vec![None; max_seats],
            max_seats,
            status: TableStatus::Standby,
            display_order: table_number,
            created_at: Utc::now(),
        };
        tx.put(Collection::Tables, table.id, &table)?;
        tx.commit().await?;

        info!(table_id = %table.id, table_number, max_seats, "opened standby table");
        Ok(table)
    }

    /// Activate a standby table so it starts accepting assignments.
    pub async fn activate_table(&self, table_id: Uuid) -> EngineResult<TableDoc> {
        self.coordinator
            .run(|| self.try_activate_table(table_id))
            .await
    }

    async fn try_activate_table(&self, table_id: Uuid) -> EngineResult<TableDoc> {
        let mut tx = TxnSession::begin(&self.store);
        let table = tables::get(&mut tx, table_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "table",
                id: table_id,
            })?;

        match table.doc.status {
            TableStatus::Standby => {}
            TableStatus::Open => {
                return Err(EngineError::InvalidState(
                    "table is already open".to_string(),
                ));
            }
            TableStatus::Closed => {
                return Err(EngineError::InvalidState(
                    "a closed table cannot be reopened".to_string(),
                ));
            }
        }

        let mut doc = table.doc;
        doc.status = TableStatus::Open;
        tx.put(Collection::Tables, table_id, &doc)?;
        tx.commit().await?;

        info!(table_id = %table_id, table_number = doc.table_number, "activated table");
        Ok(doc)
    }

    /// Move one participant to a specific seat. The target must be empty
    /// unless `swap` is set, in which case both participants exchange seats
    /// in the same transaction.
    pub async fn move_seat(
        &self,
        participant_id: Uuid,
        from: SeatRef,
        to: SeatRef,
        swap: bool,
    ) -> EngineResult<Vec<BalancingResult>> {
        if from == to {
            return Ok(Vec::new());
        }
        self.coordinator
            .run(|| self.try_move_seat(participant_id, from, to, swap))
            .await
    }

    async fn try_move_seat(
        &self,
        participant_id: Uuid,
        from: SeatRef,
        to: SeatRef,
        swap: bool,
    ) -> EngineResult<Vec<BalancingResult>> {
        let mut tx = TxnSession::begin(&self.store);

        let mover = participants::get(&mut tx, participant_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "participant",
                id: participant_id,
            })?;
        if !mover.doc.is_active() {
            return Err(EngineError::InvalidState(format!(
                "participant {} is not active",
                mover.doc.name
            )));
        }

        let from_table = tables::get(&mut tx, from.table_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "table",
                id: from.table_id,
            })?;
        let mut from_doc = from_table.doc;

        if from.seat_index >= from_doc.seats.len() {
            return Err(EngineError::InvalidState(format!(
                "seat {} does not exist on table {}",
                from.seat_index, from_doc.table_number
            )));
        }
        if from_doc.seats[from.seat_index] != Some(participant_id) {
            return Err(EngineError::InvalidState(format!(
                "participant {} does not hold seat {} on table {}",
                mover.doc.name, from.seat_index, from_doc.table_number
            )));
        }

        let from_pos = SeatPos {
            table_number: from_doc.table_number,
            seat_index: from.seat_index,
        };
        let mut results = Vec::new();
        let mut mover_doc = mover.doc;

        if from.table_id == to.table_id {
            if to.seat_index >= from_doc.seats.len() {
                return Err(EngineError::InvalidState(format!(
                    "seat {} does not exist on table {}",
                    to.seat_index, from_doc.table_number
                )));
            }
            let to_pos = SeatPos {
                table_number: from_doc.table_number,
                seat_index: to.seat_index,
            };
            match from_doc.seats[to.seat_index] {
                None => {
                    from_doc.seats[from.seat_index] = None;
                    from_doc.seats[to.seat_index] = Some(participant_id);
                }
                Some(_) if !swap => {
                    return Err(EngineError::SeatOccupied {
                        table_number: from_doc.table_number,
                        seat_index: to.seat_index,
                    });
                }
                Some(other_id) => {
                    let other = participants::get(&mut tx, other_id).await?.ok_or(
                        EngineError::NotFound {
                            entity: "participant",
                            id: other_id,
                        },
                    )?;
                    from_doc.seats[from.seat_index] = Some(other_id);
                    from_doc.seats[to.seat_index] = Some(participant_id);

                    let mut other_doc = other.doc;
                    seat_participant(&mut other_doc, from_pos);
                    results.push(move_record(&other_doc.name, other_id, Some(to_pos), from_pos));
                    tx.put(Collection::Participants, other_id, &other_doc)?;
                }
            }
            seat_participant(&mut mover_doc, to_pos);
            results.insert(
                0,
                move_record(&mover_doc.name, participant_id, Some(from_pos), to_pos),
            );
            tx.put(Collection::Tables, from_doc.id, &from_doc)?;
        } else {
            let to_table = tables::get(&mut tx, to.table_id)
                .await?
                .ok_or(EngineError::NotFound {
                    entity: "table",
                    id: to.table_id,
                })?;
            let mut to_doc = to_table.doc;

            if !to_doc.is_open() {
                return Err(EngineError::InvalidState(format!(
                    "table {} is not open",
                    to_doc.table_number
                )));
            }
            if to.seat_index >= to_doc.seats.len() {
                return Err(EngineError::InvalidState(format!(
                    "seat {} does not exist on table {}",
                    to.seat_index, to_doc.table_number
                )));
            }
            let to_pos = SeatPos {
                table_number: to_doc.table_number,
                seat_index: to.seat_index,
            };
            match to_doc.seats[to.seat_index] {
                None => {
                    from_doc.seats[from.seat_index] = None;
                    to_doc.seats[to.seat_index] = Some(participant_id);
                }
                Some(_) if !swap => {
                    return Err(EngineError::SeatOccupied {
                        table_number: to_doc.table_number,
                        seat_index: to.seat_index,
                    });
                }
                Some(other_id) => {
                    let other = participants::get(&mut tx, other_id).await?.ok_or(
                        EngineError::NotFound {
                            entity: "participant",
                            id: other_id,
                        },
                    )?;
                    from_doc.seats[from.seat_index] = Some(other_id);
                    to_doc.seats[to.seat_index] = Some(participant_id);

                    let mut other_doc = other.doc;
                    seat_participant(&mut other_doc, from_pos);
                    results.push(move_record(&other_doc.name, other_id, Some(to_pos), from_pos));
                    tx.put(Collection::Participants, other_id, &other_doc)?;
                }
            }
            seat_participant(&mut mover_doc, to_pos);
            results.insert(
                0,
                move_record(&mover_doc.name, participant_id, Some(from_pos), to_pos),
            );
            tx.put(Collection::Tables, from_doc.id, &from_doc)?;
            tx.put(Collection::Tables, to_doc.id, &to_doc)?;
        }

        tx.put(Collection::Participants, participant_id, &mover_doc)?;
        tx.commit().await?;

        info!(
            participant_id = %participant_id,
            swap,
            moves = results.len(),
            "moved seat"
        );
        Ok(results)
    }

    /// Seat waiting participants one at a time, spreading them across the
    /// least-occupied open tables. Best-effort: each placement is its own
    /// transaction, so placements already committed stand even when
    /// capacity runs out or the batch is abandoned partway.
    pub async fn assign_waiting_participants(
        &self,
        scope: Scope,
        participant_ids: &[Uuid],
    ) -> EngineResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut index = 0;
        while index < participant_ids.len() {
            let participant_id = participant_ids[index];
            match self
                .coordinator
                .run(|| self.try_assign_one(scope, participant_id))
                .await
            {
                Ok(Placement::Placed(result)) => outcome.moves.push(result),
                Ok(Placement::Skipped(SkipReason::NoSeatAvailable)) => {
                    warn!(
                        assigned = outcome.moves.len(),
                        remaining = participant_ids.len() - index,
                        "empty seats exhausted, leaving remaining waiting participants unassigned"
                    );
                    for &remaining in &participant_ids[index..] {
                        outcome.skipped.push(SkippedParticipant {
                            participant_id: remaining,
                            reason: SkipReason::NoSeatAvailable,
                        });
                    }
                    break;
                }
                Ok(Placement::Skipped(reason)) => {
                    outcome.skipped.push(SkippedParticipant {
                        participant_id,
                        reason,
                    });
                }
                Err(EngineError::Conflict) => {
                    outcome.skipped.push(SkippedParticipant {
                        participant_id,
                        reason: SkipReason::RetriesExhausted,
                    });
                }
                Err(err) => return Err(err),
            }
            index += 1;
        }

        info!(
            assigned = outcome.moves.len(),
            skipped = outcome.skipped.len(),
            "waiting list assignment finished"
        );
        Ok(outcome)
    }

    async fn try_assign_one(&self, scope: Scope, participant_id: Uuid) -> EngineResult<Placement> {
        let mut tx = TxnSession::begin(&self.store);

        let Some(participant) = participants::get(&mut tx, participant_id).await? else {
            return Ok(Placement::Skipped(SkipReason::Missing));
        };
        if !participant.doc.is_active() {
            return Ok(Placement::Skipped(SkipReason::NotActive));
        }
        if participant.doc.is_seated() {
            return Ok(Placement::Skipped(SkipReason::AlreadySeated));
        }

        let open = tables::list_open(&mut tx, scope).await?;
        let layouts: Vec<TableLayout> = open.iter().map(|table| layout_of(&table.doc)).collect();
        let plan = uniform_fill(&layouts, &[candidate_of(&participant.doc)]);
        let Some(planned) = plan.moves.into_iter().next() else {
            return Ok(Placement::Skipped(SkipReason::NoSeatAvailable));
        };

        let Some(mut target) = open
            .into_iter()
            .map(|table| table.doc)
            .find(|table| table.id == planned.to_table_id)
        else {
            return Err(EngineError::InvalidState(
                "plan references an unknown table".to_string(),
            ));
        };
        target.seats[planned.to.seat_index] = Some(participant_id);

        let mut doc = participant.doc;
        seat_participant(&mut doc, planned.to);

        tx.put(Collection::Tables, target.id, &target)?;
        tx.put(Collection::Participants, participant_id, &doc)?;
        tx.commit().await?;

        info!(
            participant_id = %participant_id,
            table_number = planned.to.table_number,
            seat_index = planned.to.seat_index,
            "assigned waiting participant"
        );
        Ok(Placement::Placed(result_of(&planned)))
    }

    /// Reseat exactly the given active participants from scratch in one
    /// transaction, spreading them uniformly. Participants outside the set
    /// keep their seats untouched.
    pub async fn auto_assign_seats(
        &self,
        scope: Scope,
        participant_ids: &[Uuid],
    ) -> EngineResult<Vec<BalancingResult>> {
        self.coordinator
            .run(|| self.try_auto_assign(scope, participant_ids))
            .await
    }

    async fn try_auto_assign(
        &self,
        scope: Scope,
        participant_ids: &[Uuid],
    ) -> EngineResult<Vec<BalancingResult>> {
        let mut tx = TxnSession::begin(&self.store);

        let mut docs: Vec<ParticipantDoc> = Vec::with_capacity(participant_ids.len());
        let mut seen = HashSet::new();
        for &id in participant_ids {
            if !seen.insert(id) {
                continue;
            }
            let participant =
                participants::get(&mut tx, id)
                    .await?
                    .ok_or(EngineError::NotFound {
                        entity: "participant",
                        id,
                    })?;
            if !participant.doc.is_active() {
                return Err(EngineError::InvalidState(format!(
                    "participant {} is not active",
                    participant.doc.name
                )));
            }
            docs.push(participant.doc);
        }

        let open = tables::list_open(&mut tx, scope).await?;
        let mut table_docs: Vec<TableDoc> = open.into_iter().map(|table| table.doc).collect();
        let mut changed: HashSet<Uuid> = HashSet::new();
        let mut cleared: HashSet<Uuid> = HashSet::new();
        for table in &mut table_docs {
            let mut touched = false;
            for seat in &mut table.seats {
                if let Some(id) = (*seat).filter(|id| seen.contains(id)) {
                    *seat = None;
                    cleared.insert(id);
                    touched = true;
                }
            }
            if touched {
                changed.insert(table.id);
            }
        }
        // A participant seated on a table outside the scope would end up in
        // two seats after the reseat; that is a caller error, not a plan.
        for doc in &docs {
            if doc.is_seated() && !cleared.contains(&doc.id) {
                return Err(EngineError::InvalidState(format!(
                    "participant {} is seated outside the requested scope",
                    doc.name
                )));
            }
        }

        let layouts: Vec<TableLayout> = table_docs.iter().map(layout_of).collect();
        let available: usize = layouts.iter().map(TableLayout::empty_seat_count).sum();
        if docs.len() > available {
            return Err(EngineError::CapacityExceeded {
                required: docs.len(),
                available,
            });
        }

        let candidates: Vec<Candidate> = docs.iter().map(candidate_of).collect();
        let plan = uniform_fill(&layouts, &candidates);

        let mut tables_by_id: HashMap<Uuid, TableDoc> =
            table_docs.into_iter().map(|doc| (doc.id, doc)).collect();
        let mut participants_by_id: HashMap<Uuid, ParticipantDoc> =
            docs.into_iter().map(|doc| (doc.id, doc)).collect();

        let mut results = Vec::with_capacity(plan.moves.len());
        for planned in &plan.moves {
            stage_planned_move(
                planned,
                &mut tables_by_id,
                &mut participants_by_id,
                &mut changed,
            )?;
            results.push(result_of(planned));
        }

        for id in &changed {
            if let Some(table) = tables_by_id.get(id) {
                tx.put(Collection::Tables, table.id, table)?;
            }
        }
        for participant in participants_by_id.values() {
            tx.put(Collection::Participants, participant.id, participant)?;
        }
        tx.commit().await?;

        info!(reseated = results.len(), "auto-assigned seats");
        Ok(results)
    }

    /// Rebalance chip stacks across open tables. The plan is computed from
    /// one snapshot, then each move commits as its own bounded-retry
    /// transaction: moves that lose their race are reported as skipped
    /// while the rest stay committed. There is no cross-table atomicity.
    pub async fn auto_balance_by_chips(
        &self,
        scope: Scope,
        participant_ids: &[Uuid],
    ) -> EngineResult<BatchOutcome> {
        let (planned_moves, mut outcome) = self.plan_chip_balance(scope, participant_ids).await?;

        // The plan reseats everyone at once, so a move's target seat may
        // still be held by another candidate that has not moved yet. Commit
        // in passes: a move blocked on an occupied seat waits for the next
        // pass; once a full pass makes no progress the rest are cycles.
        let mut pending = planned_moves;
        loop {
            let mut progressed = false;
            let mut blocked = Vec::new();
            for planned in pending.drain(..) {
                match self
                    .coordinator
                    .run(|| self.try_apply_planned_move(&planned))
                    .await
                {
                    Ok(result) => {
                        outcome.moves.push(result);
                        progressed = true;
                    }
                    Err(EngineError::SeatOccupied { .. }) => blocked.push(planned),
                    Err(EngineError::Conflict) => {
                        warn!(
                            participant_id = %planned.participant_id,
                            "chip balance move dropped after exhausted retries"
                        );
                        outcome.skipped.push(SkippedParticipant {
                            participant_id: planned.participant_id,
                            reason: SkipReason::RetriesExhausted,
                        });
                    }
                    Err(EngineError::NotFound { .. }) => {
                        outcome.skipped.push(SkippedParticipant {
                            participant_id: planned.participant_id,
                            reason: SkipReason::Missing,
                        });
                    }
                    Err(EngineError::InvalidState(_)) => {
                        outcome.skipped.push(SkippedParticipant {
                            participant_id: planned.participant_id,
                            reason: SkipReason::Displaced,
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
            pending = blocked;
            if pending.is_empty() || !progressed {
                break;
            }
        }
        for planned in pending {
            warn!(
                participant_id = %planned.participant_id,
                "chip balance move blocked by an occupied seat"
            );
            outcome.skipped.push(SkippedParticipant {
                participant_id: planned.participant_id,
                reason: SkipReason::SeatTaken,
            });
        }

        info!(
            moved = outcome.moves.len(),
            skipped = outcome.skipped.len(),
            "chip balance finished"
        );
        Ok(outcome)
    }

    async fn plan_chip_balance(
        &self,
        scope: Scope,
        participant_ids: &[Uuid],
    ) -> EngineResult<(Vec<PlannedMove>, BatchOutcome)> {
        // Planning session: read-only, never committed.
        let mut tx = TxnSession::begin(&self.store);
        let mut outcome = BatchOutcome::default();

        let mut candidates = Vec::new();
        let mut seen = HashSet::new();
        for &id in participant_ids {
            if !seen.insert(id) {
                continue;
            }
            match participants::get(&mut tx, id).await? {
                None => outcome.skipped.push(SkippedParticipant {
                    participant_id: id,
                    reason: SkipReason::Missing,
                }),
                Some(p) if !p.doc.is_active() => outcome.skipped.push(SkippedParticipant {
                    participant_id: id,
                    reason: SkipReason::NotActive,
                }),
                Some(p) if !p.doc.is_seated() => outcome.skipped.push(SkippedParticipant {
                    participant_id: id,
                    reason: SkipReason::NotSeated,
                }),
                Some(p) => candidates.push(candidate_of(&p.doc)),
            }
        }

        let open = tables::list_open(&mut tx, scope).await?;
        let candidate_ids: HashSet<Uuid> = candidates.iter().map(|c| c.id).collect();
        let mut layouts = Vec::with_capacity(open.len());
        for table in &open {
            let mut layout = layout_of(&table.doc);
            for seat in &mut layout.seats {
                if seat.is_some_and(|id| candidate_ids.contains(&id)) {
                    *seat = None;
                }
            }
            layouts.push(layout);
        }

        let plan = balance_by_chips(&layouts, &candidates);
        for id in plan.unassigned {
            outcome.skipped.push(SkippedParticipant {
                participant_id: id,
                reason: SkipReason::NoSeatAvailable,
            });
        }
        Ok((plan.moves, outcome))
    }

    async fn try_apply_planned_move(&self, planned: &PlannedMove) -> EngineResult<BalancingResult> {
        let mut tx = TxnSession::begin(&self.store);

        let participant = participants::get(&mut tx, planned.participant_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "participant",
                id: planned.participant_id,
            })?;
        if !participant.doc.is_active() {
            return Err(EngineError::InvalidState(format!(
                "participant {} is no longer active",
                participant.doc.name
            )));
        }

        let held = tables::find_holding(&mut tx, planned.participant_id)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidState("participant is no longer seated".to_string())
            })?;
        let seat_index = held
            .doc
            .seat_of(planned.participant_id)
            .ok_or_else(|| {
                EngineError::InvalidState("participant is no longer seated".to_string())
            })?;
        let current = SeatPos {
            table_number: held.doc.table_number,
            seat_index,
        };
        if planned.from != Some(current) {
            return Err(EngineError::InvalidState(
                "participant moved after planning".to_string(),
            ));
        }

        if held.doc.id == planned.to_table_id {
            let mut table = held.doc;
            if planned.to.seat_index >= table.seats.len() {
                return Err(EngineError::InvalidState(format!(
                    "seat {} does not exist on table {}",
                    planned.to.seat_index, table.table_number
                )));
            }
            if table.seats[planned.to.seat_index].is_some() {
                return Err(EngineError::SeatOccupied {
                    table_number: table.table_number,
                    seat_index: planned.to.seat_index,
                });
            }
            table.seats[seat_index] = None;
            table.seats[planned.to.seat_index] = Some(planned.participant_id);
            tx.put(Collection::Tables, table.id, &table)?;
        } else {
            let to_table = tables::get(&mut tx, planned.to_table_id).await?.ok_or(
                EngineError::NotFound {
                    entity: "table",
                    id: planned.to_table_id,
                },
            )?;
            let mut to_doc = to_table.doc;
            if !to_doc.is_open() {
                return Err(EngineError::InvalidState(format!(
                    "table {} is not open",
                    to_doc.table_number
                )));
            }
            if planned.to.seat_index >= to_doc.seats.len() {
                return Err(EngineError::InvalidState(format!(
                    "seat {} does not exist on table {}",
                    planned.to.seat_index, to_doc.table_number
                )));
            }
            if to_doc.seats[planned.to.seat_index].is_some() {
                return Err(EngineError::SeatOccupied {
                    table_number: to_doc.table_number,
                    seat_index: planned.to.seat_index,
                });
            }

            let mut from_doc = held.doc;
            from_doc.seats[seat_index] = None;
            to_doc.seats[planned.to.seat_index] = Some(planned.participant_id);
            tx.put(Collection::Tables, from_doc.id, &from_doc)?;
            tx.put(Collection::Tables, to_doc.id, &to_doc)?;
        }

        let mut doc = participant.doc;
        seat_participant(&mut doc, planned.to);
        tx.put(Collection::Participants, planned.participant_id, &doc)?;
        tx.commit().await?;

        Ok(result_of(planned))
    }

    /// Empty a table into the remaining open tables of its scope, then mark
    /// it closed. All-or-nothing: if the evacuees do not all fit, nothing
    /// is written and the table is untouched.
    pub async fn close_table(&self, table_id: Uuid) -> EngineResult<Vec<BalancingResult>> {
        self.coordinator
            .run(|| self.try_teardown(table_id, Teardown::Close))
            .await
    }

    /// Like [`close_table`], but removes the table document entirely.
    ///
    /// [`close_table`]: SeatAssignmentEngine::close_table
    pub async fn delete_table(&self, table_id: Uuid) -> EngineResult<Vec<BalancingResult>> {
        self.coordinator
            .run(|| self.try_teardown(table_id, Teardown::Delete))
            .await
    }

    async fn try_teardown(
        &self,
        table_id: Uuid,
        mode: Teardown,
    ) -> EngineResult<Vec<BalancingResult>> {
        let mut tx = TxnSession::begin(&self.store);

        let table = tables::get(&mut tx, table_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "table",
                id: table_id,
            })?;
        match (mode, table.doc.status) {
            (Teardown::Close, TableStatus::Open) => {}
            (Teardown::Close, _) => {
                return Err(EngineError::InvalidState(
                    "only an open table can be closed".to_string(),
                ));
            }
            (Teardown::Delete, TableStatus::Open | TableStatus::Standby) => {}
            (Teardown::Delete, TableStatus::Closed) => {
                return Err(EngineError::InvalidState(
                    "a closed table cannot be deleted".to_string(),
                ));
            }
        }

        let mut doc = table.doc;
        let evacuee_seats: Vec<(usize, Uuid)> = doc.occupants().collect();
        let results = if evacuee_seats.is_empty() {
            Vec::new()
        } else {
            self.stage_evacuation(&mut tx, &doc, &evacuee_seats).await?
        };

        match mode {
            Teardown::Close => {
                doc.seats = vec![None; doc.max_seats];
                doc.status = TableStatus::Closed;
                tx.put(Collection::Tables, table_id, &doc)?;
            }
            Teardown::Delete => tx.delete(Collection::Tables, table_id),
        }
        tx.commit().await?;

        match mode {
            Teardown::Close => info!(
                table_id = %table_id,
                moved = results.len(),
                "closed table"
            ),
            Teardown::Delete => info!(
                table_id = %table_id,
                moved = results.len(),
                "deleted table"
            ),
        }
        Ok(results)
    }

    /// Resize a table's seat array. Growing pads with empty slots;
    /// shrinking first evacuates occupants at indices past the new size
    /// (all-or-nothing, like a close) and then truncates.
    pub async fn update_table_max_seats(
        &self,
        table_id: Uuid,
        new_max: usize,
    ) -> EngineResult<Vec<BalancingResult>> {
        self.coordinator
            .run(|| self.try_resize(table_id, new_max))
            .await
    }

    async fn try_resize(
        &self,
        table_id: Uuid,
        new_max: usize,
    ) -> EngineResult<Vec<BalancingResult>> {
        if new_max == 0 {
            return Err(EngineError::InvalidState(
                "a table needs at least one seat".to_string(),
            ));
        }

        let mut tx = TxnSession::begin(&self.store);
        let table = tables::get(&mut tx, table_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "table",
                id: table_id,
            })?;
        if table.doc.status == TableStatus::Closed {
            return Err(EngineError::InvalidState(
                "a closed table cannot be resized".to_string(),
            ));
        }

        let mut doc = table.doc;
        let current = doc.seats.len();
        if new_max == current {
            return Ok(Vec::new());
        }

        if new_max > current {
            doc.seats.resize(new_max, None);
            doc.max_seats = new_max;
            tx.put(Collection::Tables, table_id, &doc)?;
            tx.commit().await?;
            info!(table_id = %table_id, new_max, "grew table");
            return Ok(Vec::new());
        }

        let evacuee_seats: Vec<(usize, Uuid)> = doc
            .occupants()
            .filter(|&(index, _)| index >= new_max)
            .collect();
        let results = if evacuee_seats.is_empty() {
            Vec::new()
        } else {
            let staged = self.stage_evacuation(&mut tx, &doc, &evacuee_seats).await?;
            for &(index, _) in &evacuee_seats {
                doc.seats[index] = None;
            }
            staged
        };

        doc.seats.truncate(new_max);
        doc.max_seats = new_max;
        tx.put(Collection::Tables, table_id, &doc)?;
        tx.commit().await?;

        info!(
            table_id = %table_id,
            new_max,
            moved = results.len(),
            "shrank table"
        );
        Ok(results)
    }

    /// Mark a participant busted and clear their seat in one transaction.
    /// Calling this twice is a no-op, not an error.
    pub async fn bust_out_participant(&self, participant_id: Uuid) -> EngineResult<ParticipantDoc> {
        self.coordinator
            .run(|| self.try_bust_out(participant_id))
            .await
    }

    async fn try_bust_out(&self, participant_id: Uuid) -> EngineResult<ParticipantDoc> {
        let mut tx = TxnSession::begin(&self.store);

        let participant = participants::get(&mut tx, participant_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "participant",
                id: participant_id,
            })?;
        if participant.doc.status == ParticipantStatus::Busted {
            return Ok(participant.doc);
        }

        let mut doc = participant.doc;
        doc.status = ParticipantStatus::Busted;
        doc.table_number = None;
        doc.seat_number = None;

        if let Some(held) = tables::find_holding(&mut tx, participant_id).await? {
            let mut held_doc = held.doc;
            if let Some(seat_index) = held_doc.seat_of(participant_id) {
                held_doc.seats[seat_index] = None;
            }
            tx.put(Collection::Tables, held_doc.id, &held_doc)?;
        }

        tx.put(Collection::Participants, participant_id, &doc)?;
        tx.commit().await?;

        info!(participant_id = %participant_id, "busted out participant");
        Ok(doc)
    }

    /// Plan and stage the relocation of every occupant of `vacated` onto
    /// the other open tables of its scope. Writes land in the caller's
    /// transaction; the vacated table itself is the caller's to update.
    async fn stage_evacuation(
        &self,
        tx: &mut TxnSession<'_, S>,
        vacated: &TableDoc,
        evacuee_seats: &[(usize, Uuid)],
    ) -> EngineResult<Vec<BalancingResult>> {
        let scope = Scope::of_table(vacated);
        let others: Vec<Versioned<TableDoc>> = tables::list_open(tx, scope)
            .await?
            .into_iter()
            .filter(|table| table.doc.id != vacated.id)
            .collect();

        let mut evacuees = Vec::with_capacity(evacuee_seats.len());
        for &(_, id) in evacuee_seats {
            let participant =
                participants::get(tx, id)
                    .await?
                    .ok_or(EngineError::NotFound {
                        entity: "participant",
                        id,
                    })?;
            evacuees.push(participant.doc);
        }

        let layouts: Vec<TableLayout> = others.iter().map(|table| layout_of(&table.doc)).collect();
        let candidates: Vec<Candidate> = evacuees.iter().map(candidate_of).collect();
        let moves = redistribute(&layouts, &candidates).map_err(|shortfall| {
            EngineError::CapacityExceeded {
                required: shortfall.required,
                available: shortfall.available,
            }
        })?;

        let mut tables_by_id: HashMap<Uuid, TableDoc> =
            others.into_iter().map(|table| (table.doc.id, table.doc)).collect();
        let mut participants_by_id: HashMap<Uuid, ParticipantDoc> =
            evacuees.into_iter().map(|doc| (doc.id, doc)).collect();
        let mut changed: HashSet<Uuid> = HashSet::new();

        let mut results = Vec::with_capacity(moves.len());
        for planned in &moves {
            stage_planned_move(
                planned,
                &mut tables_by_id,
                &mut participants_by_id,
                &mut changed,
            )?;
            results.push(result_of(planned));
        }

        for id in &changed {
            if let Some(table) = tables_by_id.get(id) {
                tx.put(Collection::Tables, table.id, table)?;
            }
        }
        for participant in participants_by_id.values() {
            tx.put(Collection::Participants, participant.id, participant)?;
        }
        Ok(results)
    }
}

/// Write one planned placement into the staged document maps.
fn stage_planned_move(
    planned: &PlannedMove,
    tables_by_id: &mut HashMap<Uuid, TableDoc>,
    participants_by_id: &mut HashMap<Uuid, ParticipantDoc>,
    changed: &mut HashSet<Uuid>,
) -> EngineResult<()> {
    let table = tables_by_id
        .get_mut(&planned.to_table_id)
        .ok_or_else(|| EngineError::InvalidState("plan references an unknown table".to_string()))?;
    table.seats[planned.to.seat_index] = Some(planned.participant_id);
    changed.insert(table.id);

    let participant = participants_by_id
        .get_mut(&planned.participant_id)
        .ok_or_else(|| {
            EngineError::InvalidState("plan references an unknown participant".to_string())
        })?;
    seat_participant(participant, planned.to);
    Ok(())
}

fn layout_of(table: &TableDoc) -> TableLayout {
    TableLayout {
        id: table.id,
        table_number: table.table_number,
        seats: table.seats.clone(),
    }
}

fn candidate_of(participant: &ParticipantDoc) -> Candidate {
    Candidate {
        id: participant.id,
        name: participant.name.clone(),
        chips: participant.chips,
        current: current_pos(participant),
    }
}

fn current_pos(participant: &ParticipantDoc) -> Option<SeatPos> {
    match (participant.table_number, participant.seat_number) {
        (Some(table_number), Some(seat_number)) if seat_number >= 1 => Some(SeatPos {
            table_number,
            seat_index: (seat_number - 1) as usize,
        }),
        _ => None,
    }
}

fn seat_participant(participant: &mut ParticipantDoc, to: SeatPos) {
    participant.table_number = Some(to.table_number);
    participant.seat_number = Some(to.seat_index as u32 + 1);
}

fn move_record(
    name: &str,
    participant_id: Uuid,
    from: Option<SeatPos>,
    to: SeatPos,
) -> BalancingResult {
    BalancingResult {
        participant_id,
        participant_name: name.to_string(),
        from_table_number: from.map(|pos| pos.table_number),
        from_seat_index: from.map(|pos| pos.seat_index),
        to_table_number: to.table_number,
        to_seat_index: to.seat_index,
    }
}

fn result_of(planned: &PlannedMove) -> BalancingResult {
    BalancingResult {
        participant_id: planned.participant_id,
        participant_name: planned.participant_name.clone(),
        from_table_number: planned.from.map(|pos| pos.table_number),
        from_seat_index: planned.from.map(|pos| pos.seat_index),
        to_table_number: planned.to.table_number,
        to_seat_index: planned.to.seat_index,
    }
}
