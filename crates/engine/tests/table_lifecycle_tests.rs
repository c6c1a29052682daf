mod common;

use common::*;
use engine::EngineError;
use infra::models::TableStatus;
use infra::store::MemoryStore;
use uuid::Uuid;

#[tokio::test]
async fn test_open_table_uses_tournament_default_and_next_number() {
    let store = MemoryStore::new();
    let tournament = tournament_doc("Friday Deepstack", 6);
    put_tournament(&store, &tournament).await;
    let existing = open_table_doc(Some(tournament.id), 3, 6);
    put_table(&store, &existing).await;

    let engine = engine_on(&store);
    let table = engine
        .open_table(Some(tournament.id), None)
        .await
        .expect("open table should succeed");

    assert_eq!(table.tournament_id, Some(tournament.id));
    assert_eq!(table.table_number, 4);
    assert_eq!(table.name, "T4");
    assert_eq!(table.seats.len(), 6);
    assert_eq!(table.max_seats, 6);
    assert_eq!(table.status, TableStatus::Standby);

    let stored = get_table(&store, table.id).await;
    assert_eq!(stored.table_number, 4);
}

#[tokio::test]
async fn test_open_table_into_unassigned_pool() {
    let store = MemoryStore::new();
    let engine = engine_on(&store);
    let table = engine
        .open_table(None, Some(8))
        .await
        .expect("open table should succeed");

    assert_eq!(table.tournament_id, None);
    assert_eq!(table.table_number, 1);
    assert_eq!(table.seats.len(), 8);
}

#[tokio::test]
async fn test_open_table_unknown_tournament_fails() {
    let store = MemoryStore::new();
    let engine = engine_on(&store);
    let err = engine
        .open_table(Some(Uuid::new_v4()), None)
        .await
        .expect_err("unknown tournament");
    assert!(
        matches!(err, EngineError::NotFound { entity: "tournament", .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_activate_table_only_from_standby() {
    let store = MemoryStore::new();
    let standby = table_doc(None, 1, 9, TableStatus::Standby);
    let closed = table_doc(None, 2, 9, TableStatus::Closed);
    put_table(&store, &standby).await;
    put_table(&store, &closed).await;

    let engine = engine_on(&store);
    let activated = engine
        .activate_table(standby.id)
        .await
        .expect("activation should succeed");
    assert_eq!(activated.status, TableStatus::Open);

    let err = engine
        .activate_table(standby.id)
        .await
        .expect_err("a second activation is invalid");
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = engine
        .activate_table(closed.id)
        .await
        .expect_err("closed tables stay closed");
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn test_close_table_redistributes_occupants() {
    let store = MemoryStore::new();
    let mut t1 = open_table_doc(None, 1, 9);
    let t2 = open_table_doc(None, 2, 9);
    let mut alice = active_participant(None, "Alice", 5000);
    let mut bob = active_participant(None, "Bob", 3000);
    seat_into(&mut t1, &mut alice, 0);
    seat_into(&mut t1, &mut bob, 4);
    put_table(&store, &t1).await;
    put_table(&store, &t2).await;
    put_participant(&store, &alice).await;
    put_participant(&store, &bob).await;

    let engine = engine_on(&store);
    let moves = engine
        .close_table(t1.id)
        .await
        .expect("close should succeed");
    assert_eq!(moves.len(), 2);
    assert!(moves.iter().all(|m| m.to_table_number == 2));

    let t1_after = get_table(&store, t1.id).await;
    assert_eq!(t1_after.status, TableStatus::Closed);
    assert_eq!(t1_after.occupied_count(), 0);
    let t2_after = get_table(&store, t2.id).await;
    assert_eq!(t2_after.occupied_count(), 2);

    assert_seating_consistent(&store).await;
}

#[tokio::test]
async fn test_close_table_is_all_or_nothing_without_capacity() {
    let store = MemoryStore::new();
    let mut t1 = open_table_doc(None, 1, 2);
    let mut t2 = open_table_doc(None, 2, 2);
    let mut alice = active_participant(None, "Alice", 5000);
    let mut bob = active_participant(None, "Bob", 3000);
    let mut carol = active_participant(None, "Carol", 2000);
    let mut dave = active_participant(None, "Dave", 1000);
    seat_into(&mut t1, &mut alice, 0);
    seat_into(&mut t1, &mut bob, 1);
    seat_into(&mut t2, &mut carol, 0);
    seat_into(&mut t2, &mut dave, 1);
    put_table(&store, &t1).await;
    put_table(&store, &t2).await;
    for p in [&alice, &bob, &carol, &dave] {
        put_participant(&store, p).await;
    }

    let table_before = table_value(&store, t1.id).await;
    let alice_before = participant_value(&store, alice.id).await;
    let bob_before = participant_value(&store, bob.id).await;

    let engine = engine_on(&store);
    let err = engine
        .close_table(t1.id)
        .await
        .expect_err("no spare seats anywhere");
    assert!(
        matches!(
            err,
            EngineError::CapacityExceeded {
                required: 2,
                available: 0
            }
        ),
        "unexpected error: {err}"
    );

    // The table and its occupants are byte-for-byte untouched.
    assert_eq!(table_value(&store, t1.id).await, table_before);
    assert_eq!(participant_value(&store, alice.id).await, alice_before);
    assert_eq!(participant_value(&store, bob.id).await, bob_before);
    assert_seating_consistent(&store).await;
}

#[tokio::test]
async fn test_close_table_requires_open_status() {
    let store = MemoryStore::new();
    let standby = table_doc(None, 1, 9, TableStatus::Standby);
    put_table(&store, &standby).await;

    let engine = engine_on(&store);
    let err = engine
        .close_table(standby.id)
        .await
        .expect_err("standby tables cannot be closed");
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn test_delete_table_relocates_and_removes_document() {
    let store = MemoryStore::new();
    let mut t1 = open_table_doc(None, 1, 9);
    let t2 = open_table_doc(None, 2, 9);
    let mut alice = active_participant(None, "Alice", 5000);
    seat_into(&mut t1, &mut alice, 3);
    put_table(&store, &t1).await;
    put_table(&store, &t2).await;
    put_participant(&store, &alice).await;

    let engine = engine_on(&store);
    let moves = engine
        .delete_table(t1.id)
        .await
        .expect("delete should succeed");
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].participant_id, alice.id);

    assert!(
        try_get_table(&store, t1.id).await.is_none(),
        "deleted table document must be gone"
    );
    let alice_after = get_participant(&store, alice.id).await;
    assert_eq!(alice_after.table_number, Some(2));
    assert_seating_consistent(&store).await;
}

#[tokio::test]
async fn test_delete_empty_standby_table_is_allowed() {
    let store = MemoryStore::new();
    let standby = table_doc(None, 1, 9, TableStatus::Standby);
    put_table(&store, &standby).await;

    let engine = engine_on(&store);
    let moves = engine
        .delete_table(standby.id)
        .await
        .expect("deleting an empty standby table is fine");
    assert!(moves.is_empty());
    assert!(try_get_table(&store, standby.id).await.is_none());
}

#[tokio::test]
async fn test_delete_closed_table_fails() {
    let store = MemoryStore::new();
    let closed = table_doc(None, 1, 9, TableStatus::Closed);
    put_table(&store, &closed).await;

    let engine = engine_on(&store);
    let err = engine
        .delete_table(closed.id)
        .await
        .expect_err("closed is terminal");
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn test_shrink_blocked_until_another_table_has_room() {
    let store = MemoryStore::new();
    let mut t1 = open_table_doc(None, 1, 9);
    let mut players = Vec::new();
    for index in 0..5 {
        let mut p = active_participant(None, &format!("P{}", index + 1), 1000);
        seat_into(&mut t1, &mut p, index);
        players.push(p);
    }
    put_table(&store, &t1).await;
    for p in &players {
        put_participant(&store, p).await;
    }

    let engine = engine_on(&store);
    let err = engine
        .update_table_max_seats(t1.id, 4)
        .await
        .expect_err("P5 has nowhere to go");
    assert!(
        matches!(
            err,
            EngineError::CapacityExceeded {
                required: 1,
                available: 0
            }
        ),
        "unexpected error: {err}"
    );
    let t1_after = get_table(&store, t1.id).await;
    assert_eq!(t1_after.seats.len(), 9, "failed shrink must not resize");

    // With one empty seat elsewhere the same shrink goes through.
    let t2 = open_table_doc(None, 2, 1);
    put_table(&store, &t2).await;
    let moves = engine
        .update_table_max_seats(t1.id, 4)
        .await
        .expect("shrink should succeed now");
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].participant_id, players[4].id);
    assert_eq!(moves[0].to_table_number, 2);

    let t1_after = get_table(&store, t1.id).await;
    assert_eq!(t1_after.seats.len(), 4);
    assert_eq!(t1_after.max_seats, 4);
    assert_eq!(t1_after.occupied_count(), 4);
    assert_seating_consistent(&store).await;
}

#[tokio::test]
async fn test_grow_table_pads_with_empty_slots() {
    let store = MemoryStore::new();
    let mut t1 = open_table_doc(None, 1, 4);
    let mut alice = active_participant(None, "Alice", 5000);
    seat_into(&mut t1, &mut alice, 3);
    put_table(&store, &t1).await;
    put_participant(&store, &alice).await;

    let engine = engine_on(&store);
    let moves = engine
        .update_table_max_seats(t1.id, 9)
        .await
        .expect("grow should succeed");
    assert!(moves.is_empty(), "growing moves nobody");

    let t1_after = get_table(&store, t1.id).await;
    assert_eq!(t1_after.seats.len(), 9);
    assert_eq!(t1_after.max_seats, 9);
    assert_eq!(t1_after.seats[3], Some(alice.id));
    assert_seating_consistent(&store).await;
}

#[tokio::test]
async fn test_resize_to_current_size_is_a_noop() {
    let store = MemoryStore::new();
    let t1 = open_table_doc(None, 1, 9);
    put_table(&store, &t1).await;

    let before = table_value(&store, t1.id).await;
    let engine = engine_on(&store);
    let moves = engine
        .update_table_max_seats(t1.id, 9)
        .await
        .expect("noop resize");
    assert!(moves.is_empty());
    assert_eq!(table_value(&store, t1.id).await, before);
}

#[tokio::test]
async fn test_resize_to_zero_is_invalid() {
    let store = MemoryStore::new();
    let t1 = open_table_doc(None, 1, 9);
    put_table(&store, &t1).await;

    let engine = engine_on(&store);
    let err = engine
        .update_table_max_seats(t1.id, 0)
        .await
        .expect_err("zero seats is not a table");
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn test_evacuation_stays_inside_the_tables_tournament() {
    let store = MemoryStore::new();
    let tournament_a = Uuid::new_v4();
    let tournament_b = Uuid::new_v4();
    let mut ta = open_table_doc(Some(tournament_a), 1, 2);
    // Plenty of room, but in another tournament.
    let tb = open_table_doc(Some(tournament_b), 1, 9);
    let mut alice = active_participant(Some(tournament_a), "Alice", 1000);
    seat_into(&mut ta, &mut alice, 0);
    put_table(&store, &ta).await;
    put_table(&store, &tb).await;
    put_participant(&store, &alice).await;

    let engine = engine_on(&store);
    let err = engine
        .close_table(ta.id)
        .await
        .expect_err("evacuees never cross tournament boundaries");
    assert!(
        matches!(err, EngineError::CapacityExceeded { .. }),
        "unexpected error: {err}"
    );
    let tb_after = get_table(&store, tb.id).await;
    assert_eq!(tb_after.occupied_count(), 0);
}
