use super::{Candidate, FillPlan, PlannedMove, SeatPos, TableLayout};

/// Spread candidates across open tables by headcount.
///
/// For each candidate in input order: pick the table with the fewest filled
/// seats that still has an empty seat (tie-break lowest table number) and
/// seat at its lowest-index empty slot. Candidates left over once every
/// seat is taken are reported as unassigned, not as an error.
pub fn uniform_fill(tables: &[TableLayout], candidates: &[Candidate]) -> FillPlan {
    let mut layouts: Vec<TableLayout> = tables.to_vec();
    let mut plan = FillPlan::default();

    for candidate in candidates {
        let target = layouts
            .iter_mut()
            .filter(|table| table.has_empty_seat())
            .min_by_key(|table| (table.occupied_count(), table.table_number));

        let Some(table) = target else {
            plan.unassigned.push(candidate.id);
            continue;
        };
        let Some(seat_index) = table.first_empty_seat() else {
            plan.unassigned.push(candidate.id);
            continue;
        };

        table.seats[seat_index] = Some(candidate.id);
        plan.moves.push(PlannedMove {
            participant_id: candidate.id,
            participant_name: candidate.name.clone(),
            from: candidate.current,
            to_table_id: table.id,
            to: SeatPos {
                table_number: table.table_number,
                seat_index,
            },
        });
    }

    plan
}
