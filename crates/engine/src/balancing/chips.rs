use super::{Candidate, FillPlan, PlannedMove, SeatPos, TableLayout};

/// Equalize table chip totals with a greedy descending-load heuristic.
///
/// Candidates are sorted by chip count descending (ascending id as the
/// tie-break) and the next-richest is repeatedly placed on the table with
/// the lowest provisional chip total (tie-breaks: fewest provisional
/// occupants, then lowest table number), at its lowest-index empty slot.
/// This bounds the max-vs-min table-total gap to at most the largest single
/// chip count among the inputs.
///
/// The caller must pass layouts with every candidate's current seat already
/// cleared; seats held by participants outside the candidate set stay put
/// and are never reassigned. Only moves whose table or seat actually
/// changed are emitted.
pub fn balance_by_chips(tables: &[TableLayout], candidates: &[Candidate]) -> FillPlan {
    let mut layouts: Vec<TableLayout> = tables.to_vec();
    let mut totals = vec![0i64; layouts.len()];
    let mut placed = vec![0usize; layouts.len()];
    let mut plan = FillPlan::default();

    let mut ordered: Vec<&Candidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| b.chips.cmp(&a.chips).then(a.id.cmp(&b.id)));

    for candidate in ordered {
        let target = (0..layouts.len())
            .filter(|&index| layouts[index].has_empty_seat())
            .min_by_key(|&index| (totals[index], placed[index], layouts[index].table_number));

        let Some(index) = target else {
            plan.unassigned.push(candidate.id);
            continue;
        };
        let Some(seat_index) = layouts[index].first_empty_seat() else {
            plan.unassigned.push(candidate.id);
            continue;
        };

        layouts[index].seats[seat_index] = Some(candidate.id);
        totals[index] += candidate.chips;
        placed[index] += 1;

        let to = SeatPos {
            table_number: layouts[index].table_number,
            seat_index,
        };
        if candidate.current == Some(to) {
            continue;
        }
        plan.moves.push(PlannedMove {
            participant_id: candidate.id,
            participant_name: candidate.name.clone(),
            from: candidate.current,
            to_table_id: layouts[index].id,
            to,
        });
    }

    plan
}
