use super::{uniform_fill, Candidate, PlannedMove, TableLayout};

/// Remaining capacity cannot absorb the evacuees.
#[derive(Debug, Clone, Copy)]
pub struct CapacityShortfall {
    pub required: usize,
    pub available: usize,
}

/// Plan the relocation of every evacuee onto the remaining open tables
/// (the table being vacated must not be in `tables`). All-or-nothing: if
/// the remaining capacity is short, no partial plan is produced.
pub fn redistribute(
    tables: &[TableLayout],
    evacuees: &[Candidate],
) -> Result<Vec<PlannedMove>, CapacityShortfall> {
    let available: usize = tables.iter().map(TableLayout::empty_seat_count).sum();
    if evacuees.len() > available {
        return Err(CapacityShortfall {
            required: evacuees.len(),
            available,
        });
    }

    let plan = uniform_fill(tables, evacuees);
    debug_assert!(plan.unassigned.is_empty());
    Ok(plan.moves)
}
