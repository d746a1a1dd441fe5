use std::collections::HashMap;

use tracing::{debug, warn};

use super::layout::SlotLayout;
use super::types::{ColumnGroup, SlotAssignment, SlotOverflowError, SlotPlan, SlotWrite};
use crate::parser::EventRecord;

/// Tracks one member's row and how many pairs are filled on it
struct MemberSlots {
    assignment: usize,
    row: u32,
    filled: usize,
}

impl MemberSlots {
    /// Next free 1-based pair, or None once the row is full
    fn next_pair(&mut self, max_pairs: usize) -> Option<usize> {
        if self.filled >= max_pairs {
            return None;
        }
        self.filled += 1;
        Some(self.filled)
    }
}

/// Places every event into its member's row.
///
/// Events are stably sorted by member first, so each member occupies one
/// row starting at `layout.base_row` in name order. A member's first event
/// writes the name and pair 1; later events fill the next free pair. The
/// first event that finds its member's row full aborts the whole batch.
pub fn assign(events: &[EventRecord], layout: &SlotLayout) -> Result<SlotPlan, SlotOverflowError> {
    let mut sorted: Vec<&EventRecord> = events.iter().collect();
    sorted.sort_by(|a, b| a.member.cmp(&b.member));

    let mut plan = SlotPlan::default();
    let mut members: HashMap<&str, MemberSlots> = HashMap::new();

    for event in sorted {
        let ordinal = members.len();
        let slots = members.entry(event.member.as_str()).or_insert_with(|| {
            let row = layout.member_row(ordinal);
            plan.assignments.push(SlotAssignment {
                member: event.member.clone(),
                row,
                pairs: Vec::new(),
            });
            plan.writes.push(SlotWrite {
                row,
                group: ColumnGroup::Name,
                label: event.member.clone(),
                hours: None,
            });
            debug!(member = %event.member, row, "new member row");
            MemberSlots {
                assignment: plan.assignments.len() - 1,
                row,
                filled: 0,
            }
        });

        let Some(pair) = slots.next_pair(layout.max_pairs) else {
            warn!(member = %event.member, max_pairs = layout.max_pairs, "slot overflow");
            return Err(SlotOverflowError {
                member: event.member.clone(),
                max_pairs: layout.max_pairs,
                completed_writes: plan.writes.len(),
            });
        };

        plan.writes.push(SlotWrite {
            row: slots.row,
            group: ColumnGroup::Pair(pair),
            label: event.location.clone(),
            hours: Some(event.hours),
        });
        plan.assignments[slots.assignment]
            .pairs
            .push((event.location.clone(), event.hours));
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::{CellValue, CellWrite};

    fn event(member: &str, hours: f64, location: &str) -> EventRecord {
        EventRecord::new(member, hours, location)
    }

    fn cell(row: u32, column: u16, value: CellValue) -> CellWrite {
        CellWrite { row, column, value }
    }

    #[test]
    fn four_events_fill_all_pairs_in_order() {
        let events = vec![
            event("X", 1.0, "A"),
            event("X", 2.0, "B"),
            event("X", 3.0, "C"),
            event("X", 4.0, "D"),
        ];
        let plan = assign(&events, &SlotLayout::default()).unwrap();

        let groups: Vec<ColumnGroup> = plan.writes.iter().map(|w| w.group).collect();
        assert_eq!(
            groups,
            vec![
                ColumnGroup::Name,
                ColumnGroup::Pair(1),
                ColumnGroup::Pair(2),
                ColumnGroup::Pair(3),
                ColumnGroup::Pair(4),
            ]
        );
        assert!(plan.writes.iter().all(|w| w.row == 5));
        assert_eq!(
            plan.assignments[0].pairs,
            vec![
                ("A".to_string(), 1.0),
                ("B".to_string(), 2.0),
                ("C".to_string(), 3.0),
                ("D".to_string(), 4.0),
            ]
        );
    }

    #[test]
    fn fifth_event_overflows() {
        let events: Vec<EventRecord> = ["A", "B", "C", "D", "E"]
            .iter()
            .enumerate()
            .map(|(i, loc)| event("X", i as f64, loc))
            .collect();
        let err = assign(&events, &SlotLayout::default()).unwrap_err();
        assert_eq!(err.member, "X");
        assert_eq!(err.max_pairs, 4);
        assert_eq!(err.completed_writes, 5);
    }

    #[test]
    fn overflow_halts_later_members() {
        let layout = SlotLayout {
            max_pairs: 1,
            ..SlotLayout::default()
        };
        let events = vec![
            event("Amy", 1.0, "Park"),
            event("Bea", 1.0, "Park"),
            event("Bea", 2.0, "Zoo"),
            event("Cy", 1.0, "Park"),
        ];
        let err = assign(&events, &layout).unwrap_err();
        assert_eq!(err.member, "Bea");
        // Amy name+pair, Bea name+pair; Cy never reached
        assert_eq!(err.completed_writes, 4);
    }

    #[test]
    fn interleaved_members_get_separate_rows() {
        let events = vec![
            event("Bob", 1.0, "Park"),
            event("Alice", 2.0, "Beach"),
            event("Bob", 3.0, "Zoo"),
            event("Alice", 4.0, "Library"),
        ];
        let plan = assign(&events, &SlotLayout::default()).unwrap();

        assert_eq!(plan.assignments.len(), 2);
        assert_eq!(plan.assignments[0].member, "Alice");
        assert_eq!(plan.assignments[0].row, 5);
        assert_eq!(plan.assignments[1].member, "Bob");
        assert_eq!(plan.assignments[1].row, 6);
        assert_eq!(plan.assignments[0].pairs.len(), 2);
        assert_eq!(plan.assignments[1].pairs.len(), 2);
        assert_eq!(plan.assignments[1].pairs[1], ("Zoo".to_string(), 3.0));
    }

    #[test]
    fn pair_writes_expand_to_fixed_columns() {
        let events = vec![event("Alice", 2.0, "Beach"), event("Alice", 3.5, "Park")];
        let layout = SlotLayout::default();
        let cells = assign(&events, &layout).unwrap().cell_writes(&layout);
        assert_eq!(
            cells,
            vec![
                cell(5, 1, CellValue::Text("Alice".into())),
                cell(5, 2, CellValue::Text("Beach".into())),
                cell(5, 3, CellValue::Number(2.0)),
                cell(5, 4, CellValue::Text("Park".into())),
                cell(5, 5, CellValue::Number(3.5)),
            ]
        );
    }

    #[test]
    fn smaller_grid_from_layout() {
        let layout = SlotLayout {
            base_row: 0,
            name_column: 0,
            first_pair_column: 1,
            pair_stride: 3,
            max_pairs: 2,
        };
        let events = vec![event("Z", 1.0, "P"), event("Z", 2.0, "Q")];
        let cells = assign(&events, &layout).unwrap().cell_writes(&layout);
        let columns: Vec<u16> = cells.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn assignment_is_deterministic() {
        let events = vec![
            event("Bob", 1.0, "Park"),
            event("Alice", 2.0, "Beach"),
            event("Bob", 3.0, "Zoo"),
        ];
        let layout = SlotLayout::default();
        assert_eq!(assign(&events, &layout), assign(&events, &layout));
    }

    #[test]
    fn empty_input_plans_nothing() {
        let plan = assign(&[], &SlotLayout::default()).unwrap();
        assert!(plan.writes.is_empty());
        assert!(plan.assignments.is_empty());
    }
}
