use thiserror::Error;

use super::layout::SlotLayout;

/// Which column block of a member row a write targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    Name,
    /// 1-based slot pair
    Pair(usize),
}

/// One placement decided by the slot assigner. `label` is the member name
/// for [`ColumnGroup::Name`] and the location for a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotWrite {
    pub row: u32,
    pub group: ColumnGroup,
    pub label: String,
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellWrite {
    pub row: u32,
    pub column: u16,
    pub value: CellValue,
}

impl SlotWrite {
    /// Expands to concrete cells: one for a name, two for a pair
    pub fn cells(&self, layout: &SlotLayout) -> Vec<CellWrite> {
        match self.group {
            ColumnGroup::Name => vec![CellWrite {
                row: self.row,
                column: layout.name_column,
                value: CellValue::Text(self.label.clone()),
            }],
            ColumnGroup::Pair(pair) => {
                let mut cells = vec![CellWrite {
                    row: self.row,
                    column: layout.location_column(pair),
                    value: CellValue::Text(self.label.clone()),
                }];
                if let Some(hours) = self.hours {
                    cells.push(CellWrite {
                        row: self.row,
                        column: layout.hours_column(pair),
                        value: CellValue::Number(hours),
                    });
                }
                cells
            }
        }
    }
}

/// A member's row and the pairs filled on it, in fill order
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAssignment {
    pub member: String,
    pub row: u32,
    pub pairs: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPlan {
    pub assignments: Vec<SlotAssignment>,
    pub writes: Vec<SlotWrite>,
}

impl SlotPlan {
    pub fn cell_writes(&self, layout: &SlotLayout) -> Vec<CellWrite> {
        self.writes.iter().flat_map(|w| w.cells(layout)).collect()
    }
}

/// A member had more events than the layout has pairs. Assignment stops at
/// the first such member; `completed_writes` counts the writes computed
/// before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("too many events for one member: {member} (at most {max_pairs} allowed)")]
pub struct SlotOverflowError {
    pub member: String,
    pub max_pairs: usize,
    pub completed_writes: usize,
}
