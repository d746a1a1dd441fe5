use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Last zero-based row an xlsx worksheet can hold
pub const MAX_ROW: u32 = 1_048_575;
/// Last zero-based xlsx column (XFD)
pub const MAX_COLUMN: u16 = 16_383;

/// Where member rows and their (location, hours) pairs live in the
/// submission grid. All coordinates are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotLayout {
    /// Row of the first member
    pub base_row: u32,
    pub name_column: u16,
    /// Location column of pair 1; its hours column follows immediately
    pub first_pair_column: u16,
    /// Distance between the location columns of consecutive pairs
    pub pair_stride: u16,
    pub max_pairs: usize,
}

impl Default for SlotLayout {
    /// Row 6, name in B, pairs in C/D, E/F, G/H, I/J
    fn default() -> Self {
        Self {
            base_row: 5,
            name_column: 1,
            first_pair_column: 2,
            pair_stride: 2,
            max_pairs: 4,
        }
    }
}

impl SlotLayout {
    pub fn validate(&self) -> Result<()> {
        if self.max_pairs == 0 {
            return Err(TrackerError::Config("layout.max_pairs must be at least 1".into()));
        }
        if self.pair_stride < 2 {
            return Err(TrackerError::Config(
                "layout.pair_stride must leave room for a location and an hours column".into(),
            ));
        }
        if self.first_pair_column <= self.name_column {
            return Err(TrackerError::Config(
                "layout.first_pair_column must be to the right of the name column".into(),
            ));
        }
        let last = self.first_pair_column as usize
            + (self.max_pairs - 1) * self.pair_stride as usize
            + 1;
        if last > MAX_COLUMN as usize {
            return Err(TrackerError::Config("layout runs past the last column".into()));
        }
        if self.base_row > MAX_ROW {
            return Err(TrackerError::Config(format!(
                "layout.base_row must be at most {}",
                MAX_ROW
            )));
        }
        Ok(())
    }

    /// Location column of a 1-based pair number
    pub fn location_column(&self, pair: usize) -> u16 {
        self.first_pair_column + (pair as u16 - 1) * self.pair_stride
    }

    pub fn hours_column(&self, pair: usize) -> u16 {
        self.location_column(pair) + 1
    }

    /// Grid row of the n-th distinct member (0-based)
    pub fn member_row(&self, ordinal: usize) -> u32 {
        self.base_row.saturating_add(ordinal as u32)
    }
}

/// Converts a zero-based column to spreadsheet letters (0 = A, 26 = AA)
pub fn column_letter(col: u16) -> String {
    let mut n = col as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1-style address of a zero-based cell
pub fn cell_address(row: u32, col: u16) -> String {
    format!("{}{}", column_letter(col), row + 1)
}
