pub mod layout;
pub mod types;
pub mod assign;

pub use layout::{cell_address, SlotLayout};
pub use types::{CellValue, CellWrite, SlotOverflowError, SlotPlan};
pub use assign::assign;
