use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, info, warn};

use crate::error::{Result, TrackerError};
use crate::parser::EventRecord;
use crate::slots::{assign, CellValue, CellWrite, SlotLayout};

/// Anything that accepts cell writes at grid coordinates
pub trait GridSink {
    fn write_cell(&mut self, row: u32, column: u16, value: &CellValue) -> Result<()>;
}

/// Applies a batch of writes in order
pub fn apply_writes<S: GridSink + ?Sized>(sink: &mut S, writes: &[CellWrite]) -> Result<()> {
    for write in writes {
        sink.write_cell(write.row, write.column, &write.value)?;
    }
    Ok(())
}

/// Plans slots for `events` and fills a workbook. The first sheet of
/// `template` is copied when that file exists; otherwise a titled header
/// row is generated. On overflow the error is returned before any cell is
/// written.
pub fn build_submission(
    events: &[EventRecord],
    layout: &SlotLayout,
    title: &str,
    template: Option<&Path>,
) -> Result<XlsxSheet> {
    let plan = assign(events, layout)?;
    let mut sheet = match template {
        Some(path) if path.exists() => XlsxSheet::from_template(path)?,
        Some(path) => {
            warn!(path = %path.display(), "template not found; generating the header row");
            XlsxSheet::new(title, layout)?
        }
        None => XlsxSheet::new(title, layout)?,
    };
    apply_writes(&mut sheet, &plan.cell_writes(layout))?;
    Ok(sheet)
}

/// Title and column headers for a sheet built without a template.
///
/// Headers go on the row directly above `base_row` and are left out when
/// members start on the first row. The title takes A1 only while that row
/// is free of headers and members.
pub fn header_cells(title: &str, layout: &SlotLayout) -> Vec<CellWrite> {
    let mut cells = Vec::new();
    let Some(header_row) = layout.base_row.checked_sub(1) else {
        return cells;
    };

    if !title.is_empty() && header_row > 0 {
        cells.push(CellWrite {
            row: 0,
            column: 0,
            value: CellValue::Text(title.to_string()),
        });
    }

    cells.push(CellWrite {
        row: header_row,
        column: layout.name_column,
        value: CellValue::Text("Member".into()),
    });
    for pair in 1..=layout.max_pairs {
        cells.push(CellWrite {
            row: header_row,
            column: layout.location_column(pair),
            value: CellValue::Text(format!("Location {}", pair)),
        });
        cells.push(CellWrite {
            row: header_row,
            column: layout.hours_column(pair),
            value: CellValue::Text(format!("Hours {}", pair)),
        });
    }
    cells
}

/// The submission worksheet, either generated or copied from a template
pub struct XlsxSheet {
    worksheet: Worksheet,
}

impl XlsxSheet {
    pub fn new(title: &str, layout: &SlotLayout) -> Result<Self> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name("Volunteer Hours")?;

        let bold = Format::new().set_bold();
        for cell in header_cells(title, layout) {
            if let CellValue::Text(text) = &cell.value {
                worksheet.write_string_with_format(cell.row, cell.column, text.as_str(), &bold)?;
            }
        }

        worksheet.set_column_width(layout.name_column, 24.0)?;
        for pair in 1..=layout.max_pairs {
            worksheet.set_column_width(layout.location_column(pair), 20.0)?;
        }

        Ok(Self { worksheet })
    }

    /// Copies the values of the first worksheet in `path`. Cell formatting
    /// is not carried over.
    pub fn from_template(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let name = workbook.sheet_names().first().cloned().ok_or_else(|| {
            TrackerError::Config(format!("template '{}' has no worksheets", path.display()))
        })?;
        let range = workbook.worksheet_range(&name)?;

        let mut worksheet = Worksheet::new();
        worksheet.set_name(&name)?;

        let (top, left) = range.start().unwrap_or((0, 0));
        let mut copied = 0;
        for (r, c, cell) in range.used_cells() {
            let row = top + r as u32;
            let col = (left + c as u32) as u16;
            match cell {
                Data::String(text) => worksheet.write_string(row, col, text.as_str())?,
                Data::Float(number) => worksheet.write_number(row, col, *number)?,
                Data::Int(number) => worksheet.write_number(row, col, *number as f64)?,
                Data::Bool(flag) => worksheet.write_boolean(row, col, *flag)?,
                Data::DateTime(date) => worksheet.write_number(row, col, date.as_f64())?,
                Data::DateTimeIso(text) | Data::DurationIso(text) => {
                    worksheet.write_string(row, col, text.as_str())?
                }
                _ => continue,
            };
            copied += 1;
        }

        debug!(path = %path.display(), sheet = %name, cells = copied, "loaded template");
        Ok(Self { worksheet })
    }

    fn into_workbook(self) -> Workbook {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.worksheet);
        workbook
    }

    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut workbook = self.into_workbook();
        workbook.save(path)?;
        info!(path = %path.display(), "saved submission workbook");
        Ok(())
    }

    pub fn to_buffer(self) -> Result<Vec<u8>> {
        let mut workbook = self.into_workbook();
        Ok(workbook.save_to_buffer()?)
    }
}

impl GridSink for XlsxSheet {
    fn write_cell(&mut self, row: u32, column: u16, value: &CellValue) -> Result<()> {
        match value {
            CellValue::Text(text) => {
                self.worksheet.write_string(row, column, text.as_str())?;
            }
            CellValue::Number(number) => {
                self.worksheet.write_number(row, column, *number)?;
            }
        }
        Ok(())
    }
}
