use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::info;

use crate::error::Result;

const BACKUP_STEM: &str = "hours_backup";

/// Reads every row of an exported sheet as-is, header included
pub fn read_export(path: &Path) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Picks the next backup file name: `hours_backup.csv` in an empty
/// directory, otherwise `hours_backup{N}.csv` with N the number of files
/// already there, bumped past any name that is taken.
pub fn next_backup_path(dir: &Path) -> Result<PathBuf> {
    let existing = list_backups(dir)?.len();
    if existing == 0 {
        return Ok(dir.join(format!("{BACKUP_STEM}.csv")));
    }

    let mut n = existing;
    loop {
        let candidate = dir.join(format!("{BACKUP_STEM}{n}.csv"));
        if !candidate.exists() {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Writes `rows` to a new backup file in `dir`, creating the directory if
/// needed.
pub fn write_backup(dir: &Path, rows: &[StringRecord]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = next_backup_path(dir)?;

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), rows = rows.len(), "wrote backup");
    Ok(path)
}

/// Files in the backup directory, sorted by name. A missing directory has
/// no backups.
pub fn list_backups(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
