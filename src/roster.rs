use std::fs::{self, File, OpenOptions};
use std::path::Path;

use csv::WriterBuilder;
use tracing::{info, warn};

use crate::error::Result;
use crate::parser::{read_roster, RosterEntry};

/// Loads the roster, creating an empty file if there is none yet
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)?;
        info!(path = %path.display(), "created empty roster");
        return Ok(Vec::new());
    }
    read_roster(File::open(path)?)
}

/// Appends a member. Returns false (and writes nothing) for blank or
/// already-listed names.
pub fn add_member(path: &Path, name: &str) -> Result<bool> {
    let name = name.trim();
    if name.is_empty() {
        warn!("ignoring blank member name");
        return Ok(false);
    }

    let roster = load_roster(path)?;
    if roster.iter().any(|r| r.member == name) {
        warn!(member = name, "member already on roster");
        return Ok(false);
    }

    let file = OpenOptions::new().append(true).open(path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
    wtr.write_record([name])?;
    wtr.flush()?;

    info!(member = name, "added member");
    Ok(true)
}

/// Rewrites the roster without `name`. Returns whether a line was removed.
pub fn remove_member(path: &Path, name: &str) -> Result<bool> {
    let roster = load_roster(path)?;
    let before = roster.len();
    let kept: Vec<&RosterEntry> = roster.iter().filter(|r| r.member != name.trim()).collect();

    if kept.len() == before {
        warn!(member = name, "member not on roster");
        return Ok(false);
    }

    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    for entry in kept {
        wtr.write_record([entry.member.as_str()])?;
    }
    wtr.flush()?;

    info!(member = name, "removed member");
    Ok(true)
}
