use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TrackerError};

/// Column 0 of the form export header row
pub const HEADER_MARKER: &str = "What is your name?";

const NAME_COL: usize = 0;
const LOCATION_COL: usize = 2;
const HOURS_COL: usize = 3;

/// One submitted volunteer event
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub member: String,
    pub hours: f64,
    pub location: String,
}

impl EventRecord {
    pub fn new(member: impl Into<String>, hours: f64, location: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            hours,
            location: location.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub member: String,
}

/// Loads events from a backup CSV file
pub fn load_events<P: AsRef<Path>>(csv_path: P) -> Result<Vec<EventRecord>> {
    let file = std::fs::File::open(csv_path.as_ref())?;
    read_events(file)
}

/// Parses events from any CSV source.
///
/// The export has no reliable header handling, so every row is read as data
/// and the form's header row is recognised by its first cell. Rows may be
/// ragged; anything shorter than the hours column is rejected, as is an
/// hours value that is not a finite decimal number.
pub fn read_events<R: Read>(source: R) -> Result<Vec<EventRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut events = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let member = record.get(NAME_COL).unwrap_or("").trim();
        if member == HEADER_MARKER {
            continue;
        }

        if record.len() <= HOURS_COL {
            return Err(TrackerError::MalformedRow {
                line,
                found: record.len(),
                expected: HOURS_COL + 1,
            });
        }

        let raw_hours = record.get(HOURS_COL).unwrap_or("");
        let bad_hours = || TrackerError::Parse {
            line,
            member: member.to_string(),
            value: raw_hours.to_string(),
        };
        let hours: f64 = raw_hours.trim().parse().map_err(|_| bad_hours())?;
        // "NaN" and "inf" parse as f64 but cannot be summed or plotted
        if !hours.is_finite() {
            return Err(bad_hours());
        }

        let location = record.get(LOCATION_COL).unwrap_or("").trim();

        events.push(EventRecord::new(member, hours, location));
    }

    debug!(count = events.len(), "parsed event records");
    Ok(events)
}

/// Parses a one-column roster. A line with several fields is joined back
/// into a single name.
pub fn read_roster<R: Read>(source: R) -> Result<Vec<RosterEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut roster = Vec::new();
    for result in reader.records() {
        let record = result?;
        let member: String = record.iter().collect::<Vec<_>>().concat();
        let member = member.trim();
        if member.is_empty() {
            continue;
        }
        roster.push(RosterEntry {
            member: member.to_string(),
        });
    }

    Ok(roster)
}

/// Stable sort by member name, the grouping both consumers expect
pub fn sort_events(events: &mut [EventRecord]) {
    events.sort_by(|a, b| a.member.cmp(&b.member));
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKUP: &str = "\
What is your name?,Email,Where did you volunteer?,How many hours?
Alice,a@x.org,Beach,2
Bob,b@x.org,Park,1.5
Alice,a@x.org, Park ,3
";

    #[test]
    fn skips_header_and_parses_rows() {
        let events = read_events(BACKUP.as_bytes()).unwrap();
        assert_eq!(
            events,
            vec![
                EventRecord::new("Alice", 2.0, "Beach"),
                EventRecord::new("Bob", 1.5, "Park"),
                EventRecord::new("Alice", 3.0, "Park"),
            ]
        );
    }

    #[test]
    fn non_numeric_hours_names_the_record() {
        let data = "Alice,a@x.org,Beach,two\n";
        match read_events(data.as_bytes()) {
            Err(TrackerError::Parse {
                line,
                member,
                value,
            }) => {
                assert_eq!(line, 1);
                assert_eq!(member, "Alice");
                assert_eq!(value, "two");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn non_finite_hours_are_rejected() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            let data = format!("Alice,a@x.org,Beach,2\nBob,b@x.org,Park,{raw}\n");
            match read_events(data.as_bytes()) {
                Err(TrackerError::Parse {
                    line,
                    member,
                    value,
                }) => {
                    assert_eq!(line, 2);
                    assert_eq!(member, "Bob");
                    assert_eq!(value, raw);
                }
                other => panic!("expected parse error for {raw}, got {:?}", other),
            }
        }
    }

    #[test]
    fn short_row_is_malformed() {
        let data = "Alice,a@x.org,Beach,2\nBob,b@x.org\n";
        match read_events(data.as_bytes()) {
            Err(TrackerError::MalformedRow {
                line,
                found,
                expected,
            }) => {
                assert_eq!(line, 2);
                assert_eq!(found, 2);
                assert_eq!(expected, 4);
            }
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[test]
    fn roster_joins_fields_and_skips_blanks() {
        let data = "Alice\nBob,Smith\n\nCarol\n";
        let roster = read_roster(data.as_bytes()).unwrap();
        let names: Vec<&str> = roster.iter().map(|r| r.member.as_str()).collect();
        assert_eq!(names, vec!["Alice", "BobSmith", "Carol"]);
    }

    #[test]
    fn sort_is_stable_within_member() {
        let mut events = vec![
            EventRecord::new("Bob", 1.0, "Park"),
            EventRecord::new("Alice", 3.0, "Zoo"),
            EventRecord::new("Alice", 2.0, "Beach"),
        ];
        sort_events(&mut events);
        let order: Vec<(&str, &str)> = events
            .iter()
            .map(|e| (e.member.as_str(), e.location.as_str()))
            .collect();
        assert_eq!(order, vec![("Alice", "Zoo"), ("Alice", "Beach"), ("Bob", "Park")]);
    }
}
