use std::collections::HashMap;

use serde::Serialize;

use crate::parser::{EventRecord, RosterEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberTotal {
    pub member: String,
    pub hours: f64,
}

/// Sums hours per member and zero-fills roster members with no events.
///
/// Output order is first appearance among `events`, followed by roster-only
/// members in roster order. Each distinct name appears exactly once.
pub fn reconcile(events: &[EventRecord], roster: &[RosterEntry]) -> Vec<MemberTotal> {
    let mut totals: Vec<MemberTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for event in events {
        match index.get(event.member.as_str()) {
            Some(&pos) => totals[pos].hours += event.hours,
            None => {
                index.insert(&event.member, totals.len());
                totals.push(MemberTotal {
                    member: event.member.clone(),
                    hours: event.hours,
                });
            }
        }
    }

    for entry in roster {
        if index.contains_key(entry.member.as_str()) {
            continue;
        }
        index.insert(&entry.member, totals.len());
        totals.push(MemberTotal {
            member: entry.member.clone(),
            hours: 0.0,
        });
    }

    totals
}
