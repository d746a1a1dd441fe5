use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::reconcile::MemberTotal;
use crate::slots::{cell_address, CellValue, CellWrite, SlotPlan};

/// Formats hours without a trailing `.0` for whole numbers
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{}", hours as i64)
    } else {
        format!("{:.2}", hours)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn format_cell_value(value: &CellValue) -> String {
    match value {
        CellValue::Text(text) => text.clone(),
        CellValue::Number(n) => format_hours(*n),
    }
}

/// One line per member: `name .... hours`
pub fn totals_table(totals: &[MemberTotal]) -> String {
    let width = totals.iter().map(|t| t.member.len()).max().unwrap_or(0).max(6);
    let mut out = String::new();
    out.push_str(&format!("{:<width$}  {:>8}\n", "Member", "Hours", width = width));
    for total in totals {
        out.push_str(&format!(
            "{:<width$}  {:>8}\n",
            total.member,
            format_hours(total.hours),
            width = width
        ));
    }
    let sum: f64 = totals.iter().map(|t| t.hours).sum();
    out.push_str(&format!(
        "{:<width$}  {:>8}\n",
        "Total",
        format_hours(sum),
        width = width
    ));
    out
}

pub fn print_totals(totals: &[MemberTotal]) {
    println!("\n=== Volunteer Hours ===");
    print!("{}", totals_table(totals));

    let idle: Vec<&str> = totals
        .iter()
        .filter(|t| t.hours == 0.0)
        .map(|t| t.member.as_str())
        .collect();
    if !idle.is_empty() {
        println!("⚠️  Members with no hours submitted ({}):", idle.len());
        for name in idle {
            println!("  - {}", name);
        }
    }
}

/// Prints each member row of the plan, then the raw cell writes
pub fn print_plan(plan: &SlotPlan, cells: &[CellWrite]) {
    println!("\n=== Submission Rows ===");
    for assignment in &plan.assignments {
        let pairs: Vec<String> = assignment
            .pairs
            .iter()
            .map(|(location, hours)| format!("{} ({})", location, format_hours(*hours)))
            .collect();
        println!(
            "  Row {} -> {}: {}",
            assignment.row + 1,
            assignment.member,
            pairs.join(", ")
        );
    }

    println!("\nCell writes ({}):", cells.len());
    for cell in cells {
        println!(
            "  {} = {}",
            cell_address(cell.row, cell.column),
            format_cell_value(&cell.value)
        );
    }
}

/// Writes the totals table to a text file
pub fn write_totals_to_file(totals: &[MemberTotal], path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "** Volunteer Hours **")?;
    write!(file, "{}", totals_table(totals))?;
    Ok(())
}
