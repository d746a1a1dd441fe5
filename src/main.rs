mod backup;
mod chart;
mod cli;
mod config;
mod display;
mod error;
mod parser;
mod reconcile;
mod roster;
mod sheet;
mod slots;
mod web;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chart::{save_bar_chart, ChartOptions};
use cli::{BackupAction, Cli, Command, RosterAction};
use config::{load_settings, load_sheet_id, save_sheet_id, Settings, NO_SHEET_SELECTED};
use display::{print_plan, print_totals, write_totals_to_file};
use parser::{load_events, sort_events, EventRecord};
use reconcile::reconcile;
use error::TrackerError;
use sheet::build_submission;
use slots::assign;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_sorted_events(path: &Path) -> Result<Vec<EventRecord>> {
    let mut events =
        load_events(path).with_context(|| format!("failed to read backup '{}'", path.display()))?;
    sort_events(&mut events);
    info!(path = %path.display(), events = events.len(), "loaded backup");
    Ok(events)
}

fn run_backup(settings: &Settings, action: BackupAction) -> Result<()> {
    match action {
        BackupAction::Create { from } => {
            match load_sheet_id(&settings.sheet_id_path)? {
                Some(id) => info!(sheet_id = %id, "backing up export"),
                None => warn!("no spreadsheet selected; storing the export anyway"),
            }
            let rows = backup::read_export(&from)
                .with_context(|| format!("failed to read export '{}'", from.display()))?;
            let path = backup::write_backup(&settings.backup_dir, &rows)?;
            println!("Backup saved to {}", path.display());
        }
        BackupAction::List => {
            let backups = backup::list_backups(&settings.backup_dir)?;
            if backups.is_empty() {
                println!("No backups in {}", settings.backup_dir.display());
            }
            for path in backups {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn run_roster(settings: &Settings, action: RosterAction) -> Result<()> {
    let path = &settings.roster_path;
    match action {
        RosterAction::List => {
            let members = roster::load_roster(path)?;
            if members.is_empty() {
                println!("No members in roster file!");
            }
            for entry in members {
                println!("{}", entry.member);
            }
        }
        RosterAction::Add { name } => {
            if roster::add_member(path, &name)? {
                println!("Added {}", name.trim());
            }
        }
        RosterAction::Remove { name } => {
            if roster::remove_member(path, &name)? {
                println!("Removed {}", name);
            }
        }
    }
    Ok(())
}

fn run_metrics(
    settings: &Settings,
    backup: &Path,
    chart: Option<&Path>,
    totals_out: Option<&Path>,
) -> Result<()> {
    let events = load_sorted_events(backup)?;
    let roster = roster::load_roster(&settings.roster_path)?;
    let totals = reconcile(&events, &roster);

    print_totals(&totals);

    if let Some(path) = totals_out {
        write_totals_to_file(&totals, path)
            .with_context(|| format!("failed to write totals to '{}'", path.display()))?;
        println!("Totals saved to {}", path.display());
    }

    let chart_path = chart.unwrap_or(&settings.chart_path);
    let mut options = ChartOptions::default();
    if !settings.organization.is_empty() {
        options.title = format!("{} Volunteer Hours", settings.organization);
    }
    save_bar_chart(&totals, &options, chart_path)?;
    println!("Chart saved to {}", chart_path.display());
    Ok(())
}

fn run_submit(
    settings: &Settings,
    backup: &Path,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let events = load_sorted_events(backup)?;
    let layout = &settings.layout;

    if dry_run {
        let plan = assign(&events, layout)?;
        print_plan(&plan, &plan.cell_writes(layout));
        return Ok(());
    }

    // Any overflow discards the whole submission; nothing is saved.
    let template = Some(settings.template_path.as_path());
    let sheet = match build_submission(&events, layout, &settings.organization, template) {
        Ok(sheet) => sheet,
        Err(TrackerError::SlotOverflow(overflow)) => {
            warn!(
                member = %overflow.member,
                discarded_writes = overflow.completed_writes,
                "submission not saved"
            );
            return Err(overflow.into());
        }
        Err(e) => return Err(e.into()),
    };

    let output = output.unwrap_or(&settings.submission_path);
    sheet.save(output)?;

    let shown = std::fs::canonicalize(output).unwrap_or_else(|_| output.to_path_buf());
    println!("Successfully created a formalized volunteer spreadsheet!");
    println!("It's located at: {}", shown.display());
    Ok(())
}

fn run_status(settings: &Settings) -> Result<()> {
    let sheet = load_sheet_id(&settings.sheet_id_path)?;
    println!(
        "Currently using the spreadsheet at: {}",
        sheet.as_deref().unwrap_or(NO_SHEET_SELECTED)
    );
    println!("Backups:    {}", settings.backup_dir.display());
    println!("Roster:     {}", settings.roster_path.display());
    println!("Submission: {}", settings.submission_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(&cli.config)
        .with_context(|| format!("failed to load settings from '{}'", cli.config.display()))?;

    match cli.command {
        Command::Backup { action } => run_backup(&settings, action)?,
        Command::Roster { action } => run_roster(&settings, action)?,
        Command::Metrics {
            backup,
            chart,
            totals,
        } => {
            run_metrics(&settings, &backup, chart.as_deref(), totals.as_deref())?
        }
        Command::Submit {
            backup,
            output,
            dry_run,
        } => {
            run_submit(&settings, &backup, output.as_deref(), dry_run)?
        }
        Command::SetSheet { url } => {
            let id = save_sheet_id(&settings.sheet_id_path, &url)?;
            println!("Currently using the spreadsheet at: {}", id);
        }
        Command::Status => run_status(&settings)?,
        Command::Web { port } => {
            let port = port.unwrap_or(settings.web_port);
            println!("Starting web dashboard on port {}...", port);
            println!("Access the site at http://localhost:{}", port);
            web::start_server(settings, port).await?;
        }
    }

    Ok(())
}
