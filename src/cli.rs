//! Command line for Voluntracker

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "voluntracker")]
#[command(version)]
#[command(
    about = "Track volunteer hour submissions and build the submission workbook",
    long_about = None
)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a copy of an exported sheet in the backup directory
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Show or edit the member roster
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },

    /// Sum hours per member and draw the bar chart
    Metrics {
        /// Backup file to read
        #[arg(short, long, value_name = "FILE")]
        backup: PathBuf,

        /// Where to write the chart (defaults to chart_path)
        #[arg(long, value_name = "FILE")]
        chart: Option<PathBuf>,

        /// Also write the totals table to a text file
        #[arg(long, value_name = "FILE")]
        totals: Option<PathBuf>,
    },

    /// Fill the submission workbook from a backup
    Submit {
        /// Backup file to read
        #[arg(short, long, value_name = "FILE")]
        backup: PathBuf,

        /// Where to save the workbook (defaults to submission_path)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the planned cell writes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Select the Google Sheet by pasting its full address
    SetSheet {
        url: String,
    },

    /// Show the selected spreadsheet and configured paths
    Status,

    /// Run the local web dashboard
    Web {
        /// Port to listen on (defaults to web_port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BackupAction {
    /// Copy an exported CSV into a new backup file
    Create {
        #[arg(long, value_name = "FILE")]
        from: PathBuf,
    },
    /// List existing backups
    List,
}

#[derive(Subcommand, Debug)]
pub enum RosterAction {
    List,
    Add { name: String },
    Remove { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_with_defaults() {
        let cli = Cli::try_parse_from(["voluntracker", "submit", "--backup", "b.csv"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        match cli.command {
            Command::Submit {
                backup,
                output,
                dry_run,
            } => {
                assert_eq!(backup, PathBuf::from("b.csv"));
                assert!(output.is_none());
                assert!(!dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_roster_add() {
        let cli = Cli::try_parse_from(["voluntracker", "-v", "roster", "add", "Alice Smith"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Roster { action: RosterAction::Add { ref name } } if name == "Alice Smith"
        ));
    }

    #[test]
    fn metrics_requires_backup() {
        assert!(Cli::try_parse_from(["voluntracker", "metrics"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
