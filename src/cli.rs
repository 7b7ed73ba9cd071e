use anyhow::{Result, anyhow};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::fix::{self, FixOptions};
use crate::commands::restore::{self, RestoreOptions};
use crate::commands::scrub::{self, ScrubOptions};
use crate::commands::status::{self, StatusOptions};
use crate::commands::CommandReport;
use crate::fixer::batch::Selection;
use crate::fixer::config::DetectStrategy;
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    name = "haqei-fix",
    version,
    about = "Repair, merge, and scrub HaQei hexagram JSON data files",
    long_about = "Without a subcommand, fixes every hexagram file in the configured id range \
(or only <ID> when given): concatenated JSON objects are merged into one document, \
with a backup written first and restored if the result does not verify."
)]
struct Cli {
    /// Hexagram id to fix; omit to fix the whole range.
    #[arg(value_name = "ID")]
    id: Option<u32>,
    #[arg(long, value_name = "NAME", help = "Block detection strategy: marker or depth")]
    strategy: Option<DetectStrategy>,
    #[arg(long, global = true, value_name = "PATH", help = "Directory holding the data files")]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Report what would change without writing")]
    dry_run: bool,
    #[arg(long, global = true, help = "Print the command report as JSON")]
    json: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Same as running without a subcommand.
    Fix {
        #[arg(value_name = "ID")]
        id: Option<u32>,
        #[arg(long, value_name = "NAME")]
        strategy: Option<DetectStrategy>,
    },
    /// Remove stray invisible characters and repair JSON5-isms.
    Scrub {
        #[arg(value_name = "ID")]
        id: Option<u32>,
    },
    /// Copy <file>.backup back over the data file.
    Restore {
        #[arg(value_name = "ID")]
        id: u32,
    },
    /// Show resolved configuration and data directory state.
    Status,
}

impl Cli {
    /// A top-level ID belongs to the default fix. `fix` and `scrub` accept it
    /// when they carry no ID of their own; other subcommands reject it.
    fn check_top_level_id(&self) -> Result<(), clap::Error> {
        let Some(top) = self.id else {
            return Ok(());
        };
        let conflict = match &self.command {
            None => false,
            Some(Commands::Fix { id, .. }) | Some(Commands::Scrub { id }) => {
                id.is_some_and(|own| own != top)
            }
            Some(Commands::Restore { .. }) | Some(Commands::Status) => true,
        };
        if conflict {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                format!("ID {top} given before the subcommand does not apply here; pass it after the subcommand"),
            ));
        }
        Ok(())
    }
}

fn selection(id: Option<u32>) -> Selection {
    id.map(Selection::Single).unwrap_or(Selection::All)
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let state = if report.ok { "ok" } else { "failed" };
    println!("{}: {state}", report.command);
    for detail in &report.details {
        println!("  - {detail}");
    }
    for issue in &report.issues {
        let mut lines = issue.lines();
        if let Some(first) = lines.next() {
            println!("  ! {first}");
        }
        for rest in lines {
            println!("    {rest}");
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = cli.check_top_level_id() {
        err.exit();
    }
    logging::init(cli.verbose, cli.quiet);
    if cli.dry_run {
        logging::info("dry-run: no files will be written");
    }

    let report = match cli.command {
        None => fix::run(&FixOptions {
            selection: selection(cli.id),
            dry_run: cli.dry_run,
            strategy: cli.strategy,
            data_dir: cli.data_dir.clone(),
        })?,
        Some(Commands::Fix { id, strategy }) => fix::run(&FixOptions {
            selection: selection(id.or(cli.id)),
            dry_run: cli.dry_run,
            strategy: strategy.or(cli.strategy),
            data_dir: cli.data_dir.clone(),
        })?,
        Some(Commands::Scrub { id }) => scrub::run(&ScrubOptions {
            selection: selection(id.or(cli.id)),
            dry_run: cli.dry_run,
            data_dir: cli.data_dir.clone(),
        })?,
        Some(Commands::Restore { id }) => restore::run(&RestoreOptions {
            id,
            data_dir: cli.data_dir.clone(),
        })?,
        Some(Commands::Status) => status::run(&StatusOptions {
            data_dir: cli.data_dir.clone(),
        })?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        return Err(anyhow!(
            "{} reported {} issue(s)",
            report.command,
            report.issues.len()
        ));
    }
    logging::debug(format!("{} finished cleanly", report.command));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_id_selects_single_file() {
        let cli = Cli::try_parse_from(["haqei-fix", "12", "--dry-run"]).expect("parse");
        assert_eq!(selection(cli.id), Selection::Single(12));
        assert!(cli.dry_run);
        assert!(cli.command.is_none());
    }

    #[test]
    fn non_integer_id_is_a_usage_error() {
        assert!(Cli::try_parse_from(["haqei-fix", "twelve"]).is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["haqei-fix", "scrub", "3"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Scrub { id: Some(3) })));
        let cli = Cli::try_parse_from(["haqei-fix", "--strategy", "depth"]).expect("parse");
        assert_eq!(cli.strategy, Some(DetectStrategy::Depth));
    }

    #[test]
    fn top_level_id_carries_into_scrub() {
        let cli = Cli::try_parse_from(["haqei-fix", "3", "scrub"]).expect("parse");
        cli.check_top_level_id().expect("compatible");
        let Some(Commands::Scrub { id }) = cli.command else {
            panic!("expected scrub");
        };
        assert_eq!(selection(id.or(cli.id)), Selection::Single(3));
    }

    #[test]
    fn top_level_id_conflicts_are_rejected() {
        for args in [
            &["haqei-fix", "3", "status"][..],
            &["haqei-fix", "3", "restore", "4"][..],
            &["haqei-fix", "3", "scrub", "4"][..],
            &["haqei-fix", "3", "fix", "4"][..],
        ] {
            let cli = Cli::try_parse_from(args).expect("parse");
            let err = cli.check_top_level_id().expect_err("must conflict");
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
        }
        let cli = Cli::try_parse_from(["haqei-fix", "5", "fix", "5"]).expect("parse");
        cli.check_top_level_id().expect("same id is fine");
    }
}
