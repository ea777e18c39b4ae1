//! Command-line interface module for typesort.
//!
//! Defines the clap arguments and wires them to the organizer: input
//! validation, filter loading, planning, execution and reporting.

use crate::config::FilterConfig;
use crate::file_organizer::{Action, FileOrganizer, OrganizeResult, execute_plans};
use crate::output::OutputFormatter;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

/// Organize files in a folder into subfolders by file type (extension).
#[derive(Parser, Debug, Clone)]
#[command(name = "typesort")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source folder whose files will be organized
    pub source: PathBuf,

    /// Destination root folder (default: same as source)
    #[arg(long, value_name = "PATH")]
    pub dest: Option<PathBuf>,

    /// Include files in subfolders (requires --dest outside source)
    #[arg(long, action = ArgAction::SetTrue)]
    pub recursive: bool,

    /// Copy instead of move
    #[arg(long, action = ArgAction::SetTrue)]
    pub copy: bool,

    /// Print operations without changing files
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Print operations
    #[arg(long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Filter configuration file (default: .typesortrc.toml, then ~/.config/typesort/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn action(&self) -> Action {
        if self.copy { Action::Copy } else { Action::Move }
    }

    /// Whether each operation and the summary are printed.
    pub fn announces(&self) -> bool {
        self.verbose || self.dry_run
    }
}

/// Runs one organization pass and returns the number of files processed.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use typesort::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["typesort", "/home/me/Downloads", "--dry-run"]);
/// match run_cli(&args) {
///     Ok(count) => println!("{count} file(s) would be organized"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> OrganizeResult<usize> {
    let source_dir = expand_tilde(&args.source);
    let dest_root = args
        .dest
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(|| source_dir.clone());

    let organizer = FileOrganizer::new(&source_dir, &dest_root)?;

    let config_path = args.config.as_deref().map(expand_tilde);
    let filters = FilterConfig::load(config_path.as_deref())?.compile()?;

    let organizer = organizer
        .recursive(args.recursive)
        .action(args.action())
        .filters(filters);
    tracing::debug!(
        source = %organizer.source_dir().display(),
        dest = %organizer.dest_root().display(),
        recursive = args.recursive,
        action = %args.action(),
        "organizing"
    );

    let plans = organizer.build_plans()?;
    let announce = args.announces();

    if plans.is_empty() {
        if announce {
            OutputFormatter::plain("No files to organize.");
        }
        return Ok(0);
    }

    if args.dry_run {
        OutputFormatter::dry_run_notice("No files will be changed.");
    }

    let progress = (!announce).then(|| OutputFormatter::create_progress_bar(plans.len() as u64));
    let result = execute_plans(plans, args.dry_run, |plan, destination| {
        if announce {
            OutputFormatter::operation(plan.action, &plan.source, destination);
        }
        if let Some(pb) = &progress {
            pb.set_message(plan.label.to_string());
            pb.inc(1);
        }
    });
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = result?;

    if announce {
        OutputFormatter::summary_table(&report.by_label, report.processed);
        OutputFormatter::plain(&format!("Planned/processed {} file(s).", report.processed));
    }

    Ok(report.processed)
}

/// Expands a leading `~` component to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
