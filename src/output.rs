//! Output formatting and styling module.
//!
//! All user-facing terminal output goes through [`OutputFormatter`] so that
//! styling stays consistent. Diagnostics go through `tracing` instead.

use crate::file_organizer::Action;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;

/// Manages CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use typesort::output::OutputFormatter;
    /// OutputFormatter::error("source does not exist: /nope");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints one operation as `ACTION: source -> destination`.
    pub fn operation(action: Action, source: &Path, destination: &Path) {
        let tag = format!("{}:", action);
        let tag = match action {
            Action::Move => tag.cyan(),
            Action::Copy => tag.blue(),
        };
        println!("{} {} -> {}", tag, source.display(), destination.display());
    }

    /// Creates a progress bar for file operations.
    ///
    /// The bar draws to stderr and stays hidden when stderr is not a terminal.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use typesort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a table of processed files per type label.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use typesort::output::OutputFormatter;
    /// use std::collections::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// counts.insert("pdf".to_string(), 15);
    /// counts.insert("tar.gz".to_string(), 2);
    /// OutputFormatter::summary_table(&counts, 17);
    /// ```
    pub fn summary_table(label_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut labels: Vec<_> = label_counts.iter().collect();
        labels.sort_by_key(|&(name, _)| name);

        let width = labels
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(5); // "Total"

        println!("{:<width$} | {}", "Type".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (label, count) in &labels {
            println!(
                "{:<width$} | {} {}",
                label,
                count.to_string().green(),
                plural(**count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
