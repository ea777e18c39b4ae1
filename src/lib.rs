//! typesort - sort the files of a folder into subfolders by file type
//!
//! Files are classified by name into a sanitized type label (`pdf`,
//! `tar.gz`, `dotfile`, `no-extension`, ...), planned into
//! `<dest>/<label>/<name>`, and then moved or copied, optionally as a dry run.

pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod output;
pub mod type_label;

pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use file_organizer::{
    Action, ExecutionReport, FileOrganizer, OperationPlan, OrganizeError, OrganizeResult,
    execute_plans, unique_destination_path,
};
pub use type_label::TypeLabel;

pub use cli::{Args, run_cli};
