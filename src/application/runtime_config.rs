use std::path::PathBuf;

use crate::cli::Cli;
use crate::remote::RemoteEndpoint;
use crate::snapshot::{default_name_patterns, default_path_patterns};

/// Resolved invocation settings: the CLI with the compiled-in ignore
/// defaults filled in. Constructed once at startup and passed by
/// reference from there on; there is no mutable global configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub roots: Vec<PathBuf>,
    pub remote: Option<RemoteEndpoint>,
    pub print_index: bool,
    pub print_ediff_commands: bool,
    pub ignore_files: Vec<String>,
    pub ignore_paths: Vec<String>,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            roots: cli.roots,
            remote: cli.remote,
            print_index: cli.print_index,
            print_ediff_commands: cli.print_ediff_commands,
            ignore_files: cli.ignore_files.unwrap_or_else(default_name_patterns),
            ignore_paths: cli.ignore_paths.unwrap_or_else(default_path_patterns),
        }
    }
}
