use std::path::PathBuf;

use clap::Parser;

use crate::cli::LogLevel;
use crate::remote::RemoteEndpoint;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Compare local directory trees against a remote host over ssh")]
pub struct Cli {
    /// Root directories to compare
    #[clap(required = true)]
    pub roots: Vec<PathBuf>,

    /// Remote endpoint as user@host or user@host:basedir. The basedir form
    /// replaces the root path on the remote side (single root only).
    #[clap(long, short)]
    pub remote: Option<RemoteEndpoint>,

    /// Build the snapshot index and write it to stdout. Not meant for
    /// direct use; this is what the local side runs on the remote host.
    #[clap(long)]
    pub print_index: bool,

    /// File name patterns to ignore (globs matched against bare names)
    #[clap(long, num_args = 1..)]
    pub ignore_files: Option<Vec<String>>,

    /// Full path patterns to ignore (globs matched against entry paths)
    #[clap(long, num_args = 1..)]
    pub ignore_paths: Option<Vec<String>>,

    /// Print emacs ediff invocations for changed files, for copy and paste
    #[clap(long)]
    pub print_ediff_commands: bool,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roots_remote_and_patterns() {
        let cli = Cli::parse_from([
            "remdiff",
            "notes",
            "projects",
            "--remote",
            "me@box:/srv/notes",
            "--ignore-files",
            "*.o",
            "*.tmp",
            "--print-ediff-commands",
        ]);

        assert_eq!(cli.roots.len(), 2);
        let remote = cli.remote.unwrap();
        assert_eq!(remote.user_host, "me@box");
        assert_eq!(remote.basedir.as_deref(), Some("/srv/notes"));
        assert_eq!(
            cli.ignore_files.as_deref(),
            Some(["*.o".to_string(), "*.tmp".to_string()].as_slice())
        );
        assert!(cli.print_ediff_commands);
        assert!(!cli.print_index);
    }

    #[test]
    fn at_least_one_root_is_required() {
        assert!(Cli::try_parse_from(["remdiff"]).is_err());
    }

    #[test]
    fn index_mode_matches_what_the_transport_sends() {
        // Mirror of the command line built in remote::transport.
        let cli = Cli::parse_from([
            "remdiff",
            "--print-index",
            "--log-level",
            "silent",
            "/srv/data",
            "--ignore-files",
            "*.pyc",
        ]);

        assert!(cli.print_index);
        assert_eq!(cli.roots, vec![PathBuf::from("/srv/data")]);
        assert!(matches!(cli.log_level, LogLevel::Silent));
    }
}
