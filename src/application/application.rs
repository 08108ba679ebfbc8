use std::io::Write;
use std::path::PathBuf;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::diff::{DiffError, Report, diff};
use crate::remote::{
    CodecError, RemoteEndpoint, RemoteSnapshot, SnapshotRequest, TransportError, encode_trees,
};
use crate::snapshot::{FilterError, IgnoreFilter, PatternMatcher, SnapshotError, build_snapshot};

pub struct Application;

impl Application {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let config: RuntimeConfig = config.into();

        let filter = IgnoreFilter::from_patterns(&config.ignore_files, &config.ignore_paths)
            .context(FilterSnafu)?;

        if config.print_index {
            return print_index(&config, &filter);
        }

        let remote = config.remote.as_ref().context(MissingRemoteSnafu)?;
        let request = SnapshotRequest {
            roots: remote_roots(&config.roots, remote)?,
            ignore_files: config.ignore_files.clone(),
            ignore_paths: config.ignore_paths.clone(),
        };

        // Spawned before the local walk so both sides scan concurrently.
        let pending = RemoteSnapshot::request(remote, &request).context(RemoteSnafu)?;

        let local_trees = build_snapshot(&config.roots, &filter).context(LocalWalkSnafu)?;
        debug!("Built {} local trees", local_trees.len());

        let remote_trees = pending.collect().await.context(RemoteSnafu)?;

        let diffs = diff(&local_trees, &remote_trees).context(DiffSnafu)?;
        if diffs.iter().all(|d| d.is_empty()) {
            info!("All compared trees are identical");
        }

        Report::new(&diffs, remote).print(config.print_ediff_commands);

        Ok(())
    }
}

/// Builds the snapshot index and writes it as a binary payload to stdout.
/// This is the mode the local side invokes over ssh.
fn print_index<N, P>(
    config: &RuntimeConfig,
    filter: &IgnoreFilter<N, P>,
) -> Result<(), ApplicationError>
where
    N: PatternMatcher,
    P: PatternMatcher,
{
    let trees = build_snapshot(&config.roots, filter).context(LocalWalkSnafu)?;
    let payload = encode_trees(&trees).context(EncodeSnafu)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&payload).context(WriteIndexSnafu)?;
    stdout.flush().context(WriteIndexSnafu)?;
    Ok(())
}

/// The root paths the remote side is asked to walk. By default the local
/// root arguments are passed through verbatim; a basedir on the endpoint
/// substitutes for the (then necessarily single) root.
fn remote_roots(
    roots: &[PathBuf],
    remote: &RemoteEndpoint,
) -> Result<Vec<String>, ApplicationError> {
    match &remote.basedir {
        Some(basedir) => {
            ensure!(
                roots.len() == 1,
                BasedirRequiresSingleRootSnafu { count: roots.len() }
            );
            Ok(vec![basedir.clone()])
        }
        None => Ok(roots
            .iter()
            .map(|root| root.to_string_lossy().into_owned())
            .collect()),
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Invalid ignore patterns"))]
    FilterError { source: FilterError },
    #[snafu(display("Failed to snapshot the local trees"))]
    LocalWalkError { source: SnapshotError },
    #[snafu(display("Failed to encode the snapshot index"))]
    EncodeError { source: CodecError },
    #[snafu(display("Failed to write the snapshot index to stdout"))]
    WriteIndexError { source: std::io::Error },
    #[snafu(display("No remote endpoint given; pass --remote user@host[:basedir]"))]
    MissingRemote,
    #[snafu(display(
        "A remote basedir replaces a single root, but {} roots were given",
        count
    ))]
    BasedirRequiresSingleRoot { count: usize },
    #[snafu(display("Remote snapshot failed"))]
    RemoteError { source: TransportError },
    #[snafu(display("Failed to compare the snapshots"))]
    DiffError { source: DiffError },
}
