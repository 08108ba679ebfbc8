use std::io;
use std::process::Stdio;

use compio::io::compat::AsyncStream;
use compio::process::{Child, Command};
use futures::AsyncReadExt;
use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, info};

use crate::remote::codec::{CodecError, decode_trees};
use crate::remote::endpoint::RemoteEndpoint;
use crate::snapshot::FileTree;

const SSH_PROGRAM: &str = "ssh";

/// The program the remote host is expected to have on its PATH.
const REMOTE_PROGRAM: &str = "remdiff";

/// What the remote side is asked to snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub roots: Vec<String>,
    pub ignore_files: Vec<String>,
    pub ignore_paths: Vec<String>,
}

/// An in-flight remote snapshot. The ssh child is spawned on `request`,
/// so the remote host walks its trees while the local walk runs;
/// `collect` awaits the child and decodes its payload.
pub struct RemoteSnapshot {
    child: Child,
    remote: String,
}

impl RemoteSnapshot {
    pub fn request(
        endpoint: &RemoteEndpoint,
        request: &SnapshotRequest,
    ) -> Result<Self, TransportError> {
        let script = index_command(request);
        debug!("Requesting remote index from {}: {}", endpoint, script);

        let mut cmd = Command::new(SSH_PROGRAM);
        cmd.arg(&endpoint.user_host);
        cmd.arg(&script);
        Self::spawn_command(cmd, endpoint.user_host.clone())
    }

    fn spawn_command(mut cmd: Command, remote: String) -> Result<Self, TransportError> {
        let _ = cmd.stdin(Stdio::null());
        let _ = cmd.stdout(Stdio::piped());
        let _ = cmd.stderr(Stdio::piped());

        let child = cmd.spawn().context(SpawnSnafu {
            remote: remote.clone(),
        })?;
        Ok(Self { child, remote })
    }

    /// Drains the child's stdout and stderr, waits for it to exit, and
    /// decodes the index payload. Anything on stderr is an error, whatever
    /// the exit status.
    pub async fn collect(mut self) -> Result<Vec<FileTree>, TransportError> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();

        let stdout_fut = async {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout {
                AsyncStream::new(pipe).read_to_end(&mut buf).await?;
            }
            io::Result::Ok(buf)
        };
        let stderr_fut = async {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr {
                AsyncStream::new(pipe).read_to_end(&mut buf).await?;
            }
            io::Result::Ok(buf)
        };

        let (payload, err_output) = futures::join!(stdout_fut, stderr_fut);
        let payload = payload.context(StdioSnafu {
            remote: self.remote.clone(),
        })?;
        let err_output = err_output.context(StdioSnafu {
            remote: self.remote.clone(),
        })?;

        let status = self.child.wait().await.context(WaitSnafu {
            remote: self.remote.clone(),
        })?;

        ensure!(
            err_output.is_empty(),
            RemoteStderrSnafu {
                remote: self.remote.clone(),
                message: String::from_utf8_lossy(&err_output).trim().to_string(),
            }
        );
        ensure!(
            status.success(),
            RemoteExitSnafu {
                remote: self.remote.clone(),
                code: status.code().unwrap_or(-1),
            }
        );

        info!(
            "Received {} byte index payload from {}",
            payload.len(),
            self.remote
        );
        decode_trees(&payload).context(PayloadSnafu {
            remote: self.remote,
        })
    }
}

/// The command line executed on the remote host. Roots and patterns are
/// single-quote escaped for the remote shell; `--log-level silent` keeps
/// both output channels clean for the payload.
fn index_command(request: &SnapshotRequest) -> String {
    let mut parts: Vec<String> = vec![
        REMOTE_PROGRAM.to_string(),
        "--print-index".to_string(),
        "--log-level".to_string(),
        "silent".to_string(),
    ];
    parts.extend(request.roots.iter().map(|root| shell_quote(root)));

    if !request.ignore_files.is_empty() {
        parts.push("--ignore-files".to_string());
        parts.extend(request.ignore_files.iter().map(|p| shell_quote(p)));
    }
    if !request.ignore_paths.is_empty() {
        parts.push("--ignore-paths".to_string());
        parts.extend(request.ignore_paths.iter().map(|p| shell_quote(p)));
    }

    parts.join(" ")
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[derive(Debug, Snafu)]
pub enum TransportError {
    #[snafu(display("Failed to spawn ssh for remote {}", remote))]
    SpawnError {
        remote: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read from the ssh channel to {}", remote))]
    StdioError {
        remote: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to wait for the ssh child for {}", remote))]
    WaitError {
        remote: String,
        source: std::io::Error,
    },
    #[snafu(display("Remote {} reported an error: {}", remote, message))]
    RemoteStderr { remote: String, message: String },
    #[snafu(display("Remote {} exited with status {}", remote, code))]
    RemoteExit { remote: String, code: i32 },
    #[snafu(display("Remote {} sent an unreadable index payload", remote))]
    PayloadError { remote: String, source: CodecError },
}
