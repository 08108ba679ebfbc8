use chrono::{DateTime, Utc};
use colored::Colorize;
use hashlink::LinkedHashMap;

use crate::diff::engine::FileDiff;
use crate::remote::RemoteEndpoint;
use crate::snapshot::FileSpec;

/// Console presentation of an ordered diff list. Purely derived from the
/// [`FileDiff`] data contract: the only computation here is the
/// "which side is newer" column, read off each changed entry's pair of
/// recorded timestamps.
pub struct Report<'a> {
    diffs: &'a [FileDiff],
    local_label: String,
    remote: &'a RemoteEndpoint,
}

impl<'a> Report<'a> {
    pub fn new(diffs: &'a [FileDiff], remote: &'a RemoteEndpoint) -> Self {
        Self {
            diffs,
            local_label: local_host_label(),
            remote,
        }
    }

    pub fn print(&self, with_ediff_commands: bool) {
        println!("{}", self.render(with_ediff_commands));
    }

    pub fn render(&self, with_ediff_commands: bool) -> String {
        let mut lines: Vec<String> = Vec::new();

        for diff in self.diffs {
            lines.push(format!(
                "Comparing\n  {} {}\nand\n  {} {}\n",
                self.local_label.bold(),
                diff.root_a,
                self.remote.to_string().bold(),
                diff.root_b
            ));

            lines.extend(aligned_section(
                format!(
                    "{} The following entries are only present on {}:",
                    ">>>".green(),
                    self.local_label
                ),
                only_rows(&diff.only_in_a),
            ));
            lines.push(String::new());

            lines.extend(aligned_section(
                format!(
                    "{} The following entries are only present on {}:",
                    "<<<".red(),
                    self.remote
                ),
                only_rows(&diff.only_in_b),
            ));
            lines.push(String::new());

            lines.extend(aligned_section(
                format!("{} The following files are changed:", "===".yellow()),
                changed_rows(&diff.changed),
            ));
            lines.push(String::new());
        }

        if with_ediff_commands {
            for diff in self.diffs {
                for rel in diff.changed.keys() {
                    lines.push(ediff_command(
                        &diff.root_a,
                        &diff.root_b,
                        rel,
                        &self.remote.user_host,
                    ));
                }
            }
        }

        lines.join("\n")
    }
}

fn only_rows(entries: &LinkedHashMap<String, FileSpec>) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(key, spec)| (key.clone(), format_epoch(spec.modified_time)))
        .collect()
}

fn changed_rows(
    entries: &LinkedHashMap<String, (FileSpec, FileSpec)>,
) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(key, (spec_a, spec_b))| {
            let newer = if spec_a.modified_time > spec_b.modified_time {
                "A"
            } else {
                "B"
            };
            let detail = format!(
                "{} | {} | {}",
                newer,
                format_epoch(spec_a.modified_time),
                format_epoch(spec_b.modified_time)
            );
            (key.clone(), detail)
        })
        .collect()
}

/// One section: a header line, then each row's key column padded to a
/// common width with its detail column after a `|`.
fn aligned_section(header: String, rows: Vec<(String, String)>) -> Vec<String> {
    let mut lines = vec![header];

    if rows.is_empty() {
        lines.push("  (none)".to_string());
        return lines;
    }

    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, detail) in rows {
        lines.push(format!("  {key:<width$} | {detail}"));
    }
    lines
}

/// Emacs invocation for one changed file, for copy and paste.
fn ediff_command(root_a: &str, root_b: &str, rel: &str, host: &str) -> String {
    format!(
        "(let ((f1 \"{}\") (f2 \"{}\")) (ediff-files f1 (concat \"/ssh:{}:\" f2)))",
        join_root(root_a, rel),
        join_root(root_b, rel),
        host
    )
}

fn join_root(root: &str, rel: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), rel)
}

fn format_epoch(epoch_secs: f64) -> String {
    let secs = epoch_secs.floor() as i64;
    let nanos = ((epoch_secs - epoch_secs.floor()) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "????-??-?? ??:??:??".to_string())
}

fn local_host_label() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}
