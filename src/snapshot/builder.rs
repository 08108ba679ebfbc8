use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::ext::BestEffortPathExt;
use crate::snapshot::filter::{IgnoreFilter, PatternMatcher};
use crate::snapshot::tree::{DirContent, FileSpec, FileTree, SELF_ENTRY};

/// Builds one [`FileTree`] per root, in input order.
///
/// Each root is walked breadth-first; entry names are sorted per directory
/// so that two walks of an unchanged tree produce identical snapshots. The
/// walk is synchronous and owns all of its accumulating state.
pub fn build_snapshot<N, P>(
    roots: &[PathBuf],
    filter: &IgnoreFilter<N, P>,
) -> Result<Vec<FileTree>, SnapshotError>
where
    N: PatternMatcher,
    P: PatternMatcher,
{
    roots.iter().map(|root| walk_root(root, filter)).collect()
}

fn walk_root<N, P>(root: &Path, filter: &IgnoreFilter<N, P>) -> Result<FileTree, SnapshotError>
where
    N: PatternMatcher,
    P: PatternMatcher,
{
    debug!("Walking root {}", root.best_effort_path_display());

    let mut dirs: Vec<DirContent> = Vec::new();
    let mut pending: VecDeque<(PathBuf, String)> = VecDeque::new();
    pending.push_back((root.to_path_buf(), SELF_ENTRY.to_string()));

    while let Some((abs, rel)) = pending.pop_front() {
        let listing = match list_dir(&abs) {
            Ok(listing) => listing,
            Err(e) if e.kind() == io::ErrorKind::NotFound && rel != SELF_ENTRY => {
                // Listed in the parent, gone before we got to it.
                debug!("Directory {} vanished during the walk", rel);
                continue;
            }
            Err(e) => {
                return Err(e).context(ReadDirSnafu {
                    path: abs.best_effort_path_display(),
                });
            }
        };

        let mut entries: Vec<FileSpec> = Vec::new();

        for (name, is_dir) in listing {
            let full = abs.join(&name);
            if filter.is_ignored(&name, &full) {
                debug!("Ignoring {}", full.best_effort_path_display());
                continue;
            }

            if is_dir {
                pending.push_back((full, entry_rel(&rel, &name)));
                continue;
            }

            match fs::metadata(&full) {
                Ok(metadata) if metadata.is_dir() => {
                    // Symlink resolving to a directory; never descended.
                    debug!("Skipping directory symlink {}", full.best_effort_path_display());
                }
                Ok(metadata) => {
                    let spec = FileSpec::from_metadata(name, &metadata).context(StatSnafu {
                        path: full.best_effort_path_display(),
                    })?;
                    entries.push(spec);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Entry {} vanished before stat", full.best_effort_path_display());
                }
                Err(e) => {
                    return Err(e).context(StatSnafu {
                        path: full.best_effort_path_display(),
                    });
                }
            }
        }

        match fs::metadata(&abs) {
            Ok(metadata) => {
                let spec = FileSpec::from_metadata(SELF_ENTRY, &metadata).context(StatSnafu {
                    path: abs.best_effort_path_display(),
                })?;
                entries.push(spec);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && rel != SELF_ENTRY => {
                debug!("Directory {} vanished before its self-stat", rel);
                continue;
            }
            Err(e) => {
                return Err(e).context(StatSnafu {
                    path: abs.best_effort_path_display(),
                });
            }
        }

        dirs.push(DirContent { path: rel, entries });
    }

    Ok(FileTree {
        root: root.best_effort_path_display(),
        dirs,
    })
}

/// Lists a directory as (name, is_dir) pairs, sorted by name. Entry types
/// are taken without following symlinks.
fn list_dir(path: &Path) -> io::Result<Vec<(String, bool)>> {
    let mut names: Vec<(String, bool)> = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            // Same benign race as a failed stat below.
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        names.push((name, file_type.is_dir()));
    }

    names.sort();
    Ok(names)
}

fn entry_rel(dir_rel: &str, name: &str) -> String {
    if dir_rel == SELF_ENTRY {
        name.to_string()
    } else {
        format!("{dir_rel}/{name}")
    }
}

#[derive(Debug, Snafu)]
pub enum SnapshotError {
    #[snafu(display("Failed to list directory {}", path))]
    ReadDirError {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to stat {}", path))]
    StatError {
        path: String,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::filter::{default_name_patterns, default_path_patterns};
    use std::io::Write;
    use tempfile::TempDir;

    fn default_filter() -> IgnoreFilter {
        IgnoreFilter::from_patterns(&default_name_patterns(), &default_path_patterns())
            .expect("default patterns compile")
    }

    fn write_file(dir: &Path, name: &str, contents: &[u8]) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents).unwrap();
    }

    fn tree_of(dir: &TempDir) -> FileTree {
        let trees =
            build_snapshot(&[dir.path().to_path_buf()], &default_filter()).unwrap();
        assert_eq!(trees.len(), 1);
        trees.into_iter().next().unwrap()
    }

    fn dir_paths(tree: &FileTree) -> Vec<&str> {
        tree.dirs.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn records_root_first_with_self_entries() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", b"0123456789");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(&dir.path().join("sub"), "b.txt", b"01234");

        let tree = tree_of(&dir);

        assert_eq!(dir_paths(&tree), vec![".", "sub"]);
        for dir_content in &tree.dirs {
            assert!(dir_content.self_entry().is_some());
        }

        let root = &tree.dirs[0];
        let a = root.files().find(|s| s.name == "a.txt").unwrap();
        assert_eq!(a.size, 10);

        let sub = &tree.dirs[1];
        let b = sub.files().find(|s| s.name == "b.txt").unwrap();
        assert_eq!(b.size, 5);
    }

    #[test]
    fn ignored_directories_are_never_descended() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        write_file(&dir.path().join(".git"), "HEAD", b"ref");
        fs::create_dir(dir.path().join("src")).unwrap();
        write_file(&dir.path().join("src"), "main.rs", b"fn main() {}");

        let tree = tree_of(&dir);

        assert_eq!(dir_paths(&tree), vec![".", "src"]);
        assert!(tree.dirs[0].files().all(|s| s.name != ".git"));
    }

    #[test]
    fn ignored_file_names_are_excluded_at_every_level() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "keep.py", b"x");
        write_file(dir.path(), "drop.pyc", b"x");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(&dir.path().join("sub"), "drop.pyc", b"x");

        let tree = tree_of(&dir);

        let all_names: Vec<String> = tree
            .dirs
            .iter()
            .flat_map(|d| d.files().map(|s| s.name.clone()))
            .collect();
        assert!(all_names.contains(&"keep.py".to_string()));
        assert!(!all_names.contains(&"drop.pyc".to_string()));
    }

    #[test]
    fn path_patterns_exclude_by_full_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("build")).unwrap();
        write_file(&dir.path().join("build"), "out.o", b"x");
        fs::create_dir(dir.path().join("src")).unwrap();
        write_file(&dir.path().join("src"), "lib.rs", b"x");

        let filter = IgnoreFilter::from_patterns(&[], &["*/build".to_string()]).unwrap();
        let trees = build_snapshot(&[dir.path().to_path_buf()], &filter).unwrap();

        assert_eq!(dir_paths(&trees[0]), vec![".", "src"]);
    }

    #[test]
    fn walks_roots_in_input_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_file(first.path(), "one", b"1");
        write_file(second.path(), "two", b"22");

        let trees = build_snapshot(
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            &default_filter(),
        )
        .unwrap();

        assert_eq!(trees.len(), 2);
        assert!(trees[0].dirs[0].files().any(|s| s.name == "one"));
        assert!(trees[1].dirs[0].files().any(|s| s.name == "two"));
    }

    #[test]
    fn missing_root_is_a_hard_failure() {
        let result = build_snapshot(
            &[PathBuf::from("/definitely/not/here")],
            &default_filter(),
        );
        assert!(matches!(result, Err(SnapshotError::ReadDirError { .. })));
    }

    #[test]
    fn repeated_walks_are_identical() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", b"stable");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(&dir.path().join("sub"), "b.txt", b"also stable");

        let first = tree_of(&dir);
        let second = tree_of(&dir);

        assert_eq!(first, second);
    }
}
