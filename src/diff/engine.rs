use std::collections::{BTreeMap, HashMap, HashSet};

use hashlink::LinkedHashMap;
use snafu::{OptionExt, Snafu, ensure};
use tracing::debug;

use crate::snapshot::{DirContent, FileSpec, FileTree, SELF_ENTRY};

/// Structured diff of one tree pair. Keys are paths relative to the roots;
/// a key with a trailing `/` is a directory marker standing for an entire
/// subtree present on one side only, so file keys and directory keys can
/// never collide. `changed` holds both sides' [`FileSpec`] so a consumer
/// can derive which side is newer.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDiff {
    pub root_a: String,
    pub root_b: String,
    pub only_in_a: LinkedHashMap<String, FileSpec>,
    pub only_in_b: LinkedHashMap<String, FileSpec>,
    pub changed: LinkedHashMap<String, (FileSpec, FileSpec)>,
}

impl FileDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty() && self.changed.is_empty()
    }
}

/// Compares `trees_a[i]` against `trees_b[i]` by index. The caller is
/// responsible for the two lists representing corresponding roots in
/// corresponding order; a length mismatch is an error.
pub fn diff(trees_a: &[FileTree], trees_b: &[FileTree]) -> Result<Vec<FileDiff>, DiffError> {
    ensure!(
        trees_a.len() == trees_b.len(),
        TreeCountMismatchSnafu {
            count_a: trees_a.len(),
            count_b: trees_b.len(),
        }
    );

    trees_a
        .iter()
        .zip(trees_b)
        .map(|(a, b)| diff_pair(a, b))
        .collect()
}

/// Directory index of a tree: ascending relative-path order, each entry
/// paired with its validated `"."` self-entry.
type DirIndex<'t> = BTreeMap<&'t str, (&'t DirContent, &'t FileSpec)>;

fn index_tree(tree: &FileTree) -> Result<DirIndex<'_>, DiffError> {
    let mut index = DirIndex::new();
    for dir in &tree.dirs {
        let self_entry = dir.self_entry().context(MissingSelfEntrySnafu {
            root: &tree.root,
            dir: &dir.path,
        })?;
        index.insert(dir.path.as_str(), (dir, self_entry));
    }
    Ok(index)
}

fn diff_pair(tree_a: &FileTree, tree_b: &FileTree) -> Result<FileDiff, DiffError> {
    debug!("Diffing {} against {}", tree_a.root, tree_b.root);

    let dirs_a = index_tree(tree_a)?;
    let dirs_b = index_tree(tree_b)?;

    let mut only_in_a: LinkedHashMap<String, FileSpec> = LinkedHashMap::new();
    let mut only_in_b: LinkedHashMap<String, FileSpec> = LinkedHashMap::new();
    let mut changed: LinkedHashMap<String, (FileSpec, FileSpec)> = LinkedHashMap::new();
    let mut seen_dirs: HashSet<&str> = HashSet::new();
    let mut markers_a: Vec<String> = Vec::new();
    let mut markers_b: Vec<String> = Vec::new();

    for (&path, &(dir_a, self_a)) in &dirs_a {
        // Once a whole subtree is known missing on side B, none of its
        // descendants are examined individually.
        if under_missing_subtree(&markers_a, path) {
            continue;
        }
        seen_dirs.insert(path);

        match dirs_b.get(path) {
            None => {
                let marker = dir_marker(path);
                only_in_a.insert(marker.clone(), self_a.clone());
                markers_a.push(marker);
            }
            Some(&(dir_b, _)) => {
                compare_entries(path, dir_a, dir_b, &mut only_in_a, &mut only_in_b, &mut changed);
            }
        }
    }

    for (&path, &(_, self_b)) in &dirs_b {
        if under_missing_subtree(&markers_b, path) {
            continue;
        }
        if seen_dirs.contains(path) {
            continue;
        }
        let marker = dir_marker(path);
        only_in_b.insert(marker.clone(), self_b.clone());
        markers_b.push(marker);
    }

    Ok(FileDiff {
        root_a: tree_a.root.clone(),
        root_b: tree_b.root.clone(),
        only_in_a,
        only_in_b,
        changed,
    })
}

/// Compares the file lists of one directory present on both sides. Two
/// files count as changed only when their sizes differ; timestamps are
/// deliberately ignored, tolerating clock skew between hosts.
fn compare_entries(
    dir_path: &str,
    dir_a: &DirContent,
    dir_b: &DirContent,
    only_in_a: &mut LinkedHashMap<String, FileSpec>,
    only_in_b: &mut LinkedHashMap<String, FileSpec>,
    changed: &mut LinkedHashMap<String, (FileSpec, FileSpec)>,
) {
    let files_b: HashMap<&str, &FileSpec> =
        dir_b.files().map(|spec| (spec.name.as_str(), spec)).collect();
    let mut seen_files: HashSet<&str> = HashSet::new();

    for spec_a in dir_a.files() {
        seen_files.insert(spec_a.name.as_str());
        match files_b.get(spec_a.name.as_str()) {
            None => {
                only_in_a.insert(entry_key(dir_path, &spec_a.name), spec_a.clone());
            }
            Some(spec_b) if spec_a.size != spec_b.size => {
                changed.insert(
                    entry_key(dir_path, &spec_a.name),
                    (spec_a.clone(), (*spec_b).clone()),
                );
            }
            Some(_) => {}
        }
    }

    for spec_b in dir_b.files() {
        if !seen_files.contains(spec_b.name.as_str()) {
            only_in_b.insert(entry_key(dir_path, &spec_b.name), spec_b.clone());
        }
    }
}

/// Because markers carry their trailing separator, the prefix test is
/// path-segment aware: a `foo/` marker can never swallow `foobar`.
fn under_missing_subtree(markers: &[String], path: &str) -> bool {
    markers.iter().any(|marker| path.starts_with(marker.as_str()))
}

fn dir_marker(path: &str) -> String {
    format!("{path}/")
}

fn entry_key(dir_path: &str, name: &str) -> String {
    if dir_path == SELF_ENTRY {
        name.to_string()
    } else {
        format!("{dir_path}/{name}")
    }
}

#[derive(Debug, Snafu)]
pub enum DiffError {
    #[snafu(display(
        "Tree lists have mismatched lengths ({} vs {}); index pairing is impossible",
        count_a,
        count_b
    ))]
    TreeCountMismatch { count_a: usize, count_b: usize },
    #[snafu(display("Directory '{}' in tree '{}' is missing its '.' self-entry", dir, root))]
    MissingSelfEntry { root: String, dir: String },
}
