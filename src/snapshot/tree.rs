use std::fs::Metadata;
use std::io;

use bincode::{Decode, Encode};

use crate::ext::SystemTimeExt;

/// Reserved entry name describing the containing directory itself.
pub const SELF_ENTRY: &str = ".";

/// One directory entry's identity and comparison key.
///
/// `modified_time` is seconds since the Unix epoch. For the `"."`
/// self-entry, `size` is whatever the filesystem reports for the directory
/// node; it takes no part in comparisons.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct FileSpec {
    pub name: String,
    pub modified_time: f64,
    pub size: u64,
}

impl FileSpec {
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> io::Result<Self> {
        Ok(Self {
            name: name.into(),
            modified_time: metadata.modified()?.to_epoch_secs(),
            size: metadata.len(),
        })
    }
}

/// A directory's path relative to its tree root (the root itself is `"."`)
/// paired with its recorded entries. Entry names are unique within one
/// directory; exactly one entry is the `"."` self-entry.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct DirContent {
    pub path: String,
    pub entries: Vec<FileSpec>,
}

impl DirContent {
    pub fn self_entry(&self) -> Option<&FileSpec> {
        self.entries.iter().find(|spec| spec.name == SELF_ENTRY)
    }

    /// Entries excluding the `"."` self-entry.
    pub fn files(&self) -> impl Iterator<Item = &FileSpec> {
        self.entries.iter().filter(|spec| spec.name != SELF_ENTRY)
    }
}

/// An immutable recording of one walked root: the root path (for
/// reporting) and one [`DirContent`] per visited directory, root first,
/// in walk order.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct FileTree {
    pub root: String,
    pub dirs: Vec<DirContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, size: u64) -> FileSpec {
        FileSpec {
            name: name.to_string(),
            modified_time: 1_700_000_000.0,
            size,
        }
    }

    #[test]
    fn self_entry_is_found_among_files() {
        let dir = DirContent {
            path: "sub".to_string(),
            entries: vec![spec("a.txt", 10), spec(SELF_ENTRY, 4096), spec("b.txt", 5)],
        };

        assert_eq!(dir.self_entry().map(|s| s.size), Some(4096));
        let names: Vec<&str> = dir.files().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn missing_self_entry_is_none() {
        let dir = DirContent {
            path: ".".to_string(),
            entries: vec![spec("a.txt", 10)],
        };
        assert!(dir.self_entry().is_none());
    }
}
