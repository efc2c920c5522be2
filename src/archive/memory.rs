//! In-memory archive access

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::access::{ArchiveEntryAccess, EntryInfo};
use super::error::{ArchiveError, Result};

/// Archive held entirely in memory, for archives assembled by the caller
/// rather than read from disk. Entries keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    path: PathBuf,
    entries: Vec<EntryInfo>,
    contents: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_directory(mut self, name: impl Into<String>) -> Self {
        self.entries.push(EntryInfo::directory(name));
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let entry = EntryInfo::file(name);
        self.contents.insert(entry.name.clone(), content.into());
        self.entries.push(entry);
        self
    }
}

impl ArchiveEntryAccess for MemoryArchive {
    fn path(&self) -> &Path {
        &self.path
    }

    fn list_entries(&self) -> Result<Vec<EntryInfo>> {
        Ok(self.entries.clone())
    }

    fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        self.contents
            .get(name)
            .cloned()
            .ok_or_else(|| ArchiveError::EntryNotFound {
                path: self.path.clone(),
                name: name.to_string(),
            })
    }
}
