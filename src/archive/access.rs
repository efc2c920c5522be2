//! Entry-level view of an archive, independent of the container format.

use std::path::Path;

use super::error::Result;

/// One entry of an archive as listed by its directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryInfo {
    /// Full entry name with `/` separators. Directory entries end with `/`.
    pub name: String,
    pub is_dir: bool,
}

impl EntryInfo {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        Self { name, is_dir: true }
    }

    /// Whether the entry holds a compiled class.
    pub fn is_class_file(&self) -> bool {
        !self.is_dir && self.name.ends_with(".class")
    }

    /// Directory part of the name including the trailing `/`, empty for
    /// entries at the archive root.
    pub fn parent_directory(&self) -> &str {
        let name = self.name.strip_suffix('/').unwrap_or(&self.name);
        match name.rfind('/') {
            Some(index) => &name[..=index],
            None => "",
        }
    }
}

/// Read access to the entries of an archive.
///
/// Implementations acquire the underlying resource for the duration of each
/// call and release it before returning, on success and on error alike.
pub trait ArchiveEntryAccess {
    /// Location of the archive; also its identity.
    fn path(&self) -> &Path;

    /// Every entry of the archive in directory order.
    fn list_entries(&self) -> Result<Vec<EntryInfo>>;

    /// Complete content of the named entry.
    fn read_entry(&self, name: &str) -> Result<Vec<u8>>;

    /// Streams the content of every entry `accept` selects into `visit`.
    ///
    /// The outer error reports that the archive itself could not be read.
    /// Failures reading a single entry are handed to `visit` so callers can
    /// skip that entry and continue.
    fn for_each_entry(
        &self,
        accept: &dyn Fn(&EntryInfo) -> bool,
        visit: &mut dyn FnMut(&EntryInfo, Result<Vec<u8>>),
    ) -> Result<()> {
        for entry in self.list_entries()? {
            if accept(&entry) {
                let content = self.read_entry(&entry.name);
                visit(&entry, content);
            }
        }
        Ok(())
    }
}
