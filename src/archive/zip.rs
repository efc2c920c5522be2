//! ZIP (jar) backed archive access

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::access::{ArchiveEntryAccess, EntryInfo};
use super::error::{ArchiveError, Result};

/// Archive access backed by a zip container on disk.
///
/// The file is opened per operation and closed when the operation returns,
/// so a pool of thousands of archives never holds more than one handle.
/// Entries are decompressed one at a time.
#[derive(Debug, Clone)]
pub struct ZipArchiveAccess {
    path: PathBuf,
}

impl ZipArchiveAccess {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<ZipArchive<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|source| ArchiveError::Io {
            path: self.path.clone(),
            source,
        })?;
        ZipArchive::new(BufReader::new(file)).map_err(|source| self.zip_error(source))
    }

    fn zip_error(&self, source: zip::result::ZipError) -> ArchiveError {
        ArchiveError::Zip {
            path: self.path.clone(),
            source,
        }
    }

    fn read_to_vec(&self, mut entry: impl Read) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        entry
            .read_to_end(&mut buffer)
            .map_err(|source| ArchiveError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(buffer)
    }
}

impl ArchiveEntryAccess for ZipArchiveAccess {
    fn path(&self) -> &Path {
        &self.path
    }

    fn list_entries(&self) -> Result<Vec<EntryInfo>> {
        let mut archive = self.open()?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|source| self.zip_error(source))?;
            entries.push(EntryInfo {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
            });
        }
        Ok(entries)
    }

    fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.open()?;
        let entry = archive.by_name(name).map_err(|source| match source {
            zip::result::ZipError::FileNotFound => ArchiveError::EntryNotFound {
                path: self.path.clone(),
                name: name.to_string(),
            },
            other => self.zip_error(other),
        })?;
        self.read_to_vec(entry)
    }

    fn for_each_entry(
        &self,
        accept: &dyn Fn(&EntryInfo) -> bool,
        visit: &mut dyn FnMut(&EntryInfo, Result<Vec<u8>>),
    ) -> Result<()> {
        let mut archive = self.open()?;

        for index in 0..archive.len() {
            // The central directory record names the entry even when its
            // data cannot be decoded.
            let info = {
                let entry = archive
                    .by_index_raw(index)
                    .map_err(|source| self.zip_error(source))?;
                EntryInfo {
                    name: entry.name().to_string(),
                    is_dir: entry.is_dir(),
                }
            };
            if !accept(&info) {
                continue;
            }

            let content = archive
                .by_index(index)
                .map_err(|source| self.zip_error(source))
                .and_then(|entry| self.read_to_vec(entry));
            visit(&info, content);
        }

        Ok(())
    }
}
