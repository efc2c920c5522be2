//! Package-level description of a single archive.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use tracing::{debug, warn};

use super::config::{AnalysisConfig, PackageDiscovery};
use super::filters::is_platform_name;
use crate::archive::{ArchiveEntryAccess, ArchiveError, EntryInfo, ZipArchiveAccess};
use crate::classfile::{find_class_names, package_names};

/// Provided, referenced and foreign packages of one archive.
///
/// Identity is the archive path. Every accessor computes its value on first
/// successful use and returns the same cached set afterwards; the cache is
/// not shared across threads.
pub struct ArchiveDescriptor {
    path: PathBuf,
    access: Box<dyn ArchiveEntryAccess>,
    entries: Vec<EntryInfo>,
    package_discovery: PackageDiscovery,
    provided_packages: OnceCell<BTreeSet<String>>,
    referenced_class_names: OnceCell<BTreeSet<String>>,
    referenced_package_names: OnceCell<BTreeSet<String>>,
    package_dependencies: OnceCell<BTreeSet<String>>,
}

impl ArchiveDescriptor {
    /// Describes the jar at `path`. Fails if the file is not a readable zip
    /// container.
    pub fn open(path: impl Into<PathBuf>, config: &AnalysisConfig) -> Result<Self, ArchiveError> {
        Self::from_access(ZipArchiveAccess::new(path), config)
    }

    /// Describes an archive reached through any entry access. The entry
    /// directory is listed once, up front.
    pub fn from_access<A>(access: A, config: &AnalysisConfig) -> Result<Self, ArchiveError>
    where
        A: ArchiveEntryAccess + 'static,
    {
        let entries = access.list_entries()?;
        debug!(
            archive = %access.path().display(),
            entries = entries.len(),
            "Listed archive entries"
        );

        Ok(Self {
            path: access.path().to_path_buf(),
            access: Box::new(access),
            entries,
            package_discovery: config.package_discovery,
            provided_packages: OnceCell::new(),
            referenced_class_names: OnceCell::new(),
            referenced_package_names: OnceCell::new(),
            package_dependencies: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the archive, for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    /// Packages whose class files this archive contains.
    pub fn provided_packages(&self) -> &BTreeSet<String> {
        self.provided_packages.get_or_init(|| {
            discover_packages(&self.entries, self.package_discovery)
        })
    }

    /// Dotted names of every class referenced by the archive's class files.
    ///
    /// Class files that cannot be read or parsed are logged and contribute
    /// nothing. Fails when the archive itself can no longer be read; a
    /// failure is not cached.
    pub fn referenced_class_names(&self) -> Result<&BTreeSet<String>, ArchiveError> {
        self.referenced_class_names
            .get_or_try_init(|| self.scan_class_files())
    }

    /// Packages of [`referenced_class_names`](Self::referenced_class_names),
    /// own packages included.
    pub fn referenced_package_names(&self) -> Result<&BTreeSet<String>, ArchiveError> {
        self.referenced_package_names
            .get_or_try_init(|| Ok(package_names(self.referenced_class_names()?)))
    }

    /// Referenced packages this archive does not provide itself, excluding
    /// platform namespaces.
    pub fn package_dependencies(&self) -> Result<&BTreeSet<String>, ArchiveError> {
        self.package_dependencies.get_or_try_init(|| {
            let provided = self.provided_packages();
            Ok(self
                .referenced_package_names()?
                .iter()
                .filter(|package| !provided.contains(*package))
                .filter(|package| !is_platform_name(package))
                .cloned()
                .collect())
        })
    }

    fn scan_class_files(&self) -> Result<BTreeSet<String>, ArchiveError> {
        let mut names = BTreeSet::new();
        let mut scanned = 0usize;
        let mut skipped = 0usize;

        self.access.for_each_entry(
            &|entry: &EntryInfo| entry.is_class_file(),
            &mut |entry: &EntryInfo, content: Result<Vec<u8>, ArchiveError>| {
                let parsed = content
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| find_class_names(&bytes).map_err(|e| e.to_string()));
                match parsed {
                    Ok(found) => {
                        scanned += 1;
                        names.extend(found);
                    }
                    Err(reason) => {
                        skipped += 1;
                        warn!(
                            archive = %self.path.display(),
                            entry = %entry.name,
                            "Skipping class file: {reason}"
                        );
                    }
                }
            },
        )?;

        debug!(
            archive = %self.path.display(),
            scanned,
            skipped,
            references = names.len(),
            "Scanned class files"
        );
        Ok(names)
    }
}

/// Packages provided according to `discovery`; see [`PackageDiscovery`].
pub fn discover_packages(entries: &[EntryInfo], discovery: PackageDiscovery) -> BTreeSet<String> {
    let class_directories: BTreeSet<&str> = entries
        .iter()
        .filter(|entry| entry.is_class_file())
        .map(EntryInfo::parent_directory)
        .filter(|directory| !directory.is_empty())
        .collect();

    match discovery {
        PackageDiscovery::DirectoryEntries => entries
            .iter()
            .filter(|entry| entry.is_dir && class_directories.contains(entry.name.as_str()))
            .map(|entry| directory_to_package(&entry.name))
            .collect(),
        PackageDiscovery::EntryPaths => class_directories
            .into_iter()
            .map(directory_to_package)
            .collect(),
    }
}

fn directory_to_package(directory: &str) -> String {
    directory
        .strip_suffix('/')
        .unwrap_or(directory)
        .replace('/', ".")
}

impl fmt::Debug for ArchiveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveDescriptor")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("package_discovery", &self.package_discovery)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ArchiveDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ArchiveDescriptor {}

impl Hash for ArchiveDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for ArchiveDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArchiveDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}
