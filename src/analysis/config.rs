//! Analysis configuration

/// How an archive's provided packages are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageDiscovery {
    /// A package is provided when the archive has an explicit directory
    /// entry for it that directly contains at least one class file. Archives
    /// without directory entries report fewer packages than they hold.
    #[default]
    DirectoryEntries,
    /// A package is provided when at least one class file entry lives
    /// directly under its path, whether or not a directory entry exists.
    EntryPaths,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// File extension (without the dot) identifying archives in a pool directory.
    pub archive_extension: String,
    pub package_discovery: PackageDiscovery,
}

impl AnalysisConfig {
    pub fn with_package_discovery(mut self, package_discovery: PackageDiscovery) -> Self {
        self.package_discovery = package_discovery;
        self
    }

    pub fn with_archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = extension.into();
        self
    }

    /// Whether `file_name` carries the configured archive extension.
    pub fn is_archive_name(&self, file_name: &str) -> bool {
        file_name
            .strip_suffix(self.archive_extension.as_str())
            .is_some_and(|stem| stem.ends_with('.'))
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            archive_extension: "jar".to_string(),
            package_discovery: PackageDiscovery::default(),
        }
    }
}
