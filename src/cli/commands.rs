use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analysis::{AnalysisConfig, ArchiveDescriptor, DependencyResolver};
use crate::cli::output::write_pool_report;

/// Findings for one archive of the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub archive: String,
    /// Provider file name and the packages it uniquely resolves.
    pub one_to_one: Vec<(String, Vec<String>)>,
    /// Ambiguous package and every provider file name.
    pub one_to_many: Vec<(String, Vec<String>)>,
    pub unresolved: Vec<String>,
}

impl ArchiveReport {
    pub fn from_resolver(resolver: &DependencyResolver<'_>) -> Self {
        let one_to_one = resolver
            .one_to_one_dependencies()
            .iter()
            .filter_map(|dependency| {
                dependency.single_provider().map(|provider| {
                    (
                        provider.name(),
                        dependency.packages().iter().cloned().collect(),
                    )
                })
            })
            .collect();

        let one_to_many = resolver
            .one_to_many_dependencies()
            .iter()
            .flat_map(|dependency| {
                let providers: Vec<String> = dependency
                    .providers()
                    .iter()
                    .map(|provider| provider.name())
                    .collect();
                dependency
                    .packages()
                    .iter()
                    .map(move |package| (package.clone(), providers.clone()))
            })
            .collect();

        Self {
            archive: resolver.target().name(),
            one_to_one,
            one_to_many,
            unresolved: resolver.unresolved_packages().iter().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.one_to_one.is_empty() && self.one_to_many.is_empty() && self.unresolved.is_empty()
    }
}

/// Findings for a whole pool, in pool order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub pool: Vec<String>,
    pub archives: Vec<ArchiveReport>,
    /// Unresolved package to the archives that failed to resolve it.
    pub unresolved_index: BTreeMap<String, Vec<String>>,
}

/// Immediate regular files of `directory` carrying the archive extension,
/// sorted by path. Symbolic links count when they point to a regular file.
pub fn discover_archives(directory: &Path, config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    let walker = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Dangling links inside the pool directory are not archives.
            Err(e) if e.depth() > 0 => {
                warn!(path = ?e.path(), "Skipping unreadable pool entry: {e}");
                continue;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to list directory {}", directory.display()))
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if config.is_archive_name(&entry.file_name().to_string_lossy()) {
            archives.push(entry.into_path());
        }
    }
    archives.sort();
    Ok(archives)
}

/// Opens a descriptor for every archive. Any archive that is not a readable
/// zip container aborts the run.
pub fn open_pool(paths: &[PathBuf], config: &AnalysisConfig) -> Result<Vec<ArchiveDescriptor>> {
    paths
        .iter()
        .map(|path| {
            ArchiveDescriptor::open(path, config)
                .with_context(|| format!("Failed to open archive {}", path.display()))
        })
        .collect()
}

/// Resolves every archive of the pool against the rest of it. An archive
/// whose class files can no longer be scanned aborts the analysis.
pub fn analyze_pool(pool: &[ArchiveDescriptor]) -> Result<PoolReport> {
    let mut report = PoolReport {
        pool: pool.iter().map(ArchiveDescriptor::name).collect(),
        ..PoolReport::default()
    };

    for descriptor in pool {
        debug!(archive = %descriptor.path().display(), "Resolving archive");
        let resolver = DependencyResolver::new(descriptor, pool).with_context(|| {
            format!("Failed to scan archive {}", descriptor.path().display())
        })?;
        let archive_report = ArchiveReport::from_resolver(&resolver);

        for package in &archive_report.unresolved {
            report
                .unresolved_index
                .entry(package.clone())
                .or_default()
                .push(archive_report.archive.clone());
        }
        report.archives.push(archive_report);
    }

    Ok(report)
}

/// Analyzes the pool in `directory` and writes the report to `out`.
///
/// Fails when `directory` is not a directory, one of its archives cannot
/// be read, or the report cannot be written out. An empty pool is not an
/// error.
pub fn run(directory: &Path, config: &AnalysisConfig, out: &mut impl Write) -> Result<()> {
    if !directory.is_dir() {
        bail!("{} is not a directory", directory.display());
    }

    let paths = discover_archives(directory, config)?;
    if paths.is_empty() {
        writeln!(out, "no {}s found", config.archive_extension)?;
        out.flush()?;
        return Ok(());
    }

    info!(
        directory = %directory.display(),
        archives = paths.len(),
        "Analyzing archive pool"
    );

    let pool = open_pool(&paths, config)?;
    let report = analyze_pool(&pool)?;
    write_pool_report(out, &report)?;
    out.flush().context("Failed to write report")?;

    info!(
        unresolved = report.unresolved_index.len(),
        "Finished archive pool analysis"
    );
    Ok(())
}
