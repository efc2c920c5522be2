//! Classification of an archive's package dependencies against a pool.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::descriptor::ArchiveDescriptor;
use crate::archive::ArchiveError;

/// Package dependency of one archive on one or more providers.
///
/// A one-to-one record has a single provider and every package resolved
/// uniquely to it. A one-to-many record has a single package and every
/// archive in the pool that provides it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dependency<'a> {
    from: &'a ArchiveDescriptor,
    providers: BTreeSet<&'a ArchiveDescriptor>,
    packages: BTreeSet<String>,
}

impl<'a> Dependency<'a> {
    /// The archive holding the dependency.
    pub fn from(&self) -> &'a ArchiveDescriptor {
        self.from
    }

    /// Archives able to satisfy the dependency.
    pub fn providers(&self) -> &BTreeSet<&'a ArchiveDescriptor> {
        &self.providers
    }

    /// Packages `from` requires of the providers.
    pub fn packages(&self) -> &BTreeSet<String> {
        &self.packages
    }

    pub fn is_one_to_one(&self) -> bool {
        self.providers.len() == 1
    }

    pub fn is_one_to_many(&self) -> bool {
        self.providers.len() > 1
    }

    /// The provider of a one-to-one dependency, `None` when ambiguous.
    pub fn single_provider(&self) -> Option<&'a ArchiveDescriptor> {
        if self.is_one_to_one() {
            self.providers.iter().next().copied()
        } else {
            None
        }
    }
}

/// Unresolved, uniquely resolved and ambiguously resolved package
/// dependencies of a target archive, computed once at construction.
#[derive(Debug, Clone)]
pub struct DependencyResolver<'a> {
    target: &'a ArchiveDescriptor,
    unresolved_packages: BTreeSet<String>,
    one_to_one: Vec<Dependency<'a>>,
    one_to_many: Vec<Dependency<'a>>,
}

impl<'a> DependencyResolver<'a> {
    /// Resolves every package dependency of `target` against `pool`. The
    /// target never counts as a candidate for itself, whether or not it is
    /// part of the pool.
    ///
    /// Fails when the target's class files cannot be scanned.
    pub fn new<I>(target: &'a ArchiveDescriptor, pool: I) -> Result<Self, ArchiveError>
    where
        I: IntoIterator<Item = &'a ArchiveDescriptor>,
    {
        let candidates: BTreeSet<&'a ArchiveDescriptor> = pool
            .into_iter()
            .filter(|candidate| *candidate != target)
            .collect();

        let mut unresolved_packages = BTreeSet::new();
        let mut by_provider: BTreeMap<&'a ArchiveDescriptor, BTreeSet<String>> = BTreeMap::new();
        let mut by_package: BTreeMap<String, BTreeSet<&'a ArchiveDescriptor>> = BTreeMap::new();

        for package in target.package_dependencies()? {
            let providers: BTreeSet<&'a ArchiveDescriptor> = candidates
                .iter()
                .copied()
                .filter(|candidate| candidate.provided_packages().contains(package))
                .collect();

            match providers.len() {
                0 => {
                    unresolved_packages.insert(package.clone());
                }
                1 => {
                    if let Some(provider) = providers.into_iter().next() {
                        by_provider
                            .entry(provider)
                            .or_default()
                            .insert(package.clone());
                    }
                }
                _ => {
                    by_package
                        .entry(package.clone())
                        .or_default()
                        .extend(providers);
                }
            }
        }

        let one_to_one: Vec<Dependency<'a>> = by_provider
            .into_iter()
            .map(|(provider, packages)| Dependency {
                from: target,
                providers: BTreeSet::from([provider]),
                packages,
            })
            .collect();

        let one_to_many: Vec<Dependency<'a>> = by_package
            .into_iter()
            .map(|(package, providers)| Dependency {
                from: target,
                providers,
                packages: BTreeSet::from([package]),
            })
            .collect();

        debug!(
            archive = %target.path().display(),
            unresolved = unresolved_packages.len(),
            one_to_one = one_to_one.len(),
            one_to_many = one_to_many.len(),
            "Resolved package dependencies"
        );

        Ok(Self {
            target,
            unresolved_packages,
            one_to_one,
            one_to_many,
        })
    }

    pub fn target(&self) -> &'a ArchiveDescriptor {
        self.target
    }

    /// Packages no archive in the pool provides.
    pub fn unresolved_packages(&self) -> &BTreeSet<String> {
        &self.unresolved_packages
    }

    /// One record per provider that uniquely resolves at least one package,
    /// ordered by provider path.
    pub fn one_to_one_dependencies(&self) -> &[Dependency<'a>] {
        &self.one_to_one
    }

    /// One record per package provided by several archives, ordered by
    /// package name.
    pub fn one_to_many_dependencies(&self) -> &[Dependency<'a>] {
        &self.one_to_many
    }

    /// Whether there is nothing to report for the target.
    pub fn is_empty(&self) -> bool {
        self.unresolved_packages.is_empty()
            && self.one_to_one.is_empty()
            && self.one_to_many.is_empty()
    }
}
