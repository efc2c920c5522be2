//! Jars Deps - package-level dependency auditor for jar pools
//!
//! This crate scans the class files of every jar in a pool for referenced
//! types, derives the packages each jar provides and requires, and classifies
//! every required package as uniquely provided, ambiguously provided or
//! missing within the pool.

pub mod analysis;
pub mod archive;
pub mod classfile;
pub mod cli;

pub use analysis::{AnalysisConfig, ArchiveDescriptor, Dependency, DependencyResolver};
pub use archive::{ArchiveEntryAccess, ZipArchiveAccess};
