//! Archive descriptions and pool-wide dependency resolution

pub mod config;
pub mod descriptor;
pub mod filters;
pub mod resolver;

pub use config::{AnalysisConfig, PackageDiscovery};
pub use descriptor::{discover_packages, ArchiveDescriptor};
pub use filters::{is_platform_name, PLATFORM_PREFIXES};
pub use resolver::{Dependency, DependencyResolver};
