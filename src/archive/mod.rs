//! Archive entry access

pub mod access;
pub mod error;
pub mod memory;
pub mod zip;

pub use access::{ArchiveEntryAccess, EntryInfo};
pub use error::ArchiveError;
pub use memory::MemoryArchive;
pub use self::zip::ZipArchiveAccess;
