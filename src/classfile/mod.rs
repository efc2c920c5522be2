//! Class file reference scanning

pub mod descriptor;
pub mod error;
mod reader;
pub mod scanner;

pub use descriptor::{collect_descriptor_classes, descriptor_classes, package_names, package_of};
pub use error::ClassParseError;
pub use scanner::{
    find_class_names, find_class_names_from_reader, find_package_names,
    find_package_names_from_reader,
};
