//! Resolution of type descriptors into dotted class names.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Matches `L<path>;` tokens whose first package segment is lowercase ASCII.
/// Inner classes (`$`) and default-package classes never match.
static CLASS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"L([a-z]+/[A-Za-z0-9_/]+);").expect("valid class token pattern"));

/// Adds every class named by `descriptor` to `names`.
///
/// Arrays of any dimension collapse to their element type and primitive
/// element types contribute nothing. Anything else (field descriptors,
/// method descriptors, generic signatures) is searched for embedded
/// `L<path>;` tokens, each converted to dotted form.
pub fn collect_descriptor_classes(descriptor: &str, names: &mut BTreeSet<String>) {
    let element = descriptor.trim_start_matches('[');
    if element.len() != descriptor.len() && is_primitive(element) {
        return;
    }

    for captures in CLASS_TOKEN.captures_iter(element) {
        if let Some(path) = captures.get(1) {
            names.insert(path.as_str().replace('/', "."));
        }
    }
}

/// Classes named by a single descriptor.
pub fn descriptor_classes(descriptor: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_descriptor_classes(descriptor, &mut names);
    names
}

fn is_primitive(descriptor: &str) -> bool {
    matches!(
        descriptor,
        "B" | "C" | "D" | "F" | "I" | "J" | "S" | "Z" | "V"
    )
}

/// Package part of a dotted class name, `None` for the default package.
pub fn package_of(class_name: &str) -> Option<&str> {
    class_name.rsplit_once('.').map(|(package, _)| package)
}

/// Packages of the given dotted class names; default-package classes are
/// dropped.
pub fn package_names<'a, I>(class_names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    class_names
        .into_iter()
        .filter_map(|name| package_of(name))
        .map(str::to_string)
        .collect()
}
