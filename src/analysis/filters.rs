//! Name filters for platform-provided namespaces.

/// Namespaces shipped with the runtime platform; always resolvable.
pub const PLATFORM_PREFIXES: &[&str] = &["java.", "javax.", "sun.", "com.sun."];

/// Whether a dotted class or package name lies in a platform namespace.
pub fn is_platform_name(name: &str) -> bool {
    PLATFORM_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}
