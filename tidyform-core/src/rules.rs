//! Fixed style rules
//!
//! Formatting is deliberately not configurable; these tables are the whole of
//! the style definition.

/// Names with special evaluation semantics in every block type
pub const META_ARGUMENTS: &[&str] = &[
    "count",
    "depends_on",
    "for_each",
    "lifecycle",
    "provider",
    "providers",
];

/// Block types recognized at the top level of a configuration file
pub const TOP_LEVEL_BLOCKS: &[&str] = &[
    "data",
    "locals",
    "module",
    "output",
    "provider",
    "resource",
    "terraform",
    "variable",
];

/// Attributes pinned to the top of a `module` block
pub const MODULE_SOURCE_ATTRIBUTES: &[&str] = &["source", "version"];

/// Bare collection type keywords that lack an element type
pub const LEGACY_COLLECTION_KEYWORDS: &[&str] = &["list", "map", "set"];

/// File name suffixes the formatter accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".tf", ".tfvars", ".tftest.hcl"];

pub fn is_meta_argument(name: &str) -> bool {
    META_ARGUMENTS.contains(&name)
}

pub fn is_top_level_block(block_type: &str) -> bool {
    TOP_LEVEL_BLOCKS.contains(&block_type)
}

pub fn is_module_source_attribute(name: &str) -> bool {
    MODULE_SOURCE_ATTRIBUTES.contains(&name)
}

/// Whether the path points at the body of a root-level `module` block
pub fn is_module_body(path: &[String]) -> bool {
    matches!(path, [only] if only == "module")
}

/// Whether the path points at the body of a root-level `variable` block
pub fn is_variable_body(path: &[String]) -> bool {
    matches!(path, [only] if only == "variable")
}

pub fn is_supported_file(name: &str) -> bool {
    SUPPORTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Editor swap files, backups and hidden files
pub fn is_ignored_file(name: &str) -> bool {
    name.starts_with('.')
        || name.ends_with('~')
        || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_meta_arguments() {
        assert!(is_meta_argument("count"));
        assert!(is_meta_argument("lifecycle"));
        assert!(!is_meta_argument("source"));
    }

    #[test]
    fn test_module_body_only_at_depth_one() {
        assert!(is_module_body(&path(&["module"])));
        assert!(!is_module_body(&path(&["resource", "module"])));
        assert!(!is_module_body(&path(&[])));
    }

    #[test]
    fn test_variable_body() {
        assert!(is_variable_body(&path(&["variable"])));
        assert!(!is_variable_body(&path(&["variable", "validation"])));
    }

    #[test]
    fn test_supported_files() {
        assert!(is_supported_file("main.tf"));
        assert!(is_supported_file("prod.tfvars"));
        assert!(is_supported_file("basic.tftest.hcl"));
        assert!(!is_supported_file("main.tf.json"));
        assert!(!is_supported_file("README.md"));
    }

    #[test]
    fn test_ignored_files() {
        assert!(is_ignored_file(".main.tf.swp"));
        assert!(is_ignored_file("main.tf~"));
        assert!(is_ignored_file("#main.tf#"));
        assert!(!is_ignored_file("main.tf"));
        assert!(!is_ignored_file("#"));
    }
}
