//! Special-name registry — fixed identifiers of the Hack surface.

/// Filename suffix of header-interface stubs of the standard library.
pub const HHI_SUFFIX: &str = ".hhi";

/// Root namespace of the standard library. Declarations whose first
/// namespace segment is this are never synthesized.
pub const BUILTIN_ROOT: &str = "HH";

/// The implicit `::class` constant every class carries.
pub const CLASS_CONST: &str = "class";

/// Name of the synthetic helper emitted once in the top-level file.
pub const DEFAULT_FACTORY: &str = "default_factory";

/// Language mode marker at the head of each emitted file.
pub const FILE_HEADER: &str = "<?hh";

/// Multi-file markers used when both emitted files have content.
pub const TOPLEVEL_MARKER: &str = "////toplevel.php";
pub const NAMESPACES_MARKER: &str = "////namespaces.php";

/// Pseudo-constants of the runtime. These never resolve to a declaration.
pub const PSEUDO_CONSTS: &[&str] = &[
    "\\__LINE__",
    "\\__CLASS__",
    "\\__TRAIT__",
    "\\__FILE__",
    "\\__DIR__",
    "\\__FUNCTION__",
    "\\__METHOD__",
    "\\__NAMESPACE__",
    "\\__COMPILER_FRONTEND__",
    "\\__FUNCTION_CREDENTIAL__",
];

// Fully qualified names of container types with dedicated literal or
// brace-constructor syntax. The synthesizer and the initializer generator
// both dispatch on these.
pub const VEC: &str = "\\HH\\vec";
pub const DICT: &str = "\\HH\\dict";
pub const KEYSET: &str = "\\HH\\keyset";
pub const VECTOR: &str = "\\HH\\Vector";
pub const IMM_VECTOR: &str = "\\HH\\ImmVector";
pub const MAP: &str = "\\HH\\Map";
pub const IMM_MAP: &str = "\\HH\\ImmMap";
pub const SET: &str = "\\HH\\Set";
pub const IMM_SET: &str = "\\HH\\ImmSet";
pub const PAIR: &str = "\\HH\\Pair";
pub const CLASSNAME: &str = "\\HH\\classname";
pub const TYPENAME: &str = "\\HH\\typename";

/// Mutable and immutable collection classes with an empty `{}` constructor.
pub const COLLECTION_CLASSES: &[&str] =
    &[VECTOR, IMM_VECTOR, MAP, IMM_MAP, SET, IMM_SET];

/// Returns `true` if `name` matches a pseudo-constant.
pub fn is_pseudo_const(name: &str) -> bool {
    PSEUDO_CONSTS.contains(&name)
}

/// Splits a fully qualified name into its namespace segments,
/// e.g. `\A\B\C` → `["A", "B", "C"]`.
pub fn segments(name: &str) -> Vec<&str> {
    name.trim_start_matches('\\')
        .split('\\')
        .filter(|s| !s.is_empty())
        .collect()
}

/// The unqualified tail of a fully qualified name, e.g. `\A\B\C` → `C`.
pub fn strip_ns(name: &str) -> &str {
    match name.rfind('\\') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

/// Display form of a type name: the standard-library prefix is auto-imported
/// in Hack, so `\HH\vec` prints as `vec`.
pub fn display_name(name: &str) -> &str {
    name.strip_prefix("\\HH\\").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_of_qualified_name() {
        assert_eq!(segments("\\A\\B\\C"), vec!["A", "B", "C"]);
        assert_eq!(segments("Foo"), vec!["Foo"]);
        assert_eq!(segments("\\foo"), vec!["foo"]);
    }

    #[test]
    fn strip_ns_keeps_tail() {
        assert_eq!(strip_ns("\\A\\B\\C"), "C");
        assert_eq!(strip_ns("\\foo"), "foo");
        assert_eq!(strip_ns("bar"), "bar");
    }

    #[test]
    fn hh_prefix_is_auto_imported() {
        assert_eq!(display_name("\\HH\\vec"), "vec");
        assert_eq!(display_name("\\MyNs\\T"), "\\MyNs\\T");
    }
}
