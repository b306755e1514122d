//! Logical secret-path arithmetic.
//!
//! Secret paths are opaque slash-delimited strings, normalized without a
//! leading or trailing slash. These helpers never touch the network; they
//! only rewrite strings so the client can address the same logical secret
//! under either KV engine layout.

/// Normalize a path string: collapse duplicate separators and strip
/// leading/trailing slashes.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join two path fragments with a single separator.
///
/// Either side may carry stray slashes; the result is normalized.
pub fn join(base: &str, child: &str) -> String {
    let base = normalize(base);
    let child = normalize(child);
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child,
        (_, true) => base,
        _ => format!("{base}/{child}"),
    }
}

/// Strip the trailing separator that marks a listing key as a subtree.
pub fn trim_trailing_slash(key: &str) -> &str {
    key.strip_suffix('/').unwrap_or(key)
}

/// Rewrite a logical path under a KV v2 API segment (`data` or `metadata`).
///
/// The mount root arrives from the introspection endpoint with a trailing
/// slash. A path equal to the mount root maps to `<root>/<segment>`; a path
/// with the root as a prefix maps to `<root>/<segment>/<suffix>`.
pub fn rewrite_under_mount(path: &str, mount_root: &str, segment: &str) -> String {
    let root = mount_root.trim_end_matches('/');
    if path == mount_root || path == root {
        return join(root, segment);
    }
    let suffix = path.strip_prefix(mount_root).unwrap_or(path);
    join(&join(root, segment), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_strips_slashes() {
        assert_eq!(normalize("/secret/foo/"), "secret/foo");
        assert_eq!(normalize("secret//foo"), "secret/foo");
        assert_eq!(normalize("/"), "");
    }

    #[test]
    fn test_join_basic() {
        assert_eq!(join("secret", "foo"), "secret/foo");
        assert_eq!(join("secret/", "/foo"), "secret/foo");
        assert_eq!(join("", "foo"), "foo");
        assert_eq!(join("secret", ""), "secret");
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(trim_trailing_slash("users/"), "users");
        assert_eq!(trim_trailing_slash("users"), "users");
    }

    #[test]
    fn test_rewrite_mount_root_itself() {
        assert_eq!(rewrite_under_mount("secret", "secret/", "data"), "secret/data");
        assert_eq!(
            rewrite_under_mount("secret/", "secret/", "data"),
            "secret/data"
        );
    }

    #[test]
    fn test_rewrite_path_below_mount() {
        assert_eq!(
            rewrite_under_mount("secret/foo/bar", "secret/", "data"),
            "secret/data/foo/bar"
        );
        assert_eq!(
            rewrite_under_mount("secret/foo", "secret/", "metadata"),
            "secret/metadata/foo"
        );
    }

    #[test]
    fn test_rewrite_foreign_prefix_left_intact() {
        // A path outside the mount keeps its full form under the segment,
        // matching the store's own prefix-trim behavior.
        assert_eq!(
            rewrite_under_mount("other/foo", "secret/", "data"),
            "secret/data/other/foo"
        );
    }

    fn component() -> impl Strategy<Value = String> {
        "[a-z0-9_-]{1,8}"
    }

    proptest! {
        #[test]
        fn prop_join_never_produces_double_slash(a in component(), b in component()) {
            let joined = join(&a, &b);
            prop_assert!(!joined.contains("//"));
            prop_assert!(!joined.starts_with('/'));
            prop_assert!(!joined.ends_with('/'));
        }

        #[test]
        fn prop_rewrite_preserves_suffix(parts in proptest::collection::vec(component(), 1..4)) {
            let suffix = parts.join("/");
            let logical = join("secret", &suffix);
            let rewritten = rewrite_under_mount(&logical, "secret/", "data");
            prop_assert_eq!(rewritten, format!("secret/data/{}", suffix));
        }
    }
}
