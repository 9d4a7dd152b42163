//! Routable path handling
//!
//! Every path stored or compared anywhere in ginger goes through
//! [`normalize`] first: exactly one leading slash, no trailing slash, no
//! empty segments. The root is `/`.

/// The root path
pub const ROOT: &str = "/";

/// Coerce a path into normalized form. Idempotent.
pub fn normalize(path: &str) -> String {
    let joined = segments(path).collect::<Vec<_>>().join("/");
    format!("/{}", joined)
}

/// Non-empty segments of a path, root first
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Number of segments; the root has depth 0
pub fn depth(path: &str) -> usize {
    segments(path).count()
}

/// Whether the normalized path is the root
pub fn is_root(path: &str) -> bool {
    segments(path).next().is_none()
}

/// Parent of a path, `None` for the root
pub fn parent(path: &str) -> Option<String> {
    let segs: Vec<&str> = segments(path).collect();
    if segs.is_empty() {
        return None;
    }
    Some(format!("/{}", segs[..segs.len() - 1].join("/")))
}

/// Last segment of a path, `None` for the root
pub fn last_segment(path: &str) -> Option<&str> {
    segments(path).last()
}

/// Every prefix of a path from the root down to the path itself.
///
/// `/a/b` yields `/`, `/a`, `/a/b`.
pub fn prefixes(path: &str) -> Vec<String> {
    let segs: Vec<&str> = segments(path).collect();
    let mut out = Vec::with_capacity(segs.len() + 1);
    out.push(ROOT.to_string());
    for i in 1..=segs.len() {
        out.push(format!("/{}", segs[..i].join("/")));
    }
    out
}

/// Plain string-prefix match on normalized forms.
///
/// `/a` matches `/a`, `/a/b` and also `/ab`.
pub fn has_prefix(path: &str, prefix: &str) -> bool {
    normalize(path).starts_with(&normalize(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_forms() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("//"), "/");
        assert_eq!(normalize("a"), "/a");
        assert_eq!(normalize("/a/"), "/a");
        assert_eq!(normalize("a//b///c/"), "/a/b/c");
        assert_eq!(normalize("/{proxy+}"), "/{proxy+}");
    }

    #[test]
    fn test_depth_and_parent() {
        assert_eq!(depth("/"), 0);
        assert_eq!(depth("/a/b"), 2);
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/a").as_deref(), Some("/"));
        assert_eq!(parent("/a/b/").as_deref(), Some("/a"));
        assert_eq!(last_segment("/a/b"), Some("b"));
        assert_eq!(last_segment("/"), None);
    }

    #[test]
    fn test_prefixes_walk_from_root() {
        assert_eq!(prefixes("/"), vec!["/"]);
        assert_eq!(prefixes("a/b"), vec!["/", "/a", "/a/b"]);
    }

    #[test]
    fn test_has_prefix_is_string_based() {
        assert!(has_prefix("/a/b", "/a"));
        assert!(has_prefix("/ab", "/a"));
        assert!(has_prefix("/a", "a/"));
        assert!(!has_prefix("/b", "/a"));
        assert!(has_prefix("/anything", "/"));
    }

    proptest! {
        #[test]
        fn property_normalize_is_idempotent(raw in "[a-z/{}+]{0,24}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.starts_with('/'));
            prop_assert!(!once.starts_with("//"));
            prop_assert!(!once.contains("//"));
            if once != "/" {
                prop_assert!(!once.ends_with('/'));
            }
        }

        #[test]
        fn property_prefixes_end_with_path(raw in "[a-z/]{0,24}") {
            let all = prefixes(&raw);
            prop_assert_eq!(all.last().cloned(), Some(normalize(&raw)));
            prop_assert_eq!(all.len(), depth(&raw) + 1);
        }
    }
}
