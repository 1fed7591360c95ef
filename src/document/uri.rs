//! Scene URI helpers.
//!
//! Documents reference ancestors and component definitions relative to their
//! own location; the live tree holds absolute URIs. These helpers convert
//! between the two without touching the filesystem. URIs are treated as
//! `/`-separated strings so the same code serves file paths and URLs.

/// File extensions handed to the model loader instead of the JSON scene path.
const MODEL_EXTENSIONS: &[&str] = &["gltf", "glb", "obj"];

/// True if the URI points at a 3D model rather than a scene document.
pub fn is_model_uri(uri: &str) -> bool {
    match extension(uri) {
        Some(ext) => MODEL_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)),
        None => false,
    }
}

/// Extension of the final path segment, if any.
fn extension(uri: &str) -> Option<&str> {
    let segment = uri.rsplit('/').next().unwrap_or(uri);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Final path segment without its extension. Falls back to the whole URI.
pub fn file_stem(uri: &str) -> &str {
    let segment = uri.rsplit('/').next().unwrap_or(uri);
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    }
}

/// True for references that need no base: rooted paths and scheme-qualified URLs.
fn is_absolute(uri: &str) -> bool {
    uri.starts_with('/') || uri.contains("://")
}

/// Split `"https://host/a/b"` into `("https://", "host/a/b")`.
fn split_scheme(uri: &str) -> (Option<&str>, &str) {
    match uri.find("://") {
        Some(pos) => (Some(&uri[..pos + 3]), &uri[pos + 3..]),
        None => (None, uri),
    }
}

/// Directory portion of a document URI, without the trailing separator.
/// `"scenes/main.json"` → `"scenes"`; a bare filename resolves to `""`.
pub fn parent_dir(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(pos) => &uri[..pos],
        None => "",
    }
}

/// Resolve `reference` against the document at `base_uri`.
///
/// Absolute references pass through unchanged. `.` and `..` segments are
/// collapsed; `..` above a relative base is kept (the reference may point
/// outside the project directory), but never climbs past a URL authority
/// or a rooted path's `/`.
pub fn resolve(base_uri: &str, reference: &str) -> String {
    if is_absolute(reference) {
        return reference.to_string();
    }

    let (scheme, base_rest) = split_scheme(base_uri);
    let rooted = base_rest.starts_with('/');
    let mut segments: Vec<&str> = parent_dir(base_rest)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // The authority (host) of a URL is not a path segment to climb out of.
    let floor = if scheme.is_some() { 1 } else { 0 };

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.len() > floor {
                    segments.pop();
                } else if scheme.is_none() && !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (scheme, rooted) {
        (Some(s), _) => format!("{s}{joined}"),
        (None, true) => format!("/{joined}"),
        (None, false) => joined,
    }
}

/// Express `absolute` relative to the document at `base_uri`.
///
/// Falls back to returning `absolute` unchanged when the two share no
/// common root (different schemes or authorities, or one rooted and one not).
pub fn relativize(base_uri: &str, absolute: &str) -> String {
    let (base_scheme, base_rest) = split_scheme(base_uri);
    let (abs_scheme, abs_rest) = split_scheme(absolute);
    if base_scheme != abs_scheme || base_rest.starts_with('/') != abs_rest.starts_with('/') {
        return absolute.to_string();
    }

    let base_segments: Vec<&str> = parent_dir(base_rest)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let abs_segments: Vec<&str> = abs_rest.split('/').filter(|s| !s.is_empty()).collect();
    if abs_segments.is_empty() {
        return absolute.to_string();
    }

    let common = base_segments
        .iter()
        .zip(&abs_segments)
        .take_while(|(a, b)| a == b)
        .count();

    // A URL must share its authority with the base to be expressed relatively.
    if base_scheme.is_some() && common < 1 {
        return absolute.to_string();
    }

    let mut out: Vec<&str> = Vec::new();
    for _ in common..base_segments.len() {
        out.push("..");
    }
    out.extend(&abs_segments[common..]);
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_model_uri() {
        assert!(is_model_uri("models/chair.glb"));
        assert!(is_model_uri("models/chair.GLTF"));
        assert!(is_model_uri("/assets/rock.obj"));
        assert!(!is_model_uri("scenes/main.json"));
        assert!(!is_model_uri("scenes/noext"));
        assert!(!is_model_uri(".gitignore"));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("models/chair.glb"), "chair");
        assert_eq!(file_stem("chair"), "chair");
        assert_eq!(file_stem("a/b/scene.test.json"), "scene.test");
    }

    #[test]
    fn test_resolve_sibling() {
        assert_eq!(resolve("scenes/main.json", "base.json"), "scenes/base.json");
    }

    #[test]
    fn test_resolve_updirs() {
        assert_eq!(
            resolve("scenes/office/main.json", "../shared/base.json"),
            "scenes/shared/base.json"
        );
        assert_eq!(resolve("main.json", "../up.json"), "../up.json");
    }

    #[test]
    fn test_resolve_dot_segments() {
        assert_eq!(
            resolve("scenes/main.json", "./props/lamp.json"),
            "scenes/props/lamp.json"
        );
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        assert_eq!(resolve("scenes/main.json", "/abs/base.json"), "/abs/base.json");
        assert_eq!(
            resolve("scenes/main.json", "https://cdn.example.com/base.json"),
            "https://cdn.example.com/base.json"
        );
    }

    #[test]
    fn test_resolve_rooted_base() {
        assert_eq!(
            resolve("/project/scenes/main.json", "base.json"),
            "/project/scenes/base.json"
        );
        assert_eq!(
            resolve("/project/scenes/main.json", "../base.json"),
            "/project/base.json"
        );
    }

    #[test]
    fn test_resolve_url_base() {
        assert_eq!(
            resolve("https://cdn.example.com/scenes/main.json", "props/lamp.json"),
            "https://cdn.example.com/scenes/props/lamp.json"
        );
        // ".." never climbs past the host
        assert_eq!(
            resolve("https://cdn.example.com/main.json", "../../lamp.json"),
            "https://cdn.example.com/lamp.json"
        );
    }

    #[test]
    fn test_relativize_sibling() {
        assert_eq!(relativize("scenes/main.json", "scenes/base.json"), "base.json");
    }

    #[test]
    fn test_relativize_updirs() {
        assert_eq!(
            relativize("scenes/office/main.json", "scenes/shared/base.json"),
            "../shared/base.json"
        );
    }

    #[test]
    fn test_relativize_url() {
        assert_eq!(
            relativize(
                "https://cdn.example.com/scenes/main.json",
                "https://cdn.example.com/scenes/props/lamp.json"
            ),
            "props/lamp.json"
        );
        // different host: keep the absolute form
        assert_eq!(
            relativize(
                "https://cdn.example.com/scenes/main.json",
                "https://other.example.com/base.json"
            ),
            "https://other.example.com/base.json"
        );
    }

    #[test]
    fn test_relativize_mixed_roots_falls_back() {
        assert_eq!(relativize("scenes/main.json", "/abs/base.json"), "/abs/base.json");
        assert_eq!(
            relativize("scenes/main.json", "https://cdn.example.com/base.json"),
            "https://cdn.example.com/base.json"
        );
    }

    #[test]
    fn test_resolve_relativize_roundtrip() {
        let base = "/project/scenes/office/main.json";
        for reference in ["lamp.json", "../shared/base.json", "props/desk/top.json"] {
            let absolute = resolve(base, reference);
            assert_eq!(relativize(base, &absolute), reference);
        }
    }
}
