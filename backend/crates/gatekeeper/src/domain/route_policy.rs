//! Route Classification
//!
//! Maps a request path onto the access policy the gatekeeper enforces.
//! Matching works on whole path segments: `/account` covers `/account` and
//! `/account/settings`, never `/accountant`.

use platform::config::normalize_path;

/// Access policy for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    Public,
    /// Requires a session
    Protected,
    /// Maintenance endpoint, hidden outside development
    Debug,
}

impl RoutePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutePolicy::Public => "public",
            RoutePolicy::Protected => "protected",
            RoutePolicy::Debug => "debug",
        }
    }
}

/// Static prefix lists the classifier is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    protected_prefixes: Vec<String>,
    debug_paths: Vec<String>,
}

impl RouteTable {
    pub fn new<P, D>(protected_prefixes: P, debug_paths: D) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            protected_prefixes: protected_prefixes
                .into_iter()
                .map(|p| normalize_path(p.as_ref()))
                .collect(),
            debug_paths: debug_paths
                .into_iter()
                .map(|p| normalize_path(p.as_ref()))
                .collect(),
        }
    }

    /// Classify a request path (without query string)
    ///
    /// Debug paths are checked first so a maintenance endpoint nested under a
    /// protected prefix is still hidden in production.
    pub fn classify(&self, path: &str) -> RoutePolicy {
        let path = canonical_path(path);

        if self.debug_paths.iter().any(|d| *d == path) {
            return RoutePolicy::Debug;
        }

        if self
            .protected_prefixes
            .iter()
            .any(|prefix| is_segment_prefix(prefix, &path))
        {
            return RoutePolicy::Protected;
        }

        RoutePolicy::Public
    }
}

/// Collapse repeated slashes and drop the trailing slash
fn canonical_path(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        collapsed.push('/');
    }
    let mut previous_slash = false;
    for ch in path.chars() {
        if ch == '/' && previous_slash {
            continue;
        }
        previous_slash = ch == '/';
        collapsed.push(ch);
    }
    normalize_path(&collapsed)
}

fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Accept a post-sign-in destination only if it stays on this site
///
/// Anything that is not a local absolute path (`//host`, `/\host`,
/// `https://...`, control characters) falls back to `/`.
pub fn sanitize_return_target(target: Option<&str>) -> String {
    match target {
        Some(t)
            if t.starts_with('/')
                && !t.starts_with("//")
                && !t.starts_with("/\\")
                && !t.chars().any(char::is_control) =>
        {
            t.to_string()
        }
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new(
            ["/account", "/api/admin", "/api/internal"],
            ["/api/debug", "/api/test-connection", "/api/seed"],
        )
    }

    #[test]
    fn test_protected_prefix_and_children() {
        let t = table();
        assert_eq!(t.classify("/account"), RoutePolicy::Protected);
        assert_eq!(t.classify("/account/"), RoutePolicy::Protected);
        assert_eq!(t.classify("/account/settings"), RoutePolicy::Protected);
        assert_eq!(t.classify("/api/admin/users/42"), RoutePolicy::Protected);
    }

    #[test]
    fn test_segment_boundary() {
        let t = table();
        assert_eq!(t.classify("/accountant"), RoutePolicy::Public);
        assert_eq!(t.classify("/accounts"), RoutePolicy::Public);
        assert_eq!(t.classify("/api/administrator"), RoutePolicy::Public);
    }

    #[test]
    fn test_debug_paths_exact() {
        let t = table();
        assert_eq!(t.classify("/api/debug"), RoutePolicy::Debug);
        assert_eq!(t.classify("/api/debug/"), RoutePolicy::Debug);
        assert_eq!(t.classify("/api/seed"), RoutePolicy::Debug);
        assert_eq!(t.classify("/api/debugger"), RoutePolicy::Public);
        assert_eq!(t.classify("/api/debug/extra"), RoutePolicy::Public);
    }

    #[test]
    fn test_repeated_slashes_do_not_escape() {
        let t = table();
        assert_eq!(t.classify("//account"), RoutePolicy::Protected);
        assert_eq!(t.classify("/account//orders"), RoutePolicy::Protected);
        assert_eq!(t.classify("/api//debug"), RoutePolicy::Debug);
    }

    #[test]
    fn test_debug_wins_over_protected() {
        let t = RouteTable::new(["/api"], ["/api/debug"]);
        assert_eq!(t.classify("/api/debug"), RoutePolicy::Debug);
        assert_eq!(t.classify("/api/other"), RoutePolicy::Protected);
    }

    #[test]
    fn test_public_default() {
        let t = table();
        for path in ["/", "/templates", "/templates/abc", "/sign-in", "/api/auth/csrf"] {
            assert_eq!(t.classify(path), RoutePolicy::Public, "{path}");
        }
    }

    #[test]
    fn test_sanitize_return_target() {
        assert_eq!(sanitize_return_target(Some("/account?tab=1")), "/account?tab=1");
        assert_eq!(sanitize_return_target(None), "/");
        assert_eq!(sanitize_return_target(Some("")), "/");
        assert_eq!(sanitize_return_target(Some("//evil.example")), "/");
        assert_eq!(sanitize_return_target(Some("/\\evil.example")), "/");
        assert_eq!(sanitize_return_target(Some("https://evil.example")), "/");
        assert_eq!(sanitize_return_target(Some("/a\r\nSet-Cookie: x=1")), "/");
    }
}
