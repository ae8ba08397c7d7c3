// Resource path resolution.

/// Turns backend-relative resource paths into absolute URLs.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    origin: String,
    static_prefix: String,
}

impl UrlResolver {
    pub fn new(origin: &str, static_prefix: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            static_prefix: static_prefix.to_string(),
        }
    }

    /// Resolve `path` against the server origin.
    ///
    /// Absolute URLs and bundled asset paths are returned unchanged, everything
    /// else gets the origin prepended with exactly one separating slash.
    /// Resolving an already resolved path is a no-op.
    pub fn resolve(&self, path: &str) -> String {
        if path.is_empty() || has_scheme(path) || self.is_local_asset(path) {
            return path.to_string();
        }
        format!("{}/{}", self.origin, path.trim_start_matches('/'))
    }

    /// Whether `path` points at a bundled asset.
    pub fn is_local_asset(&self, path: &str) -> bool {
        path.starts_with(&self.static_prefix)
    }
}

/// Check for a `scheme://` prefix.
fn has_scheme(path: &str) -> bool {
    match path.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
