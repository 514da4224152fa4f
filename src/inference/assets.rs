//! Resolution of server-relative asset paths

/// Joins `heatmap_url`/`original_url` paths to the service base URL
#[derive(Debug, Clone)]
pub struct AssetUrls {
    base_url: String,
}

impl AssetUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for a server-relative path. Absolute inputs pass through.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Absolute URL with a cache-busting `t` parameter, for redisplaying an asset
    pub fn resolve_fresh(&self, path: &str, now_millis: i64) -> String {
        let url = self.resolve(path);
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}t={now_millis}")
    }
}
