use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BACKEND_URL not set")]
    MissingBackendUrl,
}

/// Process-wide configuration, read once at startup and injected into the
/// components that need it. Holds the normalized base URL of the content
/// backend (no trailing slash).
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    backend_base: String,
}

impl ProxyConfig {
    pub fn new(backend_base: impl Into<String>) -> Self {
        let base = backend_base.into();
        Self {
            backend_base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Missing or blank BACKEND_URL is a fatal startup error, not deferred
    /// to the first proxied call.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("BACKEND_URL") {
            Ok(url) if !url.trim().is_empty() => Ok(Self::new(url)),
            _ => Err(ConfigError::MissingBackendUrl),
        }
    }

    pub fn backend_base(&self) -> &str {
        &self.backend_base
    }

    /// Join an upstream path onto the backend base. Already-absolute URLs
    /// pass through untouched.
    pub fn backend_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.backend_base, path)
        }
    }

    /// Turn a storage-relative path from an API payload into a URL the
    /// browser can load. Anything that is not an `uploads/` path is assumed
    /// to be absolute already and returned as-is.
    pub fn absolute_upload_url(&self, path: &str) -> String {
        if path.starts_with("uploads/") {
            format!("{}/{}", self.backend_base, path)
        } else if path.starts_with("/uploads/") {
            format!("{}{}", self.backend_base, path)
        } else {
            path.to_string()
        }
    }
}
