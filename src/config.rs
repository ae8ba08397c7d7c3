// Runtime configuration for the data layer.
// Resolves the backend origin and the local data directory.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Production backend origin.
pub const DEFAULT_SERVER_URL: &str = "https://phrzkdfnowea.sealoshzh.site";

/// Prefix of bundled assets that never live on the backend.
pub const STATIC_PREFIX: &str = "/static/";

/// Number of bundled default avatars (`default1.png` .. `default13.png`).
pub const AVATAR_POOL_SIZE: u32 = 13;

const SERVER_URL_ENV: &str = "CAMPUS_QA_SERVER_URL";
const DATA_DIR_ENV: &str = "CAMPUS_QA_DATA_DIR";

/// Data layer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin used to absolutize relative resource paths (no trailing slash).
    pub server_url: String,
    /// Prefix every gateway path is appended to.
    pub api_base: String,
    /// Paths starting with this prefix are local bundled assets.
    pub static_prefix: String,
    /// Size of the default avatar pool.
    pub avatar_pool_size: u32,
    /// Directory holding the default avatar images.
    pub avatar_dir: String,
    /// Directory for persisted key-value data.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_server_url(DEFAULT_SERVER_URL)
    }
}

impl Config {
    /// Build a config for the given backend origin.
    pub fn with_server_url(server_url: &str) -> Self {
        let server_url = server_url.trim_end_matches('/').to_string();
        Self {
            api_base: format!("{}/api", server_url),
            server_url,
            static_prefix: STATIC_PREFIX.to_string(),
            avatar_pool_size: AVATAR_POOL_SIZE,
            avatar_dir: "/static/avatar".to_string(),
            data_dir: default_data_dir(),
        }
    }

    /// Read overrides from `CAMPUS_QA_SERVER_URL` and `CAMPUS_QA_DATA_DIR`.
    pub fn from_env() -> Self {
        let mut config = match std::env::var(SERVER_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::with_server_url(url.trim()),
            _ => Self::default(),
        };
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    /// Path of the persisted key-value document.
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("storage.json"))
    }
}

/// Platform data directory (~/.local/share/campus-qa on Linux).
fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "campus-qa").map(|dirs| dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_server_url_trims_slash() {
        let config = Config::with_server_url("http://localhost:3000/");
        assert_eq!(config.server_url, "http://localhost:3000");
        assert_eq!(config.api_base, "http://localhost:3000/api");
        assert_eq!(config.static_prefix, "/static/");
        assert_eq!(config.avatar_pool_size, 13);
    }

    #[test]
    fn test_storage_path() {
        let mut config = Config::default();
        config.data_dir = Some(PathBuf::from("/tmp/qa"));
        assert_eq!(config.storage_path(), Some(PathBuf::from("/tmp/qa/storage.json")));

        config.data_dir = None;
        assert!(config.storage_path().is_none());
    }
}
