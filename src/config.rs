use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const BASE_URL_VAR: &str = "REFERHUB_API_BASE_URL";
const TIMEOUT_VAR: &str = "REFERHUB_API_TIMEOUT_SECS";

/// Where the backend lives and how long a request may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            config.base_url = normalize_base_url(&url);
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "ignoring invalid {}", TIMEOUT_VAR),
            }
        }

        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for a path-relative endpoint.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Default location of the persisted session file.
pub fn default_session_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "referhub") {
        proj_dirs.data_dir().join("session.json")
    } else {
        PathBuf::from("referhub-session.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_env_overrides() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("REFERHUB_API_BASE_URL", "https://api.example.com/"),
            ("REFERHUB_API_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let config = ApiConfig::from_lookup(lookup_from(&[("REFERHUB_API_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_url_for_concatenates() {
        let config = ApiConfig::new("http://localhost:4000/");
        assert_eq!(config.url_for("/jobs"), "http://localhost:4000/jobs");
    }

    #[test]
    fn test_session_path_is_json_file() {
        let path = default_session_path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name == "session.json" || name == "referhub-session.json");
    }
}
