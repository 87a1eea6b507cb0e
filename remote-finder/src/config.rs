use crate::error::{FinderError, Result};
use crate::RemoteHost;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;

pub const CONFIG_ENV: &str = "REMOTE_FINDER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "remote-finder.yaml";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FinderConfig {
    #[serde(default)]
    pub remote: RemoteConf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RemoteConf {
    #[serde(default)]
    pub remotes: Vec<RemoteHost>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    3
}

impl Default for RemoteConf {
    fn default() -> Self {
        Self {
            remotes: Vec::new(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl RemoteConf {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl FinderConfig {
    /// Strict parsing, for callers that want to fail on a bad file
    pub fn from_yaml_str(txt: &str) -> Result<Self> {
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: FinderConfig =
            serde_yaml::from_str(txt).map_err(|e| FinderError::Config(e.to_string()))?;
        if cfg.remote.timeout_secs == 0 {
            return Err(FinderError::Config("remote.timeout_secs must be positive".into()));
        }
        if cfg.remote.connect_timeout_secs == 0 {
            return Err(FinderError::Config(
                "remote.connect_timeout_secs must be positive".into(),
            ));
        }
        Ok(cfg)
    }

    /// Config with an explicit host list and default timeouts
    pub fn with_remotes<I, H>(remotes: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<RemoteHost>,
    {
        Self {
            remote: RemoteConf {
                remotes: remotes.into_iter().map(Into::into).collect(),
                ..RemoteConf::default()
            },
        }
    }
}

/// Path from `REMOTE_FINDER_CONFIG`, falling back to `remote-finder.yaml`
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into())
}

/// Lenient load: a missing, empty or invalid file yields the default config
pub async fn load_config() -> FinderConfig {
    load_config_from(config_path()).await
}

pub async fn load_config_from<P: AsRef<Path>>(path: P) -> FinderConfig {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "no config file, using defaults");
        return FinderConfig::default();
    }
    let txt = fs::read_to_string(path).await.unwrap_or_default();
    FinderConfig::from_yaml_str(&txt).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "invalid config, using defaults");
        FinderConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let cfg = FinderConfig::from_yaml_str(
            "remote:\n  remotes:\n    - http://a:8000\n    - http://b:8000\n  timeout_secs: 4\n",
        )
        .unwrap();
        assert_eq!(
            cfg.remote.remotes,
            vec![RemoteHost::new("http://a:8000"), RemoteHost::new("http://b:8000")]
        );
        assert_eq!(cfg.remote.timeout(), Duration::from_secs(4));
        assert_eq!(cfg.remote.connect_timeout_secs, 3);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(FinderConfig::from_yaml_str("  \n").unwrap(), FinderConfig::default());
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(matches!(
            FinderConfig::from_yaml_str("remote: [1, 2"),
            Err(FinderError::Config(_))
        ));
        assert!(matches!(
            FinderConfig::from_yaml_str("remote:\n  timeout_secs: 0\n"),
            Err(FinderError::Config(_))
        ));
    }

    #[test]
    fn test_zero_connect_timeout_is_error() {
        let err = FinderConfig::from_yaml_str("remote:\n  connect_timeout_secs: 0\n").unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs must be positive"));
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote-finder.yaml");
        std::fs::write(&path, "remote:\n  remotes: [\"http://c:8080\"]\n").unwrap();

        let cfg = load_config_from(&path).await;
        assert_eq!(cfg.remote.remotes, vec![RemoteHost::new("http://c:8080")]);
        assert_eq!(cfg.remote.timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_load_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_config_from(dir.path().join("nope.yaml")).await;
        assert_eq!(missing, FinderConfig::default());

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "remote: [").unwrap();
        assert_eq!(load_config_from(&broken).await, FinderConfig::default());
    }
}
