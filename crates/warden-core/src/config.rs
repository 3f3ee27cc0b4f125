//! Store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use warden_session::SESSION_KEY;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database under the data directory
    Sqlite,
    /// One file per key under the data directory
    File,
    /// Nothing survives the process
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::File => "file",
            StorageBackend::Memory => "memory",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(CoreError::Config(format!("Unknown storage backend: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding persisted state
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    /// Key the session is persisted under
    pub session_key: String,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            backend: StorageBackend::Sqlite,
            session_key: SESSION_KEY.to_string(),
        }
    }

    /// Defaults overridden by `WARDEN_DATA_DIR`, `WARDEN_STORAGE` and
    /// `WARDEN_SESSION_KEY`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("WARDEN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(backend) = std::env::var("WARDEN_STORAGE") {
            config.backend = backend.parse()?;
        }
        if let Ok(key) = std::env::var("WARDEN_SESSION_KEY") {
            if key.trim().is_empty() {
                return Err(CoreError::Config("WARDEN_SESSION_KEY is empty".to_string()));
            }
            config.session_key = key;
        }

        Ok(config)
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("warden"))
            .unwrap_or_else(|| PathBuf::from(".warden"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("warden.db")
    }

    pub fn session_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = Config::new(PathBuf::from("/tmp/warden-test"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/warden-test/warden.db"));
        assert_eq!(config.session_dir(), PathBuf::from("/tmp/warden-test/sessions"));
        assert_eq!(config.session_key, "user_session");
        assert_eq!(config.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("SQLite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!(matches!(
            "redis".parse::<StorageBackend>(),
            Err(CoreError::Config(_))
        ));
    }

    // Touches the process environment, so every case lives in this one test
    #[test]
    fn test_from_env_overrides() {
        const VARS: [&str; 3] = ["WARDEN_DATA_DIR", "WARDEN_STORAGE", "WARDEN_SESSION_KEY"];
        let clear = || {
            for var in VARS {
                std::env::remove_var(var);
            }
        };

        clear();
        let config = Config::from_env().unwrap();
        assert_eq!(config.data_dir, Config::data_dir());
        assert_eq!(config.backend, StorageBackend::Sqlite);
        assert_eq!(config.session_key, SESSION_KEY);

        std::env::set_var("WARDEN_DATA_DIR", "/srv/warden");
        std::env::set_var("WARDEN_STORAGE", "file");
        std::env::set_var("WARDEN_SESSION_KEY", "device_session");
        let config = Config::from_env().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/warden"));
        assert_eq!(config.backend, StorageBackend::File);
        assert_eq!(config.session_key, "device_session");

        std::env::set_var("WARDEN_STORAGE", "redis");
        assert!(matches!(Config::from_env(), Err(CoreError::Config(_))));

        std::env::set_var("WARDEN_STORAGE", "memory");
        std::env::set_var("WARDEN_SESSION_KEY", "  ");
        assert!(matches!(Config::from_env(), Err(CoreError::Config(_))));

        clear();
    }

    #[test]
    fn test_config_serde_layout() {
        let config: Config = serde_json::from_str(
            r#"{"data_dir": "/var/lib/warden", "backend": "file", "session_key": "sess"}"#,
        )
        .unwrap();
        assert_eq!(config.backend, StorageBackend::File);
        assert_eq!(config.session_key, "sess");
    }
}
