use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, warn};

pub const INCOGNITO_KEY: &str = "mt_incognito_mode";
pub const HUNTS_KEY: &str = "mt_hunts";
pub const SEASON_KEY: &str = "mt_season";

/// Key-value store keeping each value as JSON text in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Reads `key`, returning `None` when it is missing or does not parse.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, "failed to parse stored value, using default: {err}");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                error!(key, "failed to read stored value: {err}");
                None
            }
        }
    }

    pub async fn load_or<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        self.load(key).await.unwrap_or(fallback)
    }

    /// Writes `value` under `key`. Failures are logged and otherwise ignored.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_vec_pretty(value) {
            Ok(payload) => payload,
            Err(err) => {
                error!(key, "failed to serialize value: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(self.path_for(key), payload).await {
            error!(key, "failed to write stored value: {err}");
        }
    }
}
