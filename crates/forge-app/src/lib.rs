use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use url::Url;

const APP_QUALIFIER: &str = "studio";
const APP_ORGANIZATION: &str = "forge";
const APP_NAME: &str = "forge";
const DATABASE_FILENAME: &str = "forge.sqlite3";
const LOG_FILENAME: &str = "forge.log";
const ARTIFACT_DIRNAME: &str = "transient";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
pub const DEFAULT_CALLBACK_URL: &str = "http://127.0.0.1:5173/";
pub const DEFAULT_VIDEO_POLL_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not resolve user data directory")]
    MissingUserDataDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// App-local user data directory (for durable application state).
pub fn user_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
        .ok_or(Error::MissingUserDataDir)?;
    Ok(dirs.data_local_dir().to_path_buf())
}

pub fn ensure_user_data_dir() -> Result<PathBuf> {
    let dir = user_data_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn database_path() -> Result<PathBuf> {
    Ok(ensure_user_data_dir()?.join(DATABASE_FILENAME))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(ensure_user_data_dir()?.join(LOG_FILENAME))
}

/// Scratch directory for downloaded videos. Emptied at startup.
pub fn artifact_dir() -> Result<PathBuf> {
    let dir = ensure_user_data_dir()?.join(ARTIFACT_DIRNAME);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Runtime settings, read from the process environment (after `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the backend proxy, e.g. `http://localhost:3001`.
    pub backend_url: String,
    /// Where the proxy sends the browser after Google sign-in. A local
    /// listener on this address captures the redirect.
    pub callback_url: Url,
    pub video_poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let setting = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let backend_url = setting("FORGE_BACKEND_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&backend_url).map_err(|_| Error::InvalidSetting {
            name: "FORGE_BACKEND_URL",
            value: backend_url.clone(),
        })?;

        let callback = setting("FORGE_CALLBACK_URL").unwrap_or_else(|| DEFAULT_CALLBACK_URL.into());
        let callback_url = Url::parse(&callback).map_err(|_| Error::InvalidSetting {
            name: "FORGE_CALLBACK_URL",
            value: callback,
        })?;

        let video_poll_interval = match setting("FORGE_VIDEO_POLL_SECS") {
            None => Duration::from_secs(DEFAULT_VIDEO_POLL_SECS),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::InvalidSetting {
                        name: "FORGE_VIDEO_POLL_SECS",
                        value,
                    });
                }
            },
        };

        Ok(Self {
            backend_url,
            callback_url,
            video_poll_interval,
        })
    }
}
