use std::{
    env,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::errors::{
        DokkaiError,
        Result,
    },
    flows::review::Orientation,
    persistence::{
        get_data_file_path,
        load_json_or_default,
        load_json_or_default_at,
        save_json,
        save_json_at,
    },
};

pub const GATEWAY_FILE: &str = "gateway.json";
pub const PREFERENCES_FILE: &str = "preferences.json";

pub const ENV_URL: &str = "DOKKAI_GATEWAY_URL";
pub const ENV_API_KEY: &str = "DOKKAI_API_KEY";
pub const ENV_TIMEOUT: &str = "DOKKAI_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { url: String::new(), api_key: String::new(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

impl GatewayConfig {
    /// Reads `gateway.json` from the app data dir, then applies env overrides.
    pub fn load() -> Result<Self> {
        let mut config: GatewayConfig = load_json_or_default(GATEWAY_FILE);
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        save_json(self, GATEWAY_FILE)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_URL) {
            self.url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| DokkaiError::Config(format!("{ENV_TIMEOUT} must be whole seconds")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(DokkaiError::Config(format!("gateway url is not set ({ENV_URL})")));
        }
        if self.api_key.trim().is_empty() {
            return Err(DokkaiError::Config(format!("api key is not set ({ENV_API_KEY})")));
        }
        if self.timeout_secs == 0 {
            return Err(DokkaiError::Config("timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}

/// Local, per-user preferences that never touch the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub flashcard_orientation: Orientation,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl Preferences {
    pub fn load() -> Self {
        load_json_or_default(PREFERENCES_FILE)
    }

    pub fn load_at(path: &Path) -> Self {
        load_json_or_default_at(path)
    }

    pub fn save(&self) -> Result<()> {
        save_json(self, PREFERENCES_FILE)
    }

    pub fn save_at(&self, path: &Path) -> Result<()> {
        save_json_at(self, path)
    }

    /// `preferences.json` in the app data dir.
    pub fn default_path() -> PathBuf {
        get_data_file_path(PREFERENCES_FILE)
    }

    /// Where CSV exports go: the configured dir, else Downloads, else the app data dir.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(crate::persistence::get_app_data_dir)
    }
}
