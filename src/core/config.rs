use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const BASE_URL_ENV: &str = "CHATTERM_BASE_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address of the chat service, without the `/api` suffix
    pub base_url: Option<String>,
    /// Model picked at start-up when the server offers it
    pub default_model: Option<String>,
    /// Upper bound on any single request to the service
    pub request_timeout_secs: Option<u64>,
    /// Keep the session cookie in the system keyring between runs
    pub use_keyring: Option<bool>,
}

/// Keys accepted by `chatterm set` / `chatterm unset`.
pub const CONFIG_KEYS: [&str; 4] = [
    "base-url",
    "default-model",
    "request-timeout",
    "use-keyring",
];

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        Self::load_from_path(&Self::config_path()?)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(&Self::config_path()?)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let proj_dirs = ProjectDirs::from("org", "chatterm", "chatterm")
            .ok_or("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Resolution order: explicit flag, environment, file, built-in default.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> String {
        let env = std::env::var(BASE_URL_ENV).ok();
        Self::pick_base_url(flag, env.as_deref(), self.base_url.as_deref())
    }

    fn pick_base_url(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
        [flag, env, file]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn keyring_enabled(&self) -> bool {
        self.use_keyring.unwrap_or(true)
    }

    /// Applies `chatterm set <key> <value>`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for '{key}'"));
        }
        match key {
            "base-url" => self.base_url = Some(value.to_string()),
            "default-model" => self.default_model = Some(value.to_string()),
            "request-timeout" => {
                let secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| format!("'{value}' is not a positive number of seconds"))?;
                self.request_timeout_secs = Some(secs);
            }
            "use-keyring" => self.use_keyring = Some(parse_bool(value)?),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// Applies `chatterm unset <key>`.
    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "base-url" => self.base_url = None,
            "default-model" => self.default_model = None,
            "request-timeout" => self.request_timeout_secs = None,
            "use-keyring" => self.use_keyring = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.base_url {
            Some(url) => println!("  base-url: {url}"),
            None => println!("  base-url: (unset, {DEFAULT_BASE_URL})"),
        }
        match &self.default_model {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (unset, first offered)"),
        }
        println!("  request-timeout: {}s", self.request_timeout().as_secs());
        match self.keyring_enabled() {
            true => println!("  use-keyring: on"),
            false => println!("  use-keyring: off"),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("'{value}' is not on/off")),
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key} (expected one of: {})",
        CONFIG_KEYS.join(", ")
    )
}
