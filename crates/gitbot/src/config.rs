use anyhow::{anyhow, Result};
use directories::{BaseDirs, ProjectDirs};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use gitbot_core::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;
pub const MAX_SESSION_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;
const APP_NAME: &str = "gitbot";
const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = "gitbot.toml";
const CREDENTIALS_FILE: &str = "credentials.json";
const REDACTED: &str = "[REDACTED]";

/// Bot configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// GitHub REST API base URL
    pub api_url: String,
    /// Linked token store; defaults to the user data directory
    pub credentials_path: Option<PathBuf>,
    /// Secret the token encryption key is derived from
    pub token_key: Option<String>,
    /// Comments shown per page
    pub page_size: usize,
    /// Inactivity timeout of comment pagination sessions
    pub session_timeout_secs: u64,
    /// Log filter used when `GITBOT_LOG` is unset
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            credentials_path: None,
            token_key: None,
            page_size: DEFAULT_PAGE_SIZE,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            log_level: None,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let explicit_path = config_path.as_deref();
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
        }

        for path in config_paths(explicit_path) {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // GITBOT_USER and GITBOT_LOG belong to the command line, not the config
        figment = figment.merge(
            Env::prefixed("GITBOT_").ignore(&["user", "log"]),
        );

        figment
            .extract()
            .map_err(|e| anyhow!("Failed to load config: {}", e))
    }

    pub fn merge_with_cli(&mut self, cli_api_url: Option<String>) {
        if let Some(url) = cli_api_url {
            self.api_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow!(
                "api_url must be an http(s) URL, got '{}'. Set via --api-url, GITBOT_API_URL env var, or config file",
                self.api_url
            ));
        }
        if self.page_size == 0 {
            return Err(anyhow!("page_size must be at least 1"));
        }
        if self.session_timeout_secs == 0 {
            return Err(anyhow!("session_timeout_secs must be at least 1"));
        }
        if self.session_timeout_secs > MAX_SESSION_TIMEOUT_SECS {
            return Err(anyhow!(
                "session_timeout_secs must be at most {} (one week), got {}",
                MAX_SESSION_TIMEOUT_SECS,
                self.session_timeout_secs
            ));
        }
        Ok(())
    }

    /// Credential store location, falling back to the user data directory
    pub fn credentials_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.credentials_path {
            return Ok(path.clone());
        }
        ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.data_dir().join(CREDENTIALS_FILE))
            .ok_or_else(|| {
                anyhow!("Could not determine a data directory; set credentials_path in the config")
            })
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    /// Copy safe to print, with the token key hidden
    pub fn redacted(&self) -> Self {
        Self {
            token_key: self.token_key.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }
}

/// Config files consulted, in merge order
pub fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(path) = explicit {
        paths.push(path.to_path_buf());
        return paths;
    }

    if let Some(path) = get_project_config_path() {
        push_unique(&mut paths, path);
    }
    if let Some(path) = get_xdg_config_path() {
        push_unique(&mut paths, path);
    }
    if let Some(path) = get_local_config_path() {
        push_unique(&mut paths, path);
    }

    paths
}

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}

fn get_project_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|d| d.config_dir().join(CONFIG_FILE))
}

fn get_xdg_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join(APP_NAME).join(CONFIG_FILE));
    }

    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join(APP_NAME)
            .join(CONFIG_FILE)
    })
}

fn get_local_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(LOCAL_CONFIG_FILE))
}
