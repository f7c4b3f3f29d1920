use super::OwnerAffiliation;
use crate::{Error, Result};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "contrib-metrics.toml";

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// GraphQL endpoint to query
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,

    /// Command (program followed by arguments) printing a token on stdout
    #[serde(default = "default_token_helper")]
    pub token_helper: Vec<String>,

    /// How long to wait for the token helper before giving up
    #[serde(default = "default_token_helper_timeout_secs")]
    pub token_helper_timeout_secs: u64,

    /// Directory receiving the report files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of items requested per GraphQL page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Number of retries after a rate limit or transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Longest rate-limit wait honored before giving up
    #[serde(default = "default_max_rate_limit_wait_secs")]
    pub max_rate_limit_wait_secs: u64,

    /// Timeout for a single HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of repositories scanned concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Which of the viewer's own repositories to discover
    #[serde(default = "default_owner_affiliations")]
    pub owner_affiliations: Vec<OwnerAffiliation>,

    /// Whether to also discover repositories the viewer has contributed to
    #[serde(default = "default_include_contributed")]
    pub include_contributed: bool,
}

fn default_endpoint() -> Url {
    Url::parse("https://api.github.com/graphql").expect("default endpoint should be a valid URL")
}

fn default_token_helper() -> Vec<String> {
    vec!["gh".to_string(), "auth".to_string(), "token".to_string()]
}

const fn default_token_helper_timeout_secs() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

const fn default_page_size() -> u32 {
    50
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_retry_base_delay_ms() -> u64 {
    1000
}

const fn default_max_rate_limit_wait_secs() -> u64 {
    900
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_concurrency() -> usize {
    4
}

fn default_owner_affiliations() -> Vec<OwnerAffiliation> {
    vec![OwnerAffiliation::Owner, OwnerAffiliation::Collaborator, OwnerAffiliation::OrganizationMember]
}

const fn default_include_contributed() -> bool {
    true
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// An explicit path must exist. Otherwise `contrib-metrics.toml` in `dir` is used when present.
    pub fn load(dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path)
                .map_err(|e| Error::Input(format!("reading configuration file '{}': {e}", path.display())))?;
            (path.to_path_buf(), text)
        } else {
            let path = dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("No {CONFIG_FILE_NAME} in '{}', using default configuration", dir.display());
                    return Ok(Self::default());
                }
                Err(e) => return Err(Error::Input(format!("reading configuration file '{}': {e}", path.display()))),
            }
        };

        let config: Self =
            toml::from_str(&text).map_err(|e| Error::Input(format!("parsing configuration file '{}': {e}", final_path.display())))?;
        config.validate()?;

        log::debug!("Loaded configuration from '{}'", final_path.display());
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.endpoint.scheme(), "http" | "https") {
            return Err(Error::Input(format!("endpoint must be an http(s) URL, got '{}'", self.endpoint)));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(Error::Input(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }

        if self.concurrency == 0 {
            return Err(Error::Input("concurrency must be at least 1".to_string()));
        }

        if self.owner_affiliations.is_empty() {
            return Err(Error::Input("owner_affiliations must name at least one affiliation".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::Input("request_timeout_secs must be at least 1".to_string()));
        }

        Ok(())
    }

    #[must_use]
    pub const fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    #[must_use]
    pub const fn max_rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.max_rate_limit_wait_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn token_helper_timeout(&self) -> Duration {
        Duration::from_secs(self.token_helper_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
impl Config {
    /// Configuration pointing at a mock GraphQL server with near-instant retries.
    pub(crate) fn for_mock_server(server_uri: &str) -> Self {
        Self {
            endpoint: Url::parse(&format!("{server_uri}/graphql")).unwrap(),
            retry_base_delay_ms: 1,
            max_retries: 2,
            request_timeout_secs: 5,
            ..Self::default()
        }
    }
}
