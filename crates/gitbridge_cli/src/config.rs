//! Configuration file support for the gitbridge CLI.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GITBRIDGE_`, e.g., `GITBRIDGE_GITHUB_TOKEN`)
//! 3. Config file (./gitbridge.toml, then ~/.config/gitbridge/config.toml)
//! 4. Library defaults
//!
//! Keys are single words so that every one of them can also be set from the
//! environment (`GITBRIDGE_CACHE_TTL` -> `cache.ttl`).
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use GITBRIDGE_GITHUB_TOKEN env var
//!
//! [gitlab]
//! url = "https://gitlab.example.com/api/v4"  # self-hosted instance
//! token = "glpat-..."  # or use GITBRIDGE_GITLAB_TOKEN env var
//!
//! [client]
//! timeout = 30   # seconds
//! retries = 3
//! pacing = 10    # requests per second, unset to disable
//!
//! [cache]
//! enabled = true
//! ttl = 300      # seconds
//! size = 1000
//!
//! [limiter]
//! enabled = true
//! limit = 5000
//! window = 60    # seconds
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use gitbridge::{ClientConfig, Platform};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: PlatformConfig,
    pub gitlab: PlatformConfig,
    /// Transport settings shared by both platforms.
    pub client: ClientSettings,
    pub cache: CacheSettings,
    pub limiter: LimiterSettings,
}

/// Per-platform credentials and endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// API token.
    /// Can also be set via GITBRIDGE_GITHUB_TOKEN / GITBRIDGE_GITLAB_TOKEN.
    pub token: Option<String>,
    /// API base URL, for GitHub Enterprise or self-hosted GitLab.
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Request timeout in seconds.
    pub timeout: Option<u64>,
    /// Retries after the first attempt.
    pub retries: Option<usize>,
    /// Requests per second allowed by the local pacer.
    pub pacing: Option<u32>,
    /// User-Agent header override.
    pub agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: Option<bool>,
    /// Default time-to-live in seconds.
    pub ttl: Option<u64>,
    /// Maximum number of entries.
    pub size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LimiterSettings {
    pub enabled: Option<bool>,
    /// Requests allowed per window.
    pub limit: Option<usize>,
    /// Window length in seconds.
    pub window: Option<u64>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. XDG config file (~/.config/gitbridge/config.toml)
    /// 2. Local config file (./gitbridge.toml)
    /// 3. Environment variables with GITBRIDGE_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("gitbridge.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gitbridge.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., GITBRIDGE_GITHUB_TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("GITBRIDGE")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gitbridge").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn platform(&self, platform: Platform) -> &PlatformConfig {
        match platform {
            Platform::GitHub => &self.github,
            Platform::GitLab => &self.gitlab,
        }
    }

    /// Build the library configuration for `platform`.
    ///
    /// Unset keys keep the library defaults for that platform. A missing
    /// token is reported here; token format is checked by the client.
    pub fn client_config(&self, platform: Platform) -> Result<ClientConfig, String> {
        let section = self.platform(platform);
        let token = section.token.clone().filter(|t| !t.is_empty()).ok_or_else(|| {
            format!(
                "No {platform} token configured. Set GITBRIDGE_{}_TOKEN or add \
                 `token` under [{platform}] in {}",
                platform.to_string().to_uppercase(),
                Self::default_config_path()
                    .map_or_else(|| "gitbridge.toml".to_string(), |p| p.display().to_string())
            )
        })?;

        let mut config = ClientConfig::new(platform, token);
        if let Some(url) = &section.url {
            config = config.with_base_url(url.trim_end_matches('/'));
        }
        if let Some(agent) = &self.client.agent {
            config = config.with_user_agent(agent);
        }
        if let Some(secs) = self.client.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = self.client.retries {
            config.retry.max_retries = retries;
        }
        if let Some(rps) = self.client.pacing {
            config = config.with_pacing(rps);
        }

        if let Some(enabled) = self.cache.enabled {
            config.cache.enabled = enabled;
        }
        if let Some(ttl) = self.cache.ttl {
            config.cache.ttl = Duration::from_secs(ttl);
        }
        if let Some(size) = self.cache.size {
            config.cache.max_size = size;
        }

        if let Some(enabled) = self.limiter.enabled {
            config.rate_limit.enabled = enabled;
        }
        if let Some(limit) = self.limiter.limit {
            config.rate_limit.limit = limit;
        }
        if let Some(window) = self.limiter.window {
            config.rate_limit.window = Duration::from_secs(window);
        }

        Ok(config)
    }
}
