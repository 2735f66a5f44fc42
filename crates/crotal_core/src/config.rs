//! Client configuration, stored as TOML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use crate::overlay::{OverlayStyle, parse_hex_color};
use crate::poll::PollPolicy;

/// Environment variable overriding [`ServerConfig::base_url`].
pub const SERVER_ENV: &str = "CROTALPATH_SERVER";

pub const INTERVAL_MS_RANGE: RangeInclusive<u64> = 100..=10_000;
pub const TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 5..=3600;
pub const MAX_FAILURES_RANGE: RangeInclusive<u32> = 1..=100;
pub const STROKE_WIDTH_RANGE: RangeInclusive<u32> = 1..=20;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub poll: PollConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root the `tasks` endpoint and relative locations are resolved against.
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    /// Give up when no completed result arrives within this time.
    pub timeout_secs: u64,
    pub max_consecutive_failures: u32,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_secs: 120,
            max_consecutive_failures: 5,
            backoff_initial_ms: 500,
            backoff_max_ms: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub stroke_width: u32,
    pub color: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            stroke_width: 5,
            color: "#1c7fff".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("cannot write config {}", path.display()))
    }

    /// Apply `CROTALPATH_SERVER` when set. The result is not validated.
    pub fn with_env_overrides(self) -> Self {
        let url = std::env::var(SERVER_ENV).ok();
        self.with_server_override(url.as_deref())
    }

    pub fn with_server_override(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url
            && !url.trim().is_empty()
        {
            self.server.base_url = url.trim().to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.server.base_url)
            .with_context(|| format!("invalid server url {:?}", self.server.base_url))?;
        parse_hex_color(&self.overlay.color)?;
        check_range("poll.interval_ms", self.poll.interval_ms, &INTERVAL_MS_RANGE)?;
        check_range("poll.timeout_secs", self.poll.timeout_secs, &TIMEOUT_SECS_RANGE)?;
        check_range(
            "poll.max_consecutive_failures",
            self.poll.max_consecutive_failures,
            &MAX_FAILURES_RANGE,
        )?;
        check_range("overlay.stroke_width", self.overlay.stroke_width, &STROKE_WIDTH_RANGE)?;
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll.interval_ms),
            timeout: Duration::from_secs(self.poll.timeout_secs),
            max_consecutive_failures: self.poll.max_consecutive_failures,
            backoff_initial: Duration::from_millis(self.poll.backoff_initial_ms),
            backoff_max: Duration::from_millis(self.poll.backoff_max_ms),
        }
    }

    pub fn overlay_style(&self) -> Result<OverlayStyle> {
        Ok(OverlayStyle {
            stroke_width: self.overlay.stroke_width,
            color: parse_hex_color(&self.overlay.color)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }
}

fn check_range<T>(name: &str, value: T, range: &RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if !range.contains(&value) {
        anyhow::bail!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        );
    }
    Ok(())
}
