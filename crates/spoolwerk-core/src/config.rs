// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gateway configuration.  Built once at startup and passed by reference to
// the adapter factory, the printer directory, and the dispatcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SpoolwerkError};

/// Prefix for environment overrides (`SPOOLWERK_HOST`, ...).
pub const ENV_PREFIX: &str = "SPOOLWERK_";

/// Which adapter variant talks to the print fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// smbclient share listing and submission (transfer-only).
    Smb,
    /// IPP / CUPS (transfer-only).
    Ipp,
    /// LPR/LPD, RFC 1179 (transfer-only).
    Lpd,
    /// rpcclient management plus smbclient submission (full management).
    Rpc,
    /// Canned data for tests and demos.
    Mock,
}

impl TransportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "smb" | "smbclient" => Some(Self::Smb),
            "ipp" | "cups" => Some(Self::Ipp),
            "lpd" | "lpr" => Some(Self::Lpd),
            "rpc" | "rpcclient" => Some(Self::Rpc),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    fn needs_host(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

/// Where the printer list cache entry is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map; lost on restart.
    Memory,
    /// SQLite key-value table at `path`.
    Sqlite { path: PathBuf },
}

/// Identity & cache layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Storage key holding the serialized `CacheEntry`.
    pub key: String,
    /// Age after which cached data is still served but refreshed in the
    /// background.
    pub staleness_threshold_secs: u64,
    /// Lifetime of the stored entry.  Must outlive several staleness windows.
    pub storage_ttl_secs: u64,
    pub backend: CacheBackend,
}

impl CacheConfig {
    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_secs)
    }

    pub fn storage_ttl(&self) -> Duration {
        Duration::from_secs(self.storage_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: "printers:list".into(),
            staleness_threshold_secs: 5 * 60,
            storage_ttl_secs: 24 * 60 * 60,
            backend: CacheBackend::Memory,
        }
    }
}

/// Top-level gateway settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub transport: TransportKind,
    /// Print server host (SMB server, CUPS host, or LPD host).
    pub host: String,
    pub user: String,
    pub password: String,
    pub domain: Option<String>,
    /// smbclient protocol dialect (`-m`), e.g. `SMB3`.
    pub dialect: Option<String>,
    pub ipp_port: u16,
    pub lpd_port: u16,
    /// LPD has no discovery primitive; these queues are reported as printers.
    pub lpd_queues: Vec<String>,
    /// Directory for scoped temporary payload files.
    pub spool_dir: PathBuf,
    /// Kill subprocesses that run longer than this.  `None` waits forever.
    pub command_timeout_secs: Option<u64>,
    pub cache: CacheConfig,
    /// Short-circuit dispatch without touching hardware.
    pub simulate_print: bool,
    pub simulate_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Rpc,
            host: String::new(),
            user: String::new(),
            password: String::new(),
            domain: None,
            dialect: None,
            ipp_port: 631,
            lpd_port: 515,
            lpd_queues: vec!["lp".into()],
            spool_dir: PathBuf::from("/tmp/prints"),
            command_timeout_secs: None,
            cache: CacheConfig::default(),
            simulate_print: false,
            simulate_delay_ms: 1500,
        }
    }
}

// The password must never reach the logs.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("transport", &self.transport)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .field("dialect", &self.dialect)
            .field("ipp_port", &self.ipp_port)
            .field("lpd_port", &self.lpd_port)
            .field("lpd_queues", &self.lpd_queues)
            .field("spool_dir", &self.spool_dir)
            .field("command_timeout_secs", &self.command_timeout_secs)
            .field("cache", &self.cache)
            .field("simulate_print", &self.simulate_print)
            .field("simulate_delay_ms", &self.simulate_delay_ms)
            .finish()
    }
}

impl GatewayConfig {
    /// Load settings from a JSON file (or defaults when `path` is `None`),
    /// then apply `SPOOLWERK_*` environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// `load`, with environment lookups going through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let data = std::fs::read_to_string(path)?;
                info!(path = %path.display(), "loaded gateway config");
                serde_json::from_str(&data)?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides looked up by full variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("TRANSPORT") {
            self.transport = TransportKind::parse(&value).ok_or_else(|| {
                SpoolwerkError::Validation(format!("unknown transport '{value}'"))
            })?;
        }
        if let Some(value) = var("HOST") {
            self.host = value;
        }
        if let Some(value) = var("USER") {
            self.user = value;
        }
        if let Some(value) = var("PASSWORD") {
            self.password = value;
        }
        if let Some(value) = var("DOMAIN") {
            self.domain = Some(value).filter(|d| !d.is_empty());
        }
        if let Some(value) = var("DIALECT") {
            self.dialect = Some(value).filter(|d| !d.is_empty());
        }
        if let Some(value) = var("LPD_QUEUES") {
            self.lpd_queues = value
                .split(',')
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = var("SPOOL_DIR") {
            self.spool_dir = PathBuf::from(value);
        }
        if let Some(value) = var("COMMAND_TIMEOUT_SECS") {
            self.command_timeout_secs = Some(parse_number("COMMAND_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = var("CACHE_STALENESS_SECS") {
            self.cache.staleness_threshold_secs = parse_number("CACHE_STALENESS_SECS", &value)?;
        }
        if let Some(value) = var("CACHE_TTL_SECS") {
            self.cache.storage_ttl_secs = parse_number("CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = var("CACHE_SQLITE_PATH") {
            self.cache.backend = CacheBackend::Sqlite {
                path: PathBuf::from(value),
            };
        }
        if let Some(value) = var("SIMULATE_PRINT") {
            self.simulate_print = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(value) = var("SIMULATE_DELAY_MS") {
            self.simulate_delay_ms = parse_number("SIMULATE_DELAY_MS", &value)?;
        }

        debug!(transport = ?self.transport, host = %self.host, "config overrides applied");
        Ok(())
    }

    /// Reject settings no adapter could run with.
    pub fn validate(&self) -> Result<()> {
        if self.transport.needs_host() && self.host.trim().is_empty() {
            return Err(SpoolwerkError::Validation(format!(
                "{ENV_PREFIX}HOST is required for the {:?} transport",
                self.transport
            )));
        }
        if self.transport == TransportKind::Lpd && self.lpd_queues.is_empty() {
            return Err(SpoolwerkError::Validation(
                "at least one LPD queue must be configured".into(),
            ));
        }
        if self.cache.storage_ttl_secs < self.cache.staleness_threshold_secs {
            return Err(SpoolwerkError::Validation(
                "cache storage TTL must not be shorter than the staleness threshold".into(),
            ));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn simulate_delay(&self) -> Duration {
        Duration::from_millis(self.simulate_delay_ms)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SpoolwerkError::Validation(format!("{ENV_PREFIX}{name} must be a number, got '{value}'"))
    })
}
