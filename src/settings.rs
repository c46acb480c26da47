use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::session_store::ExpiryPolicy;

pub const CONFIG_ENV: &str = "IVR_CONFIG";
const BIND_ADDR_ENV: &str = "IVR_BIND_ADDR";
const DATABASE_PATH_ENV: &str = "IVR_DATABASE_PATH";
const PUBLIC_BASE_URL_ENV: &str = "IVR_PUBLIC_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    pub sliding_ttl_secs: u64,
    pub absolute_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sliding_ttl_secs: 30 * 60,
            absolute_ttl_secs: 60 * 60,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceSettings {
    pub voice: String,
    pub language: String,
    pub gather_timeout_secs: u32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: "Polly.Joanna".into(),
            language: "en-US".into(),
            gather_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub bind_addr: String,
    pub database_path: PathBuf,
    /// Path the platform posts digits to.
    pub action_path: String,
    /// When set, action targets are absolute URLs under this base.
    pub public_base_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Upper bound on one audit write; must stay below the request timeout.
    pub audit_timeout_secs: u64,
    pub session: SessionSettings,
    pub voice: VoiceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            database_path: PathBuf::from("ivr.sqlite3"),
            action_path: "/api/ivr/menu".into(),
            public_base_url: None,
            request_timeout_secs: 10,
            audit_timeout_secs: 2,
            session: SessionSettings::default(),
            voice: VoiceSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults, then the file named by `IVR_CONFIG` if set, then
    /// individual environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(addr) = lookup(BIND_ADDR_ENV) {
            self.bind_addr = addr;
        }
        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(PUBLIC_BASE_URL_ENV) {
            self.public_base_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.action_path.starts_with('/') {
            bail!("actionPath must start with '/', got '{}'", self.action_path);
        }
        if self.request_timeout_secs == 0 {
            bail!("requestTimeoutSecs must be greater than zero");
        }
        if self.audit_timeout_secs == 0 || self.audit_timeout_secs >= self.request_timeout_secs {
            bail!(
                "auditTimeoutSecs must be between 1 and {} (below requestTimeoutSecs), got {}",
                self.request_timeout_secs - 1,
                self.audit_timeout_secs
            );
        }
        if self.session.sliding_ttl_secs == 0 || self.session.absolute_ttl_secs == 0 {
            bail!("session TTLs must be greater than zero");
        }
        if self.session.sweep_interval_secs == 0 {
            bail!("session.sweepIntervalSecs must be greater than zero");
        }
        if self.voice.gather_timeout_secs == 0 {
            bail!("voice.gatherTimeoutSecs must be greater than zero");
        }
        Ok(())
    }

    pub fn action_target(&self) -> String {
        match self.public_base_url.as_deref() {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), self.action_path),
            None => self.action_path.clone(),
        }
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            sliding: Duration::from_secs(self.session.sliding_ttl_secs),
            absolute: Duration::from_secs(self.session.absolute_ttl_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_secs(self.audit_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }
}
