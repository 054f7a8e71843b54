//! BookNudge configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BookNudgeError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookNudgeConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// Fan-out dispatch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-channel send timeout. A channel that neither succeeds nor fails
    /// within this window is recorded as a failed outcome.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    /// Max firing records kept in the in-memory audit history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_send_timeout() -> u64 {
    10
}
fn default_history_limit() -> usize {
    200
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout_secs: default_send_timeout(),
            history_limit: default_history_limit(),
        }
    }
}

/// Per-channel transport configuration. A missing section means the channel
/// is not configured; requested-but-unconfigured channels fail per firing,
/// they never fail scheduling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub email: Option<EmailChannelConfig>,
    #[serde(default)]
    pub sms: Option<SmsChannelConfig>,
    #[serde(default)]
    pub push: Option<PushChannelConfig>,
}

/// SMTP email sender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailChannelConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from_email: String,
    #[serde(default)]
    pub from_name: Option<String>,
    pub username: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_smtp_port() -> u16 {
    587
}

/// Twilio-style SMS sender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsChannelConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// E.164 sender number, e.g. "+15551230000".
    pub from_number: String,
    /// Override for testing; defaults to the Twilio API.
    #[serde(default = "default_sms_api_base")]
    pub api_base: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_sms_api_base() -> String {
    "https://api.twilio.com".into()
}

/// FCM push sender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushChannelConfig {
    pub server_key: String,
    /// Override for testing; defaults to the FCM endpoint.
    #[serde(default = "default_push_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_push_endpoint() -> String {
    "https://fcm.googleapis.com/fcm/send".into()
}

fn default_true() -> bool {
    true
}

impl BookNudgeConfig {
    /// Load config from the default path (~/.booknudge/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BookNudgeError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BookNudgeError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Default config path.
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".booknudge").join("config.toml")
    }
}
