/// Config schema types (server, telegram, storage, queues, results).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PixbotConfig {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub storage: StorageConfig,
    pub queues: QueueConfig,
    pub results: ResultsConfig,
    /// Downloaded photos and filtered outputs are written here.
    pub work_dir: PathBuf,
}

impl Default for PixbotConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            telegram: TelegramConfig::default(),
            storage: StorageConfig::default(),
            queues: QueueConfig::default(),
            results: ResultsConfig::default(),
            work_dir: PathBuf::from("photos"),
        }
    }
}

/// HTTP health/readiness listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8443,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token (overridden by `TELEGRAM_TOKEN`).
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            poll_timeout_secs: 30,
        }
    }
}

/// Object storage. Buckets are directories under `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub bucket: String,
    /// Key prefix for uploaded photos.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage"),
            bucket: "pixbot".into(),
            prefix: "photos".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Prediction requests are enqueued here.
    pub identify: String,
    /// Prediction results are polled from here.
    pub results: String,
    pub poll_wait_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            identify: "pixbot-identify".into(),
            results: "pixbot-results".into(),
            poll_wait_secs: 5,
        }
    }
}

/// Prediction records, one `{id}.json` per prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    pub dir: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("predictions"),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted_in_debug() {
        let cfg = TelegramConfig {
            token: Some(Secret::new("123:abc".into())),
            ..Default::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("123:abc"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PixbotConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.queues.poll_wait_secs, 5);
        assert_eq!(cfg.work_dir, PathBuf::from("photos"));
    }
}
