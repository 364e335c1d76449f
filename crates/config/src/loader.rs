use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::expand_env, schema::PixbotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["pixbot.toml", "pixbot.yaml", "pixbot.yml", "pixbot.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PixbotConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let expanded = expand_env(&raw);
    if !expanded.unresolved.is_empty() {
        warn!(
            path = %path.display(),
            vars = ?expanded.unresolved,
            "config references unset environment variables, placeholders kept"
        );
    }
    parse_config(&expanded.text, path)
}

/// Discover and load config, then apply environment overrides.
///
/// Search order:
/// 1. `explicit` (the `--config` flag); a failure here is returned
/// 2. `./pixbot.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/pixbot/pixbot.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `PixbotConfig::default()` if no file is found or a
/// discovered file fails to parse.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<PixbotConfig> {
    let mut config = if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit config");
        load_config(path)?
    } else if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        load_config(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            PixbotConfig::default()
        })
    } else {
        debug!("no config file found, using defaults");
        PixbotConfig::default()
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Overlay deployment environment variables onto `config`.
pub fn apply_env_overrides(config: &mut PixbotConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut PixbotConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = lookup("TELEGRAM_TOKEN") {
        config.telegram.token = Some(Secret::new(token));
    }
    if let Some(bucket) = lookup("BUCKET_NAME") {
        config.storage.bucket = bucket;
    }
    if let Some(prefix) = lookup("BUCKET_PREFIX") {
        config.storage.prefix = prefix;
    }
    if let Some(queue) = lookup("SQS_QUEUE_IDENTIFY") {
        config.queues.identify = queue;
    }
    if let Some(queue) = lookup("SQS_QUEUE_RESULTS") {
        config.queues.results = queue;
    }
    if let Some(bind) = lookup("PIXBOT_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("PIXBOT_PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid PIXBOT_PORT"),
        }
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/pixbot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pixbot").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PixbotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "pixbot.toml",
            "work_dir = \"/tmp/photos\"\n[queues]\nidentify = \"identify-q\"\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.queues.identify, "identify-q");
        assert_eq!(cfg.work_dir, PathBuf::from("/tmp/photos"));
    }

    #[test]
    fn unset_placeholder_survives_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "pixbot.toml",
            "[storage]\nbucket = \"${PIXBOT_UNSET_BUCKET_7F3A}\"\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.storage.bucket, "${PIXBOT_UNSET_BUCKET_7F3A}");
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(&dir, "pixbot.yaml", "storage:\n  bucket: pics\n");
        assert_eq!(load_config(&yaml).unwrap().storage.bucket, "pics");

        let json = write(&dir, "pixbot.json", r#"{"server": {"port": 8080}}"#);
        assert_eq!(load_config(&json).unwrap().server.port, 8080);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pixbot.ini", "port=1");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_and_load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut cfg = PixbotConfig::default();
        apply_env_overrides_with(&mut cfg, |name| match name {
            "TELEGRAM_TOKEN" => Some("42:secret".into()),
            "BUCKET_NAME" => Some("prod-bucket".into()),
            "SQS_QUEUE_RESULTS" => Some("results-q".into()),
            "PIXBOT_PORT" => Some("9443".into()),
            "BUCKET_PREFIX" => Some("   ".into()),
            _ => None,
        });
        assert_eq!(
            cfg.telegram.token.as_ref().unwrap().expose_secret(),
            "42:secret"
        );
        assert_eq!(cfg.storage.bucket, "prod-bucket");
        assert_eq!(cfg.storage.prefix, "photos");
        assert_eq!(cfg.queues.results, "results-q");
        assert_eq!(cfg.server.port, 9443);
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut cfg = PixbotConfig::default();
        apply_env_overrides_with(&mut cfg, |name| {
            (name == "PIXBOT_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(cfg.server.port, 8443);
    }
}
