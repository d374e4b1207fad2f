use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::TextrelayConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "textrelay.toml",
    "textrelay.yaml",
    "textrelay.yml",
    "textrelay.json",
];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, config discovery only looks in
/// this directory (project-local and user-global paths are skipped).
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<TextrelayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply
/// `TEXTRELAY_*` environment overrides.
///
/// Search order:
/// 1. `./textrelay.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/textrelay/textrelay.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `TextrelayConfig::default()` if no usable file is found.
pub fn discover_and_load() -> TextrelayConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                TextrelayConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            TextrelayConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Apply `TEXTRELAY_RELAY_URL`, `TEXTRELAY_SENDER_ID` and `TEXTRELAY_CONTRACT`.
pub fn apply_env_overrides(config: &mut TextrelayConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("TEXTRELAY_RELAY_URL") {
        config.relay.url = url;
    }
    if let Some(sender) = lookup("TEXTRELAY_SENDER_ID") {
        config.relay.sender_id = sender;
    }
    if let Some(raw) = lookup("TEXTRELAY_CONTRACT") {
        match raw.parse() {
            Ok(version) => config.relay.contract = version,
            Err(e) => warn!(error = %e, "ignoring TEXTRELAY_CONTRACT"),
        }
    }
}

/// Find the first config file in standard locations.
///
/// When a config dir override is set, only that directory is searched.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return find_in_dir(&dir);
    }

    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    user_config_dir().and_then(|dir| find_in_dir(&dir))
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/textrelay/`.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_override().or_else(user_config_dir)
}

fn user_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("textrelay"))
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("textrelay.toml")
}

/// Serialize `config` to TOML at `path`, creating parent directories.
pub fn save_config_to(config: &TextrelayConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Write `config` to the discovered (or default) config path.
/// Returns the path written to.
pub fn save_config(config: &TextrelayConfig) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<TextrelayConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::schema::ContractVersion};

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textrelay.toml");
        std::fs::write(&path, "[relay]\nsender_id = \"15550001111\"\ncontract = \"legacy\"\n")
            .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.relay.sender_id, "15550001111");
        assert_eq!(cfg.relay.contract, ContractVersion::Legacy);
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("textrelay.yaml");
        std::fs::write(&yaml, "relay:\n  url: http://yaml.test/send\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().relay.url, "http://yaml.test/send");

        let json = dir.path().join("textrelay.json");
        std::fs::write(&json, r#"{"session": {"profile": "work"}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().session.profile, "work");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textrelay.ini");
        std::fs::write(&path, "").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn find_in_dir_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("textrelay.json"), "{}").unwrap();
        std::fs::write(dir.path().join("textrelay.toml"), "").unwrap();
        let found = find_in_dir(dir.path()).unwrap();
        assert!(found.ends_with("textrelay.toml"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("textrelay.toml");
        let mut cfg = TextrelayConfig::default();
        cfg.relay.timeout_secs = Some(15);

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = TextrelayConfig::default();
        apply_env_overrides(&mut cfg, |name| match name {
            "TEXTRELAY_RELAY_URL" => Some("http://override.test".into()),
            "TEXTRELAY_CONTRACT" => Some("legacy".into()),
            _ => None,
        });
        assert_eq!(cfg.relay.url, "http://override.test");
        assert_eq!(cfg.relay.contract, ContractVersion::Legacy);
        assert_eq!(cfg.relay.sender_id, crate::schema::DEFAULT_SENDER_ID);
    }

    #[test]
    fn bad_contract_env_is_ignored() {
        let mut cfg = TextrelayConfig::default();
        apply_env_overrides(&mut cfg, |name| {
            (name == "TEXTRELAY_CONTRACT").then(|| "v9".to_string())
        });
        assert_eq!(cfg.relay.contract, ContractVersion::V1);
    }
}
