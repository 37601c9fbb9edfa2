//! Loop configuration stored under `.ordae/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::snapshot::Policy;
use crate::io::error::ConfigError;

pub const DEFAULT_OWNER_TAG: &str = "ordae-system";
pub const STORE_URL_ENV: &str = "ORDAE_STORE_URL";
const DEFAULT_API_KEY_ENV: &str = "ORDAE_STORE_KEY";

/// Loop configuration (TOML).
///
/// Edited by humans. Missing fields fall back to the workspace defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OrdaeConfig {
    /// Persona data directory (mission, catalog, local personas, plans).
    pub persona_dir: String,

    /// App source directory; the attribution page lives under `<app_dir>/pages`.
    pub app_dir: String,

    /// Ledger directory.
    pub memory_dir: String,

    /// Knowledge-base root (`universities/`, `program_catalog/`).
    pub knowledge_dir: String,

    /// Owner tag recorded on every persona the loop creates.
    pub owner_tag: String,

    pub policy: Policy,

    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the persona store REST API. Falls back to `ORDAE_STORE_URL`.
    pub url: Option<String>,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Configured URL, else the environment override. Blank values count as unset.
    pub fn resolved_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| std::env::var(STORE_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for OrdaeConfig {
    fn default() -> Self {
        Self {
            persona_dir: "persona_data".to_string(),
            app_dir: "src".to_string(),
            memory_dir: ".ordae/memory".to_string(),
            knowledge_dir: "rag".to_string(),
            owner_tag: DEFAULT_OWNER_TAG.to_string(),
            policy: Policy::default(),
            store: StoreConfig::default(),
        }
    }
}

impl OrdaeConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in [
            ("persona_dir", &self.persona_dir),
            ("app_dir", &self.app_dir),
            ("memory_dir", &self.memory_dir),
            ("knowledge_dir", &self.knowledge_dir),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }
        if self.owner_tag.trim().is_empty() {
            return Err("owner_tag must not be empty".to_string());
        }
        if self.store.timeout_secs == 0 {
            return Err("store.timeout_secs must be > 0".to_string());
        }
        if self.store.api_key_env.trim().is_empty() {
            return Err("store.api_key_env must not be empty".to_string());
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `OrdaeConfig::default()`. Unreadable,
/// unparseable or invalid files are a [`ConfigError`].
pub fn load_config(path: &Path) -> Result<OrdaeConfig> {
    if !path.exists() {
        return Ok(OrdaeConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: OrdaeConfig = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    cfg.validate().map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &OrdaeConfig) -> Result<()> {
    cfg.validate().map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Write `contents` next to `path` and rename it into place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::{AbPlanPolicy, CoverageRule};

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, OrdaeConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".ordae").join("config.toml");
        let mut cfg = OrdaeConfig::default();
        cfg.policy.ab_plan = AbPlanPolicy::Always;
        cfg.store.url = Some("https://store.example".to_string());
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "owner_tag = \"ops\"\n[policy]\ncoverage = \"all_personas\"\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.owner_tag, "ops");
        assert_eq!(cfg.policy.coverage, CoverageRule::AllPersonas);
        assert_eq!(cfg.policy.ab_plan, AbPlanPolicy::NonOnboardingMission);
        assert_eq!(cfg.persona_dir, "persona_data");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "owner_tag = [").expect("write");
        let err = load_config(&path).expect_err("malformed");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn empty_owner_tag_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "owner_tag = \"  \"\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(err.to_string().contains("owner_tag"));
    }
}
