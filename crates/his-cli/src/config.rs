use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use his_auth::AuthConfig;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

impl ProfileConfig {
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
    }

    /// Guard and endpoint settings, validated.
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let config = self.auth.clone().unwrap_or_default();
        config.validate().context("Invalid auth configuration")?;
        Ok(config)
    }
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

/// The `~/.his` directory: `config.toml` plus one session file per profile.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn open_default() -> Result<Self> {
        let dir = dirs::home_dir()
            .context("Cannot determine home directory")?
            .join(".his");
        Ok(Self::at(dir))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join("config.toml")
    }

    pub fn session_path(&self, profile: &str) -> PathBuf {
        self.dir.join(format!("session.{profile}.json"))
    }

    pub fn load_all(&self) -> Result<ConfigFile> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(ConfigFile::new());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let cfg: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_profile(&self, profile: &str) -> Result<ProfileConfig> {
        Ok(self.load_all()?.remove(profile).unwrap_or_default())
    }

    pub fn save_profile(&self, profile: &str, config: ProfileConfig) -> Result<()> {
        let mut all = self.load_all()?;
        all.insert(profile.to_string(), config);
        let content = toml::to_string_pretty(&all)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(self.config_path(), content)?;
        Ok(())
    }

    pub fn resolve_server(&self, cli_server: Option<&str>, profile: &str) -> Result<String> {
        // 1. --server flag / HIS_URL env
        if let Some(s) = cli_server {
            return Ok(s.to_string());
        }
        // 2. config.toml profile
        if let Some(s) = self.load_profile(profile)?.server {
            return Ok(s);
        }
        anyhow::bail!(
            "No server URL configured. Use --server, set HIS_URL env var, or run: his config set server <url>"
        )
    }
}
