/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/config.rs
 * Responsibility: YAML configuration structure, loading and first-run template
 */
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub discord: DiscordConfig,
    pub catalog: CatalogConfig,
    pub database: DatabaseConfig,
    /// Debug mode disables the weekly cache refresh task.
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DiscordConfig {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    /// Base URL of the problem catalog API, without a trailing slash.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. "sqlite:/home/user/.leetbot/leetbot.db"
    pub url: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file at {:?}", path.as_ref()))?;
        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Write a placeholder config for the user to fill in on first run.
    pub fn write_placeholder(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {parent:?}"))?;
        }
        let db_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("leetbot.db");
        let template = Config {
            discord: DiscordConfig {
                token: "YOUR_DISCORD_BOT_TOKEN".to_string(),
            },
            catalog: CatalogConfig {
                base_url: "https://alfa-leetcode-api.onrender.com".to_string(),
            },
            database: DatabaseConfig {
                url: format!("sqlite:{}", db_path.to_string_lossy()),
            },
            debug: false,
        };
        let yaml = serde_yaml::to_string(&template).context("Failed to render config template")?;
        fs::write(path, yaml)
            .with_context(|| format!("Failed to write config template at {path:?}"))?;
        Ok(())
    }

    pub fn has_placeholders(&self) -> bool {
        self.discord.token.contains("YOUR_")
    }
}

/// Resolve the config file path.
/// Priority: CLI > Environment Variable > Default (~/.leetbot/leetbot.yml)
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    if let Ok(env_path) = std::env::var("LEETBOT_CONFIG") {
        return PathBuf::from(env_path);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".leetbot")
        .join("leetbot.yml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_placeholder_roundtrips_and_is_flagged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leetbot.yml");

        Config::write_placeholder(&path).unwrap();
        let config = Config::load(&path).unwrap();

        assert!(config.has_placeholders());
        assert!(config.database.url.starts_with("sqlite:"));
        assert!(!config.debug);
    }

    #[test]
    fn test_load_parses_a_filled_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leetbot.yml");
        fs::write(
            &path,
            "discord:\n  token: abc123\ncatalog:\n  base_url: http://localhost:3000\ndatabase:\n  url: \"sqlite::memory:\"\ndebug: true\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.discord.token, "abc123");
        assert_eq!(config.catalog.base_url, "http://localhost:3000");
        assert!(config.debug);
        assert!(!config.has_placeholders());
    }
}
