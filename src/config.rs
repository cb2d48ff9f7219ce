use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::harvest::{HarvestMode, HarvestOptions, DEFAULT_MAX_LINKS_PER_POST};

pub const CONFIG_FILE: &str = "mentioned-media.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Master switch; when off, post events are ignored.
    pub enabled: bool,
    pub database_url: Option<String>,
    pub harvest: HarvestMode,
    pub max_links_per_post: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { enabled: true, database_url: None, harvest: HarvestMode::Both, max_links_per_post: DEFAULT_MAX_LINKS_PER_POST }
    }
}

impl Settings {
    /// Load from `path`, or from the platform config dir when `None`. A missing
    /// file means defaults; environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        let mut settings = match path {
            Some(p) if p.exists() => Self::from_file(&p)?,
            _ => Self::default(),
        };
        settings.apply_env(|k| std::env::var(k).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading settings: {}", path.display()))?;
        let settings: Self = toml::from_str(&text).with_context(|| format!("parsing settings: {}", path.display()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Apply `MENTIONED_MEDIA_*` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MENTIONED_MEDIA_ENABLED") {
            self.enabled = parse_bool(&v).with_context(|| format!("MENTIONED_MEDIA_ENABLED: invalid value `{v}`"))?;
        }
        if let Some(v) = lookup("MENTIONED_MEDIA_DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database_url = Some(v);
        }
        if let Some(v) = lookup("MENTIONED_MEDIA_HARVEST") {
            self.harvest = v.parse().context("MENTIONED_MEDIA_HARVEST")?;
        }
        if let Some(v) = lookup("MENTIONED_MEDIA_MAX_LINKS") {
            self.max_links_per_post = v.trim().parse().with_context(|| format!("MENTIONED_MEDIA_MAX_LINKS: invalid value `{v}`"))?;
        }
        Ok(())
    }

    pub fn harvest_options(&self) -> HarvestOptions {
        HarvestOptions { mode: self.harvest, max_links_per_post: self.max_links_per_post }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "mentioned-media", "mentioned-media").map(|p| p.config_dir().join(CONFIG_FILE))
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "harvest = \"raw\"\nmax_links_per_post = 25\n").unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert!(s.enabled);
        assert_eq!(s.harvest, HarvestMode::Raw);
        assert_eq!(s.harvest_options().max_links_per_post, 25);
        assert_eq!(s.database_url, None);
    }

    #[test]
    fn bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "harvest = \"sideways\"").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }

    #[test]
    fn from_file_requires_the_file_and_empty_env_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::from_file(&dir.path().join("absent.toml")).is_err());
        let mut s = Settings::default();
        s.apply_env(|_| None).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MENTIONED_MEDIA_ENABLED", "off"),
            ("MENTIONED_MEDIA_DATABASE_URL", "sqlite://x.db"),
            ("MENTIONED_MEDIA_HARVEST", "rendered"),
            ("MENTIONED_MEDIA_MAX_LINKS", "7"),
        ]
        .into_iter()
        .collect();
        let mut s = Settings::default();
        s.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert!(!s.enabled);
        assert_eq!(s.database_url.as_deref(), Some("sqlite://x.db"));
        assert_eq!(s.harvest, HarvestMode::Rendered);
        assert_eq!(s.max_links_per_post, 7);
    }

    #[test]
    fn invalid_env_is_reported() {
        let mut s = Settings::default();
        assert!(s.apply_env(|k| (k == "MENTIONED_MEDIA_ENABLED").then(|| "maybe".to_string())).is_err());
        let mut s = Settings::default();
        assert!(s.apply_env(|k| (k == "MENTIONED_MEDIA_MAX_LINKS").then(|| "lots".to_string())).is_err());
    }
}
