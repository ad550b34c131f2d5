//! User configuration: theme, tab width, autosave interval, raw-reveal
//! default. Loaded from a TOML file via `serde`+`toml`, located with
//! `dirs`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    Light,
    Dark,
}

impl Default for ThemeName {
    fn default() -> Self {
        ThemeName::Dark
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeName,
    pub tab_width: usize,
    pub autosave_interval_secs: u64,
    pub raw_reveal_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { theme: ThemeName::Dark, tab_width: 4, autosave_interval_secs: 60, raw_reveal_default: false }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/mdink/config.toml` (or platform equivalent via
    /// `dirs::config_dir`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mdink").join("config.toml"))
    }

    /// Loads config from `path`, falling back to defaults when the file
    /// is absent or fails to parse — a missing/bad config is never fatal.
    pub fn load(path: &Path) -> Config {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).unwrap_or_default(),
            Err(_) => Config::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self).unwrap_or_default();
        std::fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let c = Config::default();
        assert_eq!(c.tab_width, 4);
        assert_eq!(c.autosave_interval_secs, 60);
        assert!(!c.raw_reveal_default);
    }

    #[test]
    fn load_missing_file_falls_back_to_default() {
        let c = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(c.theme, ThemeName::Dark);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut c = Config::default();
        c.tab_width = 2;
        c.theme = ThemeName::Light;
        c.save(&path).unwrap();
        let loaded = Config::load(&path);
        assert_eq!(loaded.tab_width, 2);
        assert_eq!(loaded.theme, ThemeName::Light);
    }

    #[test]
    fn malformed_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid = [[[ toml").unwrap();
        let c = Config::load(&path);
        assert_eq!(c.tab_width, 4);
    }
}
