use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::timer::DEFAULT_FOCUS_MINUTES;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub focus_minutes: u32,
    pub planner_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            planner_file: None,
        }
    }
}

impl Config {
    // Configuration is best-effort: anything unreadable means defaults.
    pub fn load(path: &Path) -> Config {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Config::default(),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed reading config file, using defaults");
                return Config::default();
            }
        };

        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "config file is malformed, using defaults");
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::Config;

    fn temp_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = temp_file("kairos_config_missing.toml");
        let _ = fs::remove_file(&path);

        let config = Config::load(&path);
        assert_eq!(config.focus_minutes, 25);
        assert!(config.planner_file.is_none());
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let path = temp_file("kairos_config_partial.toml");
        fs::write(&path, "focus_minutes = 50\n").expect("write should succeed");

        let config = Config::load(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config.focus_minutes, 50);
        assert!(config.planner_file.is_none());
    }

    #[test]
    fn malformed_config_yields_defaults() {
        let path = temp_file("kairos_config_malformed.toml");
        fs::write(&path, "focus_minutes = \"soon\"").expect("write should succeed");

        let config = Config::load(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config.focus_minutes, 25);
    }
}
