use std::env;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;

const PLANNER_FILE: &str = "planner.json";
const CONFIG_FILE: &str = "config.toml";

pub fn resolve_planner_path(cli_path: Option<PathBuf>, config: &Config) -> PathBuf {
	if let Some(path) = cli_path {
		return absolutize(path);
	}

	if let Some(path) = env::var_os("KAIROS_PLANNER") {
		if !path.is_empty() {
			return absolutize(PathBuf::from(path));
		}
	}

	if let Some(path) = &config.planner_file {
		return absolutize(path.clone());
	}

	state_dir().join(PLANNER_FILE)
}

pub fn config_path() -> PathBuf {
	if let Some(path) = env::var_os("KAIROS_CONFIG") {
		if !path.is_empty() {
			return PathBuf::from(path);
		}
	}

	state_dir().join(CONFIG_FILE)
}

pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("KAIROS_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join("kairos_dayplanner");
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join("kairos_dayplanner");
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("state")
			.join("kairos_dayplanner");
	}

	PathBuf::from(".kairos_dayplanner")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}
