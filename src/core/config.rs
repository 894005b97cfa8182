use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Optional settings read from `config.toml` in the platform config
/// directory. Command-line flags and environment variables take precedence
/// over everything here.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub default_model: Option<String>,
    pub moderation_model: Option<String>,
    pub base_url: Option<String>,
    pub prompt_file: Option<String>,
    pub metrics_file: Option<String>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    fn get_config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "moderato")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }
}
