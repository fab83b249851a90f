use serde::{Deserialize, Serialize};

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub email_host: String,
    pub email_port: u16,
    #[serde(default)]
    pub email_secure: bool,
    pub email_user: String,
    pub email_pass: String,
    pub admin_email: String,
    pub port: u16,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_brand_name")]
    pub brand_name: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_brand_name() -> String {
    "Laverse Digital".to_string()
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn load_from_file(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(Into::into)
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    load_config_from(Path::new("."), env::vars())
}

/// Resolves the config relative to `base_dir`. `process_vars` take precedence
/// over a `.env` file found there.
pub fn load_config_from(
    base_dir: &Path,
    process_vars: impl IntoIterator<Item = (String, String)>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut vars = HashMap::new();

    // Pick up a local .env file if there is one
    let dotenv_path = base_dir.join(".env");
    if dotenv_path.exists() {
        for item in dotenvy::from_path_iter(&dotenv_path)? {
            let (key, value) = item?;
            vars.insert(key, value);
        }
        tracing::info!("Loaded environment overrides from {}", dotenv_path.display());
    }
    vars.extend(process_vars);

    // Retrieve env variable
    let config_path = vars
        .get("RELAY_CONFIG")
        .cloned()
        .unwrap_or_else(|| "config.yaml".to_string());

    // Try env path
    let requested = base_dir.join(&config_path);
    if requested.exists() {
        return load_from_file(&requested);
    }

    // Fallback to config.yaml
    let default_path = base_dir.join("config.yaml");
    if default_path.exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        return load_from_file(&default_path);
    }

    // Fallback to config.example.yaml
    let example_path = base_dir.join("config.example.yaml");
    if example_path.exists() {
        tracing::warn!(
            "Config file '{}' and 'config.yaml' not found, falling back to 'config.example.yaml'\
             \n This file should not be used and should be replaced with actual data",
            config_path
        );
        return load_from_file(&example_path);
    }

    // Fallback to environment variables
    tracing::info!(
        "No config file found, attempting to load configuration from environment variables"
    );
    match envy::from_iter::<_, Config>(vars) {
        Ok(config) => {
            tracing::info!("Successfully loaded configuration from environment variables");
            Ok(config)
        }
        Err(e) => Err(format!(
            "Config file not found and environment variables are incomplete. \
             Tried: '{config_path}', 'config.yaml', 'config.example.yaml', and environment variables. \
             Error: {e}"
        )
        .into()),
    }
}
