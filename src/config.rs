//! Configuration for tubecheck.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (TUBECHECK_HOME, provider keys, tool paths)
//! 2. Config file (.tubecheck/config.yaml)
//! 3. Defaults (~/.tubecheck, tools resolved from PATH)
//!
//! Config file discovery:
//! - Searches current directory and parents for .tubecheck/config.yaml

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::cloudinary::CloudinaryCredentials;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Engine state directory (relative to the config file)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    pub elevenlabs_api_key: Option<String>,
    pub sapling_api_key: Option<String>,
    pub sapling_api_url: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    pub ytdlp: Option<String>,
    pub ffmpeg: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to tubecheck home (engine state)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub elevenlabs_api_key: Option<String>,
    pub sapling_api_key: Option<String>,
    pub sapling_api_url: Option<String>,
    pub cloudinary: Option<CloudinaryCredentials>,
    /// yt-dlp binary (name or absolute path)
    pub ytdlp_bin: String,
    /// ffmpeg binary (name or absolute path)
    pub ffmpeg_bin: String,
    /// HTTP server port
    pub port: u16,
}

impl ResolvedConfig {
    /// Directory holding persisted job documents ($TUBECHECK_HOME/jobs)
    pub fn jobs_dir(&self) -> PathBuf {
        self.home.join("jobs")
    }

    /// Scratch directory for in-flight audio downloads ($TUBECHECK_HOME/work)
    pub fn work_dir(&self) -> PathBuf {
        self.home.join("work")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".tubecheck").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn env_or(file_value: Option<String>, var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty()).or(file_value)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".tubecheck");

    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    let home = if let Ok(env_home) = std::env::var("TUBECHECK_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(ref config_path), Some(ref home_path)) = (&config_file, &file.paths.home) {
        // home is relative to the .tubecheck/ directory
        let base = config_path.parent().unwrap_or(Path::new("."));
        base.join(home_path)
    } else {
        default_home
    };

    let cloudinary = match (
        env_or(file.providers.cloudinary_cloud_name, "CLOUDINARY_CLOUD_NAME"),
        env_or(file.providers.cloudinary_api_key, "CLOUDINARY_API_KEY"),
        env_or(file.providers.cloudinary_api_secret, "CLOUDINARY_API_SECRET"),
    ) {
        (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryCredentials {
            cloud_name,
            api_key,
            api_secret,
        }),
        _ => None,
    };

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .or(file.server.port)
        .unwrap_or(8080);

    Ok(ResolvedConfig {
        home,
        config_file,
        elevenlabs_api_key: env_or(file.providers.elevenlabs_api_key, "ELEVEN_LABS_API_KEY"),
        sapling_api_key: env_or(file.providers.sapling_api_key, "SAPLING_API_KEY"),
        sapling_api_url: env_or(file.providers.sapling_api_url, "SAPLING_API_URL"),
        cloudinary,
        ytdlp_bin: env_or(file.tools.ytdlp, "YTDLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()),
        ffmpeg_bin: env_or(file.tools.ffmpeg, "FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
        port,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
