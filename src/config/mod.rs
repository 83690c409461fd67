use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the web UI binds to
    pub ip: String,

    /// Port the web UI listens on
    pub port: u16,

    /// JSON file holding the stream list
    pub streams_file: PathBuf,

    /// Button colours, `#RRGGBB` or `#RGB` (defaults to Catppuccin Mocha)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,

    /// Volume change per key press in the terminal UI
    pub volume_step: u8,

    /// Show a desktop notification when a stream starts
    pub notifications: bool,

    /// Program used to decode streams
    pub player: String,

    /// PulseAudio sink the player writes to
    pub sink: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            port: 8080,
            streams_file: PathBuf::from("streams.json"),
            palette: None,
            volume_step: 5,
            notifications: false,
            player: "ffmpeg".to_string(),
            sink: "default".to_string(),
        }
    }
}

impl AppConfig {
    /// Config directory, created if needed
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("sointu");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        match Self::config_dir() {
            Ok(dir) => Self::load_from(&dir.join("config.toml")),
            Err(_) => Ok(AppConfig::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            // Keep a broken file around for the user to fix
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
