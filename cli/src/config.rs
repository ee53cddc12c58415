//! Startup configuration block: values a real target would bake in at
//! build time or have the startup coordinator pass to the bootloader
//! protocol core. Here it's loaded from a TOML file for convenience on
//! the host.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Debug,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub session_timeout_ms: u32,
    pub frame_timeout_ms: u32,
    pub enable_debug_output: bool,
    pub enable_resource_tracking: bool,
    pub enable_emergency_recovery: bool,
    pub initial_mode: Mode,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: cockpit_bootloader::timeout::DEFAULT_SESSION_TIMEOUT_MS,
            frame_timeout_ms: cockpit_bootloader::timeout::DEFAULT_FRAME_TIMEOUT_MS,
            enable_debug_output: false,
            enable_resource_tracking: true,
            enable_emergency_recovery: true,
            initial_mode: Mode::Production,
        }
    }
}

impl CliConfig {
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn session_config(&self) -> cockpit_bootloader::SessionConfig {
        cockpit_bootloader::SessionConfig {
            session_timeout_ms: self.session_timeout_ms,
            frame_timeout_ms: self.frame_timeout_ms,
            enable_emergency_recovery: self.enable_emergency_recovery,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::path::PathBuf, std::io::Error),
    Parse(std::path::PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "reading config {}: {e}", path.display()),
            Self::Parse(path, e) => write!(f, "parsing config {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {}
