//! Configuration file support.
//!
//! Settings are stored as versioned JSON. Every field has a default, so a
//! partial file (or none at all) yields a working configuration.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::coords::CoordinateSpace;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging, including request timings
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Annotator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    /// Space prompt points are stored and exported in
    #[serde(default)]
    pub coordinate_space: CoordinateSpace,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub detector: DetectorConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Where the segmentation service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Separate service for `auto_annotate`; `None` uses `base_url`
    #[serde(default)]
    pub detector_url: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    format!("http://localhost:{}", constants::DEFAULT_BACKEND_PORT)
}

fn default_request_timeout_secs() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            detector_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Derive the service URL from the origin a page was served from.
    ///
    /// Keeps scheme and host, drops any path, and replaces the port with the
    /// backend port: `http://10.0.0.7:3000` becomes `http://10.0.0.7:5000`.
    pub fn from_origin(origin: &str) -> Self {
        let (scheme, rest) = origin.split_once("://").unwrap_or(("http", origin));
        let authority = rest.split('/').next().unwrap_or_default();
        let host = if authority.starts_with('[') {
            // IPv6 literal keeps its brackets
            authority
                .find(']')
                .map_or(authority, |end| &authority[..=end])
        } else {
            authority.split(':').next().unwrap_or_default()
        };
        let host = if host.is_empty() { "localhost" } else { host };

        Self {
            base_url: format!("{}://{}:{}", scheme, host, constants::DEFAULT_BACKEND_PORT),
            ..Self::default()
        }
    }
}

/// Limits applied before an image is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: usize,
}

fn default_max_file_size() -> usize {
    constants::MAX_UPLOAD_BYTES
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
        }
    }
}

/// Overlay drawing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_true")]
    pub show_mask: bool,

    #[serde(default = "default_true")]
    pub show_bbox: bool,

    #[serde(default = "default_mask_opacity")]
    pub mask_opacity: f32,

    #[serde(default = "default_point_radius")]
    pub point_radius: f32,

    #[serde(default = "default_crosshair_half_length")]
    pub crosshair_half_length: f32,
}

fn default_true() -> bool {
    true
}

fn default_mask_opacity() -> f32 {
    constants::DEFAULT_MASK_OPACITY
}

fn default_point_radius() -> f32 {
    constants::POINT_RADIUS
}

fn default_crosshair_half_length() -> f32 {
    constants::CROSSHAIR_HALF_LENGTH
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_mask: true,
            show_bbox: true,
            mask_opacity: default_mask_opacity(),
            point_radius: default_point_radius(),
            crosshair_half_length: default_crosshair_half_length(),
        }
    }
}

/// Thresholds sent with text-prompted detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_box_threshold")]
    pub box_threshold: f32,

    #[serde(default = "default_text_threshold")]
    pub text_threshold: f32,
}

fn default_box_threshold() -> f32 {
    constants::DEFAULT_BOX_THRESHOLD
}

fn default_text_threshold() -> f32 {
    constants::DEFAULT_TEXT_THRESHOLD
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            box_threshold: default_box_threshold(),
            text_threshold: default_text_threshold(),
        }
    }
}

impl AnnotatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: BackendConfig::default(),
            upload: UploadConfig::default(),
            coordinate_space: CoordinateSpace::default(),
            render: RenderConfig::default(),
            detector: DetectorConfig::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "labelseg-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("labelseg").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("labelseg")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load from `path`.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
