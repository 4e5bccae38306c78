//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 3002;
    pub const DEV_PUBLIC_HOST: &str = "localhost:3002";
    pub const DEV_MODELS_DIR: &str = "storage/models";
    pub const DEV_IMAGES_DIR: &str = "storage/images";
    pub const DEV_UPLOAD_DIR: &str = "uploads";
    pub const DEV_OUTPUT_DIR: &str = "converted";
    pub const DEV_MAX_UPLOAD_SIZE: usize = 209_715_200; // 200MB per model

    // Blender headless conversion
    pub const CONVERTER_PROGRAM: &str = "blender";
    pub const CONVERTER_ARGS: &str = "--background --python scripts/convert_usdz_to_glb.py --";
    pub const TARGET_EXTENSION: &str = "glb";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// External conversion tool invocation.
///
/// The tool is run as `program args... <input> <output>`; the two paths are
/// always appended as separate arguments, never through a shell.
#[derive(Debug, Clone)]
pub struct ConverterSettings {
    /// Executable name or path
    pub program: String,
    /// Fixed leading arguments
    pub args: Vec<String>,
    /// Extension of the produced file, without the dot
    pub target_extension: String,
}

impl ConverterSettings {
    /// Split a whitespace-separated argument list.
    pub fn parse_args(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(String::from).collect()
    }
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            program: defaults::CONVERTER_PROGRAM.to_string(),
            args: Self::parse_args(defaults::CONVERTER_ARGS),
            target_extension: defaults::TARGET_EXTENSION.to_string(),
        }
    }
}

/// Local file repository roots.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Root directory for the `models` subfolder
    pub models_dir: PathBuf,
    /// Root directory under which every other subfolder is nested
    pub images_dir: PathBuf,
    /// Host (and optional port) used when building access URLs
    pub public_host: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Temporary directory for incoming uploads
    pub upload_dir: PathBuf,
    /// Temporary directory for converter output
    pub output_dir: PathBuf,
    /// Maximum size of a single uploaded model in bytes
    pub max_upload_size: usize,
    /// File repository configuration
    pub storage: StorageSettings,
    /// Conversion tool configuration
    pub converter: ConverterSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a development default. In production
    /// (`RUST_ENV=production`) the storage roots and `PUBLIC_HOST` must be set
    /// explicitly or the server refuses to start.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production, default: development)
    /// - `HOST`: Server host (default: 127.0.0.1)
    /// - `PORT`: Server port (default: 3002)
    /// - `MODELS_DIR_PATH`: Storage root for the `models` subfolder
    /// - `IMAGES_DIR_PATH`: Storage root for all other subfolders
    /// - `PUBLIC_HOST`: Host used in returned URLs
    /// - `UPLOAD_DIR`: Temporary upload directory (default: uploads)
    /// - `OUTPUT_DIR`: Converter output directory (default: converted)
    /// - `MAX_UPLOAD_SIZE`: Max upload size in bytes (default: 200MB)
    /// - `CONVERTER_PROGRAM`: Conversion executable (default: blender)
    /// - `CONVERTER_ARGS`: Whitespace-separated leading arguments
    /// - `TARGET_EXTENSION`: Output extension (default: glb)
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("RUST_ENV") {
            Ok(value) => Environment::parse(&value).ok_or(ConfigError::InvalidValue(
                "RUST_ENV must be 'development' or 'production'",
            ))?,
            Err(_) => Environment::Development,
        };

        let host = env::var("HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("PORT must be a valid port number"))?;

        let max_upload_size = env::var("MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| defaults::DEV_MAX_UPLOAD_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_SIZE must be a valid number"))?;

        let storage = StorageSettings {
            models_dir: env::var("MODELS_DIR_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(defaults::DEV_MODELS_DIR)),
            images_dir: env::var("IMAGES_DIR_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(defaults::DEV_IMAGES_DIR)),
            public_host: env::var("PUBLIC_HOST")
                .unwrap_or_else(|_| defaults::DEV_PUBLIC_HOST.to_string()),
        };

        let converter = ConverterSettings {
            program: env::var("CONVERTER_PROGRAM")
                .unwrap_or_else(|_| defaults::CONVERTER_PROGRAM.to_string()),
            args: ConverterSettings::parse_args(
                &env::var("CONVERTER_ARGS").unwrap_or_else(|_| defaults::CONVERTER_ARGS.to_string()),
            ),
            target_extension: env::var("TARGET_EXTENSION")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or_else(|_| defaults::TARGET_EXTENSION.to_string()),
        };

        if converter.target_extension.is_empty() {
            return Err(ConfigError::InvalidValue("TARGET_EXTENSION must not be empty"));
        }

        let config = Config {
            environment,
            host,
            port,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(defaults::DEV_UPLOAD_DIR)),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(defaults::DEV_OUTPUT_DIR)),
            max_upload_size,
            storage,
            converter,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.storage.models_dir == PathBuf::from(defaults::DEV_MODELS_DIR) {
            errors.push(format!(
                "MODELS_DIR_PATH is using development default '{}'. Set the models storage root.",
                defaults::DEV_MODELS_DIR
            ));
        }

        if self.storage.images_dir == PathBuf::from(defaults::DEV_IMAGES_DIR) {
            errors.push(format!(
                "IMAGES_DIR_PATH is using development default '{}'. Set the images storage root.",
                defaults::DEV_IMAGES_DIR
            ));
        }

        if self.storage.public_host == defaults::DEV_PUBLIC_HOST {
            errors.push(
                "PUBLIC_HOST is using development default. Set the public API host.".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
