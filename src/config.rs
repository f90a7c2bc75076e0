//! Environment-backed settings for nova-clip.
//!
//! Settings come from the process environment, optionally seeded by a
//! `.env` file at startup. The file never overrides variables that are
//! already set: live environment wins, the file fills gaps.

use std::path::PathBuf;

/// Required credential variables.
pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Optional variables with built-in defaults.
pub const REGION_ENV: &str = "AWS_REGION";
pub const MODEL_ID_ENV: &str = "DEFAULT_MODEL_ID";
pub const DURATION_ENV: &str = "DEFAULT_DURATION";
pub const QUALITY_ENV: &str = "DEFAULT_IMAGE_QUALITY";
pub const OUTPUT_DIR_ENV: &str = "OUTPUT_DIR";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "amazon.nova.video-1080p";
pub const DEFAULT_DURATION_MS: u64 = 5000;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Rendering quality requested from the video model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageQuality {
    #[default]
    Standard,
    Premium,
}

impl ImageQuality {
    /// Wire representation of the quality level.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Standard => "standard",
            ImageQuality::Premium => "premium",
        }
    }

    /// Parse a quality level, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "standard" => Ok(ImageQuality::Standard),
            "premium" => Ok(ImageQuality::Premium),
            other => Err(format!(
                "Unknown image quality '{}'. Use 'standard' or 'premium'",
                other
            )),
        }
    }
}

impl std::fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable process-wide settings, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub default_model_id: String,
    pub default_duration_ms: u64,
    pub default_image_quality: ImageQuality,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when a required credential is
    /// absent and `ConfigError::InvalidField` when an optional variable is
    /// set to an unparseable value.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// The environment-independent core of `load`, used directly by tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingField { name })
        };

        let access_key_id = required(ACCESS_KEY_ENV)?;
        let secret_access_key = required(SECRET_KEY_ENV)?;
        let region = lookup(REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string());
        let default_model_id = lookup(MODEL_ID_ENV).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let default_duration_ms = match lookup(DURATION_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidField {
                name: DURATION_ENV,
                value: raw.clone(),
                reason: "expected a duration in milliseconds".to_string(),
            })?,
            None => DEFAULT_DURATION_MS,
        };

        let default_image_quality = match lookup(QUALITY_ENV) {
            Some(raw) => ImageQuality::parse(&raw).map_err(|reason| ConfigError::InvalidField {
                name: QUALITY_ENV,
                value: raw.clone(),
                reason,
            })?,
            None => ImageQuality::default(),
        };

        let output_dir = lookup(OUTPUT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            access_key_id,
            secret_access_key,
            region,
            default_model_id,
            default_duration_ms,
            default_image_quality,
            output_dir,
        })
    }

    /// Print the effective settings, masking credentials.
    pub fn print_summary(&self) {
        println!("AWS region:            {}", self.region);
        println!("Default model id:      {}", self.default_model_id);
        println!("Default duration:      {}ms", self.default_duration_ms);
        println!("Default image quality: {}", self.default_image_quality);
        println!("Output directory:      {}", self.output_dir.display());
        println!("Access key id:         {}", mask(&self.access_key_id));
        println!("Secret access key:     {}", mask(&self.secret_access_key));
    }
}

/// Names of required credential variables that are currently unset.
pub fn missing_credentials() -> Vec<&'static str> {
    [ACCESS_KEY_ENV, SECRET_KEY_ENV]
        .into_iter()
        .filter(|name| {
            std::env::var(name)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .collect()
}

/// Load the `.env` file from the working directory, if present.
///
/// Existing environment variables are not overridden.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(_) => log::debug!("No .env file found, using process environment only"),
    }
}

fn mask(secret: &str) -> String {
    if secret.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}{}", &secret[..4], "*".repeat(secret.len() - 4))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required environment variable {name} is not set")]
    MissingField { name: &'static str },

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidField {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings with dummy credentials and built-in defaults, for unit tests.
#[cfg(test)]
pub fn test_settings() -> Settings {
    Settings {
        access_key_id: "AKIATESTKEY".to_string(),
        secret_access_key: "test-secret-key".to_string(),
        region: DEFAULT_REGION.to_string(),
        default_model_id: DEFAULT_MODEL_ID.to_string(),
        default_duration_ms: DEFAULT_DURATION_MS,
        default_image_quality: ImageQuality::Standard,
        output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
    }
}
