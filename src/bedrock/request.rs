//! Generation request assembly.
//!
//! Turns CLI input plus configured defaults into the JSON payload the
//! Bedrock video model expects. Building a request is pure: the same input
//! always produces the same request, including the seed, which is derived
//! from the prompt text unless one is given explicitly.

use base64::Engine;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::config::{ImageQuality, Settings};

use super::storyboard::{Storyboard, MANIFEST_FILE};

/// Prompt used by `generate` when none is given on the command line.
pub const DEFAULT_PROMPT: &str = "A cat playing with a ball in a sunny garden";

/// Aspect ratio sent with every request.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

const JOB_TYPE: &str = "video-generation";

/// The kind of generation job, matching the service's task types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    /// Single-prompt generation.
    TextToVideo,
    /// Multi-shot generation driven by a storyboard.
    ImageToVideo,
}

impl TaskType {
    /// Wire representation of the task type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::TextToVideo => "text-to-video",
            TaskType::ImageToVideo => "image-to-video",
        }
    }
}

/// A fully-resolved request, ready to be submitted.
///
/// When a storyboard is present, each shot carries its own duration
/// (falling back to the default per shot); the request-level duration is
/// not applied to individual shots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model_id: String,
    pub task_type: TaskType,
    /// For storyboard requests this holds the newline-joined shot prompts
    /// and is used for seed derivation and logging only.
    pub prompt: String,
    pub storyboard: Option<Storyboard>,
    pub duration_ms: u64,
    pub quality: ImageQuality,
    pub aspect_ratio: String,
    pub seed: u32,
}

/// Per-invocation overrides collected from the command line. Anything left
/// `None` falls back to the configured default.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub model_id: Option<String>,
    pub duration_ms: Option<u64>,
    pub quality: Option<ImageQuality>,
    pub seed: Option<u32>,
}

impl GenerationRequest {
    /// Build a single-prompt request, applying defaults from settings.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyPrompt` when the prompt is empty or
    /// whitespace-only.
    pub fn from_prompt(
        prompt: &str,
        overrides: &RequestOverrides,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        validate_prompt(prompt)?;
        let prompt = prompt.trim().to_string();
        let seed = overrides.seed.unwrap_or_else(|| derive_seed(&prompt));

        Ok(Self {
            model_id: overrides
                .model_id
                .clone()
                .unwrap_or_else(|| settings.default_model_id.clone()),
            task_type: TaskType::TextToVideo,
            prompt,
            storyboard: None,
            duration_ms: overrides.duration_ms.unwrap_or(settings.default_duration_ms),
            quality: overrides.quality.unwrap_or(settings.default_image_quality),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            seed,
        })
    }

    /// Build a storyboard request, applying defaults from settings.
    ///
    /// The storyboard is re-validated so callers constructing one by hand
    /// get the same guarantees as manifest loading.
    pub fn from_storyboard(
        storyboard: Storyboard,
        overrides: &RequestOverrides,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let storyboard = Storyboard::from_shots(storyboard.shots)?;
        let prompt = storyboard
            .shots
            .iter()
            .map(|shot| shot.prompt.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let seed = overrides.seed.unwrap_or_else(|| derive_seed(&prompt));

        Ok(Self {
            model_id: overrides
                .model_id
                .clone()
                .unwrap_or_else(|| settings.default_model_id.clone()),
            task_type: TaskType::ImageToVideo,
            prompt,
            storyboard: Some(storyboard),
            duration_ms: overrides.duration_ms.unwrap_or(settings.default_duration_ms),
            quality: overrides.quality.unwrap_or(settings.default_image_quality),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            seed,
        })
    }

    /// Serialize this request into the wire payload, reading and encoding
    /// any referenced shot images.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ImageRead` when a reference image cannot
    /// be read from disk.
    pub fn to_payload(&self) -> Result<StartJobPayload, ValidationError> {
        let storyboard = match self.storyboard {
            Some(ref storyboard) => {
                let mut shots = Vec::with_capacity(storyboard.shots.len());
                for shot in &storyboard.shots {
                    let image = match shot.image {
                        Some(ref path) => {
                            let bytes = std::fs::read(path).map_err(|source| {
                                ValidationError::ImageRead {
                                    path: path.clone(),
                                    source,
                                }
                            })?;
                            Some(base64::engine::general_purpose::STANDARD.encode(bytes))
                        }
                        None => None,
                    };
                    shots.push(ShotPayload {
                        prompt: shot.prompt.clone(),
                        base64_encoded_image: image,
                        duration: shot.duration_ms.unwrap_or(self.duration_ms),
                    });
                }
                Some(shots)
            }
            None => None,
        };

        Ok(StartJobPayload {
            prompt: match self.task_type {
                TaskType::TextToVideo => Some(self.prompt.clone()),
                TaskType::ImageToVideo => None,
            },
            storyboard,
            seed: self.seed,
            duration: self.duration_ms,
            aspect_ratio: self.aspect_ratio.clone(),
            job_type: JOB_TYPE,
            task_type: self.task_type.as_str(),
            image_quality: self.quality.as_str(),
        })
    }
}

/// Validate a prompt before building a request.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    if prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    Ok(())
}

/// Derive a deterministic seed from prompt text.
///
/// First four bytes of the SHA-256 digest, big-endian. Same text always
/// yields the same seed.
pub fn derive_seed(text: &str) -> u32 {
    let digest = Sha256::digest(text.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Request body for starting a generation job.
#[derive(Debug, Serialize)]
pub struct StartJobPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storyboard: Option<Vec<ShotPayload>>,
    seed: u32,
    duration: u64,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    #[serde(rename = "jobType")]
    job_type: &'static str,
    #[serde(rename = "taskType")]
    task_type: &'static str,
    #[serde(rename = "imageQuality")]
    image_quality: &'static str,
}

/// One storyboard entry in the wire payload.
#[derive(Debug, Serialize)]
pub struct ShotPayload {
    prompt: String,
    #[serde(rename = "base64EncodedImage", skip_serializing_if = "Option::is_none")]
    base64_encoded_image: Option<String>,
    duration: u64,
}

/// Errors for malformed request input.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Storyboard has no shots")]
    EmptyStoryboard,

    #[error("Storyboard shot {index} has a blank prompt")]
    BlankShotPrompt { index: usize },

    #[error("Reference image not found: {}", .path.display())]
    MissingImage { path: PathBuf },

    #[error("Failed to read reference image '{}': {}", .path.display(), .source)]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No {} manifest in '{}'", MANIFEST_FILE, .dir.display())]
    MissingManifest { dir: PathBuf },

    #[error("Failed to read storyboard manifest '{}': {}", .path.display(), .source)]
    ManifestIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse storyboard manifest '{}': {}", .path.display(), .source)]
    ManifestParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
