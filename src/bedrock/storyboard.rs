//! Storyboard loading and validation.
//!
//! A storyboard is an ordered sequence of shots, each with its own prompt,
//! an optional reference image, and an optional per-shot duration. On disk
//! a storyboard is a directory containing a `storyboard.toml` manifest;
//! image paths in the manifest are resolved relative to that directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::request::ValidationError;

/// Manifest file name expected inside a storyboard directory.
pub const MANIFEST_FILE: &str = "storyboard.toml";

/// A single shot in a multi-shot video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shot {
    /// Text prompt describing the shot.
    pub prompt: String,
    /// Optional reference image, embedded in the request when present.
    pub image: Option<PathBuf>,
    /// Per-shot duration in milliseconds. Falls back to the configured
    /// default duration when absent.
    pub duration_ms: Option<u64>,
}

impl Shot {
    /// Create a shot from a prompt with no image and no explicit duration.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            duration_ms: None,
        }
    }
}

/// An ordered sequence of shots describing a multi-shot video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storyboard {
    pub shots: Vec<Shot>,
}

/// On-disk manifest structure (`[[shot]]` tables).
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "shot")]
    shots: Vec<ManifestShot>,
}

#[derive(Debug, Deserialize)]
struct ManifestShot {
    prompt: String,
    #[serde(default)]
    image: Option<PathBuf>,
    #[serde(default)]
    duration_ms: Option<u64>,
}

impl Storyboard {
    /// Build a storyboard from shots, validating them.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyStoryboard` when no shots are given,
    /// `ValidationError::BlankShotPrompt` when a shot prompt is empty or
    /// whitespace-only, and `ValidationError::MissingImage` when a
    /// referenced image file does not exist.
    pub fn from_shots(shots: Vec<Shot>) -> Result<Self, ValidationError> {
        let storyboard = Self { shots };
        storyboard.validate()?;
        Ok(storyboard)
    }

    /// Load a storyboard from a directory containing a `storyboard.toml`
    /// manifest. Relative image paths are resolved against the directory.
    pub fn load_dir(dir: &Path) -> Result<Self, ValidationError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(ValidationError::MissingManifest {
                dir: dir.to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(&manifest_path).map_err(|source| ValidationError::ManifestIo {
                path: manifest_path.clone(),
                source,
            })?;
        let manifest: Manifest =
            toml::from_str(&content).map_err(|source| ValidationError::ManifestParse {
                path: manifest_path,
                source,
            })?;

        let shots = manifest
            .shots
            .into_iter()
            .map(|shot| Shot {
                prompt: shot.prompt,
                image: shot.image.map(|p| if p.is_absolute() { p } else { dir.join(p) }),
                duration_ms: shot.duration_ms,
            })
            .collect();

        Self::from_shots(shots)
    }

    /// The built-in storyboard used when no directory is given: a four-shot
    /// sequence following a cat through a sunny morning.
    pub fn default_sequence() -> Self {
        Self {
            shots: vec![
                Shot::from_prompt("A cat waking up in a sunny room"),
                Shot::from_prompt("The cat stretches and yawns"),
                Shot::from_prompt("The cat walks to the window"),
                Shot::from_prompt("The cat looks outside at birds flying"),
            ],
        }
    }

    /// Number of shots.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    /// True when the storyboard has no shots.
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.shots.is_empty() {
            return Err(ValidationError::EmptyStoryboard);
        }

        for (index, shot) in self.shots.iter().enumerate() {
            if shot.prompt.trim().is_empty() {
                return Err(ValidationError::BlankShotPrompt { index });
            }
            if let Some(ref image) = shot.image {
                if !image.is_file() {
                    return Err(ValidationError::MissingImage {
                        path: image.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sequence_has_four_shots() {
        let storyboard = Storyboard::default_sequence();
        assert_eq!(storyboard.len(), 4);
        assert!(!storyboard.is_empty());
        assert_eq!(storyboard.shots[0].prompt, "A cat waking up in a sunny room");
    }

    #[test]
    fn from_shots_rejects_empty_list() {
        let result = Storyboard::from_shots(vec![]);
        assert!(matches!(result, Err(ValidationError::EmptyStoryboard)));
    }

    #[test]
    fn from_shots_rejects_blank_prompt() {
        let shots = vec![
            Shot::from_prompt("A valid shot"),
            Shot::from_prompt("   "),
        ];
        let result = Storyboard::from_shots(shots);
        assert!(matches!(
            result,
            Err(ValidationError::BlankShotPrompt { index: 1 })
        ));
    }

    #[test]
    fn from_shots_rejects_missing_image() {
        let shots = vec![Shot {
            prompt: "A shot with a missing image".to_string(),
            image: Some(PathBuf::from("/nonexistent/frame.png")),
            duration_ms: None,
        }];
        let result = Storyboard::from_shots(shots);
        assert!(matches!(result, Err(ValidationError::MissingImage { .. })));
    }

    #[test]
    fn load_dir_requires_manifest() {
        let dir = std::env::temp_dir();
        let result = Storyboard::load_dir(&dir.join("nova-clip-no-such-storyboard"));
        assert!(matches!(
            result,
            Err(ValidationError::MissingManifest { .. })
        ));
    }

    #[test]
    fn shot_from_prompt_has_no_image_or_duration() {
        let shot = Shot::from_prompt("test");
        assert_eq!(shot.prompt, "test");
        assert!(shot.image.is_none());
        assert!(shot.duration_ms.is_none());
    }
}
