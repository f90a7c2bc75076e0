//! Output directory management and `.env` provisioning.

use std::path::{Path, PathBuf};

use crate::bedrock::TaskType;

/// Template written by `nova-clip setup` when no `.env` exists.
const ENV_TEMPLATE: &str = include_str!("../.env.example");

/// Directory generated assets are written into.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.root)
    }

    /// Destination path for a job's video.
    ///
    /// Storyboard jobs get a distinct stem so single-prompt and storyboard
    /// runs of the same job id never collide.
    pub fn video_path(&self, task_type: TaskType, job_id: &str) -> PathBuf {
        let stem = match task_type {
            TaskType::TextToVideo => "video",
            TaskType::ImageToVideo => "video_storyboard",
        };
        self.root.join(format!("{}_{}.mp4", stem, job_id))
    }

    /// Destination path for a job's thumbnail.
    pub fn thumbnail_path(&self, task_type: TaskType, job_id: &str) -> PathBuf {
        let stem = match task_type {
            TaskType::TextToVideo => "thumbnail",
            TaskType::ImageToVideo => "thumbnail_storyboard",
        };
        self.root.join(format!("{}_{}.jpg", stem, job_id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Outcome of `.env` provisioning.
#[derive(Debug, PartialEq, Eq)]
pub enum EnvProvision {
    /// A fresh `.env` was written from the template.
    Created(PathBuf),
    /// A `.env` already existed and was left untouched.
    AlreadyExists(PathBuf),
}

/// Write a `.env` template into `dir` unless one already exists.
pub fn provision_env_file(dir: &Path) -> Result<EnvProvision, std::io::Error> {
    let path = dir.join(".env");
    if path.exists() {
        return Ok(EnvProvision::AlreadyExists(path));
    }
    std::fs::write(&path, ENV_TEMPLATE)?;
    Ok(EnvProvision::Created(path))
}
