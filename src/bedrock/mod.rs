//! Amazon Bedrock video-generation integration.
//!
//! Request assembly, job submission and polling, asset download, and
//! error-to-guidance mapping for the Bedrock runtime video model.

mod client;
mod report;
mod request;
mod retry;
mod storyboard;

pub use client::{
    interrupt_received, setup_interrupt_handler, BedrockClient, BedrockError, GenerationResult,
    JobHandle, JobOutcome, JobStatus, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
pub use report::describe;
pub use request::{
    derive_seed, validate_prompt, GenerationRequest, RequestOverrides, TaskType, ValidationError,
    DEFAULT_PROMPT,
};
pub use storyboard::{Shot, Storyboard, MANIFEST_FILE};
