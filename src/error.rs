use thiserror::Error;

use crate::session::{WorkflowEvent, WorkflowState};

/// Library error type for mask compositing and the replacement workflow.
#[derive(Debug, Error)]
pub enum Error {
    /// Image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// A decoded image has no pixels.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// An asset violates the configured format or size policy.
    #[error("asset rejected: {0}")]
    Validation(String),

    /// Transform scale must be finite and strictly positive.
    #[error("invalid scale {0}: must be finite and greater than zero")]
    InvalidScale(f32),

    /// Transform offsets must be finite.
    #[error("invalid offset ({x}, {y}): must be finite")]
    InvalidOffset { x: f32, y: f32 },

    /// A render or commit was requested without both images present.
    #[error("missing {0} image")]
    MissingAsset(&'static str),

    /// The workflow does not accept this event in its current state.
    #[error("cannot {event} while {state}")]
    InvalidTransition {
        state: WorkflowState,
        event: WorkflowEvent,
    },

    /// Export was requested with neither a committed composite nor a mask.
    #[error("nothing to export")]
    NothingToExport,

    /// The resampler rejected the requested resize.
    #[error("resample failed: {0}")]
    Resample(String),

    /// Encoding a frame to PNG failed.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Background decode task did not complete.
    #[error("decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
