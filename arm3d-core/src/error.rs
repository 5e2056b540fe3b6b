/// Error types shared by the walker, renderer and configuration loader
use crate::segment::SegmentId;

/// Errors raised while composing, rendering or configuring the arm
#[derive(Debug, thiserror::Error)]
pub enum ArmError {
    /// The segment has no mesh registered; its draw is skipped.
    #[error("missing geometry for segment {0}")]
    MissingGeometry(SegmentId),

    /// The cumulative transform could not be inverted for the normal matrix.
    #[error("singular model transform for segment {0}")]
    SingularTransform(SegmentId),

    /// `pop` without a matching `push`. Indicates a walker bug.
    #[error("transform stack underflow")]
    StackUnderflow,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArmError {
    /// Whether the walk may continue after this error.
    ///
    /// Per-segment failures only skip that segment's draw. Everything else
    /// aborts the frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArmError::MissingGeometry(_) | ArmError::SingularTransform(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ArmError>;
