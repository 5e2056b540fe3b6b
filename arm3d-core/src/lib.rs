/// ARM3D Core Library - Hierarchical transforms for an articulated arm
///
/// This library composes the cumulative model transform of every rigid
/// segment of a jointed robot arm from its joint angles, and hands each
/// segment to a pluggable rendering backend.

pub mod config;
pub mod error;
pub mod geometry;
pub mod joint;
pub mod model;
pub mod projection;
pub mod segment;
pub mod transform;

// Re-export commonly used types
pub use config::{ArmConfig, CameraConfig};
pub use error::{ArmError, Result};
pub use geometry::{GeometrySet, Mesh, Triangle, Vertex};
pub use joint::{AnglePolicy, ArmCommand, ArticulatedModelState, JointLimit};
pub use model::{ArmDimensions, ArmKind, ArmModel, FrameReport, SegmentPose};
pub use projection::{Camera, ProjectionMode};
pub use segment::{RecordingBackend, RenderBackend, SegmentId, SegmentRenderer, SegmentUniforms};
pub use transform::{Transform, TransformStack};
