/// Scene configuration, loadable from JSON
use std::fs;
use std::path::Path;

use log::info;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ArmError, Result};
use crate::joint::{AnglePolicy, ArticulatedModelState, JointLimit};
use crate::model::{ArmDimensions, ArmKind, ArmModel};
use crate::projection::{Camera, ProjectionMode};

/// Camera placement in config-file form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub orthographic: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [20.0, 10.0, 30.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 50.0,
            near: 1.0,
            far: 100.0,
            orthographic: false,
        }
    }
}

impl CameraConfig {
    pub fn camera(&self, width: u32, height: u32) -> Camera {
        let mut camera = Camera::new(width, height);
        camera.position = Point3::from(self.eye);
        camera.target = Point3::from(self.target);
        camera.up = Vector3::from(self.up);
        camera.fov = self.fov_degrees.to_radians();
        camera.near = self.near;
        camera.far = self.far;
        camera.mode = if self.orthographic {
            ProjectionMode::Orthographic
        } else {
            ProjectionMode::Perspective
        };
        camera
    }
}

/// Everything needed to set up an arm scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    pub kind: ArmKind,
    pub dimensions: ArmDimensions,
    pub policy: AnglePolicy,
    pub camera: CameraConfig,
    /// Starting angles; the arm kind's default pose when absent
    pub initial: Option<ArticulatedModelState>,
    pub propagate_arm2_scale: bool,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            kind: ArmKind::default(),
            dimensions: ArmDimensions::default(),
            policy: AnglePolicy::default(),
            camera: CameraConfig::default(),
            initial: None,
            propagate_arm2_scale: true,
        }
    }
}

impl ArmConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!("loaded arm configuration from {}", path.display());
        Ok(config)
    }

    pub fn model(&self) -> ArmModel {
        ArmModel::new(self.kind, self.dimensions).with_scale_propagation(self.propagate_arm2_scale)
    }

    pub fn initial_state(&self) -> ArticulatedModelState {
        self.initial.unwrap_or_else(|| self.kind.initial_state())
    }

    pub fn validate(&self) -> Result<()> {
        let dims = &self.dimensions;
        let lengths = [
            ("base_height", dims.base_height),
            ("arm1_length", dims.arm1_length),
            ("arm2_length", dims.arm2_length),
            ("palm_length", dims.palm_length),
            ("arm2_thickness", dims.arm2_thickness),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(ArmError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        if !(self.policy.step.is_finite() && self.policy.step > 0.0) {
            return Err(ArmError::Config(format!(
                "angle step must be positive, got {}",
                self.policy.step
            )));
        }

        let limits = [
            ("arm1", self.policy.arm1),
            ("arm2", self.policy.arm2),
            ("palm", self.policy.palm),
            ("finger", self.policy.finger),
        ];
        for (name, limit) in limits {
            if let JointLimit::Clamp { min, max } = limit {
                if !(min < max) {
                    return Err(ArmError::Config(format!(
                        "{name} clamp range [{min}, {max}] is empty"
                    )));
                }
            }
        }

        let state = self.initial_state();
        let angles = [
            ("arm1", state.arm1, self.policy.arm1),
            ("arm2", state.arm2, self.policy.arm2),
            ("palm", state.palm, self.policy.palm),
            ("finger", state.finger, self.policy.finger),
        ];
        for (name, angle, limit) in angles {
            if !limit.contains(angle) {
                return Err(ArmError::Config(format!(
                    "initial {name} angle {angle} is outside its limit {limit:?}"
                )));
            }
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(ArmError::Config(format!(
                "camera planes must satisfy 0 < near < far, got {} and {}",
                camera.near, camera.far
            )));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ArmError::Config(format!(
                "fov must be within (0, 180) degrees, got {}",
                camera.fov_degrees
            )));
        }
        if camera.eye == camera.target {
            return Err(ArmError::Config("camera eye and target coincide".to_string()));
        }
        let forward = Vector3::from(camera.target) - Vector3::from(camera.eye);
        if forward.cross(&Vector3::from(camera.up)).norm() <= f32::EPSILON * forward.norm() {
            return Err(ArmError::Config(
                "camera up vector is zero or parallel to the view direction".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ArmConfig::default();
        config.validate().unwrap();
        assert_eq!(config.initial_state(), ArticulatedModelState::new(90.0, 45.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ArmConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ArmConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let json = r#"{
            "kind": "single_joint",
            "dimensions": { "arm1_length": 8.0 },
            "policy": { "step": 5.0, "arm2": { "mode": "clamp", "min": -90.0, "max": 90.0 } },
            "propagate_arm2_scale": false
        }"#;
        let config = ArmConfig::from_json_str(json).unwrap();
        assert_eq!(config.kind, ArmKind::SingleJoint);
        assert_eq!(config.dimensions.arm1_length, 8.0);
        assert_eq!(config.dimensions.arm2_length, 10.0);
        assert_eq!(config.policy.step, 5.0);
        assert_eq!(config.policy.arm1, JointLimit::Wrap);
        assert_eq!(config.policy.arm2, JointLimit::Clamp { min: -90.0, max: 90.0 });
        assert_eq!(config.initial_state(), ArticulatedModelState::new(90.0, 0.0, 0.0, 0.0));
        assert!(!config.model().propagate_arm2_scale);
    }

    #[test]
    fn test_initial_state_override() {
        let json = r#"{ "initial": { "arm1": 10.0, "finger": 12.0 } }"#;
        let config = ArmConfig::from_json_str(json).unwrap();
        assert_eq!(config.initial_state(), ArticulatedModelState::new(10.0, 45.0, 0.0, 12.0));
    }

    #[test]
    fn test_rejects_empty_clamp_range() {
        let json = r#"{ "policy": { "finger": { "mode": "clamp", "min": 10.0, "max": -10.0 } } }"#;
        assert!(matches!(ArmConfig::from_json_str(json), Err(ArmError::Config(_))));
    }

    #[test]
    fn test_rejects_initial_angles_outside_clamp() {
        let json = r#"{ "initial": { "arm2": 200.0, "finger": -90.0 } }"#;
        assert!(matches!(ArmConfig::from_json_str(json), Err(ArmError::Config(_))));

        let json = r#"{ "initial": { "arm2": 135.0, "finger": -60.0 } }"#;
        let config = ArmConfig::from_json_str(json).unwrap();
        let mut state = config.initial_state();
        assert!(state.apply(crate::joint::ArmCommand::Arm2Down, &config.policy));
        assert!(state.apply(crate::joint::ArmCommand::FingerOpen, &config.policy));
    }

    #[test]
    fn test_rejects_default_pose_outside_custom_clamp() {
        // The multi-joint arm starts with arm2 at 45
        let json = r#"{ "policy": { "arm2": { "mode": "clamp", "min": -30.0, "max": 30.0 } } }"#;
        assert!(matches!(ArmConfig::from_json_str(json), Err(ArmError::Config(_))));
    }

    #[test]
    fn test_wrapped_initial_angles_accepted() {
        let json = r#"{ "initial": { "arm1": 720.0, "palm": -400.0 } }"#;
        assert!(ArmConfig::from_json_str(json).is_ok());
    }

    #[test]
    fn test_rejects_up_parallel_to_view() {
        let json = r#"{ "camera": { "eye": [0.0, 10.0, 0.0], "target": [0.0, 0.0, 0.0] } }"#;
        assert!(matches!(ArmConfig::from_json_str(json), Err(ArmError::Config(_))));

        let json = r#"{ "camera": { "up": [0.0, 0.0, 0.0] } }"#;
        assert!(matches!(ArmConfig::from_json_str(json), Err(ArmError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_camera_planes() {
        let json = r#"{ "camera": { "near": 50.0, "far": 10.0 } }"#;
        assert!(matches!(ArmConfig::from_json_str(json), Err(ArmError::Config(_))));
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let json = r#"{ "policy": { "step": 0.0 } }"#;
        assert!(matches!(ArmConfig::from_json_str(json), Err(ArmError::Config(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(ArmConfig::from_json_str("{ kind: "), Err(ArmError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ArmConfig::load("/nonexistent/arm3d/config.json");
        assert!(matches!(result, Err(ArmError::Io(_))));
    }

    #[test]
    fn test_camera_from_config() {
        let config = CameraConfig {
            orthographic: true,
            ..CameraConfig::default()
        };
        let camera = config.camera(100, 50);
        assert_eq!(camera.mode, ProjectionMode::Orthographic);
        assert!((camera.aspect - 2.0).abs() < 1e-6);
        assert_eq!(camera.position, Point3::new(20.0, 10.0, 30.0));
    }
}
