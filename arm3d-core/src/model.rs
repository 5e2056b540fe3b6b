/// Articulated model walker: composes every segment's cumulative transform
/// from the current joint angles and renders the hierarchy in order.
use log::{debug, warn};
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::joint::{ArmCommand, ArticulatedModelState};
use crate::segment::{RenderBackend, SegmentId, SegmentRenderer};
use crate::transform::TransformStack;

/// Which arm hierarchy to walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmKind {
    /// base, arm1, arm2, palm and two fingers
    #[default]
    MultiJoint,
    /// arm1 and arm2 joined by a single elbow
    SingleJoint,
}

impl ArmKind {
    /// Segments in traversal order
    pub fn segments(self) -> &'static [SegmentId] {
        match self {
            ArmKind::MultiJoint => &SegmentId::ALL,
            ArmKind::SingleJoint => &[SegmentId::Arm1, SegmentId::Arm2],
        }
    }

    /// Whether the command drives a joint this arm has
    pub fn accepts(self, command: ArmCommand) -> bool {
        match self {
            ArmKind::MultiJoint => true,
            ArmKind::SingleJoint => matches!(
                command,
                ArmCommand::Arm1Left
                    | ArmCommand::Arm1Right
                    | ArmCommand::Arm2Up
                    | ArmCommand::Arm2Down
            ),
        }
    }

    pub fn initial_state(self) -> ArticulatedModelState {
        match self {
            ArmKind::MultiJoint => ArticulatedModelState::default(),
            ArmKind::SingleJoint => ArticulatedModelState::new(90.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Attachment offsets and fixed placement of the arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmDimensions {
    /// World-space y of the bottom of the arm
    pub base_offset: f32,
    pub base_height: f32,
    pub arm1_length: f32,
    pub arm2_length: f32,
    pub palm_length: f32,
    /// Lateral (z) offset of each finger from the palm centre
    pub finger_offset: f32,
    /// x/z scale applied to arm2
    pub arm2_thickness: f32,
}

impl Default for ArmDimensions {
    fn default() -> Self {
        Self {
            base_offset: -12.0,
            base_height: 2.0,
            arm1_length: 10.0,
            arm2_length: 10.0,
            palm_length: 2.0,
            finger_offset: 2.0,
            arm2_thickness: 1.3,
        }
    }
}

/// Cumulative transform a segment was rendered with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPose {
    pub segment: SegmentId,
    pub model: Matrix4<f32>,
}

/// Outcome of rendering one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub drawn: Vec<SegmentId>,
    pub skipped: Vec<SegmentId>,
}

/// The jointed arm hierarchy
#[derive(Debug, Clone)]
pub struct ArmModel {
    pub kind: ArmKind,
    pub dimensions: ArmDimensions,
    /// Let arm2's thickening scale carry over to palm and fingers
    pub propagate_arm2_scale: bool,
}

impl ArmModel {
    pub fn new(kind: ArmKind, dimensions: ArmDimensions) -> Self {
        Self {
            kind,
            dimensions,
            propagate_arm2_scale: true,
        }
    }

    pub fn with_scale_propagation(mut self, propagate: bool) -> Self {
        self.propagate_arm2_scale = propagate;
        self
    }

    /// Walk the hierarchy from identity, calling `visit` with each segment's
    /// cumulative transform. Parents are always visited before children.
    pub fn walk<F>(&self, state: &ArticulatedModelState, mut visit: F) -> Result<()>
    where
        F: FnMut(SegmentId, &Matrix4<f32>),
    {
        let mut stack = TransformStack::new();
        match self.kind {
            ArmKind::MultiJoint => self.walk_multi_joint(&mut stack, state, &mut visit)?,
            ArmKind::SingleJoint => self.walk_single_joint(&mut stack, state, &mut visit)?,
        }
        debug_assert_eq!(stack.depth(), 0);
        Ok(())
    }

    fn walk_multi_joint<F>(
        &self,
        stack: &mut TransformStack,
        state: &ArticulatedModelState,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(SegmentId, &Matrix4<f32>),
    {
        let dims = &self.dimensions;

        stack.translate(0.0, dims.base_offset, 0.0);
        visit(SegmentId::Base, &stack.current());

        stack.translate(0.0, dims.base_height, 0.0);
        stack.rotate(state.arm1, Vector3::y());
        visit(SegmentId::Arm1, &stack.current());

        stack.translate(0.0, dims.arm1_length, 0.0);
        stack.rotate(state.arm2, Vector3::z());
        self.draw_arm2(stack, visit)?;

        stack.translate(0.0, dims.arm2_length, 0.0);
        stack.rotate(state.palm, Vector3::y());
        visit(SegmentId::Palm, &stack.current());

        stack.translate(0.0, dims.palm_length, 0.0);

        // Both fingers hang off the same palm transform
        stack.push();
        stack.translate(0.0, 0.0, dims.finger_offset);
        stack.rotate(state.finger, Vector3::x());
        visit(SegmentId::Finger1, &stack.current());
        stack.pop()?;

        stack.push();
        stack.translate(0.0, 0.0, -dims.finger_offset);
        stack.rotate(-state.finger, Vector3::x());
        visit(SegmentId::Finger2, &stack.current());
        stack.pop()?;

        Ok(())
    }

    fn walk_single_joint<F>(
        &self,
        stack: &mut TransformStack,
        state: &ArticulatedModelState,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(SegmentId, &Matrix4<f32>),
    {
        let dims = &self.dimensions;

        stack.translate(0.0, dims.base_offset, 0.0);
        stack.rotate(state.arm1, Vector3::y());
        visit(SegmentId::Arm1, &stack.current());

        stack.translate(0.0, dims.arm1_length, 0.0);
        stack.rotate(state.arm2, Vector3::z());
        self.draw_arm2(stack, visit)
    }

    /// Arm2 is thickened in x/z. Unless the scale propagates, it only
    /// applies to arm2's own draw.
    fn draw_arm2<F>(&self, stack: &mut TransformStack, visit: &mut F) -> Result<()>
    where
        F: FnMut(SegmentId, &Matrix4<f32>),
    {
        let thickness = self.dimensions.arm2_thickness;
        if self.propagate_arm2_scale {
            stack.scale(thickness, 1.0, thickness);
            visit(SegmentId::Arm2, &stack.current());
        } else {
            stack.push();
            stack.scale(thickness, 1.0, thickness);
            visit(SegmentId::Arm2, &stack.current());
            stack.pop()?;
        }
        Ok(())
    }

    /// Cumulative transform of every segment, in traversal order
    pub fn poses(&self, state: &ArticulatedModelState) -> Result<Vec<SegmentPose>> {
        let mut poses = Vec::with_capacity(self.kind.segments().len());
        self.walk(state, |segment, model| {
            poses.push(SegmentPose {
                segment,
                model: *model,
            });
        })?;
        Ok(poses)
    }

    /// Cumulative transform of a single segment
    pub fn pose(
        &self,
        state: &ArticulatedModelState,
        segment: SegmentId,
    ) -> Result<Option<Matrix4<f32>>> {
        Ok(self
            .poses(state)?
            .into_iter()
            .find(|pose| pose.segment == segment)
            .map(|pose| pose.model))
    }

    /// Walk and draw the whole arm.
    ///
    /// Segments that fail to render are logged and skipped; the rest of the
    /// hierarchy is still drawn.
    pub fn render<B: RenderBackend + ?Sized>(
        &self,
        state: &ArticulatedModelState,
        renderer: &SegmentRenderer<'_>,
        backend: &mut B,
    ) -> Result<FrameReport> {
        let mut report = FrameReport::default();
        self.walk(state, |segment, model| {
            match renderer.render(&mut *backend, segment, model) {
                Ok(_) => report.drawn.push(segment),
                Err(err) => {
                    warn!("skipping {}: {}", segment, err);
                    report.skipped.push(segment);
                }
            }
        })?;
        debug!(
            "frame walked: {} drawn, {} skipped",
            report.drawn.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}

impl Default for ArmModel {
    fn default() -> Self {
        Self::new(ArmKind::MultiJoint, ArmDimensions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometrySet;
    use crate::segment::RecordingBackend;
    use crate::transform::Transform;

    fn close(a: &Matrix4<f32>, b: &Matrix4<f32>) -> bool {
        (a - b).norm() < 1e-4
    }

    fn sample_state() -> ArticulatedModelState {
        ArticulatedModelState::new(33.0, -72.0, 141.0, 27.0)
    }

    #[test]
    fn test_traversal_order() {
        let model = ArmModel::default();
        let order: Vec<_> = model
            .poses(&sample_state())
            .unwrap()
            .iter()
            .map(|pose| pose.segment)
            .collect();
        assert_eq!(order, SegmentId::ALL.to_vec());
    }

    #[test]
    fn test_base_pose_is_fixed_placement_at_zero_angles() {
        let model = ArmModel::default();
        let base = model
            .pose(&ArticulatedModelState::zero(), SegmentId::Base)
            .unwrap()
            .unwrap();
        assert!(close(&base, &Transform::translation_matrix(0.0, -12.0, 0.0)));
    }

    #[test]
    fn test_base_ignores_joint_angles() {
        let model = ArmModel::default();
        let base = model.pose(&sample_state(), SegmentId::Base).unwrap().unwrap();
        assert!(close(&base, &Transform::translation_matrix(0.0, -12.0, 0.0)));
    }

    #[test]
    fn test_cumulative_is_parent_times_local() {
        let model = ArmModel::default();
        let state = sample_state();
        let poses = model.poses(&state).unwrap();
        let arm1 = poses[1].model;
        let arm2 = poses[2].model;

        let local = Transform::translation_matrix(0.0, 10.0, 0.0)
            * Transform::axis_rotation_matrix(state.arm2, Vector3::z())
            * Transform::scale_matrix(1.3, 1.0, 1.3);
        assert!(close(&arm2, &(arm1 * local)));
    }

    #[test]
    fn test_finger2_is_isolated_from_finger1() {
        let model = ArmModel::default();
        let state = sample_state();
        let poses = model.poses(&state).unwrap();
        let palm = poses[3].model;
        let finger2 = poses[5].model;

        // Fresh walk to the branch point, then only finger2's local transform
        let branch = palm * Transform::translation_matrix(0.0, 2.0, 0.0);
        let expected = branch
            * Transform::translation_matrix(0.0, 0.0, -2.0)
            * Transform::axis_rotation_matrix(-state.finger, Vector3::x());
        assert!(close(&finger2, &expected));
    }

    #[test]
    fn test_fingers_mirror_each_other() {
        let model = ArmModel::default();
        let state = ArticulatedModelState::new(0.0, 0.0, 0.0, 30.0);
        let poses = model.poses(&state).unwrap();
        let f1 = poses[4].model.transform_point(&nalgebra::Point3::new(0.0, 2.0, 0.0));
        let f2 = poses[5].model.transform_point(&nalgebra::Point3::new(0.0, 2.0, 0.0));
        assert!((f1.x - f2.x).abs() < 1e-4);
        assert!((f1.y - f2.y).abs() < 1e-4);
        assert!((f1.z + f2.z).abs() < 1e-4);
    }

    #[test]
    fn test_walk_is_idempotent() {
        let model = ArmModel::default();
        let state = sample_state();
        let first = model.poses(&state).unwrap();
        let second = model.poses(&state).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_palm_attachment_at_zero_angles() {
        let model = ArmModel::default();
        let palm = model
            .pose(&ArticulatedModelState::zero(), SegmentId::Palm)
            .unwrap()
            .unwrap();
        // -12 + base 2 + arm1 10 + arm2 10
        let origin = palm.transform_point(&nalgebra::Point3::origin());
        assert!((origin - nalgebra::Point3::new(0.0, 10.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn test_scale_propagates_by_default() {
        let model = ArmModel::default();
        let palm = model
            .pose(&ArticulatedModelState::zero(), SegmentId::Palm)
            .unwrap()
            .unwrap();
        let x_axis = palm.transform_vector(&Vector3::x());
        assert!((x_axis.norm() - 1.3).abs() < 1e-4);
    }

    #[test]
    fn test_scale_contained_to_arm2() {
        let model = ArmModel::default().with_scale_propagation(false);
        let state = ArticulatedModelState::zero();
        let poses = model.poses(&state).unwrap();

        let arm2_x = poses[2].model.transform_vector(&Vector3::x());
        let palm_x = poses[3].model.transform_vector(&Vector3::x());
        assert!((arm2_x.norm() - 1.3).abs() < 1e-4);
        assert!((palm_x.norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_render_draws_every_segment() {
        let model = ArmModel::default();
        let geometry = GeometrySet::for_arm(model.kind, &model.dimensions);
        let view_projection = Transform::scale_matrix(0.1, 0.1, 0.1);
        let renderer = SegmentRenderer::new(view_projection, &geometry);
        let mut backend = RecordingBackend::new();

        let state = sample_state();
        let report = model.render(&state, &renderer, &mut backend).unwrap();
        assert_eq!(report.drawn, SegmentId::ALL.to_vec());
        assert!(report.skipped.is_empty());

        let poses = model.poses(&state).unwrap();
        for ((segment, uniforms), pose) in backend.draws.iter().zip(&poses) {
            assert_eq!(*segment, pose.segment);
            assert_eq!(uniforms.model, pose.model);
            assert!(close(&uniforms.mvp, &(view_projection * pose.model)));
        }
    }

    #[test]
    fn test_render_skips_missing_geometry_and_continues() {
        let model = ArmModel::default();
        let mut geometry = GeometrySet::for_arm(model.kind, &model.dimensions);
        geometry.remove(SegmentId::Arm2);
        let renderer = SegmentRenderer::new(Matrix4::identity(), &geometry);
        let mut backend = RecordingBackend::new();

        let report = model
            .render(&ArticulatedModelState::default(), &renderer, &mut backend)
            .unwrap();
        assert_eq!(report.skipped, vec![SegmentId::Arm2]);
        assert_eq!(report.drawn.len(), 5);
        assert!(!backend.segments().contains(&SegmentId::Arm2));
        assert_eq!(backend.segments().last(), Some(&SegmentId::Finger2));
    }

    #[test]
    fn test_single_joint_arm() {
        let model = ArmModel::new(ArmKind::SingleJoint, ArmDimensions::default());
        let state = ArmKind::SingleJoint.initial_state();
        let poses = model.poses(&state).unwrap();
        assert_eq!(poses.len(), 2);

        let arm1 = Transform::translation_matrix(0.0, -12.0, 0.0)
            * Transform::axis_rotation_matrix(90.0, Vector3::y());
        assert!(close(&poses[0].model, &arm1));

        let arm2 = arm1
            * Transform::translation_matrix(0.0, 10.0, 0.0)
            * Transform::scale_matrix(1.3, 1.0, 1.3);
        assert!(close(&poses[1].model, &arm2));
    }

    #[test]
    fn test_single_joint_ignores_hand_commands() {
        assert!(ArmKind::SingleJoint.accepts(ArmCommand::Arm2Up));
        assert!(!ArmKind::SingleJoint.accepts(ArmCommand::PalmLeft));
        assert!(!ArmKind::SingleJoint.accepts(ArmCommand::FingerOpen));
        assert!(ArmKind::MultiJoint.accepts(ArmCommand::FingerClose));
    }
}
