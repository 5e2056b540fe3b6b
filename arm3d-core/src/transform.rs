/// 3D transformation matrices and the cumulative transform stack
use log::trace;
use nalgebra::{Matrix4, Rotation3, Unit, Vector3};

use crate::error::{ArmError, Result};

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix of `degrees` around `axis` (right-handed)
    pub fn axis_rotation_matrix(degrees: f32, axis: Vector3<f32>) -> Matrix4<f32> {
        let axis = Unit::new_normalize(axis);
        Rotation3::from_axis_angle(&axis, degrees.to_radians()).to_homogeneous()
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Model-view-projection matrix from a per-frame view-projection
    pub fn mvp_matrix(view_projection: &Matrix4<f32>, model: &Matrix4<f32>) -> Matrix4<f32> {
        view_projection * model
    }

    /// Transpose of the inverse of `model`, or `None` when `model` is singular.
    ///
    /// Normals must go through this matrix rather than the model matrix
    /// whenever the model carries a nonuniform scale.
    pub fn normal_matrix(model: &Matrix4<f32>) -> Option<Matrix4<f32>> {
        model.try_inverse().map(|inverse| inverse.transpose())
    }
}

/// Cumulative model transform with save/restore for branch points.
///
/// Saved entries are copies: composing onto the current transform after a
/// `push` never changes what the matching `pop` restores.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Matrix4<f32>,
    saved: Vec<Matrix4<f32>>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            current: Matrix4::identity(),
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> Matrix4<f32> {
        self.current
    }

    /// Number of saved transforms
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Post-multiply the current transform: `current = current * local`
    pub fn compose(&mut self, local: &Matrix4<f32>) {
        self.current = self.current * local;
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.compose(&Transform::translation_matrix(x, y, z));
    }

    pub fn rotate(&mut self, degrees: f32, axis: Vector3<f32>) {
        self.compose(&Transform::axis_rotation_matrix(degrees, axis));
    }

    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.compose(&Transform::scale_matrix(sx, sy, sz));
    }

    /// Save a copy of the current transform
    pub fn push(&mut self) {
        self.saved.push(self.current);
        trace!("transform stack push, depth {}", self.saved.len());
    }

    /// Restore the most recently saved transform
    pub fn pop(&mut self) -> Result<()> {
        self.current = self.saved.pop().ok_or(ArmError::StackUnderflow)?;
        trace!("transform stack pop, depth {}", self.saved.len());
        Ok(())
    }

    /// Back to identity with nothing saved
    pub fn reset(&mut self) {
        self.current = Matrix4::identity();
        self.saved.clear();
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::axis_rotation_matrix(0.0, Vector3::y());
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_uses_degrees() {
        let matrix = Transform::axis_rotation_matrix(90.0, Vector3::y());
        let p = matrix.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_mvp_applies_model_first() {
        let view_projection = Transform::scale_matrix(2.0, 2.0, 2.0);
        let model = Transform::translation_matrix(1.0, 0.0, 0.0);
        let mvp = Transform::mvp_matrix(&view_projection, &model);
        let p = mvp.transform_point(&Point3::origin());
        assert!((p - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_under_nonuniform_scale() {
        let model = Transform::scale_matrix(2.0, 1.0, 1.0);
        let normal = Transform::normal_matrix(&model).unwrap();
        let expected = Transform::scale_matrix(0.5, 1.0, 1.0);
        assert!((normal - expected).norm() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_singular() {
        let model = Transform::scale_matrix(0.0, 1.0, 1.0);
        assert!(Transform::normal_matrix(&model).is_none());
    }

    #[test]
    fn test_compose_post_multiplies() {
        let mut stack = TransformStack::new();
        stack.translate(0.0, 5.0, 0.0);
        stack.rotate(90.0, Vector3::z());
        let expected = Transform::translation_matrix(0.0, 5.0, 0.0)
            * Transform::axis_rotation_matrix(90.0, Vector3::z());
        assert!((stack.current() - expected).norm() < 1e-6);
    }

    #[test]
    fn test_push_stores_a_copy() {
        let mut stack = TransformStack::new();
        stack.translate(1.0, 2.0, 3.0);
        let saved = stack.current();
        stack.push();

        stack.translate(0.0, 0.0, 2.0);
        stack.rotate(45.0, Vector3::x());
        assert!((stack.current() - saved).norm() > 1e-3);

        stack.pop().unwrap();
        assert_eq!(stack.current(), saved);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_nested_push_pop() {
        let mut stack = TransformStack::new();
        stack.push();
        stack.translate(1.0, 0.0, 0.0);
        let inner = stack.current();
        stack.push();
        stack.scale(2.0, 2.0, 2.0);
        assert_eq!(stack.depth(), 2);

        stack.pop().unwrap();
        assert_eq!(stack.current(), inner);
        stack.pop().unwrap();
        assert_eq!(stack.current(), Matrix4::identity());
    }

    #[test]
    fn test_pop_empty_is_underflow() {
        let mut stack = TransformStack::new();
        assert!(matches!(stack.pop(), Err(ArmError::StackUnderflow)));
    }

    #[test]
    fn test_reset() {
        let mut stack = TransformStack::new();
        stack.translate(1.0, 1.0, 1.0);
        stack.push();
        stack.reset();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), Matrix4::identity());
    }
}
