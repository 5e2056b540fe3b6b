/// Rigid segments and the per-segment draw step
use std::fmt;

use log::trace;
use nalgebra::Matrix4;

use crate::error::{ArmError, Result};
use crate::geometry::{GeometrySet, Mesh};
use crate::transform::Transform;

/// A named rigid part of the arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentId {
    Base,
    Arm1,
    Arm2,
    Palm,
    Finger1,
    Finger2,
}

impl SegmentId {
    /// Traversal order of the multi-joint arm
    pub const ALL: [SegmentId; 6] = [
        SegmentId::Base,
        SegmentId::Arm1,
        SegmentId::Arm2,
        SegmentId::Palm,
        SegmentId::Finger1,
        SegmentId::Finger2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SegmentId::Base => "base",
            SegmentId::Arm1 => "arm1",
            SegmentId::Arm2 => "arm2",
            SegmentId::Palm => "palm",
            SegmentId::Finger1 => "finger1",
            SegmentId::Finger2 => "finger2",
        }
    }

    /// Segment whose end transform this one is attached to
    pub fn parent(self) -> Option<SegmentId> {
        match self {
            SegmentId::Base => None,
            SegmentId::Arm1 => Some(SegmentId::Base),
            SegmentId::Arm2 => Some(SegmentId::Arm1),
            SegmentId::Palm => Some(SegmentId::Arm2),
            SegmentId::Finger1 | SegmentId::Finger2 => Some(SegmentId::Palm),
        }
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform inputs for one segment draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentUniforms {
    pub model: Matrix4<f32>,
    pub mvp: Matrix4<f32>,
    pub normal_matrix: Matrix4<f32>,
}

/// The rendering backend that actually binds buffers and draws
pub trait RenderBackend {
    /// Draw `mesh` as an indexed triangle list with the given uniforms
    fn draw_indexed(&mut self, segment: SegmentId, mesh: &Mesh, uniforms: &SegmentUniforms);
}

/// Computes segment uniforms for one frame and issues the draw calls
pub struct SegmentRenderer<'a> {
    view_projection: Matrix4<f32>,
    geometry: &'a GeometrySet,
}

impl<'a> SegmentRenderer<'a> {
    pub fn new(view_projection: Matrix4<f32>, geometry: &'a GeometrySet) -> Self {
        Self {
            view_projection,
            geometry,
        }
    }

    pub fn view_projection(&self) -> &Matrix4<f32> {
        &self.view_projection
    }

    /// Uniforms for drawing a segment at `model`
    pub fn uniforms(&self, segment: SegmentId, model: &Matrix4<f32>) -> Result<SegmentUniforms> {
        let normal_matrix =
            Transform::normal_matrix(model).ok_or(ArmError::SingularTransform(segment))?;
        Ok(SegmentUniforms {
            model: *model,
            mvp: Transform::mvp_matrix(&self.view_projection, model),
            normal_matrix,
        })
    }

    /// Render `segment` at the cumulative transform `model`.
    ///
    /// Nothing is drawn when the segment has no mesh or the transform is
    /// singular.
    pub fn render<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        segment: SegmentId,
        model: &Matrix4<f32>,
    ) -> Result<SegmentUniforms> {
        let mesh = self
            .geometry
            .get(segment)
            .filter(|mesh| !mesh.is_empty())
            .ok_or(ArmError::MissingGeometry(segment))?;
        let uniforms = self.uniforms(segment, model)?;

        trace!("draw {} ({} indices)", segment, mesh.index_count());
        backend.draw_indexed(segment, mesh, &uniforms);
        Ok(uniforms)
    }
}

/// Backend that records draw calls instead of rasterizing them
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub draws: Vec<(SegmentId, SegmentUniforms)>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> Vec<SegmentId> {
        self.draws.iter().map(|(segment, _)| *segment).collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn draw_indexed(&mut self, segment: SegmentId, _mesh: &Mesh, uniforms: &SegmentUniforms) {
        self.draws.push((segment, *uniforms));
    }
}
