// Copyright @yucwang 2023

use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;

/// Result of a nearest-hit query: where the ray met the scene and the
/// local geometry needed to shade there. Lives on the stack for one
/// estimate and is consumed immediately.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceIntersection {
    p: Vector3f,
    sh_frame: Frame,
    geo_frame: Frame,
    uv: Vector2f,
    t: Float,
    surface_index: Option<usize>,
}

impl SurfaceIntersection {
    pub fn new(p: Vector3f,
               sh_normal: Vector3f,
               geo_normal: Vector3f,
               uv: Vector2f,
               t: Float) -> Self {
        Self {
            p,
            sh_frame: Frame::from_normal(&sh_normal),
            geo_frame: Frame::from_normal(&geo_normal),
            uv,
            t,
            surface_index: None,
        }
    }

    pub fn p(&self) -> Vector3f {
        self.p
    }

    pub fn t(&self) -> Float {
        self.t
    }

    pub fn uv(&self) -> Vector2f {
        self.uv
    }

    pub fn sh_normal(&self) -> Vector3f {
        self.sh_frame.n
    }

    pub fn geo_normal(&self) -> Vector3f {
        self.geo_frame.n
    }

    pub fn sh_frame(&self) -> &Frame {
        &self.sh_frame
    }

    pub fn geo_frame(&self) -> &Frame {
        &self.geo_frame
    }

    /// Express a world direction in the local shading frame.
    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        self.sh_frame.to_local(v)
    }

    /// Express a local shading-frame direction in world space.
    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.sh_frame.to_world(v)
    }

    pub fn surface_index(&self) -> Option<usize> {
        self.surface_index
    }

    pub fn with_surface_index(mut self, surface_index: usize) -> Self {
        self.surface_index = Some(surface_index);
        self
    }
}
