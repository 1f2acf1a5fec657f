// Copyright @yucwang 2023

use crate::core::interaction::SurfaceIntersection;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

/// Point drawn uniformly (per surface area) from a shape.
#[derive(Debug, Clone, Copy)]
pub struct PositionSample {
    pub p: Vector3f,
    pub n: Vector3f,
    pub uv: Vector2f,
    /// Density over surface area.
    pub pdf_area: Float,
}

pub trait Shape: Send + Sync {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection>;

    /// Existence-only query for shadow rays.
    fn ray_intersection_t(&self, ray: &Ray3f) -> bool;

    /// Sample a position with density proportional to surface area.
    fn sample_position(&self, u: &Vector2f) -> PositionSample;

    /// Area density `sample_position` uses for a point on the shape.
    fn pdf_position(&self, p: &Vector3f) -> Float;

    fn surface_area(&self) -> Float;
}
