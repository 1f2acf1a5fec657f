// Copyright @yucwang 2026

use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::{PositionSample, Shape};
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

/// Parallelogram spanned by two edge vectors. The normal follows the
/// right-hand rule of `edge_u x edge_v`.
pub struct Rectangle {
    origin: Vector3f,
    edge_u: Vector3f,
    edge_v: Vector3f,
    normal: Vector3f,
    area: Float,
}

impl Rectangle {
    pub fn new(origin: Vector3f, edge_u: Vector3f, edge_v: Vector3f) -> Self {
        let cross = edge_u.cross(&edge_v);
        let area = cross.norm();
        let normal = if area > 0.0 {
            cross / area
        } else {
            Vector3f::new(0.0, 0.0, 1.0)
        };
        Self { origin, edge_u, edge_v, normal, area }
    }

    pub fn normal(&self) -> Vector3f {
        self.normal
    }

    /// Plane hit plus parallelogram coordinates in [0,1]^2.
    fn intersect_plane(&self, ray: &Ray3f) -> Option<(Float, Vector2f)> {
        let denom = ray.dir().dot(&self.normal);
        if denom.abs() < 1e-8 {
            return None;
        }
        let t = (self.origin - ray.origin()).dot(&self.normal) / denom;
        if !ray.test_segment(t) {
            return None;
        }

        let d = ray.at(t) - self.origin;
        let g11 = self.edge_u.dot(&self.edge_u);
        let g12 = self.edge_u.dot(&self.edge_v);
        let g22 = self.edge_v.dot(&self.edge_v);
        let det = g11 * g22 - g12 * g12;
        if det.abs() < 1e-12 {
            return None;
        }
        let du = d.dot(&self.edge_u);
        let dv = d.dot(&self.edge_v);
        let alpha = (g22 * du - g12 * dv) / det;
        let beta = (g11 * dv - g12 * du) / det;
        if alpha < -EPSILON || alpha > 1.0 + EPSILON || beta < -EPSILON || beta > 1.0 + EPSILON {
            return None;
        }
        Some((t, Vector2f::new(alpha.max(0.0).min(1.0), beta.max(0.0).min(1.0))))
    }
}

impl Shape for Rectangle {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let (t, uv) = self.intersect_plane(ray)?;
        Some(SurfaceIntersection::new(ray.at(t), self.normal, self.normal, uv, t))
    }

    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.intersect_plane(ray).is_some()
    }

    fn sample_position(&self, u: &Vector2f) -> PositionSample {
        PositionSample {
            p: self.origin + self.edge_u * u.x + self.edge_v * u.y,
            n: self.normal,
            uv: *u,
            pdf_area: if self.area > 0.0 { 1.0 / self.area } else { 0.0 },
        }
    }

    fn pdf_position(&self, _p: &Vector3f) -> Float {
        if self.area > 0.0 {
            1.0 / self.area
        } else {
            0.0
        }
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect() -> Rectangle {
        Rectangle::new(
            Vector3f::new(-1.0, -1.0, 0.0),
            Vector3f::new(2.0, 0.0, 0.0),
            Vector3f::new(0.0, 2.0, 0.0),
        )
    }

    #[test]
    fn test_rectangle_intersection() {
        let rect = unit_rect();
        assert_eq!(rect.surface_area(), 4.0);

        let ray = Ray3f::new(Vector3f::new(0.5, -0.5, 3.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit = rect.ray_intersection(&ray).expect("expected hit");
        assert!((hit.t() - 3.0).abs() < 1e-5);
        assert!((hit.p() - Vector3f::new(0.5, -0.5, 0.0)).norm() < 1e-5);
        assert!((hit.geo_normal() - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);

        // Outside the parallelogram.
        let ray = Ray3f::new(Vector3f::new(1.5, 0.0, 3.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(rect.ray_intersection(&ray).is_none());
        assert!(!rect.ray_intersection_t(&ray));

        // Parallel ray.
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 1.0),
                             Vector3f::new(1.0, 0.0, 0.0), None, None);
        assert!(rect.ray_intersection(&ray).is_none());
    }

    #[test]
    fn test_rectangle_sampling() {
        let rect = unit_rect();
        let sample = rect.sample_position(&Vector2f::new(0.25, 0.75));
        assert!((sample.p - Vector3f::new(-0.5, 0.5, 0.0)).norm() < 1e-5);
        assert!((sample.pdf_area - 0.25).abs() < 1e-6);
        assert_eq!(sample.n, Vector3f::new(0.0, 0.0, 1.0));
        assert!((rect.pdf_position(&sample.p) - 0.25).abs() < 1e-6);
    }
}
