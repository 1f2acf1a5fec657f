// Copyright @yucwang 2023

use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::{PositionSample, Shape};
use crate::io::obj_utils;
use crate::io::obj_utils::ObjLoadError;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::distribution::DiscretePdf;
use crate::math::ray::Ray3f;
use crate::math::warp;

use std::vec::Vec;

/// Indexed triangle mesh with optional per-vertex normals and uvs.
/// Position sampling is proportional to triangle area through a
/// discrete distribution over the triangles.
pub struct TriangleMesh {
    vertices: Vec<Vector3f>,
    normals: Vec<Vector3f>,
    uvs: Vec<Vector2f>,
    indices: Vec<[usize; 3]>,
    area_dpdf: DiscretePdf,
    total_area: Float,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Vector3f>, indices: Vec<[usize; 3]>) -> Self {
        let mut mesh = Self {
            vertices,
            normals: Vec::new(),
            uvs: Vec::new(),
            indices,
            area_dpdf: DiscretePdf::new(),
            total_area: 0.0,
        };
        mesh.rebuild_area_distribution();
        mesh
    }

    pub fn with_normals(mut self, normals: Vec<Vector3f>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vector2f>) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn from_obj(path: &str) -> Result<Self, ObjLoadError> {
        let (vertices, normals, uvs, indices) = obj_utils::load_obj_from_file(path)?;
        let mut mesh = Self {
            vertices,
            normals,
            uvs,
            indices,
            area_dpdf: DiscretePdf::new(),
            total_area: 0.0,
        };
        mesh.rebuild_area_distribution();
        Ok(mesh)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn apply_transform(&mut self, scale: &Vector3f, translate: &Vector3f) {
        for v in &mut self.vertices {
            *v = v.component_mul(scale) + translate;
        }
        // Normals pick up the inverse-transpose of a diagonal scale.
        for n in &mut self.normals {
            let scaled = Vector3f::new(n.x / scale.x, n.y / scale.y, n.z / scale.z);
            if scaled.norm() > 0.0 {
                *n = scaled.normalize();
            }
        }
        self.rebuild_area_distribution();
    }

    fn rebuild_area_distribution(&mut self) {
        self.area_dpdf = DiscretePdf::with_capacity(self.indices.len());
        for index in 0..self.indices.len() {
            self.area_dpdf.append(self.triangle_area(index));
        }
        self.total_area = self.area_dpdf.normalize();
    }

    fn triangle_vertices(&self, index: usize) -> (Vector3f, Vector3f, Vector3f) {
        let [i0, i1, i2] = self.indices[index];
        (self.vertices[i0], self.vertices[i1], self.vertices[i2])
    }

    fn triangle_area(&self, index: usize) -> Float {
        let (p0, p1, p2) = self.triangle_vertices(index);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    fn geometric_normal(&self, index: usize) -> Vector3f {
        let (p0, p1, p2) = self.triangle_vertices(index);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Barycentric interpolation of shading normals; falls back to the
    /// geometric normal for meshes without vertex normals.
    fn shading_normal(&self, index: usize, b1: Float, b2: Float) -> Vector3f {
        if self.normals.len() != self.vertices.len() {
            return self.geometric_normal(index);
        }
        let [i0, i1, i2] = self.indices[index];
        let n = self.normals[i0] * (1.0 - b1 - b2)
            + self.normals[i1] * b1
            + self.normals[i2] * b2;
        let norm = n.norm();
        if norm > 0.0 {
            n / norm
        } else {
            self.geometric_normal(index)
        }
    }

    fn interpolated_uv(&self, index: usize, b1: Float, b2: Float) -> Vector2f {
        if self.uvs.len() != self.vertices.len() {
            return Vector2f::new(0.0, 0.0);
        }
        let [i0, i1, i2] = self.indices[index];
        self.uvs[i0] * (1.0 - b1 - b2) + self.uvs[i1] * b1 + self.uvs[i2] * b2
    }

    /// Moeller-Trumbore intersection against one triangle. Returns
    /// (t, b1, b2) of the hit.
    fn intersect_triangle(&self, index: usize, ray: &Ray3f) -> Option<(Float, Float, Float)> {
        let (p0, p1, p2) = self.triangle_vertices(index);
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;

        let pvec = ray.dir().cross(&edge2);
        let det = edge1.dot(&pvec);
        if det > -1e-8 && det < 1e-8 {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin() - p0;
        let b1 = tvec.dot(&pvec) * inv_det;
        if b1 < 0.0 || b1 > 1.0 {
            return None;
        }

        let qvec = tvec.cross(&edge1);
        let b2 = ray.dir().dot(&qvec) * inv_det;
        if b2 < 0.0 || b1 + b2 > 1.0 {
            return None;
        }

        let t = edge2.dot(&qvec) * inv_det;
        if !ray.test_segment(t) {
            return None;
        }
        Some((t, b1, b2))
    }
}

impl Shape for TriangleMesh {
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let mut nearest: Option<(usize, Float, Float, Float)> = None;
        let mut nearest_t = ray.max_t;
        for index in 0..self.indices.len() {
            if let Some((t, b1, b2)) = self.intersect_triangle(index, ray) {
                if t <= nearest_t {
                    nearest_t = t;
                    nearest = Some((index, t, b1, b2));
                }
            }
        }

        nearest.map(|(index, t, b1, b2)| {
            let geo_n = self.geometric_normal(index);
            let mut sh_n = self.shading_normal(index, b1, b2);
            if sh_n.dot(&geo_n) < 0.0 {
                sh_n = -sh_n;
            }
            SurfaceIntersection::new(
                ray.at(t),
                sh_n,
                geo_n,
                self.interpolated_uv(index, b1, b2),
                t,
            )
        })
    }

    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        (0..self.indices.len()).any(|index| self.intersect_triangle(index, ray).is_some())
    }

    fn sample_position(&self, u: &Vector2f) -> PositionSample {
        if self.indices.is_empty() || self.total_area <= 0.0 {
            return PositionSample {
                p: Vector3f::zeros(),
                n: Vector3f::new(0.0, 0.0, 1.0),
                uv: Vector2f::new(0.0, 0.0),
                pdf_area: 0.0,
            };
        }

        // Pick a triangle by area, then a uniform point inside it with
        // the rescaled remainder of the first sample dimension.
        let mut reused = u.x;
        let (index, _) = self.area_dpdf.sample_reuse(&mut reused);
        let bary = warp::sample_uniform_triangle(&Vector2f::new(reused, u.y));

        let (p0, p1, p2) = self.triangle_vertices(index);
        let p = p0 * (1.0 - bary.x - bary.y) + p1 * bary.x + p2 * bary.y;

        let geo_n = self.geometric_normal(index);
        let mut sh_n = self.shading_normal(index, bary.x, bary.y);
        if sh_n.dot(&geo_n) < 0.0 {
            sh_n = -sh_n;
        }

        PositionSample {
            p,
            n: sh_n,
            uv: self.interpolated_uv(index, bary.x, bary.y),
            pdf_area: 1.0 / self.total_area,
        }
    }

    fn pdf_position(&self, _p: &Vector3f) -> Float {
        if self.total_area > 0.0 {
            1.0 / self.total_area
        } else {
            0.0
        }
    }

    fn surface_area(&self) -> Float {
        self.total_area
    }
}
