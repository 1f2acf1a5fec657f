// Copyright @yucwang 2026

use crate::core::bsdf::Bsdf;
use crate::core::emitter::Emitter;
use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::Shape;
use crate::math::constants::Float;
use crate::math::distribution::DiscretePdf;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;
use std::sync::Arc;

/// One scene object: a shape with exactly one reflectance model and at
/// most one emission model. A surface carrying both is an area light.
pub struct Surface {
    shape: Arc<dyn Shape>,
    bsdf: Arc<dyn Bsdf>,
    emitter: Option<Arc<dyn Emitter>>,
    name: Option<String>,
}

impl Surface {
    pub fn new(shape: Arc<dyn Shape>, bsdf: Arc<dyn Bsdf>) -> Self {
        Self { shape, bsdf, emitter: None, name: None }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn Emitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }

    pub fn bsdf(&self) -> &dyn Bsdf {
        self.bsdf.as_ref()
    }

    pub fn is_emitter(&self) -> bool {
        self.emitter.is_some()
    }

    pub fn emitter(&self) -> Option<&dyn Emitter> {
        self.emitter.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

pub struct Scene {
    surfaces: Vec<Surface>,
    /// Surfaces that carry an emitter, in selection order.
    emitter_surfaces: Vec<usize>,
    emitter_dpdf: DiscretePdf,
    background: RgbSpectrum,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
            emitter_surfaces: Vec::new(),
            emitter_dpdf: DiscretePdf::new(),
            background: RgbSpectrum::black(),
        }
    }

    pub fn add_surface(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    pub fn set_background(&mut self, background: RgbSpectrum) {
        self.background = background;
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, index: usize) -> &Surface {
        &self.surfaces[index]
    }

    pub fn emitter_count(&self) -> usize {
        self.emitter_surfaces.len()
    }

    /// Rebuild the emitter-selection distribution. Must run after the
    /// last surface was added and before any radiance estimate.
    pub fn finalize(&mut self) {
        self.emitter_surfaces.clear();
        self.emitter_dpdf = DiscretePdf::new();
        for (index, surface) in self.surfaces.iter().enumerate() {
            if let Some(emitter) = surface.emitter() {
                self.emitter_surfaces.push(index);
                self.emitter_dpdf.append(emitter.importance());
            }
        }
        self.emitter_dpdf.normalize();
        log::debug!("scene finalized: {} surfaces, {} emitters",
                    self.surfaces.len(), self.emitter_surfaces.len());
    }

    /// Environment radiance for a ray that left the scene.
    pub fn background(&self, _ray: &Ray3f) -> RgbSpectrum {
        self.background
    }

    /// Nearest surface along `ray`, if any.
    pub fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let mut clipped = Ray3f::new(ray.origin(), ray.dir(), Some(ray.min_t), Some(ray.max_t));
        let mut nearest: Option<SurfaceIntersection> = None;
        for (index, surface) in self.surfaces.iter().enumerate() {
            if let Some(hit) = surface.shape().ray_intersection(&clipped) {
                clipped.max_t = hit.t();
                nearest = Some(hit.with_surface_index(index));
            }
        }
        nearest
    }

    /// Existence-only intersection test for shadow rays.
    pub fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.surfaces
            .iter()
            .any(|surface| surface.shape().ray_intersection_t(ray))
    }

    /// Discrete emitter selection proportional to emitter importance.
    /// Returns the index of the selected emitting surface and the
    /// selection probability.
    pub fn sample_emitter(&self, u: Float) -> Option<(usize, Float)> {
        if self.emitter_surfaces.is_empty() {
            return None;
        }
        let mut u = u;
        let (slot, pdf) = self.emitter_dpdf.sample_reuse(&mut u);
        if pdf <= 0.0 {
            return None;
        }
        Some((self.emitter_surfaces[slot], pdf))
    }

    /// Selection probability `sample_emitter` assigns to the emitter on
    /// `surface_index`, or zero if that surface does not emit.
    pub fn emitter_selection_pdf(&self, surface_index: usize) -> Float {
        self.emitter_surfaces
            .iter()
            .position(|&index| index == surface_index)
            .map(|slot| self.emitter_dpdf.pdf(slot))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bsdf::{BsdfQuery, BsdfSample};
    use crate::core::shape::PositionSample;
    use crate::math::constants::{Vector2f, Vector3f};

    struct TestShape {
        t: Float,
    }

    impl Shape for TestShape {
        fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
            if !ray.test_segment(self.t) {
                return None;
            }
            let n = Vector3f::new(0.0, 0.0, 1.0);
            Some(SurfaceIntersection::new(ray.at(self.t), n, n, Vector2f::new(0.0, 0.0), self.t))
        }

        fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
            ray.test_segment(self.t)
        }

        fn sample_position(&self, _u: &Vector2f) -> PositionSample {
            PositionSample {
                p: Vector3f::zeros(),
                n: Vector3f::new(0.0, 0.0, 1.0),
                uv: Vector2f::new(0.0, 0.0),
                pdf_area: 1.0,
            }
        }

        fn pdf_position(&self, _p: &Vector3f) -> Float {
            1.0
        }

        fn surface_area(&self) -> Float {
            1.0
        }
    }

    struct TestBsdf;

    impl Bsdf for TestBsdf {
        fn eval(&self, _query: &BsdfQuery) -> RgbSpectrum {
            RgbSpectrum::black()
        }

        fn pdf(&self, _query: &BsdfQuery) -> Float {
            0.0
        }

        fn sample(&self, _query: &BsdfQuery, _u: &Vector2f) -> BsdfSample {
            BsdfSample::invalid()
        }
    }

    struct TestEmitter {
        importance: Float,
    }

    impl Emitter for TestEmitter {
        fn eval(&self, _query: &crate::core::emitter::EmitterQuery) -> RgbSpectrum {
            RgbSpectrum::from_float(1.0)
        }

        fn sample(&self, reference: Vector3f, _u: &Vector2f)
            -> (crate::core::emitter::EmitterQuery, RgbSpectrum) {
            (crate::core::emitter::EmitterQuery::new(reference), RgbSpectrum::black())
        }

        fn pdf(&self, _query: &crate::core::emitter::EmitterQuery) -> Float {
            0.0
        }

        fn importance(&self) -> Float {
            self.importance
        }
    }

    fn test_surface(t: Float) -> Surface {
        Surface::new(Arc::new(TestShape { t }), Arc::new(TestBsdf))
    }

    #[test]
    fn test_scene_ray_intersection_closest_hit() {
        let mut scene = Scene::new();
        scene.add_surface(test_surface(5.0));
        scene.add_surface(test_surface(2.0));
        scene.add_surface(test_surface(10.0));
        scene.finalize();

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = scene.ray_intersection(&ray).expect("expected intersection");

        assert_eq!(hit.t(), 2.0);
        assert_eq!(hit.surface_index(), Some(1));
    }

    #[test]
    fn test_scene_emitter_selection_follows_importance() {
        let mut scene = Scene::new();
        scene.add_surface(test_surface(1.0)
            .with_emitter(Arc::new(TestEmitter { importance: 1.0 })));
        scene.add_surface(test_surface(2.0));
        scene.add_surface(test_surface(3.0)
            .with_emitter(Arc::new(TestEmitter { importance: 3.0 })));
        scene.finalize();

        assert_eq!(scene.emitter_count(), 2);

        let (index, pdf) = scene.sample_emitter(0.1).expect("emitter sample");
        assert_eq!(index, 0);
        assert!((pdf - 0.25).abs() < 1e-6);

        let (index, pdf) = scene.sample_emitter(0.7).expect("emitter sample");
        assert_eq!(index, 2);
        assert!((pdf - 0.75).abs() < 1e-6);

        assert!((scene.emitter_selection_pdf(0) - 0.25).abs() < 1e-6);
        assert!((scene.emitter_selection_pdf(2) - 0.75).abs() < 1e-6);
        assert_eq!(scene.emitter_selection_pdf(1), 0.0);
    }
}
