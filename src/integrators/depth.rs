// Copyright @yucwang 2026

use crate::core::integrator::Integrator;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;

/// Inverse-distance visualization, handy for sanity-checking scenes.
pub struct DepthIntegrator;

impl DepthIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for DepthIntegrator {
    fn li(&self, scene: &Scene, _sampler: &mut dyn Sampler, ray: &Ray3f) -> RgbSpectrum {
        match scene.ray_intersection(ray) {
            Some(hit) if hit.t() > 0.0 => RgbSpectrum::from_float(1.0 / hit.t()),
            _ => RgbSpectrum::black(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::IndependentSampler;
    use crate::integrators::test_support::{diffuse_surface, quad};
    use crate::math::constants::Vector3f;

    #[test]
    fn test_depth_is_inverse_distance() {
        let mut scene = Scene::new();
        scene.add_surface(diffuse_surface(
            quad(Vector3f::new(-1.0, -1.0, 0.0),
                 Vector3f::new(2.0, 0.0, 0.0),
                 Vector3f::new(0.0, 2.0, 0.0)),
            0.5,
        ));
        scene.finalize();

        let mut sampler = IndependentSampler::new(1);
        let integrator = DepthIntegrator::new();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 4.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let value = integrator.li(&scene, &mut sampler, &ray);
        assert!((value[0] - 0.25).abs() < 1e-5);

        let miss = Ray3f::new(Vector3f::new(5.0, 0.0, 4.0),
                              Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(integrator.li(&scene, &mut sampler, &miss).is_black());
    }
}
