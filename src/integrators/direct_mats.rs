// Copyright @yucwang 2026

use crate::core::bsdf::BsdfQuery;
use crate::core::emitter::EmitterQuery;
use crate::core::integrator::Integrator;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::math::constants::EPSILON;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;

/// Direct illumination by material sampling: one BSDF sample per
/// shading point, collecting whatever emitter (or background) the
/// sampled direction reaches.
pub struct DirectMatsIntegrator;

impl DirectMatsIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for DirectMatsIntegrator {
    fn li(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray3f) -> RgbSpectrum {
        let hit = match scene.ray_intersection(ray) {
            Some(hit) => hit,
            None => return scene.background(ray),
        };
        let surface = scene.surface(hit.surface_index().unwrap_or(0));

        let mut lo = RgbSpectrum::black();

        if let Some(emitter) = surface.emitter() {
            let query = EmitterQuery::for_hit(ray.origin(), hit.p(), hit.sh_normal(), hit.uv());
            lo += emitter.eval(&query);
        }

        let wi_local = hit.to_local(&-ray.dir());
        let sample = surface.bsdf().sample(
            &BsdfQuery::for_sampling(wi_local, hit.uv()),
            &sampler.next_2d(),
        );
        if !sample.is_valid() {
            return lo;
        }

        let next_ray = Ray3f::new(hit.p(), hit.to_world(&sample.wo), Some(EPSILON), None);
        match scene.ray_intersection(&next_ray) {
            None => lo += sample.weight * scene.background(&next_ray),
            Some(light_hit) => {
                if let Some(emitter) = scene.surface(light_hit.surface_index().unwrap_or(0)).emitter() {
                    let query = EmitterQuery::for_hit(hit.p(), light_hit.p(),
                                                      light_hit.sh_normal(), light_hit.uv());
                    lo += sample.weight * emitter.eval(&query);
                }
            }
        }

        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrators::direct_ems::DirectEmsIntegrator;
    use crate::integrators::test_support::*;
    use crate::math::constants::Vector3f;

    // Emitter sampling and material sampling estimate the same
    // integral; their means must agree.
    #[test]
    fn test_direct_mats_agrees_with_direct_ems() {
        let mut scene = Scene::new();
        scene.add_surface(diffuse_surface(
            quad(Vector3f::new(-5.0, -5.0, 0.0),
                 Vector3f::new(10.0, 0.0, 0.0),
                 Vector3f::new(0.0, 10.0, 0.0)),
            0.6,
        ));
        // A light large enough for material sampling to hit often.
        scene.add_surface(emissive_surface(
            quad(Vector3f::new(-1.0, -1.0, 1.5),
                 Vector3f::new(0.0, 2.0, 0.0),
                 Vector3f::new(2.0, 0.0, 0.0)),
            0.0,
            3.0,
        ));
        scene.finalize();

        let origin = Vector3f::new(0.5, 0.0, 0.5);
        let ray = Ray3f::new(origin, -origin, None, None);

        let mats = average_li(&DirectMatsIntegrator::new(), &scene, &ray, 60_000, 11);
        let ems = average_li(&DirectEmsIntegrator::new(), &scene, &ray, 60_000, 13);

        assert!(!mats.is_black());
        let relative = (mats[0] - ems[0]).abs() / ems[0];
        assert!(relative < 0.03, "mats = {}, ems = {}", mats[0], ems[0]);
    }

    #[test]
    fn test_direct_mats_collects_background() {
        let mut scene = Scene::new();
        scene.add_surface(diffuse_surface(
            quad(Vector3f::new(-5.0, -5.0, 0.0),
                 Vector3f::new(10.0, 0.0, 0.0),
                 Vector3f::new(0.0, 10.0, 0.0)),
            0.5,
        ));
        scene.set_background(RgbSpectrum::from_float(1.0));
        scene.finalize();

        let origin = Vector3f::new(0.5, 0.0, 0.5);
        let ray = Ray3f::new(origin, -origin, None, None);

        // A diffuse plane under a uniform sky: every scattered ray
        // escapes, so the estimate converges to albedo * sky.
        let estimate = average_li(&DirectMatsIntegrator::new(), &scene, &ray, 20_000, 17);
        assert!((estimate[0] - 0.5).abs() < 0.01, "estimate = {}", estimate[0]);
    }
}
