// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfQuery, Measure};
use crate::core::emitter::EmitterQuery;
use crate::core::integrator::Integrator;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::math::constants::EPSILON;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;

/// Direct illumination by next-event estimation: one emitter sample
/// per shading point, weighted by the BSDF and a shadow test.
pub struct DirectEmsIntegrator;

impl DirectEmsIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for DirectEmsIntegrator {
    fn li(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray3f) -> RgbSpectrum {
        let hit = match scene.ray_intersection(ray) {
            Some(hit) => hit,
            None => return scene.background(ray),
        };
        let surface_index = hit.surface_index().unwrap_or(0);
        let surface = scene.surface(surface_index);

        let mut lo = RgbSpectrum::black();

        // Emitted radiance at the hit itself.
        if let Some(emitter) = surface.emitter() {
            let query = EmitterQuery::for_hit(ray.origin(), hit.p(), hit.sh_normal(), hit.uv());
            lo += emitter.eval(&query);
        }

        // One emitter sample for the reflected part.
        let (light_index, select_pdf) = match scene.sample_emitter(sampler.next_1d()) {
            Some(selected) => selected,
            None => return lo,
        };
        let emitter = match scene.surface(light_index).emitter() {
            Some(emitter) => emitter,
            None => return lo,
        };

        let (query, radiance) = emitter.sample(hit.p(), &sampler.next_2d());
        if query.pdf <= 0.0 || radiance.is_black() {
            return lo;
        }

        let shadow_ray = Ray3f::new(hit.p(), -query.wi,
                                    Some(EPSILON), Some(query.dist - EPSILON));
        if scene.ray_intersection_t(&shadow_ray) {
            return lo;
        }

        let wi_local = hit.to_local(&-ray.dir());
        let wo_local = hit.to_local(&-query.wi);
        let bsdf_query = BsdfQuery::new(wi_local, wo_local, hit.uv(), Measure::SolidAngle);
        let f = surface.bsdf().eval(&bsdf_query);
        let cos_theta = wo_local.z.max(0.0);

        lo += radiance * f * (cos_theta / (query.pdf * select_pdf));
        lo
    }
}
