// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfQuery, Measure};
use crate::core::emitter::EmitterQuery;
use crate::core::integrator::Integrator;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::math::constants::EPSILON;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;

/// Direct illumination combining emitter and material sampling with
/// the balance heuristic. The emitter-selection probability is folded
/// into the light-strategy density on both sides of the weight.
pub struct DirectMisIntegrator;

impl DirectMisIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for DirectMisIntegrator {
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

        // Emitter-sampling strategy.
        if let Some((light_index, select_pdf)) = scene.sample_emitter(sampler.next_1d()) {
            if let Some(emitter) = scene.surface(light_index).emitter() {
                let (query, radiance) = emitter.sample(hit.p(), &sampler.next_2d());
                if query.pdf > 0.0 && !radiance.is_black() {
                    let shadow_ray = Ray3f::new(hit.p(), -query.wi,
                                                Some(EPSILON), Some(query.dist - EPSILON));
                    if !scene.ray_intersection_t(&shadow_ray) {
                        let wo_local = hit.to_local(&-query.wi);
                        let bsdf_query = BsdfQuery::new(wi_local, wo_local,
                                                        hit.uv(), Measure::SolidAngle);
                        let f = surface.bsdf().eval(&bsdf_query);
                        let cos_theta = wo_local.z.max(0.0);

                        let pdf_em = select_pdf * query.pdf;
                        let pdf_mat = surface.bsdf().pdf(&bsdf_query);
                        if pdf_em > 0.0 && !f.is_black() {
                            let weight = pdf_em / (pdf_em + pdf_mat);
                            lo += radiance * f * (cos_theta * weight / pdf_em);
                        }
                    }
                }
            }
        }

        // Material-sampling strategy.
        let sample = surface.bsdf().sample(
            &BsdfQuery::for_sampling(wi_local, hit.uv()),
            &sampler.next_2d(),
        );
        if !sample.is_valid() {
            return lo;
        }

        let next_ray = Ray3f::new(hit.p(), hit.to_world(&sample.wo), Some(EPSILON), None);
        match scene.ray_intersection(&next_ray) {
            None => {
                // No emitter strategy reaches the background, so the
                // material sample keeps full weight.
                lo += sample.weight * scene.background(&next_ray);
            }
            Some(light_hit) => {
                let light_index = light_hit.surface_index().unwrap_or(0);
                if let Some(emitter) = scene.surface(light_index).emitter() {
                    let query = EmitterQuery::for_hit(hit.p(), light_hit.p(),
                                                      light_hit.sh_normal(), light_hit.uv());
                    let radiance = emitter.eval(&query);
                    if !radiance.is_black() {
                        let filled = BsdfQuery::new(wi_local, sample.wo,
                                                    hit.uv(), Measure::SolidAngle);
                        let pdf_mat = surface.bsdf().pdf(&filled);
                        let pdf_em = emitter.pdf(&query)
                            * scene.emitter_selection_pdf(light_index);
                        let weight = if sample.measure == Measure::Discrete {
                            1.0
                        } else if pdf_mat + pdf_em > 0.0 {
                            pdf_mat / (pdf_mat + pdf_em)
                        } else {
                            0.0
                        };
                        lo += sample.weight * radiance * weight;
                    }
                }
            }
        }

        lo
    }
}
