// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfQuery, Measure};
use crate::core::emitter::EmitterQuery;
use crate::core::integrator::Integrator;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::math::constants::{EPSILON, Float};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;

/// Multi-bounce path tracer with next-event estimation, balance-
/// heuristic multiple importance sampling and Russian-roulette
/// termination. The recursion is an explicit loop carrying
/// (ray, throughput, depth, previous-bounce density) state.
pub struct PathIntegrator {
    max_depth: u32,
    rr_depth: u32,
}

impl PathIntegrator {
    pub fn new(max_depth: u32, rr_depth: u32) -> Self {
        Self { max_depth, rr_depth }
    }
}

impl Default for PathIntegrator {
    fn default() -> Self {
        // Roulette carries termination; the depth cap is a backstop.
        Self { max_depth: 50, rr_depth: 3 }
    }
}

impl Integrator for PathIntegrator {
    fn li(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray3f) -> RgbSpectrum {
        let mut lo = RgbSpectrum::black();
        let mut throughput = RgbSpectrum::from_float(1.0);
        let mut ray = Ray3f::new(ray.origin(), ray.dir(), Some(ray.min_t), Some(ray.max_t));
        let mut depth = 0u32;

        // Density of the previous scattering decision, used to weight
        // emitters found by the following intersection. The camera hit
        // and discrete bounces count emitters at full weight.
        let mut prev_pdf: Float = 0.0;
        let mut prev_discrete = true;

        loop {
            let hit = match scene.ray_intersection(&ray) {
                Some(hit) => hit,
                None => {
                    lo += throughput * scene.background(&ray);
                    break;
                }
            };
            let surface_index = hit.surface_index().unwrap_or(0);
            let surface = scene.surface(surface_index);

            // Emitted radiance, weighted against the emitter strategy
            // that could have produced the same connection.
            if let Some(emitter) = surface.emitter() {
                let query = EmitterQuery::for_hit(ray.origin(), hit.p(),
                                                  hit.sh_normal(), hit.uv());
                let radiance = emitter.eval(&query);
                if !radiance.is_black() {
                    let weight = if prev_discrete {
                        1.0
                    } else {
                        let pdf_em = emitter.pdf(&query)
                            * scene.emitter_selection_pdf(surface_index);
                        if prev_pdf + pdf_em > 0.0 {
                            prev_pdf / (prev_pdf + pdf_em)
                        } else {
                            0.0
                        }
                    };
                    lo += throughput * radiance * weight;
                }
            }

            if depth >= self.max_depth {
                break;
            }

            let wi_local = hit.to_local(&-ray.dir());

            // Next-event estimation towards one sampled emitter.
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
                                lo += throughput * radiance * f
                                    * (cos_theta * weight / pdf_em);
                            }
                        }
                    }
                }
            }

            // Continue the path with a material sample.
            let sample = surface.bsdf().sample(
                &BsdfQuery::for_sampling(wi_local, hit.uv()),
                &sampler.next_2d(),
            );
            if !sample.is_valid() {
                break;
            }
            throughput *= sample.weight;
            if throughput.is_black() || throughput.has_nan() {
                break;
            }

            prev_discrete = sample.measure == Measure::Discrete;
            prev_pdf = if prev_discrete {
                0.0
            } else {
                let filled = BsdfQuery::new(wi_local, sample.wo,
                                            hit.uv(), Measure::SolidAngle);
                surface.bsdf().pdf(&filled)
            };

            ray = Ray3f::new(hit.p(), hit.to_world(&sample.wo), Some(EPSILON), None);
            depth += 1;

            // Russian roulette, unbiased by construction: survivors are
            // divided by their survival probability.
            if depth >= self.rr_depth {
                let survival = throughput.max_coeff().min(0.95);
                if survival <= 0.0 || sampler.next_1d() > survival {
                    break;
                }
                throughput /= survival;
            }
        }

        lo
    }
}
