// Copyright @yucwang 2026

use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;

pub trait Integrator: Send + Sync {
    /// Estimate the radiance arriving along `ray`.
    fn li(&self, scene: &Scene, sampler: &mut dyn Sampler, ray: &Ray3f) -> RgbSpectrum;
}
