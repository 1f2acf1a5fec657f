// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, BsdfQuery, BsdfSample, Measure};
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f};
use crate::math::frame::Frame;
use crate::math::spectrum::RgbSpectrum;
use crate::math::warp;
use crate::materials::microfacet::{beckmann_ndf, fresnel_schlick, reflect, smith_beckmann_g1};
use std::sync::Arc;

/// Rough metallic reflection: Beckmann microfacets with a Schlick
/// Fresnel term parameterized by the normal-incidence reflectance R0.
pub struct RoughConductorBsdf {
    alpha: Float,
    r0: Arc<dyn Texture>,
}

impl RoughConductorBsdf {
    pub fn new(alpha: Float, r0: Arc<dyn Texture>) -> Self {
        Self { alpha: alpha.max(1e-3), r0 }
    }
}

impl Bsdf for RoughConductorBsdf {
    fn eval(&self, query: &BsdfQuery) -> RgbSpectrum {
        if query.measure != Measure::SolidAngle
            || Frame::cos_theta(&query.wi) <= 0.0
            || Frame::cos_theta(&query.wo) <= 0.0 {
            return RgbSpectrum::black();
        }

        let half = query.wi + query.wo;
        if half.norm_squared() <= 0.0 {
            return RgbSpectrum::black();
        }
        let wh = half.normalize();

        let d = beckmann_ndf(&wh, self.alpha);
        let f = fresnel_schlick(self.r0.eval(query.uv), query.wi.dot(&wh));
        let g = smith_beckmann_g1(&query.wi, &wh, self.alpha)
            * smith_beckmann_g1(&query.wo, &wh, self.alpha);

        let cos_i = Frame::cos_theta(&query.wi);
        let cos_o = Frame::cos_theta(&query.wo);
        f * (d * g / (4.0 * cos_i * cos_o))
    }

    fn pdf(&self, query: &BsdfQuery) -> Float {
        if query.measure != Measure::SolidAngle
            || Frame::cos_theta(&query.wi) <= 0.0
            || Frame::cos_theta(&query.wo) <= 0.0 {
            return 0.0;
        }

        let half = query.wi + query.wo;
        if half.norm_squared() <= 0.0 {
            return 0.0;
        }
        let wh = half.normalize();

        let denom = 4.0 * query.wi.dot(&wh).abs();
        if denom <= 0.0 {
            return 0.0;
        }
        // Beckmann density of the half vector times the half-vector
        // to outgoing-direction Jacobian.
        warp::sample_beckmann_pdf(&wh, self.alpha) / denom
    }

    fn sample(&self, query: &BsdfQuery, u: &Vector2f) -> BsdfSample {
        if Frame::cos_theta(&query.wi) <= 0.0 {
            return BsdfSample::invalid();
        }

        let wh = warp::sample_beckmann(u, self.alpha);
        let wo = reflect(&query.wi, &wh);
        if Frame::cos_theta(&wo) <= 0.0 {
            return BsdfSample::invalid();
        }

        let filled = BsdfQuery::new(query.wi, wo, query.uv, Measure::SolidAngle);
        let pdf = self.pdf(&filled);
        if pdf <= 0.0 {
            return BsdfSample::invalid();
        }

        BsdfSample {
            wo,
            weight: self.eval(&filled) * (Frame::cos_theta(&wo) / pdf),
            measure: Measure::SolidAngle,
        }
    }

    /// Rough lobes are wide enough for direct-lighting strategies that
    /// target non-specular materials.
    fn is_diffuse(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::{IndependentSampler, Sampler};
    use crate::math::constants::Vector3f;
    use crate::textures::constant::ConstantTexture;

    fn make_conductor(alpha: Float, r0: RgbSpectrum) -> RoughConductorBsdf {
        RoughConductorBsdf::new(alpha, Arc::new(ConstantTexture::new(r0)))
    }

    #[test]
    fn test_conductor_reciprocity() {
        let bsdf = make_conductor(0.3, RgbSpectrum::new(0.9, 0.6, 0.3));
        let a = Vector3f::new(0.5, 0.2, 0.84).normalize();
        let b = Vector3f::new(-0.3, 0.4, 0.87).normalize();
        let uv = Vector2f::new(0.0, 0.0);

        let forward = bsdf.eval(&BsdfQuery::new(a, b, uv, Measure::SolidAngle));
        let backward = bsdf.eval(&BsdfQuery::new(b, a, uv, Measure::SolidAngle));
        for c in 0..3 {
            assert!((forward[c] - backward[c]).abs() < 1e-5);
        }
    }

    // Hemispherical-directional reflectance of a perfect reflector
    // (R0 = 1) must not exceed 1.
    #[test]
    fn test_conductor_energy_conservation() {
        let bsdf = make_conductor(0.4, RgbSpectrum::from_float(1.0));
        let mut sampler = IndependentSampler::new(17);
        let wi = Vector3f::new(0.4, 0.0, 0.92).normalize();
        let query = BsdfQuery::for_sampling(wi, Vector2f::new(0.0, 0.0));

        let mut total = 0.0f64;
        let count = 50_000;
        for _ in 0..count {
            let sample = bsdf.sample(&query, &sampler.next_2d());
            if sample.is_valid() {
                total += sample.weight.max_coeff() as f64;
            }
        }
        let albedo = total / count as f64;
        assert!(albedo <= 1.02, "directional albedo = {}", albedo);
        assert!(albedo > 0.3, "directional albedo = {}", albedo);
    }

    #[test]
    fn test_conductor_sample_weight_identity() {
        let bsdf = make_conductor(0.25, RgbSpectrum::from_float(0.8));
        let mut sampler = IndependentSampler::new(3);
        let wi = Vector3f::new(-0.2, 0.5, 0.84).normalize();
        let query = BsdfQuery::for_sampling(wi, Vector2f::new(0.0, 0.0));

        let mut checked = 0;
        for _ in 0..200 {
            let sample = bsdf.sample(&query, &sampler.next_2d());
            if !sample.is_valid() {
                continue;
            }
            let filled = BsdfQuery::new(wi, sample.wo, query.uv, Measure::SolidAngle);
            let pdf = bsdf.pdf(&filled);
            assert!(pdf > 0.0);
            let expected = bsdf.eval(&filled) * (Frame::cos_theta(&sample.wo) / pdf);
            for c in 0..3 {
                assert!((sample.weight[c] - expected[c]).abs() < 1e-4);
            }
            checked += 1;
        }
        assert!(checked > 100);
    }
}
