// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, BsdfQuery, BsdfSample, Measure};
use crate::math::constants::{Float, Vector2f};
use crate::math::frame::Frame;
use crate::math::spectrum::RgbSpectrum;
use crate::materials::microfacet::{
    fresnel_conductor, ggx_aniso_ndf, reflect, sample_visible_normal, smith_aniso_g,
    smith_aniso_g1, visible_normal_pdf,
};

/// Anisotropic rough conductor: GGX-style microfacet distribution with
/// independent tangent/bitangent roughness, exact conductor Fresnel,
/// and visible-normal importance sampling. Sampling only the normals
/// visible from the incoming direction keeps the sample weight at
/// F * G / G1(wi), which never exceeds the Fresnel reflectance.
pub struct AnisotropicBsdf {
    alpha_u: Float,
    alpha_v: Float,
    eta: RgbSpectrum,
    k: RgbSpectrum,
}

impl AnisotropicBsdf {
    pub fn new(alpha_u: Float, alpha_v: Float, eta: RgbSpectrum, k: RgbSpectrum) -> Self {
        Self {
            alpha_u: alpha_u.max(1e-3),
            alpha_v: alpha_v.max(1e-3),
            eta,
            k,
        }
    }
}

impl Bsdf for AnisotropicBsdf {
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

        let d = ggx_aniso_ndf(&wh, self.alpha_u, self.alpha_v);
        let f = fresnel_conductor(query.wi.dot(&wh), self.eta, self.k);
        let g = smith_aniso_g(&query.wi, &query.wo, self.alpha_u, self.alpha_v);

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
        visible_normal_pdf(&query.wi, &wh, self.alpha_u, self.alpha_v) / denom
    }

    fn sample(&self, query: &BsdfQuery, u: &Vector2f) -> BsdfSample {
        if Frame::cos_theta(&query.wi) <= 0.0 {
            return BsdfSample::invalid();
        }

        let wh = sample_visible_normal(&query.wi, u, self.alpha_u, self.alpha_v);
        if query.wi.dot(&wh) <= 0.0 {
            return BsdfSample::invalid();
        }

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

    fn is_diffuse(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::{IndependentSampler, Sampler};
    use crate::math::constants::Vector3f;

    fn gold() -> AnisotropicBsdf {
        AnisotropicBsdf::new(
            0.3,
            0.15,
            RgbSpectrum::new(0.17, 0.35, 1.5),
            RgbSpectrum::new(3.1, 2.7, 1.9),
        )
    }

    #[test]
    fn test_anisotropic_reciprocity() {
        let bsdf = gold();
        let a = Vector3f::new(0.5, 0.2, 0.84).normalize();
        let b = Vector3f::new(-0.3, 0.4, 0.87).normalize();
        let uv = Vector2f::new(0.0, 0.0);

        let forward = bsdf.eval(&BsdfQuery::new(a, b, uv, Measure::SolidAngle));
        let backward = bsdf.eval(&BsdfQuery::new(b, a, uv, Measure::SolidAngle));
        for c in 0..3 {
            assert!((forward[c] - backward[c]).abs() < 1e-5);
        }
    }

    // Visible-normal sampling bounds the weight by F * G / G1(wi) <= 1.
    #[test]
    fn test_anisotropic_weight_is_bounded() {
        let bsdf = gold();
        let mut sampler = IndependentSampler::new(41);
        let wi = Vector3f::new(0.55, -0.25, 0.8).normalize();
        let query = BsdfQuery::for_sampling(wi, Vector2f::new(0.0, 0.0));

        for _ in 0..5000 {
            let sample = bsdf.sample(&query, &sampler.next_2d());
            if sample.is_valid() {
                assert!(sample.weight.max_coeff() <= 1.0 + 1e-3,
                        "weight = {:?}", sample.weight);
            }
        }
    }

    #[test]
    fn test_anisotropic_weight_identity() {
        let bsdf = gold();
        let wi = Vector3f::new(0.3, 0.5, 0.81).normalize();
        let uv = Vector2f::new(0.0, 0.0);
        let mut sampler = IndependentSampler::new(53);

        let mut checked = 0;
        for _ in 0..200 {
            let sample = bsdf.sample(&BsdfQuery::for_sampling(wi, uv), &sampler.next_2d());
            if !sample.is_valid() {
                continue;
            }
            let filled = BsdfQuery::new(wi, sample.wo, uv, Measure::SolidAngle);
            let pdf = bsdf.pdf(&filled);
            assert!(pdf > 0.0);

            // The closed form of eval * cos / pdf for visible-normal
            // sampling.
            let half = (wi + sample.wo).normalize();
            let f = fresnel_conductor(wi.dot(&half), bsdf.eta, bsdf.k);
            let ratio = smith_aniso_g(&wi, &sample.wo, bsdf.alpha_u, bsdf.alpha_v)
                / smith_aniso_g1(&wi, bsdf.alpha_u, bsdf.alpha_v);
            for c in 0..3 {
                assert!((sample.weight[c] - f[c] * ratio).abs() < 1e-3,
                        "weight {} vs closed form {}", sample.weight[c], f[c] * ratio);
            }
            checked += 1;
        }
        assert!(checked > 100);
    }

    // The direction density induced by visible-normal sampling must
    // integrate to at most 1 over the upper hemisphere (reflections
    // escaping below the horizon carry the rest).
    #[test]
    fn test_anisotropic_pdf_integral() {
        let bsdf = gold();
        let wi = Vector3f::new(0.4, 0.3, 0.87).normalize();
        let uv = Vector2f::new(0.0, 0.0);
        let mut sampler = IndependentSampler::new(67);

        let mut integral = 0.0f64;
        let count = 200_000;
        for _ in 0..count {
            let v = crate::math::warp::sample_uniform_hemisphere(&sampler.next_2d());
            let q = crate::math::warp::sample_uniform_hemisphere_pdf(&v);
            if q > 0.0 {
                let query = BsdfQuery::new(wi, v, uv, Measure::SolidAngle);
                integral += (bsdf.pdf(&query) / q) as f64;
            }
        }
        let integral = integral / count as f64;
        assert!(integral <= 1.02, "integral = {}", integral);
        assert!(integral > 0.8, "integral = {}", integral);
    }
}
