// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, BsdfQuery, BsdfSample, Measure};
use crate::core::texture::Texture;
use crate::math::constants::{Float, PI, Vector2f};
use crate::math::frame::Frame;
use crate::math::spectrum::RgbSpectrum;
use crate::math::warp;
use crate::materials::microfacet::{
    beckmann_ndf, fresnel_dielectric, reflect, smith_beckmann_g1,
};
use std::sync::Arc;

/// Diffuse substrate under a rough dielectric coating: a Beckmann
/// specular lobe weighted by the exact Fresnel term plus a coupled
/// diffuse lobe that accounts for the energy entering the substrate.
pub struct RoughSubstrateBsdf {
    alpha: Float,
    int_ior: Float,
    ext_ior: Float,
    kd: Arc<dyn Texture>,
}

impl RoughSubstrateBsdf {
    pub fn new(alpha: Float, int_ior: Float, ext_ior: Float, kd: Arc<dyn Texture>) -> Self {
        Self { alpha: alpha.max(1e-3), int_ior, ext_ior, kd }
    }

    fn specular_pdf(&self, query: &BsdfQuery) -> Float {
        let half = query.wi + query.wo;
        if half.norm_squared() <= 0.0 {
            return 0.0;
        }
        let wh = half.normalize();
        let denom = 4.0 * query.wi.dot(&wh).abs();
        if denom <= 0.0 {
            return 0.0;
        }
        warp::sample_beckmann_pdf(&wh, self.alpha) / denom
    }
}

impl Bsdf for RoughSubstrateBsdf {
    fn eval(&self, query: &BsdfQuery) -> RgbSpectrum {
        if query.measure != Measure::SolidAngle
            || Frame::cos_theta(&query.wi) <= 0.0
            || Frame::cos_theta(&query.wo) <= 0.0 {
            return RgbSpectrum::black();
        }

        let cos_i = Frame::cos_theta(&query.wi);
        let cos_o = Frame::cos_theta(&query.wo);

        let half = query.wi + query.wo;
        if half.norm_squared() <= 0.0 {
            return RgbSpectrum::black();
        }
        let wh = half.normalize();

        let d = beckmann_ndf(&wh, self.alpha);
        let f = fresnel_dielectric(cos_i, self.ext_ior, self.int_ior);
        let g = smith_beckmann_g1(&query.wi, &wh, self.alpha)
            * smith_beckmann_g1(&query.wo, &wh, self.alpha);
        let specular = RgbSpectrum::from_float(d * f * g / (4.0 * cos_i * cos_o));

        // Coupled diffuse term: the substrate only sees light the
        // coating refracts, at both the incident and outgoing sides.
        let kd = self.kd.eval(query.uv);
        let eta_ratio = (self.ext_ior - self.int_ior) / (self.ext_ior + self.int_ior);
        let diffuse = kd * (28.0 / (23.0 * PI))
            * (1.0 - eta_ratio * eta_ratio)
            * (1.0 - (1.0 - 0.5 * cos_i).powi(5))
            * (1.0 - (1.0 - 0.5 * cos_o).powi(5));

        specular + diffuse
    }

    fn pdf(&self, query: &BsdfQuery) -> Float {
        if query.measure != Measure::SolidAngle
            || Frame::cos_theta(&query.wi) <= 0.0
            || Frame::cos_theta(&query.wo) <= 0.0 {
            return 0.0;
        }

        let f = fresnel_dielectric(Frame::cos_theta(&query.wi), self.ext_ior, self.int_ior);
        let diffuse_pdf = Frame::cos_theta(&query.wo) / PI;
        f * self.specular_pdf(query) + (1.0 - f) * diffuse_pdf
    }

    fn sample(&self, query: &BsdfQuery, u: &Vector2f) -> BsdfSample {
        if Frame::cos_theta(&query.wi) <= 0.0 {
            return BsdfSample::invalid();
        }

        // Fresnel-probability branching between the two lobes; the
        // branching sample is rescaled back to [0,1) for reuse.
        let f = fresnel_dielectric(Frame::cos_theta(&query.wi), self.ext_ior, self.int_ior);
        let wo = if u.x < f {
            let remapped = Vector2f::new(u.x / f, u.y);
            let wh = warp::sample_beckmann(&remapped, self.alpha);
            reflect(&query.wi, &wh)
        } else {
            let remapped = Vector2f::new((u.x - f) / (1.0 - f), u.y);
            warp::sample_cosine_hemisphere(&remapped)
        };

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
