// Copyright @yucwang 2023

use crate::core::bsdf::{Bsdf, BsdfQuery, BsdfSample, Measure};
use crate::core::texture::Texture;
use crate::math::constants::{Float, INV_PI, Vector2f};
use crate::math::frame::Frame;
use crate::math::spectrum::RgbSpectrum;
use crate::math::warp;
use std::sync::Arc;

/// Ideal Lambertian reflection. Cosine-weighted sampling matches the
/// integrand exactly, so the sample weight is the plain albedo.
pub struct DiffuseBsdf {
    albedo: Arc<dyn Texture>,
}

impl DiffuseBsdf {
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }
}

impl Bsdf for DiffuseBsdf {
    fn eval(&self, query: &BsdfQuery) -> RgbSpectrum {
        if query.measure != Measure::SolidAngle
            || Frame::cos_theta(&query.wi) <= 0.0
            || Frame::cos_theta(&query.wo) <= 0.0 {
            return RgbSpectrum::black();
        }
        self.albedo.eval(query.uv) * INV_PI
    }

    fn pdf(&self, query: &BsdfQuery) -> Float {
        if query.measure != Measure::SolidAngle
            || Frame::cos_theta(&query.wi) <= 0.0
            || Frame::cos_theta(&query.wo) <= 0.0 {
            return 0.0;
        }
        INV_PI * Frame::cos_theta(&query.wo)
    }

    fn sample(&self, query: &BsdfQuery, u: &Vector2f) -> BsdfSample {
        if Frame::cos_theta(&query.wi) <= 0.0 {
            return BsdfSample::invalid();
        }

        let wo = warp::sample_cosine_hemisphere(u);
        if Frame::cos_theta(&wo) <= 0.0 {
            return BsdfSample::invalid();
        }

        // eval * cos / pdf = (albedo/pi) * cos / (cos/pi) = albedo
        BsdfSample {
            wo,
            weight: self.albedo.eval(query.uv),
            measure: Measure::SolidAngle,
        }
    }

    fn is_diffuse(&self) -> bool {
        true
    }
}
