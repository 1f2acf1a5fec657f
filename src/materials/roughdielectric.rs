// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, BsdfQuery, BsdfSample, Measure};
use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::RgbSpectrum;

/// Rough dielectric with transmission. The refractive lobes are not
/// implemented; every query fails loudly instead of returning a
/// silently wrong reflectance.
pub struct RoughDielectricBsdf {
    alpha: Float,
    int_ior: Float,
    ext_ior: Float,
}

impl RoughDielectricBsdf {
    pub fn new(alpha: Float, int_ior: Float, ext_ior: Float) -> Self {
        Self { alpha: alpha.max(1e-3), int_ior, ext_ior }
    }
}

impl Bsdf for RoughDielectricBsdf {
    fn eval(&self, query: &BsdfQuery) -> RgbSpectrum {
        if query.measure != Measure::SolidAngle {
            return RgbSpectrum::black();
        }
        panic!("RoughDielectricBsdf::eval(): transmission is not implemented \
                (alpha = {}, int_ior = {}, ext_ior = {})",
               self.alpha, self.int_ior, self.ext_ior);
    }

    fn pdf(&self, query: &BsdfQuery) -> Float {
        if query.measure != Measure::SolidAngle {
            return 0.0;
        }
        panic!("RoughDielectricBsdf::pdf(): transmission is not implemented");
    }

    fn sample(&self, _query: &BsdfQuery, _u: &Vector2f) -> BsdfSample {
        panic!("RoughDielectricBsdf::sample(): transmission is not implemented");
    }

    fn is_diffuse(&self) -> bool {
        true
    }
}
