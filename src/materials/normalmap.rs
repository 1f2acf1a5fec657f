// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, BsdfQuery, BsdfSample, Measure};
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::spectrum::RgbSpectrum;
use std::sync::Arc;

/// Decorator that bends the shading normal according to a tangent-space
/// normal map before delegating to the wrapped model. Directions that
/// end up on the opposite side of the perturbed frame are rejected so
/// light cannot leak through the geometric surface.
pub struct NormalmapBsdf {
    normals: Arc<dyn Texture>,
    base: Arc<dyn Bsdf>,
}

impl NormalmapBsdf {
    pub fn new(normals: Arc<dyn Texture>, base: Arc<dyn Bsdf>) -> Self {
        Self { normals, base }
    }

    /// Decode the texel into a unit normal in the local shading frame.
    fn perturbed_frame(&self, uv: Vector2f) -> Frame {
        let c = self.normals.eval(uv);
        let n = Vector3f::new(2.0 * c[0] - 1.0, 2.0 * c[1] - 1.0, 2.0 * c[2] - 1.0);
        let norm = n.norm();
        if norm <= 0.0 {
            return Frame::default();
        }
        Frame::from_normal(&(n / norm))
    }
}

impl Bsdf for NormalmapBsdf {
    fn eval(&self, query: &BsdfQuery) -> RgbSpectrum {
        let frame = self.perturbed_frame(query.uv);
        let perturbed = BsdfQuery::new(
            frame.to_local(&query.wi),
            frame.to_local(&query.wo),
            query.uv,
            query.measure,
        );

        let cos_orig = Frame::cos_theta(&query.wo);
        let cos_pert = Frame::cos_theta(&perturbed.wo);
        if cos_orig * cos_pert <= 0.0 {
            return RgbSpectrum::black();
        }

        // Rescale so the caller's cosine (taken against the original
        // normal) turns into the cosine against the perturbed one.
        self.base.eval(&perturbed) * (cos_pert / cos_orig)
    }

    fn pdf(&self, query: &BsdfQuery) -> Float {
        let frame = self.perturbed_frame(query.uv);
        let perturbed = BsdfQuery::new(
            frame.to_local(&query.wi),
            frame.to_local(&query.wo),
            query.uv,
            query.measure,
        );

        if Frame::cos_theta(&query.wo) * Frame::cos_theta(&perturbed.wo) <= 0.0 {
            return 0.0;
        }
        self.base.pdf(&perturbed)
    }

    fn sample(&self, query: &BsdfQuery, u: &Vector2f) -> BsdfSample {
        let frame = self.perturbed_frame(query.uv);
        let perturbed_query = BsdfQuery::for_sampling(frame.to_local(&query.wi), query.uv);

        let sample = self.base.sample(&perturbed_query, u);
        if !sample.is_valid() {
            return BsdfSample::invalid();
        }

        let wo = frame.to_world(&sample.wo);
        if Frame::cos_theta(&wo) * Frame::cos_theta(&sample.wo) <= 0.0 {
            return BsdfSample::invalid();
        }

        BsdfSample { wo, weight: sample.weight, measure: sample.measure }
    }

    fn is_diffuse(&self) -> bool {
        self.base.is_diffuse()
    }
}
