// Copyright @yucwang 2023

use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RgbSpectrum;

/// Measure associated with a scattering query. Smooth lobes live on the
/// solid-angle measure; perfectly specular ones are discrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Unknown,
    SolidAngle,
    Discrete,
}

/// A pair of directions at a surface point, expressed in the local
/// shading frame (+z is the shading normal).
#[derive(Debug, Clone, Copy)]
pub struct BsdfQuery {
    /// Incoming direction, pointing away from the surface.
    pub wi: Vector3f,
    /// Outgoing (scattered) direction, pointing away from the surface.
    pub wo: Vector3f,
    /// Surface parametric coordinates of the queried point.
    pub uv: Vector2f,
    pub measure: Measure,
}

impl BsdfQuery {
    pub fn new(wi: Vector3f, wo: Vector3f, uv: Vector2f, measure: Measure) -> Self {
        Self { wi, wo, uv, measure }
    }

    /// Query with only the incoming direction fixed, for `Bsdf::sample`.
    pub fn for_sampling(wi: Vector3f, uv: Vector2f) -> Self {
        Self { wi, wo: Vector3f::zeros(), uv, measure: Measure::Unknown }
    }

    pub fn cos_theta_wi(&self) -> Float {
        self.wi.z
    }

    pub fn cos_theta_wo(&self) -> Float {
        self.wo.z
    }
}

/// Result of importance-sampling a scattering direction. `weight` is
/// `eval(q) * cos_theta(wo) / pdf(q)`; a black weight means the sample
/// carries no contribution and must not be used to continue a path.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    pub wo: Vector3f,
    pub weight: RgbSpectrum,
    pub measure: Measure,
}

impl BsdfSample {
    pub fn invalid() -> Self {
        Self {
            wo: Vector3f::zeros(),
            weight: RgbSpectrum::black(),
            measure: Measure::Unknown,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.weight.is_black() && !self.weight.has_nan()
    }
}

pub trait Bsdf: Send + Sync {
    /// Evaluate the BSDF value for a fixed direction pair. Zero whenever
    /// the measure is not solid-angle or either direction lies at or
    /// below the local horizon.
    fn eval(&self, query: &BsdfQuery) -> RgbSpectrum;

    /// Density of `sample` for the directions in `query`, with respect
    /// to solid angle.
    fn pdf(&self, query: &BsdfQuery) -> Float;

    /// Draw an outgoing direction for `query.wi` using the canonical
    /// uniform sample `u`.
    fn sample(&self, query: &BsdfQuery, u: &Vector2f) -> BsdfSample;

    /// Whether direct-lighting strategies for rough materials apply.
    fn is_diffuse(&self) -> bool {
        false
    }
}
