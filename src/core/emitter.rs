// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RgbSpectrum;

/// Connection between a reference point being illuminated and a point
/// on an emitter. Filled in progressively: `sample` populates the
/// emitter-side fields and the solid-angle density.
#[derive(Debug, Clone, Copy)]
pub struct EmitterQuery {
    /// Point being illuminated.
    pub reference: Vector3f,
    /// Sampled (or hit) point on the emitter surface.
    pub p: Vector3f,
    /// Emitter surface normal at `p`.
    pub n: Vector3f,
    /// Unit direction light travels: from `p` towards `reference`.
    pub wi: Vector3f,
    /// Distance between `reference` and `p`.
    pub dist: Float,
    /// Surface coordinates at `p`.
    pub uv: Vector2f,
    /// Density of the sampled connection, solid-angle measure.
    pub pdf: Float,
}

impl EmitterQuery {
    pub fn new(reference: Vector3f) -> Self {
        Self {
            reference,
            p: Vector3f::zeros(),
            n: Vector3f::zeros(),
            wi: Vector3f::zeros(),
            dist: 0.0,
            uv: Vector2f::new(0.0, 0.0),
            pdf: 0.0,
        }
    }

    /// Query describing an already-found connection, e.g. when a traced
    /// ray happened to hit the emitter.
    pub fn for_hit(reference: Vector3f, p: Vector3f, n: Vector3f, uv: Vector2f) -> Self {
        let to_ref = reference - p;
        let dist = to_ref.norm();
        let wi = if dist > 0.0 { to_ref / dist } else { Vector3f::zeros() };
        Self { reference, p, n, wi, dist, uv, pdf: 0.0 }
    }
}

pub trait Emitter: Send + Sync {
    /// Radiance leaving the emitter at `query.p` towards `query.wi`.
    /// Black when looking at the back side (`query.n · query.wi <= 0`).
    fn eval(&self, query: &EmitterQuery) -> RgbSpectrum;

    /// Pick a point on the emitter proportionally to surface area and
    /// return the filled-in connection together with its radiance. The
    /// returned pdf is converted to solid angle as seen from
    /// `reference`; a zero pdf or black radiance means "no
    /// contribution".
    fn sample(&self, reference: Vector3f, u: &Vector2f) -> (EmitterQuery, RgbSpectrum);

    /// Solid-angle density `sample` would have produced for the
    /// connection described by `query`. Assumes a fully populated query
    /// and performs no visibility test.
    fn pdf(&self, query: &EmitterQuery) -> Float;

    /// Relative weight for scene-level emitter selection.
    fn importance(&self) -> Float {
        1.0
    }
}
