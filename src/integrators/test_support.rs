// Copyright @yucwang 2026

use crate::core::integrator::Integrator;
use crate::core::sampler::{IndependentSampler, Sampler};
use crate::core::scene::{Scene, Surface};
use crate::core::shape::Shape;
use crate::emitters::area::AreaEmitter;
use crate::materials::diffuse::DiffuseBsdf;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RgbSpectrum;
use crate::shapes::rectangle::Rectangle;
use crate::textures::constant::ConstantTexture;
use std::sync::Arc;

pub fn quad(origin: Vector3f, edge_u: Vector3f, edge_v: Vector3f) -> Arc<dyn Shape> {
    Arc::new(Rectangle::new(origin, edge_u, edge_v))
}

pub fn diffuse_surface(shape: Arc<dyn Shape>, albedo: Float) -> Surface {
    Surface::new(
        shape,
        Arc::new(DiffuseBsdf::new(Arc::new(ConstantTexture::new(
            RgbSpectrum::from_float(albedo),
        )))),
    )
}

pub fn emissive_surface(shape: Arc<dyn Shape>, albedo: Float, radiance: Float) -> Surface {
    let emitter = AreaEmitter::new(shape.clone(), RgbSpectrum::from_float(radiance));
    diffuse_surface(shape, albedo).with_emitter(Arc::new(emitter))
}

/// Closed 2x2x2 box centered at the origin with all faces emitting and
/// reflecting uniformly (normals point inward). Every interior view
/// must converge to radiance / (1 - albedo).
pub fn furnace_scene(albedo: Float, radiance: Float) -> Scene {
    let mut scene = Scene::new();
    let faces = [
        // floor z = -1, facing +z
        (Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(0.0, 2.0, 0.0)),
        // ceiling z = 1, facing -z
        (Vector3f::new(-1.0, -1.0, 1.0), Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(2.0, 0.0, 0.0)),
        // wall y = -1, facing +y
        (Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(2.0, 0.0, 0.0)),
        // wall y = 1, facing -y
        (Vector3f::new(-1.0, 1.0, -1.0), Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 2.0)),
        // wall x = -1, facing +x
        (Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(0.0, 0.0, 2.0)),
        // wall x = 1, facing -x
        (Vector3f::new(1.0, -1.0, -1.0), Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 2.0, 0.0)),
    ];
    for (origin, edge_u, edge_v) in faces {
        scene.add_surface(emissive_surface(quad(origin, edge_u, edge_v), albedo, radiance));
    }
    scene.finalize();
    scene
}

/// Average of repeated radiance estimates along one fixed ray.
pub fn average_li(integrator: &dyn Integrator, scene: &Scene, ray: &Ray3f,
                  samples: usize, seed: u64) -> RgbSpectrum {
    let mut sampler = IndependentSampler::new(seed);
    let mut sum = [0.0f64; 3];
    for _ in 0..samples {
        let value = integrator.li(scene, &mut sampler, ray);
        for c in 0..3 {
            sum[c] += value[c] as f64;
        }
    }
    RgbSpectrum::new(
        (sum[0] / samples as f64) as Float,
        (sum[1] / samples as f64) as Float,
        (sum[2] / samples as f64) as Float,
    )
}

/// A reflectance model that must never be touched; used to prove that
/// rays missing all geometry never reach shading.
pub struct PanickingBsdf;

impl crate::core::bsdf::Bsdf for PanickingBsdf {
    fn eval(&self, _query: &crate::core::bsdf::BsdfQuery) -> RgbSpectrum {
        panic!("Bsdf::eval() called for a ray that should have missed");
    }

    fn pdf(&self, _query: &crate::core::bsdf::BsdfQuery) -> Float {
        panic!("Bsdf::pdf() called for a ray that should have missed");
    }

    fn sample(&self, _query: &crate::core::bsdf::BsdfQuery,
              _u: &crate::math::constants::Vector2f) -> crate::core::bsdf::BsdfSample {
        panic!("Bsdf::sample() called for a ray that should have missed");
    }
}

/// Sampler stub that counts draws; lets tests assert an estimator
/// consumed no randomness on a given path.
pub struct CountingSampler {
    inner: IndependentSampler,
    pub draws: usize,
}

impl CountingSampler {
    pub fn new(seed: u64) -> Self {
        Self { inner: IndependentSampler::new(seed), draws: 0 }
    }
}

impl Sampler for CountingSampler {
    fn next_1d(&mut self) -> Float {
        self.draws += 1;
        self.inner.next_1d()
    }
}
