// Copyright @yucwang 2026

use crate::core::sampler::{IndependentSampler, Sampler};
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::RgbSpectrum;

/// Procedural value-noise texture: a lattice of random values blended
/// over several octaves. The lattice belongs to the texture instance,
/// generated from its own seed, so independent textures (or scene
/// reloads) never interfere.
pub struct PerlinTexture {
    color: RgbSpectrum,
    scale: Float,
    octaves: u32,
    scaling_bias: Float,
    size: usize,
    noise_seed: Vec<Float>,
}

impl PerlinTexture {
    pub fn new(color: RgbSpectrum, scale: Float, octaves: u32,
               scaling_bias: Float, seed: u64) -> Self {
        let size = 256usize;
        let octaves = octaves.min(8);
        let scaling_bias = scaling_bias.max(0.2);

        let mut rng = IndependentSampler::new(seed);
        let mut noise_seed = Vec::with_capacity(size * size);
        for _ in 0..size * size {
            noise_seed.push(rng.next_1d());
        }

        Self { color, scale, octaves, scaling_bias, size, noise_seed }
    }

    fn lattice(&self, x: usize, y: usize) -> Float {
        self.noise_seed[(y % self.size) * self.size + (x % self.size)]
    }

    fn noise_2d(&self, uv: &Vector2f) -> Float {
        let x = (uv.x * self.size as Float * self.scale).abs();
        let y = (uv.y * self.size as Float * self.scale).abs();

        let mut noise = 0.0;
        let mut scale_acc = 0.0;
        let mut scale = 1.0;

        for octave in 0..self.octaves {
            let pitch = (self.size >> octave).max(1);
            let sample_x1 = (x as usize / pitch) * pitch;
            let sample_y1 = (y as usize / pitch) * pitch;
            let sample_x2 = (sample_x1 + pitch) % self.size;
            let sample_y2 = (sample_y1 + pitch) % self.size;

            let blend_x = (x - sample_x1 as Float) / pitch as Float;
            let blend_y = (y - sample_y1 as Float) / pitch as Float;

            let sample_t = (1.0 - blend_x) * self.lattice(sample_x1, sample_y1)
                + blend_x * self.lattice(sample_x2, sample_y1);
            let sample_b = (1.0 - blend_x) * self.lattice(sample_x1, sample_y2)
                + blend_x * self.lattice(sample_x2, sample_y2);

            scale_acc += scale;
            noise += (blend_y * (sample_b - sample_t) + sample_t) * scale;
            scale /= self.scaling_bias;
        }

        noise / scale_acc
    }
}

impl Texture for PerlinTexture {
    fn eval(&self, uv: Vector2f) -> RgbSpectrum {
        self.color * self.noise_2d(&uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perlin_range_and_determinism() {
        let a = PerlinTexture::new(RgbSpectrum::from_float(1.0), 1.0, 4, 2.0, 42);
        let b = PerlinTexture::new(RgbSpectrum::from_float(1.0), 1.0, 4, 2.0, 42);

        for i in 0..32 {
            for j in 0..32 {
                let uv = Vector2f::new(i as Float / 32.0, j as Float / 32.0);
                let va = a.eval(uv);
                assert!(va[0] >= 0.0 && va[0] <= 1.0 + 1e-5);
                // Same seed, same lattice.
                assert_eq!(va, b.eval(uv));
            }
        }
    }

    #[test]
    fn test_perlin_instances_are_independent() {
        let a = PerlinTexture::new(RgbSpectrum::from_float(1.0), 1.0, 4, 2.0, 1);
        let b = PerlinTexture::new(RgbSpectrum::from_float(1.0), 1.0, 4, 2.0, 2);

        let mut differs = false;
        for i in 0..16 {
            let uv = Vector2f::new(i as Float / 16.0, 0.3);
            if a.eval(uv) != b.eval(uv) {
                differs = true;
            }
        }
        assert!(differs);
    }
}
