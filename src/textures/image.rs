// Copyright @yucwang 2026

use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::RgbSpectrum;
use image::io::Reader as ImageReader;

fn srgb_to_linear(v: Float) -> Float {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Bilinearly filtered image lookup with repeat wrapping.
pub struct ImageTexture {
    width: usize,
    height: usize,
    data: Vec<RgbSpectrum>,
}

impl ImageTexture {
    pub fn from_image(path: &str, srgb: bool) -> Result<Self, String> {
        let img = ImageReader::open(path)
            .map_err(|e| format!("failed to open image {}: {}", path, e))?
            .decode()
            .map_err(|e| format!("failed to decode image {}: {}", path, e))?;

        let rgb = img.to_rgb32f();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        if width == 0 || height == 0 {
            return Err(format!("image {} has zero size", path));
        }

        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let p = rgb.get_pixel(x as u32, y as u32);
                let (mut r, mut g, mut b) = (p[0], p[1], p[2]);
                if srgb {
                    r = srgb_to_linear(r);
                    g = srgb_to_linear(g);
                    b = srgb_to_linear(b);
                }
                data.push(RgbSpectrum::new(r, g, b));
            }
        }
        log::info!("loaded texture {} ({}x{})", path, width, height);
        Ok(Self { width, height, data })
    }

    pub fn from_pixels(width: usize, height: usize, data: Vec<RgbSpectrum>) -> Self {
        assert_eq!(data.len(), width * height);
        Self { width, height, data }
    }

    fn texel(&self, x: isize, y: isize) -> RgbSpectrum {
        let x = x.rem_euclid(self.width as isize) as usize;
        let y = y.rem_euclid(self.height as isize) as usize;
        self.data[y * self.width + x]
    }
}

impl Texture for ImageTexture {
    fn eval(&self, uv: Vector2f) -> RgbSpectrum {
        let x = uv.x * self.width as Float - 0.5;
        let y = uv.y * self.height as Float - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as isize;
        let y0 = y0 as isize;

        let top = RgbSpectrum::lerp(self.texel(x0, y0), self.texel(x0 + 1, y0), fx);
        let bottom = RgbSpectrum::lerp(self.texel(x0, y0 + 1), self.texel(x0 + 1, y0 + 1), fx);
        RgbSpectrum::lerp(top, bottom, fy)
    }
}
