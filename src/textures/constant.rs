// Copyright @yucwang 2026

use crate::core::texture::Texture;
use crate::math::constants::Vector2f;
use crate::math::spectrum::RgbSpectrum;

pub struct ConstantTexture {
    value: RgbSpectrum,
}

impl ConstantTexture {
    pub fn new(value: RgbSpectrum) -> Self {
        Self { value }
    }
}

impl Texture for ConstantTexture {
    fn eval(&self, _uv: Vector2f) -> RgbSpectrum {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::ConstantTexture;
    use crate::core::texture::Texture;
    use crate::math::constants::Vector2f;
    use crate::math::spectrum::RgbSpectrum;

    #[test]
    fn test_constant_texture_eval() {
        let value = RgbSpectrum::new(0.25, 0.5, 0.75);
        let tex = ConstantTexture::new(value);
        let result = tex.eval(Vector2f::new(0.1, 0.9));
        assert_eq!(result, value);
    }
}
