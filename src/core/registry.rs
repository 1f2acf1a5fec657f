// Copyright @yucwang 2026

use crate::core::bsdf::Bsdf;
use crate::core::integrator::Integrator;
use crate::core::texture::Texture;
use crate::integrators::depth::DepthIntegrator;
use crate::integrators::direct_ems::DirectEmsIntegrator;
use crate::integrators::direct_mats::DirectMatsIntegrator;
use crate::integrators::direct_mis::DirectMisIntegrator;
use crate::integrators::path::PathIntegrator;
use crate::materials::anisotropic::AnisotropicBsdf;
use crate::materials::diffuse::DiffuseBsdf;
use crate::materials::normalmap::NormalmapBsdf;
use crate::materials::roughconductor::RoughConductorBsdf;
use crate::materials::roughdielectric::RoughDielectricBsdf;
use crate::materials::roughsubstrate::RoughSubstrateBsdf;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RgbSpectrum;
use crate::textures::constant::ConstantTexture;
use crate::textures::image::ImageTexture;
use crate::textures::perlin::PerlinTexture;
use std::collections::HashMap;
use std::sync::Arc;

/// Typed property bag handed to plugin constructors, mirroring the
/// name/value children of a scene-description element.
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Number(Float),
    Color(RgbSpectrum),
    Vector(Vector3f),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct PropertyList {
    values: HashMap<String, Value>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self { values: HashMap::new() }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get_float(&self, name: &str, default: Float) -> Float {
        match self.values.get(name) {
            Some(Value::Number(v)) => *v,
            Some(Value::Integer(v)) => *v as Float,
            _ => default,
        }
    }

    pub fn get_integer(&self, name: &str, default: i64) -> i64 {
        match self.values.get(name) {
            Some(Value::Integer(v)) => *v,
            Some(Value::Number(v)) => *v as i64,
            _ => default,
        }
    }

    pub fn get_boolean(&self, name: &str, default: bool) -> bool {
        match self.values.get(name) {
            Some(Value::Boolean(v)) => *v,
            _ => default,
        }
    }

    pub fn get_color(&self, name: &str, default: RgbSpectrum) -> RgbSpectrum {
        match self.values.get(name) {
            Some(Value::Color(v)) => *v,
            Some(Value::Number(v)) => RgbSpectrum::from_float(*v),
            _ => default,
        }
    }

    pub fn get_vector(&self, name: &str) -> Option<Vector3f> {
        match self.values.get(name) {
            Some(Value::Vector(v)) => Some(*v),
            Some(Value::Color(c)) => Some(c.to_vector()),
            _ => None,
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(Value::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Child objects collected for a reflectance-model constructor:
/// textures by binding name plus at most one wrapped base model.
#[derive(Default)]
pub struct BsdfChildren {
    pub textures: HashMap<String, Arc<dyn Texture>>,
    pub base: Option<Arc<dyn Bsdf>>,
}

impl BsdfChildren {
    fn texture_or_color(&self, name: &str, props: &PropertyList,
                        default: RgbSpectrum) -> Arc<dyn Texture> {
        match self.textures.get(name) {
            Some(texture) => texture.clone(),
            None => Arc::new(ConstantTexture::new(props.get_color(name, default))),
        }
    }
}

pub type BsdfConstructor =
    fn(&PropertyList, &BsdfChildren) -> Result<Arc<dyn Bsdf>, String>;
pub type TextureConstructor =
    fn(&PropertyList) -> Result<Arc<dyn Texture>, String>;
pub type IntegratorConstructor =
    fn(&PropertyList) -> Result<Arc<dyn Integrator>, String>;

/// Name-keyed constructor tables preserving the "build a scene from a
/// declarative description" workflow. Unknown names are configuration
/// errors surfaced to the loader.
pub struct Registry {
    bsdfs: HashMap<&'static str, BsdfConstructor>,
    textures: HashMap<&'static str, TextureConstructor>,
    integrators: HashMap<&'static str, IntegratorConstructor>,
}

impl Registry {
    pub fn with_builtin() -> Self {
        let mut registry = Self {
            bsdfs: HashMap::new(),
            textures: HashMap::new(),
            integrators: HashMap::new(),
        };

        registry.register_bsdf("diffuse", |props, children| {
            let albedo = children.texture_or_color("albedo", props,
                                                   RgbSpectrum::from_float(0.5));
            Ok(Arc::new(DiffuseBsdf::new(albedo)))
        });
        registry.register_bsdf("roughconductor", |props, children| {
            let alpha = props.get_float("alpha", 0.1);
            let r0 = children.texture_or_color("R0", props, RgbSpectrum::from_float(0.5));
            Ok(Arc::new(RoughConductorBsdf::new(alpha, r0)))
        });
        registry.register_bsdf("roughsubstrate", |props, children| {
            let alpha = props.get_float("alpha", 0.1);
            let int_ior = props.get_float("intIOR", 1.5046);
            let ext_ior = props.get_float("extIOR", 1.000277);
            let kd = children.texture_or_color("kd", props, RgbSpectrum::from_float(0.5));
            Ok(Arc::new(RoughSubstrateBsdf::new(alpha, int_ior, ext_ior, kd)))
        });
        registry.register_bsdf("roughdielectric", |props, _children| {
            let alpha = props.get_float("alpha", 0.1);
            let int_ior = props.get_float("intIOR", 1.5046);
            let ext_ior = props.get_float("extIOR", 1.000277);
            Ok(Arc::new(RoughDielectricBsdf::new(alpha, int_ior, ext_ior)))
        });
        registry.register_bsdf("anisotropic", |props, _children| {
            let alpha_u = props.get_float("alphaU", 0.2);
            let alpha_v = props.get_float("alphaV", 0.4);
            let eta = props.get_color("eta", RgbSpectrum::new(0.17, 0.35, 1.5));
            let k = props.get_color("k", RgbSpectrum::new(3.1, 2.7, 1.9));
            Ok(Arc::new(AnisotropicBsdf::new(alpha_u, alpha_v, eta, k)))
        });
        registry.register_bsdf("normalmap", |_props, children| {
            let normals = children.textures.get("normalmap").cloned()
                .ok_or_else(|| String::from("normalmap bsdf: no normalmap texture provided"))?;
            let base = children.base.clone()
                .ok_or_else(|| String::from("normalmap bsdf: no base bsdf provided"))?;
            Ok(Arc::new(NormalmapBsdf::new(normals, base)))
        });

        registry.register_texture("constant", |props| {
            Ok(Arc::new(ConstantTexture::new(
                props.get_color("value", RgbSpectrum::from_float(1.0)))))
        });
        registry.register_texture("image", |props| {
            let filename = props.get_text("filename")
                .ok_or_else(|| String::from("image texture: missing filename"))?;
            let srgb = props.get_boolean("srgb", true);
            Ok(Arc::new(ImageTexture::from_image(filename, srgb)?))
        });
        registry.register_texture("perlin", |props| {
            Ok(Arc::new(PerlinTexture::new(
                props.get_color("color", RgbSpectrum::from_float(1.0)),
                props.get_float("scale", 1.0),
                props.get_integer("octaves", 4) as u32,
                props.get_float("scalingBias", 2.0),
                props.get_integer("seed", 42) as u64,
            )))
        });

        registry.register_integrator("depth", |_props| Ok(Arc::new(DepthIntegrator::new())));
        registry.register_integrator("direct_ems", |_props| Ok(Arc::new(DirectEmsIntegrator::new())));
        registry.register_integrator("direct_mats", |_props| Ok(Arc::new(DirectMatsIntegrator::new())));
        registry.register_integrator("direct_mis", |_props| Ok(Arc::new(DirectMisIntegrator::new())));
        registry.register_integrator("path", |props| {
            let max_depth = props.get_integer("maxDepth", 50).max(0) as u32;
            let rr_depth = props.get_integer("rrDepth", 3).max(0) as u32;
            Ok(Arc::new(PathIntegrator::new(max_depth, rr_depth)))
        });

        registry
    }

    pub fn register_bsdf(&mut self, name: &'static str, constructor: BsdfConstructor) {
        self.bsdfs.insert(name, constructor);
    }

    pub fn register_texture(&mut self, name: &'static str, constructor: TextureConstructor) {
        self.textures.insert(name, constructor);
    }

    pub fn register_integrator(&mut self, name: &'static str,
                               constructor: IntegratorConstructor) {
        self.integrators.insert(name, constructor);
    }

    pub fn create_bsdf(&self, name: &str, props: &PropertyList,
                       children: &BsdfChildren) -> Result<Arc<dyn Bsdf>, String> {
        match self.bsdfs.get(name) {
            Some(constructor) => constructor(props, children),
            None => Err(format!("unknown bsdf plugin: {}", name)),
        }
    }

    pub fn create_texture(&self, name: &str,
                          props: &PropertyList) -> Result<Arc<dyn Texture>, String> {
        match self.textures.get(name) {
            Some(constructor) => constructor(props),
            None => Err(format!("unknown texture plugin: {}", name)),
        }
    }

    pub fn create_integrator(&self, name: &str,
                             props: &PropertyList) -> Result<Arc<dyn Integrator>, String> {
        match self.integrators.get(name) {
            Some(constructor) => constructor(props),
            None => Err(format!("unknown integrator plugin: {}", name)),
        }
    }
}
