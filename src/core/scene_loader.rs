// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::bsdf::Bsdf;
use crate::core::integrator::Integrator;
use crate::core::registry::{BsdfChildren, PropertyList, Registry, Value};
use crate::core::scene::{Scene, Surface};
use crate::core::sensor::Sensor;
use crate::core::shape::Shape;
use crate::emitters::area::AreaEmitter;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RgbSpectrum;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::rectangle::Rectangle;
use crate::shapes::triangle_mesh::TriangleMesh;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "io error: {}", err),
            SceneLoadError::Parse(message) => write!(f, "parse error: {}", message),
            SceneLoadError::MissingField(name) => write!(f, "missing field: {}", name),
        }
    }
}

impl std::error::Error for SceneLoadError {}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub integrator: Option<Arc<dyn Integrator>>,
    pub sensor: Option<Box<dyn Sensor>>,
    pub samples_per_pixel: Option<u32>,
}

impl std::fmt::Debug for SceneLoadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneLoadResult")
            .field("integrator_present", &self.integrator.is_some())
            .field("sensor_present", &self.sensor.is_some())
            .field("samples_per_pixel", &self.samples_per_pixel)
            .finish()
    }
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneLoadError> {
    let result = load_scene_with_settings(path)?;
    Ok(result.scene)
}

pub fn load_scene_with_settings<P: AsRef<Path>>(path: P)
    -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    log::info!("loading scene from {}", path.display());
    parse_scene(&xml, base_dir)
}

#[derive(Debug, Clone, Copy)]
struct TransformProps {
    translate: Vector3f,
    scale: Vector3f,
    lookat: Option<(Vector3f, Vector3f, Vector3f)>,
}

impl Default for TransformProps {
    fn default() -> Self {
        Self {
            translate: Vector3f::new(0.0, 0.0, 0.0),
            scale: Vector3f::new(1.0, 1.0, 1.0),
            lookat: None,
        }
    }
}

enum Node {
    SceneRoot,
    IntegratorNode { kind: String, props: PropertyList },
    SensorNode { kind: String, props: PropertyList, transform: TransformProps },
    FilmNode { props: PropertyList },
    SamplerNode { props: PropertyList },
    BsdfNode { kind: String, id: Option<String>, props: PropertyList, children: BsdfChildren },
    ShapeNode {
        kind: String,
        props: PropertyList,
        bsdf: Option<Arc<dyn Bsdf>>,
        emitter: Option<PropertyList>,
        transform: TransformProps,
    },
    EmitterNode { kind: String, props: PropertyList },
    TextureNode { kind: String, name: Option<String>, props: PropertyList },
    TransformNode(TransformProps),
    BackgroundNode { props: PropertyList },
    // Property elements written in the open form (<float ...></float>);
    // already applied on the start event.
    Leaf,
}

struct LoaderState {
    scene: Scene,
    registry: Registry,
    base_dir: PathBuf,
    defaults: HashMap<String, String>,
    named_bsdfs: HashMap<String, Arc<dyn Bsdf>>,
    integrator: Option<Arc<dyn Integrator>>,
    sensor: Option<Box<dyn Sensor>>,
    samples_per_pixel: Option<u32>,
}

pub fn parse_scene(xml: &str, base_dir: &Path) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut state = LoaderState {
        scene: Scene::new(),
        registry: Registry::with_builtin(),
        base_dir: base_dir.to_path_buf(),
        defaults: HashMap::new(),
        named_bsdfs: HashMap::new(),
        integrator: None,
        sensor: None,
        samples_per_pixel: None,
    };
    let mut stack: Vec<Node> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(element)) => {
                let node = handle_element(&element, &mut state, &mut stack)?;
                stack.push(node);
            }
            Ok(Event::Empty(element)) => {
                // Self-closing elements fold immediately.
                let node = handle_element(&element, &mut state, &mut stack)?;
                fold_node(node, &mut state, &mut stack)?;
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    fold_node(node, &mut state, &mut stack)?;
                }
            }
            Ok(_) => {}
            Err(err) => return Err(SceneLoadError::Parse(format!("xml error: {}", err))),
        }
        buf.clear();
    }

    state.scene.finalize();
    log::info!("scene loaded: {} surfaces, {} emitters",
               state.scene.surfaces().len(), state.scene.emitter_count());

    Ok(SceneLoadResult {
        scene: state.scene,
        integrator: state.integrator,
        sensor: state.sensor,
        samples_per_pixel: state.samples_per_pixel,
    })
}

/// Interpret one opening (or self-closing) element. Property-like
/// elements are applied to the enclosing node right away and reported
/// as `Leaf`.
fn handle_element(element: &BytesStart, state: &mut LoaderState,
                  stack: &mut Vec<Node>) -> Result<Node, SceneLoadError> {
    let name = element.name().as_ref().to_vec();
    match name.as_slice() {
        b"scene" => Ok(Node::SceneRoot),
        b"default" => {
            let key = attribute(element, b"name", &state.defaults)?
                .ok_or(SceneLoadError::MissingField("default.name"))?;
            let value = attribute(element, b"value", &state.defaults)?
                .ok_or(SceneLoadError::MissingField("default.value"))?;
            state.defaults.insert(key, value);
            Ok(Node::Leaf)
        }
        b"integrator" => Ok(Node::IntegratorNode {
            kind: required_type(element, state)?,
            props: PropertyList::new(),
        }),
        b"sensor" | b"camera" => Ok(Node::SensorNode {
            kind: required_type(element, state)?,
            props: PropertyList::new(),
            transform: TransformProps::default(),
        }),
        b"film" => Ok(Node::FilmNode { props: PropertyList::new() }),
        b"sampler" => Ok(Node::SamplerNode { props: PropertyList::new() }),
        b"bsdf" => Ok(Node::BsdfNode {
            kind: required_type(element, state)?,
            id: attribute(element, b"id", &state.defaults)?,
            props: PropertyList::new(),
            children: BsdfChildren::default(),
        }),
        b"shape" | b"mesh" => Ok(Node::ShapeNode {
            kind: required_type(element, state)?,
            props: PropertyList::new(),
            bsdf: None,
            emitter: None,
            transform: TransformProps::default(),
        }),
        b"emitter" => Ok(Node::EmitterNode {
            kind: required_type(element, state)?,
            props: PropertyList::new(),
        }),
        b"texture" => Ok(Node::TextureNode {
            kind: required_type(element, state)?,
            name: attribute(element, b"name", &state.defaults)?,
            props: PropertyList::new(),
        }),
        b"transform" => Ok(Node::TransformNode(TransformProps::default())),
        b"background" => Ok(Node::BackgroundNode { props: PropertyList::new() }),
        b"ref" => {
            let id = attribute(element, b"id", &state.defaults)?
                .ok_or(SceneLoadError::MissingField("ref.id"))?;
            let bsdf = state.named_bsdfs.get(&id).cloned().ok_or_else(|| {
                SceneLoadError::Parse(format!("reference to unknown bsdf: {}", id))
            })?;
            attach_bsdf(stack, bsdf)?;
            Ok(Node::Leaf)
        }
        b"lookat" | b"look_at" => {
            let origin = vector_attribute(element, b"origin", state)?
                .ok_or(SceneLoadError::MissingField("lookat.origin"))?;
            let target = vector_attribute(element, b"target", state)?
                .ok_or(SceneLoadError::MissingField("lookat.target"))?;
            let up = vector_attribute(element, b"up", state)?
                .unwrap_or_else(|| Vector3f::new(0.0, 1.0, 0.0));
            if let Some(Node::TransformNode(transform)) = stack.last_mut() {
                transform.lookat = Some((origin, target, up));
            }
            Ok(Node::Leaf)
        }
        b"translate" => {
            if let Some(value) = vector_attribute(element, b"value", state)? {
                if let Some(Node::TransformNode(transform)) = stack.last_mut() {
                    transform.translate = value;
                }
            }
            Ok(Node::Leaf)
        }
        b"scale" => {
            if let Some(value) = vector_attribute(element, b"value", state)? {
                if let Some(Node::TransformNode(transform)) = stack.last_mut() {
                    transform.scale = value;
                }
            }
            Ok(Node::Leaf)
        }
        b"float" | b"integer" | b"boolean" | b"string" | b"color" | b"rgb"
        | b"spectrum" | b"point" | b"vector" => {
            let prop_name = attribute(element, b"name", &state.defaults)?
                .ok_or(SceneLoadError::MissingField("property.name"))?;
            let raw = attribute(element, b"value", &state.defaults)?
                .ok_or(SceneLoadError::MissingField("property.value"))?;
            let value = parse_value(&name, &raw)?;
            apply_property(stack, &prop_name, value);
            Ok(Node::Leaf)
        }
        other => Err(SceneLoadError::Parse(format!(
            "unsupported element: {}", String::from_utf8_lossy(other)))),
    }
}

/// Merge a finished node into its parent.
fn fold_node(node: Node, state: &mut LoaderState,
             stack: &mut Vec<Node>) -> Result<(), SceneLoadError> {
    match node {
        Node::Leaf | Node::SceneRoot => Ok(()),

        Node::IntegratorNode { kind, props } => {
            let integrator = state.registry.create_integrator(&kind, &props)
                .map_err(SceneLoadError::Parse)?;
            state.integrator = Some(integrator);
            Ok(())
        }

        Node::TransformNode(transform) => {
            match stack.last_mut() {
                Some(Node::SensorNode { transform: sensor_transform, .. }) => {
                    *sensor_transform = transform;
                }
                Some(Node::ShapeNode { transform: shape_transform, .. }) => {
                    *shape_transform = transform;
                }
                _ => {}
            }
            Ok(())
        }

        Node::FilmNode { props } => {
            if let Some(Node::SensorNode { props: sensor_props, .. }) = stack.last_mut() {
                sensor_props.set("width", Value::Integer(props.get_integer("width", 768)));
                sensor_props.set("height", Value::Integer(props.get_integer("height", 576)));
            }
            Ok(())
        }

        Node::SamplerNode { props } => {
            state.samples_per_pixel = Some(props.get_integer("sampleCount", 32).max(1) as u32);
            Ok(())
        }

        Node::SensorNode { kind, props, transform } => {
            if kind != "perspective" {
                return Err(SceneLoadError::Parse(
                    format!("unsupported sensor: {}", kind)));
            }
            let (origin, target, up) = transform.lookat.unwrap_or((
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(0.0, 0.0, -1.0),
                Vector3f::new(0.0, 1.0, 0.0),
            ));
            let fov_y = props.get_float("fov", 45.0).to_radians();
            let width = props.get_integer("width", 768).max(1) as usize;
            let height = props.get_integer("height", 576).max(1) as usize;
            let near_clip = props.get_float("nearClip", 1e-4);
            let far_clip = props.get_float("farClip", 1e4);
            state.sensor = Some(Box::new(PerspectiveCamera::new(
                origin, target, up, fov_y, width, height, near_clip, far_clip)));
            Ok(())
        }

        Node::TextureNode { kind, name, props } => {
            let mut props = props;
            let resolved = props.get_text("filename")
                .map(|filename| state.base_dir.join(filename));
            if let Some(resolved) = resolved {
                props.set("filename", Value::Text(resolved.to_string_lossy().into_owned()));
            }
            let texture = state.registry.create_texture(&kind, &props)
                .map_err(SceneLoadError::Parse)?;
            let binding = name.unwrap_or_else(|| String::from("albedo"));
            match stack.last_mut() {
                Some(Node::BsdfNode { children, .. }) => {
                    children.textures.insert(binding, texture);
                    Ok(())
                }
                _ => Err(SceneLoadError::Parse(
                    String::from("texture outside of a bsdf element"))),
            }
        }

        Node::BsdfNode { kind, id, props, children } => {
            let bsdf = state.registry.create_bsdf(&kind, &props, &children)
                .map_err(SceneLoadError::Parse)?;
            if matches!(stack.last(), Some(Node::ShapeNode { .. })) {
                return attach_bsdf(stack, bsdf);
            }
            match stack.last_mut() {
                Some(Node::BsdfNode { children: parent_children, .. }) => {
                    if parent_children.base.is_some() {
                        return Err(SceneLoadError::Parse(
                            String::from("bsdf already has a base model")));
                    }
                    parent_children.base = Some(bsdf);
                    Ok(())
                }
                _ => {
                    let id = id.ok_or(SceneLoadError::MissingField("bsdf.id"))?;
                    state.named_bsdfs.insert(id, bsdf);
                    Ok(())
                }
            }
        }

        Node::EmitterNode { kind, props } => {
            if kind != "area" {
                return Err(SceneLoadError::Parse(
                    format!("unsupported emitter: {}", kind)));
            }
            match stack.last_mut() {
                Some(Node::ShapeNode { emitter, .. }) => {
                    if emitter.is_some() {
                        return Err(SceneLoadError::Parse(
                            String::from("shape already has an emitter")));
                    }
                    *emitter = Some(props);
                    Ok(())
                }
                // An area light without a surface cannot exist.
                _ => Err(SceneLoadError::Parse(
                    String::from("area emitter requires an enclosing shape"))),
            }
        }

        Node::ShapeNode { kind, props, bsdf, emitter, transform } => {
            let shape = build_shape(&kind, &props, &transform, state)?;
            let bsdf = match bsdf {
                Some(bsdf) => bsdf,
                // Unassigned surfaces fall back to a neutral diffuse.
                None => state.registry
                    .create_bsdf("diffuse", &PropertyList::new(), &BsdfChildren::default())
                    .map_err(SceneLoadError::Parse)?,
            };

            let mut surface = Surface::new(shape.clone(), bsdf);
            if let Some(emitter_props) = emitter {
                let radiance = emitter_props.get_color("radiance", RgbSpectrum::from_float(1.0));
                let scale = emitter_props.get_float("scale", 1.0);
                let importance = emitter_props.get_float("importance", 1.0);
                surface = surface.with_emitter(Arc::new(
                    AreaEmitter::new(shape, radiance)
                        .with_scale(scale)
                        .with_importance(importance),
                ));
            }
            state.scene.add_surface(surface);
            Ok(())
        }

        Node::BackgroundNode { props } => {
            state.scene.set_background(
                props.get_color("radiance", RgbSpectrum::black()));
            Ok(())
        }
    }
}

fn build_shape(kind: &str, props: &PropertyList, transform: &TransformProps,
               state: &LoaderState) -> Result<Arc<dyn Shape>, SceneLoadError> {
    match kind {
        "obj" => {
            let filename = props.get_text("filename")
                .ok_or(SceneLoadError::MissingField("shape.filename"))?;
            let resolved = state.base_dir.join(filename);
            let mut mesh = TriangleMesh::from_obj(&resolved.to_string_lossy())
                .map_err(|err| SceneLoadError::Parse(
                    format!("failed to load {}: {}", resolved.display(), err)))?;
            mesh.apply_transform(&transform.scale, &transform.translate);
            Ok(Arc::new(mesh))
        }
        "rectangle" => {
            let origin = props.get_vector("origin")
                .ok_or(SceneLoadError::MissingField("rectangle.origin"))?;
            let edge_u = props.get_vector("edgeU")
                .ok_or(SceneLoadError::MissingField("rectangle.edgeU"))?;
            let edge_v = props.get_vector("edgeV")
                .ok_or(SceneLoadError::MissingField("rectangle.edgeV"))?;
            let scale = transform.scale;
            Ok(Arc::new(Rectangle::new(
                origin.component_mul(&scale) + transform.translate,
                edge_u.component_mul(&scale),
                edge_v.component_mul(&scale),
            )))
        }
        other => Err(SceneLoadError::Parse(format!("unsupported shape: {}", other))),
    }
}

fn attach_bsdf(stack: &mut Vec<Node>, bsdf: Arc<dyn Bsdf>) -> Result<(), SceneLoadError> {
    match stack.last_mut() {
        Some(Node::ShapeNode { bsdf: slot, .. }) => {
            if slot.is_some() {
                // One reflectance model per surface.
                return Err(SceneLoadError::Parse(
                    String::from("shape already has a bsdf")));
            }
            *slot = Some(bsdf);
            Ok(())
        }
        _ => Err(SceneLoadError::Parse(String::from("bsdf reference outside of a shape"))),
    }
}

fn apply_property(stack: &mut Vec<Node>, name: &str, value: Value) {
    let props = match stack.last_mut() {
        Some(Node::IntegratorNode { props, .. })
        | Some(Node::SensorNode { props, .. })
        | Some(Node::FilmNode { props })
        | Some(Node::SamplerNode { props })
        | Some(Node::BsdfNode { props, .. })
        | Some(Node::ShapeNode { props, .. })
        | Some(Node::EmitterNode { props, .. })
        | Some(Node::TextureNode { props, .. })
        | Some(Node::BackgroundNode { props }) => props,
        _ => return,
    };
    props.set(name, value);
}

fn attribute(element: &BytesStart, key: &[u8],
             defaults: &HashMap<String, String>) -> Result<Option<String>, SceneLoadError> {
    for attr in element.attributes().flatten() {
        if attr.key.as_ref() == key {
            let raw = attr.unescape_value()
                .map_err(|err| SceneLoadError::Parse(format!("bad attribute: {}", err)))?
                .into_owned();
            return Ok(Some(resolve_value(&raw, defaults)));
        }
    }
    Ok(None)
}

fn required_type(element: &BytesStart,
                 state: &LoaderState) -> Result<String, SceneLoadError> {
    attribute(element, b"type", &state.defaults)?
        .ok_or(SceneLoadError::MissingField("type"))
}

fn vector_attribute(element: &BytesStart, key: &[u8],
                    state: &LoaderState) -> Result<Option<Vector3f>, SceneLoadError> {
    match attribute(element, key, &state.defaults)? {
        Some(raw) => Ok(Some(parse_vector(&raw)?)),
        None => Ok(None),
    }
}

/// Substitute `$name` placeholders from the `<default>` table.
fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    if let Some(stripped) = raw.strip_prefix('$') {
        if let Some(replacement) = defaults.get(stripped) {
            return replacement.clone();
        }
    }
    raw.to_string()
}

fn parse_scalars(raw: &str) -> Result<Vec<Float>, SceneLoadError> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<Float>().map_err(|_| {
            SceneLoadError::Parse(format!("invalid number: {}", token))
        }))
        .collect()
}

fn parse_vector(raw: &str) -> Result<Vector3f, SceneLoadError> {
    let scalars = parse_scalars(raw)?;
    match scalars.as_slice() {
        [x, y, z] => Ok(Vector3f::new(*x, *y, *z)),
        [v] => Ok(Vector3f::new(*v, *v, *v)),
        _ => Err(SceneLoadError::Parse(format!("expected 3 components: {}", raw))),
    }
}

fn parse_value(tag: &[u8], raw: &str) -> Result<Value, SceneLoadError> {
    match tag {
        b"float" => Ok(Value::Number(raw.trim().parse::<Float>().map_err(|_| {
            SceneLoadError::Parse(format!("invalid float: {}", raw))
        })?)),
        b"integer" => Ok(Value::Integer(raw.trim().parse::<i64>().map_err(|_| {
            SceneLoadError::Parse(format!("invalid integer: {}", raw))
        })?)),
        b"boolean" => match raw.trim() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            other => Err(SceneLoadError::Parse(format!("invalid boolean: {}", other))),
        },
        b"string" => Ok(Value::Text(raw.to_string())),
        b"color" | b"rgb" | b"spectrum" => {
            let scalars = parse_scalars(raw)?;
            match scalars.as_slice() {
                [r, g, b] => Ok(Value::Color(RgbSpectrum::new(*r, *g, *b))),
                [v] => Ok(Value::Color(RgbSpectrum::from_float(*v))),
                _ => Err(SceneLoadError::Parse(format!("expected 1 or 3 components: {}", raw))),
            }
        }
        b"point" | b"vector" => Ok(Value::Vector(parse_vector(raw)?)),
        other => Err(SceneLoadError::Parse(format!(
            "unsupported property tag: {}", String::from_utf8_lossy(other)))),
    }
}
