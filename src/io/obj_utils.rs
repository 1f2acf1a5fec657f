// Copyright @yucwang 2023

use std::fmt;
use std::fs;
use std::path::Path;

use crate::math::constants::{Vector2f, Vector3f};
use wavefront_obj::{obj, ParseError};

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::Parse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::Parse(err) => write!(f, "parse error: {}", err),
        }
    }
}

impl std::error::Error for ObjLoadError {}

pub type MeshData = (Vec<Vector3f>, Vec<Vector3f>, Vec<Vector2f>, Vec<[usize; 3]>);

pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<MeshData, ParseError> {
    let triangulated = triangulate_faces(input.as_ref());
    let obj_set = obj::parse(triangulated)?;
    Ok(flatten_obj_set(&obj_set))
}

pub fn load_obj_from_file<P: AsRef<Path>>(path: P) -> Result<MeshData, ObjLoadError> {
    let data = fs::read_to_string(path)?;
    let mesh = load_obj_from_str(data)?;
    Ok(mesh)
}

/// Expand the OBJ index triples into flat per-vertex arrays; corners
/// are duplicated so position, normal and uv share one index space.
fn flatten_obj_set(obj_set: &obj::ObjSet) -> MeshData {
    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();
    let mut all_normals_present = true;
    let mut all_uvs_present = true;

    for object in &obj_set.objects {
        for geometry in &object.geometry {
            for shape in &geometry.shapes {
                if let obj::Primitive::Triangle(a, b, c) = shape.primitive {
                    let base = vertices.len();
                    for corner in &[a, b, c] {
                        let v = object.vertices[corner.0];
                        vertices.push(Vector3f::new(v.x as f32, v.y as f32, v.z as f32));

                        match corner.2.and_then(|i| object.normals.get(i)) {
                            Some(n) => normals.push(
                                Vector3f::new(n.x as f32, n.y as f32, n.z as f32)),
                            None => all_normals_present = false,
                        }
                        match corner.1.and_then(|i| object.tex_vertices.get(i)) {
                            Some(t) => uvs.push(Vector2f::new(t.u as f32, t.v as f32)),
                            None => all_uvs_present = false,
                        }
                    }
                    indices.push([base, base + 1, base + 2]);
                }
            }
        }
    }

    if !all_normals_present {
        normals.clear();
    }
    if !all_uvs_present {
        uvs.clear();
    }
    (vertices, normals, uvs, indices)
}

fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for i in 2..(parts.len() - 1) {
                    out.push_str("f ");
                    out.push_str(base);
                    out.push(' ');
                    out.push_str(parts[i]);
                    out.push(' ');
                    out.push_str(parts[i + 1]);
                    out.push('\n');
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_obj_from_str_basic() {
        let input = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let (vertices, normals, uvs, indices) =
            load_obj_from_str(input).expect("failed to parse obj");
        assert_eq!(vertices.len(), 3);
        assert_eq!(indices.len(), 1);
        assert!(normals.is_empty());
        assert!(uvs.is_empty());
    }

    #[test]
    fn test_load_obj_triangulates_quads() {
        let input = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";
        let (vertices, _, _, indices) =
            load_obj_from_str(input).expect("failed to parse obj");
        assert_eq!(indices.len(), 2);
        assert_eq!(vertices.len(), 6);
    }
}
