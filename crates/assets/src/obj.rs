//! Wavefront OBJ text to material-grouped triangle lists.
//!
//! Supports `v`, `vt`, `vn`, `f` (any polygon, fan triangulated) and
//! `usemtl`. Other statements are ignored.

use crate::AssetError;
use crate::mesh::{MeshData, Model, SubMesh, Vertex};

const DEFAULT_MATERIAL: &str = "default";
const MISSING_UV: [f32; 2] = [0.0, 0.0];
const MISSING_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

#[derive(Default)]
struct Attributes {
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

impl Attributes {
    fn vertex(&self, corner: &str, line: usize) -> Result<Vertex, AssetError> {
        let mut refs = corner.split('/');
        let position = lookup(&self.positions, refs.next(), line)?.unwrap_or([0.0; 3]);
        let uv = lookup(&self.uvs, refs.next(), line)?.unwrap_or(MISSING_UV);
        let normal = lookup(&self.normals, refs.next(), line)?.unwrap_or(MISSING_NORMAL);
        Ok(Vertex::new(position, uv, normal))
    }
}

/// Resolve a 1-based (or negative, relative) index. Out-of-range indices
/// resolve to `None`; malformed ones are errors.
fn lookup<T: Copy>(items: &[T], field: Option<&str>, line: usize) -> Result<Option<T>, AssetError> {
    let Some(field) = field.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let index: i64 = field.parse().map_err(|_| AssetError::Parse {
        line,
        message: format!("bad index {field:?}"),
    })?;
    let resolved = match index {
        i if i > 0 => usize::try_from(i - 1).ok(),
        i if i < 0 => items.len().checked_sub(i.unsigned_abs() as usize),
        _ => None,
    };
    Ok(resolved.and_then(|i| items.get(i).copied()))
}

fn floats<const N: usize>(fields: &[&str], line: usize) -> Result<[f32; N], AssetError> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let raw = fields.get(i).ok_or_else(|| AssetError::Parse {
            line,
            message: format!("expected {N} numbers"),
        })?;
        *slot = raw.parse().map_err(|_| AssetError::Parse {
            line,
            message: format!("bad number {raw:?}"),
        })?;
    }
    Ok(out)
}

/// Parse OBJ text. Each `usemtl` starts a new part; parts with no faces are
/// dropped.
pub fn parse_obj(text: &str) -> Result<Model, AssetError> {
    let mut attrs = Attributes::default();
    let mut parts = Vec::new();
    let mut current = SubMesh {
        material: DEFAULT_MATERIAL.to_string(),
        mesh: MeshData::default(),
    };

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let mut fields = raw.split_whitespace();
        let Some(tag) = fields.next() else { continue };
        let rest: Vec<&str> = fields.collect();
        match tag {
            "v" => attrs.positions.push(floats(&rest, line)?),
            "vt" => attrs.uvs.push(floats(&rest, line)?),
            "vn" => attrs.normals.push(floats(&rest, line)?),
            "usemtl" => {
                let name = rest.first().copied().unwrap_or(DEFAULT_MATERIAL);
                let next = SubMesh {
                    material: name.to_string(),
                    mesh: MeshData::default(),
                };
                let done = std::mem::replace(&mut current, next);
                if !done.mesh.is_empty() {
                    parts.push(done);
                }
            }
            "f" => {
                if rest.len() < 3 {
                    return Err(AssetError::Parse {
                        line,
                        message: "face needs at least three corners".into(),
                    });
                }
                let corners = rest
                    .iter()
                    .map(|c| attrs.vertex(c, line))
                    .collect::<Result<Vec<_>, _>>()?;
                for k in 1..corners.len() - 1 {
                    current
                        .mesh
                        .vertices
                        .extend([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }
    if !current.mesh.is_empty() {
        parts.push(current);
    }
    Ok(Model { parts })
}
