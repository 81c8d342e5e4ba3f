use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};

/// Interleaved vertex: position, texcoord, normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }
}

/// Unindexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(mut lo, mut hi), v| {
            for i in 0..3 {
                lo[i] = lo[i].min(v.position[i]);
                hi[i] = hi[i].max(v.position[i]);
            }
            (lo, hi)
        }))
    }
}

/// A run of triangles sharing one material.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub material: String,
    pub mesh: MeshData,
}

/// A model split by material, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub parts: Vec<SubMesh>,
}

impl Model {
    pub fn single(material: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            parts: vec![SubMesh {
                material: material.into(),
                mesh,
            }],
        }
    }

    /// All parts merged into one triangle list.
    pub fn flatten(&self) -> MeshData {
        MeshData {
            vertices: self
                .parts
                .iter()
                .flat_map(|p| p.mesh.vertices.iter().copied())
                .collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.vertex_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }
}

const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    // normal, u axis, v axis
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
];

/// Unit cube centred on the origin, 36 vertices, counter-clockwise outward.
pub fn cube() -> MeshData {
    let mut vertices = Vec::with_capacity(36);
    for (n, u, v) in CUBE_FACES {
        let corner = |su: f32, sv: f32| {
            let p = [
                0.5 * (n[0] + su * u[0] + sv * v[0]),
                0.5 * (n[1] + su * u[1] + sv * v[1]),
                0.5 * (n[2] + su * u[2] + sv * v[2]),
            ];
            Vertex::new(p, [(su + 1.0) / 2.0, (sv + 1.0) / 2.0], n)
        };
        let (a, b, c, d) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );
        vertices.extend([a, b, c, a, c, d]);
    }
    MeshData { vertices }
}

/// Latitude/longitude sphere with outward normals and zero texcoords.
pub fn uv_sphere(radius: f32, lat: u32, lon: u32) -> MeshData {
    let (lat, lon) = (lat.max(2), lon.max(3));
    let point = |i: u32, j: u32| {
        let theta = i as f32 * PI / lat as f32;
        let phi = j as f32 * TAU / lon as f32;
        let n = [phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin()];
        Vertex::new([n[0] * radius, n[1] * radius, n[2] * radius], [0.0, 0.0], n)
    };
    let mut vertices = Vec::with_capacity((lat * lon * 6) as usize);
    for i in 0..lat {
        for j in 0..lon {
            vertices.extend([
                point(i, j),
                point(i + 1, j),
                point(i, j + 1),
                point(i + 1, j),
                point(i + 1, j + 1),
                point(i, j + 1),
            ]);
        }
    }
    MeshData { vertices }
}

/// Square ground quad on y = 0, facing up, texcoords 0..1.
pub fn floor(size: f32) -> MeshData {
    let s = size / 2.0;
    let up = [0.0, 1.0, 0.0];
    let a = Vertex::new([-s, 0.0, s], [0.0, 0.0], up);
    let b = Vertex::new([s, 0.0, s], [1.0, 0.0], up);
    let c = Vertex::new([s, 0.0, -s], [1.0, 1.0], up);
    let d = Vertex::new([-s, 0.0, -s], [0.0, 1.0], up);
    MeshData {
        vertices: vec![a, b, d, d, b, c],
    }
}
