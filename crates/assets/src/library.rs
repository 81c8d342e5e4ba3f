use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::AssetError;
use crate::mesh::{self, MeshData, Model};
use crate::mtl::{MaterialTable, parse_mtl};
use crate::obj::parse_obj;
use crate::texture::{CubemapData, TextureData};

pub const FLOOR_SIZE: f32 = 100.0;
pub const PROJECTILE_MESH_RADIUS: f32 = 0.2;
const PROJECTILE_SEGMENTS: u32 = 12;
const DISC_SEGMENTS: u32 = 40;
/// Weapon color when its material has neither texture nor Kd.
pub const WEAPON_FALLBACK_COLOR: Vec3 = Vec3::splat(0.6);

/// Color and optional texture for a single-material model.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    pub color: Vec3,
    pub texture: Option<TextureData>,
}

/// One asset that could not be read and what replaced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallback {
    pub asset: String,
    pub reason: String,
}

/// What [`AssetLibrary::load`] found and what it substituted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub root: Option<PathBuf>,
    pub loaded: Vec<String>,
    pub fallbacks: Vec<Fallback>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.fallbacks.is_empty()
    }

    pub fn to_json(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Every mesh and texture the arena draws, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    pub tree: Model,
    /// Tree part textures keyed by material name.
    pub tree_textures: BTreeMap<String, TextureData>,
    /// Used for tree parts without their own texture.
    pub tree_texture: TextureData,
    pub weapon: MeshData,
    pub weapon_material: SurfaceMaterial,
    pub hostile: MeshData,
    pub hostile_texture: TextureData,
    pub heart: MeshData,
    pub wall: MeshData,
    pub wall_texture: TextureData,
    pub floor: MeshData,
    pub grass_texture: TextureData,
    pub projectile: MeshData,
    pub disc: MeshData,
    pub skybox: MeshData,
    pub sky: CubemapData,
    report: LoadReport,
}

impl AssetLibrary {
    /// Procedural stand-ins only. Touches no files.
    pub fn builtin() -> Self {
        Self {
            tree: Model::single("default", mesh::cube()),
            tree_textures: BTreeMap::new(),
            tree_texture: TextureData::gray(),
            weapon: mesh::cube(),
            weapon_material: SurfaceMaterial {
                color: WEAPON_FALLBACK_COLOR,
                texture: None,
            },
            hostile: mesh::cube(),
            hostile_texture: TextureData::gray(),
            heart: mesh::cube(),
            wall: mesh::cube(),
            wall_texture: TextureData::gray(),
            floor: mesh::floor(FLOOR_SIZE),
            grass_texture: TextureData::gray(),
            projectile: mesh::uv_sphere(
                PROJECTILE_MESH_RADIUS,
                PROJECTILE_SEGMENTS,
                PROJECTILE_SEGMENTS,
            ),
            disc: mesh::uv_sphere(1.0, DISC_SEGMENTS, DISC_SEGMENTS),
            skybox: mesh::cube(),
            sky: CubemapData::gradient(),
            report: LoadReport::default(),
        }
    }

    /// Load from `dir`, substituting a fallback for each file that is
    /// missing or unreadable. Never fails.
    pub fn load(dir: &Path) -> Self {
        let _span = tracing::info_span!("assets", dir = %dir.display()).entered();
        let mut loader = Loader {
            dir,
            report: LoadReport {
                root: Some(dir.to_path_buf()),
                ..LoadReport::default()
            },
        };
        let mut lib = Self::builtin();

        if let Some(tree) = loader.model("tree.obj") {
            lib.tree = tree;
        }
        let tree_materials = loader.materials("tree.mtl");
        for def in tree_materials.iter() {
            if let Some(file) = &def.texture {
                lib.tree_textures
                    .insert(def.name.clone(), loader.texture(file));
            }
        }
        lib.tree_texture = loader.texture("tree.jpg");

        if let Some(weapon) = loader.model("weapon.obj") {
            lib.weapon = weapon.flatten();
        }
        if let Some(def) = loader.materials("weapon.mtl").first() {
            lib.weapon_material = SurfaceMaterial {
                color: def.diffuse,
                texture: def.texture.as_deref().map(|f| loader.texture(f)),
            };
        }

        if let Some(hostile) = loader.model("hostile.obj") {
            lib.hostile = hostile.flatten();
        }
        lib.hostile_texture = loader.texture("hostile.jpg");
        if let Some(heart) = loader.model("heart.obj") {
            lib.heart = heart.flatten();
        }
        lib.wall_texture = loader.texture("wall.png");
        lib.grass_texture = loader.texture("grass.jpg");

        match CubemapData::load(dir, "jpg") {
            Ok(sky) => {
                loader.report.loaded.push("sky_*.jpg".into());
                lib.sky = sky;
            }
            Err(err) => loader.fell_back("sky_*.jpg", &err, "gradient sky"),
        }

        lib.report = loader.report;
        tracing::info!(
            loaded = lib.report.loaded.len(),
            fallbacks = lib.report.fallbacks.len(),
            "assets loaded"
        );
        lib
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Texture for one tree part.
    pub fn tree_part_texture(&self, material: &str) -> &TextureData {
        self.tree_textures
            .get(material)
            .unwrap_or(&self.tree_texture)
    }
}

struct Loader<'a> {
    dir: &'a Path,
    report: LoadReport,
}

impl Loader<'_> {
    fn fell_back(&mut self, asset: &str, err: &AssetError, with: &str) {
        tracing::warn!(asset, error = %err, "using {with}");
        self.report.fallbacks.push(Fallback {
            asset: asset.to_string(),
            reason: err.to_string(),
        });
    }

    fn read(&self, file: &str) -> Result<String, AssetError> {
        Ok(std::fs::read_to_string(self.dir.join(file))?)
    }

    fn model(&mut self, file: &str) -> Option<Model> {
        let parsed = self.read(file).and_then(|text| parse_obj(&text));
        match parsed {
            Ok(model) if !model.is_empty() => {
                tracing::debug!(file, vertices = model.vertex_count(), "model loaded");
                self.report.loaded.push(file.to_string());
                Some(model)
            }
            Ok(_) => {
                self.fell_back(file, &AssetError::Empty(file.to_string()), "unit cube");
                None
            }
            Err(err) => {
                self.fell_back(file, &err, "unit cube");
                None
            }
        }
    }

    fn materials(&mut self, file: &str) -> MaterialTable {
        match self.read(file).and_then(|text| parse_mtl(&text)) {
            Ok(table) => {
                self.report.loaded.push(file.to_string());
                table
            }
            Err(err) => {
                self.fell_back(file, &err, "no materials");
                MaterialTable::default()
            }
        }
    }

    fn texture(&mut self, file: &str) -> TextureData {
        match TextureData::open(&self.dir.join(file)) {
            Ok(tex) => {
                self.report.loaded.push(file.to_string());
                tex
            }
            Err(err) => {
                self.fell_back(file, &err, "gray texture");
                TextureData::gray()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn write_png(dir: &Path, name: &str, color: [u8; 4]) {
        RgbaImage::from_pixel(2, 2, Rgba(color))
            .save_with_format(dir.join(name), ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn empty_directory_falls_back_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let lib = AssetLibrary::load(dir.path());
        let report = lib.report();
        assert!(report.loaded.is_empty());
        assert!(!report.is_complete());
        assert_eq!(lib.hostile, mesh::cube());
        assert_eq!(lib.grass_texture, TextureData::gray());
        assert_eq!(lib.sky, CubemapData::gradient());
        assert_eq!(lib.weapon_material.color, WEAPON_FALLBACK_COLOR);
        assert!(report.fallbacks.iter().any(|f| f.asset == "sky_*.jpg"));
    }

    #[test]
    fn missing_directory_still_loads() {
        let lib = AssetLibrary::load(Path::new("/definitely/not/here"));
        assert_eq!(lib.floor.triangle_count(), 2);
        assert_eq!(lib.projectile.vertex_count(), 12 * 12 * 6);
    }

    #[test]
    fn present_files_replace_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        std::fs::write(p.join("hostile.obj"), TRIANGLE).unwrap();
        std::fs::write(
            p.join("tree.obj"),
            format!("{TRIANGLE}usemtl Bark\nf 1 2 3\nusemtl Leaves\nf 3 2 1\n"),
        )
        .unwrap();
        std::fs::write(p.join("tree.mtl"), "newmtl Bark\nmap_Kd bark.png\n").unwrap();
        write_png(p, "bark.png", [90, 60, 30, 255]);
        write_png(p, "wall.png", [200, 200, 200, 255]);

        let lib = AssetLibrary::load(p);
        assert_eq!(lib.hostile.vertex_count(), 3);
        assert_eq!(lib.tree.parts.len(), 3);
        assert_eq!(lib.tree_part_texture("Bark").pixel(0, 0), Some([90, 60, 30, 255]));
        assert_eq!(lib.tree_part_texture("Leaves"), &TextureData::gray());
        assert_eq!(lib.wall_texture.width, 2);
        for file in ["hostile.obj", "tree.obj", "tree.mtl", "bark.png", "wall.png"] {
            assert!(lib.report().loaded.iter().any(|f| f == file), "{file}");
        }
    }

    #[test]
    fn weapon_uses_first_material_color() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("weapon.mtl"),
            "newmtl Steel\nKd 0.2 0.3 0.4\nnewmtl Other\nKd 1 0 0\n",
        )
        .unwrap();
        let lib = AssetLibrary::load(dir.path());
        assert_eq!(lib.weapon_material.color, Vec3::new(0.2, 0.3, 0.4));
        assert!(lib.weapon_material.texture.is_none());
    }

    #[test]
    fn empty_obj_counts_as_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("heart.obj"), "# nothing\n").unwrap();
        let lib = AssetLibrary::load(dir.path());
        assert_eq!(lib.heart, mesh::cube());
        assert!(lib.report().fallbacks.iter().any(|f| f.asset == "heart.obj"));
    }

    #[test]
    fn report_serializes() {
        let lib = AssetLibrary::load(Path::new("/nope"));
        let json = lib.report().to_json().unwrap();
        let back: LoadReport = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, lib.report());
    }
}
