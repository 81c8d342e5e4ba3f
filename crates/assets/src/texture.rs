use std::path::Path;

use image::imageops;

use crate::AssetError;

/// Decoded RGBA8 pixels, rows bottom-up so that v = 0 is the image's
/// bottom edge, as OBJ texcoords expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub const FALLBACK_GRAY: [u8; 4] = [128, 128, 128, 255];

impl TextureData {
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    /// Stand-in for a texture that failed to load.
    pub fn gray() -> Self {
        Self::solid(FALLBACK_GRAY)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut img = image::load_from_memory(bytes)?.to_rgba8();
        imageops::flip_vertical_in_place(&mut img);
        Ok(Self {
            width: img.width(),
            height: img.height(),
            rgba: img.into_raw(),
        })
    }

    pub fn open(path: &Path) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba.get(i..i + 4).and_then(|p| p.try_into().ok())
    }
}

/// Face file order: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBEMAP_FACES: [&str; 6] = [
    "sky_right",
    "sky_left",
    "sky_top",
    "sky_bottom",
    "sky_front",
    "sky_back",
];

const GRADIENT_TOP: [u8; 4] = [60, 100, 180, 255];
const GRADIENT_BOTTOM: [u8; 4] = [20, 40, 90, 255];

/// Six square faces of equal size, rows top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapData {
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

impl CubemapData {
    /// 2x2 blue gradient on every face.
    pub fn gradient() -> Self {
        let face = [GRADIENT_TOP, GRADIENT_TOP, GRADIENT_BOTTOM, GRADIENT_BOTTOM].concat();
        Self {
            size: 2,
            faces: std::array::from_fn(|_| face.clone()),
        }
    }

    /// Assemble from decoded faces in [`CUBEMAP_FACES`] order. All six must be
    /// square and the same size.
    pub fn from_faces(faces: [image::RgbaImage; 6]) -> Result<Self, AssetError> {
        let size = faces[0].width();
        for (name, face) in CUBEMAP_FACES.iter().zip(&faces) {
            if face.width() != size || face.height() != size {
                return Err(AssetError::Cubemap(format!(
                    "{name} is {}x{}, expected {size}x{size}",
                    face.width(),
                    face.height()
                )));
            }
        }
        Ok(Self {
            size,
            faces: faces.map(image::RgbaImage::into_raw),
        })
    }

    /// Load `<face>.<ext>` for each face from `dir`. Any failure fails the
    /// whole cubemap.
    pub fn load(dir: &Path, ext: &str) -> Result<Self, AssetError> {
        let mut decoded = Vec::with_capacity(6);
        for name in CUBEMAP_FACES {
            let path = dir.join(format!("{name}.{ext}"));
            let bytes = std::fs::read(&path)?;
            decoded.push(image::load_from_memory(&bytes)?.to_rgba8());
        }
        let faces: [image::RgbaImage; 6] = decoded
            .try_into()
            .map_err(|_| AssetError::Cubemap("expected six faces".into()))?;
        Self::from_faces(faces)
    }
}
