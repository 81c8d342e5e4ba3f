//! Asset upload: meshes and textures keyed by what the frame plan asks for.

use std::collections::HashMap;

use duskfall_assets::{AssetLibrary, CubemapData, MeshData, TextureData, Vertex};
use duskfall_render::{MeshKind, TextureSlot};
use glam::Vec3;
use wgpu::util::DeviceExt;

/// One vertex buffer plus the texture its material wants.
pub(crate) struct GpuPart {
    pub buffer: wgpu::Buffer,
    pub vertex_count: u32,
    /// Material name for tree parts; the bank picks a texture by it.
    pub material: Option<String>,
}

pub(crate) struct GpuModel {
    pub parts: Vec<GpuPart>,
}

// wgpu rejects zero-sized vertex buffers.
const PLACEHOLDER: [Vertex; 1] = [Vertex::new([0.0; 3], [0.0; 2], [0.0, 1.0, 0.0])];

fn upload_mesh(device: &wgpu::Device, label: &str, mesh: &MeshData) -> GpuPart {
    let vertices: &[Vertex] = if mesh.is_empty() {
        &PLACEHOLDER
    } else {
        &mesh.vertices
    };
    GpuPart {
        buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }),
        vertex_count: mesh.vertex_count() as u32,
        material: None,
    }
}

pub(crate) fn upload_meshes(
    device: &wgpu::Device,
    assets: &AssetLibrary,
) -> HashMap<MeshKind, GpuModel> {
    let single = |label: &str, mesh: &MeshData| GpuModel {
        parts: vec![upload_mesh(device, label, mesh)],
    };
    let tree = GpuModel {
        parts: assets
            .tree
            .parts
            .iter()
            .map(|part| GpuPart {
                material: Some(part.material.clone()),
                ..upload_mesh(device, "tree_part", &part.mesh)
            })
            .collect(),
    };
    HashMap::from([
        (MeshKind::Floor, single("floor", &assets.floor)),
        (MeshKind::Wall, single("wall", &assets.wall)),
        (MeshKind::Tree, tree),
        (MeshKind::Projectile, single("projectile", &assets.projectile)),
        (MeshKind::Heart, single("heart", &assets.heart)),
        (MeshKind::Hostile, single("hostile", &assets.hostile)),
        (MeshKind::Skybox, single("skybox", &assets.skybox)),
        (MeshKind::CelestialDisc, single("disc", &assets.disc)),
        (MeshKind::Weapon, single("weapon", &assets.weapon)),
    ])
}

pub(crate) fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    sampled_layout(device, "texture_layout", wgpu::TextureViewDimension::D2)
}

pub(crate) fn cubemap_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    sampled_layout(device, "cubemap_layout", wgpu::TextureViewDimension::Cube)
}

fn sampled_layout(
    device: &wgpu::Device,
    label: &str,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Texture bind groups for every [`TextureSlot`] and tree material.
pub(crate) struct TextureBank {
    /// Bound for untextured draws so the layout is always satisfied.
    pub blank: wgpu::BindGroup,
    slots: HashMap<TextureSlot, wgpu::BindGroup>,
    tree_parts: HashMap<String, wgpu::BindGroup>,
    /// Tint for the weapon when it has no texture.
    pub weapon_color: Vec3,
    pub sky: wgpu::BindGroup,
}

impl TextureBank {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        cube_layout: &wgpu::BindGroupLayout,
        assets: &AssetLibrary,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("diffuse_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind = |label: &str, tex: &TextureData| {
            let view = upload_texture(device, queue, label, tex);
            sampled_bind_group(device, layout, label, &view, &sampler)
        };

        let mut slots = HashMap::from([
            (TextureSlot::Grass, bind("grass", &assets.grass_texture)),
            (TextureSlot::Wall, bind("wall", &assets.wall_texture)),
            (TextureSlot::Tree, bind("tree", &assets.tree_texture)),
            (TextureSlot::Hostile, bind("hostile", &assets.hostile_texture)),
        ]);
        if let Some(tex) = &assets.weapon_material.texture {
            slots.insert(TextureSlot::Weapon, bind("weapon", tex));
        }
        let tree_parts = assets
            .tree_textures
            .iter()
            .map(|(name, tex)| (name.clone(), bind("tree_part", tex)))
            .collect();
        let blank = bind("blank", &TextureData::solid([255; 4]));

        let sky_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sky_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let sky_view = upload_cubemap(device, queue, &assets.sky);
        let sky = sampled_bind_group(device, cube_layout, "sky", &sky_view, &sky_sampler);

        Self {
            blank,
            slots,
            tree_parts,
            weapon_color: assets.weapon_material.color,
            sky,
        }
    }

    pub fn slot(&self, slot: TextureSlot) -> Option<&wgpu::BindGroup> {
        self.slots.get(&slot)
    }

    /// Texture for a tree part, falling back to the shared tree texture.
    pub fn tree_part(&self, material: &str) -> Option<&wgpu::BindGroup> {
        self.tree_parts
            .get(material)
            .or_else(|| self.slot(TextureSlot::Tree))
    }
}

fn sampled_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    tex: &TextureData,
) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: tex.width,
                height: tex.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &tex.rgba,
    );
    texture.create_view(&Default::default())
}

fn upload_cubemap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    sky: &CubemapData,
) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("skybox"),
            size: wgpu::Extent3d {
                width: sky.size,
                height: sky.size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &sky.faces.concat(),
    );
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("skybox_view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}
