use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use duskfall_assets::{AssetLibrary, Vertex};
use duskfall_render::light::SHADOW_MAP_SIZE;
use duskfall_render::{DrawItem, DrawLayer, FramePlan, Material, MeshKind, RenderError, TextureSlot};
use glam::{Mat3, Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::resources::{self, GpuModel, TextureBank};
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const MAX_INSTANCES: usize = 10_000;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    light_space: [[f32; 4]; 4],
    light_pos: [f32; 4],
    light_color: [f32; 4],
    view_pos: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    normal_0: [f32; 4],
    normal_1: [f32; 4],
    normal_2: [f32; 4],
    tint: [f32; 4],
    params: [f32; 4],
}

/// Inverse-transpose of the model's upper 3x3, so normals stay perpendicular
/// to surfaces under non-uniform scale. Degenerate models keep their own 3x3.
pub(crate) fn normal_matrix(model: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(model);
    if linear.determinant().abs() <= f32::EPSILON {
        return linear;
    }
    linear.inverse().transpose()
}

/// Uniforms for the world, sky and HUD views of one plan.
pub(crate) fn frame_uniforms(plan: &FramePlan) -> [FrameUniforms; 3] {
    let c = &plan.celestial;
    let base = |view_proj: Mat4, light_pos: Vec3, view_pos: Vec3| FrameUniforms {
        view_proj: view_proj.to_cols_array_2d(),
        light_space: plan.light.matrix.to_cols_array_2d(),
        light_pos: light_pos.extend(1.0).to_array(),
        light_color: c.light_color.extend(1.0).to_array(),
        view_pos: view_pos.extend(1.0).to_array(),
        params: [plan.flash, 1.0 / SHADOW_MAP_SIZE as f32, 0.0, 0.0],
    };
    let world = base(
        plan.projection * plan.view,
        plan.light.eye,
        plan.camera.eye,
    );
    let sky = base(
        plan.projection * plan.sky_view,
        plan.light.eye,
        plan.camera.eye,
    );
    // The HUD is lit in view space with the camera at the origin.
    let hud = base(
        plan.projection,
        plan.view.transform_point3(plan.light.eye),
        Vec3::ZERO,
    );
    [world, sky, hud]
}

/// Per-draw data for the instance buffer.
///
/// `textured` says whether the backend has a texture for the draw's slot;
/// an untextured weapon takes `weapon_color` as its tint.
pub(crate) fn instance_data(item: &DrawItem, textured: bool, weapon_color: Vec3) -> InstanceData {
    let cols = item.model.to_cols_array_2d();
    let normal = normal_matrix(item.model);
    let receives_shadow = if item.layer == DrawLayer::World { 1.0 } else { 0.0 };
    let (tint, uv_scale, emissive) = match item.material {
        Material::ShadowCaster => (Vec4::ONE, [1.0, 1.0], 0.0),
        Material::Lit { tint, uv_scale, .. } => {
            let tint = if !textured && item.mesh == MeshKind::Weapon {
                tint * weapon_color
            } else {
                tint
            };
            (tint.extend(if textured { 1.0 } else { 0.0 }), uv_scale.to_array(), 0.0)
        }
        Material::Emissive { color } => (color.extend(0.0), [1.0, 1.0], 1.0),
        Material::Sky { tint } => (tint.extend(0.0), [1.0, 1.0], 0.0),
    };
    InstanceData {
        model_0: cols[0],
        model_1: cols[1],
        model_2: cols[2],
        model_3: cols[3],
        normal_0: normal.x_axis.extend(0.0).to_array(),
        normal_1: normal.y_axis.extend(0.0).to_array(),
        normal_2: normal.z_axis.extend(0.0).to_array(),
        tint: tint.to_array(),
        params: [uv_scale[0], uv_scale[1], receives_shadow, emissive],
    }
}

/// Draw counts for one submitted frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub shadow_draws: usize,
    pub color_draws: usize,
}

/// Shadow-mapped forward renderer for [`FramePlan`]s.
pub struct WgpuRenderer {
    shadow_pipeline: wgpu::RenderPipeline,
    lit_pipeline: wgpu::RenderPipeline,
    hud_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    /// World, sky and HUD uniform buffers, in that order.
    frame_buffers: [wgpu::Buffer; 3],
    frame_groups: [wgpu::BindGroup; 3],
    shadow_view: wgpu::TextureView,
    shadow_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    meshes: HashMap<MeshKind, GpuModel>,
    textures: TextureBank,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    const VERTEX: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Float32x3
    ];
    const INSTANCE: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
        11 => Float32x4
    ];
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE,
        },
    ]
}

struct PipelineSpec<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: Option<&'a str>,
    color_format: Option<wgpu::TextureFormat>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
    cull_mode: Option<wgpu::Face>,
}

fn build_pipeline(device: &wgpu::Device, spec: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let buffers = vertex_layouts();
    let targets = [spec.color_format.map(|format| wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })];
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(spec.layout),
        vertex: wgpu::VertexState {
            module: spec.module,
            entry_point: Some(spec.vs),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: spec.fs.map(|fs| wgpu::FragmentState {
            module: spec.module,
            entry_point: Some(fs),
            compilation_options: Default::default(),
            targets: &targets,
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: spec.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        assets: &AssetLibrary,
    ) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_buffers = ["frame_world", "frame_sky", "frame_hud"].map(|label| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });
        let frame_groups = std::array::from_fn(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("frame_group"),
                layout: &frame_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffers[i].as_entire_binding(),
                }],
            })
        });

        let texture_layout = resources::texture_layout(device);
        let cubemap_layout = resources::cubemap_layout(device);
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow_view = create_depth_view(
            device,
            "shadow_map",
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadow_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_group"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        let layout = |label: &str, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                push_constant_ranges: &[],
            })
        };
        let shadow_pl = layout("shadow_layout", &[&frame_layout]);
        let lit_pl = layout("lit_layout", &[&frame_layout, &texture_layout, &shadow_layout]);
        let sky_pl = layout("sky_layout", &[&frame_layout, &cubemap_layout]);

        let module = |label: &str, source: String| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };
        let shadow_shader = module("shadow_shader", shaders::shadow_shader());
        let lit_shader = module("lit_shader", shaders::lit_shader());
        let sky_shader = module("sky_shader", shaders::sky_shader());

        let shadow_pipeline = build_pipeline(
            device,
            PipelineSpec {
                label: "shadow_pipeline",
                layout: &shadow_pl,
                module: &shadow_shader,
                vs: "vs_shadow",
                fs: None,
                color_format: None,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
                cull_mode: None,
            },
        );
        let lit_pipeline = build_pipeline(
            device,
            PipelineSpec {
                label: "lit_pipeline",
                layout: &lit_pl,
                module: &lit_shader,
                vs: "vs_main",
                fs: Some("fs_main"),
                color_format: Some(surface_format),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
                cull_mode: None,
            },
        );
        let hud_pipeline = build_pipeline(
            device,
            PipelineSpec {
                label: "hud_pipeline",
                layout: &lit_pl,
                module: &lit_shader,
                vs: "vs_main",
                fs: Some("fs_main"),
                color_format: Some(surface_format),
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
                cull_mode: None,
            },
        );
        let sky_pipeline = build_pipeline(
            device,
            PipelineSpec {
                label: "sky_pipeline",
                layout: &sky_pl,
                module: &sky_shader,
                vs: "vs_sky",
                fs: Some("fs_sky"),
                color_format: Some(surface_format),
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                cull_mode: None,
            },
        );

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (MAX_INSTANCES * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let meshes = resources::upload_meshes(device, assets);
        let textures = TextureBank::new(device, queue, &texture_layout, &cubemap_layout, assets);
        let depth_texture = create_depth_view(
            device,
            "depth_texture",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        tracing::info!(?surface_format, width, height, "wgpu renderer ready");

        Self {
            shadow_pipeline,
            lit_pipeline,
            hud_pipeline,
            sky_pipeline,
            frame_buffers,
            frame_groups,
            shadow_view,
            shadow_group,
            instance_buffer,
            meshes,
            textures,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = create_depth_view(
            device,
            "depth_texture",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    fn textured(&self, item: &DrawItem) -> bool {
        match item.material {
            Material::Lit {
                texture: Some(slot),
                ..
            } => self.textures.slot(slot).is_some(),
            _ => false,
        }
    }

    /// Encode and submit the shadow pass then the color pass.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        plan: &FramePlan,
    ) -> Result<FrameStats, RenderError> {
        let _span = tracing::trace_span!("wgpu_frame").entered();
        let requested = plan.shadow_pass.len() + plan.color_pass.len();
        if requested > MAX_INSTANCES {
            return Err(RenderError::InstanceOverflow {
                capacity: MAX_INSTANCES,
                requested,
            });
        }

        for (buffer, uniforms) in self.frame_buffers.iter().zip(frame_uniforms(plan)) {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
        }
        let instances: Vec<InstanceData> = plan
            .shadow_pass
            .iter()
            .chain(&plan.color_pass)
            .map(|item| instance_data(item, self.textured(item), self.textures.weapon_color))
            .collect();
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.frame_groups[0], &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (i, item) in plan.shadow_pass.iter().enumerate() {
                self.draw_parts(&mut pass, item, i as u32, false);
            }
        }

        {
            let sky = plan.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("color_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: sky.x as f64,
                            g: sky.y as f64,
                            b: sky.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            let offset = plan.shadow_pass.len() as u32;
            for (i, item) in plan.color_pass.iter().enumerate() {
                match item.layer {
                    DrawLayer::Sky => {
                        pass.set_pipeline(&self.sky_pipeline);
                        pass.set_bind_group(0, &self.frame_groups[1], &[]);
                        pass.set_bind_group(1, &self.textures.sky, &[]);
                    }
                    DrawLayer::Celestial | DrawLayer::World => {
                        let frame = if item.layer == DrawLayer::World { 0 } else { 1 };
                        pass.set_pipeline(&self.lit_pipeline);
                        pass.set_bind_group(0, &self.frame_groups[frame], &[]);
                        pass.set_bind_group(2, &self.shadow_group, &[]);
                    }
                    DrawLayer::Hud => {
                        pass.set_pipeline(&self.hud_pipeline);
                        pass.set_bind_group(0, &self.frame_groups[2], &[]);
                        pass.set_bind_group(2, &self.shadow_group, &[]);
                    }
                }
                self.draw_parts(&mut pass, item, offset + i as u32, item.layer != DrawLayer::Sky);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(FrameStats {
            shadow_draws: plan.shadow_pass.len(),
            color_draws: plan.color_pass.len(),
        })
    }

    /// Draw every part of an item's mesh as instance `instance`. With
    /// `bind_texture`, group 1 gets the part's texture first.
    fn draw_parts(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        item: &DrawItem,
        instance: u32,
        bind_texture: bool,
    ) {
        let Some(model) = self.meshes.get(&item.mesh) else {
            tracing::warn!(mesh = ?item.mesh, "no mesh uploaded");
            return;
        };
        for part in &model.parts {
            if bind_texture {
                let group = match (item.material, &part.material) {
                    (
                        Material::Lit {
                            texture: Some(TextureSlot::Tree),
                            ..
                        },
                        Some(name),
                    ) => self.textures.tree_part(name),
                    (
                        Material::Lit {
                            texture: Some(slot),
                            ..
                        },
                        _,
                    ) => self.textures.slot(slot),
                    _ => None,
                };
                pass.set_bind_group(1, group.unwrap_or(&self.textures.blank), &[]);
            }
            pass.set_vertex_buffer(0, part.buffer.slice(..));
            pass.draw(0..part.vertex_count, instance..instance + 1);
        }
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
