/// Per-frame uniforms, shared by every pipeline at group 0.
const FRAME: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    light_space: mat4x4<f32>,
    light_pos: vec4<f32>,
    light_color: vec4<f32>,
    view_pos: vec4<f32>,
    // x: muzzle flash, y: shadow texel size
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    // inverse-transpose of the model's 3x3, one column per attribute
    @location(9) normal_0: vec4<f32>,
    @location(10) normal_1: vec4<f32>,
    @location(11) normal_2: vec4<f32>,
    // rgb: tint, a: 1 when textured
    @location(7) tint: vec4<f32>,
    // xy: uv scale, z: receives shadow, w: emissive
    @location(8) params: vec4<f32>,
};

fn model_matrix(instance: InstanceInput) -> mat4x4<f32> {
    return mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
}

fn normal_matrix(instance: InstanceInput) -> mat3x3<f32> {
    return mat3x3<f32>(
        instance.normal_0.xyz,
        instance.normal_1.xyz,
        instance.normal_2.xyz,
    );
}
"#;

/// Depth-only pass from the light.
const SHADOW_BODY: &str = r#"
@vertex
fn vs_shadow(vertex: VertexInput, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let world = model_matrix(instance) * vec4<f32>(vertex.position, 1.0);
    return frame.light_space * world;
}
"#;

/// Phong with 3x3 PCF shadows, textured or flat, plus emissive discs.
const LIT_BODY: &str = r#"
const AMBIENT_STRENGTH: f32 = 0.3;
const SPECULAR_STRENGTH: f32 = 0.5;
const SHININESS: f32 = 32.0;
const MIN_BIAS: f32 = 0.005;

@group(1) @binding(0)
var diffuse_tex: texture_2d<f32>;
@group(1) @binding(1)
var diffuse_sampler: sampler;

@group(2) @binding(0)
var shadow_map: texture_depth_2d;
@group(2) @binding(1)
var shadow_sampler: sampler_comparison;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) light_clip: vec4<f32>,
    @location(4) tint: vec4<f32>,
    @location(5) flags: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = model_matrix(instance);
    let world = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = normal_matrix(instance) * vertex.normal;
    out.uv = vertex.uv * instance.params.xy;
    out.light_clip = frame.light_space * world;
    out.tint = instance.tint;
    out.flags = instance.params.zw;
    return out;
}

fn shadow_amount(light_clip: vec4<f32>, bias: f32) -> f32 {
    let ndc = light_clip.xyz / light_clip.w;
    let coords = vec3<f32>(ndc.x * 0.5 + 0.5, 1.0 - (ndc.y * 0.5 + 0.5), ndc.z);
    if coords.z > 1.0 {
        return 0.0;
    }
    let texel = frame.params.y;
    var lit = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, coords.xy + offset, coords.z - bias);
        }
    }
    return 1.0 - lit / 9.0;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(diffuse_tex, diffuse_sampler, in.uv);
    let textured = in.tint.a > 0.5;
    if textured && texel.a < 0.1 {
        discard;
    }
    let color = select(in.tint.rgb, texel.rgb * in.tint.rgb, textured);
    if in.flags.y > 0.5 {
        return vec4<f32>(color, 1.0);
    }

    let n = normalize(in.world_normal);
    let l = normalize(frame.light_pos.xyz - in.world_pos);
    let v = normalize(frame.view_pos.xyz - in.world_pos);
    let r = reflect(-l, n);
    let n_dot_l = dot(n, l);

    let ambient = AMBIENT_STRENGTH * color;
    let diffuse = max(n_dot_l, 0.0) * frame.light_color.rgb * color;
    let specular = SPECULAR_STRENGTH * pow(max(dot(v, r), 0.0), SHININESS) * frame.light_color.rgb;

    var shadow = 0.0;
    if in.flags.x > 0.5 {
        shadow = shadow_amount(in.light_clip, max(MIN_BIAS * (1.0 - n_dot_l), MIN_BIAS));
    }
    let flash = frame.params.x * color;
    return vec4<f32>(ambient + (1.0 - shadow) * (diffuse + specular) + flash, 1.0);
}
"#;

/// Cubemap at infinity, tinted by time of day.
const SKY_BODY: &str = r#"
@group(1) @binding(0)
var sky_tex: texture_cube<f32>;
@group(1) @binding(1)
var sky_sampler: sampler;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
    @location(1) tint: vec3<f32>,
};

@vertex
fn vs_sky(vertex: VertexInput, instance: InstanceInput) -> SkyOutput {
    let pos = frame.view_proj * vec4<f32>(vertex.position, 1.0);
    var out: SkyOutput;
    // z = w puts every sky fragment on the far plane.
    out.clip_position = pos.xyww;
    out.direction = vertex.position;
    out.tint = instance.tint.rgb;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(sky_tex, sky_sampler, in.direction);
    return vec4<f32>(texel.rgb * in.tint, 1.0);
}
"#;

pub fn shadow_shader() -> String {
    [FRAME, SHADOW_BODY].concat()
}

pub fn lit_shader() -> String {
    [FRAME, LIT_BODY].concat()
}

pub fn sky_shader() -> String {
    [FRAME, SKY_BODY].concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use duskfall_render::shading::{AMBIENT_STRENGTH, SHININESS, SPECULAR_STRENGTH};

    #[test]
    fn lit_shader_matches_cpu_reference() {
        let src = lit_shader();
        for (name, value) in [
            ("AMBIENT_STRENGTH", AMBIENT_STRENGTH),
            ("SPECULAR_STRENGTH", SPECULAR_STRENGTH),
            ("SHININESS", SHININESS),
        ] {
            let decl = format!("const {name}: f32 = {value:?};");
            assert!(src.contains(&decl), "missing {decl}");
        }
    }

    #[test]
    fn entry_points_exist() {
        assert!(shadow_shader().contains("fn vs_shadow"));
        assert!(lit_shader().contains("fn vs_main") && lit_shader().contains("fn fs_main"));
        assert!(sky_shader().contains("fn vs_sky") && sky_shader().contains("fn fs_sky"));
    }
}
