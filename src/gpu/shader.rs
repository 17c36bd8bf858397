//! WGSL generation for the alpha-video compositing program.
//!
//! The vertex stage is fixed. The fragment stage is generated per overlay-source count
//! `N`: with `N == 0` it only recombines the atlas RGB and alpha planes, with `N > 0` it
//! also walks a flat `N * 9` float placement array and composites each active record
//! over the video in array order.
//!
//! Bind group 0 layout shared by every variant:
//!
//! | binding   | resource                                  |
//! |-----------|-------------------------------------------|
//! | 0         | video atlas texture (texture unit 0)      |
//! | 1         | shared filtering sampler                  |
//! | 2         | placement array uniform (`N > 0` only)    |
//! | 2 + k     | overlay texture for unit `k`, `1..=N`     |

use std::{collections::HashMap, fmt::Write as _, sync::Arc};

use crate::foundation::error::{AlphaError, AlphaResult};

/// Numbers per packed placement record.
pub const PLACEMENT_STRIDE: usize = 9;

/// Binding of the video atlas texture.
pub const VIDEO_TEXTURE_BINDING: u32 = 0;
/// Binding of the shared sampler.
pub const SAMPLER_BINDING: u32 = 1;
/// Binding of the placement array uniform.
pub const PLACEMENTS_BINDING: u32 = 2;

/// Vertex entry point name.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point name.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Binding slot of the overlay texture bound to texture unit `unit` (`unit >= 1`).
pub fn overlay_binding(unit: u32) -> u32 {
    PLACEMENTS_BINDING + unit
}

/// Number of `vec4<f32>` slots backing an `N * 9` float placement array.
pub fn placement_slots(source_count: usize) -> usize {
    (source_count * PLACEMENT_STRIDE).div_ceil(4)
}

/// Vertex stage: passes clip position and both atlas UVs through.
pub const VERTEX_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) tex_coord: vec2<f32>,
    @location(2) alpha_tex_coord: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
    @location(1) alpha_tex_coord: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.tex_coord = in.tex_coord;
    out.alpha_tex_coord = in.alpha_tex_coord;
    return out;
}
"#;

/// Generate the fragment stage for `source_count` overlay sources.
pub fn fragment_source(source_count: usize) -> String {
    let mut src = String::with_capacity(1024 + source_count * 160);

    src.push_str(
        "@group(0) @binding(0) var u_image_video: texture_2d<f32>;\n\
         @group(0) @binding(1) var u_sampler: sampler;\n",
    );

    if source_count > 0 {
        let len = source_count * PLACEMENT_STRIDE;
        let _ = writeln!(
            src,
            "@group(0) @binding({PLACEMENTS_BINDING}) var<uniform> image_pos: array<vec4<f32>, {}>;",
            placement_slots(source_count)
        );
        for unit in 1..=source_count as u32 {
            let _ = writeln!(
                src,
                "@group(0) @binding({}) var u_image{unit}: texture_2d<f32>;",
                overlay_binding(unit)
            );
        }
        let _ = write!(
            src,
            "\nconst PER_SIZE: u32 = {PLACEMENT_STRIDE}u;\n\
             const IMAGE_POS_LEN: u32 = {len}u;\n\
             \n\
             fn image_pos_at(i: u32) -> f32 {{\n    \
                 return image_pos[i / 4u][i % 4u];\n\
             }}\n\
             \n\
             fn sample_source(ndx: i32, uv: vec2<f32>) -> vec4<f32> {{\n    \
                 var color = vec4<f32>(0.0);\n    "
        );
        let branches: Vec<String> = (1..=source_count)
            .map(|unit| {
                format!(
                    "if ndx == {unit} {{\n        \
                         color = textureSampleLevel(u_image{unit}, u_sampler, uv, 0.0);\n    \
                     }}"
                )
            })
            .collect();
        src.push_str(&branches.join(" else "));
        src.push_str("\n    return color;\n}\n");
    }

    src.push_str(
        "\n@fragment\n\
         fn fs_main(\n    \
             @location(0) tex_coord: vec2<f32>,\n    \
             @location(1) alpha_tex_coord: vec2<f32>,\n\
         ) -> @location(0) vec4<f32> {\n    \
             var bg_color = vec4<f32>(\n        \
                 textureSample(u_image_video, u_sampler, tex_coord).rgb,\n        \
                 textureSample(u_image_video, u_sampler, alpha_tex_coord).r,\n    \
             );\n",
    );

    if source_count > 0 {
        src.push_str(OVERLAY_LOOP);
    }

    src.push_str("    return bg_color;\n}\n");
    src
}

const OVERLAY_LOOP: &str = r#"
    for (var i = 0u; i < IMAGE_POS_LEN; i = i + PER_SIZE) {
        let src_index = i32(image_pos_at(i));
        if src_index > 0 {
            let x1 = image_pos_at(i + 1u);
            let x2 = image_pos_at(i + 2u);
            let y1 = image_pos_at(i + 3u);
            let y2 = image_pos_at(i + 4u);
            let mx1 = image_pos_at(i + 5u);
            let mx2 = image_pos_at(i + 6u);
            let my1 = image_pos_at(i + 7u);
            let my2 = image_pos_at(i + 8u);

            if tex_coord.x > x1 && tex_coord.x < x2 && tex_coord.y > y1 && tex_coord.y < y2 {
                let src_tex_coord = vec2<f32>(
                    (tex_coord.x - x1) / (x2 - x1),
                    (tex_coord.y - y1) / (y2 - y1),
                );
                let mask_tex_coord = vec2<f32>(
                    mx1 + src_tex_coord.x * (mx2 - mx1),
                    my1 + src_tex_coord.y * (my2 - my1),
                );
                var src_color = sample_source(src_index, src_tex_coord);
                let mask_color = textureSampleLevel(u_image_video, u_sampler, mask_tex_coord, 0.0);
                src_color.a = src_color.a * mask_color.r;
                bg_color = vec4<f32>(src_color.rgb * src_color.a, src_color.a)
                    + (1.0 - src_color.a) * bg_color;
            }
        }
    }
"#;

/// Parse and validate WGSL without a device.
///
/// Returns [`AlphaError::ShaderCompile`] with a formatted diagnostic on failure.
pub fn validate_wgsl(source: &str) -> AlphaResult<()> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| AlphaError::shader_compile(e.emit_to_string(source)))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| AlphaError::shader_compile(e.into_inner().to_string()))?;
    Ok(())
}

/// Memoized fragment sources keyed by overlay-source count.
///
/// Each variant is generated and validated once; later requests for the same count
/// return the cached text.
#[derive(Debug, Default)]
pub struct ShaderVariantCache {
    variants: HashMap<usize, Arc<str>>,
}

impl ShaderVariantCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment source for `source_count`, generating and validating it on first use.
    pub fn fragment(&mut self, source_count: usize) -> AlphaResult<Arc<str>> {
        if let Some(src) = self.variants.get(&source_count) {
            return Ok(src.clone());
        }
        let src: Arc<str> = fragment_source(source_count).into();
        validate_wgsl(&src)?;
        self.variants.insert(source_count, src.clone());
        Ok(src)
    }

    /// Number of memoized variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// `true` when nothing has been generated yet.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/shader.rs"]
mod tests;
