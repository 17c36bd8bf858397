use super::*;

fn overlay_sampler_decls(src: &str) -> usize {
    src.lines()
        .filter(|l| l.contains("var u_image") && !l.contains("u_image_video"))
        .count()
}

#[test]
fn zero_sources_is_a_plain_lookup() {
    let src = fragment_source(0);
    assert!(!src.contains("for ("));
    assert!(!src.contains("image_pos"));
    assert!(!src.contains("sample_source"));
    assert_eq!(overlay_sampler_decls(&src), 0);
    assert!(src.contains("textureSample(u_image_video, u_sampler, alpha_tex_coord).r"));
}

#[test]
fn three_sources_declare_three_samplers_and_27_numbers() {
    let src = fragment_source(3);
    assert_eq!(overlay_sampler_decls(&src), 3);
    assert!(src.contains("const IMAGE_POS_LEN: u32 = 27u;"));
    assert!(src.contains("var<uniform> image_pos: array<vec4<f32>, 7>;"));
    assert!(src.contains("@group(0) @binding(3) var u_image1: texture_2d<f32>;"));
    assert!(src.contains("@group(0) @binding(5) var u_image3: texture_2d<f32>;"));
    assert!(!src.contains("u_image4"));
}

#[test]
fn dispatch_is_one_branch_per_unit() {
    let src = fragment_source(3);
    for unit in 1..=3 {
        assert!(src.contains(&format!("if ndx == {unit} {{")));
    }
    assert_eq!(src.matches(" else if ndx == ").count(), 2);
}

#[test]
fn placement_slots_round_up_to_vec4() {
    assert_eq!(placement_slots(0), 0);
    assert_eq!(placement_slots(1), 3);
    assert_eq!(placement_slots(3), 7);
    assert_eq!(placement_slots(4), 9);
}

#[test]
fn overlay_bindings_follow_the_uniform() {
    assert_eq!(overlay_binding(1), 3);
    assert_eq!(overlay_binding(8), 10);
}

#[test]
fn generated_variants_validate() {
    validate_wgsl(VERTEX_SHADER).unwrap();
    for n in [0, 1, 2, 3, 8] {
        if let Err(e) = validate_wgsl(&fragment_source(n)) {
            panic!("variant {n} failed validation: {e}");
        }
    }
}

#[test]
fn invalid_source_reports_the_log() {
    let err = validate_wgsl("@fragment fn fs_main() -> @location(0) vec4<f32> { return nope; }")
        .unwrap_err();
    assert!(matches!(err, AlphaError::ShaderCompile(_)));
    assert!(err.to_string().contains("nope"), "{err}");
}

#[test]
fn variant_cache_memoizes_per_count() {
    let mut cache = ShaderVariantCache::new();
    assert!(cache.is_empty());

    let a = cache.fragment(2).unwrap();
    let b = cache.fragment(2).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);

    let c = cache.fragment(0).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(cache.len(), 2);
}
