use super::*;
use crate::gpu::context::GpuOptions;

fn gpu() -> Option<GpuContext> {
    match GpuContext::request(&GpuOptions::default()) {
        Ok(ctx) => Some(ctx),
        Err(AlphaError::ContextUnavailable(_)) => None,
        Err(e) => panic!("unexpected gpu error: {e}"),
    }
}

#[test]
fn same_count_reuses_the_active_program() {
    let Some(ctx) = gpu() else { return };
    let mut programs = ProgramCache::default();
    let first = programs.build(&ctx, 2).unwrap().generation;
    assert_eq!(programs.build(&ctx, 2).unwrap().generation, first);

    let rebuilt = programs.build(&ctx, 0).unwrap();
    assert_eq!(rebuilt.source_count, 0);
    assert!(rebuilt.placements.is_none());
    assert!(rebuilt.generation > first);
    programs.release();
}

#[test]
fn failed_build_keeps_the_previous_program() {
    let Some(ctx) = gpu() else { return };
    let mut programs = ProgramCache::default();
    let generation = programs.build(&ctx, 1).unwrap().generation;

    let too_many = ctx.device.limits().max_sampled_textures_per_shader_stage as usize;
    let err = programs.build(&ctx, too_many).unwrap_err();
    assert!(matches!(err, AlphaError::ShaderCompile(_)));

    let active = programs.active().unwrap();
    assert_eq!(active.source_count, 1);
    assert_eq!(active.generation, generation);
    programs.release();
}
