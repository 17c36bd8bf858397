use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        AlphaError::config("x")
            .to_string()
            .contains("config error:")
    );
    assert!(
        AlphaError::descriptor_parse("x")
            .to_string()
            .contains("descriptor parse error:")
    );
    assert!(
        AlphaError::shader_compile("x")
            .to_string()
            .contains("shader compile error:")
    );
    assert!(
        AlphaError::context_unavailable("x")
            .to_string()
            .contains("gpu context unavailable:")
    );
    assert!(
        AlphaError::invalid_state("x")
            .to_string()
            .contains("invalid state:")
    );
    assert!(AlphaError::gpu("x").to_string().contains("gpu error:"));
}

#[test]
fn shader_compile_keeps_the_reported_log() {
    let err = AlphaError::shader_compile("error: expected ';' at 12:3");
    assert!(err.to_string().ends_with("expected ';' at 12:3"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = AlphaError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
