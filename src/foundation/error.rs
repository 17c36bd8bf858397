/// Convenience result type used across alphaframe.
pub type AlphaResult<T> = Result<T, AlphaError>;

/// Top-level error taxonomy used by renderer and player APIs.
#[derive(thiserror::Error, Debug)]
pub enum AlphaError {
    /// Missing or invalid animation config / player options.
    #[error("config error: {0}")]
    Config(String),

    /// The frame descriptor source failed to prepare.
    #[error("descriptor parse error: {0}")]
    DescriptorParse(String),

    /// Generated shader source was rejected. Carries the reported log.
    #[error("shader compile error: {0}")]
    ShaderCompile(String),

    /// No GPU adapter or device could be obtained.
    #[error("gpu context unavailable: {0}")]
    ContextUnavailable(String),

    /// The call is not permitted in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Device-side failure outside shader compilation (readback, mapping).
    #[error("gpu error: {0}")]
    Gpu(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AlphaError {
    /// Build an [`AlphaError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build an [`AlphaError::DescriptorParse`] value.
    pub fn descriptor_parse(msg: impl Into<String>) -> Self {
        Self::DescriptorParse(msg.into())
    }

    /// Build an [`AlphaError::ShaderCompile`] value.
    pub fn shader_compile(log: impl Into<String>) -> Self {
        Self::ShaderCompile(log.into())
    }

    /// Build an [`AlphaError::ContextUnavailable`] value.
    pub fn context_unavailable(msg: impl Into<String>) -> Self {
        Self::ContextUnavailable(msg.into())
    }

    /// Build an [`AlphaError::InvalidState`] value.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Build an [`AlphaError::Gpu`] value.
    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
