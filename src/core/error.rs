use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure to turn an Argon file into a document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("can't read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0:#}")]
    Invalid(anyhow::Error),

    #[error("can't load resource '{path}': {message}")]
    Resource { path: PathBuf, message: String },

    #[error("visualisation contents are not initialised")]
    NotInitialised,
}

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("offscreen surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("graphics context creation failed: {0}")]
    ContextCreationFailed(String),
}

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("framebuffer allocation failed ({width}x{height}, {samples} samples): {reason}")]
    AllocationFailed {
        width: u32,
        height: u32,
        samples: u32,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no scene attached to the scene viewer")]
    NoScene,

    #[error("view parameters are not set")]
    ViewParametersUnset,

    #[error("invalid view parameters: {0}")]
    InvalidViewParameters(String),

    #[error("viewport {viewport:?} does not match render target {target:?}")]
    ViewportMismatch {
        viewport: (u32, u32),
        target: (u32, u32),
    },

    #[error("rasterization failed: {0}")]
    Rasterization(String),
}

/// Everything a single thumbnail export can fail with.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no Argon document to export")]
    NoDocument,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{0} is not implemented")]
    UnsupportedFeature(&'static str),

    #[error("thumbnail export not supported without optional requirement '{0}'")]
    MissingOptionalDependency(&'static str),

    #[error("invalid export parameters: {0}")]
    Parameters(String),

    #[error("can't encode thumbnail: {0}")]
    Encode(#[from] image::ImageError),

    #[error("can't write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ExportError::UnsupportedFeature(_))
    }

    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, ExportError::MissingOptionalDependency(_))
    }

    /// Failures raised by the offscreen pipeline itself.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            ExportError::Context(_) | ExportError::Target(_) | ExportError::Render(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_not_a_render_failure() {
        let err = ExportError::UnsupportedFeature("time-varying export");
        assert!(err.is_unsupported());
        assert!(!err.is_render_failure());
        assert_eq!(err.to_string(), "time-varying export is not implemented");
    }

    #[test]
    fn pipeline_errors_convert() {
        let err: ExportError = RenderError::NoScene.into();
        assert!(err.is_render_failure());
        assert!(!err.is_missing_dependency());
    }

    #[test]
    fn invalid_keeps_context_chain() {
        let inner = anyhow::anyhow!("'EyePosition' should be array with 3 floats")
            .context("sceneviewer");
        let err = LoadError::Invalid(inner);
        let message = err.to_string();
        assert!(message.contains("sceneviewer"));
        assert!(message.contains("EyePosition"));
    }
}
