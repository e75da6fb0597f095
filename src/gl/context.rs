use std::{cell::Cell, marker::PhantomData, rc::Rc};

use crate::core::error::ContextError;

use super::{GuiApplication, Platform};

/// Pixel format requested for a surface and the context rendering to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SurfaceFormat {
    pub color_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
}

impl Default for SurfaceFormat {
    fn default() -> Self {
        Self {
            color_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
        }
    }
}

pub struct OffscreenSurface {
    format: SurfaceFormat,
    platform: Option<&'static Platform>,
}

impl OffscreenSurface {
    pub fn new(format: SurfaceFormat) -> Self {
        Self {
            format,
            platform: None,
        }
    }

    /// Asks the platform for the surface; check [`OffscreenSurface::is_valid`] afterwards.
    pub fn create(&mut self) {
        let app = match GuiApplication::instance() {
            Some(app) => app,
            None => {
                log::warn!("offscreen surface requested before the GUI application exists");
                return;
            }
        };
        let platform = app.platform();
        if self.format.color_bits != platform.color_bits
            || self.format.depth_bits > platform.depth_bits
            || self.format.stencil_bits > platform.stencil_bits
        {
            log::warn!(
                "platform '{}' can't provide surface format {:?}",
                platform.name,
                self.format
            );
            return;
        }
        self.platform = Some(platform);
    }

    pub fn is_valid(&self) -> bool {
        self.platform.is_some()
    }

    pub fn format(&self) -> SurfaceFormat {
        self.format
    }
}

pub struct GlContext {
    format: SurfaceFormat,
    created: bool,
}

impl GlContext {
    pub fn new(format: SurfaceFormat) -> Self {
        Self {
            format,
            created: false,
        }
    }

    /// Fails only before the GUI application exists.
    pub fn create(&mut self) -> bool {
        self.created = GuiApplication::instance().is_some();
        if !self.created {
            log::warn!("context requested before the GUI application exists");
        }
        self.created
    }

    pub fn is_valid(&self) -> bool {
        self.created
    }

    pub fn make_current(
        &self,
        surface: &OffscreenSurface,
    ) -> Result<CurrentContext, ContextError> {
        if !self.created {
            return Err(ContextError::ContextCreationFailed(
                "context was not created".to_owned(),
            ));
        }
        let platform = surface.platform.ok_or_else(|| {
            ContextError::SurfaceUnavailable("surface was not created".to_owned())
        })?;
        if surface.format != self.format {
            return Err(ContextError::ContextCreationFailed(format!(
                "surface format {:?} does not match context format {:?}",
                surface.format, self.format
            )));
        }
        Ok(CurrentContext {
            platform,
            format: self.format,
            framebuffers: Cell::new(0),
            _not_send: PhantomData,
        })
    }
}

/// A context current on the calling thread together with its surface.
pub struct CurrentContext {
    platform: &'static Platform,
    format: SurfaceFormat,
    framebuffers: Cell<usize>,
    _not_send: PhantomData<Rc<()>>,
}

impl CurrentContext {
    pub fn platform(&self) -> &'static Platform {
        self.platform
    }

    pub fn format(&self) -> SurfaceFormat {
        self.format
    }

    /// Framebuffers created from this context that are still alive.
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.get()
    }

    pub(super) fn framebuffer_created(&self) {
        self.framebuffers.set(self.framebuffers.get() + 1);
    }

    pub(super) fn framebuffer_deleted(&self) {
        self.framebuffers.set(self.framebuffers.get() - 1);
    }
}

impl Drop for CurrentContext {
    fn drop(&mut self) {
        log::debug!("offscreen context done");
    }
}

/// Initializes the GUI application if needed, then creates an offscreen surface
/// and a context current on it.
pub fn create_offscreen_context(format: SurfaceFormat) -> Result<CurrentContext, ContextError> {
    GuiApplication::ensure_initialized();

    let mut surface = OffscreenSurface::new(format);
    surface.create();
    if !surface.is_valid() {
        return Err(ContextError::SurfaceUnavailable(format!(
            "can't create offscreen surface with format {:?}",
            format
        )));
    }

    let mut context = GlContext::new(format);
    if !context.create() {
        return Err(ContextError::ContextCreationFailed(format!(
            "can't create context with format {:?}",
            format
        )));
    }
    let current = context.make_current(&surface)?;
    log::debug!("offscreen context current, format {:?}", format);
    Ok(current)
}
