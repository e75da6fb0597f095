//! Software offscreen rendering target.
//!
//! Everything runs on the CPU, with no display, driver or GPU behind it. The
//! module keeps the shape of a windowing/GL stack: a process-wide
//! [`GuiApplication`], offscreen surfaces, contexts made current on them, and
//! multisampled framebuffers that the rasterizer draws into. Surface formats are
//! checked against what the framebuffer storage can hold; past that, allocation
//! is the only way to fail.

mod context;
mod framebuffer;
mod raster;

pub use context::*;
pub use framebuffer::*;
pub use raster::*;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static INITIALIZATIONS: AtomicUsize = AtomicUsize::new(0);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

lazy_static! {
    static ref APPLICATION: GuiApplication = GuiApplication::initialize();
}

/// What the software framebuffer storage can represent.
#[derive(Debug)]
pub struct Platform {
    pub name: &'static str,
    pub max_samples: u32,
    pub max_framebuffer_size: u32,
    pub color_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
}

impl Platform {
    fn software() -> Self {
        Self {
            name: "software",
            max_samples: framebuffer::MAX_SAMPLES,
            max_framebuffer_size: framebuffer::MAX_SIZE,
            color_bits: framebuffer::COLOR_BITS,
            depth_bits: framebuffer::DEPTH_BITS,
            stencil_bits: framebuffer::STENCIL_BITS,
        }
    }
}

/// Process-wide GUI subsystem. Created on first use, never torn down.
#[derive(Debug)]
pub struct GuiApplication {
    platform: Platform,
}

impl GuiApplication {
    fn initialize() -> Self {
        let count = INITIALIZATIONS.fetch_add(1, Ordering::SeqCst) + 1;
        let app = Self {
            platform: Platform::software(),
        };
        INITIALIZED.store(true, Ordering::SeqCst);
        log::info!(
            "GUI application initialized (platform '{}', initialization #{})",
            app.platform.name,
            count
        );
        app
    }

    /// Returns the application, initializing it if this is the first call in the process.
    pub fn ensure_initialized() -> &'static GuiApplication {
        if INITIALIZED.load(Ordering::SeqCst) {
            log::trace!("GUI application already initialized");
        }
        &*APPLICATION
    }

    /// The application if some earlier call already initialized it.
    pub fn instance() -> Option<&'static GuiApplication> {
        if INITIALIZED.load(Ordering::SeqCst) {
            Some(&*APPLICATION)
        } else {
            None
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}

/// How many times the GUI application was initialized in this process (0 or 1).
pub fn initialization_count() -> usize {
    INITIALIZATIONS.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_is_a_singleton() {
        let a = GuiApplication::ensure_initialized() as *const GuiApplication;
        let b = GuiApplication::ensure_initialized() as *const GuiApplication;
        assert_eq!(a, b);
        assert!(GuiApplication::instance().is_some());
        assert_eq!(initialization_count(), 1);
    }

    #[test]
    fn platform_matches_framebuffer_storage() {
        let platform = GuiApplication::ensure_initialized().platform();
        assert_eq!(platform.depth_bits, 32);
        assert_eq!(platform.stencil_bits, 8);
        assert_eq!(platform.max_samples, 16);
        assert_eq!(sample_positions(platform.max_samples).len(), 16);
    }
}
