use std::{
    collections::TryReserveError,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicUsize, Ordering},
};

use image::{Rgb, RgbImage};

use crate::core::{color::Color, error::TargetError};

use super::CurrentContext;

static LIVE_FRAMEBUFFERS: AtomicUsize = AtomicUsize::new(0);

/// Number of framebuffers currently allocated in this process.
pub fn live_framebuffers() -> usize {
    LIVE_FRAMEBUFFERS.load(Ordering::SeqCst)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attachment {
    NoAttachment,
    Depth,
    CombinedDepthStencil,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramebufferFormat {
    pub samples: u32,
    pub attachment: Attachment,
}

impl Default for FramebufferFormat {
    fn default() -> Self {
        Self {
            samples: 1,
            attachment: Attachment::NoAttachment,
        }
    }
}

const PATTERN_1: [(f32, f32); 1] = [(0.5, 0.5)];
const PATTERN_2: [(f32, f32); 2] = [(0.75, 0.75), (0.25, 0.25)];
const PATTERN_4: [(f32, f32); 4] = [
    (0.375, 0.125),
    (0.875, 0.375),
    (0.125, 0.625),
    (0.625, 0.875),
];
const PATTERN_8: [(i8, i8); 8] = [
    (1, -3),
    (-1, 3),
    (5, 1),
    (-3, -5),
    (-5, 5),
    (-7, -1),
    (3, 7),
    (7, -7),
];
const PATTERN_16: [(i8, i8); 16] = [
    (1, 1),
    (-1, -3),
    (-3, 2),
    (4, -1),
    (-5, -2),
    (2, 5),
    (5, 3),
    (3, -5),
    (-2, 6),
    (0, -7),
    (-4, -6),
    (-6, 4),
    (-8, 0),
    (7, -4),
    (6, 7),
    (-7, -8),
];

/// Largest supported sample pattern.
pub const MAX_SAMPLES: u32 = PATTERN_16.len() as u32;
/// Largest width or height of a framebuffer.
pub const MAX_SIZE: u32 = 16384;
/// Resolved pixels carry 8 bits per channel.
pub const COLOR_BITS: u8 = 8;
/// Depth samples are `f32`.
pub const DEPTH_BITS: u8 = (std::mem::size_of::<f32>() * 8) as u8;
/// Stencil samples are `u8`.
pub const STENCIL_BITS: u8 = (std::mem::size_of::<u8>() * 8) as u8;

/// Sample offsets inside a pixel, in `[0, 1)`.
pub fn sample_positions(samples: u32) -> Vec<(f32, f32)> {
    let centered = |pattern: &[(i8, i8)]| {
        pattern
            .iter()
            .map(|&(x, y)| (0.5 + x as f32 / 16.0, 0.5 + y as f32 / 16.0))
            .collect()
    };
    match samples {
        2 => PATTERN_2.to_vec(),
        4 => PATTERN_4.to_vec(),
        8 => centered(&PATTERN_8),
        16 => centered(&PATTERN_16),
        _ => PATTERN_1.to_vec(),
    }
}

/// Multisampled offscreen render target. Row 0 is the bottom row.
pub struct Framebuffer<'ctx> {
    context: &'ctx CurrentContext,
    width: u32,
    height: u32,
    format: FramebufferFormat,
    sample_positions: Vec<(f32, f32)>,
    color: Vec<Color>,
    depth: Vec<f32>,
    stencil: Vec<u8>,
    bound: bool,
}

fn allocate<T: Clone>(len: usize, value: T) -> Result<Vec<T>, TryReserveError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, value);
    Ok(data)
}

impl<'ctx> Framebuffer<'ctx> {
    pub fn new(
        context: &'ctx CurrentContext,
        width: u32,
        height: u32,
        format: FramebufferFormat,
    ) -> Result<Self, TargetError> {
        let samples = format.samples.max(1);
        let failed = |reason: String| TargetError::AllocationFailed {
            width,
            height,
            samples,
            reason,
        };

        let platform = context.platform();
        if width == 0 || height == 0 {
            return Err(failed("empty framebuffer".to_owned()));
        }
        if width > platform.max_framebuffer_size || height > platform.max_framebuffer_size {
            return Err(failed(format!(
                "exceeds maximum size {}",
                platform.max_framebuffer_size
            )));
        }
        if !samples.is_power_of_two() || samples > platform.max_samples {
            return Err(failed(format!(
                "unsupported sample count (maximum {})",
                platform.max_samples
            )));
        }

        let len = width as usize * height as usize * samples as usize;
        let color = allocate(len, Color::BLACK).map_err(|e| failed(e.to_string()))?;
        let depth = match format.attachment {
            Attachment::NoAttachment => Vec::new(),
            _ => allocate(len, 1.0f32).map_err(|e| failed(e.to_string()))?,
        };
        let stencil = match format.attachment {
            Attachment::CombinedDepthStencil => {
                allocate(len, 0u8).map_err(|e| failed(e.to_string()))?
            }
            _ => Vec::new(),
        };

        context.framebuffer_created();
        LIVE_FRAMEBUFFERS.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "framebuffer {}x{} created, {} samples, {:?}",
            width,
            height,
            samples,
            format.attachment
        );

        Ok(Self {
            context,
            width,
            height,
            format: FramebufferFormat {
                samples,
                attachment: format.attachment,
            },
            sample_positions: sample_positions(samples),
            color,
            depth,
            stencil,
            bound: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn samples(&self) -> u32 {
        self.format.samples
    }

    pub fn format(&self) -> FramebufferFormat {
        self.format
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn has_depth(&self) -> bool {
        !self.depth.is_empty()
    }

    pub fn has_stencil(&self) -> bool {
        !self.stencil.is_empty()
    }

    pub fn sample_positions(&self) -> &[(f32, f32)] {
        &self.sample_positions
    }

    /// Makes this the draw target until the returned guard is dropped.
    pub fn bind(&mut self) -> BoundFramebuffer<'_, 'ctx> {
        self.bound = true;
        BoundFramebuffer { framebuffer: self }
    }

    /// Frees the GPU-side storage now rather than at end of scope.
    pub fn release(self) {}

    pub fn clear(&mut self, colour: Color) {
        self.color.iter_mut().for_each(|c| *c = colour);
        self.depth.iter_mut().for_each(|d| *d = 1.0);
        self.stencil.iter_mut().for_each(|s| *s = 0);
    }

    pub(super) fn sample_index(&self, x: u32, y: u32, sample: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * self.format.samples as usize + sample
    }

    pub(super) fn depth_at(&self, index: usize) -> f32 {
        self.depth[index]
    }

    pub(super) fn write_sample(&mut self, index: usize, color: Color, depth: Option<f32>) {
        self.color[index] = color;
        if let Some(depth) = depth {
            if self.has_depth() {
                self.depth[index] = depth;
            }
        }
        if self.has_stencil() {
            self.stencil[index] = 1;
        }
    }

    pub(super) fn color_at(&self, index: usize) -> Color {
        self.color[index]
    }

    /// Number of samples whose stencil value was set by drawing.
    pub fn stencil_coverage(&self) -> usize {
        self.stencil.iter().filter(|&&s| s != 0).count()
    }

    /// Resolved color of the pixel at `(x, y)` with row 0 at the bottom.
    pub fn resolved_pixel(&self, x: u32, y: u32) -> Color {
        let samples = self.format.samples as usize;
        let first = self.sample_index(x, y, 0);
        let sum = self.color[first..first + samples]
            .iter()
            .fold(Color::BLACK, |acc, &c| acc + c);
        sum / samples as f32
    }

    /// Resolves the samples and returns the image top row first.
    pub fn to_image(&self) -> RgbImage {
        let mut image = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = self.resolved_pixel(x, y);
                image.put_pixel(x, self.height - 1 - y, Rgb(color.to_rgb8()));
            }
        }
        image
    }
}

impl Drop for Framebuffer<'_> {
    fn drop(&mut self) {
        self.context.framebuffer_deleted();
        LIVE_FRAMEBUFFERS.fetch_sub(1, Ordering::SeqCst);
        log::debug!("framebuffer {}x{} released", self.width, self.height);
    }
}

/// Guard for a bound framebuffer. Unbinds on drop.
pub struct BoundFramebuffer<'a, 'ctx> {
    framebuffer: &'a mut Framebuffer<'ctx>,
}

impl<'ctx> Deref for BoundFramebuffer<'_, 'ctx> {
    type Target = Framebuffer<'ctx>;

    fn deref(&self) -> &Self::Target {
        self.framebuffer
    }
}

impl DerefMut for BoundFramebuffer<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.framebuffer
    }
}

impl Drop for BoundFramebuffer<'_, '_> {
    fn drop(&mut self) {
        self.framebuffer.bound = false;
        log::trace!("framebuffer unbound");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{create_offscreen_context, SurfaceFormat};

    fn msaa_format(samples: u32) -> FramebufferFormat {
        FramebufferFormat {
            samples,
            attachment: Attachment::CombinedDepthStencil,
        }
    }

    #[test]
    fn framebuffer_counts_follow_scope() {
        let context = create_offscreen_context(SurfaceFormat::default()).unwrap();
        {
            let framebuffer = Framebuffer::new(&context, 8, 4, msaa_format(4)).unwrap();
            assert_eq!(context.framebuffer_count(), 1);
            assert_eq!(framebuffer.size(), (8, 4));
            assert!(framebuffer.has_depth() && framebuffer.has_stencil());
            framebuffer.release();
        }
        assert_eq!(context.framebuffer_count(), 0);
    }

    #[test]
    fn bad_sizes_are_rejected() {
        let context = create_offscreen_context(SurfaceFormat::default()).unwrap();
        for &(w, h, samples) in &[(0, 4, 1), (4, 0, 1), (20000, 4, 1), (4, 4, 3), (4, 4, 32)] {
            let result = Framebuffer::new(&context, w, h, msaa_format(samples));
            assert!(
                matches!(result, Err(TargetError::AllocationFailed { .. })),
                "{}x{} {} samples",
                w,
                h,
                samples
            );
        }
        assert_eq!(context.framebuffer_count(), 0);
    }

    #[test]
    fn zero_samples_means_single_sample() {
        let context = create_offscreen_context(SurfaceFormat::default()).unwrap();
        let framebuffer = Framebuffer::new(&context, 2, 2, msaa_format(0)).unwrap();
        assert_eq!(framebuffer.samples(), 1);
    }

    #[test]
    fn sample_patterns_stay_inside_the_pixel() {
        for &samples in &[1, 2, 4, 8, 16] {
            let positions = sample_positions(samples);
            assert_eq!(positions.len(), samples as usize);
            for &(x, y) in &positions {
                assert!((0.0..1.0).contains(&x) && (0.0..1.0).contains(&y));
            }
        }
    }

    #[test]
    fn binding_is_scoped() {
        let context = create_offscreen_context(SurfaceFormat::default()).unwrap();
        let mut framebuffer = Framebuffer::new(&context, 2, 2, msaa_format(1)).unwrap();
        {
            let mut bound = framebuffer.bind();
            assert!(bound.is_bound());
            bound.clear(Color::WHITE);
        }
        assert!(!framebuffer.is_bound());
    }

    #[test]
    fn image_is_flipped_and_resolved() {
        let context = create_offscreen_context(SurfaceFormat::default()).unwrap();
        let mut framebuffer = Framebuffer::new(&context, 1, 2, msaa_format(4)).unwrap();
        framebuffer.clear(Color::BLACK);
        // paint half of the bottom pixel's samples red
        for s in 0..2 {
            let index = framebuffer.sample_index(0, 0, s);
            framebuffer.write_sample(index, Color::new(1.0, 0.0, 0.0), Some(0.5));
        }
        assert_eq!(framebuffer.stencil_coverage(), 2);

        let image = framebuffer.to_image();
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(0, 1).0, [128, 0, 0]);
    }
}
