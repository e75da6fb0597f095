use glam::{Vec3, Vec4};

use crate::core::{color::Color, error::RenderError};

use super::Framebuffer;

/// A vertex after the projection transform.
#[derive(Copy, Clone, Debug)]
pub struct RasterVertex {
    pub clip: Vec4,
    pub color: Color,
}

impl RasterVertex {
    fn lerp(&self, other: &RasterVertex, t: f32) -> RasterVertex {
        RasterVertex {
            clip: self.clip + (other.clip - self.clip) * t,
            color: self.color * (1.0 - t) + other.color * t,
        }
    }

    // signed distance to the near plane, z = -w
    fn near_distance(&self) -> f32 {
        self.clip.z + self.clip.w
    }
}

/// Near-plane clip of a convex polygon.
fn clip_near(polygon: &[RasterVertex]) -> Vec<RasterVertex> {
    let mut clipped = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let (dc, dn) = (current.near_distance(), next.near_distance());
        if dc >= 0.0 {
            clipped.push(*current);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            clipped.push(current.lerp(next, dc / (dc - dn)));
        }
    }
    clipped
}

struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    inv_w: f32,
    color: Color,
}

fn to_screen(vertex: &RasterVertex, width: u32, height: u32) -> ScreenVertex {
    let inv_w = 1.0 / vertex.clip.w;
    let ndc: Vec3 = vertex.clip.truncate() * inv_w;
    ScreenVertex {
        x: (ndc.x * 0.5 + 0.5) * width as f32,
        y: (ndc.y * 0.5 + 0.5) * height as f32,
        depth: ndc.z * 0.5 + 0.5,
        inv_w,
        color: vertex.color,
    }
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Draws one triangle into `target` and returns how many samples it wrote.
///
/// Both windings are drawn. Depth is tested with `LESS` when the target has a
/// depth buffer; `alpha` below 1 blends over the target and leaves depth alone.
pub fn draw_triangle(
    target: &mut Framebuffer<'_>,
    vertices: [RasterVertex; 3],
    alpha: f32,
) -> Result<usize, RenderError> {
    if vertices
        .iter()
        .any(|v| !v.clip.is_finite() || !v.color.is_finite())
    {
        return Err(RenderError::Rasterization(format!(
            "non-finite vertex in triangle {:?}",
            vertices
        )));
    }

    let polygon = clip_near(&vertices);
    if polygon.len() < 3 {
        return Ok(0);
    }

    let (width, height) = target.size();
    let screen: Vec<ScreenVertex> = polygon
        .iter()
        .map(|v| to_screen(v, width, height))
        .collect();

    let mut written = 0;
    for i in 1..screen.len() - 1 {
        written += fill(target, [&screen[0], &screen[i], &screen[i + 1]], alpha);
    }
    Ok(written)
}

fn fill(target: &mut Framebuffer<'_>, tri: [&ScreenVertex; 3], alpha: f32) -> usize {
    let [v0, v1, v2] = tri;
    let area = edge(v0, v1, v2.x, v2.y);
    if area.abs() < f32::EPSILON {
        return 0;
    }

    let (width, height) = target.size();
    let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as u32;
    let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as u32;
    let max_x = v0.x.max(v1.x).max(v2.x).ceil().min(width as f32) as u32;
    let max_y = v0.y.max(v1.y).max(v2.y).ceil().min(height as f32) as u32;

    let sample_positions = target.sample_positions().to_vec();
    let depth_test = target.has_depth();
    let opaque = alpha >= 1.0;

    let mut written = 0;
    for y in min_y..max_y {
        for x in min_x..max_x {
            for (s, &(ox, oy)) in sample_positions.iter().enumerate() {
                let (px, py) = (x as f32 + ox, y as f32 + oy);
                let b0 = edge(v1, v2, px, py) / area;
                let b1 = edge(v2, v0, px, py) / area;
                let b2 = edge(v0, v1, px, py) / area;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }

                let depth = b0 * v0.depth + b1 * v1.depth + b2 * v2.depth;
                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }
                let index = target.sample_index(x, y, s);
                if depth_test && depth >= target.depth_at(index) {
                    continue;
                }

                let (w0, w1, w2) = (b0 * v0.inv_w, b1 * v1.inv_w, b2 * v2.inv_w);
                let color = (v0.color * w0 + v1.color * w1 + v2.color * w2) / (w0 + w1 + w2);

                if opaque {
                    target.write_sample(index, color, Some(depth));
                } else {
                    let under = target.color_at(index);
                    target.write_sample(index, color * alpha + under * (1.0 - alpha), None);
                }
                written += 1;
            }
        }
    }
    written
}
