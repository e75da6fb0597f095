//! Scene viewer: camera state plus the synchronous render of a region tree into
//! a bound framebuffer.

mod camera;

pub use camera::*;

use glam::{DMat4, DVec3, Vec4};

use crate::{
    core::{
        color::Color,
        error::RenderError,
        mesh::MeshVertex,
        view::{ProjectionMode, ViewParameters},
    },
    document::{ArgonDocument, GraphicsT, Material, MaterialModule, Region},
    gl::{draw_triangle, BoundFramebuffer, RasterVertex},
};

const AMBIENT_LIGHT: f32 = 0.2;
const LIGHT_DIRECTION: [f64; 3] = [0.0, -0.5, -1.0];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferingMode {
    Default,
    Single,
    Double,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StereoMode {
    Default,
    Mono,
    Stereo,
}

/// Creates scene viewers for one document.
pub struct SceneviewerModule<'doc> {
    document: &'doc ArgonDocument,
    materials: &'doc MaterialModule,
}

impl<'doc> SceneviewerModule<'doc> {
    /// `None` when the document has no visualisation contents.
    pub fn new(document: &'doc ArgonDocument) -> Option<Self> {
        let materials = document.material_module()?;
        Some(Self {
            document,
            materials,
        })
    }

    /// A viewer with the document's projection, background and lighting settings
    /// and no camera.
    pub fn create_sceneviewer(
        &self,
        buffering_mode: BufferingMode,
        stereo_mode: StereoMode,
    ) -> Sceneviewer<'doc> {
        let mut sceneviewer = Sceneviewer {
            materials: self.materials,
            buffering_mode,
            stereo_mode,
            viewport: None,
            look_at: None,
            near_clipping_plane: None,
            far_clipping_plane: None,
            view_angle: None,
            projection_mode: ProjectionMode::Perspective,
            background_colour: Color::BLACK,
            lighting_two_sided: true,
            scene: None,
        };
        if let Some(stored) = self.document.sceneviewer() {
            sceneviewer.projection_mode = stored.projection_mode();
            sceneviewer.background_colour = stored.background_colour();
            sceneviewer.lighting_two_sided = stored.lighting_two_sided();
        }
        log::debug!(
            "sceneviewer created ({:?} buffering, {:?} stereo)",
            buffering_mode,
            stereo_mode
        );
        sceneviewer
    }
}

pub struct Sceneviewer<'doc> {
    materials: &'doc MaterialModule,
    buffering_mode: BufferingMode,
    stereo_mode: StereoMode,
    viewport: Option<(u32, u32)>,
    look_at: Option<(DVec3, DVec3, DVec3)>,
    near_clipping_plane: Option<f64>,
    far_clipping_plane: Option<f64>,
    view_angle: Option<f64>,
    projection_mode: ProjectionMode,
    background_colour: Color,
    lighting_two_sided: bool,
    scene: Option<&'doc Region>,
}

/// Counters from one `render_scene` call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub triangles: usize,
    pub samples: usize,
}

impl<'doc> Sceneviewer<'doc> {
    pub fn buffering_mode(&self) -> BufferingMode {
        self.buffering_mode
    }

    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    pub fn viewport_size(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    /// Sets eye, look-at and an up vector made orthogonal to the view direction.
    pub fn set_lookat_parameters_non_skew(
        &mut self,
        eye: DVec3,
        look_at: DVec3,
        up: DVec3,
    ) -> Result<(), RenderError> {
        let (_, up, _) = non_skew_frame(eye, look_at, up)?;
        self.look_at = Some((eye, look_at, up));
        Ok(())
    }

    pub fn set_near_clipping_plane(&mut self, near: f64) {
        self.near_clipping_plane = Some(near);
    }

    pub fn set_far_clipping_plane(&mut self, far: f64) {
        self.far_clipping_plane = Some(far);
    }

    /// Radians.
    pub fn set_view_angle(&mut self, angle: f64) {
        self.view_angle = Some(angle);
    }

    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.projection_mode = mode;
    }

    pub fn set_background_colour(&mut self, colour: Color) {
        self.background_colour = colour;
    }

    pub fn set_lighting_two_sided(&mut self, two_sided: bool) {
        self.lighting_two_sided = two_sided;
    }

    pub fn set_scene(&mut self, scene: &'doc Region) {
        self.scene = Some(scene);
    }

    /// `None` until look-at, both clipping planes and the view angle are set.
    pub fn view_parameters(&self) -> Option<ViewParameters> {
        let (eye_position, look_at_position, up_vector) = self.look_at?;
        Some(ViewParameters {
            eye_position,
            look_at_position,
            up_vector,
            near_clipping_plane: self.near_clipping_plane?,
            far_clipping_plane: self.far_clipping_plane?,
            view_angle: self.view_angle?,
        })
    }

    /// Renders the attached scene into `target`, blocking until every triangle
    /// is rasterized. Opaque graphics are drawn before translucent ones.
    pub fn render_scene(
        &self,
        target: &mut BoundFramebuffer<'_, '_>,
    ) -> Result<RenderStats, RenderError> {
        let scene = self.scene.ok_or(RenderError::NoScene)?;
        let view = self
            .view_parameters()
            .ok_or(RenderError::ViewParametersUnset)?;
        view.validate()?;
        let target_size = target.size();
        let viewport = self.viewport.unwrap_or(target_size);
        if viewport != target_size {
            return Err(RenderError::ViewportMismatch {
                viewport,
                target: target_size,
            });
        }

        let camera = Camera::new(&view, self.projection_mode)?;
        let view_matrix = camera.view_matrix();
        let projection = camera.projection_matrix(viewport.0, viewport.1);
        log::debug!(
            "rendering {}x{} from eye {} ({:?})",
            viewport.0,
            viewport.1,
            camera.eye(),
            self.projection_mode
        );

        target.clear(self.background_colour);

        let mut stats = RenderStats::default();
        for &translucent in &[false, true] {
            let mut result = Ok(());
            scene.visit(DMat4::IDENTITY, &mut |region, world| {
                if result.is_ok() {
                    let pass = DrawPass {
                        model_view: view_matrix * world,
                        projection,
                        translucent,
                    };
                    result = self.draw_region(target, region, &pass, &mut stats);
                }
            });
            result?;
        }

        log::info!(
            "rendered {} triangles, {} samples written",
            stats.triangles,
            stats.samples
        );
        Ok(stats)
    }

    fn draw_region(
        &self,
        target: &mut BoundFramebuffer<'_, '_>,
        region: &Region,
        pass: &DrawPass,
        stats: &mut RenderStats,
    ) -> Result<(), RenderError> {
        let normal_matrix = pass.model_view.inverse().transpose();
        for graphics in region.graphics().iter().filter(|g| g.is_visible()) {
            let material = self
                .materials
                .find_material_by_name(graphics.material_name())
                .unwrap_or_else(|| self.materials.default_material());
            if (material.alpha() < 1.0) != pass.translucent {
                continue;
            }

            let mesh = graphics.tessellate(region.model());
            for triangle in mesh.triangles() {
                let vertices = [
                    self.shade(triangle[0], pass, &normal_matrix, material),
                    self.shade(triangle[1], pass, &normal_matrix, material),
                    self.shade(triangle[2], pass, &normal_matrix, material),
                ];
                stats.samples += draw_triangle(target, vertices, material.alpha())?;
                stats.triangles += 1;
            }
        }
        Ok(())
    }

    fn shade(
        &self,
        vertex: &MeshVertex,
        pass: &DrawPass,
        normal_matrix: &DMat4,
        material: &Material,
    ) -> RasterVertex {
        let position = DVec3::new(
            vertex.position.x as f64,
            vertex.position.y as f64,
            vertex.position.z as f64,
        );
        let normal = DVec3::new(
            vertex.normal.x as f64,
            vertex.normal.y as f64,
            vertex.normal.z as f64,
        );
        let eye_position = pass.model_view.transform_point3(position);
        let eye_normal = normal_matrix.transform_vector3(normal).normalize_or_zero();
        let clip = pass.projection * eye_position.extend(1.0);

        RasterVertex {
            clip: Vec4::new(clip.x as f32, clip.y as f32, clip.z as f32, clip.w as f32),
            color: self.lit_colour(eye_normal, material),
        }
    }

    #[cfg(not(feature = "debug_normal"))]
    fn lit_colour(&self, eye_normal: DVec3, material: &Material) -> Color {
        let to_light = -DVec3::from(LIGHT_DIRECTION).normalize();
        let n_dot_l = eye_normal.dot(to_light) as f32;
        let diffuse = if self.lighting_two_sided {
            n_dot_l.abs()
        } else {
            n_dot_l.max(0.0)
        };
        (material.ambient() * AMBIENT_LIGHT + material.diffuse() * diffuse + material.emission())
            .clamped()
    }

    #[cfg(feature = "debug_normal")]
    fn lit_colour(&self, eye_normal: DVec3, _material: &Material) -> Color {
        let n = eye_normal * 0.5 + DVec3::splat(0.5);
        Color::new(n.x as f32, n.y as f32, n.z as f32)
    }
}

struct DrawPass {
    model_view: DMat4,
    projection: DMat4,
    translucent: bool,
}
