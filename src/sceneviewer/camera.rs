use glam::{DMat4, DVec3};

use crate::core::{
    error::RenderError,
    view::{ProjectionMode, ViewParameters},
};

/// Orthonormal look-at frame with projection settings.
pub struct Camera {
    eye: DVec3,
    forward: DVec3,
    up: DVec3,
    distance: f64,
    near: f64,
    far: f64,
    view_angle: f64,
    projection: ProjectionMode,
}

/// Orthonormal `(forward, up, right)` for a look-at; `up` is made perpendicular
/// to the view direction.
pub fn non_skew_frame(
    eye: DVec3,
    look_at: DVec3,
    up: DVec3,
) -> Result<(DVec3, DVec3, DVec3), RenderError> {
    let view = look_at - eye;
    if view.length_squared() <= f64::EPSILON {
        return Err(RenderError::InvalidViewParameters(
            "eye and look-at positions coincide".to_owned(),
        ));
    }
    let forward = view.normalize();
    let right = forward.cross(up);
    if right.length_squared() <= f64::EPSILON * up.length_squared().max(1.0) {
        return Err(RenderError::InvalidViewParameters(format!(
            "up vector {} is zero or parallel to the view direction",
            up
        )));
    }
    let right = right.normalize();
    let up = right.cross(forward);
    Ok((forward, up, right))
}

impl Camera {
    pub fn new(view: &ViewParameters, projection: ProjectionMode) -> Result<Self, RenderError> {
        view.validate()?;
        let (forward, up, _) =
            non_skew_frame(view.eye_position, view.look_at_position, view.up_vector)?;
        Ok(Self {
            eye: view.eye_position,
            forward,
            up,
            distance: view.view_direction().length(),
            near: view.near_clipping_plane,
            far: view.far_clipping_plane,
            view_angle: view.view_angle,
            projection,
        })
    }

    pub fn eye(&self) -> DVec3 {
        self.eye
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye, self.eye + self.forward, self.up)
    }

    /// The view angle spans the smaller of the two viewport dimensions.
    pub fn projection_matrix(&self, width: u32, height: u32) -> DMat4 {
        let aspect = width as f64 / height as f64;
        let half_tan = (self.view_angle * 0.5).tan();
        // tangent of the half angles, vertical then horizontal
        let (tan_y, tan_x) = if aspect >= 1.0 {
            (half_tan, half_tan * aspect)
        } else {
            (half_tan / aspect, half_tan)
        };

        match self.projection {
            ProjectionMode::Perspective => {
                DMat4::perspective_rh_gl(2.0 * tan_y.atan(), aspect, self.near, self.far)
            }
            ProjectionMode::Parallel => {
                let half_height = self.distance * tan_y;
                let half_width = self.distance * tan_x;
                DMat4::orthographic_rh_gl(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_is_made_perpendicular() {
        let (forward, up, right) =
            non_skew_frame(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::new(0.0, 1.0, 1.0))
                .unwrap();
        assert!(forward.dot(up).abs() < 1e-12);
        assert!((up - DVec3::Y).length() < 1e-12);
        assert!((right - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn parallel_up_is_rejected() {
        let err = non_skew_frame(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Z).unwrap_err();
        assert!(matches!(err, RenderError::InvalidViewParameters(_)));
    }

    #[test]
    fn look_at_origin_projects_to_centre() {
        let camera = Camera::new(&ViewParameters::default(), ProjectionMode::Perspective).unwrap();
        for &(w, h) in &[(512, 512), (800, 400), (300, 600)] {
            let clip = camera.projection_matrix(w, h) * camera.view_matrix() * glam::DVec4::W;
            assert!(clip.x.abs() < 1e-9 && clip.y.abs() < 1e-9);
            let depth = clip.z / clip.w;
            assert!(depth > -1.0 && depth < 1.0);
        }
    }

    #[test]
    fn angle_spans_smaller_dimension() {
        let view = ViewParameters::default();
        let camera = Camera::new(&view, ProjectionMode::Perspective).unwrap();
        let half_tan = (view.view_angle * 0.5).tan();
        // a point on the edge of the view cone, distance 5 in front of the eye
        let edge_x = DVec3::new(5.0 * half_tan, 0.0, 0.0).extend(1.0);

        let tall = camera.projection_matrix(300, 600) * camera.view_matrix() * edge_x;
        assert!((tall.x / tall.w - 1.0).abs() < 1e-9);

        let wide = camera.projection_matrix(600, 300) * camera.view_matrix() * edge_x;
        assert!((wide.x / wide.w - 0.5).abs() < 1e-9);
    }

    #[test]
    fn parallel_projection_keeps_scale() {
        let view = ViewParameters::default();
        let camera = Camera::new(&view, ProjectionMode::Parallel).unwrap();
        let half_tan = (view.view_angle * 0.5).tan();
        let top = DVec3::new(0.0, 5.0 * half_tan, -3.0).extend(1.0);
        let clip = camera.projection_matrix(512, 512) * camera.view_matrix() * top;
        assert!((clip.y / clip.w - 1.0).abs() < 1e-9);
    }
}
