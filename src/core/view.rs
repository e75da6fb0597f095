use crate::core::error::RenderError;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ProjectionMode {
    Perspective,
    Parallel,
}

impl ProjectionMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PERSPECTIVE" => Some(ProjectionMode::Perspective),
            "PARALLEL" => Some(ProjectionMode::Parallel),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProjectionMode::Perspective => "PERSPECTIVE",
            ProjectionMode::Parallel => "PARALLEL",
        }
    }
}

/// Camera bundle of a loaded document. `view_angle` is in radians.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewParameters {
    pub eye_position: glam::DVec3,
    pub look_at_position: glam::DVec3,
    pub up_vector: glam::DVec3,
    pub near_clipping_plane: f64,
    pub far_clipping_plane: f64,
    pub view_angle: f64,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self {
            eye_position: glam::DVec3::new(0.0, 0.0, 5.0),
            look_at_position: glam::DVec3::ZERO,
            up_vector: glam::DVec3::Y,
            near_clipping_plane: 0.1,
            far_clipping_plane: 100.0,
            view_angle: 40f64.to_radians(),
        }
    }
}

impl ViewParameters {
    pub fn view_direction(&self) -> glam::DVec3 {
        self.look_at_position - self.eye_position
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |message: String| Err(RenderError::InvalidViewParameters(message));

        let all_finite = self.eye_position.is_finite()
            && self.look_at_position.is_finite()
            && self.up_vector.is_finite()
            && self.near_clipping_plane.is_finite()
            && self.far_clipping_plane.is_finite()
            && self.view_angle.is_finite();
        if !all_finite {
            return invalid("non-finite component".to_owned());
        }
        if self.near_clipping_plane <= 0.0 || self.near_clipping_plane >= self.far_clipping_plane
        {
            return invalid(format!(
                "clipping planes must satisfy 0 < near < far, got near {} far {}",
                self.near_clipping_plane, self.far_clipping_plane
            ));
        }
        if self.view_angle <= 0.0 || self.view_angle >= std::f64::consts::PI {
            return invalid(format!(
                "view angle {} rad is outside (0, pi)",
                self.view_angle
            ));
        }

        let direction = self.view_direction();
        if direction.length_squared() == 0.0 {
            return invalid("eye position equals look-at position".to_owned());
        }
        let cross = direction.normalize().cross(self.up_vector);
        if self.up_vector.length_squared() == 0.0 || cross.length() < 1e-9 * self.up_vector.length()
        {
            return invalid("up vector is zero or parallel to the view direction".to_owned());
        }
        Ok(())
    }
}
