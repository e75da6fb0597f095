use crate::core::{
    color::Color,
    loader::InputParams,
    view::{ProjectionMode, ViewParameters},
};

/// Stored state of the document's scene viewer.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgonSceneviewer {
    view_parameters: Option<ViewParameters>,
    projection_mode: ProjectionMode,
    background_colour: Color,
    lighting_two_sided: bool,
}

impl Default for ArgonSceneviewer {
    fn default() -> Self {
        Self {
            view_parameters: None,
            projection_mode: ProjectionMode::Perspective,
            background_colour: Color::BLACK,
            lighting_two_sided: true,
        }
    }
}

impl ArgonSceneviewer {
    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        params.set_name("sceneviewer".into());
        let mut sceneviewer = ArgonSceneviewer::default();

        if params.contains_key("EyePosition") {
            sceneviewer.view_parameters = Some(ViewParameters {
                eye_position: params.get_dvec3("EyePosition")?,
                look_at_position: params.get_dvec3("LookatPosition")?,
                up_vector: params.get_dvec3("UpVector")?,
                near_clipping_plane: params.get_float("NearClippingPlane")?,
                far_clipping_plane: params.get_float("FarClippingPlane")?,
                view_angle: params.get_float("ViewAngle")?,
            });
        }

        if params.contains_key("ProjectionMode") {
            let mode = params.get_str("ProjectionMode")?;
            sceneviewer.projection_mode = ProjectionMode::from_name(&mode).ok_or_else(|| {
                anyhow::anyhow!("{} - unknown projection mode '{}'", params.name(), mode)
            })?;
        }
        sceneviewer.background_colour =
            params.get_color_or("BackgroundColourRGB", Color::BLACK)?;
        sceneviewer.lighting_two_sided = params.get_bool_or("LightingTwoSided", true)?;

        params.check_unused_keys();

        Ok(sceneviewer)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({
            "ProjectionMode": self.projection_mode.name(),
            "BackgroundColourRGB": self.background_colour.to_array(),
            "LightingTwoSided": self.lighting_two_sided,
        });
        if let Some(view) = &self.view_parameters {
            json["EyePosition"] = <[f64; 3]>::from(view.eye_position).to_vec().into();
            json["LookatPosition"] = <[f64; 3]>::from(view.look_at_position).to_vec().into();
            json["UpVector"] = <[f64; 3]>::from(view.up_vector).to_vec().into();
            json["NearClippingPlane"] = view.near_clipping_plane.into();
            json["FarClippingPlane"] = view.far_clipping_plane.into();
            json["ViewAngle"] = view.view_angle.into();
        }
        json
    }

    /// `None` when the document never stored a camera.
    pub fn view_parameters(&self) -> Option<ViewParameters> {
        self.view_parameters
    }

    pub fn set_view_parameters(&mut self, view: ViewParameters) {
        self.view_parameters = Some(view);
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection_mode
    }

    pub fn background_colour(&self) -> Color {
        self.background_colour
    }

    pub fn set_background_colour(&mut self, colour: Color) {
        self.background_colour = colour;
    }

    pub fn lighting_two_sided(&self) -> bool {
        self.lighting_two_sided
    }
}
