use std::borrow::Cow;

use crate::core::{loader::InputParams, mesh::Mesh};

/// A renderable item of a region's scene.
#[enum_dispatch::enum_dispatch(Graphics)]
pub trait GraphicsT {
    fn material_name(&self) -> &str;

    fn is_visible(&self) -> bool;

    /// Triangles in region coordinates; `model` is the region's loaded model.
    fn tessellate<'a>(&'a self, model: &'a Mesh) -> Cow<'a, Mesh>;

    fn to_json(&self) -> serde_json::Value;
}

#[enum_dispatch::enum_dispatch]
#[derive(Clone, Debug)]
pub enum Graphics {
    SurfacesGraphics,
    CubeGraphics,
    SphereGraphics,
}

#[derive(Clone, Debug)]
struct GraphicsCommon {
    material: String,
    visible: bool,
}

impl GraphicsCommon {
    fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        Ok(Self {
            material: params.get_str_or("Material", "default")?,
            visible: params.get_bool_or("Visible", true)?,
        })
    }

    fn write(&self, ty: &str, mut json: serde_json::Value) -> serde_json::Value {
        json["Type"] = ty.into();
        json["Material"] = self.material.clone().into();
        json["Visible"] = self.visible.into();
        json
    }
}

/// Surfaces of the region's model sources.
#[derive(Clone, Debug)]
pub struct SurfacesGraphics {
    common: GraphicsCommon,
}

impl SurfacesGraphics {
    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        Ok(Self {
            common: GraphicsCommon::load(params)?,
        })
    }
}

impl GraphicsT for SurfacesGraphics {
    fn material_name(&self) -> &str {
        &self.common.material
    }

    fn is_visible(&self) -> bool {
        self.common.visible
    }

    fn tessellate<'a>(&'a self, model: &'a Mesh) -> Cow<'a, Mesh> {
        Cow::Borrowed(model)
    }

    fn to_json(&self) -> serde_json::Value {
        self.common.write("SURFACES", serde_json::json!({}))
    }
}

#[derive(Clone, Debug)]
pub struct CubeGraphics {
    common: GraphicsCommon,
    size: glam::Vec3A,
    position: glam::Vec3A,
}

impl CubeGraphics {
    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        let common = GraphicsCommon::load(params)?;
        let size = to_vec3a(params.get_float3_or("Size", [1.0, 1.0, 1.0])?);
        let position = to_vec3a(params.get_float3_or("Position", [0.0, 0.0, 0.0])?);
        if size.min_element() <= 0.0 {
            anyhow::bail!(format!("{} - 'Size' should be positive", params.name()));
        }
        Ok(Self {
            common,
            size,
            position,
        })
    }
}

impl GraphicsT for CubeGraphics {
    fn material_name(&self) -> &str {
        &self.common.material
    }

    fn is_visible(&self) -> bool {
        self.common.visible
    }

    fn tessellate<'a>(&'a self, _model: &'a Mesh) -> Cow<'a, Mesh> {
        Cow::Owned(Mesh::cube(self.size, self.position))
    }

    fn to_json(&self) -> serde_json::Value {
        self.common.write(
            "CUBE",
            serde_json::json!({
                "Size": <[f32; 3]>::from(self.size),
                "Position": <[f32; 3]>::from(self.position),
            }),
        )
    }
}

#[derive(Clone, Debug)]
pub struct SphereGraphics {
    common: GraphicsCommon,
    radius: f32,
    divisions: u32,
    position: glam::Vec3A,
}

impl SphereGraphics {
    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        let common = GraphicsCommon::load(params)?;
        let radius = params.get_float_or("Radius", 0.5)? as f32;
        let divisions = params.get_int_or("Divisions", 16)?;
        let position = to_vec3a(params.get_float3_or("Position", [0.0, 0.0, 0.0])?);
        if radius <= 0.0 {
            anyhow::bail!(format!("{} - 'Radius' should be positive", params.name()));
        }
        if !(2..=256).contains(&divisions) {
            anyhow::bail!(format!(
                "{} - 'Divisions' should be in [2, 256]",
                params.name()
            ));
        }
        Ok(Self {
            common,
            radius,
            divisions: divisions as u32,
            position,
        })
    }
}

impl GraphicsT for SphereGraphics {
    fn material_name(&self) -> &str {
        &self.common.material
    }

    fn is_visible(&self) -> bool {
        self.common.visible
    }

    fn tessellate<'a>(&'a self, _model: &'a Mesh) -> Cow<'a, Mesh> {
        Cow::Owned(Mesh::sphere(self.radius, self.divisions, self.position))
    }

    fn to_json(&self) -> serde_json::Value {
        self.common.write(
            "SPHERE",
            serde_json::json!({
                "Radius": self.radius,
                "Divisions": self.divisions,
                "Position": <[f32; 3]>::from(self.position),
            }),
        )
    }
}

pub fn create_graphics_from_params(params: &mut InputParams) -> anyhow::Result<Graphics> {
    let ty = params.get_str("Type")?;
    let name = format!("{}-{}", params.name(), ty.to_lowercase());
    params.set_name(name.into());

    let res = match ty.as_str() {
        "SURFACES" => SurfacesGraphics::load(params)?.into(),
        "CUBE" => CubeGraphics::load(params)?.into(),
        "SPHERE" => SphereGraphics::load(params)?.into(),
        _ => anyhow::bail!(format!("{}: unknown type '{}'", params.name(), ty)),
    };

    params.check_unused_keys();

    Ok(res)
}

fn to_vec3a(v: [f64; 3]) -> glam::Vec3A {
    glam::Vec3A::new(v[0] as f32, v[1] as f32, v[2] as f32)
}
