use std::collections::{BTreeMap, BTreeSet};

use crate::core::{color::Color, loader::InputParams};

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    name: String,
    ambient: Color,
    diffuse: Color,
    emission: Color,
    alpha: f32,
}

impl Material {
    pub fn new(name: &str, ambient: Color, diffuse: Color) -> Self {
        Self {
            name: name.to_owned(),
            ambient,
            diffuse,
            emission: Color::BLACK,
            alpha: 1.0,
        }
    }

    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }

    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        let name = params.get_str("Name")?;
        params.set_name(format!("material({})", name).into());

        let diffuse = params.get_color_or("Diffuse", Color::WHITE)?;
        let ambient = params.get_color_or("Ambient", diffuse)?;
        let emission = params.get_color_or("Emission", Color::BLACK)?;
        let alpha = params.get_float_or("Alpha", 1.0)? as f32;
        if !(0.0..=1.0).contains(&alpha) {
            anyhow::bail!(format!("{} - 'Alpha' should be in [0, 1]", params.name()));
        }

        params.check_unused_keys();

        Ok(Self {
            name,
            ambient,
            diffuse,
            emission,
            alpha,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "Name": self.name,
            "Ambient": self.ambient.to_array(),
            "Diffuse": self.diffuse.to_array(),
            "Emission": self.emission.to_array(),
            "Alpha": self.alpha,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ambient(&self) -> Color {
        self.ambient
    }

    pub fn diffuse(&self) -> Color {
        self.diffuse
    }

    pub fn emission(&self) -> Color {
        self.emission
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// Named materials of a document: the standard set plus whatever the document defines.
#[derive(Clone, Debug)]
pub struct MaterialModule {
    materials: BTreeMap<String, Material>,
    document_defined: BTreeSet<String>,
}

impl Default for MaterialModule {
    fn default() -> Self {
        let mut module = Self {
            materials: BTreeMap::new(),
            document_defined: BTreeSet::new(),
        };
        module.define_standard_materials();
        module
    }
}

impl MaterialModule {
    pub const DEFAULT_MATERIAL: &'static str = "default";

    fn define_standard_materials(&mut self) {
        let standard = [
            ("default", Color::gray(1.0), Color::gray(1.0)),
            ("black", Color::gray(0.0), Color::gray(0.0)),
            ("white", Color::gray(1.0), Color::gray(1.0)),
            ("grey50", Color::gray(0.5), Color::gray(0.5)),
            ("red", Color::new(0.4, 0.0, 0.0), Color::new(1.0, 0.0, 0.0)),
            ("green", Color::new(0.0, 0.4, 0.0), Color::new(0.0, 1.0, 0.0)),
            ("blue", Color::new(0.0, 0.0, 0.4), Color::new(0.0, 0.0, 1.0)),
            ("yellow", Color::new(0.4, 0.4, 0.0), Color::new(1.0, 1.0, 0.0)),
            ("orange", Color::new(0.4, 0.2, 0.0), Color::new(1.0, 0.5, 0.0)),
            ("gold", Color::new(1.0, 0.4, 0.0), Color::new(1.0, 0.7, 0.0)),
            ("silver", Color::gray(0.4), Color::gray(0.7)),
            ("copper", Color::new(1.0, 0.2, 0.0), Color::new(0.6, 0.3, 0.0)),
            ("bone", Color::new(0.7, 0.7, 0.6), Color::new(0.9, 0.9, 0.7)),
            ("muscle", Color::new(0.4, 0.14, 0.11), Color::new(0.5, 0.12, 0.1)),
            ("tissue", Color::new(0.9, 0.7, 0.5), Color::new(0.9, 0.7, 0.5)),
        ];
        for (name, ambient, diffuse) in standard.iter() {
            self.materials
                .insert((*name).to_owned(), Material::new(name, *ambient, *diffuse));
        }
    }

    /// Adds or replaces a material; it is written back on serialisation.
    pub fn define(&mut self, material: Material) {
        self.document_defined.insert(material.name.clone());
        self.materials.insert(material.name.clone(), material);
    }

    pub fn find_material_by_name(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn default_material(&self) -> &Material {
        &self.materials[Self::DEFAULT_MATERIAL]
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.document_defined
                .iter()
                .filter_map(|name| self.materials.get(name))
                .map(Material::to_json)
                .collect(),
        )
    }
}
