use std::path::PathBuf;

use crate::core::{error::LoadError, loader::InputParams, mesh::Mesh};

use super::graphics::{create_graphics_from_params, Graphics, GraphicsT};

/// External model file of a region, kept with the name it was written with.
#[derive(Clone, Debug)]
pub struct ModelSource {
    file_name: String,
    path: PathBuf,
}

impl ModelSource {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Node of the document's region tree: model geometry, the graphics showing it,
/// and child regions placed by an optional transformation.
#[derive(Clone, Debug)]
pub struct Region {
    name: String,
    transformation: Option<glam::DMat4>,
    sources: Vec<ModelSource>,
    model: Mesh,
    graphics: Vec<Graphics>,
    children: Vec<Region>,
}

impl Region {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            transformation: None,
            sources: vec![],
            model: Mesh::default(),
            graphics: vec![],
            children: vec![],
        }
    }

    pub fn load(name: &str, params: &mut InputParams) -> Result<Self, LoadError> {
        params.set_name(format!("region({})", name).into());
        let mut region = Region::new(name);

        if params.contains_key("Transformation") {
            let matrix = params
                .get_matrix("Transformation")
                .map_err(LoadError::Invalid)?;
            if matrix.determinant() == 0.0 {
                return Err(LoadError::Invalid(anyhow::anyhow!(
                    "{} - 'Transformation' is singular",
                    params.name()
                )));
            }
            region.transformation = Some(matrix);
        }

        if params.contains_key("Model") {
            let mut model = params.get_object("Model").map_err(LoadError::Invalid)?;
            let sources = model
                .get_object_array("Sources")
                .map_err(LoadError::Invalid)?;
            for mut source in sources {
                region.load_source(&mut source)?;
            }
            model.check_unused_keys();
        }

        if params.contains_key("Scene") {
            let mut scene = params.get_object("Scene").map_err(LoadError::Invalid)?;
            if scene.contains_key("Graphics") {
                let graphics = scene
                    .get_object_array("Graphics")
                    .map_err(LoadError::Invalid)?;
                for mut g in graphics {
                    region
                        .graphics
                        .push(create_graphics_from_params(&mut g).map_err(LoadError::Invalid)?);
                }
            }
            scene.check_unused_keys();
        }

        if params.contains_key("ChildRegions") {
            let children = params
                .get_object_array("ChildRegions")
                .map_err(LoadError::Invalid)?;
            for mut child in children {
                let child_name = child.get_str("Name").map_err(LoadError::Invalid)?;
                if region.children.iter().any(|c| c.name == child_name) {
                    return Err(LoadError::Invalid(anyhow::anyhow!(
                        "{} - child region '{}' is duplicated",
                        params.name(),
                        child_name
                    )));
                }
                region.children.push(Region::load(&child_name, &mut child)?);
            }
        }

        params.check_unused_keys();

        Ok(region)
    }

    fn load_source(&mut self, params: &mut InputParams) -> Result<(), LoadError> {
        let ty = params
            .get_str_or("Type", "FILE")
            .map_err(LoadError::Invalid)?;
        if ty != "FILE" {
            return Err(LoadError::Invalid(anyhow::anyhow!(
                "{} - unsupported source type '{}'",
                params.name(),
                ty
            )));
        }
        let file_name = params.get_str("FileName").map_err(LoadError::Invalid)?;
        let path = params
            .get_file_path("FileName")
            .map_err(LoadError::Invalid)?;
        params.check_unused_keys();

        let mesh = Mesh::load_obj(&path).map_err(|e| LoadError::Resource {
            path: path.clone(),
            message: format!("{:#}", e),
        })?;
        self.model.append(mesh);
        self.sources.push(ModelSource { file_name, path });
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({});
        if self.name != "/" {
            json["Name"] = self.name.clone().into();
        }
        if let Some(matrix) = self.transformation {
            json["Transformation"] = matrix.to_cols_array().to_vec().into();
        }
        if !self.sources.is_empty() {
            let sources: Vec<serde_json::Value> = self
                .sources
                .iter()
                .map(|s| serde_json::json!({ "Type": "FILE", "FileName": s.file_name }))
                .collect();
            json["Model"] = serde_json::json!({ "Sources": sources });
        }
        if !self.graphics.is_empty() {
            let graphics: Vec<serde_json::Value> =
                self.graphics.iter().map(GraphicsT::to_json).collect();
            json["Scene"] = serde_json::json!({ "Graphics": graphics });
        }
        if !self.children.is_empty() {
            let children: Vec<serde_json::Value> =
                self.children.iter().map(Region::to_json).collect();
            json["ChildRegions"] = children.into();
        }
        json
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Mesh {
        &self.model
    }

    pub fn sources(&self) -> &[ModelSource] {
        &self.sources
    }

    pub fn graphics(&self) -> &[Graphics] {
        &self.graphics
    }

    pub fn children(&self) -> &[Region] {
        &self.children
    }

    pub fn add_graphics(&mut self, graphics: Graphics) {
        self.graphics.push(graphics);
    }

    pub fn add_child(&mut self, child: Region) {
        self.children.push(child);
    }

    pub fn find_child(&self, name: &str) -> Option<&Region> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Calls `f` for this region and every descendant with its accumulated
    /// region-to-world transformation.
    pub fn visit<F: FnMut(&Region, glam::DMat4)>(&self, parent: glam::DMat4, f: &mut F) {
        let world = match self.transformation {
            Some(local) => parent * local,
            None => parent,
        };
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }

    pub fn graphics_count(&self) -> usize {
        let mut count = 0;
        self.visit(glam::DMat4::IDENTITY, &mut |region, _| {
            count += region.graphics.len()
        });
        count
    }
}
