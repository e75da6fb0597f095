//! Argon document: the deserialised visualisation an exporter renders.

mod graphics;
mod material;
mod region;
mod sceneviewer;

pub use graphics::*;
pub use material::*;
pub use region::*;
pub use sceneviewer::*;

use std::{
    convert::TryInto,
    path::{Path, PathBuf},
};

use crate::core::{error::LoadError, loader::InputParams};

pub const ARGON_VERSION: [u32; 3] = [0, 2, 2];
const VERSION_KEY: &str = "OpenCMISS-Argon Version";

#[derive(Debug)]
struct VisualisationContents {
    materials: MaterialModule,
    root_region: Region,
    sceneviewer: ArgonSceneviewer,
}

impl Default for VisualisationContents {
    fn default() -> Self {
        Self {
            materials: MaterialModule::default(),
            root_region: Region::new("/"),
            sceneviewer: ArgonSceneviewer::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ArgonDocument {
    contents: Option<VisualisationContents>,
    base_dir: PathBuf,
}

impl ArgonDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty materials, root region and sceneviewer, discarding any current ones.
    pub fn initialise_visualisation_contents(&mut self) {
        self.contents = Some(VisualisationContents::default());
    }

    pub fn free_visualisation_contents(&mut self) {
        self.contents = None;
    }

    pub fn is_initialised(&self) -> bool {
        self.contents.is_some()
    }

    /// Replaces the contents with the state in `state`. Relative resource names
    /// are resolved against `base_dir`.
    ///
    /// On failure the contents are left freshly initialised.
    pub fn deserialize(&mut self, state: &str, base_dir: &Path) -> Result<(), LoadError> {
        let contents = self.contents.as_mut().ok_or(LoadError::NotInitialised)?;
        *contents = VisualisationContents::default();
        self.base_dir = base_dir.to_path_buf();

        let json_value: serde_json::Value = serde_json::from_str(state)?;
        let mut params: InputParams = (&json_value).try_into().map_err(LoadError::Invalid)?;
        params.set_name("document".into());
        params.set_base_dir(base_dir.to_path_buf());

        let loaded = load_contents(&mut params)?;
        params.check_unused_keys();
        *contents = loaded;
        Ok(())
    }

    /// Directory the last deserialised state resolved its resources against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn serialize(&self) -> Result<String, LoadError> {
        let contents = self.contents.as_ref().ok_or(LoadError::NotInitialised)?;
        let mut json = serde_json::json!({
            "Materials": contents.materials.to_json(),
            "Sceneviewer": contents.sceneviewer.to_json(),
            "RootRegion": contents.root_region.to_json(),
        });
        json[VERSION_KEY] = ARGON_VERSION
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into();
        Ok(serde_json::to_string_pretty(&json)?)
    }

    pub fn root_region(&self) -> Option<&Region> {
        self.contents.as_ref().map(|c| &c.root_region)
    }

    pub fn root_region_mut(&mut self) -> Option<&mut Region> {
        self.contents.as_mut().map(|c| &mut c.root_region)
    }

    pub fn sceneviewer(&self) -> Option<&ArgonSceneviewer> {
        self.contents.as_ref().map(|c| &c.sceneviewer)
    }

    pub fn sceneviewer_mut(&mut self) -> Option<&mut ArgonSceneviewer> {
        self.contents.as_mut().map(|c| &mut c.sceneviewer)
    }

    pub fn material_module(&self) -> Option<&MaterialModule> {
        self.contents.as_ref().map(|c| &c.materials)
    }
}

fn load_contents(params: &mut InputParams) -> Result<VisualisationContents, LoadError> {
    let mut contents = VisualisationContents::default();

    if params.contains_key(VERSION_KEY) {
        check_version(params)?;
    } else {
        log::warn!("{} - no '{}' field", params.name(), VERSION_KEY);
    }

    if params.contains_key("Materials") {
        let materials = params
            .get_object_array("Materials")
            .map_err(LoadError::Invalid)?;
        for mut material in materials {
            contents
                .materials
                .define(Material::load(&mut material).map_err(LoadError::Invalid)?);
        }
    }

    if params.contains_key("Sceneviewer") {
        let mut sceneviewer = params
            .get_object("Sceneviewer")
            .map_err(LoadError::Invalid)?;
        contents.sceneviewer =
            ArgonSceneviewer::load(&mut sceneviewer).map_err(LoadError::Invalid)?;
    }

    if params.contains_key("RootRegion") {
        let mut root = params
            .get_object("RootRegion")
            .map_err(LoadError::Invalid)?;
        contents.root_region = Region::load("/", &mut root)?;
    }

    check_material_references(&contents)?;
    Ok(contents)
}

fn check_version(params: &mut InputParams) -> Result<(), LoadError> {
    let version = params
        .get_str_array(VERSION_KEY)
        .map_err(LoadError::Invalid)?;
    if version.len() != 3 {
        return Err(LoadError::Invalid(anyhow::anyhow!(
            "{} - '{}' should have 3 components",
            params.name(),
            VERSION_KEY
        )));
    }
    let parsed = version
        .iter()
        .map(|v| v.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            LoadError::Invalid(anyhow::anyhow!(
                "{} - '{}' is not numeric: {}",
                params.name(),
                VERSION_KEY,
                e
            ))
        })?;
    if parsed.as_slice() > &ARGON_VERSION[..] {
        log::warn!(
            "document version {} is newer than the supported {:?}",
            version.join("."),
            ARGON_VERSION
        );
    }
    Ok(())
}

fn check_material_references(contents: &VisualisationContents) -> Result<(), LoadError> {
    let mut missing = None;
    contents
        .root_region
        .visit(glam::DMat4::IDENTITY, &mut |region, _| {
            for g in region.graphics() {
                if missing.is_none()
                    && contents
                        .materials
                        .find_material_by_name(g.material_name())
                        .is_none()
                {
                    missing = Some((region.name().to_owned(), g.material_name().to_owned()));
                }
            }
        });
    match missing {
        Some((region, material)) => Err(LoadError::Invalid(anyhow::anyhow!(
            "region({}) - material '{}' not found",
            region,
            material
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const RED_CUBE: &str = r#"{
        "OpenCMISS-Argon Version": ["0", "2", "2"],
        "Sceneviewer": {
            "EyePosition": [0, 0, 5],
            "LookatPosition": [0, 0, 0],
            "UpVector": [0, 1, 0],
            "NearClippingPlane": 0.1,
            "FarClippingPlane": 100,
            "ViewAngle": 0.6981317007977318
        },
        "RootRegion": {
            "Scene": { "Graphics": [ { "Type": "CUBE", "Material": "red" } ] }
        }
    }"#;

    fn loaded(state: &str) -> Result<ArgonDocument, LoadError> {
        let mut document = ArgonDocument::new();
        document.initialise_visualisation_contents();
        document.deserialize(state, &PathBuf::from("."))?;
        Ok(document)
    }

    #[test]
    fn deserialize_requires_initialisation() {
        let mut document = ArgonDocument::new();
        let err = document.deserialize(RED_CUBE, Path::new(".")).unwrap_err();
        assert!(matches!(err, LoadError::NotInitialised));
    }

    #[test]
    fn red_cube_document() {
        let document = loaded(RED_CUBE).unwrap();
        assert_eq!(document.root_region().unwrap().graphics_count(), 1);
        let view = document.sceneviewer().unwrap().view_parameters().unwrap();
        assert_eq!(view.up_vector, glam::DVec3::Y);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(loaded("{ \"RootRegion\": "), Err(LoadError::Parse(_))));
    }

    #[test]
    fn unknown_material_is_invalid() {
        let state = r#"{ "RootRegion": { "Scene": { "Graphics": [
            { "Type": "CUBE", "Material": "plaid" } ] } } }"#;
        let err = loaded(state).unwrap_err();
        assert!(err.to_string().contains("material 'plaid' not found"));
    }

    #[test]
    fn failed_deserialize_leaves_empty_contents() {
        let mut document = loaded(RED_CUBE).unwrap();
        assert!(document.deserialize("[1, 2]", Path::new(".")).is_err());
        assert!(document.is_initialised());
        assert_eq!(document.root_region().unwrap().graphics_count(), 0);
        assert!(document.sceneviewer().unwrap().view_parameters().is_none());
    }

    #[test]
    fn serialize_then_deserialize_keeps_scene() {
        let document = loaded(RED_CUBE).unwrap();
        let state = document.serialize().unwrap();
        let reloaded = loaded(&state).unwrap();
        assert_eq!(reloaded.root_region().unwrap().graphics_count(), 1);
        assert_eq!(
            reloaded.sceneviewer().unwrap().view_parameters(),
            document.sceneviewer().unwrap().view_parameters()
        );
    }

    #[test]
    fn serialize_needs_contents() {
        let mut document = loaded(RED_CUBE).unwrap();
        document.free_visualisation_contents();
        assert!(matches!(document.serialize(), Err(LoadError::NotInitialised)));
        assert!(document.root_region().is_none());
    }
}
