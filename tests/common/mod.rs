#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

/// Unit red cube at the origin, seen from (0, 0, 5) with a 40 degree view angle.
pub const RED_CUBE: &str = r#"{
    "OpenCMISS-Argon Version": ["0", "2", "2"],
    "Sceneviewer": {
        "EyePosition": [0, 0, 5],
        "LookatPosition": [0, 0, 0],
        "UpVector": [0, 1, 0],
        "NearClippingPlane": 0.1,
        "FarClippingPlane": 100,
        "ViewAngle": 0.6981317007977318,
        "ProjectionMode": "PERSPECTIVE",
        "BackgroundColourRGB": [0, 0, 0]
    },
    "RootRegion": {
        "Scene": { "Graphics": [ { "Type": "CUBE", "Material": "red" } ] }
    }
}"#;

/// Same camera as [`RED_CUBE`], with the cube loaded from `mesh/cube.obj`.
pub const RED_CUBE_FROM_FILE: &str = r#"{
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
        "ChildRegions": [ {
            "Name": "cube",
            "Model": { "Sources": [ { "Type": "FILE", "FileName": "mesh/cube.obj" } ] },
            "Scene": { "Graphics": [ { "Type": "SURFACES", "Material": "red" } ] }
        } ]
    }
}"#;

/// Clipping planes the wrong way round; loads fine, fails to render.
pub const INVERTED_CLIPPING: &str = r#"{
    "Sceneviewer": {
        "EyePosition": [0, 0, 5],
        "LookatPosition": [0, 0, 0],
        "UpVector": [0, 1, 0],
        "NearClippingPlane": 200,
        "FarClippingPlane": 100,
        "ViewAngle": 0.6981317007977318
    },
    "RootRegion": {
        "Scene": { "Graphics": [ { "Type": "CUBE", "Material": "red" } ] }
    }
}"#;

pub const NO_CAMERA: &str = r#"{
    "RootRegion": {
        "Scene": { "Graphics": [ { "Type": "SPHERE", "Material": "blue" } ] }
    }
}"#;

pub const CUBE_OBJ: &str = "\
v -0.5 -0.5 -0.5
v 0.5 -0.5 -0.5
v 0.5 0.5 -0.5
v -0.5 0.5 -0.5
v -0.5 -0.5 0.5
v 0.5 -0.5 0.5
v 0.5 0.5 0.5
v -0.5 0.5 0.5
f 5 6 7 8
f 2 1 4 3
f 6 2 3 7
f 1 5 8 4
f 8 7 3 4
f 1 2 6 5
";

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Names of the entries directly inside `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
