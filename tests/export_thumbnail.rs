#![cfg(feature = "offscreen")]

mod common;

use std::fs;

use argon_thumbnail::{
    exporter::{DEFAULT_PREFIX, THUMBNAIL_SIZE},
    ArgonSceneExporter, DocumentStatus, ExportError, ExportParameters, LoadError, RenderError,
};

use common::*;

fn is_red(pixel: [u8; 3]) -> bool {
    let [r, g, b] = pixel;
    r > 100 && r / 2 > g && r / 2 > b
}

#[test]
fn red_cube_thumbnail() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_file(dir.path(), "red_cube.argon", RED_CUBE);
    let output = dir.path().join("out");
    fs::create_dir(&output).unwrap();

    let mut exporter = ArgonSceneExporter::new(Some(output.clone()), None);
    exporter.set_filename(&document);
    let path = exporter.export(None).unwrap();

    assert_eq!(path, output.join(format!("{}_thumbnail.jpeg", DEFAULT_PREFIX)));
    assert_eq!(
        entries(&output),
        vec![format!("{}_thumbnail.jpeg", DEFAULT_PREFIX)]
    );

    let image = image::open(&path).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    for &(x, y) in &[(256, 256), (240, 270), (270, 240)] {
        let pixel = image.get_pixel(x, y).0;
        assert!(is_red(pixel), "pixel ({}, {}) is {:?}", x, y, pixel);
        assert!(pixel[0] > 200);
    }
    let corner = image.get_pixel(5, 5).0;
    assert!(corner.iter().all(|&c| c < 30), "corner is {:?}", corner);
}

#[test]
fn time_varying_export_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_file(dir.path(), "red_cube.argon", RED_CUBE);
    let output = dir.path().join("out");
    fs::create_dir(&output).unwrap();

    let mut exporter = ArgonSceneExporter::new(Some(output.clone()), None);
    exporter.set_filename(&document);
    exporter.set_parameters(ExportParameters {
        initial_time: Some(0.0),
        finish_time: Some(1.0),
        ..Default::default()
    });
    let err = exporter.export(None).unwrap_err();
    assert!(err.is_unsupported(), "{}", err);
    assert!(entries(&output).is_empty());
}

#[test]
fn single_time_bound_is_a_still_export() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_file(dir.path(), "red_cube.argon", RED_CUBE);

    let mut exporter = ArgonSceneExporter::new(Some(dir.path().to_path_buf()), None);
    exporter.set_filename(&document);
    exporter.set_parameters(ExportParameters {
        initial_time: Some(0.0),
        ..ExportParameters::with_prefix("still")
    });
    let path = exporter.export(None).unwrap();
    assert!(path.ends_with("still_thumbnail.jpeg"));
}

#[test]
fn exporting_twice_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_file(dir.path(), "red_cube.argon", RED_CUBE);
    let output = dir.path().join("out");
    fs::create_dir(&output).unwrap();

    let mut exporter = ArgonSceneExporter::new(None, Some("twice".to_owned()));
    exporter.set_filename(&document);
    let first = exporter.export(Some(output.as_path())).unwrap();
    let first_bytes = fs::read(&first).unwrap();
    // second export rebuilds the held document from its serialised state
    let second = exporter.export(Some(output.as_path())).unwrap();

    assert_eq!(first, second);
    assert_eq!(entries(&output), vec!["twice_thumbnail.jpeg".to_owned()]);
    assert_eq!(fs::read(&second).unwrap(), first_bytes);
}

#[test]
fn model_files_resolve_against_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    write_file(&docs, "mesh/cube.obj", CUBE_OBJ);
    let document = write_file(&docs, "scene.argon", RED_CUBE_FROM_FILE);
    let cwd = std::env::current_dir().unwrap();

    let mut exporter = ArgonSceneExporter::new(Some(dir.path().to_path_buf()), None);
    exporter.set_filename(&document);
    let path = exporter.export(None).unwrap();
    assert_eq!(std::env::current_dir().unwrap(), cwd);

    let image = image::open(&path).unwrap().to_rgb8();
    let centre = image.get_pixel(256, 256).0;
    assert!(is_red(centre), "centre is {:?}", centre);
}

#[test]
fn failed_refresh_drops_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    let model = write_file(&docs, "mesh/cube.obj", CUBE_OBJ);
    let document = write_file(&docs, "scene.argon", RED_CUBE_FROM_FILE);

    let mut exporter = ArgonSceneExporter::new(Some(dir.path().to_path_buf()), None);
    exporter.set_filename(&document);
    exporter.export(None).unwrap();
    assert_eq!(exporter.document_status(), DocumentStatus::Loaded);

    fs::remove_file(&model).unwrap();
    let err = exporter.export(None).unwrap_err();
    assert!(
        matches!(err, ExportError::Load(LoadError::Resource { .. })),
        "{}",
        err
    );
    assert_eq!(exporter.document_status(), DocumentStatus::LoadFailed);
    assert!(exporter.document().is_none());

    // next export goes back to the file
    write_file(&docs, "mesh/cube.obj", CUBE_OBJ);
    exporter.export(None).unwrap();
    assert_eq!(exporter.document_status(), DocumentStatus::Loaded);
}

#[test]
fn missing_output_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_file(dir.path(), "red_cube.argon", RED_CUBE);
    let output = dir.path().join("absent");

    let mut exporter = ArgonSceneExporter::new(Some(output.clone()), None);
    exporter.set_filename(&document);
    let err = exporter.export(None).unwrap_err();
    assert!(matches!(err, ExportError::Io { .. }), "{}", err);
    assert!(!output.exists());
}

#[test]
fn document_without_camera_does_not_render() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_file(dir.path(), "sphere.argon", NO_CAMERA);
    let output = dir.path().join("out");
    fs::create_dir(&output).unwrap();

    let mut exporter = ArgonSceneExporter::new(Some(output.clone()), None);
    exporter.set_filename(&document);
    let err = exporter.export(None).unwrap_err();
    assert!(matches!(
        err,
        ExportError::Render(RenderError::ViewParametersUnset)
    ));
    assert!(entries(&output).is_empty());
}

#[test]
fn unreadable_document_aborts_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = ArgonSceneExporter::new(Some(dir.path().to_path_buf()), None);
    exporter.set_filename(dir.path().join("missing.argon"));
    let err = exporter.export(None).unwrap_err();
    assert!(matches!(err, ExportError::Load(_)), "{}", err);
    assert!(entries(dir.path()).is_empty());
}
