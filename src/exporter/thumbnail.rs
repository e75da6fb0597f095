use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::error::{ExportError, LoadError},
    document::ArgonDocument,
};

use super::{image_writer, ExportParameters};

pub const THUMBNAIL_SIZE: u32 = 512;
pub const THUMBNAIL_SAMPLES: u32 = 4;

lazy_static! {
    static ref OFFSCREEN_AVAILABLE: bool = {
        let available = cfg!(feature = "offscreen");
        log::debug!("offscreen rendering available: {}", available);
        available
    };
}

/// `Ok` when the offscreen rendering toolkit was compiled in.
pub fn thumbnail_capability() -> Result<(), ExportError> {
    if *OFFSCREEN_AVAILABLE {
        Ok(())
    } else {
        Err(ExportError::MissingOptionalDependency("offscreen"))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DocumentStatus {
    NotLoaded,
    Loaded,
    LoadFailed,
}

/// Exports the visualisation of an Argon document as a JPEG thumbnail.
pub struct ArgonSceneExporter {
    output_target: PathBuf,
    parameters: ExportParameters,
    document: Option<ArgonDocument>,
    filename: Option<PathBuf>,
    last_load_failed: bool,
}

impl ArgonSceneExporter {
    pub fn new(output_target: Option<PathBuf>, output_prefix: Option<String>) -> Self {
        let mut parameters = ExportParameters::default();
        if let Some(prefix) = output_prefix {
            parameters.prefix = prefix;
        }
        Self {
            output_target: output_target.unwrap_or_else(|| PathBuf::from(".")),
            parameters,
            document: None,
            filename: None,
            last_load_failed: false,
        }
    }

    pub fn set_document(&mut self, document: ArgonDocument) {
        self.document = Some(document);
        self.last_load_failed = false;
    }

    pub fn document(&self) -> Option<&ArgonDocument> {
        self.document.as_ref()
    }

    /// Document file `export` loads when no document is held.
    pub fn set_filename<P: Into<PathBuf>>(&mut self, filename: P) {
        self.filename = Some(filename.into());
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_parameters(&mut self, parameters: ExportParameters) {
        self.parameters = parameters;
    }

    pub fn parameters(&self) -> &ExportParameters {
        &self.parameters
    }

    pub fn output_target(&self) -> &Path {
        &self.output_target
    }

    pub fn set_output_target<P: Into<PathBuf>>(&mut self, output_target: P) {
        self.output_target = output_target.into();
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        image_writer::thumbnail_path(&self.output_target, &self.parameters.prefix)
    }

    /// Where the next export writes, same as [`Self::thumbnail_path`].
    pub fn output_path(&self) -> PathBuf {
        self.thumbnail_path()
    }

    pub fn document_status(&self) -> DocumentStatus {
        match (&self.document, self.last_load_failed) {
            (Some(_), _) => DocumentStatus::Loaded,
            (None, true) => DocumentStatus::LoadFailed,
            (None, false) => DocumentStatus::NotLoaded,
        }
    }

    /// Loads the Argon file at `path`, logging any failure.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        match self.try_load(path) {
            Ok(()) => true,
            Err(err) => {
                log_load_failure(path, &err);
                false
            }
        }
    }

    /// An unreadable file keeps the current document. A file that fails to
    /// deserialise clears it.
    pub fn try_load(&mut self, path: &Path) -> Result<(), LoadError> {
        let state = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let base_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut document = ArgonDocument::new();
        document.initialise_visualisation_contents();
        if let Err(err) = document.deserialize(&state, &base_dir) {
            self.document = None;
            self.last_load_failed = true;
            return Err(err);
        }

        log::info!("loaded Argon visualisation '{}'", path.display());
        self.document = Some(document);
        self.filename = Some(path.to_path_buf());
        self.last_load_failed = false;
        Ok(())
    }

    /// Loads the configured file when no document is held, otherwise rebuilds
    /// the held document from its own serialised state, then exports the thumbnail.
    pub fn export(&mut self, output_target: Option<&Path>) -> Result<PathBuf, ExportError> {
        if let Some(output_target) = output_target {
            self.output_target = output_target.to_path_buf();
        }

        match self.document.as_mut() {
            None => {
                let filename = self.filename.clone().ok_or(ExportError::NoDocument)?;
                if let Err(err) = self.try_load(&filename) {
                    log_load_failure(&filename, &err);
                    return Err(err.into());
                }
            }
            Some(document) => {
                if let Err(err) = refresh(document) {
                    let source = self.filename.as_deref().unwrap_or_else(|| document.base_dir());
                    log_load_failure(source, &err);
                    self.document = None;
                    self.last_load_failed = true;
                    return Err(err.into());
                }
            }
        }

        self.export_thumbnail()
    }

    /// Renders the held document offscreen and writes `<output>/<prefix>_thumbnail.jpeg`.
    pub fn export_thumbnail(&self) -> Result<PathBuf, ExportError> {
        thumbnail_capability()?;
        let document = self.document.as_ref().ok_or(ExportError::NoDocument)?;
        self.parameters.validate()?;

        let path = self.thumbnail_path();
        log::info!("exporting thumbnail to '{}'", path.display());
        render_thumbnail(document, &self.parameters, &path)?;
        Ok(path)
    }
}

fn log_load_failure(path: &Path, err: &LoadError) {
    log::error!(
        "Failed to load Argon visualisation {}: {}",
        path.display(),
        err
    );
}

/// Rebuilds `document` from its own serialised state.
fn refresh(document: &mut ArgonDocument) -> Result<(), LoadError> {
    let state = document.serialize()?;
    let base_dir = document.base_dir().to_path_buf();
    document.free_visualisation_contents();
    document.initialise_visualisation_contents();
    document.deserialize(&state, &base_dir)
}

#[cfg(feature = "offscreen")]
fn render_thumbnail(
    document: &ArgonDocument,
    parameters: &ExportParameters,
    path: &Path,
) -> Result<(), ExportError> {
    use crate::{
        core::error::RenderError,
        gl::{create_offscreen_context, Attachment, Framebuffer, FramebufferFormat, SurfaceFormat},
        sceneviewer::{BufferingMode, SceneviewerModule, StereoMode},
    };

    let context = create_offscreen_context(SurfaceFormat::default())?;
    let format = FramebufferFormat {
        samples: THUMBNAIL_SAMPLES,
        attachment: Attachment::CombinedDepthStencil,
    };
    let mut framebuffer = Framebuffer::new(&context, THUMBNAIL_SIZE, THUMBNAIL_SIZE, format)?;
    let mut target = framebuffer.bind();

    let module = SceneviewerModule::new(document).ok_or(LoadError::NotInitialised)?;
    let mut sceneviewer = module.create_sceneviewer(BufferingMode::Double, StereoMode::Default);
    sceneviewer.set_viewport_size(THUMBNAIL_SIZE, THUMBNAIL_SIZE);

    if parameters.is_time_varying() {
        return Err(ExportError::UnsupportedFeature("time-varying export"));
    }

    let view = document
        .sceneviewer()
        .and_then(|stored| stored.view_parameters())
        .ok_or(RenderError::ViewParametersUnset)?;
    sceneviewer.set_lookat_parameters_non_skew(
        view.eye_position,
        view.look_at_position,
        view.up_vector,
    )?;
    sceneviewer.set_far_clipping_plane(view.far_clipping_plane);
    sceneviewer.set_near_clipping_plane(view.near_clipping_plane);
    sceneviewer.set_view_angle(view.view_angle);
    let scene = document.root_region().ok_or(RenderError::NoScene)?;
    sceneviewer.set_scene(scene);
    sceneviewer.render_scene(&mut target)?;

    image_writer::extract_and_save(&target, path)?;
    drop(target);
    framebuffer.release();
    Ok(())
}

#[cfg(not(feature = "offscreen"))]
fn render_thumbnail(
    _document: &ArgonDocument,
    _parameters: &ExportParameters,
    _path: &Path,
) -> Result<(), ExportError> {
    Err(ExportError::MissingOptionalDependency("offscreen"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let exporter = ArgonSceneExporter::new(None, None);
        assert_eq!(
            exporter.thumbnail_path(),
            PathBuf::from("./ArgonSceneExporterThumbnail_thumbnail.jpeg")
        );
        assert_eq!(exporter.output_path(), exporter.thumbnail_path());
        assert_eq!(exporter.parameters().number_of_time_steps, 10);
        assert_eq!(exporter.document_status(), DocumentStatus::NotLoaded);
    }

    #[test]
    fn export_without_document_or_filename() {
        let mut exporter = ArgonSceneExporter::new(None, None);
        let err = exporter.export(None).unwrap_err();
        assert!(matches!(err, ExportError::NoDocument));
    }

    #[test]
    fn set_parameters_replaces_prefix() {
        let mut exporter = ArgonSceneExporter::new(Some("out".into()), Some("first".into()));
        exporter.set_parameters(ExportParameters::with_prefix("second"));
        assert_eq!(
            exporter.thumbnail_path(),
            PathBuf::from("out/second_thumbnail.jpeg")
        );
    }

    #[cfg(feature = "offscreen")]
    #[test]
    fn capability_reported() {
        assert!(thumbnail_capability().is_ok());
    }

    #[cfg(not(feature = "offscreen"))]
    #[test]
    fn missing_toolkit_is_reported() {
        let mut exporter = ArgonSceneExporter::new(None, None);
        let mut document = ArgonDocument::new();
        document.initialise_visualisation_contents();
        exporter.set_document(document);
        let err = exporter.export_thumbnail().unwrap_err();
        assert!(err.is_missing_dependency());
    }
}
