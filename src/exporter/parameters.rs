use std::{convert::TryInto, fs, path::Path};

use anyhow::Context;

use crate::core::{error::ExportError, loader::InputParams};

pub const DEFAULT_PREFIX: &str = "ArgonSceneExporterThumbnail";
pub const DEFAULT_TIME_STEPS: u32 = 10;

/// Export settings. Setting both times asks for an animated export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportParameters {
    pub number_of_time_steps: u32,
    pub initial_time: Option<f64>,
    pub finish_time: Option<f64>,
    pub prefix: String,
}

impl Default for ExportParameters {
    fn default() -> Self {
        Self {
            number_of_time_steps: DEFAULT_TIME_STEPS,
            initial_time: None,
            finish_time: None,
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }
}

impl ExportParameters {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            ..Default::default()
        }
    }

    pub fn is_time_varying(&self) -> bool {
        self.initial_time.is_some() && self.finish_time.is_some()
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.number_of_time_steps == 0 {
            return Err(ExportError::Parameters(
                "'numberOfTimeSteps' should be at least 1".to_owned(),
            ));
        }
        if self.prefix.is_empty() || self.prefix.contains(|c: char| c == '/' || c == '\\') {
            return Err(ExportError::Parameters(format!(
                "'{}' is not a usable file name prefix",
                self.prefix
            )));
        }
        if let (Some(initial), Some(finish)) = (self.initial_time, self.finish_time) {
            if !initial.is_finite() || !finish.is_finite() {
                return Err(ExportError::Parameters("times should be finite".to_owned()));
            }
        }
        Ok(())
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self, ExportError> {
        Self::load(value).map_err(|e| ExportError::Parameters(format!("{:#}", e)))
    }

    pub fn from_json_str(json: &str) -> Result<Self, ExportError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ExportError::Parameters(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn load(value: &serde_json::Value) -> anyhow::Result<Self> {
        let mut params: InputParams = value.try_into()?;
        params.set_name("export parameters".into());

        let defaults = Self::default();
        let number_of_time_steps = if params.contains_key("numberOfTimeSteps") {
            let steps = params.get_int("numberOfTimeSteps")?;
            steps
                .try_into()
                .context(format!("'numberOfTimeSteps' {} is out of range", steps))?
        } else {
            defaults.number_of_time_steps
        };
        let parameters = Self {
            number_of_time_steps,
            initial_time: params.get_float_opt("initialTime")?,
            finish_time: params.get_float_opt("finishTime")?,
            prefix: if params.contains_key("prefix") {
                params.get_str("prefix")?
            } else {
                defaults.prefix
            },
        };
        params.check_unused_keys();

        parameters.validate()?;
        Ok(parameters)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "numberOfTimeSteps": self.number_of_time_steps,
            "initialTime": self.initial_time,
            "finishTime": self.finish_time,
            "prefix": self.prefix,
        })
    }
}
