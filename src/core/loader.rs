use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    convert::{TryFrom, TryInto},
    path::PathBuf,
};

use anyhow::Context;

use crate::core::color::Color;

/// Typed view over one JSON object of an Argon document.
///
/// Every getter records the key as visited so that [`InputParams::check_unused_keys`]
/// can report members the loader never looked at.
pub struct InputParams {
    params: HashMap<String, InputParamsValue>,
    name: Cow<'static, str>,
    visited_names: HashSet<String>,
    base_dir: PathBuf,
}

pub enum InputParamsValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Array(Vec<InputParamsValue>),
    Object(InputParams),
}

impl InputParamsValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            InputParamsValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            InputParamsValue::Float(v) => Some(*v),
            InputParamsValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            InputParamsValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! params_get {
    ( $( ( $name:ident, $type:ty, $as:ident, $hint:expr ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                pub fn [<get_ $name>](&mut self, key: &str) -> anyhow::Result<$type> {
                    if let Some(value) = self.params.get(key) {
                        if let Some(value) = value.$as() {
                            self.visited_names.insert(key.to_owned());
                            return Ok(value);
                        }
                        anyhow::bail!(format!("{} - '{}' should be {}", self.name, key, $hint));
                    }
                    anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
                }

                /// `fallback` only when `key` is absent; a value of the wrong type is an error.
                pub fn [<get_ $name _or>](
                    &mut self,
                    key: &str,
                    fallback: $type,
                ) -> anyhow::Result<$type> {
                    if self.contains_key(key) {
                        self.[<get_ $name>](key)
                    } else {
                        Ok(fallback)
                    }
                }
            }
        )+
    };
}

macro_rules! params_get_vec {
    ( $( ( $name:ident, $type:ty, $len:expr, $as:ident, $hint:expr ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                pub fn [<get_ $name>](&mut self, key: &str) -> anyhow::Result<[$type; $len]> {
                    if let Some(value) = self.params.get(key) {
                        let error_info = format!(
                            "{} - '{}' should be array with {} {}s",
                            self.name,
                            key,
                            $len,
                            $hint,
                        );
                        if let InputParamsValue::Array(arr) = value {
                            if arr.len() == $len {
                                let mut result: [$type; $len] = Default::default();
                                for (slot, ele) in result.iter_mut().zip(arr) {
                                    *slot = ele.$as().context(error_info.clone())?;
                                }
                                self.visited_names.insert(key.to_owned());
                                return Ok(result);
                            }
                        }
                        anyhow::bail!(error_info);
                    }
                    anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
                }

                pub fn [<get_ $name _or>](
                    &mut self,
                    key: &str,
                    fallback: [$type; $len],
                ) -> anyhow::Result<[$type; $len]> {
                    if self.contains_key(key) {
                        self.[<get_ $name>](key)
                    } else {
                        Ok(fallback)
                    }
                }
            }
        )+
    };
}

impl InputParams {
    pub fn set_name(&mut self, name: Cow<'static, str>) {
        self.name = name;
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Directory relative resource names are resolved against.
    pub fn set_base_dir(&mut self, dir: PathBuf) {
        self.base_dir = dir;
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_null(&self, key: &str) -> bool {
        matches!(self.params.get(key), Some(InputParamsValue::Null))
    }

    /// `None` when the key is absent or null.
    pub fn get_float_opt(&mut self, key: &str) -> anyhow::Result<Option<f64>> {
        if self.is_null(key) {
            self.visited_names.insert(key.to_owned());
            return Ok(None);
        }
        if !self.contains_key(key) {
            return Ok(None);
        }
        self.get_float(key).map(Some)
    }

    params_get! {
        (int, i64, as_int, "integer"),
        (float, f64, as_float, "float"),
        (bool, bool, as_bool, "boolean"),
    }

    params_get_vec! {
        (int3, i64, 3, as_int, "integer"),
        (float3, f64, 3, as_float, "float"),
        (float4, f64, 4, as_float, "float"),
    }

    pub fn get_dvec3(&mut self, key: &str) -> anyhow::Result<glam::DVec3> {
        Ok(glam::DVec3::from(self.get_float3(key)?))
    }

    pub fn get_color(&mut self, key: &str) -> anyhow::Result<Color> {
        let [r, g, b] = self.get_float3(key)?;
        Ok(Color::new(r as f32, g as f32, b as f32))
    }

    pub fn get_color_or(&mut self, key: &str, fallback: Color) -> anyhow::Result<Color> {
        if self.contains_key(key) {
            self.get_color(key)
        } else {
            Ok(fallback)
        }
    }

    /// 16 numbers in column-major order.
    pub fn get_matrix(&mut self, key: &str) -> anyhow::Result<glam::DMat4> {
        if let Some(value) = self.params.get(key) {
            let error_info = format!("{} - '{}' should be an array of 16 floats", self.name, key);
            if let InputParamsValue::Array(arr) = value {
                if arr.len() == 16 {
                    let mut cols = [0.0; 16];
                    for (slot, ele) in cols.iter_mut().zip(arr) {
                        *slot = ele.as_float().context(error_info.clone())?;
                    }
                    self.visited_names.insert(key.to_owned());
                    return Ok(glam::DMat4::from_cols_array(&cols));
                }
            }
            anyhow::bail!(error_info);
        }
        anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
    }

    pub fn get_str(&mut self, key: &str) -> anyhow::Result<String> {
        if let Some(value) = self.params.get(key) {
            if let InputParamsValue::String(value) = value {
                self.visited_names.insert(key.to_owned());
                return Ok(value.clone());
            }
            anyhow::bail!(format!("{} - '{}' should be string", self.name, key));
        }
        anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
    }

    pub fn get_str_or(&mut self, key: &str, fallback: &str) -> anyhow::Result<String> {
        if self.contains_key(key) {
            self.get_str(key)
        } else {
            Ok(fallback.to_owned())
        }
    }

    pub fn get_str_array(&mut self, key: &str) -> anyhow::Result<Vec<String>> {
        if let Some(value) = self.params.get(key) {
            let error_info = format!("{} - '{}' should be array of strings", self.name, key);
            if let InputParamsValue::Array(arr) = value {
                let mut result = Vec::with_capacity(arr.len());
                for ele in arr {
                    if let InputParamsValue::String(s) = ele {
                        result.push(s.clone());
                    } else {
                        anyhow::bail!(error_info);
                    }
                }
                self.visited_names.insert(key.to_owned());
                return Ok(result);
            }
            anyhow::bail!(error_info);
        }
        anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
    }

    pub fn get_file_path(&mut self, key: &str) -> anyhow::Result<PathBuf> {
        let filename = self.get_str(key)?;
        Ok(self.base_dir.join(filename))
    }

    /// Takes a nested object out of this one; it inherits the base directory.
    pub fn get_object(&mut self, key: &str) -> anyhow::Result<InputParams> {
        match self.params.remove(key) {
            Some(InputParamsValue::Object(mut object)) => {
                self.visited_names.insert(key.to_owned());
                object.set_name(format!("{}/{}", self.name, key).into());
                object.set_base_dir(self.base_dir.clone());
                Ok(object)
            }
            Some(other) => {
                self.params.insert(key.to_owned(), other);
                anyhow::bail!(format!("{} - '{}' should be object", self.name, key));
            }
            None => anyhow::bail!(format!("{} - there is no '{}' field", self.name, key)),
        }
    }

    pub fn get_object_array(&mut self, key: &str) -> anyhow::Result<Vec<InputParams>> {
        match self.params.remove(key) {
            Some(InputParamsValue::Array(arr)) => {
                self.visited_names.insert(key.to_owned());
                let mut result = Vec::with_capacity(arr.len());
                for (i, ele) in arr.into_iter().enumerate() {
                    if let InputParamsValue::Object(mut object) = ele {
                        object.set_name(format!("{}/{}[{}]", self.name, key, i).into());
                        object.set_base_dir(self.base_dir.clone());
                        result.push(object);
                    } else {
                        anyhow::bail!(format!(
                            "{} - '{}' should be array of objects",
                            self.name, key
                        ));
                    }
                }
                Ok(result)
            }
            Some(other) => {
                self.params.insert(key.to_owned(), other);
                anyhow::bail!(format!("{} - '{}' should be array", self.name, key));
            }
            None => anyhow::bail!(format!("{} - there is no '{}' field", self.name, key)),
        }
    }

    pub fn check_unused_keys(&self) {
        for k in self.params.keys() {
            if !k.starts_with('#') && !self.visited_names.contains(k) {
                log::warn!("{} - unused key '{}'", self.name, k);
            }
        }
    }

    #[cfg(test)]
    pub fn unused_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .params
            .keys()
            .filter(|k| !k.starts_with('#') && !self.visited_names.contains(*k))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl TryFrom<&serde_json::Value> for InputParamsValue {
    type Error = anyhow::Error;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(v) => Ok(Self::Bool(*v)),
            serde_json::Value::Number(v) => {
                if let Some(v) = v.as_i64() {
                    Ok(Self::Int(v))
                } else {
                    let v = v
                        .as_f64()
                        .context(format!("can't convert number '{}'", v))?;
                    Ok(Self::Float(v))
                }
            }
            serde_json::Value::String(v) => Ok(Self::String(v.clone())),
            serde_json::Value::Array(arr) => {
                let mut values = Vec::<InputParamsValue>::with_capacity(arr.len());
                for v in arr {
                    match v.try_into() {
                        Ok(v) => values.push(v),
                        Err(e) => {
                            anyhow::bail!(format!("can't convert array element: {}", e))
                        }
                    }
                }
                Ok(Self::Array(values))
            }
            serde_json::Value::Object(_) => Ok(Self::Object(value.try_into()?)),
        }
    }
}

impl TryFrom<&serde_json::Value> for InputParams {
    type Error = anyhow::Error;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        if let serde_json::Value::Object(value) = value {
            let mut params = HashMap::<String, InputParamsValue>::with_capacity(value.len());
            for (k, v) in value {
                match v.try_into() {
                    Ok(v) => {
                        params.insert(k.clone(), v);
                    }
                    Err(e) => anyhow::bail!(format!("can't convert member '{}': {}", k, e)),
                }
            }
            Ok(Self {
                params,
                name: Cow::Owned("".to_owned()),
                visited_names: HashSet::new(),
                base_dir: PathBuf::default(),
            })
        } else {
            anyhow::bail!("can't convert to InputParams from non-object json value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: serde_json::Value) -> InputParams {
        let mut params: InputParams = (&json).try_into().unwrap();
        params.set_name("test".into());
        params
    }

    #[test]
    fn integers_are_accepted_as_floats() {
        let mut p = params(serde_json::json!({ "EyePosition": [0, 0, 5], "ViewAngle": 1 }));
        assert_eq!(p.get_float3("EyePosition").unwrap(), [0.0, 0.0, 5.0]);
        assert_eq!(p.get_float("ViewAngle").unwrap(), 1.0);
    }

    #[test]
    fn wrong_length_reports_key() {
        let mut p = params(serde_json::json!({ "UpVector": [0.0, 1.0] }));
        let err = p.get_float3("UpVector").unwrap_err().to_string();
        assert!(err.contains("'UpVector' should be array with 3 floats"));
    }

    #[test]
    fn missing_key_falls_back() {
        let mut p = params(serde_json::json!({}));
        assert!(p.get_str("Name").is_err());
        assert_eq!(p.get_str_or("Name", "root").unwrap(), "root");
        assert!(p.get_bool_or("Visible", true).unwrap());
    }

    #[test]
    fn present_key_of_wrong_type_does_not_fall_back() {
        let mut p = params(serde_json::json!({
            "Radius": "big",
            "Divisions": 2.5,
            "Position": [0, "one", 2],
            "Material": 3,
        }));
        let err = p.get_float_or("Radius", 0.5).unwrap_err().to_string();
        assert!(err.contains("'Radius' should be float"), "{}", err);
        assert!(p.get_int_or("Divisions", 16).is_err());
        assert!(p.get_float3_or("Position", [0.0; 3]).is_err());
        assert!(p.get_str_or("Material", "default").is_err());
        assert!(p.get_color_or("Diffuse", Color::WHITE).is_ok());
    }

    #[test]
    fn nested_objects_inherit_base_dir() {
        let mut p = params(serde_json::json!({
            "Model": { "Sources": [ { "Type": "FILE", "FileName": "cube.obj" } ] }
        }));
        p.set_base_dir(PathBuf::from("/data/docs"));
        let mut model = p.get_object("Model").unwrap();
        let mut sources = model.get_object_array("Sources").unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "test/Model/Sources[0]");
        assert_eq!(
            sources[0].get_file_path("FileName").unwrap(),
            PathBuf::from("/data/docs/cube.obj")
        );
    }

    #[test]
    fn null_or_missing_optional_float() {
        let mut p = params(serde_json::json!({ "initialTime": null, "finishTime": 2 }));
        assert_eq!(p.get_float_opt("initialTime").unwrap(), None);
        assert_eq!(p.get_float_opt("finishTime").unwrap(), Some(2.0));
        assert_eq!(p.get_float_opt("missing").unwrap(), None);
        assert!(p.unused_keys().is_empty());
    }

    #[test]
    fn unvisited_keys_are_tracked() {
        let mut p = params(serde_json::json!({ "Name": "red", "Shininess": 0.2 }));
        p.get_str("Name").unwrap();
        assert_eq!(p.unused_keys(), vec!["Shininess".to_owned()]);
    }

    #[test]
    fn matrix_is_column_major() {
        let mut p = params(serde_json::json!({
            "Transformation": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 2, 3, 4, 1]
        }));
        let m = p.get_matrix("Transformation").unwrap();
        assert_eq!(m.w_axis, glam::DVec4::new(2.0, 3.0, 4.0, 1.0));
    }
}
