//! Terraform state file reader.
//!
//! Parses tfstate v4 files and extracts managed resource instances so a prior state can seed a plan.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::resource::Resource;

const SUPPORTED_VERSION: u64 = 4;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse state file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported state version {0}, expected {SUPPORTED_VERSION}")]
    UnsupportedVersion(u64),
}

#[derive(Debug, Deserialize)]
struct RawState {
    version: u64,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    #[serde(default)]
    index_key: Option<Value>,
    #[serde(default)]
    attributes: Value,
}

#[derive(Debug, Clone, Default)]
pub struct TerraformState {
    resources: Vec<Resource>,
}

impl TerraformState {
    pub fn parse(contents: &str) -> Result<Self, StateError> {
        let raw: RawState = serde_json::from_str(contents)?;
        if raw.version != SUPPORTED_VERSION {
            return Err(StateError::UnsupportedVersion(raw.version));
        }

        let resources = raw
            .resources
            .into_iter()
            .filter(|r| r.mode == "managed")
            .flat_map(|r| {
                let resource_type = r.resource_type;
                let name = r.name;
                r.instances.into_iter().map(move |instance| {
                    let name = match &instance.index_key {
                        Some(Value::String(key)) => format!("{}[{:?}]", name, key),
                        Some(key) => format!("{}[{}]", name, key),
                        None => name.clone(),
                    };
                    Resource::from_state(&resource_type, &name, instance.attributes)
                })
            })
            .collect();

        Ok(Self { resources })
    }

    pub fn from_path(path: &Path) -> Result<Self, StateError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }

    /// Looks up an instance by its resource ID, ignoring case as ARM does.
    pub fn find_by_id<'a>(
        &'a self,
        resource_type: &'a str,
        resource_id: &str,
    ) -> Option<&'a Resource> {
        self.resources_of_type(resource_type)
            .find(|r| r.resource_id.eq_ignore_ascii_case(resource_id))
    }
}
