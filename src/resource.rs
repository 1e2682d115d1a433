use serde::{Deserialize, Serialize};

/// One managed resource instance: its type, local name, remote ID and last known attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Resource {
    pub resource_type: String,
    pub name: String,
    pub resource_id: String,
    pub attributes: serde_json::Value,
}

impl Resource {
    /// Builds a record from a provider's state value, taking the remote ID from its `id` attribute.
    pub fn from_state(resource_type: &str, name: &str, attributes: serde_json::Value) -> Self {
        let resource_id = attributes
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or_default()
            .to_string();
        Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            resource_id,
            attributes,
        }
    }

    /// `type.name`, the tool-internal address.
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}
