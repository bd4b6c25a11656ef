use std::path::Path;

use serde_json::{Map, Value};

/// Fields returned by the list endpoint.
const SUMMARY_FIELDS: [&str; 4] = ["id", "name", "latitude", "longitude"];

#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// In-memory device records loaded from a fixture file. Each record is the
/// full device-info object; list responses are projected from it.
#[derive(Debug, Clone, Default)]
pub struct DeviceStore {
    devices: Vec<Map<String, Value>>,
}

impl DeviceStore {
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let devices = serde_json::from_str(text)
            .map_err(|e| StoreError(format!("invalid device fixture: {e}")))?;
        Ok(Self { devices })
    }

    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn list(&self, only_with_location: bool) -> Vec<Value> {
        self.devices
            .iter()
            .filter(|device| !only_with_location || has_location(device))
            .map(summary)
            .collect()
    }

    pub fn info(&self, id: i64) -> Option<&Map<String, Value>> {
        self.devices
            .iter()
            .find(|device| device.get("id").and_then(Value::as_i64) == Some(id))
    }
}

fn has_location(device: &Map<String, Value>) -> bool {
    ["latitude", "longitude"]
        .iter()
        .all(|key| device.get(*key).is_some_and(Value::is_number))
}

fn summary(device: &Map<String, Value>) -> Value {
    let mut fields = Map::new();
    for key in SUMMARY_FIELDS {
        if let Some(value) = device.get(key) {
            fields.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(fields)
}
