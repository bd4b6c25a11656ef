use serde::{Deserialize, Serialize};

use crate::api::Endpoints;
use crate::error::MapError;

pub const DEFAULT_API_ROOT: &str = "/api";
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// Id of the `<script type="application/json">` element that carries the
/// serialized [`Config`] in the viewer page.
pub const CONFIG_ELEMENT_ID: &str = "device-map-config";

/// Settings shared by the viewer and the development server.
///
/// Every field is optional in the serialized form; missing fields fall back
/// to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_root: String,
    pub tile_url: String,
    pub tile_attribution: String,
    /// Initial map center as `[lat, lon]`.
    pub center: [f64; 2],
    pub zoom: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_attribution: DEFAULT_TILE_ATTRIBUTION.to_string(),
            center: [0.0, 0.0],
            zoom: 2.0,
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, MapError> {
        serde_json::from_str(text).map_err(|e| MapError::Config(e.to_string()))
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.api_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_root, "/api");
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_json(r#"{"api_root": "https://example.org/api.php", "zoom": 9}"#)
            .unwrap();
        assert_eq!(config.api_root, "https://example.org/api.php");
        assert_eq!(config.zoom, 9.0);
        assert_eq!(config.tile_url, DEFAULT_TILE_URL);
    }

    #[test]
    fn test_malformed_config() {
        let err = Config::from_json("{api_root:").unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }
}
