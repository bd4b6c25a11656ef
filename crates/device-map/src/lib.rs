pub mod api;
pub mod config;
pub mod device;
pub mod dom;
pub mod error;
pub mod layer;
pub mod render;

pub use api::Endpoints;
pub use config::Config;
pub use device::{DeviceDetail, DeviceId, DeviceSummary, DisplayRecord, PropertyValue};
pub use error::MapError;
pub use layer::{
    Fetch, LatLng, LayerController, MapBackend, MarkerOptions, Point, PopupHandle,
    PopupOpenHandler, PopupOptions,
};
pub use render::render_device_info;

/// Parse the list endpoint's response body.
pub fn parse_device_list(body: &str) -> Result<Vec<DeviceSummary>, MapError> {
    Ok(serde_json::from_str(body)?)
}
