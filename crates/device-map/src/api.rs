use crate::device::DeviceId;

/// Builds request URLs for the device API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_root: String,
}

impl Endpoints {
    pub fn new(api_root: &str) -> Self {
        Self {
            api_root: api_root.to_string(),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Devices that have a known location.
    pub fn list_devices(&self) -> String {
        format!("{}?action=list-devices&only-with-location=yes", self.api_root)
    }

    pub fn device_info(&self, id: &DeviceId) -> String {
        format!("{}?action=device-info&device-id={id}", self.api_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_url() {
        let endpoints = Endpoints::new("https://example.org/api.php");
        assert_eq!(
            endpoints.list_devices(),
            "https://example.org/api.php?action=list-devices&only-with-location=yes"
        );
    }

    #[test]
    fn test_device_info_url() {
        let endpoints = Endpoints::new("/api");
        let id = DeviceId::try_from(&serde_json::json!(7)).unwrap();
        assert_eq!(
            endpoints.device_info(&id),
            "/api?action=device-info&device-id=7"
        );
    }
}
