use device_map::{Fetch, MapError};
use gloo::net::http::Request;

/// Plain GET through the browser's fetch API.
pub struct GlooFetch;

impl Fetch for GlooFetch {
    async fn get_text(&self, url: &str) -> Result<String, MapError> {
        let resp = Request::get(url)
            .send()
            .await
            .map_err(|e| MapError::Fetch(format!("Network error: {e}")))?;
        if !resp.ok() {
            return Err(MapError::Fetch(format!(
                "{url} returned {} {}",
                resp.status(),
                resp.status_text()
            )));
        }
        resp.text()
            .await
            .map_err(|e| MapError::Fetch(format!("Failed to read response: {e}")))
    }
}
