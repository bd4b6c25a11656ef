//! The clustered device layer and the collaborator traits it drives.
//!
//! [`LayerController`] owns one clustering container. `setup` fills it from
//! the list endpoint and attaches it to the host map; each marker gets a
//! [`PopupOpenHandler`] that fetches and renders device details whenever its
//! popup opens.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use serde_json::Value;

use crate::api::Endpoints;
use crate::device::{DeviceDetail, DeviceId, DeviceSummary, DisplayRecord};
use crate::dom::Fragment;
use crate::error::MapError;
use crate::render::render_device_info;

/// Popup content shown until the device detail arrives.
pub const LOADING_HTML: &str = "&#x231b; Loading...";
pub const POPUP_CLASS: &str = "popup-device";
pub const AUTO_PAN_PADDING: Point = Point { x: 100.0, y: 100.0 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Pixel offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub title: String,
    pub auto_pan: bool,
    pub auto_pan_padding: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupOptions {
    pub class_name: String,
    pub auto_pan_padding: Point,
}

/// Retrieves a response body as text. Transport failures and non-success
/// statuses are errors.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn get_text(&self, url: &str) -> Result<String, MapError>;
}

/// A popup that is currently open.
pub trait PopupHandle {
    fn set_content(&self, content: &Fragment) -> Result<(), MapError>;
}

pub type PopupFuture = Pin<Box<dyn Future<Output = Result<(), MapError>>>>;

/// Invoked with the opened popup each time a marker's popup opens.
pub type PopupOpenCallback<P> = Box<dyn Fn(P) -> PopupFuture>;

/// Marker, popup and clustering primitives of the host map library.
pub trait MapBackend {
    type Marker;
    type Popup: PopupHandle + 'static;
    type Cluster;

    fn create_cluster(&self) -> Self::Cluster;
    fn create_marker(&self, position: LatLng, options: &MarkerOptions) -> Self::Marker;
    fn create_popup(&self, options: &PopupOptions, placeholder_html: &str) -> Self::Popup;
    fn on_popup_open(&self, marker: &Self::Marker, callback: PopupOpenCallback<Self::Popup>);
    fn bind_popup(&self, marker: &Self::Marker, popup: Self::Popup);
    fn add_to_cluster(&self, cluster: &Self::Cluster, marker: Self::Marker);
    /// Attach the cluster to the host map.
    fn add_layer(&self, cluster: &Self::Cluster);
}

/// Per-marker handler holding the device id captured at marker creation.
pub struct PopupOpenHandler<F> {
    device_id: Value,
    endpoints: Endpoints,
    fetch: Rc<F>,
}

impl<F> Clone for PopupOpenHandler<F> {
    fn clone(&self) -> Self {
        Self {
            device_id: self.device_id.clone(),
            endpoints: self.endpoints.clone(),
            fetch: Rc::clone(&self.fetch),
        }
    }
}

impl<F: Fetch> PopupOpenHandler<F> {
    pub fn new(device_id: Value, endpoints: Endpoints, fetch: Rc<F>) -> Self {
        Self {
            device_id,
            endpoints,
            fetch,
        }
    }

    pub fn device_id(&self) -> &Value {
        &self.device_id
    }

    /// Fetch the device detail and replace the popup's content with it.
    ///
    /// A non-numeric id fails before any request is made. On any error the
    /// popup keeps whatever content it had.
    pub async fn handle<P: PopupHandle>(&self, popup: &P) -> Result<(), MapError> {
        let device_id = DeviceId::try_from(&self.device_id)?;

        let url = self.endpoints.device_info(&device_id);
        log::debug!("Fetching device info from {url}");
        let body = self.fetch.get_text(&url).await?;

        let record = DisplayRecord::from_detail(DeviceDetail::from_json(&body)?);
        popup.set_content(&render_device_info(&record))
    }
}

pub struct LayerController<B: MapBackend, F> {
    backend: B,
    layer: B::Cluster,
    endpoints: Endpoints,
    fetch: Rc<F>,
}

impl<B, F> LayerController<B, F>
where
    B: MapBackend + 'static,
    F: Fetch + 'static,
{
    pub fn new(backend: B, fetch: Rc<F>, endpoints: Endpoints) -> Self {
        let layer = backend.create_cluster();
        Self {
            backend,
            layer,
            endpoints,
            fetch,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn layer(&self) -> &B::Cluster {
        &self.layer
    }

    /// Load every located device into the cluster, then show the cluster.
    ///
    /// A failed or malformed list leaves the map untouched.
    pub async fn setup(&self) -> Result<(), MapError> {
        let url = self.endpoints.list_devices();
        log::debug!("Fetching device list from {url}");
        let devices = crate::parse_device_list(&self.fetch.get_text(&url).await?)?;

        for device in &devices {
            self.add_device_marker(device);
        }

        self.backend.add_layer(&self.layer);
        log::info!("Added {} device markers", devices.len());
        Ok(())
    }

    pub fn add_device_marker(&self, device: &DeviceSummary) {
        let marker = self.backend.create_marker(
            device.position(),
            &MarkerOptions {
                title: device.title(),
                auto_pan: true,
                auto_pan_padding: AUTO_PAN_PADDING,
            },
        );
        let popup = self.backend.create_popup(
            &PopupOptions {
                class_name: POPUP_CLASS.to_string(),
                auto_pan_padding: AUTO_PAN_PADDING,
            },
            LOADING_HTML,
        );

        let handler = self.popup_open_handler(device.id.clone());
        self.backend.on_popup_open(
            &marker,
            Box::new(move |popup: B::Popup| -> PopupFuture {
                let handler = handler.clone();
                Box::pin(async move { handler.handle(&popup).await })
            }),
        );

        self.backend.bind_popup(&marker, popup);
        self.backend.add_to_cluster(&self.layer, marker);
    }

    pub fn popup_open_handler(&self, device_id: Value) -> PopupOpenHandler<F> {
        PopupOpenHandler::new(device_id, self.endpoints.clone(), Rc::clone(&self.fetch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};

    /// Serves queued responses per URL and records every request.
    #[derive(Default)]
    struct MockFetch {
        responses: RefCell<HashMap<String, VecDeque<Result<String, String>>>>,
        requests: RefCell<Vec<String>>,
    }

    impl MockFetch {
        fn respond(&self, url: &str, body: Result<&str, &str>) {
            self.responses
                .borrow_mut()
                .entry(url.to_string())
                .or_default()
                .push_back(body.map(str::to_string).map_err(str::to_string));
        }

        fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl Fetch for MockFetch {
        async fn get_text(&self, url: &str) -> Result<String, MapError> {
            self.requests.borrow_mut().push(url.to_string());
            let next = self
                .responses
                .borrow_mut()
                .get_mut(url)
                .and_then(VecDeque::pop_front);
            match next {
                Some(Ok(body)) => Ok(body),
                Some(Err(e)) => Err(MapError::Fetch(e)),
                None => Err(MapError::Fetch(format!("404 for {url}"))),
            }
        }
    }

    #[derive(Clone)]
    struct MockPopup {
        options: PopupOptions,
        content: Rc<RefCell<String>>,
        updates: Rc<Cell<usize>>,
    }

    impl MockPopup {
        fn content(&self) -> String {
            self.content.borrow().clone()
        }
    }

    impl PopupHandle for MockPopup {
        fn set_content(&self, content: &Fragment) -> Result<(), MapError> {
            *self.content.borrow_mut() = content.to_html();
            self.updates.set(self.updates.get() + 1);
            Ok(())
        }
    }

    struct MockMarker {
        position: LatLng,
        options: MarkerOptions,
        popup: RefCell<Option<MockPopup>>,
        on_open: RefCell<Option<PopupOpenCallback<MockPopup>>>,
    }

    #[derive(Default)]
    struct MockMap {
        attached: Cell<usize>,
    }

    type MockCluster = RefCell<Vec<Rc<MockMarker>>>;

    impl MapBackend for MockMap {
        type Marker = Rc<MockMarker>;
        type Popup = MockPopup;
        type Cluster = MockCluster;

        fn create_cluster(&self) -> MockCluster {
            RefCell::new(Vec::new())
        }

        fn create_marker(&self, position: LatLng, options: &MarkerOptions) -> Rc<MockMarker> {
            Rc::new(MockMarker {
                position,
                options: options.clone(),
                popup: RefCell::new(None),
                on_open: RefCell::new(None),
            })
        }

        fn create_popup(&self, options: &PopupOptions, placeholder_html: &str) -> MockPopup {
            MockPopup {
                options: options.clone(),
                content: Rc::new(RefCell::new(placeholder_html.to_string())),
                updates: Rc::new(Cell::new(0)),
            }
        }

        fn on_popup_open(&self, marker: &Rc<MockMarker>, callback: PopupOpenCallback<MockPopup>) {
            *marker.on_open.borrow_mut() = Some(callback);
        }

        fn bind_popup(&self, marker: &Rc<MockMarker>, popup: MockPopup) {
            *marker.popup.borrow_mut() = Some(popup);
        }

        fn add_to_cluster(&self, cluster: &MockCluster, marker: Rc<MockMarker>) {
            cluster.borrow_mut().push(marker);
        }

        fn add_layer(&self, _cluster: &MockCluster) {
            self.attached.set(self.attached.get() + 1);
        }
    }

    impl MockMarker {
        fn popup(&self) -> MockPopup {
            self.popup.borrow().clone().unwrap()
        }

        fn open(&self) -> PopupFuture {
            let callback = self.on_open.borrow();
            (callback.as_ref().unwrap())(self.popup())
        }
    }

    const LIST_URL: &str = "/api?action=list-devices&only-with-location=yes";

    fn controller() -> LayerController<MockMap, MockFetch> {
        LayerController::new(
            MockMap::default(),
            Rc::new(MockFetch::default()),
            Endpoints::new("/api"),
        )
    }

    fn markers(controller: &LayerController<MockMap, MockFetch>) -> Vec<Rc<MockMarker>> {
        controller.layer().borrow().clone()
    }

    #[tokio::test]
    async fn test_setup_adds_one_marker_per_device() {
        let controller = controller();
        controller.fetch.respond(
            LIST_URL,
            Ok(r#"[
                {"id": 1, "name": "North gate", "latitude": 51.5, "longitude": -0.1},
                {"id": 2, "name": "Pump", "latitude": 48.85, "longitude": 2.35},
                {"id": 3, "name": "Tower", "latitude": -33.9, "longitude": 151.2}
            ]"#),
        );

        controller.setup().await.unwrap();

        let markers = markers(&controller);
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].position, LatLng::new(51.5, -0.1));
        assert_eq!(markers[1].position, LatLng::new(48.85, 2.35));
        assert_eq!(markers[2].position, LatLng::new(-33.9, 151.2));
        assert_eq!(controller.backend().attached.get(), 1);
        assert_eq!(controller.fetch.requests(), vec![LIST_URL]);
    }

    #[tokio::test]
    async fn test_unusual_names_still_get_markers() {
        let controller = controller();
        controller.fetch.respond(
            LIST_URL,
            Ok(r#"[
                {"id": 1, "latitude": 1, "longitude": 2},
                {"id": 2, "name": "B", "latitude": 3, "longitude": 4},
                {"id": 3, "name": null, "latitude": 5, "longitude": 6},
                {"id": 4, "name": 42, "latitude": 7, "longitude": 8}
            ]"#),
        );

        controller.setup().await.unwrap();

        let titles: Vec<String> = markers(&controller)
            .iter()
            .map(|marker| marker.options.title.clone())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Device: undefined",
                "Device: B",
                "Device: null",
                "Device: 42"
            ]
        );
        assert_eq!(controller.backend().attached.get(), 1);
    }

    #[test]
    fn test_marker_options_and_placeholder() {
        let controller = controller();
        controller.add_device_marker(&DeviceSummary {
            id: serde_json::json!(4),
            name: Some(serde_json::json!("Weather <station>")),
            latitude: 1.0,
            longitude: 2.0,
        });

        let markers = markers(&controller);
        let marker = &markers[0];
        assert_eq!(marker.options.title, "Device: Weather <station>");
        assert!(marker.options.auto_pan);
        assert_eq!(marker.options.auto_pan_padding, Point { x: 100.0, y: 100.0 });
        assert_eq!(marker.popup().content(), LOADING_HTML);
        assert_eq!(marker.popup().options.class_name, "popup-device");
        assert_eq!(marker.popup().options.auto_pan_padding, AUTO_PAN_PADDING);
        assert!(marker.on_open.borrow().is_some());
        // Markers only reach the map through the cluster in setup.
        assert_eq!(controller.backend().attached.get(), 0);
    }

    #[tokio::test]
    async fn test_setup_failure_leaves_map_untouched() {
        let controller = controller();
        controller.fetch.respond(LIST_URL, Err("connection reset"));
        assert!(matches!(controller.setup().await, Err(MapError::Fetch(_))));
        assert!(markers(&controller).is_empty());
        assert_eq!(controller.backend().attached.get(), 0);

        let controller = self::controller();
        controller.fetch.respond(
            LIST_URL,
            Ok(r#"[{"id": 1, "name": "A", "latitude": 1, "longitude": 2}, {"id": 2"#),
        );
        assert!(matches!(controller.setup().await, Err(MapError::Json(_))));
        assert!(markers(&controller).is_empty());
        assert_eq!(controller.backend().attached.get(), 0);
    }

    #[tokio::test]
    async fn test_open_fetches_captured_device() {
        let controller = controller();
        controller.fetch.respond(
            LIST_URL,
            Ok(r#"[
                {"id": 3, "name": "A", "latitude": 1, "longitude": 2},
                {"id": 7, "name": "B", "latitude": 3, "longitude": 4}
            ]"#),
        );
        controller.fetch.respond(
            "/api?action=device-info&device-id=7",
            Ok(r#"{"id": 7, "name": "B", "latitude": 3, "longitude": 4, "other": "spare", "battery_level": 80}"#),
        );
        controller.setup().await.unwrap();

        let marker = &markers(&controller)[1];
        marker.open().await.unwrap();

        assert_eq!(
            controller.fetch.requests(),
            vec![LIST_URL, "/api?action=device-info&device-id=7"]
        );
        let html = marker.popup().content();
        assert!(html.starts_with("<h2 class=\"device-name\" data-id=\"7\">Device: B</h2>"));
        assert!(html.contains("<th class=\"name\">Battery Level</th><td class=\"value\">80</td>"));
        assert!(html.contains("<td class=\"value\">(3, 4)</td>"));
        assert!(html.ends_with("<p class=\"device-notes\"><em>spare</em></p>"));
    }

    #[tokio::test]
    async fn test_invalid_id_fails_before_fetch() {
        let controller = controller();
        controller.fetch.respond(
            LIST_URL,
            Ok(r#"[
                {"id": "7", "name": "Stringly", "latitude": 1, "longitude": 2},
                {"name": "Anonymous", "latitude": 1, "longitude": 2}
            ]"#),
        );
        controller.setup().await.unwrap();

        for marker in markers(&controller) {
            let err = marker.open().await.unwrap_err();
            assert!(matches!(err, MapError::InvalidDeviceId(_)));
            assert_eq!(marker.popup().content(), LOADING_HTML);
        }
        assert_eq!(controller.fetch.requests(), vec![LIST_URL]);
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_placeholder() {
        let controller = controller();
        controller.add_device_marker(&DeviceSummary {
            id: serde_json::json!(9),
            name: Some(serde_json::json!("A")),
            latitude: 0.0,
            longitude: 0.0,
        });
        controller
            .fetch
            .respond("/api?action=device-info&device-id=9", Ok("not json"));

        let marker = &markers(&controller)[0];
        assert!(matches!(marker.open().await, Err(MapError::Json(_))));
        assert_eq!(marker.popup().content(), LOADING_HTML);
    }

    #[tokio::test]
    async fn test_reopen_fetches_again() {
        let controller = controller();
        controller.add_device_marker(&DeviceSummary {
            id: serde_json::json!(5),
            name: Some(serde_json::json!("A")),
            latitude: 0.0,
            longitude: 0.0,
        });
        let url = "/api?action=device-info&device-id=5";
        controller.fetch.respond(
            url,
            Ok(r#"{"id": 5, "name": "A", "latitude": 0, "longitude": 0, "other": "first"}"#),
        );
        controller.fetch.respond(url, Err("timed out"));

        let marker = &markers(&controller)[0];
        marker.open().await.unwrap();
        let first = marker.popup().content();
        assert!(first.contains("<em>first</em>"));

        assert!(marker.open().await.is_err());
        assert_eq!(marker.popup().content(), first);
        assert_eq!(marker.popup().updates.get(), 1);
        assert_eq!(controller.fetch.requests(), vec![url, url]);
    }

    #[tokio::test]
    async fn test_overlapping_opens_last_write_wins() {
        let controller = controller();
        controller.add_device_marker(&DeviceSummary {
            id: serde_json::json!(6),
            name: Some(serde_json::json!("A")),
            latitude: 0.0,
            longitude: 0.0,
        });
        let url = "/api?action=device-info&device-id=6";
        controller.fetch.respond(
            url,
            Ok(r#"{"id": 6, "name": "A", "latitude": 0, "longitude": 0, "other": "early"}"#),
        );
        controller.fetch.respond(
            url,
            Ok(r#"{"id": 6, "name": "A", "latitude": 0, "longitude": 0, "other": "late"}"#),
        );

        let marker = &markers(&controller)[0];
        let first = marker.open();
        let second = marker.open();
        // Completion order, not open order, decides what stays visible.
        second.await.unwrap();
        first.await.unwrap();

        assert_eq!(marker.popup().updates.get(), 2);
        assert!(marker.popup().content().contains("<em>late</em>"));
    }
}
