use device_map::dom::Fragment;
use device_map::layer::PopupOpenCallback;
use device_map::{LatLng, MapBackend, MapError, MarkerOptions, PopupHandle, PopupOptions};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Document;

use crate::dom::to_dom;
use crate::leaflet;

pub struct LeafletBackend {
    map: leaflet::Map,
    document: Document,
}

impl LeafletBackend {
    pub fn new(map: leaflet::Map, document: Document) -> Self {
        Self { map, document }
    }
}

pub struct LeafletPopup {
    popup: leaflet::Popup,
    document: Document,
}

impl PopupHandle for LeafletPopup {
    fn set_content(&self, content: &Fragment) -> Result<(), MapError> {
        let node = to_dom(&self.document, content)
            .map_err(|e| MapError::Render(format!("{e:?}")))?;
        self.popup.set_content(&node);
        Ok(())
    }
}

impl MapBackend for LeafletBackend {
    type Marker = leaflet::Marker;
    type Popup = LeafletPopup;
    type Cluster = leaflet::MarkerClusterGroup;

    fn create_cluster(&self) -> leaflet::MarkerClusterGroup {
        leaflet::create_marker_cluster_group()
    }

    fn create_marker(&self, position: LatLng, options: &MarkerOptions) -> leaflet::Marker {
        leaflet::create_marker(
            &leaflet::lat_lng(position.lat, position.lng),
            &leaflet::marker_options(options),
        )
    }

    fn create_popup(&self, options: &PopupOptions, placeholder_html: &str) -> LeafletPopup {
        let popup = leaflet::create_popup(&leaflet::popup_options(options));
        popup.set_content(&JsValue::from_str(placeholder_html));
        LeafletPopup {
            popup,
            document: self.document.clone(),
        }
    }

    fn on_popup_open(&self, marker: &leaflet::Marker, callback: PopupOpenCallback<LeafletPopup>) {
        let document = self.document.clone();
        let listener = Closure::<dyn FnMut(leaflet::PopupEvent)>::new(
            move |event: leaflet::PopupEvent| {
                let opened = callback(LeafletPopup {
                    popup: event.popup(),
                    document: document.clone(),
                });
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = opened.await {
                        log::error!("Failed to show device info: {e}");
                    }
                });
            },
        );
        marker.on("popupopen", listener.as_ref().unchecked_ref());
        // Markers live as long as the page.
        listener.forget();
    }

    fn bind_popup(&self, marker: &leaflet::Marker, popup: LeafletPopup) {
        marker.bind_popup(&popup.popup);
    }

    fn add_to_cluster(&self, cluster: &leaflet::MarkerClusterGroup, marker: leaflet::Marker) {
        cluster.add_marker(&marker);
    }

    fn add_layer(&self, cluster: &leaflet::MarkerClusterGroup) {
        self.map.add_layer(cluster);
    }
}
