//! Bindings for the parts of Leaflet and Leaflet.markercluster the map uses.
//! Both libraries are loaded as globals by the host page.

use device_map::{MarkerOptions, PopupOptions};
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    pub type Map;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    pub fn create_map(element_id: &str) -> Map;

    #[wasm_bindgen(method, js_name = setView)]
    pub fn set_view(this: &Map, center: &LatLng, zoom: f64) -> Map;

    #[wasm_bindgen(method, js_name = addLayer)]
    pub fn add_layer(this: &Map, layer: &JsValue) -> Map;

    pub type TileLayer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    pub fn create_tile_layer(url_template: &str, options: &JsValue) -> TileLayer;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &TileLayer, map: &Map) -> TileLayer;

    pub type LatLng;

    #[wasm_bindgen(js_namespace = L, js_name = latLng)]
    pub fn lat_lng(lat: f64, lng: f64) -> LatLng;

    pub type Point;

    #[wasm_bindgen(js_namespace = L, js_name = point)]
    pub fn point(x: f64, y: f64) -> Point;

    pub type Marker;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    pub fn create_marker(position: &LatLng, options: &JsValue) -> Marker;

    #[wasm_bindgen(method)]
    pub fn on(this: &Marker, event: &str, handler: &js_sys::Function) -> Marker;

    #[wasm_bindgen(method, js_name = bindPopup)]
    pub fn bind_popup(this: &Marker, popup: &Popup) -> Marker;

    pub type Popup;

    #[wasm_bindgen(js_namespace = L, js_name = popup)]
    pub fn create_popup(options: &JsValue) -> Popup;

    /// Accepts an HTML string or a DOM node.
    #[wasm_bindgen(method, js_name = setContent)]
    pub fn set_content(this: &Popup, content: &JsValue) -> Popup;

    pub type PopupEvent;

    #[wasm_bindgen(method, getter)]
    pub fn popup(this: &PopupEvent) -> Popup;

    pub type MarkerClusterGroup;

    #[wasm_bindgen(js_namespace = L, js_name = markerClusterGroup)]
    pub fn create_marker_cluster_group() -> MarkerClusterGroup;

    #[wasm_bindgen(method, js_name = addLayer)]
    pub fn add_marker(this: &MarkerClusterGroup, marker: &Marker) -> MarkerClusterGroup;
}

fn set(object: &Object, key: &str, value: JsValue) {
    if let Err(err) = Reflect::set(object, &JsValue::from_str(key), &value) {
        log::debug!("failed to set option {key}: {err:?}");
    }
}

pub fn marker_options(options: &MarkerOptions) -> JsValue {
    let object = Object::new();
    set(&object, "title", JsValue::from_str(&options.title));
    set(&object, "autoPan", JsValue::from_bool(options.auto_pan));
    let padding = options.auto_pan_padding;
    set(&object, "autoPanPadding", point(padding.x, padding.y).into());
    object.into()
}

pub fn popup_options(options: &PopupOptions) -> JsValue {
    let object = Object::new();
    set(&object, "className", JsValue::from_str(&options.class_name));
    let padding = options.auto_pan_padding;
    set(&object, "autoPanPadding", point(padding.x, padding.y).into());
    object.into()
}

pub fn tile_options(attribution: &str) -> JsValue {
    let object = Object::new();
    set(&object, "attribution", JsValue::from_str(attribution));
    set(&object, "maxZoom", JsValue::from_f64(19.0));
    object.into()
}
