mod backend;
mod dom;
mod fetch;
mod leaflet;

use std::rc::Rc;

use device_map::config::CONFIG_ELEMENT_ID;
use device_map::{Config, LayerController, MapError};
use web_sys::Document;
use yew::prelude::*;

use backend::LeafletBackend;
use fetch::GlooFetch;

const MAP_ELEMENT_ID: &str = "device-map";

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}

fn load_config(document: &Document) -> Result<Config, MapError> {
    match document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
    {
        Some(text) => Config::from_json(&text),
        None => Ok(Config::default()),
    }
}

/// Create the Leaflet map inside the rendered container and start loading
/// the device layer.
fn mount() -> Result<(), MapError> {
    let document = gloo::utils::document();
    let config = load_config(&document)?;

    let map = leaflet::create_map(MAP_ELEMENT_ID);
    map.set_view(
        &leaflet::lat_lng(config.center[0], config.center[1]),
        config.zoom,
    );
    leaflet::create_tile_layer(
        &config.tile_url,
        &leaflet::tile_options(&config.tile_attribution),
    )
    .add_to(&map);

    let controller = LayerController::new(
        LeafletBackend::new(map, document),
        Rc::new(GlooFetch),
        config.endpoints(),
    );
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = controller.setup().await {
            log::error!("Failed to load device markers: {e}");
        }
    });
    Ok(())
}

#[function_component(App)]
fn app() -> Html {
    use_effect_with((), |_| {
        if let Err(e) = mount() {
            log::error!("Device map failed to start: {e}");
        }
        || ()
    });

    html! { <div id={MAP_ELEMENT_ID}></div> }
}
