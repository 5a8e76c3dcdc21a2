use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
// Typed errors for decoding, fetching, bounds and config
pub mod error;
// Shared data structures
pub mod models;
// Shapefile and dBASE records into polygon features
pub mod decoder;
// Clip rings to the image bounds
pub mod bbox_clip;
// Geographic to pixel coordinates
pub mod projector;
// Fetch, decode and clip one crown dataset
pub mod crown_loader;
// Species lookup, filtering and counts
pub mod species;
// Viewer metadata document
pub mod config;
// Currently displayed crown collection
pub mod session;

#[cfg(test)]
mod test_fixtures;

use config::ViewerConfig;
use console::ConsoleDiagnostics;
use crown_loader::JsFetcher;
use models::{CrownPolygon, GeographicBounds, ImageSize, Point};
use session::CrownSession;
use species::SpeciesCatalog;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[wasm_bindgen]
extern "C" {
    // JavaScript function to fetch data from URL
    #[wasm_bindgen(js_namespace = wasmJsHelpers, catch)]
    pub fn fetch(url: &str) -> Result<js_sys::Promise, JsValue>;
}

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("WASM module initialized successfully");
    });
}

// Plain JS objects instead of ES Maps for attribute maps
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

// Image bounds arrive in config order: [[minLat, minLon], [maxLat, maxLon]]
fn bounds_from_js(image_bounds: JsValue) -> Result<GeographicBounds, JsValue> {
    let corners: [[f64; 2]; 2] = serde_wasm_bindgen::from_value(image_bounds)?;
    GeographicBounds::from_lat_lon_corners(corners).map_err(|e| JsValue::from_str(&e.to_string()))
}

// Explicit crowns from JS, or the session's current collection when omitted
fn crowns_from_js(crowns: JsValue) -> Result<Vec<CrownPolygon>, JsValue> {
    if crowns.is_undefined() || crowns.is_null() {
        let session = CrownSession::global().lock();
        return Ok((*session.crowns()).clone());
    }
    Ok(serde_wasm_bindgen::from_value(crowns)?)
}

// Config species list; an omitted list accepts every species name
fn catalog_from_js(known_species: JsValue) -> Result<SpeciesCatalog, JsValue> {
    if known_species.is_undefined() || known_species.is_null() {
        return Ok(SpeciesCatalog::default());
    }
    let known: Vec<String> = serde_wasm_bindgen::from_value(known_species)?;
    Ok(SpeciesCatalog::new(known))
}

/// Load the crowns of a shapefile and make them the session's current collection.
///
/// Resolves even when the shapefile cannot be fetched or decoded (with an
/// empty collection); only malformed `image_bounds` reject. The response
/// carries `committed: false` when a newer load started before this one
/// finished.
#[wasm_bindgen]
pub async fn load_crowns(shp_url: String, image_bounds: JsValue) -> Result<JsValue, JsValue> {
    let bounds = bounds_from_js(image_bounds)?;
    let load = crown_loader::load_into_session(
        CrownSession::global(),
        &JsFetcher,
        &shp_url,
        &bounds,
        &ConsoleDiagnostics,
    )
    .await;
    to_js(&load)
}

#[wasm_bindgen]
pub fn current_crowns() -> Result<JsValue, JsValue> {
    let crowns = CrownSession::global().lock().crowns();
    to_js(&*crowns)
}

#[wasm_bindgen]
pub fn clear_crowns() -> bool {
    CrownSession::global().lock().clear();
    true
}

/// Project crowns into pixel space for the image's current displayed size.
/// Pass `undefined` for `crowns` to project the session's collection.
#[wasm_bindgen]
pub fn project_crowns(
    crowns: JsValue,
    image_bounds: JsValue,
    width: f64,
    height: f64,
) -> Result<JsValue, JsValue> {
    let crowns = crowns_from_js(crowns)?;
    let bounds = bounds_from_js(image_bounds)?;
    let projected = projector::project_crowns(&crowns, &bounds, ImageSize { width, height })
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&projected)
}

/// SVG `points` attribute for one pixel ring.
#[wasm_bindgen]
pub fn svg_points(ring: JsValue) -> Result<String, JsValue> {
    let ring: Vec<Point> = serde_wasm_bindgen::from_value(ring)?;
    Ok(projector::svg_points(&ring))
}

/// Keep the crowns whose species is among `selected`. `known_species` is the
/// config's species list used to validate attribute values.
#[wasm_bindgen]
pub fn filter_crowns_by_species(
    crowns: JsValue,
    selected: JsValue,
    known_species: JsValue,
) -> Result<JsValue, JsValue> {
    let crowns = crowns_from_js(crowns)?;
    let selected: Vec<String> = serde_wasm_bindgen::from_value(selected)?;
    let kept = species::filter_by_species(&crowns, &selected, &catalog_from_js(known_species)?);
    to_js(&kept)
}

/// Crown totals per species; `known_species` as for [`filter_crowns_by_species`].
#[wasm_bindgen]
pub fn species_counts(crowns: JsValue, known_species: JsValue) -> Result<JsValue, JsValue> {
    let crowns = crowns_from_js(crowns)?;
    to_js(&species::count_by_species(&crowns, &catalog_from_js(known_species)?))
}

#[derive(Serialize)]
struct ParsedConfig<'a> {
    config: &'a ViewerConfig,
    /// Lon/lat bounds, for display and debugging.
    bounds: GeographicBounds,
    /// Species id to `#rrggbb`
    colors: BTreeMap<String, String>,
}

#[wasm_bindgen]
pub fn parse_viewer_config(json: &str) -> Result<JsValue, JsValue> {
    let config = ViewerConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let bounds = config
        .image_bounds()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&ParsedConfig {
        config: &config,
        bounds,
        colors: config.species_colors(),
    })
}

#[wasm_bindgen]
pub fn attribute_path_for(shp_url: &str) -> String {
    crown_loader::attribute_path_for(shp_url)
}
