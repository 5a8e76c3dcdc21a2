use flate2::read::GzDecoder;
use js_sys::Uint8Array;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::bbox_clip::clip_features;
use crate::console::Diagnostics;
use crate::decoder::decode_features;
use crate::error::FetchError;
use crate::fetch;
use crate::models::{CrownPolygon, GeographicBounds};
use crate::session::CrownSession;

const ATTRIBUTE_EXTENSION: &str = "dbf";
const GZIP_SUFFIX: &str = ".gz";

/// Source of raw resource bytes (the browser fetch bridge in production).
#[allow(async_fn_in_trait)]
pub trait ResourceFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches through the `wasmJsHelpers.fetch` bridge, which resolves to an
/// `ArrayBuffer` and rejects on a failed response.
pub struct JsFetcher;

impl ResourceFetcher for JsFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let promise = fetch(url).map_err(|e| request_error(url, &e))?;
        let buffer = JsFuture::from(promise)
            .await
            .map_err(|e| request_error(url, &e))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

fn request_error(url: &str, err: &JsValue) -> FetchError {
    FetchError::Request {
        url: url.to_string(),
        reason: err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub features_decoded: usize,
    pub crowns_kept: usize,
    pub attributes_loaded: bool,
    pub geometry_failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrownLoad {
    pub crowns: Vec<CrownPolygon>,
    pub summary: LoadSummary,
}

impl CrownLoad {
    fn failed() -> Self {
        CrownLoad {
            crowns: Vec::new(),
            summary: LoadSummary {
                geometry_failed: true,
                ..LoadSummary::default()
            },
        }
    }
}

/// Attribute table location for a shapefile URL: same base name, `.dbf`
/// extension. Query string, fragment and a trailing `.gz` are kept.
pub fn attribute_path_for(shp_url: &str) -> String {
    let split_at = shp_url.find(|c: char| c == '?' || c == '#').unwrap_or(shp_url.len());
    let (path, suffix) = shp_url.split_at(split_at);

    let (path, gz) = match path.strip_suffix(GZIP_SUFFIX) {
        Some(stripped) => (stripped, GZIP_SUFFIX),
        None => (path, ""),
    };

    let segment_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (base, extension) = match path[segment_start..].rfind('.') {
        Some(dot) => (&path[..segment_start + dot], &path[segment_start + dot + 1..]),
        None => (path, ""),
    };

    let uppercase = !extension.is_empty() && extension.chars().all(|c| c.is_ascii_uppercase());
    let new_extension = if uppercase {
        ATTRIBUTE_EXTENSION.to_ascii_uppercase()
    } else {
        ATTRIBUTE_EXTENSION.to_string()
    };

    format!("{}.{}{}{}", base, new_extension, gz, suffix)
}

fn is_gzipped(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1F && data[1] == 0x8B
}

// Decompress gzip-encoded payloads; anything else passes through untouched.
fn decompress_gzip(url: &str, data: Vec<u8>) -> Result<Vec<u8>, FetchError> {
    if !is_gzipped(&data) {
        return Ok(data);
    }

    let mut decoder = GzDecoder::new(&data[..]);
    let mut decompressed_data = Vec::new();
    decoder
        .read_to_end(&mut decompressed_data)
        .map_err(|e| FetchError::Decompress {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(decompressed_data)
}

async fn fetch_resource<F: ResourceFetcher>(fetcher: &F, url: &str) -> Result<Vec<u8>, FetchError> {
    let data = fetcher.fetch_bytes(url).await?;
    decompress_gzip(url, data)
}

/// Load, decode and clip the crowns of one dataset.
///
/// Never fails: an unreachable or corrupt shapefile yields an empty load with
/// `geometry_failed` set, and an unusable attribute table yields crowns with
/// empty properties. Problems are reported through `diagnostics`.
pub async fn load_crowns<F: ResourceFetcher>(
    fetcher: &F,
    shp_url: &str,
    bounds: &GeographicBounds,
    diagnostics: &dyn Diagnostics,
) -> CrownLoad {
    let dbf_url = attribute_path_for(shp_url);
    diagnostics.info(&format!("Loading crowns from {} (attributes: {})", shp_url, dbf_url));

    let (geometry, attributes) = futures::join!(
        fetch_resource(fetcher, shp_url),
        fetch_resource(fetcher, &dbf_url)
    );

    let geometry = match geometry {
        Ok(bytes) => bytes,
        Err(e) => {
            diagnostics.warn(&format!("Crown outlines unavailable: {}", e));
            return CrownLoad::failed();
        }
    };

    let attributes = match attributes {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            diagnostics.warn(&format!(
                "Crown attributes unavailable, loading geometry only: {}",
                e
            ));
            None
        }
    };

    let features = match decode_features(&geometry, attributes.as_deref(), diagnostics) {
        Ok(features) => features,
        Err(e) => {
            diagnostics.warn(&format!("Failed to decode {}: {}", shp_url, e));
            return CrownLoad::failed();
        }
    };

    let features_decoded = features.len();
    let attributes_loaded =
        attributes.is_some() && features.iter().any(|f| !f.attributes.is_empty());
    let crowns = clip_features(features, bounds);

    diagnostics.info(&format!(
        "Kept {} of {} crown polygons inside the image bounds",
        crowns.len(),
        features_decoded
    ));

    CrownLoad {
        summary: LoadSummary {
            features_decoded,
            crowns_kept: crowns.len(),
            attributes_loaded,
            geometry_failed: false,
        },
        crowns,
    }
}

/// [`load_crowns`] without the summary.
pub async fn load_crown_polygons<F: ResourceFetcher>(
    fetcher: &F,
    shp_url: &str,
    bounds: &GeographicBounds,
    diagnostics: &dyn Diagnostics,
) -> Vec<CrownPolygon> {
    load_crowns(fetcher, shp_url, bounds, diagnostics).await.crowns
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLoad {
    pub crowns: Vec<CrownPolygon>,
    pub summary: LoadSummary,
    /// False when a newer load started before this one finished.
    pub committed: bool,
}

/// Run [`load_crowns`] and publish the result as the session's collection,
/// unless a newer load started while this one was in flight. A failed load
/// commits an empty collection.
pub async fn load_into_session<F: ResourceFetcher>(
    session: &Mutex<CrownSession>,
    fetcher: &F,
    shp_url: &str,
    bounds: &GeographicBounds,
    diagnostics: &dyn Diagnostics,
) -> SessionLoad {
    let generation = session.lock().begin_load();
    let load = load_crowns(fetcher, shp_url, bounds, diagnostics).await;

    let committed = session.lock().commit(generation, load.crowns.clone());
    if !committed {
        diagnostics.info(&format!(
            "Discarding crowns from {}: a newer load has started",
            shp_url
        ));
    }

    SessionLoad {
        crowns: load.crowns,
        summary: load.summary,
        committed,
    }
}
