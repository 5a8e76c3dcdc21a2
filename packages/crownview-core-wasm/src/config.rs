// Viewer metadata document: species list, colour map, layer paths and image bounds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BoundsError, ConfigError};
use crate::models::GeographicBounds;
use crate::species::normalize_species;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub species: Vec<String>,
    #[serde(default)]
    pub color_map: BTreeMap<String, SpeciesColor>,
    /// Layer name to raster mask path
    #[serde(default)]
    pub layers: BTreeMap<String, String>,
    pub web_app_config: WebAppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebAppConfig {
    /// `[[minLat, minLon], [maxLat, maxLon]]`
    pub image_bounds: [[f64; 2]; 2],
    #[serde(default)]
    pub base_image: Option<String>,
    #[serde(default)]
    pub crown_shapefile: Option<String>,
}

/// Either `[r, g, b]` or a `"#rrggbb"` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeciesColor {
    Rgb([u8; 3]),
    Hex(String),
}

impl SpeciesColor {
    pub fn to_hex(&self) -> String {
        match self {
            SpeciesColor::Rgb([r, g, b]) => format!("#{:02x}{:02x}{:02x}", r, g, b),
            SpeciesColor::Hex(hex) => {
                let hex = hex.trim();
                if hex.starts_with('#') {
                    hex.to_lowercase()
                } else {
                    format!("#{}", hex.to_lowercase())
                }
            }
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.image_bounds()?;
        Ok(config)
    }

    /// Image bounds transposed into lon/lat order.
    pub fn image_bounds(&self) -> Result<GeographicBounds, BoundsError> {
        GeographicBounds::from_lat_lon_corners(self.web_app_config.image_bounds)
    }

    /// Hex colour for every listed species that has one in the colour map.
    pub fn species_colors(&self) -> BTreeMap<String, String> {
        self.species
            .iter()
            .filter_map(|species| Some((species.clone(), self.color_for(species)?)))
            .collect()
    }

    /// Display colour for a species id, matched after normalisation.
    pub fn color_for(&self, species: &str) -> Option<String> {
        let wanted = normalize_species(species);
        self.color_map
            .iter()
            .find(|(name, _)| normalize_species(name) == wanted)
            .map(|(_, color)| color.to_hex())
    }
}
