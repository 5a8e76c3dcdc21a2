use thiserror::Error;

/// Failure while decoding a shapefile or its dBASE table.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("invalid shapefile: {0}")]
    Geometry(String),

    #[error("invalid dBASE table: {0}")]
    Attributes(String),
}

impl From<shapefile::Error> for DecodeError {
    fn from(e: shapefile::Error) -> Self {
        DecodeError::Geometry(e.to_string())
    }
}

impl From<dbase::Error> for DecodeError {
    fn from(e: dbase::Error) -> Self {
        DecodeError::Attributes(e.to_string())
    }
}

/// Failure to obtain the bytes of a resource.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("request for {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("failed to decompress {url}: {reason}")]
    Decompress { url: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoundsError {
    #[error("bounds contain a non-finite value")]
    NonFinite,

    #[error("inverted bounds: min ({min}) is greater than max ({max})")]
    Inverted { min: f64, max: f64 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("bounds span zero {axis} degrees; cannot project into pixels")]
    DegenerateBounds { axis: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid viewer config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid image bounds: {0}")]
    Bounds(#[from] BoundsError),
}
