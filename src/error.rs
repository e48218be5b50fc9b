use thiserror::Error;

use crate::layer::LayerId;
use crate::model::FeatureId;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("feature {0} is already in the collection")]
    DuplicateFeature(FeatureId),

    #[error("no layer with id {0:?}")]
    UnknownLayer(LayerId),

    #[error("failed to access settings file {path}")]
    SettingsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML settings: {0}")]
    SettingsToml(#[from] toml::de::Error),

    #[error("failed to encode TOML settings: {0}")]
    SettingsTomlEncode(#[from] toml::ser::Error),

    #[error("invalid JSON settings: {0}")]
    SettingsJson(#[from] serde_json::Error),

    #[error("tile request for {url} failed: {source}")]
    TileFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("tile server answered {status} for {url}")]
    TileStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode tile image: {0}")]
    TileDecode(#[from] image::ImageError),
}
