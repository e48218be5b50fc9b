use crate::error::MapError;
use crate::model::{Feature, FeatureId};
use crate::style::{self, StyleDescriptor, StyleFn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(pub u32);

/// Insertion-ordered set of features keyed by identity.
#[derive(Debug, Default)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Result<Self, MapError> {
        let mut collection = Self::new();
        for feature in features {
            collection.add(feature)?;
        }
        Ok(collection)
    }

    pub fn add(&mut self, feature: Feature) -> Result<(), MapError> {
        if self.contains(feature.id()) {
            return Err(MapError::DuplicateFeature(feature.id()));
        }
        self.features.push(feature);
        Ok(())
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.iter().any(|f| f.id() == id)
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id() == id)
    }

    pub fn get_mut(&mut self, id: FeatureId) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

#[derive(Debug)]
pub struct VectorLayer {
    pub id: LayerId,
    pub source: FeatureCollection,
    pub style: Option<StyleFn>,
}

impl VectorLayer {
    pub fn new(id: LayerId, source: FeatureCollection) -> Self {
        Self {
            id,
            source,
            style: None,
        }
    }

    pub fn with_style(mut self, style: StyleFn) -> Self {
        self.style = Some(style);
        self
    }

    /// Styles for a feature of this layer, falling back to the default resolver.
    pub fn styles_for(&self, feature: &Feature) -> Vec<StyleDescriptor> {
        self.style.unwrap_or(style::resolve)(feature)
    }
}

/// Raster basemap fetched from an XYZ tile server.
#[derive(Clone, Debug)]
pub struct TileLayer {
    pub id: LayerId,
    pub url_template: String,
}

#[derive(Debug)]
pub enum Layer {
    Tile(TileLayer),
    Vector(VectorLayer),
}

impl Layer {
    pub fn id(&self) -> LayerId {
        match self {
            Layer::Tile(l) => l.id,
            Layer::Vector(l) => l.id,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorLayer> {
        match self {
            Layer::Vector(l) => Some(l),
            Layer::Tile(_) => None,
        }
    }

    pub fn as_tile(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tile(l) => Some(l),
            Layer::Vector(_) => None,
        }
    }

    pub fn as_vector_mut(&mut self) -> Option<&mut VectorLayer> {
        match self {
            Layer::Vector(l) => Some(l),
            Layer::Tile(_) => None,
        }
    }
}

pub fn vector_layer_mut(layers: &mut [Layer], id: LayerId) -> Result<&mut VectorLayer, MapError> {
    layers
        .iter_mut()
        .find(|l| l.id() == id)
        .and_then(Layer::as_vector_mut)
        .ok_or(MapError::UnknownLayer(id))
}

pub fn find_feature_mut(
    layers: &mut [Layer],
    layer: LayerId,
    feature: FeatureId,
) -> Option<&mut Feature> {
    vector_layer_mut(layers, layer).ok()?.source.get_mut(feature)
}
