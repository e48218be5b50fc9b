use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::layer::{FeatureCollection, LayerId, VectorLayer};
use crate::model::{Extent, Feature, Geometry};
use crate::style;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeedVariant {
    /// A single square built from an extent.
    Extent,
    /// One of each geometry kind.
    #[default]
    Showcase,
}

pub const SEED_RING: [[f64; 2]; 4] = [
    [34243.0, 6305749.0],
    [-288626.0, 5757848.0],
    [210354.0, 5576845.0],
    [300000.0, 6000000.0],
];

pub const SEED_SQUARE: Extent = Extent::new(0.0, 0.0, 500000.0, 500000.0);

// All coordinates are EPSG:3857 metres already.
pub fn seed_features(variant: SeedVariant) -> Vec<Feature> {
    let square = Feature::new(Geometry::from_extent(SEED_SQUARE));
    match variant {
        SeedVariant::Extent => vec![square],
        SeedVariant::Showcase => {
            let mut ring = SEED_RING.to_vec();
            ring.push(SEED_RING[0]);
            vec![
                Feature::new(Geometry::polygon([ring])),
                square,
                Feature::new(Geometry::line_string([
                    [-2_500_000.0, 2_000_000.0],
                    [-1_500_000.0, 3_200_000.0],
                    [-600_000.0, 2_400_000.0],
                ])),
                Feature::new(Geometry::point([-1_800_000.0, 5_200_000.0]))
                    .with_property("radius", 20)
                    .with_property("angle", std::f64::consts::FRAC_PI_4),
                Feature::new(Geometry::circle([2_200_000.0, 4_200_000.0], 600_000.0)),
            ]
        }
    }
}

pub fn bootstrap_layer(id: LayerId, variant: SeedVariant) -> Result<VectorLayer, MapError> {
    let source = FeatureCollection::from_features(seed_features(variant))?;
    log::debug!("seeded {} features ({variant:?})", source.len());
    Ok(VectorLayer::new(id, source).with_style(style::resolve))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_variant_is_a_single_square() {
        let features = seed_features(SeedVariant::Extent);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].geometry.extent(), SEED_SQUARE);
    }

    #[test]
    fn showcase_has_every_geometry_kind() {
        let kinds: Vec<&str> = seed_features(SeedVariant::Showcase)
            .iter()
            .map(|f| f.geometry.type_name())
            .collect();
        for kind in ["Polygon", "LineString", "Point", "Circle"] {
            assert!(kinds.contains(&kind), "missing {kind}");
        }
    }

    #[test]
    fn seeded_ring_is_used_verbatim() {
        let features = seed_features(SeedVariant::Showcase);
        let flat = features[0].geometry.flat_coordinates();
        let expected: Vec<f64> = SEED_RING
            .iter()
            .chain(std::iter::once(&SEED_RING[0]))
            .flatten()
            .copied()
            .collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn bootstrapped_layer_has_style_and_features() {
        let layer = bootstrap_layer(LayerId(1), SeedVariant::Showcase).unwrap();
        assert_eq!(layer.source.len(), 5);
        assert!(layer.style.is_some());
    }
}
