use eframe::egui;
use geo::Contains;
use geo_types::Point;

use crate::layer::{Layer, LayerId, VectorLayer};
use crate::map::View;
use crate::model::{self, Feature, FeatureId, Geometry, distance_to_line};

/// Lines stay grabbable even with a zero tolerance.
const STROKE_SLOP_PX: f64 = 2.0;

pub type PointRadiusFn = fn(&Feature) -> f64;

#[derive(Clone, Debug, Default)]
pub struct HitOptions {
    /// Only these layers are queried when set.
    pub layers: Option<Vec<LayerId>>,
    pub hit_tolerance: f64,
    /// Pixel radius used for point geometries instead of their marker radius.
    pub point_radius: Option<PointRadiusFn>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    pub layer: LayerId,
    pub feature: FeatureId,
}

/// Features under `pixel`, topmost first: later layers before earlier ones,
/// later-added features before earlier ones.
pub fn features_at_pixel(
    layers: &[Layer],
    view: &View,
    size: egui::Vec2,
    pixel: egui::Pos2,
    options: &HitOptions,
) -> Vec<Hit> {
    let mut hits = Vec::new();
    for layer in layers.iter().rev().filter_map(Layer::as_vector) {
        if let Some(filter) = &options.layers {
            if !filter.contains(&layer.id) {
                continue;
            }
        }
        for feature in layer.source.iter().rev() {
            if feature_hit(layer, feature, view, size, pixel, options) {
                hits.push(Hit {
                    layer: layer.id,
                    feature: feature.id(),
                });
            }
        }
    }
    hits
}

pub fn point_radius_px(layer: &VectorLayer, feature: &Feature, options: &HitOptions) -> f64 {
    match options.point_radius {
        Some(radius) => radius(feature),
        None => layer
            .styles_for(feature)
            .iter()
            .filter_map(|s| s.marker.map(|m| m.radius))
            .fold(0.0, f64::max),
    }
}

fn feature_hit(
    layer: &VectorLayer,
    feature: &Feature,
    view: &View,
    size: egui::Vec2,
    pixel: egui::Pos2,
    options: &HitOptions,
) -> bool {
    let res = view.resolution();
    let p = view.pixel_to_coordinate(pixel, size);
    let tolerance = options.hit_tolerance.max(0.0) * res;
    let slop = options.hit_tolerance.max(STROKE_SLOP_PX) * res;
    match &feature.geometry {
        Geometry::Point(point) => {
            let radius = point_radius_px(layer, feature, options) * res;
            model::distance(point.0, p) <= radius + tolerance
        }
        Geometry::LineString(line) => line.lines().any(|l| distance_to_line(p, l) <= slop),
        Geometry::Polygon(polygon) => {
            let near_edge = model::rings(polygon)
                .flat_map(|ring| ring.lines())
                .any(|l| distance_to_line(p, l) <= slop);
            near_edge || polygon.contains(&Point(p))
        }
        Geometry::Circle(circle) => model::distance(circle.center, p) <= circle.radius + tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{FeatureCollection, TileLayer};
    use crate::model::{Coordinate, Extent};
    use crate::tiles::OSM_URL_TEMPLATE;

    const SIZE: egui::Vec2 = egui::vec2(800.0, 600.0);

    fn layers_with(features: Vec<Feature>) -> Vec<Layer> {
        vec![
            Layer::Tile(TileLayer {
                id: LayerId(0),
                url_template: OSM_URL_TEMPLATE.to_string(),
            }),
            Layer::Vector(VectorLayer::new(
                LayerId(1),
                FeatureCollection::from_features(features).unwrap(),
            )),
        ]
    }

    fn pixel_of(view: &View, x: f64, y: f64) -> egui::Pos2 {
        view.coordinate_to_pixel(Coordinate::from((x, y)), SIZE)
    }

    #[test]
    fn overlapping_features_come_back_topmost_first() {
        let below = Feature::new(Geometry::from_extent(Extent::new(0.0, 0.0, 1e6, 1e6)));
        let above = Feature::new(Geometry::from_extent(Extent::new(0.0, 0.0, 5e5, 5e5)));
        let (below_id, above_id) = (below.id(), above.id());
        let layers = layers_with(vec![below, above]);
        let view = View::default();
        let hits = features_at_pixel(
            &layers,
            &view,
            SIZE,
            pixel_of(&view, 2e5, 2e5),
            &HitOptions::default(),
        );
        let ids: Vec<FeatureId> = hits.iter().map(|h| h.feature).collect();
        assert_eq!(ids, vec![above_id, below_id]);
    }

    #[test]
    fn empty_space_hits_nothing() {
        let layers = layers_with(vec![Feature::new(Geometry::from_extent(Extent::new(
            0.0, 0.0, 5e5, 5e5,
        )))]);
        let view = View::default();
        let hits = features_at_pixel(
            &layers,
            &view,
            SIZE,
            pixel_of(&view, 10_000_000.0, 10_000_000.0),
            &HitOptions::default(),
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn point_hit_uses_marker_radius_in_pixels() {
        let point = Feature::new(Geometry::point([0.0, 0.0])).with_property("radius", 30);
        let layers = layers_with(vec![point]);
        let view = View::default();
        let near = egui::pos2(400.0 + 25.0, 300.0);
        let far = egui::pos2(400.0 + 35.0, 300.0);
        let opts = HitOptions::default();
        assert_eq!(features_at_pixel(&layers, &view, SIZE, near, &opts).len(), 1);
        assert!(features_at_pixel(&layers, &view, SIZE, far, &opts).is_empty());
    }

    fn forty_px(_: &Feature) -> f64 {
        40.0
    }

    #[test]
    fn point_radius_override_wins() {
        let point = Feature::new(Geometry::point([0.0, 0.0]));
        let layers = layers_with(vec![point]);
        let view = View::default();
        let opts = HitOptions {
            point_radius: Some(forty_px as PointRadiusFn),
            ..HitOptions::default()
        };
        let pixel = egui::pos2(400.0 + 35.0, 300.0);
        assert_eq!(features_at_pixel(&layers, &view, SIZE, pixel, &opts).len(), 1);
    }

    #[test]
    fn layer_filter_excludes_other_layers() {
        let layers = layers_with(vec![Feature::new(Geometry::circle([0.0, 0.0], 1e6))]);
        let view = View::default();
        let opts = HitOptions {
            layers: Some(vec![LayerId(7)]),
            ..HitOptions::default()
        };
        let center = egui::pos2(400.0, 300.0);
        assert!(features_at_pixel(&layers, &view, SIZE, center, &opts).is_empty());
    }

    #[test]
    fn polygon_hole_is_not_part_of_the_polygon() {
        let ring = |min: f64, max: f64| vec![[min, min], [min, max], [max, max], [max, min]];
        let donut = Feature::new(Geometry::polygon([ring(-2e6, 2e6), ring(-1e6, 1e6)]));
        let layers = layers_with(vec![donut]);
        let view = View::default();
        let opts = HitOptions::default();
        let in_hole = pixel_of(&view, 0.0, 0.0);
        let in_body = pixel_of(&view, 1.5e6, 0.0);
        assert!(features_at_pixel(&layers, &view, SIZE, in_hole, &opts).is_empty());
        assert_eq!(features_at_pixel(&layers, &view, SIZE, in_body, &opts).len(), 1);
    }

    #[test]
    fn line_is_hit_near_its_segments_only() {
        let line = Feature::new(Geometry::line_string([[0.0, 0.0], [2e6, 0.0]]));
        let layers = layers_with(vec![line]);
        let view = View::default();
        let opts = HitOptions {
            hit_tolerance: 3.0,
            ..HitOptions::default()
        };
        let on = pixel_of(&view, 1e6, 0.0) + egui::vec2(0.0, 2.0);
        let off = pixel_of(&view, 1e6, 0.0) + egui::vec2(0.0, 10.0);
        assert_eq!(features_at_pixel(&layers, &view, SIZE, on, &opts).len(), 1);
        assert!(features_at_pixel(&layers, &view, SIZE, off, &opts).is_empty());
    }
}
