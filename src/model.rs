use geo::{BoundingRect, Closest, ClosestPoint, Rotate, Scale, Translate};
use geo_types::{Coord, Line, LineString, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// A projected map coordinate (EPSG:3857 metres).
pub type Coordinate = Coord<f64>;

pub const ORIGIN: Coordinate = Coordinate { x: 0.0, y: 0.0 };

/// Straight-line distance in map units.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let d = a - b;
    d.x.hypot(d.y)
}

/// Distance from `p` to the closest point of `line`.
pub fn distance_to_line(p: Coordinate, line: Line<f64>) -> f64 {
    distance(p, closest_on_line(p, line))
}

pub fn closest_on_line(p: Coordinate, line: Line<f64>) -> Coordinate {
    match line.closest_point(&Point(p)) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => q.0,
        Closest::Indeterminate => line.start,
    }
}

/// `c` turned by `angle` radians counter-clockwise about `anchor`.
pub fn rotate_coordinate(c: Coordinate, angle: f64, anchor: Coordinate) -> Coordinate {
    Point(c)
        .rotate_around_point(angle.to_degrees(), Point(anchor))
        .0
}

/// Exterior ring first, then the holes.
pub fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

/// Axis-aligned bounding box. An empty extent has `min > max`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub const EMPTY: Extent = Extent {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::from((
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        ))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn buffer(&self, amount: f64) -> Extent {
        Extent::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

impl From<Rect<f64>> for Extent {
    fn from(rect: Rect<f64>) -> Self {
        Extent::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Coordinate,
    pub radius: f64,
}

/// Feature geometry. Polygon rings are always closed, exterior first.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
    Circle(Circle),
}

impl Geometry {
    pub fn point(c: impl Into<Coordinate>) -> Self {
        Geometry::Point(Point(c.into()))
    }

    pub fn line_string<C: Into<Coordinate>>(coords: impl IntoIterator<Item = C>) -> Self {
        Geometry::LineString(coords.into_iter().collect())
    }

    /// First ring is the exterior. Open rings are closed.
    pub fn polygon<C: Into<Coordinate>>(rings: impl IntoIterator<Item = Vec<C>>) -> Self {
        let mut rings = rings
            .into_iter()
            .map(|ring| ring.into_iter().collect::<LineString<f64>>());
        let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
        Geometry::Polygon(Polygon::new(exterior, rings.collect()))
    }

    pub fn circle(center: impl Into<Coordinate>, radius: f64) -> Self {
        Geometry::Circle(Circle {
            center: center.into(),
            radius,
        })
    }

    /// Rectangular polygon covering `extent`, starting at its south-west corner.
    pub fn from_extent(extent: Extent) -> Self {
        Geometry::polygon([vec![
            [extent.min_x, extent.min_y],
            [extent.min_x, extent.max_y],
            [extent.max_x, extent.max_y],
            [extent.max_x, extent.min_y],
        ]])
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::Circle(_) => "Circle",
        }
    }

    pub fn extent(&self) -> Extent {
        match self {
            Geometry::Point(p) => p.bounding_rect().into(),
            Geometry::LineString(line) => line.bounding_rect().map_or(Extent::EMPTY, Extent::from),
            Geometry::Polygon(polygon) => {
                polygon.bounding_rect().map_or(Extent::EMPTY, Extent::from)
            }
            Geometry::Circle(c) => Extent::from(Point(c.center).bounding_rect()).buffer(c.radius),
        }
    }

    /// Extent measured in a frame rotated by `angle` about the origin.
    pub fn rotated_extent(&self, angle: f64) -> Extent {
        if angle == 0.0 {
            return self.extent();
        }
        let mut local = self.clone();
        local.rotate(-angle, ORIGIN);
        local.extent()
    }

    pub fn vertices(&self) -> Box<dyn Iterator<Item = Coordinate> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(p.0)),
            Geometry::LineString(line) => Box::new(line.coords().copied()),
            Geometry::Polygon(polygon) => {
                Box::new(rings(polygon).flat_map(|ring| ring.coords().copied()))
            }
            Geometry::Circle(c) => Box::new(std::iter::once(c.center)),
        }
    }

    /// Coordinates flattened to `[x0, y0, x1, y1, ...]`, as stored.
    pub fn flat_coordinates(&self) -> Vec<f64> {
        self.vertices().flat_map(|c| [c.x, c.y]).collect()
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Geometry::Point(p) => p.translate_mut(dx, dy),
            Geometry::LineString(line) => line.translate_mut(dx, dy),
            Geometry::Polygon(polygon) => polygon.translate_mut(dx, dy),
            Geometry::Circle(c) => c.center = Point(c.center).translate(dx, dy).0,
        }
    }

    pub fn scale(&mut self, sx: f64, sy: f64, anchor: Coordinate) {
        match self {
            Geometry::Point(p) => p.scale_around_point_mut(sx, sy, anchor),
            Geometry::LineString(line) => line.scale_around_point_mut(sx, sy, anchor),
            Geometry::Polygon(polygon) => polygon.scale_around_point_mut(sx, sy, anchor),
            Geometry::Circle(c) => {
                c.center = Point(c.center).scale_around_point(sx, sy, anchor).0;
                c.radius *= (sx.abs() + sy.abs()) * 0.5;
            }
        }
    }

    /// Turns the geometry by `angle` radians counter-clockwise about `anchor`.
    pub fn rotate(&mut self, angle: f64, anchor: Coordinate) {
        let degrees = angle.to_degrees();
        match self {
            Geometry::Point(p) => p.rotate_around_point_mut(degrees, Point(anchor)),
            Geometry::LineString(line) => line.rotate_around_point_mut(degrees, Point(anchor)),
            Geometry::Polygon(polygon) => {
                polygon.rotate_around_point_mut(degrees, Point(anchor));
            }
            Geometry::Circle(c) => c.center = rotate_coordinate(c.center, angle, anchor),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(u64);

impl FeatureId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        FeatureId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A geometry plus named properties. Identity is the `id`, never the contents.
#[derive(Debug)]
pub struct Feature {
    id: FeatureId,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: FeatureId::next(),
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.properties.insert(key.to_string(), Value::Number(n));
        }
    }
}

#[cfg(test)]
impl Feature {
    pub(crate) fn clone_with_same_id(&self) -> Feature {
        Feature {
            id: self.id,
            geometry: self.geometry.clone(),
            properties: self.properties.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    fn seeded_ring() -> Vec<[f64; 2]> {
        vec![
            [34243.0, 6305749.0],
            [-288626.0, 5757848.0],
            [210354.0, 5576845.0],
            [300000.0, 6000000.0],
            [34243.0, 6305749.0],
        ]
    }

    #[test]
    fn polygon_reads_back_the_coordinates_it_was_built_from() {
        let ring = seeded_ring();
        let geometry = Geometry::polygon([ring.clone()]);
        let flat: Vec<f64> = ring.iter().flat_map(|c| *c).collect();
        assert_eq!(geometry.flat_coordinates(), flat);
    }

    #[test]
    fn open_ring_is_closed_on_construction() {
        let mut open = seeded_ring();
        open.pop();
        assert_eq!(
            Geometry::polygon([open]).flat_coordinates(),
            Geometry::polygon([seeded_ring()]).flat_coordinates()
        );
    }

    #[test]
    fn extent_center_of_seeded_ring() {
        let geometry = Geometry::polygon([seeded_ring()]);
        let center = geometry.extent().center();
        assert!(approx_eq!(f64, center.x, 5687.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, center.y, 5941297.0, epsilon = 1e-9));
    }

    #[test]
    fn from_extent_builds_a_closed_ring() {
        let geometry = Geometry::from_extent(Extent::new(0.0, 0.0, 500000.0, 500000.0));
        let Geometry::Polygon(polygon) = &geometry else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.exterior().is_closed());
        assert_eq!(polygon.exterior().0[0], ORIGIN);
        assert_eq!(geometry.extent(), Extent::new(0.0, 0.0, 500000.0, 500000.0));
    }

    #[test]
    fn circle_extent_includes_radius() {
        let extent = Geometry::circle([10.0, 20.0], 5.0).extent();
        assert_eq!(extent, Extent::new(5.0, 15.0, 15.0, 25.0));
    }

    #[test]
    fn empty_line_has_an_empty_extent() {
        let line = Geometry::line_string(Vec::<[f64; 2]>::new());
        assert!(line.extent().is_empty());
    }

    #[test]
    fn rotate_quarter_turn_about_anchor() {
        let mut g = Geometry::point([2.0, 1.0]);
        g.rotate(std::f64::consts::FRAC_PI_2, Coordinate::from((1.0, 1.0)));
        let Geometry::Point(p) = g else {
            panic!("expected point");
        };
        assert!(approx_eq!(f64, p.x(), 1.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, p.y(), 2.0, epsilon = 1e-9));
    }

    #[test]
    fn scale_keeps_anchor_fixed() {
        let mut g = Geometry::from_extent(Extent::new(0.0, 0.0, 10.0, 10.0));
        g.scale(2.0, 0.5, ORIGIN);
        assert_eq!(g.extent(), Extent::new(0.0, 0.0, 20.0, 5.0));
    }

    #[test]
    fn circle_scales_its_radius_and_moves_its_center() {
        let mut g = Geometry::circle([10.0, 0.0], 4.0);
        g.scale(2.0, 2.0, ORIGIN);
        g.translate(1.0, 1.0);
        assert_eq!(
            g,
            Geometry::Circle(Circle {
                center: Coordinate::from((21.0, 1.0)),
                radius: 8.0,
            })
        );
    }

    #[test]
    fn closest_point_is_clamped_to_the_segment() {
        let line = Line::new(ORIGIN, Coordinate::from((10.0, 0.0)));
        let closest = closest_on_line(Coordinate::from((4.0, 3.0)), line);
        assert!(distance(closest, Coordinate::from((4.0, 0.0))) < 1e-12);
        assert!(approx_eq!(
            f64,
            distance_to_line(Coordinate::from((13.0, 4.0)), line),
            5.0,
            epsilon = 1e-12
        ));
    }

    #[test]
    fn feature_ids_are_unique() {
        let a = Feature::new(Geometry::point([0.0, 0.0]));
        let b = Feature::new(Geometry::point([0.0, 0.0]));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn numeric_properties_are_read_back() {
        let f = Feature::new(Geometry::point([0.0, 0.0]))
            .with_property("radius", 20)
            .with_property("label", "x");
        assert_eq!(f.number("radius"), Some(20.0));
        assert_eq!(f.number("label"), None);
        assert_eq!(f.number("missing"), None);
    }

    proptest! {
        #[test]
        fn line_string_round_trips(
            coords in prop::collection::vec((-2.0e7f64..2.0e7, -2.0e7f64..2.0e7), 0..32)
        ) {
            let geometry = Geometry::line_string(coords.iter().map(|&(x, y)| [x, y]));
            let Geometry::LineString(line) = &geometry else {
                panic!("expected line string");
            };
            let back: Vec<(f64, f64)> = line.coords().map(|c| (c.x, c.y)).collect();
            prop_assert_eq!(back, coords);
        }
    }
}
