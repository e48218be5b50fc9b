use eframe::egui;
use geo_types::{LineString, Polygon};

use super::{Condition, Interaction, MapContext, Propagation};
use crate::layer::{Layer, LayerId, find_feature_mut};
use crate::map::{MapEvent, View};
use crate::model::{self, Coordinate, Feature, FeatureId, Geometry, closest_on_line};
use crate::style::{Rgba, StrokeStyle};

/// Look of the vertex handle, distinct from the feature style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexStyle {
    pub radius: f32,
    pub fill: Rgba,
    pub stroke: StrokeStyle,
}

impl Default for VertexStyle {
    fn default() -> Self {
        Self {
            radius: 6.0,
            fill: Rgba::new(0, 153, 255, 255),
            stroke: StrokeStyle {
                color: Rgba::new(255, 255, 255, 255),
                width: 2.0,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModifyConfig {
    pub layer: LayerId,
    /// Checked on press before a vertex is inserted on a segment.
    pub insert_vertex_condition: Condition,
    pub pixel_tolerance: f64,
    pub vertex_style: VertexStyle,
}

impl ModifyConfig {
    pub fn for_layer(layer: LayerId) -> Self {
        Self {
            layer,
            insert_vertex_condition: Condition::Always,
            pixel_tolerance: 10.0,
            vertex_style: VertexStyle::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VertexRef {
    Point,
    Line(usize),
    Ring { ring: usize, index: usize },
    CircleCenter,
    CircleRim,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Candidate {
    Vertex(VertexRef, Coordinate),
    /// A new vertex would land at `index`.
    Segment(VertexRef, Coordinate),
}

impl Candidate {
    fn coordinate(&self) -> Coordinate {
        match *self {
            Candidate::Vertex(_, c) | Candidate::Segment(_, c) => c,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    feature: FeatureId,
    vertex: VertexRef,
}

/// Drag vertices of features in one layer, and insert new ones on segments.
pub struct ModifyInteraction {
    config: ModifyConfig,
    drag: Option<Drag>,
    hover: Option<Coordinate>,
}

impl ModifyInteraction {
    pub fn new(config: ModifyConfig) -> Self {
        Self {
            config,
            drag: None,
            hover: None,
        }
    }

    fn candidate_at(
        &self,
        layers: &[Layer],
        view: &View,
        size: egui::Vec2,
        pixel: egui::Pos2,
    ) -> Option<(FeatureId, Candidate)> {
        let layer = layers
            .iter()
            .filter_map(Layer::as_vector)
            .find(|l| l.id == self.config.layer)?;
        let p = view.pixel_to_coordinate(pixel, size);
        let tolerance = self.config.pixel_tolerance * view.resolution();
        layer
            .source
            .iter()
            .rev()
            .find_map(|f| candidate_for(f, p, tolerance).map(|c| (f.id(), c)))
    }
}

fn candidate_for(feature: &Feature, p: Coordinate, tolerance: f64) -> Option<Candidate> {
    match &feature.geometry {
        Geometry::Point(point) => (model::distance(point.0, p) <= tolerance)
            .then_some(Candidate::Vertex(VertexRef::Point, point.0)),
        Geometry::LineString(line) => {
            if let Some((i, c)) = nearest_vertex(&line.0, p, tolerance) {
                return Some(Candidate::Vertex(VertexRef::Line(i), c));
            }
            nearest_on_segment(line, p, tolerance)
                .map(|(i, c)| Candidate::Segment(VertexRef::Line(i + 1), c))
        }
        Geometry::Polygon(polygon) => {
            for (ring, coords) in model::rings(polygon).enumerate() {
                if let Some((index, c)) = nearest_vertex(&coords.0, p, tolerance) {
                    return Some(Candidate::Vertex(VertexRef::Ring { ring, index }, c));
                }
            }
            model::rings(polygon)
                .enumerate()
                .filter_map(|(ring, coords)| {
                    nearest_on_segment(coords, p, tolerance).map(|(i, c)| (ring, i, c))
                })
                .min_by(|a, b| model::distance(a.2, p).total_cmp(&model::distance(b.2, p)))
                .map(|(ring, i, c)| {
                    Candidate::Segment(VertexRef::Ring { ring, index: i + 1 }, c)
                })
        }
        Geometry::Circle(circle) => {
            let d = model::distance(circle.center, p);
            if d <= tolerance {
                Some(Candidate::Vertex(VertexRef::CircleCenter, circle.center))
            } else if (d - circle.radius).abs() <= tolerance {
                let rim = circle.center + (p - circle.center) * (circle.radius / d);
                Some(Candidate::Vertex(VertexRef::CircleRim, rim))
            } else {
                None
            }
        }
    }
}

fn nearest_vertex(
    coords: &[Coordinate],
    p: Coordinate,
    tolerance: f64,
) -> Option<(usize, Coordinate)> {
    coords
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, c)| model::distance(*c, p) <= tolerance)
        .min_by(|a, b| model::distance(a.1, p).total_cmp(&model::distance(b.1, p)))
}

/// Closest point on any segment of `line` within `tolerance`, with the segment index.
fn nearest_on_segment(
    line: &LineString<f64>,
    p: Coordinate,
    tolerance: f64,
) -> Option<(usize, Coordinate)> {
    line.lines()
        .map(|segment| closest_on_line(p, segment))
        .enumerate()
        .filter(|(_, c)| model::distance(*c, p) <= tolerance)
        .min_by(|a, b| model::distance(a.1, p).total_cmp(&model::distance(b.1, p)))
}

/// Runs `f` on ring `ring` of `polygon`, exterior first. Rings stay closed.
fn with_ring<R>(
    polygon: &mut Polygon<f64>,
    ring: usize,
    f: impl FnOnce(&mut LineString<f64>) -> R,
) -> Option<R> {
    if ring == 0 {
        let mut out = None;
        polygon.exterior_mut(|exterior| out = Some(f(exterior)));
        return out;
    }
    if ring > polygon.interiors().len() {
        return None;
    }
    let mut out = None;
    polygon.interiors_mut(|interiors| out = Some(f(&mut interiors[ring - 1])));
    out
}

fn insert_vertex(geometry: &mut Geometry, at: VertexRef, c: Coordinate) -> bool {
    match (geometry, at) {
        (Geometry::LineString(line), VertexRef::Line(i)) if i <= line.0.len() => {
            line.0.insert(i, c);
            true
        }
        (Geometry::Polygon(polygon), VertexRef::Ring { ring, index }) => {
            with_ring(polygon, ring, |coords| {
                // The closing coordinate stays last.
                if index == 0 || index >= coords.0.len() {
                    return false;
                }
                coords.0.insert(index, c);
                true
            })
            .unwrap_or(false)
        }
        _ => false,
    }
}

fn move_vertex(geometry: &mut Geometry, vertex: VertexRef, c: Coordinate) {
    match (geometry, vertex) {
        (Geometry::Point(point), VertexRef::Point) => point.0 = c,
        (Geometry::LineString(line), VertexRef::Line(i)) => {
            if let Some(v) = line.0.get_mut(i) {
                *v = c;
            }
        }
        (Geometry::Polygon(polygon), VertexRef::Ring { ring, index }) => {
            with_ring(polygon, ring, |coords| {
                let last = coords.0.len().saturating_sub(1);
                if let Some(v) = coords.0.get_mut(index) {
                    *v = c;
                }
                // First and last coordinate of a closed ring move together.
                if !coords.0.is_empty() && (index == 0 || index == last) {
                    coords.0[0] = c;
                    coords.0[last] = c;
                }
            });
        }
        (Geometry::Circle(circle), VertexRef::CircleCenter) => circle.center = c,
        (Geometry::Circle(circle), VertexRef::CircleRim) => {
            circle.radius = model::distance(circle.center, c);
        }
        _ => {}
    }
}

impl Interaction for ModifyInteraction {
    fn name(&self) -> &'static str {
        "modify"
    }

    fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    fn offers_handle(
        &self,
        pixel: egui::Pos2,
        modifiers: egui::Modifiers,
        ctx: &MapContext<'_>,
    ) -> bool {
        match self.candidate_at(&*ctx.layers, ctx.view, ctx.size, pixel) {
            Some((_, Candidate::Vertex(..))) => true,
            Some((_, Candidate::Segment(..))) => {
                self.config.insert_vertex_condition.holds(modifiers)
            }
            None => false,
        }
    }

    fn handle_event(&mut self, event: &MapEvent, ctx: &mut MapContext<'_>) -> Propagation {
        match *event {
            MapEvent::PointerDown { pixel, modifiers } => {
                let Some((feature, candidate)) =
                    self.candidate_at(&*ctx.layers, ctx.view, ctx.size, pixel)
                else {
                    return Propagation::Continue;
                };
                let vertex = match candidate {
                    Candidate::Vertex(vertex, _) => vertex,
                    Candidate::Segment(at, c) => {
                        if !self.config.insert_vertex_condition.holds(modifiers) {
                            return Propagation::Continue;
                        }
                        let Some(f) = find_feature_mut(ctx.layers, self.config.layer, feature)
                        else {
                            return Propagation::Continue;
                        };
                        if !insert_vertex(&mut f.geometry, at, c) {
                            return Propagation::Continue;
                        }
                        log::debug!("inserted vertex {at:?} into feature {feature}");
                        at
                    }
                };
                self.drag = Some(Drag { feature, vertex });
                self.hover = Some(candidate.coordinate());
                Propagation::Stop
            }
            MapEvent::PointerMove { pixel, .. } | MapEvent::PointerUp { pixel, .. } => {
                let Some(drag) = self.drag else {
                    if matches!(event, MapEvent::PointerMove { .. }) {
                        self.hover = self
                            .candidate_at(&*ctx.layers, ctx.view, ctx.size, pixel)
                            .filter(|(_, c)| {
                                matches!(c, Candidate::Vertex(..))
                                    || self.config.insert_vertex_condition != Condition::Never
                            })
                            .map(|(_, c)| c.coordinate());
                    }
                    return Propagation::Continue;
                };
                let c = ctx.view.pixel_to_coordinate(pixel, ctx.size);
                if let Some(f) = find_feature_mut(ctx.layers, self.config.layer, drag.feature) {
                    move_vertex(&mut f.geometry, drag.vertex, c);
                }
                self.hover = Some(c);
                if matches!(event, MapEvent::PointerUp { .. }) {
                    log::debug!("vertex {:?} of feature {} moved", drag.vertex, drag.feature);
                    self.drag = None;
                }
                Propagation::Stop
            }
            MapEvent::Wheel { .. } => Propagation::Continue,
        }
    }

    fn draw(
        &self,
        painter: &egui::Painter,
        origin: egui::Pos2,
        _layers: &[Layer],
        view: &View,
        size: egui::Vec2,
    ) {
        let Some(c) = self.hover else {
            return;
        };
        let style = self.config.vertex_style;
        painter.circle(
            origin + view.coordinate_to_pixel(c, size).to_vec2(),
            style.radius,
            style.fill.to_color32(),
            style.stroke.to_stroke(),
        );
    }
}
