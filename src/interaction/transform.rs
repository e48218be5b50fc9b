use eframe::egui;

use super::{Condition, Interaction, MapContext, Propagation};
use crate::hit::{self, HitOptions, PointRadiusFn};
use crate::layer::{Layer, LayerId, VectorLayer, find_feature_mut};
use crate::map::{MapEvent, View};
use crate::model::{Coordinate, Extent, Feature, FeatureId, Geometry, ORIGIN, rotate_coordinate};

const HANDLE_SIZE_PX: f32 = 10.0;
const ROTATE_OFFSET_PX: f32 = 24.0;
const MIN_BOX_PX: f64 = 8.0;
const MIN_MARKER_RADIUS: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformHandle {
    NW,
    N,
    NE,
    W,
    E,
    SW,
    S,
    SE,
    Rotate,
}

impl TransformHandle {
    const SCALE: [TransformHandle; 8] = [
        TransformHandle::NW,
        TransformHandle::N,
        TransformHandle::NE,
        TransformHandle::W,
        TransformHandle::E,
        TransformHandle::SW,
        TransformHandle::S,
        TransformHandle::SE,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            TransformHandle::NW | TransformHandle::NE | TransformHandle::SW | TransformHandle::SE
        )
    }

    /// Position on the box in units of half extents, y pointing north.
    fn unit(self) -> (f64, f64) {
        match self {
            TransformHandle::NW => (-1.0, 1.0),
            TransformHandle::N | TransformHandle::Rotate => (0.0, 1.0),
            TransformHandle::NE => (1.0, 1.0),
            TransformHandle::W => (-1.0, 0.0),
            TransformHandle::E => (1.0, 0.0),
            TransformHandle::SW => (-1.0, -1.0),
            TransformHandle::S => (0.0, -1.0),
            TransformHandle::SE => (1.0, -1.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransformConfig {
    pub layers: Vec<LayerId>,
    /// Must hold on press for any gesture to start.
    pub begin_condition: Condition,
    /// Keep the rotated box after a rotation instead of recomputing an axis-aligned one.
    pub enable_rotated_transform: bool,
    pub hit_tolerance: f64,
    /// Corner scaling keeps proportions while this holds.
    pub keep_aspect_ratio: Condition,
    pub translate: bool,
    pub scale: bool,
    pub stretch: bool,
    pub rotate: bool,
    pub point_radius: Option<PointRadiusFn>,
}

impl TransformConfig {
    pub fn for_layers(layers: Vec<LayerId>) -> Self {
        Self {
            layers,
            begin_condition: Condition::ShiftKey,
            enable_rotated_transform: false,
            hit_tolerance: 2.0,
            keep_aspect_ratio: Condition::ShiftKey,
            translate: true,
            scale: true,
            stretch: true,
            rotate: true,
            point_radius: None,
        }
    }

    fn hit_options(&self) -> HitOptions {
        HitOptions {
            layers: Some(self.layers.clone()),
            hit_tolerance: self.hit_tolerance,
            point_radius: self.point_radius,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Selection {
    layer: LayerId,
    feature: FeatureId,
    /// Orientation of the handle box, counter-clockwise radians.
    angle: f64,
}

/// Handle box of the selection: an extent in a frame rotated by `angle`.
#[derive(Clone, Copy, Debug)]
struct Frame {
    local: Extent,
    angle: f64,
}

impl Frame {
    fn to_world(&self, local: Coordinate) -> Coordinate {
        rotate_coordinate(local, self.angle, ORIGIN)
    }

    fn to_local(&self, world: Coordinate) -> Coordinate {
        rotate_coordinate(world, -self.angle, ORIGIN)
    }

    fn local_handle(&self, handle: TransformHandle) -> Coordinate {
        let (ux, uy) = handle.unit();
        let c = self.local.center();
        Coordinate {
            x: c.x + ux * self.local.width() * 0.5,
            y: c.y + uy * self.local.height() * 0.5,
        }
    }

    fn center(&self) -> Coordinate {
        self.to_world(self.local.center())
    }
}

#[derive(Clone, Debug)]
enum Gesture {
    Translate {
        start_geometry: Geometry,
        start_pointer: Coordinate,
    },
    Scale {
        handle: TransformHandle,
        start_geometry: Geometry,
        start_radius: f64,
        frame: Frame,
    },
    Rotate {
        start_geometry: Geometry,
        start_pointer_angle: f64,
        start_angle: f64,
        start_marker_angle: f64,
        center: Coordinate,
    },
}

/// Select a feature and drag its box to move, resize or rotate it.
pub struct TransformInteraction {
    config: TransformConfig,
    selection: Option<Selection>,
    gesture: Option<Gesture>,
}

impl TransformInteraction {
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            selection: None,
            gesture: None,
        }
    }

    pub fn selected(&self) -> Option<FeatureId> {
        self.selection.map(|s| s.feature)
    }

    /// Screen pixels of the handles currently offered, relative to the container.
    pub fn handle_positions(
        &self,
        layers: &[Layer],
        view: &View,
        size: egui::Vec2,
    ) -> Vec<(TransformHandle, egui::Pos2)> {
        let Some(selection) = self.selection else {
            return Vec::new();
        };
        let Some((layer, feature)) = lookup(layers, &selection) else {
            return Vec::new();
        };
        let frame = self.frame(layer, feature, selection.angle, view);
        let is_point = matches!(feature.geometry, Geometry::Point(_));
        let mut out = Vec::new();
        for handle in TransformHandle::SCALE {
            let allowed = if handle.is_corner() {
                self.config.scale
            } else {
                self.config.stretch && !is_point
            };
            if allowed {
                let world = frame.to_world(frame.local_handle(handle));
                out.push((handle, view.coordinate_to_pixel(world, size)));
            }
        }
        if self.config.rotate {
            let top = frame.to_world(frame.local_handle(TransformHandle::N));
            let (sin, cos) = frame.angle.sin_cos();
            let up = egui::vec2(-sin as f32, -cos as f32);
            out.push((
                TransformHandle::Rotate,
                view.coordinate_to_pixel(top, size) + up * ROTATE_OFFSET_PX,
            ));
        }
        out
    }

    fn frame(&self, layer: &VectorLayer, feature: &Feature, angle: f64, view: &View) -> Frame {
        let local = match &feature.geometry {
            Geometry::Point(point) => {
                let radius = hit::point_radius_px(layer, feature, &self.config.hit_options())
                    * view.resolution();
                let c = rotate_coordinate(point.0, -angle, ORIGIN);
                Extent::new(c.x, c.y, c.x, c.y).buffer(radius)
            }
            geometry => geometry.rotated_extent(angle),
        };
        Frame { local, angle }
    }

    fn handle_at(
        &self,
        layers: &[Layer],
        view: &View,
        size: egui::Vec2,
        pixel: egui::Pos2,
    ) -> Option<TransformHandle> {
        let grab = HANDLE_SIZE_PX * 0.5 + self.config.hit_tolerance as f32;
        self.handle_positions(layers, view, size)
            .into_iter()
            .map(|(h, p)| (h, (p - pixel).length()))
            .filter(|(_, d)| *d <= grab)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(h, _)| h)
    }

    fn begin_handle(
        &self,
        handle: TransformHandle,
        pixel: egui::Pos2,
        ctx: &MapContext<'_>,
    ) -> Option<Gesture> {
        let selection = self.selection?;
        let (layer, feature) = lookup(&*ctx.layers, &selection)?;
        let frame = self.frame(layer, feature, selection.angle, ctx.view);
        let start_geometry = feature.geometry.clone();
        if handle == TransformHandle::Rotate {
            let center = frame.center();
            let p = ctx.view.pixel_to_coordinate(pixel, ctx.size);
            return Some(Gesture::Rotate {
                start_geometry,
                start_pointer_angle: (p.y - center.y).atan2(p.x - center.x),
                start_angle: selection.angle,
                start_marker_angle: feature.number("angle").unwrap_or(0.0),
                center,
            });
        }
        Some(Gesture::Scale {
            handle,
            start_geometry,
            start_radius: hit::point_radius_px(layer, feature, &self.config.hit_options()),
            frame,
        })
    }

    fn apply(&mut self, pixel: egui::Pos2, modifiers: egui::Modifiers, ctx: &mut MapContext<'_>) {
        let (Some(selection), Some(gesture)) = (self.selection.as_mut(), self.gesture.as_ref())
        else {
            return;
        };
        let p = ctx.view.pixel_to_coordinate(pixel, ctx.size);
        let res = ctx.view.resolution();
        let Some(feature) = find_feature_mut(ctx.layers, selection.layer, selection.feature) else {
            return;
        };
        match gesture {
            Gesture::Translate {
                start_geometry,
                start_pointer,
            } => {
                let mut geometry = start_geometry.clone();
                geometry.translate(p.x - start_pointer.x, p.y - start_pointer.y);
                feature.geometry = geometry;
            }
            Gesture::Scale {
                handle,
                start_geometry,
                start_radius,
                frame,
            } => {
                let (ux, uy) = handle.unit();
                let is_point = matches!(start_geometry, Geometry::Point(_));
                // Markers grow about their own position.
                let anchor = if is_point {
                    frame.local.center()
                } else {
                    frame.local_handle(opposite(*handle))
                };
                let start = frame.local_handle(*handle);
                let local = frame.to_local(p);
                let min = MIN_BOX_PX * res;
                let mut sx = if ux != 0.0 {
                    axis_factor(local.x - anchor.x, start.x - anchor.x, min)
                } else {
                    1.0
                };
                let mut sy = if uy != 0.0 {
                    axis_factor(local.y - anchor.y, start.y - anchor.y, min)
                } else {
                    1.0
                };
                if handle.is_corner() && self.config.keep_aspect_ratio.holds(modifiers) {
                    let s = if sx.abs() > sy.abs() { sx } else { sy };
                    sx = s;
                    sy = s;
                }
                if is_point {
                    let radius = start_radius * (sx.abs() + sy.abs()) * 0.5;
                    feature.set_number("radius", radius.max(MIN_MARKER_RADIUS));
                } else {
                    let mut geometry = start_geometry.clone();
                    geometry.rotate(-frame.angle, ORIGIN);
                    geometry.scale(sx, sy, anchor);
                    geometry.rotate(frame.angle, ORIGIN);
                    feature.geometry = geometry;
                }
            }
            Gesture::Rotate {
                start_geometry,
                start_pointer_angle,
                start_angle,
                start_marker_angle,
                center,
            } => {
                let angle = (p.y - center.y).atan2(p.x - center.x);
                let delta = angle - start_pointer_angle;
                let mut geometry = start_geometry.clone();
                geometry.rotate(delta, *center);
                feature.geometry = geometry;
                if let Geometry::Point(_) = start_geometry {
                    // Marker rotation is clockwise on screen.
                    feature.set_number("angle", start_marker_angle - delta);
                }
                selection.angle = if self.config.enable_rotated_transform {
                    start_angle + delta
                } else {
                    0.0
                };
            }
        }
    }
}

/// Scale factor along one axis, keeping at least `min` of extent.
fn axis_factor(now: f64, start: f64, min: f64) -> f64 {
    if start.abs() <= f64::EPSILON {
        return 1.0;
    }
    let size = if now.abs() < min {
        min.copysign(if now == 0.0 { start } else { now })
    } else {
        now
    };
    size / start
}

fn opposite(handle: TransformHandle) -> TransformHandle {
    match handle {
        TransformHandle::NW => TransformHandle::SE,
        TransformHandle::N => TransformHandle::S,
        TransformHandle::NE => TransformHandle::SW,
        TransformHandle::W => TransformHandle::E,
        TransformHandle::E => TransformHandle::W,
        TransformHandle::SW => TransformHandle::NE,
        TransformHandle::S => TransformHandle::N,
        TransformHandle::SE => TransformHandle::NW,
        TransformHandle::Rotate => TransformHandle::Rotate,
    }
}

fn lookup<'a>(
    layers: &'a [Layer],
    selection: &Selection,
) -> Option<(&'a VectorLayer, &'a Feature)> {
    let layer = layers
        .iter()
        .filter_map(Layer::as_vector)
        .find(|l| l.id == selection.layer)?;
    let feature = layer.source.get(selection.feature)?;
    Some((layer, feature))
}

impl Interaction for TransformInteraction {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    fn offers_handle(
        &self,
        pixel: egui::Pos2,
        modifiers: egui::Modifiers,
        ctx: &MapContext<'_>,
    ) -> bool {
        self.config.begin_condition.holds(modifiers)
            && self
                .handle_at(&*ctx.layers, ctx.view, ctx.size, pixel)
                .is_some()
    }

    fn handle_event(&mut self, event: &MapEvent, ctx: &mut MapContext<'_>) -> Propagation {
        match *event {
            MapEvent::PointerDown { pixel, modifiers } => {
                let may_begin = self.config.begin_condition.holds(modifiers);
                if let Some(handle) = self.handle_at(&*ctx.layers, ctx.view, ctx.size, pixel) {
                    if !may_begin {
                        return Propagation::Continue;
                    }
                    self.gesture = self.begin_handle(handle, pixel, ctx);
                    if self.gesture.is_some() {
                        log::debug!("transform {handle:?} started");
                        return Propagation::Stop;
                    }
                }
                let hits = hit::features_at_pixel(
                    &*ctx.layers,
                    ctx.view,
                    ctx.size,
                    pixel,
                    &self.config.hit_options(),
                );
                let Some(hit) = hits.first() else {
                    if self.selection.take().is_some() {
                        log::debug!("transform selection cleared");
                    }
                    return Propagation::Continue;
                };
                if self.selected() != Some(hit.feature) {
                    log::debug!("transform selected feature {}", hit.feature);
                    self.selection = Some(Selection {
                        layer: hit.layer,
                        feature: hit.feature,
                        angle: 0.0,
                    });
                }
                // Selecting alone leaves the press to the map.
                if !(self.config.translate && may_begin) {
                    return Propagation::Continue;
                }
                let start = self
                    .selection
                    .and_then(|selection| lookup(&*ctx.layers, &selection))
                    .map(|(_, f)| f.geometry.clone());
                self.gesture = start.map(|start_geometry| Gesture::Translate {
                    start_geometry,
                    start_pointer: ctx.view.pixel_to_coordinate(pixel, ctx.size),
                });
                if self.gesture.is_some() {
                    Propagation::Stop
                } else {
                    Propagation::Continue
                }
            }
            MapEvent::PointerMove { pixel, modifiers } => {
                if self.gesture.is_none() {
                    return Propagation::Continue;
                }
                self.apply(pixel, modifiers, ctx);
                Propagation::Stop
            }
            MapEvent::PointerUp { pixel, modifiers } => {
                if self.gesture.is_none() {
                    return Propagation::Continue;
                }
                self.apply(pixel, modifiers, ctx);
                self.gesture = None;
                log::debug!("transform finished");
                Propagation::Stop
            }
            MapEvent::Wheel { .. } => Propagation::Continue,
        }
    }

    fn draw(
        &self,
        painter: &egui::Painter,
        origin: egui::Pos2,
        layers: &[Layer],
        view: &View,
        size: egui::Vec2,
    ) {
        let Some(selection) = self.selection else {
            return;
        };
        let Some((layer, feature)) = lookup(layers, &selection) else {
            return;
        };
        let frame = self.frame(layer, feature, selection.angle, view);
        let to_screen = |local: Coordinate| {
            origin + view.coordinate_to_pixel(frame.to_world(local), size).to_vec2()
        };
        let corners: Vec<egui::Pos2> = [
            TransformHandle::NW,
            TransformHandle::NE,
            TransformHandle::SE,
            TransformHandle::SW,
        ]
        .into_iter()
        .map(|h| to_screen(frame.local_handle(h)))
        .collect();
        let accent = egui::Color32::from_rgb(40, 90, 200);
        painter.add(egui::Shape::dashed_line(
            &[corners.as_slice(), &corners[..1]].concat(),
            egui::Stroke::new(1.0, accent),
            6.0,
            4.0,
        ));
        for (handle, pixel) in self.handle_positions(layers, view, size) {
            let p = origin + pixel.to_vec2();
            if handle == TransformHandle::Rotate {
                let top = to_screen(frame.local_handle(TransformHandle::N));
                painter.line_segment([top, p], egui::Stroke::new(1.0, accent));
                painter.circle(
                    p,
                    HANDLE_SIZE_PX * 0.5,
                    egui::Color32::WHITE,
                    egui::Stroke::new(1.0, accent),
                );
            } else {
                let rect = egui::Rect::from_center_size(p, egui::Vec2::splat(HANDLE_SIZE_PX));
                painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
                painter.rect_stroke(
                    rect,
                    0.0,
                    egui::Stroke::new(1.0, accent),
                    egui::StrokeKind::Inside,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{FeatureCollection, VectorLayer};
    use crate::map::tests::{SIZE, click, drag, target};
    use crate::map::{MapOptions, MapSurface};
    use crate::style;

    fn surface_with(features: Vec<Feature>) -> MapSurface {
        let layer = VectorLayer::new(
            LayerId(1),
            FeatureCollection::from_features(features).unwrap(),
        )
        .with_style(style::resolve);
        let mut surface = MapSurface::new(MapOptions {
            view: View::default(),
            layers: vec![Layer::Vector(layer)],
        });
        surface.mount(target());
        surface
    }

    fn square() -> Feature {
        Feature::new(Geometry::from_extent(Extent::new(0.0, 0.0, 2_000_000.0, 2_000_000.0)))
    }

    fn pixel_of(surface: &MapSurface, c: Coordinate) -> egui::Pos2 {
        surface.view().coordinate_to_pixel(c, SIZE)
    }

    fn geometry(surface: &MapSurface, id: FeatureId) -> Geometry {
        surface.layers()[0]
            .as_vector()
            .and_then(|l| l.source.get(id))
            .map(|f| f.geometry.clone())
            .unwrap()
    }

    fn attach(surface: &mut MapSurface, condition: Condition) {
        let mut config = TransformConfig::for_layers(vec![LayerId(1)]);
        config.begin_condition = condition;
        config.keep_aspect_ratio = Condition::Never;
        assert!(surface.add_interaction(Box::new(TransformInteraction::new(config))));
    }

    #[test]
    fn plain_drag_scales_when_always_allowed() {
        let f = square();
        let id = f.id();
        let mut surface = surface_with(vec![f]);
        attach(&mut surface, Condition::Always);

        let body = pixel_of(&surface, Coordinate::from((1e6, 1e6)));
        click(&mut surface, body);
        let ne = pixel_of(&surface, Coordinate::from((2e6, 2e6)));
        let res = surface.view().resolution() as f32;
        let to = ne + egui::vec2(2e6 / res, -2e6 / res);
        drag(&mut surface, ne, to, egui::Modifiers::NONE);

        let extent = geometry(&surface, id).extent();
        assert!((extent.max_x - 4e6).abs() < 1e5, "{extent:?}");
        assert!((extent.max_y - 4e6).abs() < 1e5, "{extent:?}");
        assert!(extent.min_x.abs() < 1.0 && extent.min_y.abs() < 1.0);
    }

    #[test]
    fn drag_without_modifier_does_not_start_when_modifier_required() {
        let f = square();
        let id = f.id();
        let mut surface = surface_with(vec![f]);
        attach(&mut surface, Condition::ShiftKey);

        let body = pixel_of(&surface, Coordinate::from((1e6, 1e6)));
        click(&mut surface, body);
        let before = geometry(&surface, id);
        let ne = pixel_of(&surface, Coordinate::from((2e6, 2e6)));
        drag(&mut surface, ne, ne + egui::vec2(40.0, -40.0), egui::Modifiers::NONE);
        assert_eq!(geometry(&surface, id), before);
    }

    #[test]
    fn modifier_unlocks_the_gesture() {
        let f = square();
        let id = f.id();
        let mut surface = surface_with(vec![f]);
        attach(&mut surface, Condition::ShiftKey);

        let body = pixel_of(&surface, Coordinate::from((1e6, 1e6)));
        click(&mut surface, body);
        let before = geometry(&surface, id);
        let ne = pixel_of(&surface, Coordinate::from((2e6, 2e6)));
        drag(&mut surface, ne, ne + egui::vec2(40.0, -40.0), egui::Modifiers::SHIFT);
        assert_ne!(geometry(&surface, id), before);
    }

    #[test]
    fn body_drag_translates() {
        let f = square();
        let id = f.id();
        let mut surface = surface_with(vec![f]);
        attach(&mut surface, Condition::Always);
        let center = surface.view().center;

        let from = pixel_of(&surface, Coordinate::from((1e6, 1e6)));
        drag(&mut surface, from, from + egui::vec2(10.0, 0.0), egui::Modifiers::NONE);
        let res = surface.view().resolution();
        let extent = geometry(&surface, id).extent();
        assert!((extent.min_x - 10.0 * res).abs() < res * 0.01);
        assert_eq!(surface.view().center, center);
    }

    #[test]
    fn rotate_handle_turns_geometry_about_its_center() {
        let f = square();
        let id = f.id();
        let mut surface = surface_with(vec![f]);
        attach(&mut surface, Condition::Always);

        let body = pixel_of(&surface, Coordinate::from((1e6, 1e6)));
        click(&mut surface, body);
        let rotate = {
            let layers = surface.layers();
            let (_, p) = find_handle(&surface, layers, TransformHandle::Rotate);
            p
        };
        // Quarter turn clockwise on screen: from above the center to its right.
        let center_px = body;
        let radius = (rotate - center_px).length();
        drag(
            &mut surface,
            rotate,
            center_px + egui::vec2(radius, 0.0),
            egui::Modifiers::NONE,
        );
        let extent = geometry(&surface, id).extent();
        // A rotated square keeps its axis-aligned size at quarter turns.
        assert!((extent.width() - 2e6).abs() < 1e4, "{extent:?}");
        assert!((extent.center().x - 1e6).abs() < 1e4);
    }

    fn find_handle(
        surface: &MapSurface,
        layers: &[Layer],
        handle: TransformHandle,
    ) -> (TransformHandle, egui::Pos2) {
        let interaction = TransformInteraction {
            config: TransformConfig::for_layers(vec![LayerId(1)]),
            selection: layers[0]
                .as_vector()
                .and_then(|l| l.source.iter().next())
                .map(|f| Selection {
                    layer: LayerId(1),
                    feature: f.id(),
                    angle: 0.0,
                }),
            gesture: None,
        };
        interaction
            .handle_positions(layers, surface.view(), SIZE)
            .into_iter()
            .find(|(h, _)| *h == handle)
            .unwrap()
    }

    #[test]
    fn point_scaling_changes_marker_radius() {
        let point = Feature::new(Geometry::point([0.0, 0.0])).with_property("radius", 20);
        let id = point.id();
        let mut surface = surface_with(vec![point]);
        attach(&mut surface, Condition::Always);

        click(&mut surface, egui::pos2(400.0, 300.0));
        // NE corner of the marker box sits radius pixels away on both axes.
        let ne = egui::pos2(420.0, 280.0);
        drag(&mut surface, ne, egui::pos2(440.0, 260.0), egui::Modifiers::NONE);
        let feature_radius = surface.layers()[0]
            .as_vector()
            .and_then(|l| l.source.get(id))
            .and_then(|f| f.number("radius"))
            .unwrap();
        assert!((feature_radius - 40.0).abs() < 0.5, "{feature_radius}");
        assert_eq!(geometry(&surface, id), Geometry::point([0.0, 0.0]));
    }

    #[test]
    fn click_on_nothing_clears_selection_and_lets_the_map_pan() {
        let mut surface = surface_with(vec![square()]);
        attach(&mut surface, Condition::Always);
        let body = pixel_of(&surface, Coordinate::from((1e6, 1e6)));
        click(&mut surface, body);
        let center = surface.view().center;
        drag(
            &mut surface,
            egui::pos2(10.0, 10.0),
            egui::pos2(30.0, 10.0),
            egui::Modifiers::NONE,
        );
        assert_ne!(surface.view().center, center);
    }

    #[test]
    fn press_without_the_modifier_selects_and_lets_the_map_pan() {
        let f = square();
        let id = f.id();
        let mut surface = surface_with(vec![f]);
        attach(&mut surface, Condition::ShiftKey);
        let before = geometry(&surface, id);
        let center = surface.view().center;

        let body = pixel_of(&surface, Coordinate::from((1e6, 1e6)));
        drag(&mut surface, body, body + egui::vec2(30.0, 0.0), egui::Modifiers::NONE);
        assert_eq!(geometry(&surface, id), before);
        assert_ne!(surface.view().center, center);
        assert!(!surface.is_editing());
    }

    #[test]
    fn handles_are_offered_only_when_the_gesture_may_begin() {
        let f = square();
        let id = f.id();
        let mut layers = vec![Layer::Vector(VectorLayer::new(
            LayerId(1),
            FeatureCollection::from_features([f]).unwrap(),
        ))];
        let mut config = TransformConfig::for_layers(vec![LayerId(1)]);
        config.begin_condition = Condition::ShiftKey;
        let mut transform = TransformInteraction::new(config);
        let view = View::default();
        let ne = view.coordinate_to_pixel(Coordinate::from((2e6, 2e6)), SIZE);
        let body = view.coordinate_to_pixel(Coordinate::from((1e6, 1e6)), SIZE);
        let ctx = MapContext {
            layers: &mut layers,
            view: &view,
            size: SIZE,
        };
        assert!(!transform.offers_handle(ne, egui::Modifiers::SHIFT, &ctx));

        transform.selection = Some(Selection {
            layer: LayerId(1),
            feature: id,
            angle: 0.0,
        });
        assert!(transform.offers_handle(ne, egui::Modifiers::SHIFT, &ctx));
        assert!(!transform.offers_handle(ne, egui::Modifiers::NONE, &ctx));
        assert!(!transform.offers_handle(body, egui::Modifiers::SHIFT, &ctx));
    }

    #[test]
    fn axis_factor_keeps_a_minimum_size() {
        assert_eq!(axis_factor(10.0, 5.0, 1.0), 2.0);
        assert_eq!(axis_factor(0.0, 5.0, 1.0), 0.2);
        assert_eq!(axis_factor(-0.5, 5.0, 1.0), -0.2);
        assert_eq!(axis_factor(3.0, 0.0, 1.0), 1.0);
    }
}
