use eframe::egui;

use crate::interaction::Condition;
use crate::layer::{Layer, VectorLayer};
use crate::map::{MapSurface, View};
use crate::model::{self, Coordinate, Extent, Feature, Geometry};
use crate::style::StyleDescriptor;
use crate::tiles::{self, TileCache, TileState};

const POPUP_WIDTH: f32 = 424.0;
const POPUP_HEIGHT: f32 = 412.0;

pub(super) fn condition_combo(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    value: &mut Condition,
) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(value.label())
            .show_ui(ui, |ui| {
                for condition in Condition::ALL {
                    changed |= ui
                        .selectable_value(value, condition, condition.label())
                        .changed();
                }
            });
    });
    changed
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
}

fn extent_to_screen(
    origin: egui::Pos2,
    view: &View,
    size: egui::Vec2,
    extent: &Extent,
) -> egui::Rect {
    let top_left = Coordinate::from((extent.min_x, extent.max_y));
    let bottom_right = Coordinate::from((extent.max_x, extent.min_y));
    egui::Rect::from_min_max(
        origin + view.coordinate_to_pixel(top_left, size).to_vec2(),
        origin + view.coordinate_to_pixel(bottom_right, size).to_vec2(),
    )
}

fn draw_basemap(painter: &egui::Painter, rect: egui::Rect, view: &View, cache: &mut TileCache) {
    let size = rect.size();
    let visible = tiles::tile_range_for_view(view, size);
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    for tile in &visible {
        let screen = extent_to_screen(rect.min, view, size, &tile.extent);
        match cache.get(tile.id) {
            TileState::Ready(texture) => {
                painter.image(texture.id(), screen, uv, egui::Color32::WHITE);
            }
            TileState::Pending => {}
            TileState::Failed => {
                painter.rect_filled(screen.shrink(1.0), 0.0, egui::Color32::from_gray(70));
            }
        }
    }
    cache.trim(&visible);
}

/// Paints the surface layers bottom to top, then the interaction handles.
/// A tile layer is drawn only when `tiles` caches that layer.
pub(super) fn draw_layers(
    painter: &egui::Painter,
    rect: egui::Rect,
    surface: &MapSurface,
    mut tiles: Option<&mut TileCache>,
) {
    for layer in surface.layers() {
        match layer {
            Layer::Tile(tile_layer) => {
                if let Some(cache) = tiles.as_deref_mut().filter(|c| c.layer() == tile_layer.id) {
                    draw_basemap(painter, rect, surface.view(), cache);
                }
            }
            Layer::Vector(vector) => draw_vector_layer(painter, rect, surface.view(), vector),
        }
    }
    for interaction in surface.interactions() {
        interaction.draw(painter, rect.min, surface.layers(), surface.view(), rect.size());
    }
}

fn draw_vector_layer(painter: &egui::Painter, rect: egui::Rect, view: &View, layer: &VectorLayer) {
    // Markers reach past their coordinate.
    let visible = view.extent(rect.size()).buffer(64.0 * view.resolution());
    for feature in layer.source.iter() {
        if !feature.geometry.extent().intersects(&visible) {
            continue;
        }
        for style in layer.styles_for(feature) {
            draw_feature(painter, rect, view, feature, &style);
        }
    }
}

fn draw_feature(
    painter: &egui::Painter,
    rect: egui::Rect,
    view: &View,
    feature: &Feature,
    style: &StyleDescriptor,
) {
    let size = rect.size();
    let to_screen = |c: Coordinate| rect.min + view.coordinate_to_pixel(c, size).to_vec2();
    let stroke = style.stroke.to_stroke();
    let fill = style
        .fill
        .map(|c| c.to_color32())
        .unwrap_or(egui::Color32::TRANSPARENT);
    match &feature.geometry {
        Geometry::Point(point) => {
            if let Some(marker) = &style.marker {
                let points = marker.vertices(to_screen(point.0));
                painter.add(egui::Shape::convex_polygon(points, fill, stroke));
            } else {
                painter.circle(to_screen(point.0), 4.0, fill, stroke);
            }
        }
        Geometry::LineString(line) => {
            let points: Vec<egui::Pos2> = line.coords().map(|c| to_screen(*c)).collect();
            painter.add(egui::Shape::line(points, stroke));
        }
        Geometry::Polygon(polygon) => {
            for (i, ring) in model::rings(polygon).enumerate() {
                let mut points: Vec<egui::Pos2> = ring.coords().map(|c| to_screen(*c)).collect();
                if points.len() > 1 && points.first() == points.last() {
                    points.pop();
                }
                if i == 0 && fill != egui::Color32::TRANSPARENT {
                    painter.add(egui::Shape::convex_polygon(
                        points.clone(),
                        fill,
                        egui::Stroke::NONE,
                    ));
                }
                painter.add(egui::Shape::closed_line(points, stroke));
            }
        }
        Geometry::Circle(circle) => {
            let radius_px = (circle.radius / view.resolution()) as f32;
            painter.circle(to_screen(circle.center), radius_px, fill, stroke);
        }
    }
}

/// Paints the anchored overlays as floating panels.
pub(super) fn draw_overlays(ctx: &egui::Context, rect: egui::Rect, surface: &MapSurface) {
    for (i, overlay) in surface.overlays().enumerate() {
        let Some(position) = overlay.position else {
            continue;
        };
        let pixel = surface.view().coordinate_to_pixel(position, rect.size());
        let anchor = rect.min + pixel.to_vec2();
        if !rect.contains(anchor) {
            continue;
        }
        egui::Area::new(egui::Id::new(("map_overlay", i)))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor + overlay.offset)
            .constrain_to(rect)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(POPUP_WIDTH);
                    egui::ScrollArea::vertical()
                        .max_height(POPUP_HEIGHT)
                        .show(ui, |ui| {
                            ui.add(egui::Label::new(&overlay.content).wrap());
                        });
                });
            });
    }
}
