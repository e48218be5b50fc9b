use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::model::{self, Coordinate, Extent};

/// Metres per pixel at zoom 0 for 256 px web-mercator tiles.
pub const MAX_RESOLUTION: f64 = 156_543.033_928_040_97;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 20.0;

/// Center and zoom of the map. Pixels are relative to the container's top-left
/// corner, y growing downwards; map y grows northwards.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct View {
    pub center: Coordinate,
    pub zoom: f64,
}

impl Default for View {
    fn default() -> Self {
        Self {
            center: model::ORIGIN,
            zoom: 2.0,
        }
    }
}

impl View {
    pub fn resolution(&self) -> f64 {
        MAX_RESOLUTION / 2f64.powf(self.zoom)
    }

    pub fn coordinate_to_pixel(&self, c: Coordinate, size: egui::Vec2) -> egui::Pos2 {
        let res = self.resolution();
        egui::pos2(
            (f64::from(size.x) * 0.5 + (c.x - self.center.x) / res) as f32,
            (f64::from(size.y) * 0.5 - (c.y - self.center.y) / res) as f32,
        )
    }

    pub fn pixel_to_coordinate(&self, p: egui::Pos2, size: egui::Vec2) -> Coordinate {
        let res = self.resolution();
        Coordinate {
            x: self.center.x + (f64::from(p.x) - f64::from(size.x) * 0.5) * res,
            y: self.center.y - (f64::from(p.y) - f64::from(size.y) * 0.5) * res,
        }
    }

    /// Visible extent for a viewport of `size` pixels.
    pub fn extent(&self, size: egui::Vec2) -> Extent {
        let res = self.resolution();
        let half_w = f64::from(size.x) * 0.5 * res;
        let half_h = f64::from(size.y) * 0.5 * res;
        Extent::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    /// Moves the content along with a pointer drag of `delta` pixels.
    pub fn pan_by_pixels(&mut self, delta: egui::Vec2) {
        let res = self.resolution();
        self.center.x -= f64::from(delta.x) * res;
        self.center.y += f64::from(delta.y) * res;
    }

    /// Changes zoom by `delta` levels, keeping the coordinate under `pixel` fixed.
    pub fn zoom_about_pixel(&mut self, pixel: egui::Pos2, size: egui::Vec2, delta: f64) {
        let before = self.pixel_to_coordinate(pixel, size);
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        let after = self.pixel_to_coordinate(pixel, size);
        self.center.x += before.x - after.x;
        self.center.y += before.y - after.y;
    }
}
