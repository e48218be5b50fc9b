use crate::model::{Feature, Geometry};
use eframe::egui;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MARKER_RADIUS: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
}

impl StrokeStyle {
    pub fn to_stroke(self) -> egui::Stroke {
        egui::Stroke::new(self.width, self.color.to_color32())
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgba::new(255, 0, 0, 255),
            width: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarkerShape {
    Triangle,
}

impl MarkerShape {
    pub fn points(self) -> usize {
        match self {
            MarkerShape::Triangle => 3,
        }
    }
}

/// A regular-polygon marker drawn at point geometries. Radius is in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub radius: f64,
    pub rotation: f64,
}

impl MarkerStyle {
    /// Screen-space vertices, y down, first vertex pointing up before rotation.
    pub fn vertices(&self, center: egui::Pos2) -> Vec<egui::Pos2> {
        let n = self.shape.points();
        (0..n)
            .map(|i| {
                let a = self.rotation + (i as f64) * std::f64::consts::TAU / (n as f64);
                let (sin, cos) = a.sin_cos();
                egui::pos2(
                    center.x + (self.radius * sin) as f32,
                    center.y - (self.radius * cos) as f32,
                )
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleDescriptor {
    pub fill: Option<Rgba>,
    pub stroke: StrokeStyle,
    pub marker: Option<MarkerStyle>,
}

pub type StyleFn = fn(&Feature) -> Vec<StyleDescriptor>;

pub fn default_fill() -> Rgba {
    Rgba::new(255, 0, 0, 26)
}

/// Styles for `feature`, painted in order.
pub fn resolve(feature: &Feature) -> Vec<StyleDescriptor> {
    let base = StyleDescriptor {
        fill: Some(default_fill()),
        stroke: StrokeStyle::default(),
        marker: None,
    };
    match feature.geometry {
        Geometry::Point(_) => vec![StyleDescriptor {
            marker: Some(MarkerStyle {
                shape: MarkerShape::Triangle,
                radius: feature.number("radius").unwrap_or(DEFAULT_MARKER_RADIUS),
                rotation: feature.number("angle").unwrap_or(0.0),
            }),
            ..base
        }],
        _ => vec![base],
    }
}
