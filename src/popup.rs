use eframe::egui;

use crate::hit::HitOptions;
use crate::layer::LayerId;
use crate::map::{MapNotice, MapSurface, Overlay, OverlayId};
use crate::model::{Coordinate, FeatureId, Geometry};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PopupState {
    Idle,
    Showing {
        layer: LayerId,
        feature: FeatureId,
        anchor: Coordinate,
    },
}

/// Shows a panel describing the feature under a single click.
///
/// One overlay is created when the controller attaches and is repositioned on
/// every selection; it goes away with the surface on unmount.
pub struct PopupController {
    overlay: OverlayId,
    state: PopupState,
    dismiss_on_empty_click: bool,
}

impl PopupController {
    pub fn attach(surface: &mut MapSurface, dismiss_on_empty_click: bool) -> Option<Self> {
        let overlay = surface.add_overlay(Overlay {
            position: None,
            content: String::new(),
            offset: egui::vec2(8.0, 8.0),
        })?;
        Some(Self {
            overlay,
            state: PopupState::Idle,
            dismiss_on_empty_click,
        })
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn handle(&mut self, surface: &mut MapSurface, notice: &MapNotice) {
        let MapNotice::SingleClick { pixel, .. } = *notice;
        let hits = surface.features_at_pixel(pixel, &HitOptions::default());
        let Some(hit) = hits.first() else {
            if self.dismiss_on_empty_click && self.state != PopupState::Idle {
                log::debug!("popup dismissed");
                self.state = PopupState::Idle;
                if let Some(overlay) = surface.overlay_mut(self.overlay) {
                    overlay.position = None;
                    overlay.content.clear();
                }
            }
            return;
        };
        let Some(feature) = surface.layers().iter().find_map(|l| {
            l.as_vector()
                .filter(|v| v.id == hit.layer)
                .and_then(|v| v.source.get(hit.feature))
        }) else {
            return;
        };
        let anchor = feature.geometry.extent().center();
        let content = describe(&feature.geometry);
        log::debug!("popup for feature {} at {anchor:?}", hit.feature);
        self.state = PopupState::Showing {
            layer: hit.layer,
            feature: hit.feature,
            anchor,
        };
        if let Some(overlay) = surface.overlay_mut(self.overlay) {
            overlay.position = Some(anchor);
            overlay.content = content;
        }
    }
}

/// Geometry kind and its raw coordinates, comma separated.
pub fn describe(geometry: &Geometry) -> String {
    let coords: Vec<String> = geometry
        .flat_coordinates()
        .iter()
        .map(f64::to_string)
        .collect();
    format!("type: {} coordinates: {}", geometry.type_name(), coords.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::tests::{SIZE, click, mounted_surface};
    use crate::seed::SEED_RING;

    #[test]
    fn click_inside_seeded_polygon_shows_popup_at_extent_center() {
        let mut surface = mounted_surface();
        let mut popup = PopupController::attach(&mut surface, false).unwrap();
        let pixel = surface
            .view()
            .coordinate_to_pixel(Coordinate::from((50_000.0, 5_900_000.0)), SIZE);
        for notice in click(&mut surface, pixel) {
            popup.handle(&mut surface, &notice);
        }
        let PopupState::Showing { anchor, .. } = popup.state() else {
            panic!("popup should be showing");
        };
        assert_eq!(anchor, Coordinate::from((5687.0, 5941297.0)));
        let overlay = surface.overlays().next().unwrap();
        assert_eq!(overlay.position, Some(anchor));
        assert!(overlay.content.starts_with("type: Polygon coordinates: 34243,6305749,"));
    }

    #[test]
    fn click_far_outside_stays_idle() {
        let mut surface = mounted_surface();
        let mut popup = PopupController::attach(&mut surface, false).unwrap();
        let pixel = surface
            .view()
            .coordinate_to_pixel(Coordinate::from((10_000_000.0, 10_000_000.0)), SIZE);
        for notice in click(&mut surface, pixel) {
            popup.handle(&mut surface, &notice);
        }
        assert_eq!(popup.state(), PopupState::Idle);
        assert_eq!(surface.overlays().next().unwrap().position, None);
    }

    #[test]
    fn empty_click_keeps_popup_unless_dismiss_is_enabled() {
        for dismiss in [false, true] {
            let mut surface = mounted_surface();
            let mut popup = PopupController::attach(&mut surface, dismiss).unwrap();
            let inside = surface
                .view()
                .coordinate_to_pixel(Coordinate::from((50_000.0, 5_900_000.0)), SIZE);
            let outside = surface
                .view()
                .coordinate_to_pixel(Coordinate::from((10_000_000.0, 10_000_000.0)), SIZE);
            for pixel in [inside, outside] {
                for notice in click(&mut surface, pixel) {
                    popup.handle(&mut surface, &notice);
                }
            }
            assert_eq!(popup.state() == PopupState::Idle, dismiss);
        }
    }

    #[test]
    fn one_overlay_is_reused_across_selections() {
        let mut surface = mounted_surface();
        let mut popup = PopupController::attach(&mut surface, false).unwrap();
        let polygon = surface
            .view()
            .coordinate_to_pixel(Coordinate::from((50_000.0, 5_900_000.0)), SIZE);
        let circle = surface
            .view()
            .coordinate_to_pixel(Coordinate::from((2_200_000.0, 4_200_000.0)), SIZE);
        for pixel in [polygon, circle] {
            for notice in click(&mut surface, pixel) {
                popup.handle(&mut surface, &notice);
            }
        }
        assert_eq!(surface.overlays().count(), 1);
        let overlay = surface.overlays().next().unwrap();
        assert!(overlay.content.starts_with("type: Circle"));
        assert_eq!(overlay.position, Some(Coordinate::from((2_200_000.0, 4_200_000.0))));
    }

    #[test]
    fn describe_lists_coordinates_as_stored() {
        let geometry = Geometry::polygon([SEED_RING.to_vec()]);
        assert_eq!(
            describe(&geometry),
            "type: Polygon coordinates: \
             34243,6305749,-288626,5757848,210354,5576845,300000,6000000,34243,6305749"
        );
        assert_eq!(
            describe(&Geometry::point([1.5, -2.0])),
            "type: Point coordinates: 1.5,-2"
        );
    }

    #[test]
    fn nothing_is_attached_to_an_unmounted_surface() {
        let mut surface = mounted_surface();
        surface.unmount();
        assert!(PopupController::attach(&mut surface, false).is_none());
    }
}
