use eframe::egui;

use crate::map::MapEvent;

/// Wheel points per zoom level.
const WHEEL_POINTS_PER_ZOOM: f32 = 120.0;

/// Tracks whether the current press started on the map, so a drag that leaves
/// the container still ends with a release.
#[derive(Default)]
pub(super) struct PointerTracker {
    pressed_inside: bool,
}

impl PointerTracker {
    /// Converts this frame's raw egui input into map events with pixels
    /// relative to `rect`. `hovered` is false while another window covers it.
    pub fn collect(
        &mut self,
        input: &egui::InputState,
        rect: egui::Rect,
        hovered: bool,
    ) -> Vec<MapEvent> {
        let local = |pos: egui::Pos2| (pos - rect.min).to_pos2();
        let mut events = Vec::new();
        for event in &input.events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    modifiers,
                } => {
                    if *pressed {
                        if hovered && rect.contains(*pos) {
                            self.pressed_inside = true;
                            events.push(MapEvent::PointerDown {
                                pixel: local(*pos),
                                modifiers: *modifiers,
                            });
                        }
                    } else if self.pressed_inside {
                        self.pressed_inside = false;
                        events.push(MapEvent::PointerUp {
                            pixel: local(*pos),
                            modifiers: *modifiers,
                        });
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    if self.pressed_inside || (hovered && rect.contains(*pos)) {
                        events.push(MapEvent::PointerMove {
                            pixel: local(*pos),
                            modifiers: input.modifiers,
                        });
                    }
                }
                egui::Event::PointerGone => {
                    if self.pressed_inside {
                        self.pressed_inside = false;
                        if let Some(pos) = input.pointer.latest_pos() {
                            events.push(MapEvent::PointerUp {
                                pixel: local(pos),
                                modifiers: input.modifiers,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        if hovered {
            if let Some(pos) = input.pointer.hover_pos().filter(|p| rect.contains(*p)) {
                let scroll = input.raw_scroll_delta.y;
                let pinch = input.zoom_delta();
                let delta = if scroll.abs() > 0.0 {
                    (scroll / WHEEL_POINTS_PER_ZOOM).clamp(-1.0, 1.0)
                } else if (pinch - 1.0).abs() > f32::EPSILON {
                    pinch.log2()
                } else {
                    0.0
                };
                if delta != 0.0 {
                    events.push(MapEvent::Wheel {
                        pixel: local(pos),
                        delta: f64::from(delta),
                    });
                }
            }
        }
        events
    }
}
