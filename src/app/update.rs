use eframe::egui;

use super::render::{condition_combo, draw_background, draw_layers, draw_overlays};
use super::{MAP_HEIGHT, MapApp};
use crate::popup::PopupState;
use crate::seed::SeedVariant;

impl MapApp {
    fn options_panel(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;
        let s = &mut self.settings;

        ui.heading("Layer");
        ui.horizontal(|ui| {
            ui.label("Seed:");
            egui::ComboBox::from_id_salt("seed_variant")
                .selected_text(match s.seed {
                    SeedVariant::Extent => "Square",
                    SeedVariant::Showcase => "Showcase",
                })
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut s.seed, SeedVariant::Extent, "Square")
                        .changed();
                    changed |= ui
                        .selectable_value(&mut s.seed, SeedVariant::Showcase, "Showcase")
                        .changed();
                });
        });
        changed |= ui.checkbox(&mut s.basemap.enabled, "OpenStreetMap basemap").changed();

        ui.separator();
        ui.heading("Transform");
        changed |= ui.checkbox(&mut s.transform.enabled, "Enabled").changed();
        ui.add_enabled_ui(s.transform.enabled, |ui| {
            changed |=
                condition_combo(ui, "transform_condition", "Begin:", &mut s.transform.condition);
            changed |= condition_combo(
                ui,
                "transform_aspect",
                "Keep aspect:",
                &mut s.transform.keep_aspect_ratio,
            );
            changed |= ui
                .checkbox(
                    &mut s.transform.enable_rotated_transform,
                    "Rotate the box with the shape",
                )
                .changed();
            let tolerance = egui::Slider::new(&mut s.transform.hit_tolerance, 0.0..=10.0);
            changed |= ui.add(tolerance.text("Hit tolerance")).changed();
        });

        ui.separator();
        ui.heading("Modify");
        changed |= ui.checkbox(&mut s.modify.enabled, "Enabled").changed();
        ui.add_enabled_ui(s.modify.enabled, |ui| {
            changed |=
                condition_combo(ui, "modify_insert", "Insert vertex:", &mut s.modify.insert_vertex);
            let tolerance = egui::Slider::new(&mut s.modify.pixel_tolerance, 2.0..=30.0);
            changed |= ui.add(tolerance.text("Pixel tolerance")).changed();
        });

        ui.separator();
        ui.heading("Popup");
        changed |= ui.checkbox(&mut s.popup.enabled, "Show feature on click").changed();
        changed |= ui
            .checkbox(&mut s.popup.dismiss_on_empty_click, "Hide when clicking empty map")
            .changed();

        ui.separator();
        if changed {
            self.status = Some("Options changed, remount to apply".to_string());
        }
        ui.horizontal(|ui| {
            if ui.button("Apply (remount)").clicked() {
                self.remount();
            }
            if ui.button("Save settings").clicked() {
                self.persist_settings();
            }
        });
        ui.label(egui::RichText::new(&self.settings_path).weak().small());
    }
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Map editing demo");
                ui.separator();
                if self.map.is_some() {
                    if ui.button("Unmount").clicked() {
                        self.unmount_map();
                    }
                } else if ui.button("Mount").clicked() {
                    self.wants_mounted = true;
                }
                if ui.button("Remount").clicked() {
                    self.remount();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_deref().unwrap_or("Ready"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(map) = &self.map {
                        ui.label(format!("Zoom: {:.1}", map.surface.view().zoom));
                        ui.separator();
                        ui.label(format!("Listeners: {}", map.surface.listener_count()));
                        ui.separator();
                        let popup = match map.popup.as_ref().map(|p| p.state()) {
                            Some(PopupState::Showing { feature, .. }) => {
                                format!("Popup: {feature}")
                            }
                            _ => "Popup: idle".to_string(),
                        };
                        ui.label(popup);
                        if map.surface.is_editing() {
                            ui.separator();
                            ui.label("Editing");
                        }
                    } else {
                        ui.label("Unmounted");
                    }
                });
            });
        });

        egui::SidePanel::right("right_panel")
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.options_panel(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let size = egui::vec2(ui.available_width(), MAP_HEIGHT);
            let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
            if self.map.is_none() && self.wants_mounted {
                self.mount_into(ctx, rect);
            }

            let painter = ui.painter_at(rect);
            draw_background(&painter, rect);
            let Some(map) = &mut self.map else {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Map unmounted",
                    egui::FontId::proportional(16.0),
                    ui.visuals().weak_text_color(),
                );
                return;
            };

            map.surface.update_target(rect);
            let hovered = response.hovered() || response.dragged();
            let events = ctx.input(|i| self.pointer.collect(i, rect, hovered));
            for event in events {
                map.surface.push_event(event);
            }
            map.pump();

            if let Some(tiles) = &mut map.tiles {
                tiles.poll(ctx);
            }
            draw_layers(&painter, rect, &map.surface, map.tiles.as_mut());
            if map.tiles.is_some() {
                painter.text(
                    rect.right_bottom() - egui::vec2(6.0, 4.0),
                    egui::Align2::RIGHT_BOTTOM,
                    "© OpenStreetMap contributors",
                    egui::FontId::proportional(11.0),
                    egui::Color32::from_gray(40),
                );
            }
            painter.rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
                egui::StrokeKind::Inside,
            );
            draw_overlays(ctx, rect, &map.surface);
        });
    }
}
