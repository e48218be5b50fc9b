use eframe::egui;

mod component;
mod input;
mod render;
pub(crate) mod settings;
mod update;

use component::MapComponent;
use settings::AppSettings;

/// Height of the map container in points.
const MAP_HEIGHT: f32 = 600.0;

pub struct MapApp {
    settings: AppSettings,
    settings_path: String,
    map: Option<MapComponent>,
    /// Whether the map should be mounted; it attaches on the first frame
    /// where its container has a size.
    wants_mounted: bool,
    pointer: input::PointerTracker,
    status: Option<String>,
}

impl MapApp {
    pub(crate) fn new(
        cc: &eframe::CreationContext<'_>,
        settings_path: String,
        settings: AppSettings,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            settings,
            settings_path,
            map: None,
            wants_mounted: true,
            pointer: input::PointerTracker::default(),
            status: None,
        }
    }

    fn mount_into(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let target = crate::map::MountTarget::new(rect);
        match MapComponent::mount(target, &self.settings, Some(ctx)) {
            Ok(Some(map)) => {
                self.map = Some(map);
                self.status = Some("Map mounted".to_string());
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("mount failed: {err}");
                self.status = Some(format!("Mount failed: {err}"));
                self.wants_mounted = false;
            }
        }
    }

    fn unmount_map(&mut self) {
        if let Some(mut map) = self.map.take() {
            map.unmount();
            log::info!("map unmounted");
        }
        self.pointer = input::PointerTracker::default();
        self.wants_mounted = false;
        self.status = Some("Map unmounted".to_string());
    }

    /// Tears the map down and builds it again from the current settings.
    fn remount(&mut self) {
        self.unmount_map();
        self.wants_mounted = true;
    }

    fn persist_settings(&mut self) {
        if let Some(map) = &self.map {
            self.settings.view = *map.surface.view();
        }
        match settings::save_settings(&self.settings_path, &self.settings) {
            Ok(()) => {
                log::info!("settings saved to {}", self.settings_path);
                self.status = Some(format!("Saved settings to {}", self.settings_path));
            }
            Err(err) => {
                log::error!("{err}");
                self.status = Some(format!("Failed to save settings: {err}"));
            }
        }
    }
}
