use eframe::egui;

use super::settings::AppSettings;
use crate::error::MapError;
use crate::interaction::{ModifyConfig, ModifyInteraction, TransformConfig, TransformInteraction};
use crate::layer::{Layer, LayerId, TileLayer};
use crate::map::{MapNotice, MapOptions, MapSurface, MountTarget};
use crate::popup::PopupController;
use crate::seed;
use crate::tiles::TileCache;

pub(super) const BASEMAP_LAYER: LayerId = LayerId(0);
pub(super) const EDIT_LAYER: LayerId = LayerId(1);

/// The embedded map and everything bound to it for one mount.
pub(super) struct MapComponent {
    pub surface: MapSurface,
    pub popup: Option<PopupController>,
    pub tiles: Option<TileCache>,
}

impl MapComponent {
    /// Builds the map into `target`. Returns `Ok(None)` when the container
    /// has no usable size yet; the caller retries on a later frame.
    pub fn mount(
        target: MountTarget,
        settings: &AppSettings,
        ctx: Option<&egui::Context>,
    ) -> Result<Option<Self>, MapError> {
        if !target.is_attached() {
            return Ok(None);
        }
        let vector = seed::bootstrap_layer(EDIT_LAYER, settings.seed)?;
        let mut layers = Vec::new();
        if settings.basemap.enabled {
            layers.push(Layer::Tile(TileLayer {
                id: BASEMAP_LAYER,
                url_template: settings.basemap.url_template.clone(),
            }));
        }
        layers.push(Layer::Vector(vector));

        let mut surface = MapSurface::new(MapOptions {
            view: settings.view,
            layers,
        });
        if !surface.mount(target) {
            return Ok(None);
        }

        // A press goes first to interactions with a handle under it, latest
        // first. Vertices of an unselected feature therefore reach modify, and
        // the handles of a selected feature reach transform.
        if settings.modify.enabled {
            let config = ModifyConfig {
                insert_vertex_condition: settings.modify.insert_vertex,
                pixel_tolerance: settings.modify.pixel_tolerance,
                ..ModifyConfig::for_layer(EDIT_LAYER)
            };
            surface.add_interaction(Box::new(ModifyInteraction::new(config)));
        }
        if settings.transform.enabled {
            let config = TransformConfig {
                begin_condition: settings.transform.condition,
                enable_rotated_transform: settings.transform.enable_rotated_transform,
                hit_tolerance: settings.transform.hit_tolerance,
                keep_aspect_ratio: settings.transform.keep_aspect_ratio,
                ..TransformConfig::for_layers(vec![EDIT_LAYER])
            };
            surface.add_interaction(Box::new(TransformInteraction::new(config)));
        }
        let popup = if settings.popup.enabled {
            PopupController::attach(&mut surface, settings.popup.dismiss_on_empty_click)
        } else {
            None
        };
        let tile_layer = surface.layers().iter().find_map(Layer::as_tile);
        let tiles = match (ctx, tile_layer) {
            (Some(ctx), Some(layer)) => {
                Some(TileCache::new(ctx, layer, &settings.basemap.user_agent))
            }
            _ => None,
        };
        log::info!(
            "map mounted with {} interactions and {} overlays",
            surface.interactions().count(),
            surface.overlays().count()
        );
        Ok(Some(Self {
            surface,
            popup,
            tiles,
        }))
    }

    /// Runs queued input and hands clicks to the popup.
    pub fn pump(&mut self) {
        for notice in self.surface.pump() {
            if let Some(popup) = &mut self.popup {
                popup.handle(&mut self.surface, &notice);
            }
            let MapNotice::SingleClick { coordinate, .. } = notice;
            log::trace!("click at {coordinate:?}");
        }
    }

    pub fn unmount(&mut self) {
        self.popup = None;
        self.tiles = None;
        self.surface.unmount();
    }
}
