use eframe::egui;
use std::collections::VecDeque;

use crate::hit::{self, Hit, HitOptions};
use crate::interaction::{Interaction, MapContext, Propagation};
use crate::layer::Layer;
use crate::model::Coordinate;

mod view;

pub use view::View;

/// Pointer travel, in pixels, below which a press/release pair is a click.
pub const CLICK_TOLERANCE: f32 = 4.0;

/// The UI container a surface renders into, in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MountTarget {
    pub rect: egui::Rect,
}

impl MountTarget {
    pub fn new(rect: egui::Rect) -> Self {
        Self { rect }
    }

    /// A target with no usable area has not been laid out yet.
    pub fn is_attached(&self) -> bool {
        self.rect.is_finite() && self.rect.is_positive()
    }
}

/// Pointer input in container pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapEvent {
    PointerDown {
        pixel: egui::Pos2,
        modifiers: egui::Modifiers,
    },
    PointerMove {
        pixel: egui::Pos2,
        modifiers: egui::Modifiers,
    },
    PointerUp {
        pixel: egui::Pos2,
        modifiers: egui::Modifiers,
    },
    /// Zoom by `delta` levels about `pixel`.
    Wheel { pixel: egui::Pos2, delta: f64 },
}

/// Higher-level events produced while pumping the queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapNotice {
    SingleClick {
        pixel: egui::Pos2,
        coordinate: Coordinate,
        modifiers: egui::Modifiers,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayId(u32);

/// A panel anchored to a map coordinate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub position: Option<Coordinate>,
    pub content: String,
    /// Screen offset from the anchor pixel.
    pub offset: egui::Vec2,
}

#[derive(Clone, Copy, Debug, Default)]
struct PointerState {
    down_at: Option<egui::Pos2>,
    last: egui::Pos2,
    travel: f32,
    captured: Option<usize>,
}

pub struct MapOptions {
    pub view: View,
    /// Paint order: first is drawn first.
    pub layers: Vec<Layer>,
}

pub struct MapSurface {
    target: Option<MountTarget>,
    view: View,
    layers: Vec<Layer>,
    interactions: Vec<Box<dyn Interaction>>,
    overlays: Vec<(OverlayId, Overlay)>,
    next_overlay: u32,
    queue: VecDeque<MapEvent>,
    pointer: PointerState,
}

impl MapSurface {
    pub fn new(options: MapOptions) -> Self {
        Self {
            target: None,
            view: options.view,
            layers: options.layers,
            interactions: Vec::new(),
            overlays: Vec::new(),
            next_overlay: 0,
            queue: VecDeque::new(),
            pointer: PointerState::default(),
        }
    }

    /// Binds the surface to `target`. A target that is not laid out yet is
    /// ignored and the surface stays unmounted.
    pub fn mount(&mut self, target: MountTarget) -> bool {
        if !target.is_attached() {
            log::debug!("mount skipped, container not attached: {:?}", target.rect);
            return false;
        }
        if self.target.is_some() {
            self.unmount();
        }
        log::info!(
            "map mounted at {:?} ({} layers)",
            target.rect,
            self.layers.len()
        );
        self.target = Some(target);
        true
    }

    /// Releases the target and everything attached to it. No-op when already unmounted.
    pub fn unmount(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };
        log::info!(
            "map unmounted from {:?}, releasing {} interactions and {} overlays",
            target.rect,
            self.interactions.len(),
            self.overlays.len()
        );
        self.interactions.clear();
        self.overlays.clear();
        self.queue.clear();
        self.pointer = PointerState::default();
    }

    pub fn is_mounted(&self) -> bool {
        self.target.is_some()
    }

    /// Follows the container when it is resized or moved.
    pub fn update_target(&mut self, rect: egui::Rect) {
        if let Some(target) = &mut self.target {
            if rect.is_finite() && rect.is_positive() {
                target.rect = rect;
            }
        }
    }

    pub fn size(&self) -> egui::Vec2 {
        self.target.map_or(egui::Vec2::ZERO, |t| t.rect.size())
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// True while any interaction is in the middle of a gesture.
    pub fn is_editing(&self) -> bool {
        self.interactions.iter().any(|i| i.is_active())
    }

    pub fn interactions(&self) -> impl Iterator<Item = &dyn Interaction> {
        self.interactions.iter().map(|i| i.as_ref())
    }

    /// Attaches an interaction to a mounted surface. Returns `false` when unmounted.
    pub fn add_interaction(&mut self, interaction: Box<dyn Interaction>) -> bool {
        if !self.is_mounted() {
            log::warn!("{} not attached: map is not mounted", interaction.name());
            return false;
        }
        log::debug!("attached {}", interaction.name());
        self.interactions.push(interaction);
        true
    }

    pub fn add_overlay(&mut self, overlay: Overlay) -> Option<OverlayId> {
        if !self.is_mounted() {
            return None;
        }
        let id = OverlayId(self.next_overlay);
        self.next_overlay += 1;
        self.overlays.push((id, overlay));
        Some(id)
    }

    pub fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.overlays.iter_mut().find(|(i, _)| *i == id).map(|(_, o)| o)
    }

    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.iter().map(|(_, o)| o)
    }

    /// Interactions and overlays currently holding on to the surface.
    pub fn listener_count(&self) -> usize {
        self.interactions.len() + self.overlays.len()
    }

    pub fn features_at_pixel(&self, pixel: egui::Pos2, options: &HitOptions) -> Vec<Hit> {
        hit::features_at_pixel(&self.layers, &self.view, self.size(), pixel, options)
    }

    pub fn push_event(&mut self, event: MapEvent) {
        if self.is_mounted() {
            self.queue.push_back(event);
        }
    }

    /// Processes queued input in order and returns what happened.
    pub fn pump(&mut self) -> Vec<MapNotice> {
        let mut notices = Vec::new();
        while let Some(event) = self.queue.pop_front() {
            if let Some(notice) = self.dispatch(event) {
                notices.push(notice);
            }
        }
        notices
    }

    fn dispatch(&mut self, event: MapEvent) -> Option<MapNotice> {
        let size = self.size();
        match event {
            MapEvent::PointerDown { pixel, modifiers } => {
                self.pointer = PointerState {
                    down_at: Some(pixel),
                    last: pixel,
                    travel: 0.0,
                    captured: None,
                };
                let mut ctx = MapContext {
                    layers: &mut self.layers,
                    view: &self.view,
                    size,
                };
                // Interactions with a handle under the pointer go first, then the
                // rest. Within each group the most recently added one leads.
                let (handles, rest): (Vec<usize>, Vec<usize>) = (0..self.interactions.len())
                    .rev()
                    .partition(|&i| self.interactions[i].offers_handle(pixel, modifiers, &ctx));
                for idx in handles.into_iter().chain(rest) {
                    if self.interactions[idx].handle_event(&event, &mut ctx) == Propagation::Stop {
                        log::trace!("pointer captured by {}", self.interactions[idx].name());
                        self.pointer.captured = Some(idx);
                        break;
                    }
                }
                None
            }
            MapEvent::PointerMove { pixel, .. } => {
                let Some(down) = self.pointer.down_at else {
                    let mut ctx = MapContext {
                        layers: &mut self.layers,
                        view: &self.view,
                        size,
                    };
                    for interaction in self.interactions.iter_mut().rev() {
                        if interaction.handle_event(&event, &mut ctx) == Propagation::Stop {
                            break;
                        }
                    }
                    return None;
                };
                self.pointer.travel = self.pointer.travel.max((pixel - down).length());
                match self.pointer.captured {
                    Some(idx) => {
                        let mut ctx = MapContext {
                            layers: &mut self.layers,
                            view: &self.view,
                            size,
                        };
                        if let Some(interaction) = self.interactions.get_mut(idx) {
                            interaction.handle_event(&event, &mut ctx);
                        }
                    }
                    None => self.view.pan_by_pixels(pixel - self.pointer.last),
                }
                self.pointer.last = pixel;
                None
            }
            MapEvent::PointerUp { pixel, modifiers } => {
                let pointer = std::mem::take(&mut self.pointer);
                let down = pointer.down_at?;
                if let Some(idx) = pointer.captured {
                    let mut ctx = MapContext {
                        layers: &mut self.layers,
                        view: &self.view,
                        size,
                    };
                    if let Some(interaction) = self.interactions.get_mut(idx) {
                        interaction.handle_event(&event, &mut ctx);
                    }
                }
                let travel = pointer.travel.max((pixel - down).length());
                (travel < CLICK_TOLERANCE).then(|| MapNotice::SingleClick {
                    pixel,
                    coordinate: self.view.pixel_to_coordinate(pixel, size),
                    modifiers,
                })
            }
            MapEvent::Wheel { pixel, delta } => {
                self.view.zoom_about_pixel(pixel, size, delta);
                None
            }
        }
    }
}

impl Drop for MapSurface {
    fn drop(&mut self) {
        self.unmount();
    }
}
