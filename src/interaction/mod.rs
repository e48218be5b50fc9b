use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::layer::Layer;
use crate::map::{MapEvent, View};

mod modify;
mod transform;

pub use modify::{ModifyConfig, ModifyInteraction};
pub use transform::{TransformConfig, TransformInteraction};

/// What an interaction sees of the map while handling one event.
pub struct MapContext<'a> {
    pub layers: &'a mut [Layer],
    pub view: &'a View,
    pub size: egui::Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    /// The event is consumed. On a press this captures the pointer until release.
    Stop,
}

/// A pointer-gesture handler attached to a map surface.
pub trait Interaction {
    fn name(&self) -> &'static str;

    fn handle_event(&mut self, event: &MapEvent, ctx: &mut MapContext<'_>) -> Propagation;

    /// Whether a press at `pixel` would grab a handle this interaction offers,
    /// such as a resize knob or a vertex. Presses go to handle owners before
    /// interactions that would only hit a feature body.
    fn offers_handle(
        &self,
        _pixel: egui::Pos2,
        _modifiers: egui::Modifiers,
        _ctx: &MapContext<'_>,
    ) -> bool {
        false
    }

    /// True while a gesture started by this interaction is in progress.
    fn is_active(&self) -> bool {
        false
    }

    /// Paints handles or other feedback on top of the layers.
    fn draw(
        &self,
        _painter: &egui::Painter,
        _origin: egui::Pos2,
        _layers: &[Layer],
        _view: &View,
        _size: egui::Vec2,
    ) {
    }
}

/// Gate on the pointer modifiers of an event.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    Never,
    ShiftKey,
    /// Ctrl, or Cmd on macOS.
    PlatformModifierKey,
    AltKey,
}

impl Condition {
    pub fn holds(self, modifiers: egui::Modifiers) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::ShiftKey => modifiers.shift,
            Condition::PlatformModifierKey => modifiers.command,
            Condition::AltKey => modifiers.alt,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::Always => "Always",
            Condition::Never => "Never",
            Condition::ShiftKey => "Shift held",
            Condition::PlatformModifierKey => "Ctrl/Cmd held",
            Condition::AltKey => "Alt held",
        }
    }

    pub const ALL: [Condition; 5] = [
        Condition::Always,
        Condition::Never,
        Condition::ShiftKey,
        Condition::PlatformModifierKey,
        Condition::AltKey,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_follow_modifiers() {
        let none = egui::Modifiers::NONE;
        assert!(Condition::Always.holds(none));
        assert!(!Condition::Never.holds(egui::Modifiers::SHIFT));
        assert!(!Condition::ShiftKey.holds(none));
        assert!(Condition::ShiftKey.holds(egui::Modifiers::SHIFT));
        assert!(Condition::AltKey.holds(egui::Modifiers::ALT));
        assert!(Condition::PlatformModifierKey.holds(egui::Modifiers::COMMAND));
    }

    #[test]
    fn condition_reads_from_settings_text() {
        let c: Condition = serde_json::from_str("\"shift_key\"").unwrap();
        assert_eq!(c, Condition::ShiftKey);
    }
}
