use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::interaction::Condition;
use crate::map::View;
use crate::seed::SeedVariant;
use crate::tiles::OSM_URL_TEMPLATE;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct BasemapSettings {
    pub enabled: bool,
    pub url_template: String,
    pub user_agent: String,
}

impl Default for BasemapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url_template: OSM_URL_TEMPLATE.to_string(),
            user_agent: concat!("mapedit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TransformSettings {
    pub enabled: bool,
    /// Gate for starting a translate, scale or rotate gesture.
    pub condition: Condition,
    pub enable_rotated_transform: bool,
    pub hit_tolerance: f64,
    pub keep_aspect_ratio: Condition,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            condition: Condition::Always,
            enable_rotated_transform: true,
            hit_tolerance: 2.0,
            keep_aspect_ratio: Condition::ShiftKey,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ModifySettings {
    pub enabled: bool,
    pub insert_vertex: Condition,
    pub pixel_tolerance: f64,
}

impl Default for ModifySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            insert_vertex: Condition::Always,
            pixel_tolerance: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PopupSettings {
    pub enabled: bool,
    /// Hide the popup when a click hits nothing.
    pub dismiss_on_empty_click: bool,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dismiss_on_empty_click: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppSettings {
    pub log_level: String,
    pub seed: SeedVariant,
    pub view: View,
    pub basemap: BasemapSettings,
    pub transform: TransformSettings,
    pub modify: ModifySettings,
    pub popup: PopupSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            seed: SeedVariant::default(),
            view: View::default(),
            basemap: BasemapSettings::default(),
            transform: TransformSettings::default(),
            modify: ModifySettings::default(),
            popup: PopupSettings::default(),
        }
    }
}

pub(crate) fn config_path() -> Option<String> {
    if let Some(home) = std::env::var_os("HOME") {
        let path = std::path::PathBuf::from(home).join(".config").join("mapedit.toml");
        if path.exists() {
            return Some(path.display().to_string());
        }
    }
    if std::path::Path::new("settings.toml").exists() {
        return Some("settings.toml".to_string());
    }
    if std::path::Path::new("settings.json").exists() {
        return Some("settings.json".to_string());
    }
    None
}

fn parse_settings(path: &str, text: &str) -> Result<AppSettings, MapError> {
    if path.ends_with(".toml") {
        match toml::from_str::<AppSettings>(text) {
            Ok(settings) => Ok(settings),
            Err(err) => serde_json::from_str::<AppSettings>(text).map_err(|_| err.into()),
        }
    } else {
        match serde_json::from_str::<AppSettings>(text) {
            Ok(settings) => Ok(settings),
            Err(err) => toml::from_str::<AppSettings>(text).map_err(|_| err.into()),
        }
    }
}

pub(crate) fn load_settings(path: &str) -> Result<AppSettings, MapError> {
    let text = std::fs::read_to_string(path).map_err(|source| MapError::SettingsIo {
        path: path.to_string(),
        source,
    })?;
    parse_settings(path, &text)
}

pub(crate) fn save_settings(path: &str, settings: &AppSettings) -> Result<(), MapError> {
    let text = if path.ends_with(".toml") {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text).map_err(|source| MapError::SettingsIo {
        path: path.to_string(),
        source,
    })
}

/// Settings from the first config file found, or defaults. The error, if
/// any, is handed back so it can be logged once logging is up.
pub(crate) fn load_or_default() -> (String, AppSettings, Option<MapError>) {
    let Some(path) = config_path() else {
        return ("settings.toml".to_string(), AppSettings::default(), None);
    };
    match load_settings(&path) {
        Ok(settings) => (path, settings, None),
        Err(err) => (path, AppSettings::default(), Some(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let settings = parse_settings(
            "settings.toml",
            r#"
log_level = "debug"

[transform]
condition = "shift_key"

[view]
center = { x = 1000.0, y = -2000.0 }
zoom = 5.0
"#,
        )
        .unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.transform.condition, Condition::ShiftKey);
        assert!(settings.transform.enable_rotated_transform);
        assert_eq!(settings.view.center, Coordinate::from((1000.0, -2000.0)));
        assert_eq!(settings.modify, ModifySettings::default());
        assert!(!settings.popup.dismiss_on_empty_click);
    }

    #[test]
    fn json_in_a_toml_file_still_loads() {
        let json = r#"{ "seed": "extent", "popup": { "dismiss_on_empty_click": true } }"#;
        let settings = parse_settings("settings.toml", json).unwrap();
        assert_eq!(settings.seed, SeedVariant::Extent);
        assert!(settings.popup.dismiss_on_empty_click);
    }

    #[test]
    fn garbage_is_reported() {
        assert!(matches!(
            parse_settings("settings.toml", "log_level = ["),
            Err(MapError::SettingsToml(_))
        ));
        assert!(matches!(
            parse_settings("settings.json", "{ nope"),
            Err(MapError::SettingsJson(_))
        ));
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = std::env::temp_dir().join(format!("mapedit-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut settings = AppSettings::default();
        settings.modify.insert_vertex = Condition::Never;
        settings.view.zoom = 4.5;
        for name in ["settings.toml", "settings.json"] {
            let path = dir.join(name).display().to_string();
            save_settings(&path, &settings).unwrap();
            assert_eq!(load_settings(&path).unwrap(), settings);
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_settings("/nonexistent/mapedit.toml"),
            Err(MapError::SettingsIo { .. })
        ));
    }
}
