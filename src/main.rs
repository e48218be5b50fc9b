mod app;
mod error;
mod hit;
mod interaction;
mod layer;
mod map;
mod model;
mod popup;
mod seed;
mod style;
mod tiles;

use eframe::egui;

fn main() -> eframe::Result<()> {
    let (settings_path, settings, load_error) = app::settings::load_or_default();

    // RUST_LOG takes precedence over the configured level.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.as_str()),
    )
    .init();

    log::info!("Starting mapedit with settings from {settings_path}");
    if let Some(err) = load_error {
        log::warn!("{err}, using defaults");
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Map editing demo")
            .with_inner_size([1200.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Map editing demo",
        native_options,
        Box::new(|cc| Ok(Box::new(app::MapApp::new(cc, settings_path, settings)))),
    )
}
