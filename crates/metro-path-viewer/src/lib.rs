//! Metro Path Viewer - Application Library
//!
//! Desktop front end over `metro-path-lib`: a search form, the grouped
//! itinerary with clock times, line and station information, and a map that
//! draws the current path on top of OpenStreetMap tiles.

mod app;
mod logging;

pub use app::MetroPathApp;
pub use app::settings::Settings;
pub use logging::setup_logging;

use metro_path_lib::{ColorResolver, MetroPathError, RouteBackend, SnapshotBackend};
use std::sync::Arc;

/// Errors that stop the viewer from starting
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error(transparent)]
    Data(#[from] MetroPathError),

    #[error("UI error: {0}")]
    Ui(#[from] eframe::Error),
}

pub const APP_NAME: &str = "Metro Path Viewer";

/// Parse the command line, start the runtime and run the UI until closed
pub fn run() -> Result<(), ViewerError> {
    setup_logging();

    let settings = Settings::from_cli();

    let backend: Arc<dyn RouteBackend> = match &settings.snapshot {
        Some(path) => Arc::new(SnapshotBackend::from_json_file(path)?),
        None => {
            tracing::warn!("No snapshot given, starting with an empty backend");
            Arc::new(SnapshotBackend::default())
        }
    };
    let colors = match &settings.line_colors {
        Some(path) => ColorResolver::from_json_file(path)?,
        None => ColorResolver::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("metro-path-worker")
        .enable_all()
        .build()?;
    let _guard = runtime.enter();
    let handle = runtime.handle().clone();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(APP_NAME),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(MetroPathApp::new(
                cc, settings, backend, colors, handle,
            )))
        }),
    )?;

    Ok(())
}
