//! Logging initialization

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global `tracing` subscriber
///
/// If RUST_LOG is not set, a default suited to the build profile is used.
pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_err() {
        let default = if cfg!(debug_assertions) {
            "debug,eframe::native=warn,walkers=info,egui::context=warn,reqwest::connect=info,hyper_util=info"
        } else {
            "info,eframe::native=warn,egui::context=warn"
        };
        // Safety: single-threaded at startup
        unsafe {
            std::env::set_var("RUST_LOG", default);
        }
    }

    let fmt_layer = fmt::layer().with_filter(EnvFilter::from_default_env());
    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        tracing::warn!("A tracing subscriber was already installed");
    }

    tracing::info!(
        "{} {} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}
