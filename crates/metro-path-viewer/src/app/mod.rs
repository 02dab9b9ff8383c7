//! Application module
//!
//! This module provides the main application structure:
//! - Full-screen map view with the current itinerary drawn on top
//! - Toggleable sidebar with tabs (Route, Lines, Stations and Settings)
//! - A popup on the selected marker to use it as origin or destination

mod plugin;
pub(crate) mod settings;
mod state;
mod ui_panels;

use crate::app::plugin::OverlayPlugin;
use crate::app::settings::Settings;
use crate::app::state::{AppState, TilesProvider};
use eframe::egui;
use metro_path_lib::{ColorResolver, RouteBackend};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use walkers::{
    HttpTiles, Map, MapMemory, TileId,
    sources::{Attribution, OpenStreetMap, TileSource},
};

/// Where the map opens before any route is shown
const PARIS_CENTER: (f64, f64) = (48.8566, 2.3522);
const INITIAL_ZOOM: f64 = 12.0;

/// Light CARTO basemap, which keeps line colors readable
pub struct CartoPositron;

impl TileSource for CartoPositron {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://basemaps.cartocdn.com/light_all/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors © CARTO",
            url: "https://carto.com/attributions",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        20
    }
}

/// Persisted UI preferences (no query or backend data)
#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct PersistedSettings {
    line_width: f32,
    sidebar_open: bool,
    tiles_provider: String,
}

impl PersistedSettings {
    fn capture(state: &AppState) -> Self {
        Self {
            line_width: state.ui_settings.line_width,
            sidebar_open: state.ui_settings.sidebar_open,
            tiles_provider: format!("{:?}", state.ui_settings.tiles_provider),
        }
    }

    fn apply(self, state: &mut AppState) {
        state.ui_settings.line_width = self.line_width;
        state.ui_settings.sidebar_open = self.sidebar_open;
        if let Ok(provider) = self.tiles_provider.parse::<TilesProvider>() {
            state.ui_settings.tiles_provider = provider;
        }
    }
}

/// Main application structure
pub struct MetroPathApp {
    /// Application state (form, itinerary, overlay, requests)
    state: AppState,

    /// Map tiles provider (OpenStreetMap)
    tiles_osm: HttpTiles,

    /// Map tiles provider (CARTO Positron)
    tiles_carto: HttpTiles,

    /// Map state (camera position, zoom, etc.)
    map_memory: MapMemory,

    /// Show help overlay
    show_help: bool,
}

impl MetroPathApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        backend: Arc<dyn RouteBackend>,
        colors: ColorResolver,
        runtime: Handle,
    ) -> Self {
        let mut state = AppState::new(&settings, backend, colors, runtime);

        if settings.ignore_persisted {
            tracing::info!("Ignoring persisted state (--ignore-persisted flag)");
        } else if let Some(storage) = cc.storage {
            Self::restore_persisted_settings(storage, &mut state);
        }

        state.request_catalogue();

        let tiles_osm = HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone());
        let tiles_carto = HttpTiles::new(CartoPositron, cc.egui_ctx.clone());

        let mut map_memory = MapMemory::default();
        let _ = map_memory.set_zoom(INITIAL_ZOOM);

        Self {
            state,
            tiles_osm,
            tiles_carto,
            map_memory,
            show_help: false,
        }
    }

    /// Apply persisted settings from storage, if any
    fn restore_persisted_settings(storage: &dyn eframe::Storage, state: &mut AppState) {
        if let Some(json) = storage.get_string("persisted_settings")
            && !json.is_empty()
            && let Ok(settings) = serde_json::from_str::<PersistedSettings>(&json)
        {
            settings.apply(state);
            tracing::info!("Restored persisted settings");
            return;
        }

        tracing::info!("No persisted settings found, starting fresh");
    }

    /// Fit the map view to the bounding box of the current itinerary
    fn fit_to_bounds(&mut self) {
        let Some(bounds) = self
            .state
            .itinerary
            .as_ref()
            .and_then(|itinerary| itinerary.bounds())
        else {
            return;
        };

        let center = bounds.center();
        let max_span = bounds.width().max(bounds.height());

        let zoom = if max_span > 0.0 {
            let zoom_estimate = (4.0 * 360.0 / max_span).log2();
            (zoom_estimate - 0.5).clamp(1.0, 18.0)
        } else {
            15.0
        };

        self.map_memory
            .center_at(walkers::lat_lon(center.y, center.x));
        let _ = self.map_memory.set_zoom(zoom);

        tracing::trace!(
            "Centered on itinerary at ({:.4}, {:.4}), zoom {:.1}",
            center.y,
            center.x,
            zoom
        );
    }
}

#[profiling::all_functions]
impl eframe::App for MetroPathApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle keyboard shortcuts
        ctx.input(|i| {
            if i.key_pressed(egui::Key::F1) {
                self.show_help = !self.show_help;
            }
            if i.key_pressed(egui::Key::Escape) {
                self.show_help = false;
            }
        });

        // Apply backend answers, keep polling while requests are in flight
        if self.state.process_replies() {
            ctx.request_repaint();
        }
        if self.state.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        if self.state.pending_fit_bounds {
            self.state.pending_fit_bounds = false;
            self.fit_to_bounds();
        }

        if self.show_help {
            ui_panels::help_overlay(ctx, &mut self.show_help);
        }

        ui_panels::render_sidebar(ctx, &mut self.state);

        let surface = self.state.surface.clone();
        let line_width = self.state.ui_settings.line_width;
        let tiles_provider = self.state.ui_settings.tiles_provider;

        // Central panel: Map view (full screen)
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let tiles: &mut HttpTiles = match tiles_provider {
                    TilesProvider::OpenStreetMap => &mut self.tiles_osm,
                    TilesProvider::CartoPositron => &mut self.tiles_carto,
                };

                let map = Map::new(
                    Some(tiles),
                    &mut self.map_memory,
                    walkers::lat_lon(PARIS_CENTER.0, PARIS_CENTER.1),
                )
                .with_plugin(OverlayPlugin::new(surface, line_width));

                ui.add(map);

                ui_panels::sidebar_toggle_button(ui, &mut self.state);

                let painter = ui.painter();
                let screen_rect = ui.max_rect();
                painter.text(
                    screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
                    egui::Align2::CENTER_BOTTOM,
                    tiles_provider.attribution(),
                    egui::FontId::proportional(10.0),
                    egui::Color32::from_black_alpha(180),
                );
            });

        // Clicks recorded by the plugin this frame
        if self.state.handle_map_events() {
            ctx.request_repaint();
        }

        ui_panels::marker_popup(ctx, &mut self.state);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings::capture(&self.state);

        if let Ok(json) = serde_json::to_string(&settings) {
            storage.set_string("persisted_settings", json);
            tracing::debug!("Saved settings on exit");
        }
    }
}
