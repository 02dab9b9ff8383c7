//! UI panels for the application
//!
//! This module provides the sidebar (search form, itinerary, line and
//! station information, settings), the marker popup and the help overlay.

use crate::app::plugin::{lock_surface, path_color};
use crate::app::state::{AppState, RequestKind, SidebarTab, TilesProvider};
use egui::{Color32, RichText, Ui};
use metro_path_lib::timing::{format_clock, number_to_schedule};
use metro_path_lib::{ColorResolver, Objective, Stop, TransportMode, filter_stations};

/// Suggestions shown under a station field
const MAX_SUGGESTIONS: usize = 6;
/// Departures shown per terminus in the line timetable
const MAX_DEPARTURES: usize = 12;

/// Render the sidebar toggle button (overlaid on top-right of map)
pub fn sidebar_toggle_button(ui: &mut Ui, state: &mut AppState) {
    let button_size = egui::vec2(40.0, 40.0);
    let margin = 10.0;

    let rect = ui.max_rect();
    let button_pos = rect.right_top() + egui::vec2(-button_size.x - margin, margin);
    let button_rect = egui::Rect::from_min_size(button_pos, button_size);

    let response = ui.allocate_rect(button_rect, egui::Sense::click());

    if response.clicked() {
        state.ui_settings.sidebar_open = !state.ui_settings.sidebar_open;
    }

    let bg_color = if response.hovered() {
        ui.visuals().widgets.hovered.bg_fill
    } else {
        ui.visuals().widgets.inactive.bg_fill
    };

    ui.painter().rect_filled(button_rect, 5.0, bg_color);

    let icon = if state.ui_settings.sidebar_open {
        "✕"
    } else {
        "☰"
    };

    ui.painter().text(
        button_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(20.0),
        ui.visuals().text_color(),
    );
}

/// Render the main sidebar (responsive: side on landscape, bottom on portrait)
pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    if !state.ui_settings.sidebar_open {
        return;
    }

    let screen_size = ctx.viewport_rect().size();
    if screen_size.y > screen_size.x {
        egui::TopBottomPanel::bottom("main_sidebar")
            .default_height(300.0)
            .min_height(180.0)
            .max_height(ctx.viewport_rect().height() * 0.6)
            .resizable(true)
            .show(ctx, |ui| render_sidebar_content(ui, state));
    } else {
        egui::SidePanel::left("main_sidebar")
            .default_width(340.0)
            .min_width(280.0)
            .max_width(480.0)
            .resizable(true)
            .show(ctx, |ui| render_sidebar_content(ui, state));
    }
}

fn render_sidebar_content(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        let tab = &mut state.ui_settings.active_tab;
        ui.selectable_value(tab, SidebarTab::Route, "🚇 Route");
        ui.selectable_value(tab, SidebarTab::Lines, "〰 Lines");
        ui.selectable_value(tab, SidebarTab::Stations, "📍 Stations");
        ui.selectable_value(tab, SidebarTab::Settings, "⚙ Settings");
    });

    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| match state.ui_settings.active_tab {
            SidebarTab::Route => render_route_tab(ui, state),
            SidebarTab::Lines => render_lines_tab(ui, state),
            SidebarTab::Stations => render_stations_tab(ui, state),
            SidebarTab::Settings => render_settings_tab(ui, state),
        });
}

/// Small rounded label in the color of a line
fn line_chip(ui: &mut Ui, colors: &ColorResolver, line: Option<&str>) {
    let (text, fill) = match line {
        Some(line) => (line.to_string(), path_color(colors.lookup(Some(line)))),
        None => ("🚶".to_string(), Color32::from_gray(120)),
    };
    egui::Frame::new()
        .fill(fill)
        .corner_radius(4.0)
        .inner_margin(egui::Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.label(RichText::new(text).strong().color(Color32::WHITE));
        });
}

/// Text field for a station name with prefix suggestions
fn station_field(ui: &mut Ui, label: &str, value: &mut String, stations: &[Stop]) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(
            egui::TextEdit::singleline(value)
                .hint_text("Station name")
                .desired_width(f32::INFINITY),
        );
    });

    let exact = stations.iter().any(|stop| stop.name == *value);
    if value.trim().is_empty() || exact || value.starts_with('(') {
        return;
    }

    let mut picked = None;
    ui.indent(label, |ui| {
        for stop in filter_stations(stations, value).into_iter().take(MAX_SUGGESTIONS) {
            if ui.small_button(&stop.name).clicked() {
                picked = Some(stop.name.clone());
            }
        }
    });
    if let Some(name) = picked {
        *value = name;
    }
}

/// Render the Route tab: search form and itinerary
fn render_route_tab(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("🔎 Search").strong());
    ui.add_space(6.0);

    station_field(ui, "From:", &mut state.form.from, &state.stations);
    station_field(ui, "To:", &mut state.form.to, &state.stations);

    ui.horizontal(|ui| {
        ui.label("Departure:");
        ui.add(
            egui::TextEdit::singleline(&mut state.form.departure)
                .hint_text("now, or 06:44 PM")
                .desired_width(120.0),
        );
    });

    egui::Grid::new("search_options_grid")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Optimize:");
            egui::ComboBox::from_id_salt("objective")
                .selected_text(state.form.objective.name())
                .show_ui(ui, |ui| {
                    for objective in Objective::all() {
                        ui.selectable_value(&mut state.form.objective, *objective, objective.name());
                    }
                });
            ui.end_row();

            ui.label("Travel by:");
            egui::ComboBox::from_id_salt("mode")
                .selected_text(state.form.mode.name())
                .show_ui(ui, |ui| {
                    for mode in TransportMode::all() {
                        ui.selectable_value(&mut state.form.mode, *mode, mode.name());
                    }
                });
            ui.end_row();
        });

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        let ready = !state.form.from.trim().is_empty() && !state.form.to.trim().is_empty();
        if ui.add_enabled(ready, egui::Button::new("🔎 Search")).clicked() {
            state.search();
        }
        if ui.button("⇅ Swap").clicked() {
            state.swap_endpoints();
        }
        if ui.button("🗑 Clear").clicked() {
            state.clear_itinerary();
        }
        if ui.button("🎯 Fit").clicked() {
            state.pending_fit_bounds = true;
        }
    });

    if state.is_pending(RequestKind::Path) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(RichText::new("Computing route...").color(ui.visuals().warn_fg_color));
        });
    }

    render_errors(ui, state);

    ui.add_space(8.0);
    ui.separator();
    render_itinerary(ui, state);
}

fn render_errors(ui: &mut Ui, state: &mut AppState) {
    if state.errors.is_empty() {
        return;
    }

    ui.add_space(8.0);
    ui.label(
        RichText::new(format!("⚠ Errors ({})", state.errors.len()))
            .strong()
            .color(Color32::RED),
    );
    egui::ScrollArea::vertical()
        .id_salt("errors_scroll")
        .max_height(100.0)
        .show(ui, |ui| {
            for error in &state.errors {
                ui.label(RichText::new(format!("• {error}")).small().color(Color32::RED));
            }
        });
    if ui.button("Clear Errors").clicked() {
        state.errors.clear();
    }
}

fn render_itinerary(ui: &mut Ui, state: &AppState) {
    let Some(itinerary) = &state.itinerary else {
        ui.label(
            RichText::new("Pick two stations, or right-click the map to drop a custom point")
                .small()
                .weak(),
        );
        return;
    };

    let annotator = itinerary.annotator();
    ui.label(
        RichText::new(format!(
            "🗺 {} → {}",
            itinerary.query.start, itinerary.query.end
        ))
        .strong(),
    );

    egui::Grid::new("itinerary_summary_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Departure:");
            ui.label(RichText::new(format_clock(annotator.departure())).strong());
            ui.end_row();

            if let Some(arrival) = annotator.end_time_of(itinerary.segments.len().saturating_sub(1)) {
                ui.label("Arrival:");
                ui.label(RichText::new(arrival).strong());
                ui.end_row();
            }

            if let Some(duration) = annotator.duration() {
                ui.label("Duration:");
                ui.label(RichText::new(duration.to_string()).strong());
                ui.end_row();
            }
        });

    if itinerary.segments.is_empty() {
        ui.label(RichText::new("Already there").weak());
        return;
    }

    ui.add_space(8.0);
    let colors = state.overlay.colors();
    for (index, leg) in annotator.legs().iter().enumerate() {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                line_chip(ui, colors, leg.segment.line_id());
                match leg.segment.terminus() {
                    Some(terminus) => ui.label(format!("towards {terminus}")),
                    None => ui.label("Walk"),
                };
            });
            ui.label(format!(
                "{} {} → {} {}",
                leg.departs,
                leg.segment.departure_stop().name,
                leg.arrives,
                leg.segment.arrival_stop().name
            ));

            let stops = leg.segment.stop_names();
            egui::CollapsingHeader::new(format!("{} stops", stops.len()))
                .id_salt(("leg_stops", index))
                .default_open(false)
                .show(ui, |ui| {
                    for stop in stops {
                        ui.label(RichText::new(format!("• {stop}")).small());
                    }
                });
        });
    }
}

/// Render the Lines tab: line list, stations and timetables
fn render_lines_tab(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("〰 Lines").strong());
    ui.add_space(6.0);

    if state.lines.is_empty() {
        if state.is_pending(RequestKind::Lines) {
            ui.spinner();
        } else {
            ui.label(RichText::new("No lines loaded").weak());
        }
        return;
    }

    let mut line_to_load = None;
    ui.horizontal_wrapped(|ui| {
        for line in &state.lines {
            let selected = state
                .selected_line
                .as_ref()
                .is_some_and(|selected| selected.name == line.name);
            let color = path_color(state.overlay.colors().lookup(Some(&line.name)));
            let text = RichText::new(&line.name).strong().color(color);
            if ui.selectable_label(selected, text).clicked() {
                line_to_load = Some(line.name.clone());
            }
        }
    });
    if let Some(name) = line_to_load {
        state.request_line(&name);
    }

    if state.is_pending(RequestKind::Line) {
        ui.spinner();
    }

    let Some(line) = &state.selected_line else {
        return;
    };

    ui.add_space(8.0);
    ui.separator();

    let mut schedule_to_load = None;
    if let Some(stations) = &line.stations {
        ui.label(RichText::new(format!("📍 Stations ({})", stations.len())).strong());
        for station in stations {
            if ui.link(&station.name).clicked() {
                schedule_to_load = Some((line.name.clone(), station.name.clone()));
            }
        }
    }

    if let Some(schedules) = &line.schedules {
        ui.add_space(8.0);
        ui.label(RichText::new("🕑 Departures").strong());
        for schedule in schedules {
            let mut times = schedule.schedules.clone();
            times.sort_unstable();
            let shown: Vec<String> = times
                .iter()
                .take(MAX_DEPARTURES)
                .map(|seconds| number_to_schedule(*seconds))
                .collect();
            ui.label(format!("→ {}", schedule.terminus));
            ui.label(RichText::new(shown.join("  ")).small().monospace());
        }
    }

    if let Some(schedule) = &state.station_schedule {
        ui.add_space(8.0);
        ui.label(
            RichText::new(format!(
                "🕑 Line {} at {}",
                schedule.metro_line, schedule.station
            ))
            .strong(),
        );
        let shown: Vec<String> = schedule
            .schedules
            .iter()
            .map(|seconds| number_to_schedule(*seconds))
            .collect();
        ui.label(RichText::new(shown.join("  ")).small().monospace());
    }

    if let Some((line, station)) = schedule_to_load {
        state.request_schedule(&line, &station);
    }
}

/// Render the Stations tab: correspondences with their lines
fn render_stations_tab(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("📍 Correspondences").strong());
    ui.add_space(6.0);

    if state.correspondences.is_empty() {
        ui.label(RichText::new("No correspondences loaded").weak());
        return;
    }

    enum Pick {
        From(String),
        To(String),
    }
    let mut pick = None;

    let colors = state.overlay.colors();
    egui::Grid::new("correspondences_grid")
        .num_columns(3)
        .striped(true)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            for correspondence in &state.correspondences {
                ui.label(&correspondence.station.name);
                ui.horizontal_wrapped(|ui| {
                    for line in &correspondence.metro_lines {
                        line_chip(ui, colors, Some(line));
                    }
                });
                ui.horizontal(|ui| {
                    let name = &correspondence.station.name;
                    if ui.small_button("From").clicked() {
                        pick = Some(Pick::From(name.clone()));
                    }
                    if ui.small_button("To").clicked() {
                        pick = Some(Pick::To(name.clone()));
                    }
                });
                ui.end_row();
            }
        });

    match pick {
        Some(Pick::From(name)) => {
            state.form.from = name;
            state.ui_settings.active_tab = SidebarTab::Route;
        }
        Some(Pick::To(name)) => {
            state.form.to = name;
            state.ui_settings.active_tab = SidebarTab::Route;
        }
        None => {}
    }
}

/// Render the Settings tab
fn render_settings_tab(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("🎨 Path Appearance").strong());
    ui.add_space(6.0);

    egui::Grid::new("appearance_grid")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Line Width:");
            ui.add(
                egui::Slider::new(&mut state.ui_settings.line_width, 1.0..=10.0)
                    .suffix(" px")
                    .step_by(0.5),
            );
            ui.end_row();
        });

    ui.add_space(4.0);
    ui.label(
        RichText::new(format!(
            "{} line colors known; walks use the default stroke",
            state.overlay.colors().len()
        ))
        .small()
        .weak(),
    );

    ui.add_space(12.0);
    ui.separator();
    ui.add_space(8.0);

    ui.label(RichText::new("🗺 Map Tiles").strong());
    ui.add_space(6.0);

    for provider in TilesProvider::all() {
        let selected = state.ui_settings.tiles_provider == *provider;
        if ui.selectable_label(selected, provider.name()).clicked() {
            state.ui_settings.tiles_provider = *provider;
        }
    }

    ui.add_space(12.0);
    ui.separator();
    ui.add_space(8.0);

    ui.label(RichText::new("ℹ About").strong());
    ui.add_space(4.0);
    ui.label(RichText::new(crate::APP_NAME).small());
    ui.label(
        RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
            .small()
            .weak(),
    );
    ui.label(RichText::new("  F1 - Toggle help").small().weak());
}

/// Popup anchored to the selected marker
pub fn marker_popup(ctx: &egui::Context, state: &mut AppState) {
    let Some(anchor) = lock_surface(&state.surface).popup_anchor() else {
        return;
    };
    let Some(marker) = state.overlay.selected() else {
        return;
    };

    let title = marker.title().to_string();
    let deletable = marker.is_deletable();
    let lines: Vec<String> = marker
        .source_station()
        .map(|station| station.metro_lines.clone())
        .unwrap_or_default();

    enum Action {
        ComeFrom,
        GoTo,
        Remove,
        Close,
    }
    let mut action = None;

    let colors = state.overlay.colors();
    egui::Window::new(title.as_str())
        .id(egui::Id::new("marker_popup"))
        .fixed_pos(anchor + egui::vec2(12.0, -12.0))
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            if !lines.is_empty() {
                ui.horizontal_wrapped(|ui| {
                    for line in &lines {
                        line_chip(ui, colors, Some(line));
                    }
                });
                ui.add_space(4.0);
            }
            ui.horizontal(|ui| {
                if ui.button("Come from").clicked() {
                    action = Some(Action::ComeFrom);
                }
                if ui.button("Go to").clicked() {
                    action = Some(Action::GoTo);
                }
            });
            ui.horizontal(|ui| {
                if deletable && ui.small_button("🗑 Remove").clicked() {
                    action = Some(Action::Remove);
                }
                if ui.small_button("Close").clicked() {
                    action = Some(Action::Close);
                }
            });
        });

    match action {
        Some(Action::ComeFrom) => {
            state.come_from_selected();
        }
        Some(Action::GoTo) => {
            state.go_to_selected();
        }
        Some(Action::Remove) => state.remove_selected(),
        Some(Action::Close) => state.close_popup(),
        None => {}
    }
}

/// Help overlay
pub fn help_overlay(ctx: &egui::Context, show_help: &mut bool) {
    egui::Window::new("Help")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.heading(crate::APP_NAME);
            ui.add_space(8.0);

            ui.label(RichText::new("Searching").strong());
            ui.label("• Type a station in 'From' and 'To', then press Search");
            ui.label("• A blank departure means now");
            ui.add_space(8.0);

            ui.label(RichText::new("Map").strong());
            ui.label("• Click a marker to use it as origin or destination");
            ui.label("• Right-click the map to drop a custom point");
            ui.label("• Right-click a path marker to remove it");
            ui.add_space(8.0);

            ui.label(RichText::new("Keyboard Shortcuts").strong());
            ui.label("• F1 - Toggle this help");
            ui.add_space(12.0);

            if ui.button("Close").clicked() {
                *show_help = false;
            }
        });
}
