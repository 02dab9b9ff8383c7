//! Application state management
//!
//! This module owns the search form, the backend requests in flight, the
//! current itinerary and the overlay drawn for it.

use crate::app::plugin::{MapEvent, MapSurface, SharedSurface, lock_surface};
use crate::app::settings::Settings;
use chrono::NaiveTime;
use geo::{BoundingRect, MultiPoint, Point, Rect};
use metro_path_lib::timing::{departure_offset, departure_or_now};
use metro_path_lib::{
    ColorResolver, Edge, LineStationSchedule, MetroLine, MetroPathError, Objective,
    OverlayReconciler, RenderSurface, RequestScope, RouteBackend, RouteEndpoint, RouteQuery,
    Segment, StationCorrespondence, Stop, TimeAnnotator, TransportMode, group_path,
};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;

/// Backend queries the viewer issues; at most one of each is in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Path,
    ReferenceStations,
    Stations,
    Lines,
    Line,
    Schedule,
    Correspondences,
}

/// Answer to a [`RequestKind`]
#[derive(Debug)]
pub enum BackendReply {
    Path(Vec<Edge>),
    ReferenceStations(Vec<StationCorrespondence>),
    Stations(Vec<Stop>),
    Lines(Vec<MetroLine>),
    Line(MetroLine),
    Schedule(LineStationSchedule),
    Correspondences(Vec<StationCorrespondence>),
}

/// Main application state
pub struct AppState {
    backend: Arc<dyn RouteBackend>,
    requests: RequestScope<RequestKind, BackendReply>,

    /// Markers and polylines of the current itinerary
    pub overlay: OverlayReconciler,
    /// What the map plugin draws
    pub surface: SharedSurface,

    pub form: SearchForm,

    /// Query and departure of the route request in flight
    pending_search: Option<(RouteQuery, NaiveTime)>,
    pub itinerary: Option<Itinerary>,

    /// Backend catalogue, empty until loaded
    pub reference_stations: Vec<StationCorrespondence>,
    pub stations: Vec<Stop>,
    pub lines: Vec<MetroLine>,
    pub correspondences: Vec<StationCorrespondence>,
    pub selected_line: Option<MetroLine>,
    pub station_schedule: Option<LineStationSchedule>,

    pub errors: Vec<String>,
    pub ui_settings: UiSettings,

    /// Recenter the map on the itinerary during the next frame
    pub pending_fit_bounds: bool,
}

/// Route search form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchForm {
    pub from: String,
    pub to: String,
    /// Free text; blank or unparsable means "now"
    pub departure: String,
    pub objective: Objective,
    pub mode: TransportMode,
}

/// A displayed route
#[derive(Clone, Debug)]
pub struct Itinerary {
    pub query: RouteQuery,
    pub departure: NaiveTime,
    pub segments: Vec<Segment>,
}

impl Itinerary {
    pub fn annotator(&self) -> TimeAnnotator<'_> {
        TimeAnnotator::new(self.departure, &self.segments)
    }

    /// Bounding box of every stop on the route
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let stops: Vec<Point<f64>> = self
            .segments
            .iter()
            .flat_map(|segment| segment.edges())
            .flat_map(|edge| [edge.start.position(), edge.end.position()])
            .collect();
        MultiPoint::from(stops).bounding_rect()
    }
}

/// UI-specific settings that can be adjusted at runtime
#[derive(Clone)]
pub struct UiSettings {
    /// Path line width in pixels
    pub line_width: f32,

    /// Map tiles provider
    pub tiles_provider: TilesProvider,

    /// Whether sidebar is open
    pub sidebar_open: bool,

    /// Current active tab in sidebar
    pub active_tab: SidebarTab,
}

/// Sidebar tabs
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SidebarTab {
    Route,
    Lines,
    Stations,
    Settings,
}

/// Available map tile providers
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TilesProvider {
    OpenStreetMap,
    CartoPositron,
}

impl TilesProvider {
    pub fn attribution(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "© OpenStreetMap contributors",
            Self::CartoPositron => "© OpenStreetMap contributors © CARTO",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::OpenStreetMap, Self::CartoPositron]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "OpenStreetMap",
            Self::CartoPositron => "CARTO Positron",
        }
    }
}

impl std::str::FromStr for TilesProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "osm" | "openstreetmap" => Ok(Self::OpenStreetMap),
            "carto" | "cartopositron" => Ok(Self::CartoPositron),
            other => Err(format!("unknown tiles provider '{other}'")),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            line_width: 4.0,
            tiles_provider: TilesProvider::CartoPositron,
            sidebar_open: true,
            active_tab: SidebarTab::Route,
        }
    }
}

impl AppState {
    /// Create new application state from CLI settings
    pub fn new(
        settings: &Settings,
        backend: Arc<dyn RouteBackend>,
        colors: ColorResolver,
        runtime: Handle,
    ) -> Self {
        let form = SearchForm {
            departure: settings.departure.clone().unwrap_or_default(),
            objective: settings.objective,
            mode: settings.mode,
            ..Default::default()
        };

        let ui_settings = UiSettings {
            line_width: settings.line_width,
            tiles_provider: settings.tiles,
            ..Default::default()
        };

        Self {
            backend,
            requests: RequestScope::new(runtime),
            overlay: OverlayReconciler::new(colors),
            surface: Arc::new(Mutex::new(MapSurface::default())),
            form,
            pending_search: None,
            itinerary: None,
            reference_stations: Vec::new(),
            stations: Vec::new(),
            lines: Vec::new(),
            correspondences: Vec::new(),
            selected_line: None,
            station_schedule: None,
            errors: Vec::new(),
            ui_settings,
            pending_fit_bounds: false,
        }
    }

    /// Fetch reference stations, stations, lines and correspondences
    pub fn request_catalogue(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.requests.issue(RequestKind::ReferenceStations, move || {
            backend.reference_stations().map(BackendReply::ReferenceStations)
        });

        let backend = Arc::clone(&self.backend);
        self.requests.issue(RequestKind::Stations, move || {
            backend.stations().map(BackendReply::Stations)
        });

        let backend = Arc::clone(&self.backend);
        self.requests.issue(RequestKind::Lines, move || {
            backend.lines().map(BackendReply::Lines)
        });

        let backend = Arc::clone(&self.backend);
        self.requests.issue(RequestKind::Correspondences, move || {
            backend.correspondences().map(BackendReply::Correspondences)
        });
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.requests.is_pending(&kind)
    }

    /// Whether any backend request is still in flight
    pub fn is_busy(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Request the best path for the form contents
    ///
    /// Does nothing until both endpoints are filled in.
    pub fn search(&mut self) {
        let from = self.form.from.trim();
        let to = self.form.to.trim();
        if from.is_empty() || to.is_empty() {
            tracing::debug!("Search needs both endpoints");
            return;
        }

        let departure_text = Some(self.form.departure.trim()).filter(|text| !text.is_empty());
        let departure = departure_or_now(departure_text);
        let query = RouteQuery {
            start: from.to_string(),
            end: to.to_string(),
            departure: departure_offset(departure),
            objective: self.form.objective,
            mode: self.form.mode,
        };
        tracing::info!("Searching {} -> {}", query.start, query.end);

        let backend = Arc::clone(&self.backend);
        let request = query.clone();
        self.requests.issue(RequestKind::Path, move || {
            backend.best_path(&request).map(BackendReply::Path)
        });
        self.pending_search = Some((query, departure));
    }

    /// Load one line with its stations and timetable
    ///
    /// A schedule still pending for the previous line is dropped.
    pub fn request_line(&mut self, name: &str) {
        self.requests.cancel(&RequestKind::Schedule);
        let backend = Arc::clone(&self.backend);
        let name = name.to_string();
        self.requests.issue(RequestKind::Line, move || {
            backend.line(&name).map(BackendReply::Line)
        });
    }

    /// Load the passing times of `line` at `station`
    pub fn request_schedule(&mut self, line: &str, station: &str) {
        let backend = Arc::clone(&self.backend);
        let (line, station) = (line.to_string(), station.to_string());
        self.requests.issue(RequestKind::Schedule, move || {
            backend
                .line_station_schedule(&line, &station)
                .map(BackendReply::Schedule)
        });
    }

    /// Apply every backend answer that arrived; returns whether any did
    pub fn process_replies(&mut self) -> bool {
        profiling::scope!("process_replies");

        let replies = self.requests.poll();
        let any = !replies.is_empty();
        for (kind, reply) in replies {
            match reply {
                Ok(reply) => self.apply_reply(reply),
                Err(e) => self.report_error(kind, e),
            }
        }
        any
    }

    fn apply_reply(&mut self, reply: BackendReply) {
        match reply {
            BackendReply::Path(edges) => {
                if let Some((query, departure)) = self.pending_search.take() {
                    self.show_itinerary(query, departure, edges);
                }
            }
            BackendReply::ReferenceStations(stations) => {
                tracing::debug!("Received {} reference stations", stations.len());
                let mut surface = lock_surface(&self.surface);
                self.overlay.set_reference_stations(&stations, &mut *surface);
                self.reference_stations = stations;
            }
            BackendReply::Stations(mut stations) => {
                stations.sort_by(|a, b| a.name.cmp(&b.name));
                self.stations = stations;
            }
            BackendReply::Lines(lines) => {
                self.lines = lines;
            }
            BackendReply::Line(line) => {
                self.station_schedule = None;
                self.selected_line = Some(line);
            }
            BackendReply::Schedule(schedule) => {
                self.station_schedule = Some(schedule);
            }
            BackendReply::Correspondences(mut correspondences) => {
                correspondences.sort_by(|a, b| a.station.name.cmp(&b.station.name));
                self.correspondences = correspondences;
            }
        }
    }

    fn report_error(&mut self, kind: RequestKind, error: MetroPathError) {
        tracing::warn!("{kind:?} request failed: {error}");
        if kind == RequestKind::Path {
            self.pending_search = None;
        }
        self.errors.push(error.to_string());
    }

    /// Group a fresh edge list and redraw the overlay for it
    fn show_itinerary(&mut self, query: RouteQuery, departure: NaiveTime, edges: Vec<Edge>) {
        profiling::scope!("show_itinerary");

        let segments = group_path(&edges);
        tracing::info!(
            "Route {} -> {}: {} edges in {} segments",
            query.start,
            query.end,
            edges.len(),
            segments.len()
        );

        {
            let mut surface = lock_surface(&self.surface);
            self.overlay
                .set_path(&segments, &self.reference_stations, &mut *surface);
        }

        self.itinerary = Some(Itinerary {
            query,
            departure,
            segments,
        });
        self.pending_fit_bounds = true;
    }

    /// Drop the current itinerary and any route request in flight
    pub fn clear_itinerary(&mut self) {
        self.requests.cancel(&RequestKind::Path);
        self.pending_search = None;
        self.itinerary = None;
        let mut surface = lock_surface(&self.surface);
        self.overlay.clear(&mut *surface);
    }

    pub fn swap_endpoints(&mut self) {
        std::mem::swap(&mut self.form.from, &mut self.form.to);
    }

    /// React to clicks recorded by the map plugin; returns whether there were any
    pub fn handle_map_events(&mut self) -> bool {
        let mut surface = lock_surface(&self.surface);
        let events = surface.drain_events();
        let any = !events.is_empty();
        for event in events {
            match event {
                MapEvent::MarkerClicked(position) => {
                    self.overlay.select(position, &mut *surface);
                }
                MapEvent::MarkerSecondaryClicked(position) => {
                    self.overlay.remove_marker(position, &mut *surface);
                }
                MapEvent::MapSecondaryClicked(position) => {
                    self.overlay.add_ad_hoc_marker(position, &mut *surface);
                }
            }
        }
        any
    }

    /// Use the selected marker as the journey origin
    pub fn come_from_selected(&mut self) -> Option<RouteEndpoint> {
        let endpoint = self.overlay.come_from(&mut *lock_surface(&self.surface))?;
        self.form.from = endpoint.query_name();
        Some(endpoint)
    }

    /// Use the selected marker as the journey destination
    pub fn go_to_selected(&mut self) -> Option<RouteEndpoint> {
        let endpoint = self.overlay.go_to(&mut *lock_surface(&self.surface))?;
        self.form.to = endpoint.query_name();
        Some(endpoint)
    }

    /// Remove the selected marker if it belongs to the path or was dropped by hand
    pub fn remove_selected(&mut self) {
        self.overlay
            .remove_selected(&mut *lock_surface(&self.surface));
    }

    pub fn close_popup(&mut self) {
        lock_surface(&self.surface).close_popup();
    }
}
