//! Walkers plugin drawing the path overlay on the map
//!
//! [`MapSurface`] is the [`RenderSurface`] handed to the overlay reconciler:
//! it stores what should be drawn, keyed by the handles it gives out.
//! [`OverlayPlugin`] paints that content every frame and turns pointer
//! interaction into [`MapEvent`]s that the application consumes afterwards.

use egui::{Color32, Pos2, Stroke};
use geo::Point;
use metro_path_lib::{
    MarkerHandle, MarkerIcon, MarkerSpec, PolylineHandle, PolylineSpec, RenderSurface,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use walkers::{Plugin, Projector};

/// Stroke used for walking transfers and lines without a known color
pub const DEFAULT_PATH_COLOR: Color32 = Color32::from_rgb(70, 130, 220);

const PIN_RADIUS: f32 = 7.0;
const REFERENCE_RADIUS: f32 = 5.0;
/// Extra pixels around a marker that still count as a hit
const HIT_SLOP: f32 = 4.0;

/// Pointer interaction with the map, consumed once per frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapEvent {
    /// Primary click on a marker
    MarkerClicked(Point<f64>),
    /// Secondary click on a marker
    MarkerSecondaryClicked(Point<f64>),
    /// Secondary click on empty map
    MapSecondaryClicked(Point<f64>),
}

/// Drawable overlay content, addressed by surface handles
#[derive(Debug, Default)]
pub struct MapSurface {
    next_id: u64,
    markers: BTreeMap<u64, MarkerSpec>,
    polylines: BTreeMap<u64, PolylineSpec>,
    popup: Option<u64>,
    /// Screen position of the popup anchor during the last frame
    popup_anchor: Option<Pos2>,
    events: Vec<MapEvent>,
}

pub type SharedSurface = Arc<Mutex<MapSurface>>;

/// Lock the surface, recovering from a poisoned mutex
pub fn lock_surface(surface: &SharedSurface) -> MutexGuard<'_, MapSurface> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MapSurface {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn polyline_count(&self) -> usize {
        self.polylines.len()
    }

    pub fn popup_open(&self) -> bool {
        self.popup.is_some()
    }

    pub fn popup_anchor(&self) -> Option<Pos2> {
        self.popup.and(self.popup_anchor)
    }

    pub(crate) fn push_event(&mut self, event: MapEvent) {
        self.events.push(event);
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    /// Topmost marker whose symbol covers `screen_pos`
    fn marker_at(&self, screen_pos: Pos2, projector: &Projector) -> Option<Point<f64>> {
        self.markers
            .values()
            .rev()
            .find(|spec| {
                let radius = marker_radius(spec.icon) + HIT_SLOP;
                project(projector, spec.position).distance(screen_pos) <= radius
            })
            .map(|spec| spec.position)
    }
}

impl RenderSurface for MapSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> MarkerHandle {
        let id = self.allocate_id();
        self.markers.insert(id, spec.clone());
        MarkerHandle::from_raw(id)
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle.raw()).is_none() {
            tracing::warn!("Released unknown marker {}", handle.raw());
        }
        if self.popup == Some(handle.raw()) {
            self.popup = None;
        }
    }

    fn add_polyline(&mut self, spec: &PolylineSpec) -> PolylineHandle {
        let id = self.allocate_id();
        self.polylines.insert(id, spec.clone());
        PolylineHandle::from_raw(id)
    }

    fn remove_polyline(&mut self, handle: PolylineHandle) {
        if self.polylines.remove(&handle.raw()).is_none() {
            tracing::warn!("Released unknown polyline {}", handle.raw());
        }
    }

    fn open_popup(&mut self, anchor: &MarkerHandle) {
        self.popup = Some(anchor.raw());
    }

    fn close_popup(&mut self) {
        self.popup = None;
        self.popup_anchor = None;
    }
}

/// Parse a `#rrggbb` color, falling back to the default stroke
pub fn path_color(hex: Option<&str>) -> Color32 {
    hex.and_then(|hex| Color32::from_hex(hex).ok())
        .unwrap_or(DEFAULT_PATH_COLOR)
}

fn marker_radius(icon: MarkerIcon) -> f32 {
    match icon {
        MarkerIcon::Pin => PIN_RADIUS,
        MarkerIcon::ReferenceStation => REFERENCE_RADIUS,
    }
}

fn project(projector: &Projector, point: Point<f64>) -> Pos2 {
    let screen = projector.project(walkers::lat_lon(point.y(), point.x()));
    Pos2::new(screen.x, screen.y)
}

/// Plugin painting a [`MapSurface`]
pub struct OverlayPlugin {
    surface: SharedSurface,
    line_width: f32,
}

impl OverlayPlugin {
    pub fn new(surface: SharedSurface, line_width: f32) -> Self {
        Self {
            surface,
            line_width,
        }
    }

    fn draw_polylines(&self, surface: &MapSurface, projector: &Projector, painter: &egui::Painter) {
        profiling::scope!("draw_polylines");

        for polyline in surface.polylines.values() {
            let points: Vec<Pos2> = polyline
                .vertices
                .iter()
                .map(|vertex| project(projector, *vertex))
                .collect();
            if points.len() < 2 {
                continue;
            }

            let color = path_color(polyline.color.as_deref());
            // Dark outline keeps light line colors readable on the tiles
            painter.add(egui::Shape::line(
                points.clone(),
                Stroke::new(self.line_width + 2.0, Color32::from_black_alpha(140)),
            ));
            painter.add(egui::Shape::line(points, Stroke::new(self.line_width, color)));
        }
    }

    fn draw_markers(
        &self,
        surface: &MapSurface,
        projector: &Projector,
        painter: &egui::Painter,
        hover: Option<Pos2>,
    ) {
        profiling::scope!("draw_markers");

        for spec in surface.markers.values() {
            let center = project(projector, spec.position);
            let radius = marker_radius(spec.icon);
            match spec.icon {
                MarkerIcon::Pin => {
                    painter.circle(
                        center,
                        radius,
                        Color32::from_rgb(220, 50, 50),
                        Stroke::new(2.0, Color32::WHITE),
                    );
                }
                MarkerIcon::ReferenceStation => {
                    painter.circle(
                        center,
                        radius,
                        Color32::WHITE,
                        Stroke::new(2.0, Color32::from_gray(40)),
                    );
                }
            }

            let hovered = hover.is_some_and(|pos| pos.distance(center) <= radius + HIT_SLOP);
            if hovered {
                painter.text(
                    center + egui::vec2(0.0, -radius - 4.0),
                    egui::Align2::CENTER_BOTTOM,
                    &spec.title,
                    egui::FontId::proportional(13.0),
                    Color32::from_gray(20),
                );
            }
        }
    }
}

impl Plugin for OverlayPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("OverlayPlugin::run");

        let mut surface = lock_surface(&self.surface);
        let painter = ui.painter();

        self.draw_polylines(&surface, projector, painter);
        self.draw_markers(&surface, projector, painter, response.hover_pos());

        if let Some(pos) = response.interact_pointer_pos() {
            if response.clicked() {
                if let Some(marker) = surface.marker_at(pos, projector) {
                    surface.push_event(MapEvent::MarkerClicked(marker));
                }
            } else if response.secondary_clicked() {
                let event = match surface.marker_at(pos, projector) {
                    Some(marker) => MapEvent::MarkerSecondaryClicked(marker),
                    None => {
                        let position = projector.unproject(pos.to_vec2());
                        MapEvent::MapSecondaryClicked(Point::new(position.x(), position.y()))
                    }
                };
                surface.push_event(event);
            }
        }

        let anchor = surface
            .popup
            .and_then(|id| surface.markers.get(&id))
            .map(|spec| project(projector, spec.position));
        surface.popup_anchor = anchor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(title: &str) -> MarkerSpec {
        MarkerSpec {
            position: Point::new(2.35, 48.85),
            title: title.to_string(),
            icon: MarkerIcon::Pin,
            draggable: false,
        }
    }

    #[test]
    fn test_handles_are_unique() {
        let mut surface = MapSurface::default();
        let a = surface.add_marker(&spec("A"));
        let b = surface.add_marker(&spec("B"));
        let line = surface.add_polyline(&PolylineSpec {
            vertices: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            color: None,
        });
        assert_ne!(a.raw(), b.raw());
        assert_ne!(b.raw(), line.raw());
        assert_eq!(surface.marker_count(), 2);
        assert_eq!(surface.polyline_count(), 1);

        surface.remove_marker(a);
        surface.remove_polyline(line);
        assert_eq!(surface.marker_count(), 1);
        assert_eq!(surface.polyline_count(), 0);
    }

    #[test]
    fn test_popup_closes_with_its_marker() {
        let mut surface = MapSurface::default();
        let marker = surface.add_marker(&spec("A"));
        surface.open_popup(&marker);
        assert!(surface.popup_open());

        surface.remove_marker(marker);
        assert!(!surface.popup_open());
        assert_eq!(surface.popup_anchor(), None);
    }

    #[test]
    fn test_drain_events() {
        let mut surface = MapSurface::default();
        surface.push_event(MapEvent::MapSecondaryClicked(Point::new(2.0, 48.0)));
        assert_eq!(surface.drain_events().len(), 1);
        assert!(surface.drain_events().is_empty());
    }

    #[test]
    fn test_path_color() {
        assert_eq!(path_color(Some("#662d91")), Color32::from_rgb(0x66, 0x2d, 0x91));
        assert_eq!(path_color(Some("purple")), DEFAULT_PATH_COLOR);
        assert_eq!(path_color(None), DEFAULT_PATH_COLOR);
    }
}
