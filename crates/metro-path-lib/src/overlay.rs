//! Map overlay reconciliation
//!
//! The [`OverlayReconciler`] owns every marker and polyline it has put on a
//! [`RenderSurface`]. The surface hands out opaque handles; the reconciler keeps
//! them until the element is removed, at which point the handle is moved back
//! into the surface's `remove_*` call. Handles cannot be cloned, so an element
//! can neither be released twice nor outlive the entry that owns it.
//!
//! Two kinds of markers coexist:
//! - **Reference markers**: permanent points of interest (the reference
//!   stations). They survive every path update.
//! - **Deletable markers**: the stops of the current path plus any ad-hoc
//!   points the user dropped on the map.

use crate::{ColorResolver, RouteEndpoint, Segment, StationCorrespondence};
use geo::Point;

/// Title given to markers dropped by the user at an arbitrary point
pub const CUSTOM_MARKER_TITLE: &str = "Custom Marker";

/// Surface-side identity of a drawn marker
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Surface-side identity of a drawn polyline
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PolylineHandle(u64);

impl PolylineHandle {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Marker symbol requested from the surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerIcon {
    /// Default pin used for path stops and ad-hoc points
    Pin,
    /// Filled circle used for reference stations
    ReferenceStation,
}

/// Everything a surface needs to draw a marker
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub position: Point<f64>,
    pub title: String,
    pub icon: MarkerIcon,
    pub draggable: bool,
}

/// Everything a surface needs to draw a polyline
#[derive(Clone, Debug, PartialEq)]
pub struct PolylineSpec {
    pub vertices: Vec<Point<f64>>,
    /// Hex color; `None` means the surface's default stroke
    pub color: Option<String>,
}

/// The drawing operations consumed from the host map
pub trait RenderSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> MarkerHandle;

    /// Release a marker; the handle is consumed
    fn remove_marker(&mut self, handle: MarkerHandle);

    fn add_polyline(&mut self, spec: &PolylineSpec) -> PolylineHandle;

    /// Release a polyline; the handle is consumed
    fn remove_polyline(&mut self, handle: PolylineHandle);

    /// Open the detail popup anchored to a marker
    fn open_popup(&mut self, anchor: &MarkerHandle);

    fn close_popup(&mut self);
}

/// A marker owned by the reconciler
#[derive(Debug)]
pub struct MarkerEntry {
    spec: MarkerSpec,
    deletable: bool,
    source_station: Option<StationCorrespondence>,
    handle: MarkerHandle,
}

impl MarkerEntry {
    #[inline]
    pub fn position(&self) -> Point<f64> {
        self.spec.position
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.spec.title
    }

    #[inline]
    pub fn is_deletable(&self) -> bool {
        self.deletable
    }

    /// Whether this is a point dropped by the user rather than a stop
    pub fn is_custom(&self) -> bool {
        self.spec.title == CUSTOM_MARKER_TITLE
    }

    /// The reference station this marker stands for, if any
    pub fn source_station(&self) -> Option<&StationCorrespondence> {
        self.source_station.as_ref()
    }

    pub fn spec(&self) -> &MarkerSpec {
        &self.spec
    }

    pub fn handle(&self) -> &MarkerHandle {
        &self.handle
    }

    /// What "come from" / "go to" report for this marker
    pub fn endpoint(&self) -> RouteEndpoint {
        if self.is_custom() {
            RouteEndpoint::Custom(self.spec.position)
        } else {
            RouteEndpoint::Station(self.spec.title.clone())
        }
    }
}

/// A polyline owned by the reconciler
#[derive(Debug)]
pub struct PolylineEntry {
    spec: PolylineSpec,
    line_id: Option<String>,
    handle: PolylineHandle,
}

impl PolylineEntry {
    pub fn vertices(&self) -> &[Point<f64>] {
        &self.spec.vertices
    }

    pub fn color(&self) -> Option<&str> {
        self.spec.color.as_deref()
    }

    pub fn line_id(&self) -> Option<&str> {
        self.line_id.as_deref()
    }

    pub fn handle(&self) -> &PolylineHandle {
        &self.handle
    }
}

/// The currently selected marker, identified by kind, coordinate and title
#[derive(Clone, Debug, PartialEq)]
struct Selection {
    position: Point<f64>,
    title: String,
    deletable: bool,
}

/// Owner of the markers and polylines drawn for the current path
#[derive(Debug, Default)]
pub struct OverlayReconciler {
    colors: ColorResolver,
    /// Last known reference-station list
    reference_stations: Vec<StationCorrespondence>,
    reference_markers: Vec<MarkerEntry>,
    deletable_markers: Vec<MarkerEntry>,
    polylines: Vec<PolylineEntry>,
    selected: Option<Selection>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl OverlayReconciler {
    pub fn new(colors: ColorResolver) -> Self {
        Self {
            colors,
            ..Default::default()
        }
    }

    pub fn colors(&self) -> &ColorResolver {
        &self.colors
    }

    pub fn reference_stations(&self) -> &[StationCorrespondence] {
        &self.reference_stations
    }

    pub fn reference_markers(&self) -> &[MarkerEntry] {
        &self.reference_markers
    }

    pub fn deletable_markers(&self) -> &[MarkerEntry] {
        &self.deletable_markers
    }

    /// Reference markers first, then deletable ones
    pub fn markers(&self) -> impl Iterator<Item = &MarkerEntry> {
        self.reference_markers
            .iter()
            .chain(self.deletable_markers.iter())
    }

    pub fn polylines(&self) -> &[PolylineEntry] {
        &self.polylines
    }

    /// The selected marker, if it is still on the overlay
    pub fn selected(&self) -> Option<&MarkerEntry> {
        let selection = self.selected.as_ref()?;
        let markers = if selection.deletable {
            &self.deletable_markers
        } else {
            &self.reference_markers
        };
        markers.iter().rev().find(|marker| {
            marker.position() == selection.position && marker.title() == selection.title
        })
    }

    /// Replace the drawn path
    ///
    /// Polylines and deletable markers of the previous path are released,
    /// the reference markers are brought in line with `reference_stations`,
    /// then one polyline and one departure marker are drawn per segment plus
    /// a final arrival marker. An empty path leaves only the reference markers.
    pub fn set_path(
        &mut self,
        segments: &[Segment],
        reference_stations: &[StationCorrespondence],
        surface: &mut dyn RenderSurface,
    ) {
        #[cfg(feature = "profiling")]
        profiling::scope!("OverlayReconciler::set_path");

        for polyline in self.polylines.drain(..) {
            surface.remove_polyline(polyline.handle);
        }
        for marker in self.deletable_markers.drain(..) {
            surface.remove_marker(marker.handle);
        }

        self.rebuild_references(reference_stations, surface);

        for segment in segments {
            let departure = segment.departure_stop();
            let spec = PolylineSpec {
                vertices: vec![departure.position(), segment.arrival_stop().position()],
                color: self
                    .colors
                    .lookup(segment.line_id())
                    .map(str::to_string),
            };
            let handle = surface.add_polyline(&spec);
            self.polylines.push(PolylineEntry {
                spec,
                line_id: segment.line_id().map(str::to_string),
                handle,
            });

            self.push_deletable(departure.position(), departure.name.clone(), surface);
        }

        if let Some(last) = segments.last() {
            let arrival = last.arrival_stop();
            self.push_deletable(arrival.position(), arrival.name.clone(), surface);
        }

        self.drop_stale_selection(surface);

        tracing::debug!(
            "Overlay now holds {} polylines, {} path markers and {} reference markers",
            self.polylines.len(),
            self.deletable_markers.len(),
            self.reference_markers.len()
        );
    }

    /// Remove the current path, keeping the reference markers
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        let stations = self.reference_stations.clone();
        self.set_path(&[], &stations, surface);
    }

    /// Adopt a freshly loaded reference-station list without touching the path
    pub fn set_reference_stations(
        &mut self,
        reference_stations: &[StationCorrespondence],
        surface: &mut dyn RenderSurface,
    ) {
        self.rebuild_references(reference_stations, surface);
        self.drop_stale_selection(surface);
    }

    /// Select the marker at `position` and open its popup
    ///
    /// Markers of the path and ad-hoc points take precedence over a reference
    /// station at the same coordinate, the most recently added first.
    /// Returns `false` (and clears the selection) when no marker sits there.
    pub fn select(&mut self, position: Point<f64>, surface: &mut dyn RenderSurface) -> bool {
        let Some(marker) = self
            .deletable_markers
            .iter()
            .rev()
            .chain(self.reference_markers.iter().rev())
            .find(|marker| marker.position() == position)
        else {
            self.selected = None;
            return false;
        };
        surface.open_popup(&marker.handle);
        self.selected = Some(Selection {
            position: marker.position(),
            title: marker.title().to_string(),
            deletable: marker.is_deletable(),
        });
        true
    }

    /// Report the selected marker as the journey origin and close the popup
    pub fn come_from(&mut self, surface: &mut dyn RenderSurface) -> Option<RouteEndpoint> {
        self.emit_selected(surface)
    }

    /// Report the selected marker as the journey destination and close the popup
    pub fn go_to(&mut self, surface: &mut dyn RenderSurface) -> Option<RouteEndpoint> {
        self.emit_selected(surface)
    }

    fn emit_selected(&mut self, surface: &mut dyn RenderSurface) -> Option<RouteEndpoint> {
        let endpoint = self.selected()?.endpoint();
        surface.close_popup();
        Some(endpoint)
    }

    /// Drop a custom marker at `position`; polylines are left alone
    ///
    /// Returns `false` if a custom marker already sits at that exact point.
    pub fn add_ad_hoc_marker(
        &mut self,
        position: Point<f64>,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        let exists = self
            .deletable_markers
            .iter()
            .any(|marker| marker.is_custom() && marker.position() == position);
        if exists {
            return false;
        }
        self.push_deletable(position, CUSTOM_MARKER_TITLE.to_string(), surface);
        true
    }

    /// Remove the topmost deletable marker at `position`
    ///
    /// Matching is by coordinate so that a reference marker sharing a title
    /// with a path stop is never removed. Returns whether a marker was removed.
    pub fn remove_marker(&mut self, position: Point<f64>, surface: &mut dyn RenderSurface) -> bool {
        let Some(index) = self
            .deletable_markers
            .iter()
            .rposition(|marker| marker.position() == position)
        else {
            return false;
        };
        self.remove_deletable_at(index, surface);
        true
    }

    /// Remove the selected marker if it is deletable
    pub fn remove_selected(&mut self, surface: &mut dyn RenderSurface) -> bool {
        let Some(selection) = self.selected.as_ref().filter(|selection| selection.deletable) else {
            return false;
        };
        let Some(index) = self.deletable_markers.iter().rposition(|marker| {
            marker.position() == selection.position && marker.title() == selection.title
        }) else {
            return false;
        };
        self.remove_deletable_at(index, surface);
        true
    }

    fn remove_deletable_at(&mut self, index: usize, surface: &mut dyn RenderSurface) {
        let marker = self.deletable_markers.remove(index);
        surface.remove_marker(marker.handle);
        self.drop_stale_selection(surface);
    }

    /// Release every element drawn by this reconciler
    pub fn release_all(&mut self, surface: &mut dyn RenderSurface) {
        for polyline in self.polylines.drain(..) {
            surface.remove_polyline(polyline.handle);
        }
        for marker in self
            .deletable_markers
            .drain(..)
            .chain(self.reference_markers.drain(..))
        {
            surface.remove_marker(marker.handle);
        }
        if self.selected.take().is_some() {
            surface.close_popup();
        }
    }

    /// Make the reference markers match `stations`
    ///
    /// An unchanged list keeps the existing markers on the surface.
    fn rebuild_references(
        &mut self,
        stations: &[StationCorrespondence],
        surface: &mut dyn RenderSurface,
    ) {
        if self.reference_stations == stations && self.reference_markers.len() == stations.len() {
            return;
        }

        for marker in self.reference_markers.drain(..) {
            surface.remove_marker(marker.handle);
        }

        for station in stations {
            let spec = MarkerSpec {
                position: station.station.position(),
                title: station.station.name.clone(),
                icon: MarkerIcon::ReferenceStation,
                draggable: false,
            };
            let handle = surface.add_marker(&spec);
            self.reference_markers.push(MarkerEntry {
                spec,
                deletable: false,
                source_station: Some(station.clone()),
                handle,
            });
        }
        self.reference_stations = stations.to_vec();

        tracing::debug!("Rebuilt {} reference markers", self.reference_markers.len());
    }

    fn push_deletable(
        &mut self,
        position: Point<f64>,
        title: String,
        surface: &mut dyn RenderSurface,
    ) {
        let spec = MarkerSpec {
            position,
            title,
            icon: MarkerIcon::Pin,
            draggable: false,
        };
        let handle = surface.add_marker(&spec);
        self.deletable_markers.push(MarkerEntry {
            spec,
            deletable: true,
            source_station: None,
            handle,
        });
    }

    /// Forget a selection whose marker is gone, closing its popup
    fn drop_stale_selection(&mut self, surface: &mut dyn RenderSurface) {
        if self.selected.is_some() && self.selected().is_none() {
            self.selected = None;
            surface.close_popup();
        }
    }
}
