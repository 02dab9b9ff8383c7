//! Metro Path Library - Core Data Structures for Displaying Computed Routes
//!
//! This library turns the flat edge list returned by a route-computation backend
//! into something a person can read and a map can draw. Nothing here computes
//! routes; it only consumes them.
//!
//! # Architecture
//!
//! - **[`group_path`]**: Partitions an edge list into line-homogeneous [`Segment`]s
//! - **[`TimeAnnotator`]**: Wall-clock departure/arrival strings per segment
//! - **[`OverlayReconciler`]**: Owns the markers and polylines drawn on a [`RenderSurface`]
//! - **[`ColorResolver`]**: Line identifier to display color
//! - **[`RouteBackend`]**: The queries consumed from the backend, plus [`SnapshotBackend`]
//! - **[`RequestScope`]**: Cancellable one-shot background requests tied to a view
//!
//! # Data Flow
//!
//! raw edges → [`group_path`] → segments → { [`TimeAnnotator`], [`OverlayReconciler`] + [`ColorResolver`] }

mod backend;
mod colors;
mod grouping;
mod model;
mod overlay;
mod requests;
pub mod timing;

// Public API exports
pub use backend::{RecordedRoute, RouteBackend, Snapshot, SnapshotBackend, filter_stations};
pub use colors::ColorResolver;
pub use grouping::group_path;
pub use model::{
    Edge, LineSchedule, LineStationSchedule, MetroLine, Objective, RouteEndpoint, RouteQuery,
    Segment, StationCorrespondence, Stop, TransportMode,
};
pub use overlay::{
    CUSTOM_MARKER_TITLE, MarkerEntry, MarkerHandle, MarkerIcon, MarkerSpec, OverlayReconciler,
    PolylineEntry, PolylineHandle, PolylineSpec, RenderSurface,
};
pub use requests::{PendingRequest, RequestScope};
pub use timing::{JourneyDuration, TimeAnnotator};

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum MetroPathError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No recorded route from {start} to {end}")]
    RouteNotFound { start: String, end: String },

    #[error("Unknown metro line: {0}")]
    UnknownLine(String),

    #[error("No schedule for line {line} at {station}")]
    ScheduleNotFound { line: String, station: String },

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Request cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MetroPathError>;
