//! Wire and domain types
//!
//! The structs in this module mirror the JSON shapes exchanged with the
//! route-computation backend. Field names follow the backend, so everything
//! here derives `serde` with `camelCase` renaming where needed.

use geo::Point;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MetroPathError;

/// A transit stop (or an ad-hoc point returned by the backend)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Unique stop name
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Stop {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Map coordinate of the stop (x = longitude, y = latitude)
    #[inline]
    pub fn position(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// One directed hop of a computed path
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub start: Stop,
    pub end: Stop,
    /// Arrival at `end`, in seconds from midnight of the journey day.
    /// Cumulative along the path, never a per-hop duration.
    #[serde(deserialize_with = "deserialize_seconds")]
    pub weight: u32,
    #[serde(rename = "metroLine", default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
    #[serde(rename = "terminusStation", default, skip_serializing_if = "Option::is_none")]
    pub terminus: Option<String>,
}

impl Edge {
    pub fn new(start: Stop, end: Stop, weight: u32) -> Self {
        Self {
            start,
            end,
            weight,
            line_id: None,
            terminus: None,
        }
    }

    /// Builder-style setter for the transit line and its terminus
    pub fn on_line(mut self, line_id: impl Into<String>, terminus: impl Into<String>) -> Self {
        self.line_id = Some(line_id.into());
        self.terminus = Some(terminus.into());
        self
    }

    /// The transit line, treating an empty identifier as absent
    #[inline]
    pub fn line(&self) -> Option<&str> {
        self.line_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The backend serializes weights as floating point numbers; accept both.
fn deserialize_seconds<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "weight must be a non-negative number of seconds, got {value}"
        )));
    }
    Ok(value.round() as u32)
}

/// Maximal run of consecutive edges on one line, or a single walking edge
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    line_id: Option<String>,
    terminus: Option<String>,
    edges: Vec<Edge>,
}

impl Segment {
    /// Open a new segment whose line and terminus come from its first edge
    pub(crate) fn starting_with(edge: Edge) -> Self {
        let line_id = edge.line().map(str::to_string);
        let terminus = if line_id.is_some() {
            edge.terminus.clone()
        } else {
            None
        };
        Self {
            line_id,
            terminus,
            edges: vec![edge],
        }
    }

    pub(crate) fn push(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    #[inline]
    pub fn line_id(&self) -> Option<&str> {
        self.line_id.as_deref()
    }

    #[inline]
    pub fn terminus(&self) -> Option<&str> {
        self.terminus.as_deref()
    }

    /// Never empty
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }

    #[inline]
    pub fn first_edge(&self) -> &Edge {
        &self.edges[0]
    }

    #[inline]
    pub fn last_edge(&self) -> &Edge {
        &self.edges[self.edges.len() - 1]
    }

    pub fn departure_stop(&self) -> &Stop {
        &self.first_edge().start
    }

    pub fn arrival_stop(&self) -> &Stop {
        &self.last_edge().end
    }

    /// Cumulative weight at the end of the segment
    pub fn arrival_weight(&self) -> u32 {
        self.last_edge().weight
    }

    /// A segment without a line is a walking transfer
    pub fn is_walking(&self) -> bool {
        self.line_id.is_none()
    }

    /// Stops visited in order: departure followed by every hop's end
    pub fn stop_names(&self) -> Vec<&str> {
        std::iter::once(self.departure_stop().name.as_str())
            .chain(self.edges.iter().map(|edge| edge.end.name.as_str()))
            .collect()
    }
}

/// Optimization objective of a route query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Objective {
    #[default]
    Time,
    Distance,
    TimeDistance,
}

/// Transportation modes allowed in a route query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMode {
    Metro,
    #[default]
    MetroFoot,
    Foot,
}

impl Objective {
    pub fn all() -> &'static [Self] {
        &[Self::Time, Self::Distance, Self::TimeDistance]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Time => "Time",
            Self::Distance => "Distance",
            Self::TimeDistance => "Time & distance",
        }
    }

    /// Wire value used in the route query
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "TIME",
            Self::Distance => "DISTANCE",
            Self::TimeDistance => "TIME_DISTANCE",
        }
    }
}

impl TransportMode {
    pub fn all() -> &'static [Self] {
        &[Self::Metro, Self::MetroFoot, Self::Foot]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Metro => "Metro",
            Self::MetroFoot => "Metro & walk",
            Self::Foot => "Walk",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metro => "METRO",
            Self::MetroFoot => "METRO_FOOT",
            Self::Foot => "FOOT",
        }
    }
}

impl FromStr for Objective {
    type Err = MetroPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|objective| objective.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MetroPathError::InvalidValue(s.to_string()))
    }
}

impl FromStr for TransportMode {
    type Err = MetroPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MetroPathError::InvalidValue(s.to_string()))
    }
}

/// Either a named stop or an arbitrary point picked on the map
#[derive(Clone, Debug, PartialEq)]
pub enum RouteEndpoint {
    Station(String),
    Custom(Point<f64>),
}

impl RouteEndpoint {
    /// Name sent to the backend. Custom points use the `(lat, lon)` notation.
    pub fn query_name(&self) -> String {
        match self {
            Self::Station(name) => name.clone(),
            Self::Custom(point) => format!("({}, {})", point.y(), point.x()),
        }
    }
}

impl fmt::Display for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_name())
    }
}

/// Parameters of one route computation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub start: String,
    pub end: String,
    /// Departure in seconds from midnight
    pub departure: u32,
    pub objective: Objective,
    pub mode: TransportMode,
}

/// A station together with the lines serving it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationCorrespondence {
    pub station: Stop,
    pub metro_lines: Vec<String>,
}

/// Departures of one line towards one terminus
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSchedule {
    pub line: String,
    pub terminus: String,
    pub schedules: Vec<u32>,
}

/// A metro line; `stations` and `schedules` are only filled in detailed replies
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetroLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stations: Option<Vec<Stop>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedules: Option<Vec<LineSchedule>>,
}

/// Passing times of one line at one station
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStationSchedule {
    pub metro_line: String,
    pub station: String,
    pub schedules: Vec<u32>,
}
