//! Route-computation backend abstraction
//!
//! [`RouteBackend`] is the narrow interface through which the viewer asks for
//! paths, reference stations, schedules and the line catalogue. Calls are
//! blocking; the viewer runs them off the UI thread through a
//! [`RequestScope`](crate::RequestScope).
//!
//! [`SnapshotBackend`] answers every query from a recorded JSON document,
//! which is how the viewer runs without a live routing service.

use crate::{
    Edge, LineStationSchedule, MetroLine, MetroPathError, Objective, Result, RouteQuery,
    StationCorrespondence, Stop, TransportMode,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Queries consumed from the route-computation backend
pub trait RouteBackend: Send + Sync {
    /// Ordered edge list of the best path for a query
    fn best_path(&self, query: &RouteQuery) -> Result<Vec<Edge>>;

    /// Stations always shown on the map
    fn reference_stations(&self) -> Result<Vec<StationCorrespondence>>;

    /// Passing times of `line` at `station`
    fn line_station_schedule(&self, line: &str, station: &str) -> Result<LineStationSchedule>;

    /// Every line, names only
    fn lines(&self) -> Result<Vec<MetroLine>>;

    /// One line with its stations and per-terminus schedules
    fn line(&self, name: &str) -> Result<MetroLine>;

    fn stations(&self) -> Result<Vec<Stop>>;

    fn correspondences(&self) -> Result<Vec<StationCorrespondence>>;
}

/// Stops sorted by name, keeping those whose name starts with `prefix`
/// (case-insensitive). An empty prefix keeps everything.
pub fn filter_stations<'a>(stations: &'a [Stop], prefix: &str) -> Vec<&'a Stop> {
    let prefix = prefix.trim().to_lowercase();
    let mut matches: Vec<&Stop> = stations
        .iter()
        .filter(|stop| stop.name.to_lowercase().starts_with(&prefix))
        .collect();
    matches.sort_by(|a, b| a.name.cmp(&b.name));
    matches
}

/// A route answer captured from a live backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedRoute {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub objective: Objective,
    #[serde(default)]
    pub mode: TransportMode,
    pub edges: Vec<Edge>,
}

impl RecordedRoute {
    fn answers(&self, query: &RouteQuery) -> bool {
        self.start == query.start
            && self.end == query.end
            && self.objective == query.objective
            && self.mode == query.mode
    }
}

/// Recorded backend document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub stations: Vec<Stop>,
    pub correspondences: Vec<StationCorrespondence>,
    /// Reference stations, a subset of `correspondences`
    pub best_stations: Vec<StationCorrespondence>,
    pub lines: Vec<MetroLine>,
    pub station_schedules: Vec<LineStationSchedule>,
    pub routes: Vec<RecordedRoute>,
}

/// [`RouteBackend`] replaying a [`Snapshot`]
#[derive(Clone, Debug, Default)]
pub struct SnapshotBackend {
    snapshot: Snapshot,
}

impl SnapshotBackend {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("SnapshotBackend::from_json_file");

        let file = std::fs::File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(std::io::BufReader::new(file))?;
        tracing::info!(
            "Loaded snapshot {}: {} stations, {} lines, {} recorded routes",
            path.display(),
            snapshot.stations.len(),
            snapshot.lines.len(),
            snapshot.routes.len()
        );
        Ok(Self { snapshot })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl RouteBackend for SnapshotBackend {
    fn best_path(&self, query: &RouteQuery) -> Result<Vec<Edge>> {
        tracing::debug!(
            "Route query {} -> {} at {} ({}, {})",
            query.start,
            query.end,
            query.departure,
            query.objective.as_str(),
            query.mode.as_str()
        );
        self.snapshot
            .routes
            .iter()
            .find(|route| route.answers(query))
            .map(|route| route.edges.clone())
            .ok_or_else(|| MetroPathError::RouteNotFound {
                start: query.start.clone(),
                end: query.end.clone(),
            })
    }

    fn reference_stations(&self) -> Result<Vec<StationCorrespondence>> {
        Ok(self.snapshot.best_stations.clone())
    }

    fn line_station_schedule(&self, line: &str, station: &str) -> Result<LineStationSchedule> {
        if let Some(recorded) = self
            .snapshot
            .station_schedules
            .iter()
            .find(|schedule| schedule.metro_line == line && schedule.station == station)
        {
            return Ok(recorded.clone());
        }

        // Fall back to the line's own timetable when the station is one of its stops
        let metro_line = self.line(line)?;
        let serves_station = metro_line
            .stations
            .iter()
            .flatten()
            .any(|stop| stop.name == station);
        let schedules: Vec<u32> = metro_line
            .schedules
            .iter()
            .flatten()
            .flat_map(|schedule| schedule.schedules.iter().copied())
            .collect();

        if !serves_station || schedules.is_empty() {
            return Err(MetroPathError::ScheduleNotFound {
                line: line.to_string(),
                station: station.to_string(),
            });
        }

        let mut schedules = schedules;
        schedules.sort_unstable();
        Ok(LineStationSchedule {
            metro_line: line.to_string(),
            station: station.to_string(),
            schedules,
        })
    }

    fn lines(&self) -> Result<Vec<MetroLine>> {
        Ok(self
            .snapshot
            .lines
            .iter()
            .map(|line| MetroLine {
                name: line.name.clone(),
                stations: None,
                schedules: None,
            })
            .collect())
    }

    fn line(&self, name: &str) -> Result<MetroLine> {
        self.snapshot
            .lines
            .iter()
            .find(|line| line.name == name)
            .cloned()
            .ok_or_else(|| MetroPathError::UnknownLine(name.to_string()))
    }

    fn stations(&self) -> Result<Vec<Stop>> {
        Ok(self.snapshot.stations.clone())
    }

    fn correspondences(&self) -> Result<Vec<StationCorrespondence>> {
        Ok(self.snapshot.correspondences.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group_path;

    const SNAPSHOT: &str = r##"{
        "stations": [
            {"name": "Chatelet", "latitude": 48.8584, "longitude": 2.3470},
            {"name": "Bercy", "latitude": 48.8401, "longitude": 2.3795},
            {"name": "Gare de Lyon", "latitude": 48.8443, "longitude": 2.3730},
            {"name": "Bastille", "latitude": 48.8531, "longitude": 2.3691}
        ],
        "correspondences": [
            {"station": {"name": "Chatelet", "latitude": 48.8584, "longitude": 2.3470},
             "metroLines": ["1", "4", "7", "11", "14"]},
            {"station": {"name": "Gare de Lyon", "latitude": 48.8443, "longitude": 2.3730},
             "metroLines": ["1", "14"]}
        ],
        "bestStations": [
            {"station": {"name": "Chatelet", "latitude": 48.8584, "longitude": 2.3470},
             "metroLines": ["1", "4", "7", "11", "14"]}
        ],
        "lines": [
            {"name": "14",
             "stations": [
                {"name": "Bercy", "latitude": 48.8401, "longitude": 2.3795},
                {"name": "Gare de Lyon", "latitude": 48.8443, "longitude": 2.3730},
                {"name": "Chatelet", "latitude": 48.8584, "longitude": 2.3470}
             ],
             "schedules": [
                {"line": "14", "terminus": "Olympiades", "schedules": [3600, 1800]},
                {"line": "14", "terminus": "Saint-Lazare", "schedules": [2700]}
             ]}
        ],
        "stationSchedules": [
            {"metroLine": "14", "station": "Bercy", "schedules": [300, 600]}
        ],
        "routes": [
            {"start": "Bercy", "end": "Chatelet", "objective": "TIME", "mode": "METRO_FOOT",
             "edges": [
                {"start": {"name": "Bercy", "latitude": 48.8401, "longitude": 2.3795},
                 "end": {"name": "Gare de Lyon", "latitude": 48.8443, "longitude": 2.3730},
                 "weight": 67458.0, "metroLine": "14", "terminusStation": "Saint-Lazare"},
                {"start": {"name": "Gare de Lyon", "latitude": 48.8443, "longitude": 2.3730},
                 "end": {"name": "Chatelet", "latitude": 48.8584, "longitude": 2.3470},
                 "weight": 67723.0, "metroLine": "14", "terminusStation": "Saint-Lazare"}
             ]}
        ]
    }"##;

    fn backend() -> SnapshotBackend {
        SnapshotBackend::from_snapshot(serde_json::from_str(SNAPSHOT).unwrap())
    }

    fn query(start: &str, end: &str) -> RouteQuery {
        RouteQuery {
            start: start.to_string(),
            end: end.to_string(),
            departure: 67440,
            objective: Objective::Time,
            mode: TransportMode::MetroFoot,
        }
    }

    #[test]
    fn test_best_path_replays_recorded_route() {
        let edges = backend().best_path(&query("Bercy", "Chatelet")).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].weight, 67723);

        let segments = group_path(&edges);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].terminus(), Some("Saint-Lazare"));
    }

    #[test]
    fn test_best_path_matches_objective_and_mode() {
        let backend = backend();
        let mut walking = query("Bercy", "Chatelet");
        walking.mode = TransportMode::Foot;
        assert!(matches!(
            backend.best_path(&walking),
            Err(MetroPathError::RouteNotFound { .. })
        ));

        let reversed = query("Chatelet", "Bercy");
        assert!(backend.best_path(&reversed).is_err());
    }

    #[test]
    fn test_reference_stations() {
        let references = backend().reference_stations().unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].station.name, "Chatelet");
    }

    #[test]
    fn test_recorded_station_schedule() {
        let schedule = backend().line_station_schedule("14", "Bercy").unwrap();
        assert_eq!(schedule.schedules, vec![300, 600]);
    }

    #[test]
    fn test_station_schedule_from_line_timetable() {
        let schedule = backend().line_station_schedule("14", "Chatelet").unwrap();
        assert_eq!(schedule.schedules, vec![1800, 2700, 3600]);
    }

    #[test]
    fn test_station_schedule_errors() {
        let backend = backend();
        assert!(matches!(
            backend.line_station_schedule("14", "Bastille"),
            Err(MetroPathError::ScheduleNotFound { .. })
        ));
        assert!(matches!(
            backend.line_station_schedule("99", "Bercy"),
            Err(MetroPathError::UnknownLine(_))
        ));
    }

    #[test]
    fn test_lines_are_names_only() {
        let backend = backend();
        let lines = backend.lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].stations.is_none());

        let detailed = backend.line("14").unwrap();
        assert_eq!(detailed.stations.map(|s| s.len()), Some(3));
        assert_eq!(detailed.schedules.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_filter_stations() {
        let stations = backend().stations().unwrap();

        let all: Vec<_> = filter_stations(&stations, "")
            .into_iter()
            .map(|stop| stop.name.as_str())
            .collect();
        assert_eq!(all, vec!["Bastille", "Bercy", "Chatelet", "Gare de Lyon"]);

        let b: Vec<_> = filter_stations(&stations, "b")
            .into_iter()
            .map(|stop| stop.name.as_str())
            .collect();
        assert_eq!(b, vec!["Bastille", "Bercy"]);

        assert!(filter_stations(&stations, "lyon").is_empty());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        let backend = SnapshotBackend::from_snapshot(snapshot);
        assert!(backend.stations().unwrap().is_empty());
        assert!(backend.reference_stations().unwrap().is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!(
            "metro-path-snapshot-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, SNAPSHOT).unwrap();

        let backend = SnapshotBackend::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(backend.snapshot().routes.len(), 1);
        assert_eq!(backend.correspondences().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_snapshot_fails() {
        let path = std::env::temp_dir().join(format!(
            "metro-path-bad-snapshot-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{\"routes\": 3}").unwrap();

        let result = SnapshotBackend::from_json_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(MetroPathError::Json(_))));
    }
}
