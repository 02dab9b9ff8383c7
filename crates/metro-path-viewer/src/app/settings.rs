use crate::app::state::TilesProvider;
use clap::Parser;
use metro_path_lib::{Objective, TransportMode};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Metro Path Viewer - Search and display computed metro itineraries on a map
pub struct Settings {
    /// Recorded backend answers (stations, lines, schedules, routes) to replay
    #[clap(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// JSON object mapping line identifiers to hex colors, replacing the built-in table
    #[clap(long, value_name = "FILE")]
    pub line_colors: Option<PathBuf>,

    /// Default route objective (TIME, DISTANCE or TIME_DISTANCE)
    #[clap(short, long, default_value = "TIME")]
    pub objective: Objective,

    /// Default transportation mode (METRO, METRO_FOOT or FOOT)
    #[clap(short, long, default_value = "METRO_FOOT")]
    pub mode: TransportMode,

    /// Departure time filled into the search form, e.g. "06:44 PM" or "18:44"
    #[clap(short, long)]
    pub departure: Option<String>,

    /// Map tiles (osm or carto)
    #[clap(long, default_value = "carto")]
    pub tiles: TilesProvider,

    /// Path line width in pixels
    #[clap(long, default_value = "4.0")]
    pub line_width: f32,

    /// Ignore previously persisted state and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,
}

impl Settings {
    /// Parse the process arguments, exiting with clap's message on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse_from(["metro-path-viewer"]);
        assert_eq!(settings.objective, Objective::Time);
        assert_eq!(settings.mode, TransportMode::MetroFoot);
        assert!(settings.snapshot.is_none());
        assert_eq!(settings.line_width, 4.0);
        assert_eq!(settings.tiles, TilesProvider::CartoPositron);
    }

    #[test]
    fn test_parse_arguments() {
        let settings = Settings::parse_from([
            "metro-path-viewer",
            "--snapshot",
            "paris.json",
            "--objective",
            "time_distance",
            "--mode",
            "FOOT",
            "--departure",
            "18:44",
            "--tiles",
            "OSM",
        ]);
        assert_eq!(settings.snapshot, Some(PathBuf::from("paris.json")));
        assert_eq!(settings.objective, Objective::TimeDistance);
        assert_eq!(settings.mode, TransportMode::Foot);
        assert_eq!(settings.departure.as_deref(), Some("18:44"));
        assert_eq!(settings.tiles, TilesProvider::OpenStreetMap);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Settings::try_parse_from(["metro-path-viewer", "--mode", "BIKE"]).is_err());
    }
}
