//! Clock and duration formatting for itineraries
//!
//! Path weights are seconds from midnight of the journey day. Clock strings
//! use the 12-hour `hh:mm:ss AM` face; schedule strings use `H:MM`.

use crate::{MetroPathError, Result, Segment};
use chrono::{Local, NaiveTime, TimeDelta, Timelike};
use std::fmt;

const CLOCK_FORMAT: &str = "%I:%M:%S %p";

/// Formats accepted for a departure time, tried in order
const DEPARTURE_FORMATS: &[&str] = &["%I:%M:%S %p", "%I:%M %p", "%H:%M:%S", "%H:%M"];

/// Format a wall-clock time as `hh:mm:ss AM`
pub fn format_clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// Clock face of a weight, counted from midnight
///
/// A full day or more wraps around to the same face: there is no day rollover.
pub fn weight_to_clock(seconds: u32) -> String {
    let (time, _) = NaiveTime::MIN.overflowing_add_signed(TimeDelta::seconds(i64::from(seconds)));
    format_clock(time)
}

/// Render a schedule offset as `H:MM`
///
/// Minutes are rounded, not truncated.
pub fn number_to_schedule(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = ((f64::from(seconds) / 3600.0 - f64::from(hours)) * 60.0).round() as u32;
    format!("{hours}:{minutes:02}")
}

/// Drop the seconds (and sub-seconds) of a time
pub fn truncate_seconds(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Parse a user supplied departure time; seconds are always reset to zero
pub fn parse_departure(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    DEPARTURE_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        .map(truncate_seconds)
        .ok_or_else(|| MetroPathError::InvalidTime(text.to_string()))
}

/// Departure from optional user input, falling back to the current local time
pub fn departure_or_now(text: Option<&str>) -> NaiveTime {
    match text.map(parse_departure) {
        Some(Ok(time)) => time,
        Some(Err(e)) => {
            tracing::warn!("{e}, departing now");
            truncate_seconds(Local::now().time())
        }
        None => truncate_seconds(Local::now().time()),
    }
}

/// Seconds from midnight sent to the backend as the departure
pub fn departure_offset(time: NaiveTime) -> u32 {
    truncate_seconds(time).num_seconds_from_midnight()
}

/// Elapsed journey time split into whole hours, minutes and seconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JourneyDuration {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl JourneyDuration {
    /// Split `end - start` by moving an anchor from `start` by whole hours,
    /// then whole minutes, and keeping what is left as seconds.
    ///
    /// Each step truncates toward zero, so an end before the start yields
    /// non-positive components.
    // TODO: decide how journeys spanning midnight should be reported; the
    // backend only ever returns same-day weights today.
    fn between(start: i64, end: i64) -> Self {
        let mut anchor = start;
        let hours = (end - anchor) / 3600;
        anchor += hours * 3600;
        let minutes = (end - anchor) / 60;
        anchor += minutes * 60;
        let seconds = end - anchor;
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for JourneyDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_seconds() < 0 {
            f.write_str("-")?;
        }
        let (hours, minutes, seconds) = (
            self.hours.abs(),
            self.minutes.abs(),
            self.seconds.abs(),
        );
        if hours != 0 {
            write!(f, "{hours}:{minutes:02}:{seconds:02}")
        } else {
            write!(f, "{minutes:02}:{seconds:02}")
        }
    }
}

/// One row of a displayed itinerary
#[derive(Clone, Debug, PartialEq)]
pub struct ItineraryLeg<'a> {
    pub segment: &'a Segment,
    pub departs: String,
    pub arrives: String,
}

/// Wall-clock annotations of grouped segments
#[derive(Clone, Copy, Debug)]
pub struct TimeAnnotator<'a> {
    departure: NaiveTime,
    segments: &'a [Segment],
}

impl<'a> TimeAnnotator<'a> {
    pub fn new(departure: NaiveTime, segments: &'a [Segment]) -> Self {
        Self {
            departure,
            segments,
        }
    }

    pub fn departure(&self) -> NaiveTime {
        self.departure
    }

    /// Departure time of a segment: the journey start for the first one,
    /// otherwise the arrival of the previous segment
    pub fn start_time_of(&self, index: usize) -> Option<String> {
        if index >= self.segments.len() {
            return None;
        }
        match index.checked_sub(1) {
            None => Some(format_clock(self.departure)),
            Some(previous) => Some(weight_to_clock(self.segments[previous].arrival_weight())),
        }
    }

    /// Arrival time of a segment
    pub fn end_time_of(&self, index: usize) -> Option<String> {
        self.segments
            .get(index)
            .map(|segment| weight_to_clock(segment.arrival_weight()))
    }

    /// Time between the journey start and the final arrival
    pub fn duration(&self) -> Option<JourneyDuration> {
        let last = self.segments.last()?;
        let start = i64::from(self.departure.num_seconds_from_midnight());
        let end = i64::from(last.arrival_weight());
        Some(JourneyDuration::between(start, end))
    }

    /// Every segment with its departure and arrival strings
    pub fn legs(&self) -> Vec<ItineraryLeg<'a>> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| {
                Some(ItineraryLeg {
                    segment,
                    departs: self.start_time_of(index)?,
                    arrives: self.end_time_of(index)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Stop, group_path};

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn line_14() -> Vec<Segment> {
        let bercy = Stop::new("Bercy", 48.8401, 2.3795);
        let gare_de_lyon = Stop::new("Gare de Lyon", 48.8443, 2.3730);
        let chatelet = Stop::new("Chatelet", 48.8584, 2.3470);
        group_path(&[
            Edge::new(bercy, gare_de_lyon.clone(), 67458).on_line("14", "Bercy"),
            Edge::new(gare_de_lyon, chatelet, 67723).on_line("14", "Bercy"),
        ])
    }

    #[test]
    fn test_weight_to_clock() {
        assert_eq!(weight_to_clock(53100), "02:45:00 PM");
        assert_eq!(weight_to_clock(0), "12:00:00 AM");
        assert_eq!(weight_to_clock(43200), "12:00:00 PM");
    }

    #[test]
    fn test_weight_to_clock_wraps_full_day() {
        assert_eq!(weight_to_clock(86400 + 53100), weight_to_clock(53100));
    }

    #[test]
    fn test_number_to_schedule() {
        assert_eq!(number_to_schedule(3600), "1:00");
        assert_eq!(number_to_schedule(3660), "1:01");
        assert_eq!(number_to_schedule(36000), "10:00");
        assert_eq!(number_to_schedule(0), "0:00");
        assert_eq!(number_to_schedule(5430), "1:31"); // 30 s rounds up
    }

    #[test]
    fn test_parse_departure_formats() {
        assert_eq!(parse_departure("06:30:45 PM").unwrap(), at(18, 30, 0));
        assert_eq!(parse_departure("06:30 am").unwrap(), at(6, 30, 0));
        assert_eq!(parse_departure("18:44:12").unwrap(), at(18, 44, 0));
        assert_eq!(parse_departure(" 07:05 ").unwrap(), at(7, 5, 0));
        assert!(parse_departure("tomorrow").is_err());
    }

    #[test]
    fn test_departure_fallback_zeroes_seconds() {
        assert_eq!(departure_or_now(Some("not a time")).second(), 0);
        assert_eq!(departure_or_now(None).second(), 0);
        assert_eq!(departure_or_now(Some("08:15")), at(8, 15, 0));
    }

    #[test]
    fn test_departure_offset() {
        assert_eq!(departure_offset(at(18, 44, 0)), 67440);
        assert_eq!(departure_offset(at(18, 44, 59)), 67440);
    }

    #[test]
    fn test_start_and_end_times() {
        let segments = line_14();
        let annotator = TimeAnnotator::new(at(18, 44, 0), &segments);

        assert_eq!(annotator.start_time_of(0).unwrap(), "06:44:00 PM");
        assert_eq!(annotator.end_time_of(0).unwrap(), weight_to_clock(67723));
        assert_eq!(annotator.start_time_of(1), None);
        assert_eq!(annotator.end_time_of(1), None);
    }

    #[test]
    fn test_start_time_follows_previous_segment() {
        let a = Stop::new("A", 0.0, 0.0);
        let b = Stop::new("B", 0.0, 1.0);
        let c = Stop::new("C", 0.0, 2.0);
        let segments = group_path(&[
            Edge::new(a, b.clone(), 3600).on_line("1", "C"),
            Edge::new(b, c, 7200),
        ]);
        let annotator = TimeAnnotator::new(at(0, 30, 0), &segments);

        assert_eq!(annotator.start_time_of(1).unwrap(), "01:00:00 AM");
        assert_eq!(annotator.end_time_of(1).unwrap(), "02:00:00 AM");
    }

    #[test]
    fn test_duration_same_day() {
        let segments = line_14();
        let annotator = TimeAnnotator::new(at(18, 44, 0), &segments);
        let duration = annotator.duration().unwrap();

        // 67723 - 67440 = 283 s
        assert_eq!(duration.hours, 0);
        assert_eq!(duration.minutes, 4);
        assert_eq!(duration.seconds, 43);
        assert_eq!(duration.to_string(), "04:43");
    }

    #[test]
    fn test_duration_with_hours() {
        let a = Stop::new("A", 0.0, 0.0);
        let b = Stop::new("B", 0.0, 1.0);
        let segments = group_path(&[Edge::new(a, b, 3600 + 3600 + 65)]);
        let annotator = TimeAnnotator::new(at(1, 0, 0), &segments);

        assert_eq!(annotator.duration().unwrap().to_string(), "1:01:05");
    }

    #[test]
    fn test_duration_before_start_is_negative() {
        let a = Stop::new("A", 0.0, 0.0);
        let b = Stop::new("B", 0.0, 1.0);
        let segments = group_path(&[Edge::new(a, b, 60)]);
        let annotator = TimeAnnotator::new(at(0, 2, 0), &segments);
        let duration = annotator.duration().unwrap();

        assert_eq!(duration.total_seconds(), -60);
        assert_eq!(duration.to_string(), "-01:00");
    }

    #[test]
    fn test_empty_path_is_guarded() {
        let annotator = TimeAnnotator::new(at(9, 0, 0), &[]);
        assert_eq!(annotator.start_time_of(0), None);
        assert_eq!(annotator.end_time_of(0), None);
        assert_eq!(annotator.duration(), None);
        assert!(annotator.legs().is_empty());
    }

    #[test]
    fn test_legs() {
        let segments = line_14();
        let annotator = TimeAnnotator::new(at(18, 44, 0), &segments);
        let legs = annotator.legs();

        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].departs, "06:44:00 PM");
        assert_eq!(legs[0].arrives, "06:48:43 PM");
        assert_eq!(legs[0].segment.stop_names(), vec!["Bercy", "Gare de Lyon", "Chatelet"]);
    }
}
