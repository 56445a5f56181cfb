use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Local wall-clock format used for the `Time` column of every log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub label: String,
    pub coordinate: Coordinate,
}

impl Location {
    #[allow(dead_code)]
    pub fn new(label: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            label: label.into(),
            coordinate: Coordinate::new(lat, lon),
        }
    }
}

/// One fetch call: a single origin against up to one batch of destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<'a> {
    pub origin: &'a Location,
    pub destinations: Vec<&'a Location>,
}

impl Query<'_> {
    pub fn destination_coordinates(&self) -> Vec<Coordinate> {
        self.destinations.iter().map(|d| d.coordinate).collect()
    }

    pub fn destination_labels(&self) -> Vec<&str> {
        self.destinations.iter().map(|d| d.label.as_str()).collect()
    }
}

/// Parsed contents of one matrix element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelTime {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub duration_in_traffic_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub origin_label: String,
    pub destination_label: String,
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub duration_in_traffic_seconds: u64,
}

impl Measurement {
    pub fn new(
        timestamp: NaiveDateTime,
        origin_label: &str,
        destination_label: &str,
        travel: TravelTime,
    ) -> Self {
        Self {
            timestamp,
            origin_label: origin_label.to_string(),
            destination_label: destination_label.to_string(),
            distance_meters: travel.distance_meters,
            duration_seconds: travel.duration_seconds,
            duration_in_traffic_seconds: travel.duration_in_traffic_seconds,
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Counters for one planning + fetch + write cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub queries: usize,
    pub failed_queries: usize,
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub write_failures: usize,
}

impl TickReport {
    pub fn merge(&mut self, other: TickReport) {
        self.queries += other.queries;
        self.failed_queries += other.failed_queries;
        self.rows_written += other.rows_written;
        self.rows_skipped += other.rows_skipped;
        self.write_failures += other.write_failures;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_coordinate_display() {
        assert_eq!(
            Coordinate::new(37.413611, -122.168969).to_string(),
            "37.413611,-122.168969"
        );
        assert_eq!(Coordinate::new(38.0, -122.5).to_string(), "38,-122.5");
    }

    #[test]
    fn test_query_destination_views() {
        let a = Location::new("A", 1.0, 2.0);
        let b = Location::new("B", 3.0, 4.0);
        let c = Location::new("C", 5.0, 6.0);
        let query = Query {
            origin: &a,
            destinations: vec![&b, &c],
        };

        assert_eq!(query.destination_labels(), vec!["B", "C"]);
        assert_eq!(
            query.destination_coordinates(),
            vec![Coordinate::new(3.0, 4.0), Coordinate::new(5.0, 6.0)]
        );
    }

    #[test]
    fn test_measurement_timestamp_format() {
        let timestamp = NaiveDate::from_ymd_opt(2021, 10, 25)
            .unwrap()
            .and_hms_micro_opt(6, 5, 9, 120)
            .unwrap();
        let measurement = Measurement::new(
            timestamp,
            "95401",
            "95404",
            TravelTime {
                distance_meters: 1000,
                duration_seconds: 120,
                duration_in_traffic_seconds: 180,
            },
        );
        assert_eq!(
            measurement.formatted_timestamp(),
            "2021-10-25 06:05:09.000120"
        );
    }

    #[test]
    fn test_tick_report_merge() {
        let mut total = TickReport::default();
        total.merge(TickReport {
            queries: 2,
            failed_queries: 1,
            rows_written: 3,
            rows_skipped: 1,
            write_failures: 0,
        });
        total.merge(TickReport {
            queries: 1,
            failed_queries: 0,
            rows_written: 2,
            rows_skipped: 0,
            write_failures: 1,
        });
        assert_eq!(total.queries, 3);
        assert_eq!(total.failed_queries, 1);
        assert_eq!(total.rows_written, 5);
        assert_eq!(total.rows_skipped, 1);
        assert_eq!(total.write_failures, 1);
    }
}
