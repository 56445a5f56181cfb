use crate::core::error::WriteError;
use crate::core::models::{Measurement, TIMESTAMP_FORMAT};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const LOG_HEADER: [&str; 4] = ["Time", "Distance", "Duration", "Duration in Traffic"];

/// Append-only CSV logs, one file per origin/destination pair.
#[derive(Debug, Clone)]
pub struct LogStore {
    root: PathBuf,
}

impl LogStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[allow(dead_code)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, origin_label: &str, destination_label: &str) -> PathBuf {
        self.root.join(format!(
            "{} to {}.csv",
            sanitize(origin_label),
            sanitize(destination_label)
        ))
    }

    /// Appends one row, writing the header first if the file is new or empty.
    pub fn append(&self, measurement: &Measurement) -> Result<PathBuf, WriteError> {
        let path = self.path_for(&measurement.origin_label, &measurement.destination_label);
        let io_err = |source: std::io::Error| WriteError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.root).map_err(io_err)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let is_new = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        let csv_err = |source: csv::Error| WriteError::Csv {
            path: path.clone(),
            source,
        };

        if is_new {
            writer.write_record(LOG_HEADER).map_err(csv_err)?;
        }

        writer
            .write_record([
                measurement.formatted_timestamp(),
                measurement.distance_meters.to_string(),
                measurement.duration_seconds.to_string(),
                measurement.duration_in_traffic_seconds.to_string(),
            ])
            .map_err(csv_err)?;
        writer.flush().map_err(io_err)?;

        tracing::debug!(?path, "Appended measurement");
        Ok(path)
    }

    /// Reads a log back. A missing log is an empty history.
    #[allow(dead_code)]
    pub fn read(&self, origin_label: &str, destination_label: &str) -> Result<Vec<Measurement>> {
        let path = self.path_for(origin_label, destination_label);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .with_context(|| format!("Failed to open log {}", path.display()))?;

        let mut measurements = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("Failed to read row {} of {}", row + 1, path.display()))?;
            let field = |i: usize| {
                record
                    .get(i)
                    .with_context(|| format!("Row {} of {} has no column {}", row + 1, path.display(), i))
            };

            let timestamp = NaiveDateTime::parse_from_str(field(0)?, TIMESTAMP_FORMAT)
                .with_context(|| format!("Bad timestamp in row {} of {}", row + 1, path.display()))?;

            measurements.push(Measurement {
                timestamp,
                origin_label: origin_label.to_string(),
                destination_label: destination_label.to_string(),
                distance_meters: field(1)?.parse()?,
                duration_seconds: field(2)?.parse()?,
                duration_in_traffic_seconds: field(3)?.parse()?,
            });
        }

        Ok(measurements)
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}
