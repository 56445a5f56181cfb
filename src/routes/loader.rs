use crate::core::error::SourceFormatError;
use crate::core::models::{Coordinate, Location};
use std::collections::HashMap;
use std::path::Path;

/// Reads a location source: an optional header line, then alternating
/// label and `lat,lon` lines. Blank lines are ignored.
pub fn load(path: &Path, has_header: bool) -> Result<Vec<Location>, SourceFormatError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let locations = parse(path, &content, has_header)?;
    tracing::info!(
        ?path,
        count = locations.len(),
        "Loaded locations from source"
    );
    Ok(locations)
}

pub fn parse(
    path: &Path,
    content: &str,
    has_header: bool,
) -> Result<Vec<Location>, SourceFormatError> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    if has_header {
        if let Some((_, header)) = lines.next() {
            tracing::debug!(?path, header, "Skipping header line");
        }
    }

    let mut locations = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    while let Some((label_line, label)) = lines.next() {
        let Some((coord_line, raw)) = lines.next() else {
            return Err(SourceFormatError::MissingCoordinate {
                path: path.to_path_buf(),
                line: label_line,
                label: label.to_string(),
            });
        };

        let coordinate =
            parse_coordinate(raw).map_err(|reason| SourceFormatError::InvalidCoordinate {
                path: path.to_path_buf(),
                line: coord_line,
                value: raw.to_string(),
                reason,
            })?;

        if let Some(&first_line) = seen.get(label) {
            return Err(SourceFormatError::DuplicateLabel {
                path: path.to_path_buf(),
                label: label.to_string(),
                line: label_line,
                first_line,
            });
        }
        seen.insert(label.to_string(), label_line);

        locations.push(Location {
            label: label.to_string(),
            coordinate,
        });
    }

    if locations.is_empty() {
        return Err(SourceFormatError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(locations)
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| "expected a comma between latitude and longitude".to_string())?;

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("latitude: {e}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("longitude: {e}"))?;

    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} is out of range"));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} is out of range"));
    }

    Ok(Coordinate::new(lat, lon))
}
