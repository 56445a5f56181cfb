use crate::core::error::PartialResultError;
use crate::core::models::TravelTime;
use serde::Deserialize;

/// Distance Matrix response body. Every field is optional so truncated or
/// partial responses still deserialize and can be inspected element by element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistanceMatrix {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixElement {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub distance: Option<MatrixValue>,
    #[serde(default)]
    pub duration: Option<MatrixValue>,
    #[serde(default)]
    pub duration_in_traffic: Option<MatrixValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixValue {
    #[serde(default)]
    pub value: Option<u64>,
}

impl DistanceMatrix {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("OK")
    }

    pub fn element(&self, origin: usize, index: usize) -> Result<&MatrixElement, PartialResultError> {
        self.rows
            .get(origin)
            .ok_or(PartialResultError::MissingRow { origin })?
            .elements
            .get(index)
            .ok_or(PartialResultError::MissingElement { index })
    }

    /// Parses element `[origin][index]`. Never substitutes a value for a
    /// missing field.
    pub fn travel_time(&self, origin: usize, index: usize) -> Result<TravelTime, PartialResultError> {
        let element = self.element(origin, index)?;

        if let Some(status) = element.status.as_deref() {
            if status != "OK" {
                return Err(PartialResultError::ElementStatus {
                    index,
                    status: status.to_string(),
                });
            }
        }

        let value = |field: &Option<MatrixValue>, name: &'static str| {
            field
                .as_ref()
                .and_then(|v| v.value)
                .ok_or(PartialResultError::MissingField { index, field: name })
        };

        Ok(TravelTime {
            distance_meters: value(&element.distance, "distance")?,
            duration_seconds: value(&element.duration, "duration")?,
            duration_in_traffic_seconds: value(&element.duration_in_traffic, "duration_in_traffic")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "destination_addresses": ["Petaluma, CA", "Sebastopol, CA"],
        "origin_addresses": ["Santa Rosa, CA"],
        "rows": [{
            "elements": [
                {
                    "distance": {"text": "1.0 km", "value": 1000},
                    "duration": {"text": "2 mins", "value": 120},
                    "duration_in_traffic": {"text": "3 mins", "value": 180},
                    "status": "OK"
                },
                {
                    "distance": {"text": "12 km", "value": 12000},
                    "duration": {"text": "14 mins", "value": 840},
                    "status": "OK"
                }
            ]
        }],
        "status": "OK"
    }"#;

    #[test]
    fn test_parse_sample_element() {
        let matrix: DistanceMatrix = serde_json::from_str(SAMPLE).unwrap();
        assert!(matrix.is_ok());
        assert_eq!(
            matrix.travel_time(0, 0).unwrap(),
            TravelTime {
                distance_meters: 1000,
                duration_seconds: 120,
                duration_in_traffic_seconds: 180,
            }
        );
    }

    #[test]
    fn test_missing_traffic_field_is_partial() {
        let matrix: DistanceMatrix = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(
            matrix.travel_time(0, 1),
            Err(PartialResultError::MissingField {
                index: 1,
                field: "duration_in_traffic"
            })
        );
    }

    #[test]
    fn test_truncated_elements() {
        let matrix: DistanceMatrix = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(
            matrix.travel_time(0, 2),
            Err(PartialResultError::MissingElement { index: 2 })
        );
        assert_eq!(
            matrix.travel_time(1, 0),
            Err(PartialResultError::MissingRow { origin: 1 })
        );
    }

    #[test]
    fn test_element_status_not_ok() {
        let body = r#"{"status": "OK", "rows": [{"elements": [{"status": "ZERO_RESULTS"}]}]}"#;
        let matrix: DistanceMatrix = serde_json::from_str(body).unwrap();
        assert_eq!(
            matrix.travel_time(0, 0),
            Err(PartialResultError::ElementStatus {
                index: 0,
                status: "ZERO_RESULTS".to_string()
            })
        );
    }

    #[test]
    fn test_error_body_deserializes() {
        let body = r#"{"error_message": "The provided API key is invalid.", "rows": [], "status": "REQUEST_DENIED"}"#;
        let matrix: DistanceMatrix = serde_json::from_str(body).unwrap();
        assert!(!matrix.is_ok());
        assert_eq!(
            matrix.error_message.as_deref(),
            Some("The provided API key is invalid.")
        );
    }
}
