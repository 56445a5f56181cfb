use crate::core::credentials::ApiKey;
use crate::core::error::FetchError;
use crate::core::models::Coordinate;
use crate::core::settings::Settings;
use crate::providers::{DistanceMatrix, TravelTimeProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;

pub struct GoogleDistanceMatrix {
    client: reqwest::Client,
    endpoint: String,
    mode: String,
    key: ApiKey,
}

impl GoogleDistanceMatrix {
    pub fn new(settings: &Settings, key: ApiKey) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: settings.api.endpoint.clone(),
            mode: settings.api.mode.clone(),
            key,
        })
    }

    fn request(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> reqwest::Result<reqwest::Request> {
        let origins = join(origins);
        let destinations = join(destinations);

        self.client
            .get(&self.endpoint)
            .query(&[
                ("units", "metric"),
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", self.mode.as_str()),
                ("departure_time", "now"),
                ("key", self.key.expose()),
            ])
            .build()
    }
}

/// Classifies a response: non-2xx, unparseable and non-`OK` bodies all fail
/// the whole query.
pub fn parse_response(status: u16, body: String) -> Result<DistanceMatrix, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status { status, body });
    }

    let matrix: DistanceMatrix = match serde_json::from_str(&body) {
        Ok(matrix) => matrix,
        Err(e) => {
            return Err(FetchError::Malformed {
                reason: e.to_string(),
                body,
            })
        }
    };

    if !matrix.is_ok() {
        return Err(FetchError::Api {
            status: matrix.status.clone().unwrap_or_else(|| "missing".to_string()),
            message: matrix.error_message.clone(),
            body,
        });
    }

    Ok(matrix)
}

fn join(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

#[async_trait]
impl TravelTimeProvider for GoogleDistanceMatrix {
    fn name(&self) -> &'static str {
        "Google Distance Matrix"
    }

    async fn fetch_travel_times(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, FetchError> {
        let request = self.request(origins, destinations)?;
        let response = self.client.execute(request).await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_response(status, body)
    }
}
