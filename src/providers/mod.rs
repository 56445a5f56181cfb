mod google;
pub(crate) mod matrix;

use crate::core::error::FetchError;
use crate::core::models::Coordinate;
use async_trait::async_trait;

pub use google::GoogleDistanceMatrix;
pub use matrix::DistanceMatrix;

/// Source of travel times, indexed `[origin][destination]` in request order.
#[async_trait]
pub trait TravelTimeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_travel_times(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, FetchError>;
}
