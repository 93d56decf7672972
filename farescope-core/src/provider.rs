use async_trait::async_trait;

use crate::offer::FlightSearchResponse;
use crate::search::{FlightSearchRequest, Location, LocationQuery};
use crate::CoreResult;

/// Source of flight offers and location records.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    /// Search for offers. Upstream rejections map to
    /// `InvalidSearchError`, credential problems to `AuthenticationError`,
    /// everything else to `SearchFailedError`.
    async fn search_flights(&self, request: &FlightSearchRequest) -> CoreResult<FlightSearchResponse>;

    /// Look up airports and cities. Upstream failures other than
    /// authentication degrade to an empty list.
    async fn search_locations(&self, query: &LocationQuery) -> CoreResult<Vec<Location>>;
}
