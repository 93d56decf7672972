pub mod airlines;
pub mod filter;
pub mod histogram;
pub mod offer;
pub mod provider;
pub mod search;
pub mod session;
pub mod sort;

pub use airlines::{AirlineDirectory, AirlineNameResolver};
pub use filter::{apply_filters, available_airlines, FilterState, StopBucket};
pub use histogram::{average_price, build_histogram, min_price, PriceBucket, PriceSummary};
pub use offer::{FlightOffer, FlightSearchResponse, Itinerary, Price, Segment};
pub use provider::FlightProvider;
pub use search::{FlightSearchQuery, FlightSearchRequest, Location, LocationQuery, TravelClass};
pub use session::{ResultsView, SearchSession};
pub use sort::{sort_offers, SortKey};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{message}")]
    ValidationError { field: String, message: String },
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),
    #[error("{0}")]
    InvalidSearchError(String),
    #[error("{0}")]
    SearchFailedError(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
