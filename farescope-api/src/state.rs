use std::sync::Arc;

use farescope_core::FlightProvider;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn FlightProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn FlightProvider>) -> Self {
        Self { provider }
    }
}
