use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::airlines::AirlineNameResolver;
use crate::offer::FlightOffer;

pub const DEFAULT_MAX_PRICE: u64 = 5000;
const MAX_PRICE_STEP: f64 = 100.0;

/// Outbound stop count, with everything from two stops up folded into one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum StopBucket {
    NonStop,
    OneStop,
    TwoPlus,
}

impl From<usize> for StopBucket {
    fn from(stops: usize) -> Self {
        match stops {
            0 => StopBucket::NonStop,
            1 => StopBucket::OneStop,
            _ => StopBucket::TwoPlus,
        }
    }
}

impl From<u32> for StopBucket {
    fn from(stops: u32) -> Self {
        StopBucket::from(stops as usize)
    }
}

impl From<StopBucket> for u32 {
    fn from(bucket: StopBucket) -> Self {
        match bucket {
            StopBucket::NonStop => 0,
            StopBucket::OneStop => 1,
            StopBucket::TwoPlus => 2,
        }
    }
}

impl fmt::Display for StopBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopBucket::NonStop => f.write_str("Non-stop"),
            StopBucket::OneStop => f.write_str("1 stop"),
            StopBucket::TwoPlus => f.write_str("2+ stops"),
        }
    }
}

/// User-selected filter criteria.
///
/// Invariant: `0 <= price_range.0 <= price_range.1 <= max_price`. Every
/// mutator below preserves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    price_range: (u64, u64),
    max_price: u64,
    stops: BTreeSet<StopBucket>,
    airlines: BTreeSet<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PRICE)
    }
}

impl FilterState {
    /// Full price range, no stop or airline criteria.
    pub fn new(max_price: u64) -> Self {
        Self {
            price_range: (0, max_price),
            max_price,
            stops: BTreeSet::new(),
            airlines: BTreeSet::new(),
        }
    }

    pub fn price_range(&self) -> (u64, u64) {
        self.price_range
    }

    pub fn max_price(&self) -> u64 {
        self.max_price
    }

    pub fn stops(&self) -> &BTreeSet<StopBucket> {
        &self.stops
    }

    pub fn airlines(&self) -> &BTreeSet<String> {
        &self.airlines
    }

    /// Sets the accepted price range, reordering and clamping into `[0, max_price]`.
    pub fn set_price_range(&mut self, low: u64, high: u64) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let high = high.min(self.max_price);
        self.price_range = (low.min(high), high);
    }

    pub fn with_price_range(mut self, low: u64, high: u64) -> Self {
        self.set_price_range(low, high);
        self
    }

    pub fn set_stops(&mut self, stops: impl IntoIterator<Item = StopBucket>) {
        self.stops = stops.into_iter().collect();
    }

    pub fn with_stops(mut self, stops: impl IntoIterator<Item = StopBucket>) -> Self {
        self.set_stops(stops);
        self
    }

    pub fn set_airlines<S: Into<String>>(&mut self, airlines: impl IntoIterator<Item = S>) {
        self.airlines = airlines.into_iter().map(Into::into).collect();
    }

    pub fn with_airlines<S: Into<String>>(mut self, airlines: impl IntoIterator<Item = S>) -> Self {
        self.set_airlines(airlines);
        self
    }

    /// Adds the bucket if absent, removes it otherwise.
    pub fn toggle_stop(&mut self, bucket: StopBucket) {
        if !self.stops.remove(&bucket) {
            self.stops.insert(bucket);
        }
    }

    pub fn toggle_airline(&mut self, airline: &str) {
        if !self.airlines.remove(airline) {
            self.airlines.insert(airline.to_string());
        }
    }

    /// Clears stop and airline criteria and reopens the full price range.
    /// `max_price` survives the reset.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_price);
    }

    /// Picks up the price ceiling of a fresh result set. An empty set leaves
    /// the state untouched; otherwise the range is widened to the new ceiling.
    pub fn recompute_max_price(&mut self, offers: &[FlightOffer]) {
        if let Some(max_price) = max_price_ceiling(offers) {
            self.max_price = max_price;
            self.price_range = (0, max_price);
        }
    }

    /// Number of criteria currently narrowing the results.
    pub fn active_filter_count(&self) -> usize {
        let price_narrowed = self.price_range.0 > 0 || self.price_range.1 < self.max_price;
        usize::from(!self.stops.is_empty())
            + usize::from(!self.airlines.is_empty())
            + usize::from(price_narrowed)
    }

    pub fn is_empty(&self) -> bool {
        self.active_filter_count() == 0
    }
}

/// Highest offer price rounded up to the next multiple of 100.
///
/// `None` when no offer carries a parseable price.
pub fn max_price_ceiling(offers: &[FlightOffer]) -> Option<u64> {
    offers
        .iter()
        .filter_map(FlightOffer::total_price)
        .reduce(f64::max)
        .map(|max| ((max / MAX_PRICE_STEP).ceil() * MAX_PRICE_STEP).max(0.0) as u64)
}

/// Keeps the offers that pass the price, stop and airline criteria, in their
/// original order.
pub fn apply_filters<R>(offers: &[FlightOffer], filters: &FilterState, resolver: &R) -> Vec<FlightOffer>
where
    R: AirlineNameResolver + ?Sized,
{
    offers
        .iter()
        .filter(|offer| matches_price(offer, filters))
        .filter(|offer| matches_stops(offer, filters))
        .filter(|offer| matches_airlines(offer, filters, resolver))
        .cloned()
        .collect()
}

fn matches_price(offer: &FlightOffer, filters: &FilterState) -> bool {
    let (low, high) = filters.price_range;
    offer
        .total_price()
        .is_some_and(|price| low as f64 <= price && price <= high as f64)
}

fn matches_stops(offer: &FlightOffer, filters: &FilterState) -> bool {
    if filters.stops.is_empty() {
        return true;
    }
    offer
        .outbound_stops()
        .is_some_and(|stops| filters.stops.contains(&StopBucket::from(stops)))
}

fn matches_airlines<R>(offer: &FlightOffer, filters: &FilterState, resolver: &R) -> bool
where
    R: AirlineNameResolver + ?Sized,
{
    if filters.airlines.is_empty() {
        return true;
    }
    offer
        .carrier_codes()
        .any(|code| filters.airlines.contains(&resolver.display_name(code)))
}

/// Distinct airline display names across every segment of every offer, sorted.
pub fn available_airlines<R>(offers: &[FlightOffer], resolver: &R) -> Vec<String>
where
    R: AirlineNameResolver + ?Sized,
{
    offers
        .iter()
        .flat_map(FlightOffer::carrier_codes)
        .map(|code| resolver.display_name(code))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
