use serde::Serialize;

use crate::airlines::{AirlineDirectory, AirlineNameResolver};
use crate::filter::{apply_filters, available_airlines, FilterState};
use crate::histogram::{build_histogram, PriceBucket, PriceSummary, DEFAULT_BUCKET_WIDTH};
use crate::offer::{FlightOffer, FlightSearchResponse};
use crate::sort::{sort_offers, SortKey};

/// Everything a results page renders, derived in one pass from the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    pub total_offers: usize,
    pub offers: Vec<FlightOffer>,
    pub histogram: Vec<PriceBucket>,
    pub summary: PriceSummary,
    pub available_airlines: Vec<String>,
    pub active_filters: usize,
    pub sort_key: SortKey,
}

/// In-memory state of one user's search: the raw offers plus the filter and
/// sort choices applied to them. Nothing derived is cached; every view is
/// recomputed from scratch.
#[derive(Debug, Clone)]
pub struct SearchSession<R = AirlineDirectory> {
    offers: Vec<FlightOffer>,
    filters: FilterState,
    sort_key: SortKey,
    bucket_width: u32,
    resolver: R,
}

impl SearchSession<AirlineDirectory> {
    /// Starts a session from a search response, teaching the directory any
    /// carrier names the response carries.
    pub fn from_response(response: FlightSearchResponse) -> Self {
        let directory = AirlineDirectory::new().with_carriers(response.carrier_names());
        let mut session = Self::new(directory);
        session.replace_offers(response.offers());
        session
    }
}

impl<R: AirlineNameResolver> SearchSession<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            offers: Vec::new(),
            filters: FilterState::default(),
            sort_key: SortKey::default(),
            bucket_width: DEFAULT_BUCKET_WIDTH,
            resolver,
        }
    }

    pub fn with_bucket_width(mut self, width: u32) -> Self {
        self.bucket_width = width;
        self
    }

    /// Swaps in a new result set and re-derives the price ceiling from it.
    pub fn replace_offers(&mut self, offers: Vec<FlightOffer>) {
        self.filters.recompute_max_price(&offers);
        self.offers = offers;
    }

    /// Drops the current results. Filter choices are kept.
    pub fn clear(&mut self) {
        self.offers.clear();
    }

    pub fn offers(&self) -> &[FlightOffer] {
        &self.offers
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn update_filters(&mut self, update: impl FnOnce(&mut FilterState)) {
        update(&mut self.filters);
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.sort_key = key;
    }

    pub fn available_airlines(&self) -> Vec<String> {
        available_airlines(&self.offers, &self.resolver)
    }

    pub fn filtered(&self) -> Vec<FlightOffer> {
        apply_filters(&self.offers, &self.filters, &self.resolver)
    }

    pub fn view(&self) -> ResultsView {
        let filtered = self.filtered();
        ResultsView {
            total_offers: self.offers.len(),
            histogram: build_histogram(&filtered, self.bucket_width),
            summary: PriceSummary::of(&filtered),
            offers: sort_offers(&filtered, self.sort_key),
            available_airlines: self.available_airlines(),
            active_filters: self.filters.active_filter_count(),
            sort_key: self.sort_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::StopBucket;
    use crate::offer::fixtures::offer;

    fn session() -> SearchSession {
        let mut session = SearchSession::new(AirlineDirectory::new());
        session.replace_offers(vec![
            offer("1", "120.00", &[&["AA"]]),
            offer("2", "75.50", &[&["BA", "AA"]]),
            offer("3", "75.50", &[&["LH", "LH", "LH"]]),
            offer("4", "300.00", &[&["UA"], &["BA"]]),
        ]);
        session
    }

    #[test]
    fn test_new_results_widen_price_range() {
        let session = session();
        assert_eq!(session.filters().max_price(), 300);
        assert_eq!(session.filters().price_range(), (0, 300));

        let view = session.view();
        assert_eq!(view.total_offers, 4);
        assert_eq!(view.offers.len(), 4);
        assert_eq!(view.active_filters, 0);
        assert_eq!(view.summary.average, 143);
    }

    #[test]
    fn test_view_tracks_filter_changes() {
        let mut session = session();
        session.update_filters(|f| f.set_price_range(0, 200));

        let view = session.view();
        assert_eq!(view.offers.len(), 3);
        assert_eq!(view.summary.count, 3);
        assert_eq!(view.histogram.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(view.active_filters, 1);
        // facets come from the unfiltered set
        assert_eq!(view.available_airlines.len(), 4);
    }

    #[test]
    fn test_view_is_sorted() {
        let mut session = session();
        let ids: Vec<String> = session.view().offers.into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["2", "3", "1", "4"]);

        session.set_sort_key(SortKey::Departure);
        session.update_filters(|f| f.toggle_stop(StopBucket::NonStop));
        let ids: Vec<String> = session.view().offers.into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_reset_keeps_ceiling() {
        let mut session = session();
        session.update_filters(|f| {
            f.set_price_range(50, 100);
            f.toggle_airline("Lufthansa");
        });
        assert_eq!(session.view().offers.len(), 1);

        session.reset_filters();
        assert_eq!(session.filters(), &FilterState::new(300));
        assert_eq!(session.view().offers.len(), 4);
    }

    #[test]
    fn test_empty_results_keep_ceiling() {
        let mut session = session();
        session.replace_offers(vec![]);
        assert_eq!(session.filters().max_price(), 300);
        let view = session.view();
        assert!(view.histogram.is_empty());
        assert_eq!(view.summary.minimum, 0.0);
    }

    #[test]
    fn test_from_response_uses_carrier_dictionary() {
        let response = FlightSearchResponse {
            data: vec![serde_json::to_value(offer("1", "210.00", &[&["6X"]])).unwrap()],
            dictionaries: Some(serde_json::json!({ "carriers": { "6X": "AMADEUS SIX" } })),
            meta: None,
            extra: serde_json::Map::new(),
        };
        let session = SearchSession::from_response(response);
        assert_eq!(session.available_airlines(), vec!["AMADEUS SIX"]);
        assert_eq!(session.filters().max_price(), 300);
    }
}
