use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::offer::FlightOffer;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Lowest total first
    #[default]
    Price,
    /// Shortest outbound itinerary first
    Duration,
    /// Earliest first departure first
    Departure,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Price => "Lowest Price",
            SortKey::Duration => "Shortest Duration",
            SortKey::Departure => "Earliest Departure",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Price => f.write_str("price"),
            SortKey::Duration => f.write_str("duration"),
            SortKey::Departure => f.write_str("departure"),
        }
    }
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(SortKey::Price),
            "duration" => Ok(SortKey::Duration),
            "departure" => Ok(SortKey::Departure),
            _ => Err(CoreError::validation(
                "sortBy",
                "Invalid sort key. Use price, duration or departure",
            )),
        }
    }
}

/// Returns a sorted copy. The sort is stable, so ties keep their input order.
pub fn sort_offers(offers: &[FlightOffer], key: SortKey) -> Vec<FlightOffer> {
    let mut sorted = offers.to_vec();
    sorted.sort_by(|a, b| compare(a, b, key));
    sorted
}

/// Ascending comparison on `key`. Offers missing the compared value sort last.
pub fn compare(a: &FlightOffer, b: &FlightOffer, key: SortKey) -> Ordering {
    match key {
        SortKey::Price => missing_last(a.total_price(), b.total_price(), f64::total_cmp),
        SortKey::Duration => missing_last(
            a.outbound().and_then(|i| i.duration_seconds()),
            b.outbound().and_then(|i| i.duration_seconds()),
            Ord::cmp,
        ),
        SortKey::Departure => missing_last(a.first_departure(), b.first_departure(), Ord::cmp),
    }
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::fixtures::{offer, segment};
    use proptest::prelude::*;

    fn ids(offers: &[FlightOffer]) -> Vec<&str> {
        offers.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_price_sort_is_stable_on_ties() {
        let offers = vec![
            offer("1", "120.00", &[&["AA"]]),
            offer("2", "75.50", &[&["AA"]]),
            offer("3", "75.50", &[&["AA"]]),
            offer("4", "300.00", &[&["AA"]]),
        ];
        let sorted = sort_offers(&offers, SortKey::Price);
        assert_eq!(ids(&sorted), vec!["2", "3", "1", "4"]);
        // input untouched
        assert_eq!(ids(&offers), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_price_sort_is_numeric() {
        let offers = vec![offer("a", "1000.00", &[&["AA"]]), offer("b", "999.99", &[&["AA"]])];
        assert_eq!(ids(&sort_offers(&offers, SortKey::Price)), vec!["b", "a"]);
    }

    #[test]
    fn test_duration_sort_uses_elapsed_time() {
        let mut nine_hours = offer("9h", "100", &[&["AA"]]);
        nine_hours.itineraries[0].duration = Some("PT9H".to_string());
        let mut ten_minutes = offer("10m", "100", &[&["AA"]]);
        ten_minutes.itineraries[0].duration = Some("PT10M".to_string());
        let mut ten_hours = offer("10h", "100", &[&["AA"]]);
        ten_hours.itineraries[0].duration = Some("PT10H".to_string());
        let mut unknown = offer("??", "100", &[&["AA"]]);
        unknown.itineraries[0].duration = None;

        let sorted = sort_offers(&[unknown, ten_hours, nine_hours, ten_minutes], SortKey::Duration);
        assert_eq!(ids(&sorted), vec!["10m", "9h", "10h", "??"]);
    }

    #[test]
    fn test_departure_sort_reads_first_segment() {
        let mut late = offer("late", "100", &[&["AA"]]);
        late.itineraries[0].segments = vec![segment("AA", "2025-06-01T21:15:00")];
        let mut early = offer("early", "100", &[&["AA"]]);
        early.itineraries[0].segments = vec![
            segment("AA", "2025-06-01T06:05:00"),
            segment("AA", "2025-06-01T23:00:00"),
        ];
        let sorted = sort_offers(&[late, early], SortKey::Departure);
        assert_eq!(ids(&sorted), vec!["early", "late"]);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Duration".parse::<SortKey>().unwrap(), SortKey::Duration);
        assert!("cheapest".parse::<SortKey>().is_err());
        assert_eq!(SortKey::default().label(), "Lowest Price");
    }

    proptest! {
        #[test]
        fn prop_price_sort_non_decreasing_and_stable(cents in prop::collection::vec(0u32..5_000, 0..40)) {
            let offers: Vec<FlightOffer> = cents
                .iter()
                .enumerate()
                .map(|(i, c)| offer(&i.to_string(), &format!("{}.{:02}", c / 100, c % 100), &[&["AA"]]))
                .collect();
            let sorted = sort_offers(&offers, SortKey::Price);
            prop_assert_eq!(sorted.len(), offers.len());
            for pair in sorted.windows(2) {
                let (a, b) = (pair[0].total_price().unwrap(), pair[1].total_price().unwrap());
                prop_assert!(a <= b);
                if a == b {
                    let ia: usize = pair[0].id.parse().unwrap();
                    let ib: usize = pair[1].id.parse().unwrap();
                    prop_assert!(ia < ib);
                }
            }
        }
    }
}
