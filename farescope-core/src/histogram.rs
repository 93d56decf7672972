use std::collections::BTreeMap;

use serde::Serialize;

use crate::offer::FlightOffer;

pub const DEFAULT_BUCKET_WIDTH: u32 = 50;

/// One bar of the price distribution: offers whose rounded total falls in
/// `[lower_bound, lower_bound + width)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBucket {
    pub range_label: String,
    pub lower_bound: i64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub average: i64,
    pub minimum: f64,
    pub count: usize,
}

impl PriceSummary {
    pub fn of(offers: &[FlightOffer]) -> Self {
        Self {
            average: average_price(offers),
            minimum: min_price(offers),
            count: offers.len(),
        }
    }
}

/// Sparse histogram over rounded totals, ascending by lower bound.
///
/// Only buckets holding at least one offer are emitted. Offers without a
/// parseable total are not counted. A zero width is treated as 1. Totals
/// beyond the `i64` range land in the outermost bucket.
pub fn build_histogram(offers: &[FlightOffer], bucket_width: u32) -> Vec<PriceBucket> {
    let width = i64::from(bucket_width.max(1));
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();

    for price in offers.iter().filter_map(FlightOffer::total_price) {
        let rounded = price.round() as i64;
        let lower = rounded.saturating_sub(rounded.rem_euclid(width));
        *counts.entry(lower).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(lower_bound, count)| PriceBucket {
            range_label: format!("{}-{}", lower_bound, lower_bound.saturating_add(width)),
            lower_bound,
            count,
        })
        .collect()
}

/// Mean total rounded to the nearest whole unit; 0 for no offers.
pub fn average_price(offers: &[FlightOffer]) -> i64 {
    let prices: Vec<f64> = offers.iter().filter_map(FlightOffer::total_price).collect();
    if prices.is_empty() {
        return 0;
    }
    (prices.iter().sum::<f64>() / prices.len() as f64).round() as i64
}

/// Lowest total; 0 for no offers.
pub fn min_price(offers: &[FlightOffer]) -> f64 {
    offers
        .iter()
        .filter_map(FlightOffer::total_price)
        .reduce(f64::min)
        .unwrap_or(0.0)
}
