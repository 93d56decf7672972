use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Flight-offers search payload
// ============================================================================
//
// The response keeps `data` as the raw upstream JSON so the HTTP layer can
// forward it byte-for-byte in shape. Typed offers are parsed on demand and
// model only the fields the filter, sort and histogram engines read; anything
// else is kept in `extra`, and optional fields are never invented on output.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchResponse {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionaries: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlightSearchResponse {
    /// Typed view of `data`. Entries missing a field the engines need are
    /// left out here but stay in `data`.
    pub fn offers(&self) -> Vec<FlightOffer> {
        self.data
            .iter()
            .filter_map(|raw| FlightOffer::deserialize(raw).ok())
            .collect()
    }

    /// Carrier code to name pairs from `dictionaries.carriers`, if upstream sent them.
    pub fn carrier_names(&self) -> Vec<(String, String)> {
        self.dictionaries
            .as_ref()
            .and_then(|d| d.get("carriers"))
            .and_then(Value::as_object)
            .map(|carriers| {
                carriers
                    .iter()
                    .filter_map(|(code, name)| Some((code.clone(), name.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_way: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instant_ticketing_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_homogeneous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ticketing_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_bookable_seats: Option<u32>,
    pub itineraries: Vec<Itinerary>,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validating_airline_codes: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlightOffer {
    /// Numeric value of `price.total`.
    pub fn total_price(&self) -> Option<f64> {
        self.price.amount()
    }

    pub fn outbound(&self) -> Option<&Itinerary> {
        self.itineraries.first()
    }

    /// Stops on the outbound itinerary only.
    pub fn outbound_stops(&self) -> Option<usize> {
        self.outbound().map(Itinerary::stops)
    }

    /// Carrier codes of every segment across all itineraries, in travel order.
    pub fn carrier_codes(&self) -> impl Iterator<Item = &str> {
        self.itineraries
            .iter()
            .flat_map(|itinerary| itinerary.segments.iter())
            .map(|segment| segment.carrier_code.as_str())
    }

    pub fn first_departure(&self) -> Option<&str> {
        self.outbound()
            .and_then(|itinerary| itinerary.segments.first())
            .map(|segment| segment.departure.at.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub segments: Vec<Segment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Itinerary {
    pub fn stops(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Total elapsed time in seconds, parsed from the ISO-8601 duration text.
    pub fn duration_seconds(&self) -> Option<u64> {
        self.duration.as_deref().and_then(iso_duration_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: FlightEndpoint,
    pub arrival: FlightEndpoint,
    pub carrier_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_stops: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEndpoint {
    pub iata_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    pub at: String,
}

/// Price as sent upstream. Amounts stay decimal text until a number is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub currency: String,
    pub total: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        self.total
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }
}

/// Parses `P[nW][nD][T[nH][nM][nS]]` into whole seconds.
///
/// Designators must appear in order and each carries an integer count.
/// Returns `None` for anything else, including the bare `P` and `PT` forms.
pub fn iso_duration_seconds(text: &str) -> Option<u64> {
    let rest = text.trim().strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((_, "")) => return None,
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };

    let (date_seconds, date_seen) = accumulate(date_part, &[('W', 604_800), ('D', 86_400)])?;
    let (time_seconds, time_seen) = accumulate(time_part, &[('H', 3_600), ('M', 60), ('S', 1)])?;

    if !date_seen && !time_seen {
        return None;
    }
    Some(date_seconds + time_seconds)
}

fn accumulate(part: &str, units: &[(char, u64)]) -> Option<(u64, bool)> {
    let mut remaining = units.iter();
    let mut total = 0u64;
    let mut digits = String::new();
    let mut seen = false;

    for ch in part.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let (_, factor) = remaining.by_ref().find(|(designator, _)| *designator == ch)?;
        if digits.is_empty() {
            return None;
        }
        total = total.checked_add(digits.parse::<u64>().ok()?.checked_mul(*factor)?)?;
        digits.clear();
        seen = true;
    }

    if !digits.is_empty() {
        return None;
    }
    Some((total, seen))
}
