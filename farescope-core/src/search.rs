use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CoreError, CoreResult};

static IATA_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}$").expect("valid IATA pattern"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));
static CURRENCY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}$").expect("valid currency pattern"));

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_MAX_RESULTS: u32 = 50;
pub const MAX_RESULTS_LIMIT: u32 = 250;
pub const MIN_KEYWORD_LENGTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "ECONOMY",
            TravelClass::PremiumEconomy => "PREMIUM_ECONOMY",
            TravelClass::Business => "BUSINESS",
            TravelClass::First => "FIRST",
        }
    }
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ECONOMY" => Ok(TravelClass::Economy),
            "PREMIUM_ECONOMY" => Ok(TravelClass::PremiumEconomy),
            "BUSINESS" => Ok(TravelClass::Business),
            "FIRST" => Ok(TravelClass::First),
            _ => Err(CoreError::validation(
                "travelClass",
                "Invalid travel class. Use ECONOMY, PREMIUM_ECONOMY, BUSINESS or FIRST",
            )),
        }
    }
}

/// Raw flight search parameters, one field per recognised query key.
///
/// Unknown keys fail deserialization, so a typo in a parameter name is a
/// rejected request rather than a silently ignored one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlightSearchQuery {
    pub origin_location_code: Option<String>,
    pub destination_location_code: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub adults: Option<String>,
    pub children: Option<String>,
    pub travel_class: Option<String>,
    pub currency_code: Option<String>,
    pub max: Option<String>,
}

/// A validated flight search. Only obtainable through [`FlightSearchRequest::parse`]
/// or the builder, both of which enforce every field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchRequest {
    origin: String,
    destination: String,
    departure_date: String,
    return_date: Option<String>,
    adults: u32,
    children: u32,
    travel_class: TravelClass,
    currency: String,
    max_results: u32,
}

impl FlightSearchRequest {
    pub fn parse(query: FlightSearchQuery) -> CoreResult<Self> {
        let origin = required(query.origin_location_code, "originLocationCode")?;
        let destination = required(query.destination_location_code, "destinationLocationCode")?;
        let departure_date = required(query.departure_date, "departureDate")?;

        let origin = iata_code(&origin, "originLocationCode", "Invalid origin airport code")?;
        let destination = iata_code(
            &destination,
            "destinationLocationCode",
            "Invalid destination airport code",
        )?;
        let departure_date = iso_date(
            &departure_date,
            "departureDate",
            "Invalid departure date format. Use YYYY-MM-DD",
        )?;
        let return_date = present(query.return_date)
            .map(|date| {
                iso_date(&date, "returnDate", "Invalid return date format. Use YYYY-MM-DD")
            })
            .transpose()?;

        let adults = match present(query.adults) {
            Some(raw) => count(&raw, "adults", 1)?,
            None => 1,
        };
        let children = match present(query.children) {
            Some(raw) => count(&raw, "children", 0)?,
            None => 0,
        };
        let travel_class = match present(query.travel_class) {
            Some(raw) => raw.parse()?,
            None => TravelClass::default(),
        };
        let currency = match present(query.currency_code) {
            Some(raw) if CURRENCY_CODE.is_match(raw.trim()) => raw.trim().to_ascii_uppercase(),
            Some(_) => {
                return Err(CoreError::validation(
                    "currencyCode",
                    "Invalid currency code. Use a 3-letter ISO 4217 code",
                ))
            }
            None => DEFAULT_CURRENCY.to_string(),
        };
        let max_results = match present(query.max) {
            Some(raw) => {
                let max = count(&raw, "max", 1)?;
                if max > MAX_RESULTS_LIMIT {
                    return Err(CoreError::validation(
                        "max",
                        format!("Invalid max. Must be between 1 and {}", MAX_RESULTS_LIMIT),
                    ));
                }
                max
            }
            None => DEFAULT_MAX_RESULTS,
        };

        Ok(Self {
            origin,
            destination,
            departure_date,
            return_date,
            adults,
            children,
            travel_class,
            currency,
            max_results,
        })
    }

    /// One adult, economy, USD, 50 results.
    pub fn one_way(origin: &str, destination: &str, departure_date: &str) -> CoreResult<Self> {
        Self::parse(FlightSearchQuery {
            origin_location_code: Some(origin.to_string()),
            destination_location_code: Some(destination.to_string()),
            departure_date: Some(departure_date.to_string()),
            ..Default::default()
        })
    }

    pub fn with_return_date(mut self, date: &str) -> CoreResult<Self> {
        self.return_date = Some(iso_date(
            date,
            "returnDate",
            "Invalid return date format. Use YYYY-MM-DD",
        )?);
        Ok(self)
    }

    pub fn with_travellers(mut self, adults: u32, children: u32) -> CoreResult<Self> {
        if adults == 0 {
            return Err(CoreError::validation("adults", "Invalid adults. Must be at least 1"));
        }
        self.adults = adults;
        self.children = children;
        Ok(self)
    }

    pub fn with_travel_class(mut self, travel_class: TravelClass) -> Self {
        self.travel_class = travel_class;
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn departure_date(&self) -> &str {
        &self.departure_date
    }

    pub fn return_date(&self) -> Option<&str> {
        self.return_date.as_deref()
    }

    pub fn adults(&self) -> u32 {
        self.adults
    }

    pub fn travel_class(&self) -> TravelClass {
        self.travel_class
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Query parameters for the upstream flight-offers endpoint.
    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("originLocationCode", self.origin.clone()),
            ("destinationLocationCode", self.destination.clone()),
            ("departureDate", self.departure_date.clone()),
        ];
        if let Some(return_date) = &self.return_date {
            params.push(("returnDate", return_date.clone()));
        }
        params.push(("adults", self.adults.to_string()));
        if self.children > 0 {
            params.push(("children", self.children.to_string()));
        }
        params.push(("travelClass", self.travel_class.to_string()));
        params.push(("currencyCode", self.currency.clone()));
        params.push(("max", self.max_results.to_string()));
        params
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, field: &str) -> CoreResult<String> {
    present(value).ok_or_else(|| {
        CoreError::validation(field, format!("Missing required parameter {}", field))
    })
}

fn iata_code(raw: &str, field: &str, message: &str) -> CoreResult<String> {
    let code = raw.trim();
    if !IATA_CODE.is_match(code) {
        return Err(CoreError::validation(field, message));
    }
    Ok(code.to_ascii_uppercase())
}

fn iso_date(raw: &str, field: &str, message: &str) -> CoreResult<String> {
    let date = raw.trim();
    if !ISO_DATE.is_match(date) {
        return Err(CoreError::validation(field, message));
    }
    Ok(date.to_string())
}

fn count(raw: &str, field: &str, minimum: u32) -> CoreResult<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n >= minimum)
        .ok_or_else(|| {
            CoreError::validation(
                field,
                format!("Invalid {}. Must be a whole number of at least {}", field, minimum),
            )
        })
}

// ============================================================================
// Location lookup
// ============================================================================

/// A trimmed location keyword of at least two characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    keyword: String,
}

impl LocationQuery {
    pub fn new(keyword: Option<&str>) -> CoreResult<Self> {
        let keyword = keyword.map(str::trim).unwrap_or_default();
        if keyword.is_empty() {
            return Err(CoreError::validation("keyword", "Keyword is required"));
        }
        if keyword.chars().count() < MIN_KEYWORD_LENGTH {
            return Err(CoreError::validation(
                "keyword",
                "Keyword must be at least 2 characters",
            ));
        }
        Ok(Self {
            keyword: keyword.to_string(),
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

/// An airport or city record from the location lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub iata_code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    pub fn display_city(&self) -> &str {
        self.address
            .as_ref()
            .and_then(|a| a.city_name.as_deref())
            .unwrap_or(&self.name)
    }

    pub fn country(&self) -> &str {
        self.address
            .as_ref()
            .and_then(|a| a.country_name.as_deref())
            .unwrap_or_default()
    }

    /// `"London (LHR)"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_city(), self.iata_code)
    }
}
