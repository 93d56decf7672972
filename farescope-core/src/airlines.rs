use std::collections::HashMap;

/// Maps a carrier code to the name shown to users and used by the airline filter.
pub trait AirlineNameResolver {
    fn display_name(&self, carrier_code: &str) -> String;
}

impl AirlineNameResolver for HashMap<String, String> {
    fn display_name(&self, carrier_code: &str) -> String {
        self.get(carrier_code)
            .cloned()
            .unwrap_or_else(|| carrier_code.to_string())
    }
}

impl<R: AirlineNameResolver + ?Sized> AirlineNameResolver for &R {
    fn display_name(&self, carrier_code: &str) -> String {
        (**self).display_name(carrier_code)
    }
}

/// Resolver that shows the raw carrier code.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarrierCodes;

impl AirlineNameResolver for CarrierCodes {
    fn display_name(&self, carrier_code: &str) -> String {
        carrier_code.to_string()
    }
}

const KNOWN_CARRIERS: &[(&str, &str)] = &[
    ("AA", "American Airlines"),
    ("UA", "United Airlines"),
    ("DL", "Delta Air Lines"),
    ("BA", "British Airways"),
    ("LH", "Lufthansa"),
    ("AF", "Air France"),
    ("KL", "KLM"),
    ("EK", "Emirates"),
    ("QR", "Qatar Airways"),
    ("TK", "Turkish Airlines"),
    ("SQ", "Singapore Airlines"),
    ("CX", "Cathay Pacific"),
    ("JL", "Japan Airlines"),
    ("NH", "All Nippon Airways"),
    ("QF", "Qantas"),
    ("VS", "Virgin Atlantic"),
    ("EY", "Etihad Airways"),
    ("SU", "Aeroflot"),
    ("LX", "Swiss International Air Lines"),
    ("OS", "Austrian Airlines"),
    ("SK", "Scandinavian Airlines"),
    ("AZ", "ITA Airways"),
    ("TP", "TAP Air Portugal"),
    ("IB", "Iberia"),
    ("AC", "Air Canada"),
    ("NZ", "Air New Zealand"),
    ("SA", "South African Airways"),
    ("KE", "Korean Air"),
    ("OZ", "Asiana Airlines"),
    ("PR", "Philippine Airlines"),
    ("TG", "Thai Airways"),
    ("VN", "Vietnam Airlines"),
    ("CI", "China Airlines"),
    ("BR", "EVA Air"),
];

/// Built-in carrier names, optionally extended with names from a search response.
#[derive(Debug, Clone)]
pub struct AirlineDirectory {
    names: HashMap<String, String>,
}

impl AirlineDirectory {
    pub fn new() -> Self {
        Self {
            names: KNOWN_CARRIERS
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// Adds names for codes the directory does not already know.
    pub fn with_carriers(mut self, carriers: impl IntoIterator<Item = (String, String)>) -> Self {
        for (code, name) in carriers {
            self.names.entry(code).or_insert(name);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for AirlineDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl AirlineNameResolver for AirlineDirectory {
    fn display_name(&self, carrier_code: &str) -> String {
        self.names.display_name(carrier_code)
    }
}
