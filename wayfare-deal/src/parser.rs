//! Free-text deal input: one `key: value` pair per line.
//!
//! Keys are matched case-insensitively against a fixed alias table. Lines without a colon and
//! unknown keys are skipped. The value is everything after the first colon, trimmed, with no
//! quoting or escaping. A repeated key keeps its last value.

use wayfare_core::CoreResult;

use crate::models::{DealFields, TravelDeal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DealKey {
    Title,
    Subtitle,
    TravelDate,
    Nights,
    BoardBasis,
    DepartureAirport,
    LuggageTransfers,
    Price,
    Destination,
}

const KEY_ALIASES: &[(&str, DealKey)] = &[
    ("title", DealKey::Title),
    ("subtitle", DealKey::Subtitle),
    ("travel date", DealKey::TravelDate),
    ("date", DealKey::TravelDate),
    ("nights", DealKey::Nights),
    ("night", DealKey::Nights),
    ("board basis", DealKey::BoardBasis),
    ("board", DealKey::BoardBasis),
    ("departure airport", DealKey::DepartureAirport),
    ("airport", DealKey::DepartureAirport),
    ("luggage & transfers", DealKey::LuggageTransfers),
    ("luggage and transfers", DealKey::LuggageTransfers),
    ("transfers", DealKey::LuggageTransfers),
    ("price", DealKey::Price),
    ("destination", DealKey::Destination),
];

fn lookup_key(raw: &str) -> Option<DealKey> {
    let key = raw.trim().to_lowercase();
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, k)| *k)
}

/// Parse free text into unchecked fields.
pub fn parse_deal_text(input: &str) -> DealFields {
    let mut fields = DealFields::default();

    for line in input.lines() {
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            continue;
        };
        let Some(key) = lookup_key(raw_key) else {
            continue;
        };

        let value = Some(raw_value.trim().to_string());
        match key {
            DealKey::Title => fields.title = value,
            DealKey::Subtitle => fields.subtitle = value,
            DealKey::TravelDate => fields.travel_date = value,
            DealKey::Nights => fields.nights = value,
            DealKey::BoardBasis => fields.board_basis = value,
            DealKey::DepartureAirport => fields.departure_airport = value,
            DealKey::LuggageTransfers => fields.luggage_transfers = value,
            DealKey::Price => fields.price = value,
            DealKey::Destination => fields.destination = value,
        }
    }

    fields
}

/// Parse and run the schema check in one step.
pub fn parse_travel_deal(input: &str) -> CoreResult<TravelDeal> {
    parse_deal_text(input).validate()
}
