//! Human-readable deal identifiers of the form `TRQ-<year>-<NNNN>`.
//!
//! The sequence is global: the year segment always reflects the year the ID is issued, but the
//! counter continues from the last issued ID whatever year that carried. Callers that want a
//! per-year reset must scope their "last ID" lookup to the current year.

use chrono::{Datelike, Utc};

pub const DEAL_ID_PREFIX: &str = "TRQ";

/// Next deal ID for `year`, continuing from `last_id`.
///
/// The counter is kept to four digits, so `9999` wraps to `0000`. An unparseable suffix
/// restarts the sequence at `0001`.
pub fn next_deal_id(last_id: Option<&str>, year: i32) -> String {
    let next = match last_id.and_then(parse_sequence) {
        Some(seq) => seq.wrapping_add(1),
        None => 1,
    };

    let padded = format!("{:04}", next);
    let sequence = &padded[padded.len() - 4..];
    format!("{}-{}-{}", DEAL_ID_PREFIX, year, sequence)
}

/// Same as [`next_deal_id`] using the current calendar year.
pub fn generate_next_deal_id(last_id: Option<&str>) -> String {
    next_deal_id(last_id, Utc::now().year())
}

fn parse_sequence(id: &str) -> Option<u32> {
    id.rsplit('-').next()?.trim().parse().ok()
}
