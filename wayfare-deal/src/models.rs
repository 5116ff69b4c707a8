use serde::{Deserialize, Serialize};
use wayfare_core::{CoreError, CoreResult};

/// Loosely typed deal fields as they arrive from free text or a JSON payload.
/// Nothing is checked yet; see [`DealFields::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_basis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_airport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luggage_transfers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl DealFields {
    /// Schema check: `title` is required, every other field is optional and blank values count
    /// as absent.
    pub fn validate(self) -> CoreResult<TravelDeal> {
        let title = clean(self.title)
            .ok_or_else(|| CoreError::validation("title is required"))?;

        Ok(TravelDeal {
            title,
            subtitle: clean(self.subtitle),
            travel_date: clean(self.travel_date),
            nights: clean(self.nights),
            board_basis: clean(self.board_basis),
            departure_airport: clean(self.departure_airport),
            luggage_transfers: clean(self.luggage_transfers),
            price: clean(self.price),
            destination: clean(self.destination),
        })
    }
}

/// A validated holiday offer. Lives for one request; only the rendered post is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelDeal {
    pub title: String,
    pub subtitle: Option<String>,
    pub travel_date: Option<String>,
    pub nights: Option<String>,
    pub board_basis: Option<String>,
    pub departure_airport: Option<String>,
    pub luggage_transfers: Option<String>,
    pub price: Option<String>,
    pub destination: Option<String>,
}

impl TravelDeal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            travel_date: None,
            nights: None,
            board_basis: None,
            departure_airport: None,
            luggage_transfers: None,
            price: None,
            destination: None,
        }
    }
}

/// The three AI-written pieces of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentParts {
    pub subtitle: String,
    pub resort_summary: String,
    pub hashtags: String,
}

/// Generated content bundle handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub subtitle: String,
    pub resort_summary: String,
    pub hashtags: String,
    pub post: String,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
