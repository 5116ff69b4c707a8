use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfare_shared::Masked;

use crate::{CoreError, CoreResult};

// ============================================================================
// Clients
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: Option<Masked<String>>,
    pub phone: Option<Masked<String>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl NewClient {
    pub fn into_client(self) -> CoreResult<Client> {
        let name = required(self.name, "name")?;
        let now = Utc::now();
        Ok(Client {
            id: Uuid::new_v4(),
            name,
            email: non_empty(self.email).map(Masked),
            phone: non_empty(self.phone).map(Masked),
            notes: non_empty(self.notes),
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite the editable fields of `client`, keeping its identity.
    pub fn apply_to(self, client: &mut Client) -> CoreResult<()> {
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err(CoreError::validation("name must not be empty"));
            }
            client.name = name.trim().to_string();
        }
        if self.email.is_some() {
            client.email = non_empty(self.email).map(Masked);
        }
        if self.phone.is_some() {
            client.phone = non_empty(self.phone).map(Masked);
        }
        if self.notes.is_some() {
            client.notes = non_empty(self.notes);
        }
        client.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// Quotes
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Converted,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "DRAFT",
            QuoteStatus::Sent => "SENT",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Declined => "DECLINED",
            QuoteStatus::Converted => "CONVERTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(QuoteStatus::Draft),
            "SENT" => Some(QuoteStatus::Sent),
            "ACCEPTED" => Some(QuoteStatus::Accepted),
            "DECLINED" => Some(QuoteStatus::Declined),
            "CONVERTED" => Some(QuoteStatus::Converted),
            _ => None,
        }
    }
}

/// A pre-booking record; travel deals and bookings hang off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub client_id: Uuid,
    pub holiday_type: String,
    pub destination: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub nights: Option<i32>,
    pub price_pence: Option<i64>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuote {
    pub client_id: Option<Uuid>,
    pub holiday_type: Option<String>,
    pub destination: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub nights: Option<i32>,
    pub price_pence: Option<i64>,
}

impl NewQuote {
    pub fn into_quote(self) -> CoreResult<Quote> {
        let mut problems = Vec::new();
        if self.client_id.is_none() {
            problems.push("client_id is required".to_string());
        }
        let holiday_type = non_empty(self.holiday_type);
        if holiday_type.is_none() {
            problems.push("holiday_type is required".to_string());
        }
        if matches!(self.nights, Some(n) if n <= 0) {
            problems.push("nights must be positive".to_string());
        }
        if matches!(self.price_pence, Some(p) if p < 0) {
            problems.push("price_pence must not be negative".to_string());
        }

        match (self.client_id, holiday_type) {
            (Some(client_id), Some(holiday_type)) if problems.is_empty() => {
                let now = Utc::now();
                Ok(Quote {
                    id: Uuid::new_v4(),
                    client_id,
                    holiday_type,
                    destination: non_empty(self.destination),
                    travel_date: self.travel_date,
                    nights: self.nights,
                    price_pence: self.price_pence,
                    status: QuoteStatus::Draft,
                    created_at: now,
                    updated_at: now,
                })
            }
            _ => Err(CoreError::ValidationError(problems)),
        }
    }
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// `TRQ-YYYY-NNNN`, allocated when the quote converts.
    pub deal_id: String,
    pub quote_id: Uuid,
    pub client_id: Uuid,
    pub total_pence: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Support tickets
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPEN" => Some(TicketStatus::Open),
            "IN_PROGRESS" => Some(TicketStatus::InProgress),
            "RESOLVED" => Some(TicketStatus::Resolved),
            "CLOSED" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub client_id: Uuid,
    pub subject: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub client_id: Option<Uuid>,
    pub subject: Option<String>,
    pub description: Option<String>,
}

impl NewTicket {
    pub fn into_ticket(self) -> CoreResult<Ticket> {
        let subject = non_empty(self.subject);
        match (self.client_id, subject) {
            (Some(client_id), Some(subject)) => {
                let now = Utc::now();
                Ok(Ticket {
                    id: Uuid::new_v4(),
                    client_id,
                    subject,
                    description: non_empty(self.description),
                    status: TicketStatus::Open,
                    created_at: now,
                    updated_at: now,
                })
            }
            (client_id, subject) => {
                let mut problems = Vec::new();
                if client_id.is_none() {
                    problems.push("client_id is required".to_string());
                }
                if subject.is_none() {
                    problems.push("subject is required".to_string());
                }
                Err(CoreError::ValidationError(problems))
            }
        }
    }
}

// ============================================================================
// Referrals
// ============================================================================

pub const DEFAULT_COMMISSION_RATE_BPS: i32 = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferralStatus {
    Pending,
    Earned,
    Paid,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "PENDING",
            ReferralStatus::Earned => "EARNED",
            ReferralStatus::Paid => "PAID",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ReferralStatus::Pending),
            "EARNED" => Some(ReferralStatus::Earned),
            "PAID" => Some(ReferralStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_client_id: Uuid,
    pub referred_client_id: Uuid,
    pub booking_id: Option<Uuid>,
    /// Basis points of the booking total; 500 = 5%.
    pub commission_rate_bps: i32,
    pub commission_pence: Option<i64>,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReferral {
    pub referrer_client_id: Option<Uuid>,
    pub referred_client_id: Option<Uuid>,
    pub commission_rate_bps: Option<i32>,
}

impl NewReferral {
    pub fn into_referral(self) -> CoreResult<Referral> {
        let mut problems = Vec::new();
        if self.referrer_client_id.is_none() {
            problems.push("referrer_client_id is required".to_string());
        }
        if self.referred_client_id.is_none() {
            problems.push("referred_client_id is required".to_string());
        }
        if self.referrer_client_id.is_some() && self.referrer_client_id == self.referred_client_id {
            problems.push("a client cannot refer themselves".to_string());
        }
        let rate = self.commission_rate_bps.unwrap_or(DEFAULT_COMMISSION_RATE_BPS);
        if !(0..=10_000).contains(&rate) {
            problems.push("commission_rate_bps must be between 0 and 10000".to_string());
        }

        match (self.referrer_client_id, self.referred_client_id) {
            (Some(referrer), Some(referred)) if problems.is_empty() => {
                let now = Utc::now();
                Ok(Referral {
                    id: Uuid::new_v4(),
                    referrer_client_id: referrer,
                    referred_client_id: referred,
                    booking_id: None,
                    commission_rate_bps: rate,
                    commission_pence: None,
                    status: ReferralStatus::Pending,
                    created_at: now,
                    updated_at: now,
                })
            }
            _ => Err(CoreError::ValidationError(problems)),
        }
    }
}

fn required(value: Option<String>, field: &str) -> CoreResult<String> {
    non_empty(value).ok_or_else(|| CoreError::validation(format!("{} is required", field)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
