use async_trait::async_trait;
use uuid::Uuid;

use crate::crm::{Booking, Client, Quote, QuoteStatus, Referral, Ticket, TicketStatus};
use crate::deal::TravelDealRecord;
use crate::CoreResult;

/// Repository trait for client records
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn create_client(&self, client: &Client) -> CoreResult<()>;

    async fn get_client(&self, id: Uuid) -> CoreResult<Option<Client>>;

    async fn list_clients(&self) -> CoreResult<Vec<Client>>;

    async fn update_client(&self, client: &Client) -> CoreResult<()>;

    /// Returns `false` when nothing was deleted.
    async fn delete_client(&self, id: Uuid) -> CoreResult<bool>;
}

/// Repository trait for quotes
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create_quote(&self, quote: &Quote) -> CoreResult<()>;

    async fn get_quote(&self, id: Uuid) -> CoreResult<Option<Quote>>;

    async fn list_quotes(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Quote>>;

    async fn update_quote_status(&self, id: Uuid, status: QuoteStatus) -> CoreResult<bool>;
}

/// Repository trait for travel deal drafts and their scheduling state
#[async_trait]
pub trait TravelDealRepository: Send + Sync {
    /// Insert or replace by `id`.
    async fn save_deal(&self, deal: &TravelDealRecord) -> CoreResult<()>;

    async fn get_deal(&self, id: Uuid) -> CoreResult<Option<TravelDealRecord>>;

    async fn find_by_quote(&self, quote_id: Uuid) -> CoreResult<Option<TravelDealRecord>>;

    async fn list_deals(&self) -> CoreResult<Vec<TravelDealRecord>>;

    async fn delete_deal(&self, id: Uuid) -> CoreResult<bool>;
}

/// Repository trait for bookings created from converted quotes
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `Conflict` when the deal ID is already taken.
    async fn create_booking(&self, booking: &Booking) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>>;

    /// Most recently issued deal ID across all years.
    async fn last_deal_id(&self) -> CoreResult<Option<String>>;
}

/// Repository trait for support tickets
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create_ticket(&self, ticket: &Ticket) -> CoreResult<()>;

    async fn get_ticket(&self, id: Uuid) -> CoreResult<Option<Ticket>>;

    async fn list_tickets(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Ticket>>;

    async fn update_ticket_status(&self, id: Uuid, status: TicketStatus) -> CoreResult<bool>;
}

/// Repository trait for referral commissions
#[async_trait]
pub trait ReferralRepository: Send + Sync {
    async fn create_referral(&self, referral: &Referral) -> CoreResult<()>;

    async fn get_referral(&self, id: Uuid) -> CoreResult<Option<Referral>>;

    async fn list_referrals(&self) -> CoreResult<Vec<Referral>>;

    async fn update_referral(&self, referral: &Referral) -> CoreResult<()>;
}
