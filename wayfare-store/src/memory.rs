//! In-process repositories for local runs and tests. Mirrors the Postgres schema's uniqueness
//! and delete rules so both stores fail the same way.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use wayfare_core::crm::{Booking, Client, Quote, QuoteStatus, Referral, Ticket, TicketStatus};
use wayfare_core::deal::TravelDealRecord;
use wayfare_core::repository::{
    BookingRepository, ClientRepository, QuoteRepository, ReferralRepository, TicketRepository,
    TravelDealRepository,
};
use wayfare_core::{CoreError, CoreResult};

#[derive(Default)]
struct Tables {
    clients: Vec<Client>,
    quotes: Vec<Quote>,
    deals: Vec<TravelDealRecord>,
    bookings: Vec<Booking>,
    tickets: Vec<Ticket>,
    referrals: Vec<Referral>,
}

/// Every repository trait over one set of tables. Lists come back newest first.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(rows: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    rows.rev().collect()
}

#[async_trait]
impl ClientRepository for MemoryStore {
    async fn create_client(&self, client: &Client) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        if t.clients.iter().any(|c| c.id == client.id) {
            return Err(CoreError::Conflict(format!("client {} already exists", client.id)));
        }
        t.clients.push(client.clone());
        Ok(())
    }

    async fn get_client(&self, id: Uuid) -> CoreResult<Option<Client>> {
        let t = self.tables.read().await;
        Ok(t.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn list_clients(&self) -> CoreResult<Vec<Client>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.clients.iter().cloned()))
    }

    async fn update_client(&self, client: &Client) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(existing) = t.clients.iter_mut().find(|c| c.id == client.id) {
            *existing = client.clone();
        }
        Ok(())
    }

    async fn delete_client(&self, id: Uuid) -> CoreResult<bool> {
        let mut t = self.tables.write().await;
        let referenced = t.bookings.iter().any(|b| b.client_id == id)
            || t
                .referrals
                .iter()
                .any(|r| r.referrer_client_id == id || r.referred_client_id == id);
        if referenced {
            return Err(CoreError::Conflict(format!(
                "client {} has bookings or referrals",
                id
            )));
        }

        let before = t.clients.len();
        t.clients.retain(|c| c.id != id);
        if t.clients.len() == before {
            return Ok(false);
        }

        let quote_ids: Vec<Uuid> = t
            .quotes
            .iter()
            .filter(|q| q.client_id == id)
            .map(|q| q.id)
            .collect();
        t.quotes.retain(|q| q.client_id != id);
        t.deals.retain(|d| !quote_ids.contains(&d.quote_id));
        t.tickets.retain(|tk| tk.client_id != id);
        Ok(true)
    }
}

#[async_trait]
impl QuoteRepository for MemoryStore {
    async fn create_quote(&self, quote: &Quote) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        if t.quotes.iter().any(|q| q.id == quote.id) {
            return Err(CoreError::Conflict(format!("quote {} already exists", quote.id)));
        }
        t.quotes.push(quote.clone());
        Ok(())
    }

    async fn get_quote(&self, id: Uuid) -> CoreResult<Option<Quote>> {
        let t = self.tables.read().await;
        Ok(t.quotes.iter().find(|q| q.id == id).cloned())
    }

    async fn list_quotes(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Quote>> {
        let t = self.tables.read().await;
        Ok(newest_first(
            t.quotes
                .iter()
                .filter(|q| client_id.map_or(true, |c| q.client_id == c))
                .cloned(),
        ))
    }

    async fn update_quote_status(&self, id: Uuid, status: QuoteStatus) -> CoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.quotes.iter_mut().find(|q| q.id == id) {
            Some(quote) => {
                quote.status = status;
                quote.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TravelDealRepository for MemoryStore {
    async fn save_deal(&self, deal: &TravelDealRecord) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        if t.deals.iter().any(|d| d.quote_id == deal.quote_id && d.id != deal.id) {
            return Err(CoreError::Conflict(format!(
                "quote {} already has a travel deal",
                deal.quote_id
            )));
        }
        match t.deals.iter().position(|d| d.id == deal.id) {
            Some(pos) => t.deals[pos] = deal.clone(),
            None => t.deals.push(deal.clone()),
        }
        Ok(())
    }

    async fn get_deal(&self, id: Uuid) -> CoreResult<Option<TravelDealRecord>> {
        let t = self.tables.read().await;
        Ok(t.deals.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_quote(&self, quote_id: Uuid) -> CoreResult<Option<TravelDealRecord>> {
        let t = self.tables.read().await;
        Ok(t.deals.iter().find(|d| d.quote_id == quote_id).cloned())
    }

    async fn list_deals(&self) -> CoreResult<Vec<TravelDealRecord>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.deals.iter().cloned()))
    }

    async fn delete_deal(&self, id: Uuid) -> CoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.deals.len();
        t.deals.retain(|d| d.id != id);
        Ok(t.deals.len() < before)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        if t.bookings.iter().any(|b| b.deal_id == booking.deal_id) {
            return Err(CoreError::Conflict(format!(
                "deal ID {} already issued",
                booking.deal_id
            )));
        }
        if t.bookings.iter().any(|b| b.quote_id == booking.quote_id) {
            return Err(CoreError::Conflict(format!(
                "quote {} already has a booking",
                booking.quote_id
            )));
        }
        t.bookings.push(booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let t = self.tables.read().await;
        Ok(t.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.bookings.iter().cloned()))
    }

    async fn last_deal_id(&self) -> CoreResult<Option<String>> {
        let t = self.tables.read().await;
        Ok(t.bookings.last().map(|b| b.deal_id.clone()))
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn create_ticket(&self, ticket: &Ticket) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        t.tickets.push(ticket.clone());
        Ok(())
    }

    async fn get_ticket(&self, id: Uuid) -> CoreResult<Option<Ticket>> {
        let t = self.tables.read().await;
        Ok(t.tickets.iter().find(|tk| tk.id == id).cloned())
    }

    async fn list_tickets(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Ticket>> {
        let t = self.tables.read().await;
        Ok(newest_first(
            t.tickets
                .iter()
                .filter(|tk| client_id.map_or(true, |c| tk.client_id == c))
                .cloned(),
        ))
    }

    async fn update_ticket_status(&self, id: Uuid, status: TicketStatus) -> CoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.tickets.iter_mut().find(|tk| tk.id == id) {
            Some(ticket) => {
                ticket.status = status;
                ticket.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ReferralRepository for MemoryStore {
    async fn create_referral(&self, referral: &Referral) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        t.referrals.push(referral.clone());
        Ok(())
    }

    async fn get_referral(&self, id: Uuid) -> CoreResult<Option<Referral>> {
        let t = self.tables.read().await;
        Ok(t.referrals.iter().find(|r| r.id == id).cloned())
    }

    async fn list_referrals(&self) -> CoreResult<Vec<Referral>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.referrals.iter().cloned()))
    }

    async fn update_referral(&self, referral: &Referral) -> CoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(existing) = t.referrals.iter_mut().find(|r| r.id == referral.id) {
            *existing = referral.clone();
        }
        Ok(())
    }
}
