use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use wayfare_core::crm::ReferralStatus;
use wayfare_core::repository::{
    BookingRepository, ClientRepository, QuoteRepository, ReferralRepository, TicketRepository,
    TravelDealRepository,
};
use wayfare_core::CoreResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub clients: usize,
    /// Keyed by status name, e.g. `"DRAFT"`.
    pub quotes_by_status: BTreeMap<String, usize>,
    pub bookings: usize,
    pub booked_value_pence: i64,
    pub open_tickets: usize,
    pub scheduled_deals: usize,
    pub unpaid_commission_pence: i64,
}

/// Read-only aggregates for the staff dashboard
pub struct DashboardService {
    pub clients: Arc<dyn ClientRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub referrals: Arc<dyn ReferralRepository>,
    pub deals: Arc<dyn TravelDealRepository>,
}

impl DashboardService {
    pub async fn summary(&self) -> CoreResult<DashboardSummary> {
        let (clients, quotes, bookings, tickets, referrals, deals) = tokio::try_join!(
            self.clients.list_clients(),
            self.quotes.list_quotes(None),
            self.bookings.list_bookings(),
            self.tickets.list_tickets(None),
            self.referrals.list_referrals(),
            self.deals.list_deals(),
        )?;

        let mut quotes_by_status = BTreeMap::new();
        for quote in &quotes {
            *quotes_by_status
                .entry(quote.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        Ok(DashboardSummary {
            clients: clients.len(),
            quotes_by_status,
            bookings: bookings.len(),
            booked_value_pence: bookings.iter().map(|b| b.total_pence).sum(),
            open_tickets: tickets.iter().filter(|t| t.status.is_open()).count(),
            scheduled_deals: deals.iter().filter(|d| d.is_scheduled()).count(),
            unpaid_commission_pence: referrals
                .iter()
                .filter(|r| r.status == ReferralStatus::Earned)
                .filter_map(|r| r.commission_pence)
                .sum(),
        })
    }
}
