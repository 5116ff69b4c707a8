use std::sync::Arc;

use sqlx::PgPool;
use wayfare_core::repository::{
    BookingRepository, ClientRepository, QuoteRepository, ReferralRepository, TicketRepository,
    TravelDealRepository,
};
use wayfare_core::social::SocialPlatform;
use wayfare_core::text::TextGenerator;
use wayfare_deal::ContentGenerator;
use wayfare_order::{CommissionManager, DashboardService, DealOrchestrator, QuoteManager, TicketDesk};
use wayfare_store::{
    MemoryStore, StoreBookingRepository, StoreClientRepository, StoreQuoteRepository,
    StoreReferralRepository, StoreTicketRepository, StoreTravelDealRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

/// One handle per repository trait, backed by either Postgres or memory.
#[derive(Clone)]
pub struct Repositories {
    pub clients: Arc<dyn ClientRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub deals: Arc<dyn TravelDealRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub referrals: Arc<dyn ReferralRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            clients: store.clone(),
            quotes: store.clone(),
            deals: store.clone(),
            bookings: store.clone(),
            tickets: store.clone(),
            referrals: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            clients: Arc::new(StoreClientRepository::new(pool.clone())),
            quotes: Arc::new(StoreQuoteRepository::new(pool.clone())),
            deals: Arc::new(StoreTravelDealRepository::new(pool.clone())),
            bookings: Arc::new(StoreBookingRepository::new(pool.clone())),
            tickets: Arc::new(StoreTicketRepository::new(pool.clone())),
            referrals: Arc::new(StoreReferralRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<dyn ClientRepository>,
    pub quotes: Arc<QuoteManager>,
    pub deals: Arc<DealOrchestrator>,
    pub commissions: Arc<CommissionManager>,
    pub tickets: Arc<TicketDesk>,
    pub dashboard: Arc<DashboardService>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        social: Arc<dyn SocialPlatform>,
        text: Arc<dyn TextGenerator>,
        models: Vec<String>,
        auth: AuthConfig,
    ) -> Self {
        let generator = ContentGenerator::new(text, models);

        Self {
            clients: repos.clients.clone(),
            quotes: Arc::new(QuoteManager::new(
                repos.clients.clone(),
                repos.quotes.clone(),
                repos.bookings.clone(),
            )),
            deals: Arc::new(DealOrchestrator::new(
                repos.quotes.clone(),
                repos.deals.clone(),
                generator,
                social,
            )),
            commissions: Arc::new(CommissionManager::new(
                repos.clients.clone(),
                repos.bookings.clone(),
                repos.referrals.clone(),
            )),
            tickets: Arc::new(TicketDesk::new(repos.clients.clone(), repos.tickets.clone())),
            dashboard: Arc::new(DashboardService {
                clients: repos.clients,
                quotes: repos.quotes,
                bookings: repos.bookings,
                tickets: repos.tickets,
                referrals: repos.referrals,
                deals: repos.deals,
            }),
            auth,
        }
    }
}
