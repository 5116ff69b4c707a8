pub mod app_config;
pub mod crm_repo;
pub mod database;
pub mod deal_repo;
pub mod memory;

pub use app_config::Config;
pub use crm_repo::{
    StoreBookingRepository, StoreClientRepository, StoreQuoteRepository, StoreReferralRepository,
    StoreTicketRepository,
};
pub use database::DbClient;
pub use deal_repo::StoreTravelDealRepository;
pub use memory::MemoryStore;
