pub mod analytics;
pub mod finance;
pub mod lock;
pub mod orchestrator;
pub mod quotes;
pub mod support;

pub use analytics::{DashboardService, DashboardSummary};
pub use finance::{calculate_commission, CommissionManager};
pub use lock::DealLocks;
pub use orchestrator::{DealInput, DealOrchestrator, DeleteOutcome, ScheduleRequest};
pub use quotes::QuoteManager;
pub use support::TicketDesk;
