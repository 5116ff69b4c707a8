use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;
use wayfare_core::crm::{Booking, NewQuote, Quote, QuoteStatus};
use wayfare_core::deal_id::generate_next_deal_id;
use wayfare_core::repository::{BookingRepository, ClientRepository, QuoteRepository};
use wayfare_core::{CoreError, CoreResult};

/// Manages quote lifecycle and the conversion of a quote into a booking
pub struct QuoteManager {
    clients: Arc<dyn ClientRepository>,
    quotes: Arc<dyn QuoteRepository>,
    bookings: Arc<dyn BookingRepository>,
    // Deal IDs are derived from the last one issued, so allocation must not interleave.
    conversion_lock: Mutex<()>,
}

impl QuoteManager {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        quotes: Arc<dyn QuoteRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            clients,
            quotes,
            bookings,
            conversion_lock: Mutex::new(()),
        }
    }

    pub async fn create_quote(&self, input: NewQuote) -> CoreResult<Quote> {
        let quote = input.into_quote()?;
        self.clients
            .get_client(quote.client_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", quote.client_id))?;

        self.quotes.create_quote(&quote).await?;
        info!(quote_id = %quote.id, client_id = %quote.client_id, "Quote created");
        Ok(quote)
    }

    pub async fn get_quote(&self, id: Uuid) -> CoreResult<Quote> {
        self.quotes
            .get_quote(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Quote", id))
    }

    pub async fn list_quotes(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Quote>> {
        self.quotes.list_quotes(client_id).await
    }

    /// Manual status change. `CONVERTED` is only reachable through [`QuoteManager::convert`] and
    /// is final.
    pub async fn update_status(&self, id: Uuid, status: QuoteStatus) -> CoreResult<Quote> {
        let mut quote = self.get_quote(id).await?;

        if status == QuoteStatus::Converted || quote.status == QuoteStatus::Converted {
            return Err(invalid_transition(quote.status, status));
        }

        self.quotes.update_quote_status(id, status).await?;
        quote.status = status;
        quote.updated_at = Utc::now();
        Ok(quote)
    }

    /// Transition: any open quote → Converted, creating its booking under a fresh deal ID
    pub async fn convert(&self, id: Uuid) -> CoreResult<Booking> {
        let _guard = self.conversion_lock.lock().await;

        let quote = self.get_quote(id).await?;
        if matches!(quote.status, QuoteStatus::Converted | QuoteStatus::Declined) {
            return Err(invalid_transition(quote.status, QuoteStatus::Converted));
        }

        let last = self.bookings.last_deal_id().await?;
        let booking = Booking {
            id: Uuid::new_v4(),
            deal_id: generate_next_deal_id(last.as_deref()),
            quote_id: quote.id,
            client_id: quote.client_id,
            total_pence: quote.price_pence.unwrap_or(0),
            created_at: Utc::now(),
        };

        self.bookings.create_booking(&booking).await?;
        self.quotes
            .update_quote_status(quote.id, QuoteStatus::Converted)
            .await?;

        info!(
            quote_id = %quote.id,
            booking_id = %booking.id,
            deal_id = %booking.deal_id,
            "Quote converted to booking"
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, id: Uuid) -> CoreResult<Booking> {
        self.bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", id))
    }

    pub async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        self.bookings.list_bookings().await
    }
}

fn invalid_transition(from: QuoteStatus, to: QuoteStatus) -> CoreError {
    CoreError::Conflict(format!(
        "Invalid quote transition from {} to {}",
        from.as_str(),
        to.as_str()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use wayfare_core::crm::NewClient;
    use wayfare_store::memory::MemoryStore;

    async fn setup() -> (Arc<MemoryStore>, QuoteManager, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let manager = QuoteManager::new(store.clone(), store.clone(), store.clone());
        let client = NewClient {
            name: Some("Ada Traveller".into()),
            ..Default::default()
        }
        .into_client()
        .unwrap();
        store.create_client(&client).await.unwrap();
        (store, manager, client.id)
    }

    fn new_quote(client_id: Uuid, price_pence: Option<i64>) -> NewQuote {
        NewQuote {
            client_id: Some(client_id),
            holiday_type: Some("Beach".into()),
            price_pence,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_quote_for_unknown_client_is_not_found() {
        let (_, manager, _) = setup().await;
        let err = manager
            .create_quote(new_quote(Uuid::new_v4(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_convert_allocates_sequential_deal_ids() {
        let (_, manager, client_id) = setup().await;
        let year = Utc::now().year();

        let first = manager.create_quote(new_quote(client_id, Some(79_900))).await.unwrap();
        let second = manager.create_quote(new_quote(client_id, None)).await.unwrap();

        let b1 = manager.convert(first.id).await.unwrap();
        let b2 = manager.convert(second.id).await.unwrap();

        assert_eq!(b1.deal_id, format!("TRQ-{}-0001", year));
        assert_eq!(b2.deal_id, format!("TRQ-{}-0002", year));
        assert_eq!(b1.total_pence, 79_900);
        assert_eq!(b2.total_pence, 0);
        assert_eq!(b1.client_id, client_id);
        assert_eq!(
            manager.get_quote(first.id).await.unwrap().status,
            QuoteStatus::Converted
        );
    }

    #[tokio::test]
    async fn test_converting_twice_conflicts() {
        let (_, manager, client_id) = setup().await;
        let quote = manager.create_quote(new_quote(client_id, None)).await.unwrap();
        manager.convert(quote.id).await.unwrap();

        let err = manager.convert(quote.id).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(manager.list_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_conversions_get_distinct_ids() {
        let (_, manager, client_id) = setup().await;
        let manager = Arc::new(manager);
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(manager.create_quote(new_quote(client_id, None)).await.unwrap().id);
        }

        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.convert(id).await })
            })
            .collect();

        let mut deal_ids = Vec::new();
        for handle in handles {
            deal_ids.push(handle.await.unwrap().unwrap().deal_id);
        }
        deal_ids.sort();
        deal_ids.dedup();
        assert_eq!(deal_ids.len(), 5);
    }

    #[tokio::test]
    async fn test_manual_status_cannot_reach_or_leave_converted() {
        let (_, manager, client_id) = setup().await;
        let quote = manager.create_quote(new_quote(client_id, None)).await.unwrap();

        let sent = manager.update_status(quote.id, QuoteStatus::Sent).await.unwrap();
        assert_eq!(sent.status, QuoteStatus::Sent);

        let err = manager
            .update_status(quote.id, QuoteStatus::Converted)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        manager.convert(quote.id).await.unwrap();
        let err = manager
            .update_status(quote.id, QuoteStatus::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_declined_quote_cannot_convert() {
        let (_, manager, client_id) = setup().await;
        let quote = manager.create_quote(new_quote(client_id, None)).await.unwrap();
        manager.update_status(quote.id, QuoteStatus::Declined).await.unwrap();

        assert!(manager.convert(quote.id).await.is_err());
    }
}
