use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use wayfare_core::crm::{NewTicket, Ticket, TicketStatus};
use wayfare_core::repository::{ClientRepository, TicketRepository};
use wayfare_core::{CoreError, CoreResult};

/// Support tickets raised for clients
pub struct TicketDesk {
    clients: Arc<dyn ClientRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl TicketDesk {
    pub fn new(clients: Arc<dyn ClientRepository>, tickets: Arc<dyn TicketRepository>) -> Self {
        Self { clients, tickets }
    }

    pub async fn open_ticket(&self, input: NewTicket) -> CoreResult<Ticket> {
        let ticket = input.into_ticket()?;
        self.clients
            .get_client(ticket.client_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", ticket.client_id))?;

        self.tickets.create_ticket(&ticket).await?;
        info!(ticket_id = %ticket.id, client_id = %ticket.client_id, "Ticket opened");
        Ok(ticket)
    }

    pub async fn get_ticket(&self, id: Uuid) -> CoreResult<Ticket> {
        self.tickets
            .get_ticket(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Ticket", id))
    }

    pub async fn list_tickets(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Ticket>> {
        self.tickets.list_tickets(client_id).await
    }

    pub async fn update_status(&self, id: Uuid, status: TicketStatus) -> CoreResult<Ticket> {
        let mut ticket = self.get_ticket(id).await?;
        if !self.tickets.update_ticket_status(id, status).await? {
            return Err(CoreError::not_found("Ticket", id));
        }
        ticket.status = status;
        ticket.updated_at = Utc::now();
        info!(ticket_id = %id, status = status.as_str(), "Ticket status updated");
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::crm::NewClient;
    use wayfare_store::memory::MemoryStore;

    #[tokio::test]
    async fn test_ticket_flow() {
        let store = Arc::new(MemoryStore::new());
        let desk = TicketDesk::new(store.clone(), store.clone());
        let client = NewClient {
            name: Some("Ada".into()),
            ..Default::default()
        }
        .into_client()
        .unwrap();
        store.create_client(&client).await.unwrap();

        let ticket = desk
            .open_ticket(NewTicket {
                client_id: Some(client.id),
                subject: Some("Lost luggage".into()),
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);

        let updated = desk.update_status(ticket.id, TicketStatus::Resolved).await.unwrap();
        assert_eq!(updated.status, TicketStatus::Resolved);
        assert_eq!(desk.list_tickets(Some(client.id)).await.unwrap().len(), 1);
        assert!(desk.list_tickets(Some(Uuid::new_v4())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ticket_for_unknown_client() {
        let store = Arc::new(MemoryStore::new());
        let desk = TicketDesk::new(store.clone(), store);
        let err = desk
            .open_ticket(NewTicket {
                client_id: Some(Uuid::new_v4()),
                subject: Some("Hello".into()),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
