use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::crm::{
    Booking, Client, Quote, QuoteStatus, Referral, ReferralStatus, Ticket, TicketStatus,
};
use wayfare_core::repository::{
    BookingRepository, ClientRepository, QuoteRepository, ReferralRepository, TicketRepository,
};
use wayfare_core::CoreResult;
use wayfare_shared::Masked;

use crate::database::{bad_column, db_error};

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            email: row.email.map(Masked),
            phone: row.phone.map(Masked),
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    client_id: Uuid,
    holiday_type: String,
    destination: Option<String>,
    travel_date: Option<NaiveDate>,
    nights: Option<i32>,
    price_pence: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for Quote {
    type Error = wayfare_core::CoreError;

    fn try_from(row: QuoteRow) -> CoreResult<Self> {
        let status = QuoteStatus::parse(&row.status).ok_or_else(|| bad_column("quote status", &row.status))?;
        Ok(Quote {
            id: row.id,
            client_id: row.client_id,
            holiday_type: row.holiday_type,
            destination: row.destination,
            travel_date: row.travel_date,
            nights: row.nights,
            price_pence: row.price_pence,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    deal_id: String,
    quote_id: Uuid,
    client_id: Uuid,
    total_pence: i64,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            deal_id: row.deal_id,
            quote_id: row.quote_id,
            client_id: row.client_id,
            total_pence: row.total_pence,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    client_id: Uuid,
    subject: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = wayfare_core::CoreError;

    fn try_from(row: TicketRow) -> CoreResult<Self> {
        let status = TicketStatus::parse(&row.status).ok_or_else(|| bad_column("ticket status", &row.status))?;
        Ok(Ticket {
            id: row.id,
            client_id: row.client_id,
            subject: row.subject,
            description: row.description,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReferralRow {
    id: Uuid,
    referrer_client_id: Uuid,
    referred_client_id: Uuid,
    booking_id: Option<Uuid>,
    commission_rate_bps: i32,
    commission_pence: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReferralRow> for Referral {
    type Error = wayfare_core::CoreError;

    fn try_from(row: ReferralRow) -> CoreResult<Self> {
        let status = ReferralStatus::parse(&row.status)
            .ok_or_else(|| bad_column("referral status", &row.status))?;
        Ok(Referral {
            id: row.id,
            referrer_client_id: row.referrer_client_id,
            referred_client_id: row.referred_client_id,
            booking_id: row.booking_id,
            commission_rate_bps: row.commission_rate_bps,
            commission_pence: row.commission_pence,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Clients
// ============================================================================

pub struct StoreClientRepository {
    pool: PgPool,
}

impl StoreClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for StoreClientRepository {
    async fn create_client(&self, client: &Client) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, name, email, phone, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(client.email.as_ref().map(Masked::expose))
        .bind(client.phone.as_ref().map(Masked::expose))
        .bind(&client.notes)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_client(&self, id: Uuid) -> CoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Client::from))
    }

    async fn list_clients(&self) -> CoreResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn update_client(&self, client: &Client) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE clients
            SET name = $2, email = $3, phone = $4, notes = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(client.email.as_ref().map(Masked::expose))
        .bind(client.phone.as_ref().map(Masked::expose))
        .bind(&client.notes)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn delete_client(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Quotes
// ============================================================================

pub struct StoreQuoteRepository {
    pool: PgPool,
}

impl StoreQuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuoteRepository for StoreQuoteRepository {
    async fn create_quote(&self, quote: &Quote) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quotes (id, client_id, holiday_type, destination, travel_date, nights, price_pence, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(quote.id)
        .bind(quote.client_id)
        .bind(&quote.holiday_type)
        .bind(&quote.destination)
        .bind(quote.travel_date)
        .bind(quote.nights)
        .bind(quote.price_pence)
        .bind(quote.status.as_str())
        .bind(quote.created_at)
        .bind(quote.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_quote(&self, id: Uuid) -> CoreResult<Option<Quote>> {
        sqlx::query_as::<_, QuoteRow>("SELECT * FROM quotes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Quote::try_from)
            .transpose()
    }

    async fn list_quotes(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Quote>> {
        let rows = sqlx::query_as::<_, QuoteRow>(
            r#"
            SELECT * FROM quotes
            WHERE ($1::uuid IS NULL OR client_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(Quote::try_from).collect()
    }

    async fn update_quote_status(&self, id: Uuid, status: QuoteStatus) -> CoreResult<bool> {
        let result = sqlx::query("UPDATE quotes SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Bookings
// ============================================================================

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, deal_id, quote_id, client_id, total_pence, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.deal_id)
        .bind(booking.quote_id)
        .bind(booking.client_id)
        .bind(booking.total_pence)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Booking::from))
    }

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn last_deal_id(&self) -> CoreResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT deal_id FROM bookings ORDER BY created_at DESC, deal_id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }
}

// ============================================================================
// Tickets
// ============================================================================

pub struct StoreTicketRepository {
    pool: PgPool,
}

impl StoreTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for StoreTicketRepository {
    async fn create_ticket(&self, ticket: &Ticket) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tickets (id, client_id, subject, description, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.client_id)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_ticket(&self, id: Uuid) -> CoreResult<Option<Ticket>> {
        sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Ticket::try_from)
            .transpose()
    }

    async fn list_tickets(&self, client_id: Option<Uuid>) -> CoreResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT * FROM tickets
            WHERE ($1::uuid IS NULL OR client_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn update_ticket_status(&self, id: Uuid, status: TicketStatus) -> CoreResult<bool> {
        let result = sqlx::query("UPDATE tickets SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Referrals
// ============================================================================

pub struct StoreReferralRepository {
    pool: PgPool,
}

impl StoreReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferralRepository for StoreReferralRepository {
    async fn create_referral(&self, referral: &Referral) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO referrals (id, referrer_client_id, referred_client_id, booking_id, commission_rate_bps, commission_pence, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(referral.id)
        .bind(referral.referrer_client_id)
        .bind(referral.referred_client_id)
        .bind(referral.booking_id)
        .bind(referral.commission_rate_bps)
        .bind(referral.commission_pence)
        .bind(referral.status.as_str())
        .bind(referral.created_at)
        .bind(referral.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_referral(&self, id: Uuid) -> CoreResult<Option<Referral>> {
        sqlx::query_as::<_, ReferralRow>("SELECT * FROM referrals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Referral::try_from)
            .transpose()
    }

    async fn list_referrals(&self) -> CoreResult<Vec<Referral>> {
        let rows = sqlx::query_as::<_, ReferralRow>("SELECT * FROM referrals ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(Referral::try_from).collect()
    }

    async fn update_referral(&self, referral: &Referral) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE referrals
            SET booking_id = $2, commission_pence = $3, status = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(referral.id)
        .bind(referral.booking_id)
        .bind(referral.commission_pence)
        .bind(referral.status.as_str())
        .bind(referral.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}
