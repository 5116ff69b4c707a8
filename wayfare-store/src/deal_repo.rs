use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::deal::{DealStatus, MediaId, ScheduleState, TravelDealRecord};
use wayfare_core::repository::TravelDealRepository;
use wayfare_core::{CoreError, CoreResult};

use crate::database::{bad_column, db_error};

pub struct StoreTravelDealRepository {
    pool: PgPool,
}

impl StoreTravelDealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TravelDealRow {
    id: Uuid,
    quote_id: Uuid,
    title: String,
    subtitle: String,
    resort_summary: String,
    hashtags: String,
    post_text: String,
    media_ids: Json<Vec<MediaId>>,
    external_post_id: Option<String>,
    scheduled_at: Option<NaiveDateTime>,
    status: String,
    copy_pending: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TravelDealRow> for TravelDealRecord {
    type Error = CoreError;

    fn try_from(row: TravelDealRow) -> CoreResult<Self> {
        let status = DealStatus::parse(&row.status).ok_or_else(|| bad_column("deal status", &row.status))?;
        let schedule = match (row.external_post_id, row.scheduled_at) {
            (Some(external_post_id), Some(scheduled_at)) => ScheduleState::Scheduled {
                external_post_id,
                scheduled_at,
            },
            _ => ScheduleState::Unscheduled,
        };
        Ok(TravelDealRecord {
            id: row.id,
            quote_id: row.quote_id,
            title: row.title,
            subtitle: row.subtitle,
            resort_summary: row.resort_summary,
            hashtags: row.hashtags,
            post_text: row.post_text,
            media_ids: row.media_ids.0,
            schedule,
            status,
            copy_pending: row.copy_pending,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl TravelDealRepository for StoreTravelDealRepository {
    async fn save_deal(&self, deal: &TravelDealRecord) -> CoreResult<()> {
        let (external_post_id, scheduled_at) = match &deal.schedule {
            ScheduleState::Scheduled {
                external_post_id,
                scheduled_at,
            } => (Some(external_post_id.as_str()), Some(*scheduled_at)),
            ScheduleState::Unscheduled => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO travel_deals (
                id, quote_id, title, subtitle, resort_summary, hashtags, post_text,
                media_ids, external_post_id, scheduled_at, status, copy_pending, created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                subtitle = EXCLUDED.subtitle,
                resort_summary = EXCLUDED.resort_summary,
                hashtags = EXCLUDED.hashtags,
                post_text = EXCLUDED.post_text,
                media_ids = EXCLUDED.media_ids,
                external_post_id = EXCLUDED.external_post_id,
                scheduled_at = EXCLUDED.scheduled_at,
                status = EXCLUDED.status,
                copy_pending = EXCLUDED.copy_pending,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(deal.id)
        .bind(deal.quote_id)
        .bind(&deal.title)
        .bind(&deal.subtitle)
        .bind(&deal.resort_summary)
        .bind(&deal.hashtags)
        .bind(&deal.post_text)
        .bind(Json(&deal.media_ids))
        .bind(external_post_id)
        .bind(scheduled_at)
        .bind(deal.status.as_str())
        .bind(deal.copy_pending)
        .bind(deal.created_at)
        .bind(deal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_deal(&self, id: Uuid) -> CoreResult<Option<TravelDealRecord>> {
        sqlx::query_as::<_, TravelDealRow>("SELECT * FROM travel_deals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(TravelDealRecord::try_from)
            .transpose()
    }

    async fn find_by_quote(&self, quote_id: Uuid) -> CoreResult<Option<TravelDealRecord>> {
        sqlx::query_as::<_, TravelDealRow>("SELECT * FROM travel_deals WHERE quote_id = $1")
            .bind(quote_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(TravelDealRecord::try_from)
            .transpose()
    }

    async fn list_deals(&self) -> CoreResult<Vec<TravelDealRecord>> {
        let rows = sqlx::query_as::<_, TravelDealRow>("SELECT * FROM travel_deals ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(TravelDealRecord::try_from).collect()
    }

    async fn delete_deal(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM travel_deals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
