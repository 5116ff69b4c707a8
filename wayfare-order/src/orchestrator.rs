use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};
use uuid::Uuid;
use wayfare_core::deal::{merge_media_ids, DealStatus, MediaId, ScheduleState, TravelDealRecord};
use wayfare_core::repository::{QuoteRepository, TravelDealRepository};
use wayfare_core::social::{MediaUpload, PostDraft, SocialPlatform};
use wayfare_core::{CoreError, CoreResult};
use wayfare_deal::{assemble, parse_travel_deal, ContentGenerator, DealFields, EmojiPick, TravelDeal};

use crate::lock::DealLocks;

/// Raw deal input: free `key: value` text or already structured fields.
#[derive(Debug, Clone)]
pub enum DealInput {
    Text(String),
    Fields(DealFields),
}

impl DealInput {
    pub fn into_deal(self) -> CoreResult<TravelDeal> {
        match self {
            DealInput::Text(text) => parse_travel_deal(&text),
            DealInput::Fields(fields) => fields.validate(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Wall-clock time in the platform account's timezone.
    pub scheduled_at: NaiveDateTime,
    /// Media already on the platform. `None` keeps what the post currently has.
    pub media_ids: Option<Vec<MediaId>>,
    /// New files, uploaded before the post call.
    pub files: Vec<MediaUpload>,
    /// Replaces the stored post body.
    pub post_text: Option<String>,
}

impl ScheduleRequest {
    pub fn at(scheduled_at: NaiveDateTime) -> Self {
        Self {
            scheduled_at,
            media_ids: None,
            files: Vec::new(),
            post_text: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub deal_id: Uuid,
    pub external_post_id: Option<String>,
    /// `None` when there was no external post to delete.
    pub external_deleted: Option<bool>,
}

/// Coordinates a quote's travel deal from generated draft to a scheduled social post.
pub struct DealOrchestrator {
    quotes: Arc<dyn QuoteRepository>,
    deals: Arc<dyn TravelDealRepository>,
    generator: ContentGenerator,
    social: Arc<dyn SocialPlatform>,
    locks: DealLocks,
}

impl DealOrchestrator {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        deals: Arc<dyn TravelDealRepository>,
        generator: ContentGenerator,
        social: Arc<dyn SocialPlatform>,
    ) -> Self {
        Self {
            quotes,
            deals,
            generator,
            social,
            locks: DealLocks::new(),
        }
    }

    /// Validate the input, write the copy and store the draft for `quote_id`.
    ///
    /// Regenerating for a quote that already has a deal replaces its copy but keeps the deal ID,
    /// attached media and any live external post.
    pub async fn generate_deal(&self, quote_id: Uuid, input: DealInput) -> CoreResult<TravelDealRecord> {
        let deal = input.into_deal()?;

        self.quotes
            .get_quote(quote_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Quote", quote_id))?;

        let parts = self.generator.generate_parts(&deal).await;
        let emojis = EmojiPick::random(&mut rand::thread_rng());
        let content = assemble(&deal, parts, emojis);
        let now = Utc::now();

        let existing = self.deals.find_by_quote(quote_id).await?;
        let current = match existing {
            Some(snapshot) => {
                let guard = self.locks.lock(snapshot.id).await;
                // Re-read under the lock: a delete may have won the race.
                self.deals.get_deal(snapshot.id).await?.map(|record| (guard, record))
            }
            None => None,
        };

        let record = match current {
            Some((_guard, mut record)) => {
                record.title = deal.title.clone();
                record.subtitle = content.subtitle;
                record.resort_summary = content.resort_summary;
                record.hashtags = content.hashtags;
                record.post_text = content.post;
                if record.is_scheduled() {
                    record.copy_pending = true;
                } else {
                    record.status = DealStatus::Drafted;
                }
                record.updated_at = now;
                self.deals.save_deal(&record).await?;
                record
            }
            None => {
                let record = TravelDealRecord {
                    id: Uuid::new_v4(),
                    quote_id,
                    title: deal.title.clone(),
                    subtitle: content.subtitle,
                    resort_summary: content.resort_summary,
                    hashtags: content.hashtags,
                    post_text: content.post,
                    media_ids: Vec::new(),
                    schedule: ScheduleState::Unscheduled,
                    status: DealStatus::Drafted,
                    copy_pending: false,
                    created_at: now,
                    updated_at: now,
                };
                self.deals.save_deal(&record).await?;
                record
            }
        };

        info!(deal_id = %record.id, quote_id = %quote_id, "Travel deal drafted");
        Ok(record)
    }

    /// First schedule creates and confirms a post; later calls update the same post.
    pub async fn schedule_deal(&self, deal_id: Uuid, request: ScheduleRequest) -> CoreResult<TravelDealRecord> {
        let guard = self.locks.lock(deal_id).await;

        let mut record = self
            .deals
            .get_deal(deal_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Travel deal", deal_id))?;

        // Settle body and base media before anything is uploaded.
        let (body, base_media) = match &record.schedule {
            ScheduleState::Unscheduled => (
                request.post_text.unwrap_or_else(|| record.post_text.clone()),
                request.media_ids.unwrap_or_else(|| record.media_ids.clone()),
            ),
            ScheduleState::Scheduled { external_post_id, .. } => {
                let body_from_remote = request.post_text.is_none() && !record.copy_pending;
                let (remote_body, remote_media) = if body_from_remote || request.media_ids.is_none() {
                    self.current_post(&record, external_post_id).await
                } else {
                    (record.post_text.clone(), record.media_ids.clone())
                };
                let body = match request.post_text {
                    Some(text) => text,
                    None if record.copy_pending => record.post_text.clone(),
                    None => remote_body,
                };
                (body, request.media_ids.unwrap_or(remote_media))
            }
        };
        if body.trim().is_empty() {
            return Err(CoreError::validation("post text must not be empty"));
        }

        let uploaded = self.upload_files(&request.files).await?;
        let draft = PostDraft {
            body,
            media_ids: merge_media_ids(&base_media, &uploaded),
            scheduled_at: request.scheduled_at,
        };

        let record = match record.schedule.clone() {
            ScheduleState::Unscheduled => self.publish(guard, record, draft).await?,
            ScheduleState::Scheduled { external_post_id, .. } => {
                self.social.update_post(&external_post_id, &draft).await?;

                record.post_text = draft.body;
                record.media_ids = draft.media_ids;
                record.schedule = ScheduleState::Scheduled {
                    external_post_id,
                    scheduled_at: draft.scheduled_at,
                };
                record.status = DealStatus::Rescheduled;
                record.copy_pending = false;
                record.updated_at = Utc::now();
                self.deals.save_deal(&record).await?;
                record
            }
        };

        info!(
            deal_id = %deal_id,
            external_post_id = record.external_post_id().unwrap_or_default(),
            scheduled_at = %request.scheduled_at,
            status = record.status.as_str(),
            "Travel deal scheduled"
        );
        Ok(record)
    }

    /// Two-phase create and confirm, then persist. Runs as its own task holding the deal lock, so
    /// a caller that goes away (timeout, disconnect) cannot leave a created post unrecorded.
    async fn publish(
        &self,
        guard: OwnedMutexGuard<()>,
        mut record: TravelDealRecord,
        draft: PostDraft,
    ) -> CoreResult<TravelDealRecord> {
        let social = self.social.clone();
        let deals = self.deals.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            let handle = social.create_post(&draft).await?;
            if let Err(e) = social.confirm_schedule(&handle.uuid).await {
                error!(
                    deal_id = %record.id,
                    external_post_id = %handle.uuid,
                    error = %e,
                    "Post created but schedule confirmation failed"
                );
                return Err(e);
            }

            record.schedule = ScheduleState::Scheduled {
                external_post_id: handle.uuid,
                scheduled_at: draft.scheduled_at,
            };
            record.post_text = draft.body;
            record.media_ids = draft.media_ids;
            record.status = DealStatus::Scheduled;
            record.copy_pending = false;
            record.updated_at = Utc::now();
            deals.save_deal(&record).await?;
            Ok::<_, CoreError>(record)
        });

        task.await
            .map_err(|e| CoreError::InternalError(format!("schedule task failed: {}", e)))?
    }

    /// Remove a deal. The external post is deleted first when there is one, but the local record
    /// goes regardless of how that went.
    pub async fn delete_deal(&self, deal_id: Uuid) -> CoreResult<DeleteOutcome> {
        let _guard = self.locks.lock(deal_id).await;

        let record = self
            .deals
            .get_deal(deal_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Travel deal", deal_id))?;

        let external_post_id = record.external_post_id().map(str::to_string);
        let external_deleted = match &external_post_id {
            Some(post_id) => match self.social.delete_post(post_id).await {
                Ok(()) => Some(true),
                Err(e) => {
                    warn!(
                        deal_id = %deal_id,
                        external_post_id = %post_id,
                        error = %e,
                        "External post deletion failed, removing local deal anyway"
                    );
                    Some(false)
                }
            },
            None => None,
        };

        self.deals.delete_deal(deal_id).await?;
        info!(deal_id = %deal_id, "Travel deal deleted");

        Ok(DeleteOutcome {
            deal_id,
            external_post_id,
            external_deleted,
        })
    }

    pub async fn get_deal(&self, deal_id: Uuid) -> CoreResult<TravelDealRecord> {
        self.deals
            .get_deal(deal_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Travel deal", deal_id))
    }

    pub async fn deal_for_quote(&self, quote_id: Uuid) -> CoreResult<TravelDealRecord> {
        self.deals
            .find_by_quote(quote_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Quote {} has no travel deal", quote_id)))
    }

    pub async fn list_deals(&self) -> CoreResult<Vec<TravelDealRecord>> {
        self.deals.list_deals().await
    }

    async fn upload_files(&self, files: &[MediaUpload]) -> CoreResult<Vec<MediaId>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let handles = try_join_all(files.iter().map(|file| self.social.upload_media(file))).await?;
        info!(count = handles.len(), "Uploaded media to social platform");
        Ok(handles.into_iter().map(|h| h.id).collect())
    }

    /// Body and media the platform currently holds, falling back to the stored copy.
    async fn current_post(&self, record: &TravelDealRecord, external_post_id: &str) -> (String, Vec<MediaId>) {
        match self.social.get_post(external_post_id).await {
            Ok(post) => (post.body, post.media_ids),
            Err(e) => {
                warn!(
                    deal_id = %record.id,
                    external_post_id = %external_post_id,
                    error = %e,
                    "Could not read back external post, using stored copy"
                );
                (record.post_text.clone(), record.media_ids.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wayfare_connect::mock::{CannedTextGenerator, FailingTextGenerator, MockSocialPlatform, SocialCall};
    use wayfare_core::crm::NewQuote;
    use wayfare_store::memory::MemoryStore;

    struct Harness {
        store: Arc<MemoryStore>,
        social: Arc<MockSocialPlatform>,
        orchestrator: DealOrchestrator,
        quote_id: Uuid,
    }

    async fn harness_with(social: MockSocialPlatform) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let social = Arc::new(social);
        let backend = Arc::new(CannedTextGenerator::new(
            "Sun, Sea and Sangria",
            "A relaxed beachfront resort with three pools.",
            "#Tenerife #BeachLife",
        ));
        let orchestrator = DealOrchestrator::new(
            store.clone(),
            store.clone(),
            ContentGenerator::with_default_models(backend),
            social.clone(),
        );

        let quote = NewQuote {
            client_id: Some(Uuid::new_v4()),
            holiday_type: Some("Beach".into()),
            ..Default::default()
        }
        .into_quote()
        .unwrap();
        store.create_quote(&quote).await.unwrap();

        Harness {
            store,
            social,
            orchestrator,
            quote_id: quote.id,
        }
    }

    async fn harness() -> Harness {
        harness_with(MockSocialPlatform::new()).await
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn upload(name: &str) -> MediaUpload {
        MediaUpload {
            file_name: name.into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![1, 2, 3],
            alt_text: None,
        }
    }

    #[tokio::test]
    async fn test_text_to_post_end_to_end() {
        let h = harness().await;

        let record = h
            .orchestrator
            .generate_deal(
                h.quote_id,
                DealInput::Text("Title: Sunny Escape\nNights: 7\nPrice: 399".into()),
            )
            .await
            .unwrap();

        let post = &record.post_text;
        for needle in [
            "Sunny Escape",
            "7 Nights",
            "Total cost from £399pp",
            "A relaxed beachfront resort with three pools.",
            "#Tenerife #BeachLife",
        ] {
            assert_eq!(post.matches(needle).count(), 1, "{} in {}", needle, post);
        }
        assert_eq!(record.status, DealStatus::Drafted);
        assert_eq!(record.schedule, ScheduleState::Unscheduled);
        assert!(h.social.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_title_is_rejected_before_generation() {
        let h = harness().await;
        let err = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Nights: 7".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(h.store.list_deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_quote_is_not_found() {
        let h = harness().await;
        let err = h
            .orchestrator
            .generate_deal(Uuid::new_v4(), DealInput::Text("Title: X".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_generation_survives_ai_outage() {
        let store = Arc::new(MemoryStore::new());
        let quote = NewQuote {
            client_id: Some(Uuid::new_v4()),
            holiday_type: Some("City".into()),
            ..Default::default()
        }
        .into_quote()
        .unwrap();
        store.create_quote(&quote).await.unwrap();
        let orchestrator = DealOrchestrator::new(
            store.clone(),
            store.clone(),
            ContentGenerator::with_default_models(Arc::new(FailingTextGenerator)),
            Arc::new(MockSocialPlatform::new()),
        );

        let record = orchestrator
            .generate_deal(quote.id, DealInput::Text("Title: Paris".into()))
            .await
            .unwrap();

        assert_eq!(record.subtitle, wayfare_deal::generator::SUBTITLE_FALLBACK);
        assert_eq!(record.hashtags, wayfare_deal::generator::HASHTAGS_FALLBACK);
    }

    #[tokio::test]
    async fn test_first_schedule_creates_then_confirms() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();

        let scheduled = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap();

        let calls = h.social.calls();
        assert_eq!(calls.len(), 2);
        let created_uuid = match &calls[0] {
            SocialCall::Create(draft) => {
                assert_eq!(draft.body, record.post_text);
                assert_eq!(draft.scheduled_at, at(1, 9));
                scheduled.external_post_id().unwrap().to_string()
            }
            other => panic!("expected create, got {:?}", other),
        };
        assert_eq!(calls[1], SocialCall::Confirm(created_uuid));
        assert_eq!(scheduled.status, DealStatus::Scheduled);

        let stored = h.store.get_deal(record.id).await.unwrap().unwrap();
        assert_eq!(stored.external_post_id(), scheduled.external_post_id());
    }

    #[tokio::test]
    async fn test_reschedule_uses_single_update() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();
        let first = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap();
        let external_id = first.external_post_id().unwrap().to_string();
        h.social.clear_calls();

        let mut request = ScheduleRequest::at(at(3, 18));
        request.post_text = Some("Updated copy".into());
        request.media_ids = Some(vec![]);
        let second = h.orchestrator.schedule_deal(record.id, request).await.unwrap();

        let calls = h.social.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            SocialCall::Update(uuid, draft) => {
                assert_eq!(uuid, &external_id);
                assert_eq!(draft.body, "Updated copy");
                assert_eq!(draft.scheduled_at, at(3, 18));
            }
            other => panic!("expected update, got {:?}", other),
        }
        assert_eq!(second.external_post_id(), Some(external_id.as_str()));
        assert_eq!(second.status, DealStatus::Rescheduled);
        assert_eq!(second.post_text, "Updated copy");
    }

    #[tokio::test]
    async fn test_reschedule_reads_back_remote_post_without_overrides() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();
        let mut request = ScheduleRequest::at(at(1, 9));
        request.media_ids = Some(vec![MediaId::Number(5)]);
        h.orchestrator.schedule_deal(record.id, request).await.unwrap();
        h.social.clear_calls();

        let mut request = ScheduleRequest::at(at(2, 9));
        request.files = vec![upload("pool.jpg")];
        let rescheduled = h.orchestrator.schedule_deal(record.id, request).await.unwrap();

        let calls = h.social.calls();
        assert!(matches!(calls[0], SocialCall::Get(_)));
        assert!(matches!(calls[1], SocialCall::Upload(_)));
        assert!(matches!(calls[2], SocialCall::Update(_, _)));
        assert_eq!(rescheduled.media_ids.len(), 2);
        assert_eq!(rescheduled.media_ids[0], MediaId::Number(5));
        assert_eq!(rescheduled.post_text, record.post_text);
    }

    #[tokio::test]
    async fn test_uploaded_media_is_unioned_with_existing() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();

        let mut request = ScheduleRequest::at(at(1, 9));
        request.media_ids = Some(vec![MediaId::Number(11), MediaId::Text("abc".into())]);
        request.files = vec![upload("a.jpg"), upload("b.jpg")];
        let scheduled = h.orchestrator.schedule_deal(record.id, request).await.unwrap();

        assert_eq!(scheduled.media_ids.len(), 4);
        assert_eq!(scheduled.media_ids[0], MediaId::Number(11));
        assert_eq!(scheduled.media_ids[1], MediaId::Text("abc".into()));
        let uploads = h
            .social
            .calls()
            .into_iter()
            .filter(|c| matches!(c, SocialCall::Upload(_)))
            .count();
        assert_eq!(uploads, 2);
    }

    #[tokio::test]
    async fn test_platform_error_surfaces_and_nothing_is_stored() {
        let h = harness_with(MockSocialPlatform::failing_create(422)).await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();

        let err = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap_err();

        match err {
            CoreError::ExternalError { status, .. } => assert_eq!(status, Some(422)),
            other => panic!("unexpected error {:?}", other),
        }
        let stored = h.store.get_deal(record.id).await.unwrap().unwrap();
        assert!(!stored.is_scheduled());
        assert_eq!(stored.status, DealStatus::Drafted);
    }

    #[tokio::test]
    async fn test_delete_with_external_post() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();
        let scheduled = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap();
        let external_id = scheduled.external_post_id().unwrap().to_string();
        h.social.clear_calls();

        let outcome = h.orchestrator.delete_deal(record.id).await.unwrap();

        assert_eq!(h.social.calls(), vec![SocialCall::Delete(external_id)]);
        assert_eq!(outcome.external_deleted, Some(true));
        assert!(h.store.get_deal(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_without_external_post_skips_platform() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();

        let outcome = h.orchestrator.delete_deal(record.id).await.unwrap();

        assert!(h.social.calls().is_empty());
        assert_eq!(outcome.external_deleted, None);
        assert!(h.store.get_deal(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_local_record_when_platform_fails() {
        let h = harness_with(MockSocialPlatform::failing_delete(500)).await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();
        h.orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap();

        let outcome = h.orchestrator.delete_deal(record.id).await.unwrap();

        assert_eq!(outcome.external_deleted, Some(false));
        assert!(h.store.get_deal(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_regenerating_keeps_external_post() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();
        let scheduled = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap();

        let regenerated = h
            .orchestrator
            .generate_deal(
                h.quote_id,
                DealInput::Fields(DealFields {
                    title: Some("Sunnier Escape".into()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();

        assert_eq!(regenerated.id, record.id);
        assert_eq!(regenerated.title, "Sunnier Escape");
        assert_eq!(regenerated.external_post_id(), scheduled.external_post_id());
        assert_eq!(regenerated.status, DealStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_blank_override_rejected() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();
        let mut request = ScheduleRequest::at(at(1, 9));
        request.post_text = Some("  ".into());
        request.files = vec![upload("beach.jpg")];

        let err = h.orchestrator.schedule_deal(record.id, request).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(!h
            .social
            .calls()
            .iter()
            .any(|c| matches!(c, SocialCall::Upload(_))));
        assert!(h.social.calls().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_failure_surfaces_and_deal_stays_draft() {
        let h = harness_with(MockSocialPlatform::failing_confirm(500)).await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();

        let err = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap_err();

        match err {
            CoreError::ExternalError { status, .. } => assert_eq!(status, Some(500)),
            other => panic!("unexpected error {:?}", other),
        }
        let calls = h.social.calls();
        assert_eq!(calls.len(), 2);
        let created = match &calls[0] {
            SocialCall::Create(draft) => draft.clone(),
            other => panic!("expected create, got {:?}", other),
        };
        assert_eq!(created.body, record.post_text);
        assert!(matches!(calls[1], SocialCall::Confirm(_)));

        let stored = h.store.get_deal(record.id).await.unwrap().unwrap();
        assert_eq!(stored.schedule, ScheduleState::Unscheduled);
        assert_eq!(stored.status, DealStatus::Drafted);
    }

    #[tokio::test]
    async fn test_regenerated_copy_goes_out_on_next_reschedule() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Old Title".into()))
            .await
            .unwrap();
        h.orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap();

        let regenerated = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: New Title".into()))
            .await
            .unwrap();
        assert!(regenerated.copy_pending);
        h.social.clear_calls();

        let rescheduled = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(2, 9)))
            .await
            .unwrap();

        let sent = h
            .social
            .calls()
            .into_iter()
            .find_map(|c| match c {
                SocialCall::Update(_, draft) => Some(draft),
                _ => None,
            })
            .unwrap();
        assert!(sent.body.contains("New Title"));
        assert!(rescheduled.post_text.contains("New Title"));
        assert!(!rescheduled.copy_pending);

        // Once sent, a plain reschedule reads the platform copy again.
        h.social.clear_calls();
        h.orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(3, 9)))
            .await
            .unwrap();
        assert!(matches!(h.social.calls()[0], SocialCall::Get(_)));
    }

    #[tokio::test]
    async fn test_regenerate_after_concurrent_delete_starts_fresh() {
        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();
        h.orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .await
            .unwrap();

        // Hold the deal lock while a regenerate queues behind it, then delete as
        // `delete_deal` would before letting go.
        let guard = h.orchestrator.locks.lock(record.id).await;
        let store = h.store.clone();
        let deal_id = record.id;
        let (regenerated, _) = tokio::join!(
            h.orchestrator
                .generate_deal(h.quote_id, DealInput::Text("Title: Sunnier Escape".into())),
            async move {
                store.delete_deal(deal_id).await.unwrap();
                drop(guard);
            }
        );

        let regenerated = regenerated.unwrap();
        assert_ne!(regenerated.id, record.id);
        assert_eq!(regenerated.schedule, ScheduleState::Unscheduled);
        assert_eq!(regenerated.status, DealStatus::Drafted);
        assert!(h.store.get_deal(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_schedule_completes_when_caller_goes_away() {
        use futures_util::FutureExt;

        let h = harness().await;
        let record = h
            .orchestrator
            .generate_deal(h.quote_id, DealInput::Text("Title: Sunny Escape".into()))
            .await
            .unwrap();

        // Poll once and drop, like a request cut off by the timeout layer.
        let abandoned = h
            .orchestrator
            .schedule_deal(record.id, ScheduleRequest::at(at(1, 9)))
            .now_or_never();
        assert!(abandoned.is_none());

        let mut stored = h.store.get_deal(record.id).await.unwrap().unwrap();
        for _ in 0..100 {
            if stored.is_scheduled() {
                break;
            }
            tokio::task::yield_now().await;
            stored = h.store.get_deal(record.id).await.unwrap().unwrap();
        }

        assert!(stored.is_scheduled());
        assert_eq!(stored.status, DealStatus::Scheduled);
        let calls = h.social.calls();
        assert!(matches!(calls[0], SocialCall::Create(_)));
        assert!(matches!(calls[1], SocialCall::Confirm(_)));
    }
}
