//! In-process stand-ins for the outbound adapters. The social double doubles as the dry-run
//! adapter when no platform token is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;
use wayfare_core::deal::MediaId;
use wayfare_core::social::{MediaHandle, MediaUpload, PostDraft, PostHandle, RemotePost, SocialPlatform};
use wayfare_core::text::{CompletionRequest, TextGenerator};
use wayfare_core::{CoreError, CoreResult};

/// One recorded call against [`MockSocialPlatform`].
#[derive(Debug, Clone, PartialEq)]
pub enum SocialCall {
    Create(PostDraft),
    Confirm(String),
    Update(String, PostDraft),
    Get(String),
    Delete(String),
    /// File name of the upload
    Upload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailOn {
    Nothing,
    Create(u16),
    Confirm(u16),
    Delete(u16),
}

/// Records calls and keeps created posts in memory. Never touches the network.
pub struct MockSocialPlatform {
    calls: Mutex<Vec<SocialCall>>,
    posts: Mutex<HashMap<String, RemotePost>>,
    next_id: AtomicI64,
    fail_on: FailOn,
}

impl MockSocialPlatform {
    pub fn new() -> Self {
        Self::with_failure(FailOn::Nothing)
    }

    pub fn failing_create(status: u16) -> Self {
        Self::with_failure(FailOn::Create(status))
    }

    pub fn failing_confirm(status: u16) -> Self {
        Self::with_failure(FailOn::Confirm(status))
    }

    pub fn failing_delete(status: u16) -> Self {
        Self::with_failure(FailOn::Delete(status))
    }

    fn with_failure(fail_on: FailOn) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            posts: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1000),
            fail_on,
        }
    }

    pub fn calls(&self) -> Vec<SocialCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: SocialCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn store_post(&self, uuid: &str, draft: &PostDraft) {
        if let Ok(mut posts) = self.posts.lock() {
            posts.insert(
                uuid.to_string(),
                RemotePost {
                    uuid: uuid.to_string(),
                    body: draft.body.clone(),
                    media_ids: draft.media_ids.clone(),
                },
            );
        }
    }

    fn rejected(status: u16) -> CoreError {
        CoreError::ExternalError {
            service: "social".into(),
            status: Some(status),
            payload: serde_json::json!({ "message": "rejected by mock platform" }),
        }
    }
}

impl Default for MockSocialPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocialPlatform for MockSocialPlatform {
    async fn create_post(&self, draft: &PostDraft) -> CoreResult<PostHandle> {
        self.record(SocialCall::Create(draft.clone()));
        if let FailOn::Create(status) = self.fail_on {
            return Err(Self::rejected(status));
        }
        let uuid = Uuid::new_v4().to_string();
        self.store_post(&uuid, draft);
        info!(external_post_id = %uuid, scheduled_at = %draft.scheduled_at, "Dry-run post created");
        Ok(PostHandle {
            id: Some(self.next_id.fetch_add(1, Ordering::SeqCst)),
            uuid,
        })
    }

    async fn confirm_schedule(&self, post_uuid: &str) -> CoreResult<()> {
        self.record(SocialCall::Confirm(post_uuid.to_string()));
        if let FailOn::Confirm(status) = self.fail_on {
            return Err(Self::rejected(status));
        }
        Ok(())
    }

    async fn update_post(&self, post_uuid: &str, draft: &PostDraft) -> CoreResult<()> {
        self.record(SocialCall::Update(post_uuid.to_string(), draft.clone()));
        self.store_post(post_uuid, draft);
        info!(external_post_id = %post_uuid, scheduled_at = %draft.scheduled_at, "Dry-run post updated");
        Ok(())
    }

    async fn get_post(&self, post_uuid: &str) -> CoreResult<RemotePost> {
        self.record(SocialCall::Get(post_uuid.to_string()));
        self.posts
            .lock()
            .ok()
            .and_then(|posts| posts.get(post_uuid).cloned())
            .ok_or_else(|| Self::rejected(404))
    }

    async fn delete_post(&self, post_uuid: &str) -> CoreResult<()> {
        self.record(SocialCall::Delete(post_uuid.to_string()));
        if let FailOn::Delete(status) = self.fail_on {
            return Err(Self::rejected(status));
        }
        if let Ok(mut posts) = self.posts.lock() {
            posts.remove(post_uuid);
        }
        Ok(())
    }

    async fn upload_media(&self, upload: &MediaUpload) -> CoreResult<MediaHandle> {
        self.record(SocialCall::Upload(upload.file_name.clone()));
        Ok(MediaHandle {
            id: MediaId::Number(self.next_id.fetch_add(1, Ordering::SeqCst)),
            uuid: Some(Uuid::new_v4().to_string()),
        })
    }
}

/// Answers with fixed copy, picked by the request's token budget
/// (50 subtitle, 150 resort summary, anything else hashtags).
pub struct CannedTextGenerator {
    subtitle: String,
    resort_summary: String,
    hashtags: String,
}

impl CannedTextGenerator {
    pub fn new(
        subtitle: impl Into<String>,
        resort_summary: impl Into<String>,
        hashtags: impl Into<String>,
    ) -> Self {
        Self {
            subtitle: subtitle.into(),
            resort_summary: resort_summary.into(),
            hashtags: hashtags.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for CannedTextGenerator {
    async fn complete(&self, request: &CompletionRequest) -> CoreResult<String> {
        Ok(match request.max_tokens {
            50 => self.subtitle.clone(),
            150 => self.resort_summary.clone(),
            _ => self.hashtags.clone(),
        })
    }
}

/// Every call fails, as if the AI backend were down.
pub struct FailingTextGenerator;

#[async_trait]
impl TextGenerator for FailingTextGenerator {
    async fn complete(&self, request: &CompletionRequest) -> CoreResult<String> {
        Err(CoreError::ExternalError {
            service: "ai".into(),
            status: Some(503),
            payload: serde_json::json!({ "model": request.model }),
        })
    }
}
