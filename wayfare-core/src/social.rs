use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::deal::MediaId;
use crate::CoreResult;

/// Content and timing for a post on the social platform. `scheduled_at` is wall-clock time in
/// the platform account's own timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub body: String,
    pub media_ids: Vec<MediaId>,
    pub scheduled_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostHandle {
    pub id: Option<i64>,
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaHandle {
    pub id: MediaId,
    pub uuid: Option<String>,
}

/// Post as currently held by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePost {
    pub uuid: String,
    pub body: String,
    pub media_ids: Vec<MediaId>,
}

/// A file received from staff, uploaded fresh on every schedule call.
#[derive(Clone, PartialEq)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub alt_text: Option<String>,
}

impl std::fmt::Debug for MediaUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("alt_text", &self.alt_text)
            .finish()
    }
}

#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// Create a post flagged as scheduled. Must be followed by `confirm_schedule`.
    async fn create_post(&self, draft: &PostDraft) -> CoreResult<PostHandle>;

    /// Second phase of a first schedule: keep the post queued instead of publishing now.
    async fn confirm_schedule(&self, post_uuid: &str) -> CoreResult<()>;

    /// Replace content, media and date/time of an existing post. Reschedules implicitly.
    async fn update_post(&self, post_uuid: &str, draft: &PostDraft) -> CoreResult<()>;

    async fn get_post(&self, post_uuid: &str) -> CoreResult<RemotePost>;

    async fn delete_post(&self, post_uuid: &str) -> CoreResult<()>;

    async fn upload_media(&self, upload: &MediaUpload) -> CoreResult<MediaHandle>;
}
