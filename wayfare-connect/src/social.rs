//! REST client for the external social scheduling platform.
//!
//! Every path is scoped by workspace: `{base_url}/{workspace_id}/posts`, `.../media/`. Dates go
//! out as separate `date` (`YYYY-MM-DD`) and `time` (`HH:MM`) fields in the account's timezone.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wayfare_core::deal::MediaId;
use wayfare_core::social::{MediaHandle, MediaUpload, PostDraft, PostHandle, RemotePost, SocialPlatform};
use wayfare_core::CoreResult;

use crate::error::{ConnectError, Result};

const SERVICE: &str = "social";

#[derive(Debug, Clone)]
pub struct SocialClientConfig {
    pub base_url: String,
    pub workspace_id: String,
    pub account_id: String,
    pub api_token: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct PostBody<'a> {
    account_id: &'a str,
    body: &'a str,
    media: &'a [MediaId],
    date: String,
    time: String,
    status: &'static str,
}

impl<'a> PostBody<'a> {
    fn new(account_id: &'a str, draft: &'a PostDraft) -> Self {
        Self {
            account_id,
            body: &draft.body,
            media: &draft.media_ids,
            date: draft.scheduled_at.format("%Y-%m-%d").to_string(),
            time: draft.scheduled_at.format("%H:%M").to_string(),
            status: "scheduled",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmBody {
    post_now: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt_text: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    #[serde(default)]
    id: Option<i64>,
    uuid: String,
    #[serde(default, alias = "content", alias = "text")]
    body: Option<String>,
    #[serde(default)]
    media: Vec<MediaRef>,
}

/// The platform lists media either as bare IDs or as objects carrying an `id`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MediaRef {
    Id(MediaId),
    Object { id: MediaId },
}

impl MediaRef {
    fn into_id(self) -> MediaId {
        match self {
            MediaRef::Id(id) | MediaRef::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: MediaId,
    #[serde(default)]
    uuid: Option<String>,
}

pub struct HttpSocialPlatform {
    client: reqwest::Client,
    config: SocialClientConfig,
}

impl HttpSocialPlatform {
    pub fn new(config: SocialClientConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(ConnectError::Config("social api_token is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConnectError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.workspace_id,
            path.trim_start_matches('/')
        )
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let resp = request.bearer_auth(&self.config.api_token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, "Social platform returned an error");
            return Err(ConnectError::api(status.as_u16(), body));
        }

        resp.json::<T>().await.map_err(|e| ConnectError::Parse(e.to_string()))
    }

    async fn send_empty(&self, request: reqwest::RequestBuilder) -> Result<()> {
        let resp = request.bearer_auth(&self.config.api_token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, "Social platform returned an error");
            return Err(ConnectError::api(status.as_u16(), body));
        }
        Ok(())
    }

    async fn create(&self, draft: &PostDraft) -> Result<PostHandle> {
        let body = PostBody::new(&self.config.account_id, draft);
        let post: PostResponse = self.send(self.client.post(self.url("posts")).json(&body)).await?;
        info!(external_post_id = %post.uuid, "Social post created");
        Ok(PostHandle {
            id: post.id,
            uuid: post.uuid,
        })
    }

    async fn confirm(&self, post_uuid: &str) -> Result<()> {
        let url = self.url(&format!("posts/schedule/{}", post_uuid));
        self.send_empty(self.client.post(url).json(&ConfirmBody { post_now: false }))
            .await?;
        debug!(external_post_id = %post_uuid, "Social post schedule confirmed");
        Ok(())
    }

    /// The platform's reply to a PUT carries nothing we need, and may be empty.
    async fn update(&self, post_uuid: &str, draft: &PostDraft) -> Result<()> {
        let body = PostBody::new(&self.config.account_id, draft);
        let url = self.url(&format!("posts/{}", post_uuid));
        self.send_empty(self.client.put(url).json(&body)).await?;
        info!(external_post_id = %post_uuid, "Social post updated");
        Ok(())
    }

    async fn fetch(&self, post_uuid: &str) -> Result<RemotePost> {
        let url = self.url(&format!("posts/{}", post_uuid));
        let post: PostResponse = self.send(self.client.get(url)).await?;
        Ok(RemotePost {
            uuid: post.uuid,
            body: post.body.unwrap_or_default(),
            media_ids: post.media.into_iter().map(MediaRef::into_id).collect(),
        })
    }

    async fn delete(&self, post_uuid: &str) -> Result<()> {
        let url = self.url(&format!("posts/{}", post_uuid));
        self.send_empty(self.client.delete(url)).await
    }

    async fn upload(&self, upload: &MediaUpload) -> Result<MediaHandle> {
        let body = MediaBody {
            name: &upload.file_name,
            mime_type: upload.content_type.as_deref(),
            base64: base64::engine::general_purpose::STANDARD.encode(&upload.bytes),
            alt_text: upload.alt_text.as_deref(),
        };
        let media: MediaResponse = self.send(self.client.post(self.url("media/")).json(&body)).await?;
        debug!(file = %upload.file_name, media_id = %media.id, "Media uploaded");
        Ok(MediaHandle {
            id: media.id,
            uuid: media.uuid,
        })
    }
}

#[async_trait]
impl SocialPlatform for HttpSocialPlatform {
    async fn create_post(&self, draft: &PostDraft) -> CoreResult<PostHandle> {
        self.create(draft).await.map_err(|e| e.into_core(SERVICE))
    }

    async fn confirm_schedule(&self, post_uuid: &str) -> CoreResult<()> {
        self.confirm(post_uuid).await.map_err(|e| e.into_core(SERVICE))
    }

    async fn update_post(&self, post_uuid: &str, draft: &PostDraft) -> CoreResult<()> {
        self.update(post_uuid, draft).await.map_err(|e| e.into_core(SERVICE))
    }

    async fn get_post(&self, post_uuid: &str) -> CoreResult<RemotePost> {
        self.fetch(post_uuid).await.map_err(|e| e.into_core(SERVICE))
    }

    async fn delete_post(&self, post_uuid: &str) -> CoreResult<()> {
        self.delete(post_uuid).await.map_err(|e| e.into_core(SERVICE))
    }

    async fn upload_media(&self, upload: &MediaUpload) -> CoreResult<MediaHandle> {
        self.upload(upload).await.map_err(|e| e.into_core(SERVICE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wayfare_core::CoreError;

    fn config() -> SocialClientConfig {
        SocialClientConfig {
            base_url: "https://social.example.com/api/v1/".into(),
            workspace_id: "ws-1".into(),
            account_id: "acct-9".into(),
            api_token: "token".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_post_body_splits_date_and_time() {
        let draft = PostDraft {
            body: "Hello".into(),
            media_ids: vec![MediaId::Number(3), MediaId::Text("x".into())],
            scheduled_at: NaiveDate::from_ymd_opt(2026, 3, 7)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
        };
        let json = serde_json::to_value(PostBody::new("acct-9", &draft)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "account_id": "acct-9",
                "body": "Hello",
                "media": [3, "x"],
                "date": "2026-03-07",
                "time": "09:05",
                "status": "scheduled"
            })
        );
    }

    #[test]
    fn test_confirm_body() {
        let json = serde_json::to_value(ConfirmBody { post_now: false }).unwrap();
        assert_eq!(json, serde_json::json!({ "postNow": false }));
    }

    #[test]
    fn test_urls_are_workspace_scoped() {
        let platform = HttpSocialPlatform::new(config()).unwrap();
        assert_eq!(platform.url("posts"), "https://social.example.com/api/v1/ws-1/posts");
        assert_eq!(
            platform.url("posts/schedule/abc"),
            "https://social.example.com/api/v1/ws-1/posts/schedule/abc"
        );
        assert_eq!(platform.url("media/"), "https://social.example.com/api/v1/ws-1/media/");
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = config();
        config.api_token = " ".into();
        assert!(matches!(
            HttpSocialPlatform::new(config),
            Err(ConnectError::Config(_))
        ));
    }

    #[test]
    fn test_post_response_media_shapes() {
        let post: PostResponse = serde_json::from_value(serde_json::json!({
            "id": 17,
            "uuid": "p-1",
            "content": "Body",
            "media": [4, "m-2", { "id": 9, "url": "https://cdn" }]
        }))
        .unwrap();
        assert_eq!(post.body.as_deref(), Some("Body"));
        let ids: Vec<MediaId> = post.media.into_iter().map(MediaRef::into_id).collect();
        assert_eq!(
            ids,
            vec![MediaId::Number(4), MediaId::Text("m-2".into()), MediaId::Number(9)]
        );
    }

    #[test]
    fn test_media_body_is_base64() {
        let upload = MediaUpload {
            file_name: "pool.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: b"hi".to_vec(),
            alt_text: Some("Pool".into()),
        };
        let body = MediaBody {
            name: &upload.file_name,
            mime_type: upload.content_type.as_deref(),
            base64: base64::engine::general_purpose::STANDARD.encode(&upload.bytes),
            alt_text: upload.alt_text.as_deref(),
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["base64"], "aGk=");
        assert_eq!(json["altText"], "Pool");
        assert_eq!(json["mimeType"], "image/jpeg");
    }

    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn draft() -> PostDraft {
        PostDraft {
            body: "Hello".into(),
            media_ids: vec![],
            scheduled_at: NaiveDate::from_ymd_opt(2026, 3, 7)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_update_accepts_empty_and_partial_replies() {
        use axum::{http::StatusCode, routing::put, Json};

        let router = axum::Router::new()
            .route("/ws-1/posts/empty", put(|| async { StatusCode::NO_CONTENT }))
            .route(
                "/ws-1/posts/partial",
                put(|| async { Json(serde_json::json!({ "success": true })) }),
            );
        let mut config = config();
        config.base_url = serve(router).await;
        let platform = HttpSocialPlatform::new(config).unwrap();

        platform.update_post("empty", &draft()).await.unwrap();
        platform.update_post("partial", &draft()).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_error_keeps_status_and_payload() {
        use axum::{http::StatusCode, routing::put, Json};

        let router = axum::Router::new().route(
            "/ws-1/posts/gone",
            put(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({ "message": "date in the past" })),
                )
            }),
        );
        let mut config = config();
        config.base_url = serve(router).await;
        let platform = HttpSocialPlatform::new(config).unwrap();

        match platform.update_post("gone", &draft()).await.unwrap_err() {
            CoreError::ExternalError { service, status, payload } => {
                assert_eq!(service, "social");
                assert_eq!(status, Some(422));
                assert_eq!(payload["message"], "date in the past");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
