use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Media identifier issued by the social platform. Depending on the endpoint it comes back as a
/// number or a string; both forms are passed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaId::Number(n) => write!(f, "{}", n),
            MediaId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Union of media lists, first occurrence wins.
pub fn merge_media_ids(existing: &[MediaId], added: &[MediaId]) -> Vec<MediaId> {
    let mut merged: Vec<MediaId> = Vec::with_capacity(existing.len() + added.len());
    for id in existing.iter().chain(added) {
        if !merged.contains(id) {
            merged.push(id.clone());
        }
    }
    merged
}

/// Lifecycle of a travel deal. Deleted deals are removed rather than kept in a terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    Drafted,
    Scheduled,
    Rescheduled,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Drafted => "DRAFTED",
            DealStatus::Scheduled => "SCHEDULED",
            DealStatus::Rescheduled => "RESCHEDULED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFTED" => Some(DealStatus::Drafted),
            "SCHEDULED" => Some(DealStatus::Scheduled),
            "RESCHEDULED" => Some(DealStatus::Rescheduled),
            _ => None,
        }
    }
}

/// Whether a live post exists on the social platform. At most one per deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleState {
    Unscheduled,
    Scheduled {
        external_post_id: String,
        scheduled_at: NaiveDateTime,
    },
}

/// Persisted travel deal: the rendered post and its scheduling metadata, bound to a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelDealRecord {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub resort_summary: String,
    pub hashtags: String,
    pub post_text: String,
    pub media_ids: Vec<MediaId>,
    pub schedule: ScheduleState,
    pub status: DealStatus,
    /// Copy was regenerated after the live post was last written. The next reschedule sends
    /// `post_text` instead of reading the platform's body back.
    #[serde(default)]
    pub copy_pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TravelDealRecord {
    pub fn external_post_id(&self) -> Option<&str> {
        match &self.schedule {
            ScheduleState::Scheduled { external_post_id, .. } => Some(external_post_id),
            ScheduleState::Unscheduled => None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.external_post_id().is_some()
    }
}
