use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub handle: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub username: String,
    pub handle: String,
    pub title: String,
    pub begintime: String,
    pub endtime: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivitySummary {
    pub id: i64,
    pub username: String,
    pub handle: String,
    pub title: String,
    pub begintime: String,
    pub endtime: String,
    pub members: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Reply {
    pub id: i64,
    pub username: String,
    pub handle: String,
    pub content: String,
    pub created_at: String,
}

/// One participant's vote for one hour of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub activity_id: i64,
    pub user_handle: String,
    pub day: String,
    pub hour: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Slot {
    pub day: String,
    pub hour: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SlotCount {
    pub day: String,
    pub hour: u32,
    pub count: i64,
}

/// Who is looking at a page. Carried in the query string, never trusted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Viewer {
    pub username: Option<String>,
    pub handle: Option<String>,
    pub keyword: Option<String>,
}

impl Viewer {
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref().filter(|handle| !handle.is_empty())
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50))]
    pub handle: String,
    #[validate(length(min = 1, max = 50))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivityRequest {
    #[validate(length(min = 1, max = 50))]
    pub handle: String,
    #[validate(length(min = 1, max = 50))]
    pub title: String,
    #[validate(length(min = 1, max = 50))]
    pub begintime: String,
    #[validate(length(min = 1, max = 50))]
    pub endtime: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    #[validate(range(min = 1))]
    pub tweet_id: u32,
    #[validate(length(min = 1, max = 50))]
    pub user_handle: String,
}

impl MembershipRequest {
    pub fn activity_id(&self) -> i64 {
        i64::from(self.tweet_id)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeRequest {
    #[validate(range(min = 1))]
    pub tweet_id: u32,
    #[validate(length(min = 1, max = 50))]
    pub user_handle: String,
    #[validate(length(min = 1, max = 50))]
    pub day: String,
    #[validate(range(min = 0, max = 23))]
    pub hour: u32,
}

impl From<TimeRequest> for Vote {
    fn from(request: TimeRequest) -> Self {
        Self {
            activity_id: i64::from(request.tweet_id),
            user_handle: request.user_handle,
            day: request.day,
            hour: request.hour,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    #[validate(range(min = 1))]
    pub reply_to_tweet_id: u32,
    #[validate(length(min = 1, max = 50))]
    pub handle: String,
    #[validate(length(min = 1, max = 280))]
    pub content: String,
}

impl ReplyRequest {
    pub fn activity_id(&self) -> i64 {
        i64::from(self.reply_to_tweet_id)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeQuery {
    #[validate(range(min = 1))]
    pub tweet_id: u32,
    pub handle: Option<String>,
}

impl TimeQuery {
    pub fn activity_id(&self) -> i64 {
        i64::from(self.tweet_id)
    }
}

#[derive(Debug, Serialize)]
pub struct TimeResponse {
    pub activity_id: i64,
    pub member_count: i64,
    pub can_vote: bool,
    pub counts: Vec<SlotCount>,
    pub selected: Vec<Slot>,
    pub heatmap: crate::heatmap::Heatmap,
}
