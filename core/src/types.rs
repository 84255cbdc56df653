//! Domain records and wire DTOs.
//!
//! # Design
//! `Todo` is the client-side record the store owns. The remote resource is a
//! generic "posts" collection, so `Post` / `PostPayload` mirror that schema
//! (`title`, `body`, numeric `id`) and are converted at the adapter boundary.
//! The mock-server crate defines its own copies; integration tests catch
//! schema drift between the two.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of ids handed out to optimistic creates before the server answers.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// A todo record as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Time of day as "HH:MM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// True while the record only exists locally, waiting for a create to land.
    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

/// User input for a new todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<String>,
}

impl NewTodo {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Name and description as submitted from a form: surrounding whitespace
    /// removed, a blank description dropped.
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = trim_description(self.description);
        self
    }
}

fn trim_description(description: Option<String>) -> Option<String> {
    description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

/// Partial update. `None` leaves a field untouched; for the optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub time: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn time(mut self, time: Option<String>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == TodoPatch::default()
    }

    /// Same trimming as [`NewTodo::trimmed`]; a blank description clears it.
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.description = self.description.map(trim_description);
        self
    }

    /// Write the present fields into `todo`. Timestamps are the caller's job.
    pub fn apply_to(&self, todo: &mut Todo) {
        if let Some(name) = &self.name {
            todo.name = name.clone();
        }
        if let Some(description) = &self.description {
            todo.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = due_date;
        }
        if let Some(time) = &self.time {
            todo.time = time.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }

    /// A patch touching the same fields as `self`, carrying `original`'s values.
    pub fn revert_from(&self, original: &Todo) -> TodoPatch {
        TodoPatch {
            name: self.name.as_ref().map(|_| original.name.clone()),
            description: self.description.as_ref().map(|_| original.description.clone()),
            due_date: self.due_date.map(|_| original.due_date),
            time: self.time.as_ref().map(|_| original.time.clone()),
            completed: self.completed.map(|_| original.completed),
        }
    }
}

/// A record of the remote posts resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Convert to the client shape. Missing timestamps become `now`.
    pub fn into_todo(self, now: DateTime<Utc>) -> Todo {
        let created_at = self.created_at.unwrap_or(now);
        let updated_at = self.updated_at.unwrap_or(now).max(created_at);
        Todo {
            id: self.id.to_string(),
            name: self.title,
            description: Some(self.body).filter(|b| !b.is_empty()),
            due_date: self.due_date,
            time: self.time,
            completed: self.completed,
            created_at,
            updated_at,
        }
    }
}

/// Request body for POST and PUT on the posts resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl From<&Todo> for PostPayload {
    fn from(todo: &Todo) -> Self {
        Self {
            title: todo.name.clone(),
            body: todo.description.clone().unwrap_or_default(),
            due_date: todo.due_date,
            time: todo.time.clone(),
            completed: todo.completed,
        }
    }
}

impl From<&NewTodo> for PostPayload {
    fn from(input: &NewTodo) -> Self {
        Self {
            title: input.name.clone(),
            body: input.description.clone().unwrap_or_default(),
            due_date: input.due_date,
            time: input.time.clone(),
            completed: false,
        }
    }
}

/// One page of the remote collection plus the paging metadata derived from
/// the `x-total-count` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, h, 0, 0).unwrap()
    }

    fn sample() -> Todo {
        Todo {
            id: "1".to_string(),
            name: "Buy milk".to_string(),
            description: Some("two litres".to_string()),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            time: Some("18:00".to_string()),
            completed: false,
            created_at: ts(10),
            updated_at: ts(10),
        }
    }

    #[test]
    fn todo_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["name"], "Buy milk");
        assert_eq!(json["dueDate"], "2024-01-15");
        assert_eq!(json["createdAt"], "2024-01-10T10:00:00Z");
        assert!(json.get("due_date").is_none());
    }

    #[test]
    fn todo_omits_empty_optionals() {
        let mut todo = sample();
        todo.description = None;
        todo.due_date = None;
        todo.time = None;
        let json = serde_json::to_value(&todo).unwrap();
        assert!(json.get("description").is_none());
        assert!(json.get("dueDate").is_none());
        assert!(json.get("time").is_none());
    }

    #[test]
    fn patch_preserves_absent_fields() {
        let mut todo = sample();
        TodoPatch::default().name("Buy oat milk").apply_to(&mut todo);
        assert_eq!(todo.name, "Buy oat milk");
        assert_eq!(todo.description.as_deref(), Some("two litres"));
        assert_eq!(todo.time.as_deref(), Some("18:00"));
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let mut todo = sample();
        TodoPatch::default().due_date(None).time(None).apply_to(&mut todo);
        assert!(todo.due_date.is_none());
        assert!(todo.time.is_none());
        assert!(todo.description.is_some());
    }

    #[test]
    fn revert_patch_touches_only_patched_fields() {
        let original = sample();
        let patch = TodoPatch::default().name("Other").completed(true);
        let revert = patch.revert_from(&original);
        assert_eq!(revert.name.as_deref(), Some("Buy milk"));
        assert_eq!(revert.completed, Some(false));
        assert!(revert.description.is_none());
        assert!(revert.due_date.is_none());
    }

    #[test]
    fn post_maps_title_and_body() {
        let post: Post = serde_json::from_str(
            r#"{"userId":1,"id":7,"title":"Walk dog","body":"around the block"}"#,
        )
        .unwrap();
        let todo = post.into_todo(ts(12));
        assert_eq!(todo.id, "7");
        assert_eq!(todo.name, "Walk dog");
        assert_eq!(todo.description.as_deref(), Some("around the block"));
        assert!(!todo.completed);
        assert_eq!(todo.created_at, ts(12));
        assert_eq!(todo.updated_at, ts(12));
    }

    #[test]
    fn post_with_empty_body_has_no_description() {
        let post: Post = serde_json::from_str(r#"{"id":1,"title":"x","body":""}"#).unwrap();
        assert!(post.into_todo(ts(1)).description.is_none());
    }

    #[test]
    fn post_never_yields_updated_before_created() {
        let post = Post {
            id: 1,
            title: "x".into(),
            body: String::new(),
            due_date: None,
            time: None,
            completed: false,
            created_at: Some(ts(11)),
            updated_at: None,
        };
        let todo = post.into_todo(ts(9));
        assert_eq!(todo.created_at, ts(11));
        assert_eq!(todo.updated_at, ts(11));
    }

    #[test]
    fn payload_from_todo_skips_missing_schedule() {
        let mut todo = sample();
        todo.due_date = None;
        todo.time = None;
        let json = serde_json::to_value(PostPayload::from(&todo)).unwrap();
        assert_eq!(json["title"], "Buy milk");
        assert_eq!(json["body"], "two litres");
        assert!(json.get("dueDate").is_none());
        assert!(json.get("time").is_none());
    }

    #[test]
    fn payload_from_new_todo_is_not_completed() {
        let input = NewTodo::named("Write tests").with_time("09:30");
        let payload = PostPayload::from(&input);
        assert_eq!(payload.title, "Write tests");
        assert_eq!(payload.body, "");
        assert_eq!(payload.time.as_deref(), Some("09:30"));
        assert!(!payload.completed);
    }
}
