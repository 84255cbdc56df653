use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
const DEFAULT_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Body of POST and PUT. PUT replaces the whole record.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl PostInput {
    fn into_post(self, id: u64) -> Post {
        Post {
            id,
            title: self.title,
            body: self.body,
            due_date: self.due_date,
            time: self.time,
            completed: self.completed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    #[serde(rename = "_page")]
    pub page: Option<usize>,
    #[serde(rename = "_limit")]
    pub limit: Option<usize>,
}

#[derive(Debug)]
pub struct Posts {
    items: BTreeMap<u64, Post>,
    next_id: u64,
}

impl Default for Posts {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Posts {
    fn insert(&mut self, input: PostInput) -> Post {
        let post = input.into_post(self.next_id);
        self.next_id += 1;
        self.items.insert(post.id, post.clone());
        post
    }
}

pub type Db = Arc<RwLock<Posts>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

/// A server whose collection starts with `seed`, ids assigned from 1.
pub fn app_with(seed: Vec<PostInput>) -> Router {
    let mut posts = Posts::default();
    for input in seed {
        posts.insert(input);
    }
    let db: Db = Arc::new(RwLock::new(posts));
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post).put(update_post).delete(delete_post))
        .with_state(db)
}

/// `count` numbered sample posts, every third one completed.
pub fn sample_posts(count: usize) -> Vec<PostInput> {
    (1..=count)
        .map(|n| PostInput {
            title: format!("Sample todo {n}"),
            body: if n % 2 == 0 { format!("Notes for todo {n}") } else { String::new() },
            due_date: None,
            time: Some(format!("{:02}:{:02}", (n * 5) % 24, (n * 7) % 60)),
            completed: n % 3 == 0,
        })
        .collect()
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, seed: Vec<PostInput>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(seed)).await
}

fn matches_query(post: &Post, query: &str) -> bool {
    let query = query.to_lowercase();
    post.title.to_lowercase().contains(&query) || post.body.to_lowercase().contains(&query)
}

async fn list_posts(State(db): State<Db>, Query(params): Query<ListParams>) -> Response {
    let posts = db.read().await;
    let matching: Vec<Post> = posts
        .items
        .values()
        .filter(|p| params.q.as_deref().map_or(true, |q| matches_query(p, q)))
        .cloned()
        .collect();

    if params.page.is_none() && params.limit.is_none() {
        return Json(matching).into_response();
    }

    let total = matching.len();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let page = params.page.unwrap_or(1).max(1);
    let items: Vec<Post> = matching.into_iter().skip((page - 1).saturating_mul(limit)).take(limit).collect();
    debug!(page, limit, total, "paged list");
    ([(TOTAL_COUNT_HEADER, total.to_string())], Json(items)).into_response()
}

async fn create_post(State(db): State<Db>, Json(input): Json<PostInput>) -> (StatusCode, Json<Post>) {
    let post = db.write().await.insert(input);
    debug!(id = post.id, "post created");
    (StatusCode::CREATED, Json(post))
}

async fn get_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Post>, StatusCode> {
    let posts = db.read().await;
    posts.items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<PostInput>,
) -> Result<Json<Post>, StatusCode> {
    let mut posts = db.write().await;
    let slot = posts.items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    *slot = input.into_post(id);
    Ok(Json(slot.clone()))
}

async fn delete_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut posts = db.write().await;
    posts
        .items
        .remove(&id)
        .map(|_| Json(serde_json::json!({})))
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post {
            id: 1,
            title: "Test".to_string(),
            body: String::new(),
            due_date: None,
            time: Some("08:30".to_string()),
            completed: false,
        }
    }

    #[test]
    fn post_serializes_camel_case_and_skips_missing_schedule() {
        let json = serde_json::to_value(post()).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Test");
        assert_eq!(json["time"], "08:30");
        assert!(json.get("dueDate").is_none());
    }

    #[test]
    fn post_input_defaults_optional_fields() {
        let input: PostInput = serde_json::from_str(r#"{"title":"Only a title"}"#).unwrap();
        assert_eq!(input.body, "");
        assert!(input.due_date.is_none());
        assert!(!input.completed);
    }

    #[test]
    fn post_input_rejects_missing_title() {
        let result: Result<PostInput, _> = serde_json::from_str(r#"{"body":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn ids_increase_from_one() {
        let mut posts = Posts::default();
        let a = posts.insert(serde_json::from_str(r#"{"title":"a"}"#).unwrap());
        let b = posts.insert(serde_json::from_str(r#"{"title":"b"}"#).unwrap());
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[test]
    fn query_matches_title_or_body_case_insensitively() {
        let mut p = post();
        p.body = "Remember the MILK".into();
        assert!(matches_query(&p, "milk"));
        assert!(matches_query(&p, "test"));
        assert!(!matches_query(&p, "eggs"));
    }

    #[test]
    fn sample_posts_have_valid_times() {
        let seed = sample_posts(30);
        assert_eq!(seed.len(), 30);
        assert_eq!(seed.iter().filter(|p| p.completed).count(), 10);
        for p in &seed {
            let time = p.time.as_deref().unwrap();
            let (h, m) = time.split_once(':').unwrap();
            assert!(h.parse::<u32>().unwrap() < 24);
            assert!(m.parse::<u32>().unwrap() < 60);
        }
    }
}
