//! In-memory JSON API used to exercise the network caller end to end.
//!
//! Payloads use `snake_case` keys and RFC 3339 timestamps, the wire
//! conventions the client decodes. Besides the notes resource there are a few
//! diagnostic routes:
//! - `/echo` (any method) reflects the method, query, content type and body.
//! - `/status/{code}` answers with that status and a small JSON body.
//! - `/delay/{ms}` answers after sleeping.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub is_pinned: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CreateNote {
    pub title: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub is_pinned: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub pinned: Option<bool>,
    pub limit: Option<usize>,
}

/// What `/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echoed {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Note>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_note)
                .put(replace_note)
                .patch(update_note)
                .delete(delete_note),
        )
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/delay/{ms}", get(delay))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_notes(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<Note>> {
    let notes = db.read().await;
    let mut listed: Vec<Note> = notes
        .values()
        .filter(|n| query.pinned.map_or(true, |p| n.is_pinned == p))
        .cloned()
        .collect();
    listed.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    if let Some(limit) = query.limit {
        listed.truncate(limit);
    }
    Json(listed)
}

async fn create_note(
    State(db): State<Db>,
    Json(input): Json<CreateNote>,
) -> (StatusCode, Json<Note>) {
    let note = Note {
        id: Uuid::new_v4(),
        title: input.title,
        is_pinned: input.is_pinned,
        tags: input.tags,
        created_at: Utc::now(),
        updated_at: None,
    };
    db.write().await.insert(note.id, note.clone());
    (StatusCode::CREATED, Json(note))
}

async fn get_note(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Note>, StatusCode> {
    let notes = db.read().await;
    notes.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn replace_note(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateNote>,
) -> Result<Json<Note>, StatusCode> {
    let mut notes = db.write().await;
    let note = notes.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    note.title = input.title;
    note.is_pinned = input.is_pinned;
    note.tags = input.tags;
    note.updated_at = Some(Utc::now());
    Ok(Json(note.clone()))
}

async fn update_note(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateNote>,
) -> Result<Json<Note>, StatusCode> {
    let mut notes = db.write().await;
    let note = notes.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        note.title = title;
    }
    if let Some(is_pinned) = input.is_pinned {
        note.is_pinned = is_pinned;
    }
    if let Some(tags) = input.tags {
        note.tags = tags;
    }
    note.updated_at = Some(Utc::now());
    Ok(Json(note.clone()))
}

/// Answers with the removed note so clients can decode the result.
async fn delete_note(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, StatusCode> {
    let mut notes = db.write().await;
    notes.remove(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echoed> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = (!body.is_empty()).then(|| {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    });
    Json(Echoed {
        method: method.to_string(),
        query,
        content_type,
        body,
    })
}

async fn status(Path(code): Path<u16>) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let body = json!({"id": code, "created_at": "2024-07-06T00:00:00Z"});
    (status, Json(body)).into_response()
}

async fn delay(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({"waited_ms": ms}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_serializes_with_snake_case_keys() {
        let note = Note {
            id: Uuid::nil(),
            title: "Test".to_string(),
            is_pinned: true,
            tags: vec!["a".to_string()],
            created_at: "2024-07-06T00:00:00Z".parse().unwrap(),
            updated_at: None,
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["is_pinned"], true);
        assert_eq!(json["created_at"], "2024-07-06T00:00:00Z");
        assert!(json["updated_at"].is_null());
    }

    #[test]
    fn create_note_defaults_optional_fields() {
        let input: CreateNote = serde_json::from_str(r#"{"title":"Only title"}"#).unwrap();
        assert_eq!(input.title, "Only title");
        assert!(!input.is_pinned);
        assert!(input.tags.is_empty());
    }

    #[test]
    fn create_note_rejects_missing_title() {
        let result: Result<CreateNote, _> = serde_json::from_str(r#"{"is_pinned":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_note_all_fields_optional() {
        let input: UpdateNote = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.is_pinned.is_none());
        assert!(input.tags.is_none());
    }
}
