use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echoed, Note};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- list ---

#[tokio::test]
async fn list_notes_empty() {
    let resp = app().oneshot(empty_request("GET", "/notes")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let notes: Vec<Note> = body_json(resp).await;
    assert!(notes.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_note_returns_201_with_snake_case_body() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/notes",
            r#"{"title":"Buy milk","is_pinned":true,"tags":["home"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["title"], "Buy milk");
    assert_eq!(body["is_pinned"], true);
    assert_eq!(body["tags"][0], "home");
    assert!(body["created_at"].is_string());
    assert!(body["updated_at"].is_null());
}

#[tokio::test]
async fn create_note_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/notes", r#"{"not_title":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get / update / delete on a missing note ---

#[tokio::test]
async fn missing_note_is_404_for_every_method() {
    let uri = "/notes/00000000-0000-0000-0000-000000000000";
    for method in ["GET", "PUT", "PATCH", "DELETE"] {
        let resp = app()
            .oneshot(json_request(method, uri, r#"{"title":"Nope"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn get_note_bad_uuid_returns_400() {
    let resp = app()
        .oneshot(empty_request("GET", "/notes/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- diagnostics ---

#[tokio::test]
async fn echo_reflects_method_query_and_body() {
    let resp = app()
        .oneshot(json_request("PATCH", "/echo?page=2&q=a%20b", r#"{"x":[1,2]}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: Echoed = body_json(resp).await;
    assert_eq!(echoed.method, "PATCH");
    assert_eq!(echoed.query["page"], "2");
    assert_eq!(echoed.query["q"], "a b");
    assert_eq!(echoed.content_type.as_deref(), Some("application/json"));
    assert_eq!(echoed.body, Some(serde_json::json!({"x": [1, 2]})));
}

#[tokio::test]
async fn echo_without_body_reports_none() {
    let resp = app().oneshot(empty_request("GET", "/echo")).await.unwrap();

    let echoed: Echoed = body_json(resp).await;
    assert_eq!(echoed.method, "GET");
    assert!(echoed.query.is_empty());
    assert!(echoed.body.is_none());
}

#[tokio::test]
async fn status_route_answers_with_requested_code() {
    let resp = app()
        .oneshot(empty_request("GET", "/status/503"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["id"], 503);
}

#[tokio::test]
async fn status_route_rejects_impossible_codes() {
    let resp = app()
        .oneshot(empty_request("GET", "/status/1000"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn delay_route_reports_wait() {
    let resp = app().oneshot(empty_request("GET", "/delay/5")).await.unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["waited_ms"], 5);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/notes", r#"{"title":"Walk dog"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Note = body_json(resp).await;
    assert_eq!(created.title, "Walk dog");
    assert!(!created.is_pinned);
    let id = created.id;

    // a second, pinned note
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/notes",
            r#"{"title":"Pay rent","is_pinned":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // list filtered by the pinned flag
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/notes?pinned=true"))
        .await
        .unwrap();
    let pinned: Vec<Note> = body_json(resp).await;
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0].title, "Pay rent");

    // list with a limit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/notes?limit=1"))
        .await
        .unwrap();
    let limited: Vec<Note> = body_json(resp).await;
    assert_eq!(limited.len(), 1);

    // patch: partial: only is_pinned
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            &format!("/notes/{id}"),
            r#"{"is_pinned":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Note = body_json(resp).await;
    assert_eq!(updated.title, "Walk dog"); // unchanged
    assert!(updated.is_pinned);
    assert!(updated.updated_at.is_some());

    // put: full replacement resets omitted fields
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/notes/{id}"),
            r#"{"title":"Walk cat"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let replaced: Note = body_json(resp).await;
    assert_eq!(replaced.title, "Walk cat");
    assert!(!replaced.is_pinned);

    // delete answers with the removed note
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/notes/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Note = body_json(resp).await;
    assert_eq!(deleted.id, id);

    // get after delete: 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/notes/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
