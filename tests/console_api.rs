//! End-to-end tests of the HTTP client against an in-process fake of the
//! console API and of the object store's pre-signed POST endpoint.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use s3_console::{
    config::AppConfig,
    errors::ConsoleError,
    interfaces::{CredentialIssuer, ListingService, ObjectDeleter, ProgressFn},
    models::upload::{BatchOutcome, LocalFile, UploadTask},
    services::{
        browser::BrowserView,
        console_client::ConsoleClient,
        session_service::SessionService,
        upload_service::{UploadObserver, UploadOrchestrator},
    },
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use uuid::Uuid;

const TOKEN: &str = "t0ken";
const PAGE_SIZE: usize = 2;

#[derive(Default)]
struct FakeState {
    objects: BTreeMap<String, Vec<u8>>,
    rejected_keys: HashSet<String>,
    notices: Vec<Value>,
    field_order: Vec<Vec<String>>,
    fail_notify: bool,
    /// Keys the store answers with a bare 500 and no body.
    broken_keys: HashSet<String>,
    /// Keys whose upload credential points at `dead_store_url`.
    unreachable_keys: HashSet<String>,
    dead_store_url: String,
    /// Report `has_more` on the first page without a continuation token.
    truncate_listing: bool,
}

#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<FakeState>>,
    base: String,
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", TOKEN);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    prefix: String,
    continuation_token: Option<String>,
}

async fn list(
    State(app): State<AppState>,
    Path(bucket): Path<String>,
    Query(q): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = app.inner.lock().unwrap();
    let matching: Vec<(&String, &Vec<u8>)> = state
        .objects
        .iter()
        .filter(|(k, _)| k.starts_with(&q.prefix))
        .collect();
    let skip: usize = q
        .continuation_token
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    let page: Vec<Value> = matching
        .iter()
        .skip(skip)
        .take(PAGE_SIZE)
        .map(|(k, v)| {
            json!({
                "key": k,
                "size": v.len(),
                "last_modified": "2025-12-04T08:10:42",
                "etag": format!("{:x}", md5::compute(v)),
            })
        })
        .collect();
    let has_more = skip + PAGE_SIZE < matching.len();
    let next = (has_more && !state.truncate_listing).then(|| (skip + PAGE_SIZE).to_string());
    Json(json!({
        "objects": page,
        "prefix": q.prefix,
        "bucket_name": bucket,
        "has_more": has_more,
        "next_continuation_token": next,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct PresignRequest {
    bucket_name: String,
    object_key: String,
    operation: String,
}

async fn presign(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PresignRequest>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if req.object_key.starts_with("forbidden/") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": format!("No write permission for: {}", req.object_key)})),
        )
            .into_response();
    }
    let dead_store = {
        let state = app.inner.lock().unwrap();
        state
            .unreachable_keys
            .contains(&req.object_key)
            .then(|| state.dead_store_url.clone())
    };
    match req.operation.as_str() {
        "upload" => Json(json!({
            "url": dead_store.unwrap_or_else(|| format!("{}/store/{}", app.base, req.bucket_name)),
            "expires_in": 3600,
            "fields": {
                "key": req.object_key,
                "policy": "cG9saWN5",
                "x-amz-signature": "c2ln",
            },
        }))
        .into_response(),
        _ => Json(json!({
            "url": format!("{}/store/{}/{}", app.base, req.bucket_name, req.object_key),
            "expires_in": 3600,
        }))
        .into_response(),
    }
}

async fn store_post(State(app): State<AppState>, mut multipart: Multipart) -> Response {
    let mut names = Vec::new();
    let mut key = None;
    let mut body = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap();
        match name.as_str() {
            "key" => key = Some(String::from_utf8(data.to_vec()).unwrap()),
            "file" => body = Some(data.to_vec()),
            _ => {}
        }
        names.push(name);
    }

    let mut state = app.inner.lock().unwrap();
    state.field_order.push(names.clone());
    let (Some(key), Some(body)) = (key, body) else {
        return (StatusCode::BAD_REQUEST, "missing key or file").into_response();
    };
    if names.last().map(String::as_str) != Some("file") {
        return (StatusCode::BAD_REQUEST, "file must be the last field").into_response();
    }
    if state.rejected_keys.contains(&key) {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>AccessDenied</Code>\
                   <Message>Invalid according to Policy: Policy expired</Message></Error>";
        return (StatusCode::FORBIDDEN, xml).into_response();
    }
    if state.broken_keys.contains(&key) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let etag = format!("\"{:x}\"", md5::compute(&body));
    state.objects.insert(key, body);
    (StatusCode::NO_CONTENT, [(header::ETAG, etag)]).into_response()
}

async fn store_get(
    State(app): State<AppState>,
    Path((_bucket, key)): Path<(String, String)>,
) -> Response {
    match app.inner.lock().unwrap().objects.get(&key) {
        Some(bytes) => Bytes::from(bytes.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "<Error><Message>The specified key does not exist.</Message></Error>")
            .into_response(),
    }
}

async fn upload_complete(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(notice): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = app.inner.lock().unwrap();
    state.notices.push(notice);
    if state.fail_notify {
        return (StatusCode::INTERNAL_SERVER_ERROR, "audit db down").into_response();
    }
    Json(json!({"message": "Upload status recorded"})).into_response()
}

async fn delete_object(
    State(app): State<AppState>,
    Path((_bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match app.inner.lock().unwrap().objects.remove(&key) {
        Some(_) => Json(json!({"message": format!("Object {} deleted successfully", key)}))
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Object not found"})),
        )
            .into_response(),
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "correct horse" {
        Json(json!({"access_token": TOKEN, "token_type": "bearer"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect email or password"})),
        )
            .into_response()
    }
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 7,
        "email": "alice@example.com",
        "full_name": "Alice",
        "is_active": true,
        "is_admin": false,
        "must_change_password": false,
        "last_login": "2025-12-04T08:00:00Z",
    }))
    .into_response()
}

async fn grants(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([{
        "bucket_name": "media",
        "prefix": "team/",
        "can_read": true,
        "can_write": true,
        "can_delete": false,
        "can_list": true,
    }]))
    .into_response()
}

async fn spawn_fake(state: FakeState) -> (String, Arc<Mutex<FakeState>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let inner = Arc::new(Mutex::new(state));

    let app = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "version": "1.0.0"})) }))
        .route("/api/v1/s3/list/{bucket}", get(list))
        .route("/api/v1/s3/presigned-url", post(presign))
        .route("/api/v1/s3/upload-complete", post(upload_complete))
        .route("/api/v1/s3/object/{bucket}/{*key}", delete(delete_object))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/permissions/my-permissions", get(grants))
        .route("/store/{bucket}", post(store_post))
        .route("/store/{bucket}/{*key}", get(store_get))
        .with_state(AppState {
            inner: inner.clone(),
            base: base.clone(),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base, inner)
}

fn client(base: &str, token: Option<&str>) -> ConsoleClient {
    let cfg = AppConfig {
        server_url: base.to_string(),
        api_prefix: "/api/v1".into(),
        token: token.map(str::to_string),
        bucket: Some("media".into()),
        prefix: None,
        connect_timeout: Duration::from_secs(5),
        json: false,
    };
    ConsoleClient::new(&cfg).unwrap()
}

fn seeded(keys: &[&str]) -> FakeState {
    let mut state = FakeState::default();
    for key in keys {
        state
            .objects
            .insert(key.to_string(), format!("contents of {}", key).into_bytes());
    }
    state
}

#[derive(Default)]
struct RecordingObserver {
    percents: Mutex<Vec<u8>>,
    finished: Mutex<Vec<String>>,
}

impl UploadObserver for RecordingObserver {
    fn progress(&self, _task_id: Uuid, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }

    fn task_finished(&self, task: &UploadTask) {
        self.finished
            .lock()
            .unwrap()
            .push(format!("{} {}", task.destination_key, task.status));
    }
}

#[tokio::test]
async fn listing_follows_continuation_and_projects_folders() {
    let (base, _) = spawn_fake(seeded(&[
        "other/x.txt",
        "team/docs/a.pdf",
        "team/docs/sub/b.txt",
        "team/readme.md",
        "team/zeta/",
    ]))
    .await;
    let client = Arc::new(client(&base, Some(TOKEN)));

    // four keys under team/ arrive over two pages
    let raw = client.list_objects("media", "team/").await.unwrap();
    assert_eq!(raw.len(), 4);

    let mut view = BrowserView::new("media", "team/", client);
    view.refresh().await.unwrap();
    let names: Vec<(&str, bool)> = view
        .entries()
        .iter()
        .map(|e| (e.name.as_str(), e.is_folder))
        .collect();
    assert_eq!(
        names,
        [("docs", true), ("zeta", true), ("readme.md", false)]
    );

    view.enter_folder("docs").await.unwrap();
    assert_eq!(view.upload_destination(), "team/docs/");
    assert_eq!(view.folder_count(), 1);
    assert_eq!(view.entries()[1].key, "team/docs/a.pdf");
    assert_eq!(view.entries()[1].size, Some("contents of team/docs/a.pdf".len() as i64));
}

#[tokio::test]
async fn rejected_token_surfaces_as_unauthorized() {
    let (base, _) = spawn_fake(seeded(&["team/a.txt"])).await;
    let client = Arc::new(client(&base, Some("stale")));

    let mut view = BrowserView::new("media", "team/", client);
    let err = view.refresh().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(
        view.last_error(),
        Some("Your session has expired, please log in again")
    );
}

#[tokio::test]
async fn batch_upload_isolates_store_rejections() {
    let (base, fake) = spawn_fake(FakeState::default()).await;
    fake.lock()
        .unwrap()
        .rejected_keys
        .insert("team/blocked.txt".into());
    let client = Arc::new(client(&base, Some(TOKEN)));

    let dir = tempfile::tempdir().unwrap();
    let payload = vec![b'x'; 200_000];
    std::fs::write(dir.path().join("ok.bin"), &payload).unwrap();
    std::fs::write(dir.path().join("blocked.txt"), b"nope").unwrap();
    std::fs::write(dir.path().join("empty.txt"), b"").unwrap();

    let mut files = Vec::new();
    for name in ["ok.bin", "blocked.txt", "empty.txt"] {
        files.push(LocalFile::from_path(dir.path().join(name)).await.unwrap());
    }

    let mut orchestrator =
        UploadOrchestrator::new("media", "team/", client.clone(), client.clone(), client);
    orchestrator.add_files(files);
    let observer = Arc::new(RecordingObserver::default());
    let result = orchestrator.run(observer.clone()).await.unwrap();

    assert_eq!(result.outcome(), BatchOutcome::PartialSuccess);
    assert_eq!((result.succeeded, result.failed), (2, 1));
    assert_eq!(result.summary(), "Uploaded 2 file(s), but 1 failed.");
    assert_eq!(
        result.per_file[1].error.as_deref(),
        Some("Invalid according to Policy: Policy expired")
    );
    assert_eq!(
        *observer.finished.lock().unwrap(),
        [
            "team/ok.bin succeeded",
            "team/blocked.txt failed",
            "team/empty.txt succeeded"
        ]
    );

    // only the rejected file stays pending
    assert_eq!(orchestrator.tasks().len(), 1);
    assert_eq!(orchestrator.tasks()[0].destination_key, "team/blocked.txt");

    let percents = observer.percents.lock().unwrap().clone();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));

    let state = fake.lock().unwrap();
    assert_eq!(state.objects.get("team/ok.bin"), Some(&payload));
    assert_eq!(state.objects.get("team/empty.txt").map(Vec::len), Some(0));
    assert!(!state.objects.contains_key("team/blocked.txt"));
    for order in &state.field_order {
        assert_eq!(order, &["key", "policy", "x-amz-signature", "file"]);
    }

    let statuses: Vec<(&str, &str)> = state
        .notices
        .iter()
        .map(|n| {
            (
                n["object_key"].as_str().unwrap(),
                n["status"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        statuses,
        [
            ("team/ok.bin", "success"),
            ("team/blocked.txt", "failure"),
            ("team/empty.txt", "success"),
        ]
    );
    assert_eq!(
        state.notices[1]["error_message"],
        "Invalid according to Policy: Policy expired"
    );
}

/// A loopback URL nothing is listening on.
async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/store/media", addr)
}

async fn local_files(dir: &std::path::Path, names: &[&str]) -> Vec<LocalFile> {
    let mut files = Vec::new();
    for name in names {
        std::fs::write(dir.join(name), format!("data for {}", name)).unwrap();
        files.push(LocalFile::from_path(dir.join(name)).await.unwrap());
    }
    files
}

#[tokio::test]
async fn bare_store_error_reports_the_status_code() {
    let (base, fake) = spawn_fake(FakeState::default()).await;
    fake.lock().unwrap().broken_keys.insert("team/a.txt".into());
    let client = Arc::new(client(&base, Some(TOKEN)));

    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator =
        UploadOrchestrator::new("media", "team/", client.clone(), client.clone(), client);
    orchestrator.add_files(local_files(dir.path(), &["a.txt", "b.txt"]).await);
    let result = orchestrator
        .run(Arc::new(RecordingObserver::default()))
        .await
        .unwrap();

    assert_eq!(result.outcome(), BatchOutcome::PartialSuccess);
    assert_eq!(
        result.per_file[0].error.as_deref(),
        Some("Unexpected response (HTTP 500)")
    );
    assert_eq!(
        orchestrator.tasks()[0].error_detail.as_deref(),
        Some("Unexpected response (HTTP 500)")
    );
    let state = fake.lock().unwrap();
    assert!(state.objects.contains_key("team/b.txt"));
    assert_eq!(state.notices[0]["error_message"], "Unexpected response (HTTP 500)");
}

#[tokio::test]
async fn unreachable_store_fails_only_that_file() {
    let (base, fake) = spawn_fake(FakeState::default()).await;
    {
        let mut state = fake.lock().unwrap();
        state.unreachable_keys.insert("team/lost.txt".into());
        state.dead_store_url = closed_port_url().await;
    }
    let client = Arc::new(client(&base, Some(TOKEN)));

    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator =
        UploadOrchestrator::new("media", "team/", client.clone(), client.clone(), client);
    assert_eq!(orchestrator.destination_prefix(), "team/");
    orchestrator.add_files(local_files(dir.path(), &["lost.txt", "after.txt"]).await);
    let observer = Arc::new(RecordingObserver::default());
    let result = orchestrator.run(observer.clone()).await.unwrap();

    assert_eq!(result.outcome(), BatchOutcome::PartialSuccess);
    assert_eq!(
        *observer.finished.lock().unwrap(),
        ["team/lost.txt failed", "team/after.txt succeeded"]
    );

    let failed = &orchestrator.tasks()[0];
    assert_eq!(failed.destination_key, "team/lost.txt");
    let detail = failed.error_detail.as_deref().unwrap();
    assert!(detail.contains("error sending request"), "{}", detail);
    assert_eq!(result.per_file[0].error.as_deref(), Some(detail));

    let state = fake.lock().unwrap();
    assert!(state.objects.contains_key("team/after.txt"));
    assert_eq!(state.notices[0]["status"], "failure");
    assert_eq!(state.notices[0]["error_message"], detail);
}

#[tokio::test]
async fn truncated_listing_returns_the_partial_result() {
    let mut state = seeded(&["team/a.txt", "team/b.txt", "team/c.txt", "team/d.txt"]);
    state.truncate_listing = true;
    let (base, _) = spawn_fake(state).await;
    let client = Arc::new(client(&base, Some(TOKEN)));

    let raw = client.list_objects("media", "team/").await.unwrap();
    let keys: Vec<&str> = raw.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, ["team/a.txt", "team/b.txt"]);

    let mut view = BrowserView::new("media", "team/", client);
    view.refresh().await.unwrap();
    assert_eq!(view.file_count(), PAGE_SIZE);
    assert_eq!(view.last_error(), None);
}

#[tokio::test]
async fn audit_outage_does_not_fail_uploads() {
    let (base, fake) = spawn_fake(FakeState::default()).await;
    fake.lock().unwrap().fail_notify = true;
    let client = Arc::new(client(&base, Some(TOKEN)));

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();

    let mut orchestrator =
        UploadOrchestrator::new("media", "", client.clone(), client.clone(), client);
    orchestrator.add_files([LocalFile::from_path(dir.path().join("a.txt")).await.unwrap()]);
    let result = orchestrator
        .run(Arc::new(RecordingObserver::default()))
        .await
        .unwrap();

    assert_eq!(result.outcome(), BatchOutcome::Success);
    assert!(result.should_refresh_listing());
    assert!(orchestrator.tasks().is_empty());
    assert_eq!(fake.lock().unwrap().notices.len(), 1);
}

#[tokio::test]
async fn credential_denial_is_reported_per_file() {
    let (base, fake) = spawn_fake(FakeState::default()).await;
    let client = Arc::new(client(&base, Some(TOKEN)));

    let err = client
        .issue_upload_credential("media", "forbidden/x.txt")
        .await
        .unwrap_err();
    match err {
        ConsoleError::Credential { key, reason } => {
            assert_eq!(key, "forbidden/x.txt");
            assert_eq!(reason, "No write permission for: forbidden/x.txt");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("x.txt"), b"x").unwrap();
    let mut orchestrator =
        UploadOrchestrator::new("media", "forbidden/", client.clone(), client.clone(), client);
    orchestrator.add_files([LocalFile::from_path(dir.path().join("x.txt")).await.unwrap()]);
    let result = orchestrator
        .run(Arc::new(RecordingObserver::default()))
        .await
        .unwrap();

    assert_eq!(result.outcome(), BatchOutcome::Failure);
    assert_eq!(result.summary(), "Failed to upload all 1 file(s).");
    let state = fake.lock().unwrap();
    assert!(state.field_order.is_empty());
    assert_eq!(state.notices[0]["status"], "failure");
}

#[tokio::test]
async fn download_and_delete_round_trip() {
    let (base, fake) = spawn_fake(seeded(&["team/docs/a.pdf", "team/readme.md"])).await;
    let client = Arc::new(client(&base, Some(TOKEN)));

    let credential = client
        .issue_download_credential("media", "team/docs/a.pdf")
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.pdf");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let on_progress: ProgressFn = {
        let seen = seen.clone();
        Arc::new(move |sent, total| seen.lock().unwrap().push((sent, total)))
    };
    let written = client
        .download_to_file(&credential, &dest, on_progress)
        .await
        .unwrap();
    let expected = b"contents of team/docs/a.pdf";
    assert_eq!(written, expected.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), expected);
    assert_eq!(
        seen.lock().unwrap().last(),
        Some(&(expected.len() as u64, expected.len() as u64))
    );

    let mut view = BrowserView::new("media", "team/", client.clone());
    view.refresh().await.unwrap();
    assert_eq!(view.file_count(), 1);
    view.delete(client.as_ref(), "team/readme.md").await.unwrap();
    assert_eq!(view.file_count(), 0);
    assert!(!fake.lock().unwrap().objects.contains_key("team/readme.md"));

    let err = client
        .delete_object("media", "team/readme.md")
        .await
        .unwrap_err();
    match err {
        ConsoleError::Delete { reason, .. } => assert_eq!(reason, "Object not found"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn missing_download_leaves_no_partial_file() {
    let (base, _) = spawn_fake(FakeState::default()).await;
    let client = client(&base, Some(TOKEN));

    let credential = client
        .issue_download_credential("media", "team/gone.txt")
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("gone.txt");
    let err = client
        .download_to_file(&credential, &dest, Arc::new(|_, _| {}))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "The specified key does not exist.");
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn session_login_identity_grants_and_health() {
    let (base, _) = spawn_fake(FakeState::default()).await;

    let anonymous = Arc::new(client(&base, None));
    let mut session = SessionService::new(anonymous.clone());
    let wrong = session
        .login("alice@example.com", "guess")
        .await
        .unwrap_err();
    assert_eq!(wrong.user_message(), "Incorrect email or password");
    assert!(!wrong.is_unauthorized());

    let token = session
        .login("alice@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(token.token_type, "bearer");

    let authed = Arc::new(client(&base, None).with_token(token.access_token));
    let mut session = SessionService::new(authed.clone());
    let user = session.current_user().await.unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert!(!user.must_change_password);

    let grants = authed.my_grants().await.unwrap();
    assert_eq!(grants[0].bucket_name, "media");
    assert_eq!(grants[0].prefix, "team/");

    let health = anonymous.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version.as_deref(), Some("1.0.0"));
}
