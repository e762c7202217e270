#![allow(dead_code)]

use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use base64::Engine;
use projello_client::config::ApiConfig;
use projello_client::storage::{KeyValueStore, MemoryStore};
use projello_client::Client;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("projello_client=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

pub const USER_EMAIL: &str = "u@x.com";
pub const USER_PASSWORD: &str = "pw";

/// JWT-shaped token with an `exp` claim; the signature is never checked.
pub fn jwt(subject: &str, exp: i64) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = engine.encode(json!({ "sub": subject, "exp": exp }).to_string());
    format!("{header}.{payload}.sig")
}

/// Scriptable state of the fake Projello backend.
#[derive(Debug)]
pub struct Backend {
    pub access_token: Mutex<String>,
    pub refresh_token: Mutex<String>,
    pub password: Mutex<String>,
    generation: AtomicU64,
    calls: Mutex<HashMap<String, usize>>,
    forced_unauthorized: Mutex<HashMap<String, usize>>,
    pub refresh_fails: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    pub move_fails: AtomicBool,
    pub notifies: Mutex<Vec<Value>>,
    pub last_body: Mutex<HashMap<String, Value>>,
    pub last_query: Mutex<HashMap<String, String>>,
}

impl Backend {
    fn new() -> Self {
        Self {
            access_token: Mutex::new(jwt("u1", 4_102_444_800)),
            refresh_token: Mutex::new("refresh-0".to_string()),
            password: Mutex::new(USER_PASSWORD.to_string()),
            generation: AtomicU64::new(0),
            calls: Mutex::new(HashMap::new()),
            forced_unauthorized: Mutex::new(HashMap::new()),
            refresh_fails: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            move_fails: AtomicBool::new(false),
            notifies: Mutex::new(vec![
                json!({ "_id": "n1", "message": "Added to Website", "type": "informazione", "createdAt": "2025-03-01T10:00:00Z" }),
                json!({ "_id": "n2", "message": "Deadline tomorrow", "type": "scadenza" }),
                json!({ "id": 3, "content": "Weekly summary", "type": "digest" }),
            ]),
            last_body: Mutex::new(HashMap::new()),
            last_query: Mutex::new(HashMap::new()),
        }
    }

    /// Calls seen for a route, keyed as `"METHOD /matched/{path}"`.
    pub fn calls(&self, route: &str) -> usize {
        self.calls.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    /// Invalidates the current access token; the refresh token stays valid.
    pub fn expire_access_token(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.access_token.lock().unwrap() = jwt(&format!("u1-{generation}"), 4_102_444_800);
    }

    /// Answers the next `times` calls of `route` with 401 whatever the token.
    pub fn force_unauthorized(&self, route: &str, times: usize) {
        self.forced_unauthorized.lock().unwrap().insert(route.to_string(), times);
    }

    pub fn body(&self, route: &str) -> Option<Value> {
        self.last_body.lock().unwrap().get(route).cloned()
    }

    pub fn query(&self, route: &str) -> Option<String> {
        self.last_query.lock().unwrap().get(route).cloned()
    }

    fn rotate(&self) -> (String, String) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let access = jwt(&format!("u1-{generation}"), 4_102_444_800);
        let refresh = format!("refresh-{generation}");
        *self.access_token.lock().unwrap() = access.clone();
        *self.refresh_token.lock().unwrap() = refresh.clone();
        (access, refresh)
    }

    fn user(&self) -> Value {
        json!({
            "id": 1,
            "email": USER_EMAIL,
            "username": "ux",
            "firstName": "Uma",
            "lastName": "Xu",
            "notifies": ["n1", { "_id": "n2", "message": "Deadline tomorrow", "type": "scadenza" }]
        })
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get("authorization")?.to_str().ok()?.strip_prefix("Bearer ")
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Token expired" }))).into_response()
}

/// Counts calls per route and enforces the bearer token on everything but `/auth` and registration.
async fn gatekeeper(State(backend): State<Arc<Backend>>, request: Request, next: Next) -> Response {
    let route = format!(
        "{} {}",
        request.method(),
        request.extensions().get::<MatchedPath>().map_or("?", MatchedPath::as_str)
    );
    *backend.calls.lock().unwrap().entry(route.clone()).or_default() += 1;

    if route.contains("/auth/") || route == "POST /user/register" {
        return next.run(request).await;
    }

    {
        let mut forced = backend.forced_unauthorized.lock().unwrap();
        if let Some(remaining) = forced.get_mut(&route).filter(|n| **n > 0) {
            *remaining -= 1;
            return unauthorized();
        }
    }

    let valid = backend.access_token.lock().unwrap().clone();
    if bearer(request.headers()) != Some(valid.as_str()) {
        return unauthorized();
    }
    next.run(request).await
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if body["email"].as_str().is_none_or(str::is_empty) {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "Email is required" }))).into_response();
    }
    let password = backend.password.lock().unwrap().clone();
    if body["email"] != USER_EMAIL || body["password"] != password.as_str() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" }))).into_response();
    }
    let (access, refresh) = backend.rotate();
    Json(json!({ "accessToken": access, "refreshToken": refresh, "userResponse": backend.user() })).into_response()
}

async fn refresh(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let delay = backend.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let expected = backend.refresh_token.lock().unwrap().clone();
    if backend.refresh_fails.load(Ordering::SeqCst) || bearer(&headers) != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid refresh token" }))).into_response();
    }
    let (access, refresh) = backend.rotate();
    Json(json!({ "accessToken": access, "refreshToken": refresh, "userResponse": backend.user() })).into_response()
}

async fn register(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.last_body.lock().unwrap().insert("POST /user/register".into(), body.clone());
    if body["email"] == USER_EMAIL {
        return (StatusCode::CONFLICT, Json(json!({ "error": "Email already registered" }))).into_response();
    }
    if body["username"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "username is required" }))).into_response();
    }
    StatusCode::OK.into_response()
}

async fn edit_user(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.last_body.lock().unwrap().insert("PUT /user".into(), body);
    "User updated".into_response()
}

async fn change_password(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    let mut password = backend.password.lock().unwrap();
    if body["oldPassword"] != password.as_str() {
        return (StatusCode::BAD_REQUEST, "Old password is incorrect").into_response();
    }
    *password = body["newPassword"].as_str().unwrap_or_default().to_string();
    "Password updated".into_response()
}

fn project_json() -> Value {
    json!({
        "_id": "p1",
        "title": "Website",
        "description": "Company site relaunch",
        "creator": { "_id": "u1", "email": USER_EMAIL, "firstName": "Uma", "lastName": "Xu" },
        "collaborators": [{ "id": "u2", "email": "bo@x.com" }],
        "created_at": "2025-01-10T09:00:00",
        "updatedAt": "2025-02-01T12:30:00Z"
    })
}

async fn list_projects() -> Json<Value> {
    Json(json!([project_json()]))
}

async fn get_project(Path(id): Path<String>) -> Response {
    if id == "p1" {
        Json(project_json()).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "Project not found" }))).into_response()
    }
}

async fn create_project(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.last_body.lock().unwrap().insert("POST /project".into(), body.clone());
    if body["title"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "title is required" }))).into_response();
    }
    Json(json!({ "id": 2, "title": body["title"], "description": body["description"] })).into_response()
}

async fn update_project(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    let mut project = project_json();
    project["_id"] = json!(id);
    if let Some(title) = body.get("title") {
        project["title"] = title.clone();
    }
    Json(project)
}

async fn list_phases(Path(project_id): Path<String>) -> Json<Value> {
    Json(json!([
        { "id": 1, "title": "To do", "projectId": project_id },
        { "_id": "2", "title": "Doing", "wipLimit": 3 },
        { "_id": "3", "title": "Done", "project_id": project_id, "is_done": true }
    ]))
}

async fn create_phase(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Json<Value> {
    backend.last_body.lock().unwrap().insert("POST /phase".into(), body.clone());
    Json(json!({ "_id": "4", "title": body["title"], "projectId": body["projectId"] }))
}

async fn rename_phase(State(backend): State<Arc<Backend>>, Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    backend.last_body.lock().unwrap().insert("PUT /phase/{id}".into(), body.clone());
    Json(json!({ "_id": id, "title": body }))
}

fn tasks_json() -> Value {
    json!([
        { "_id": "t1", "title": "Wireframes", "phase_id": "1", "position": 0, "priority": "high",
          "assignees": ["u1"], "expiration_date": "2025-12-15" },
        { "id": "t2", "title": "Copy", "phaseId": 1, "position": 1,
          "assignees": [{ "id": "u2" }], "expirationDate": "2025-12-20T00:00:00" },
        { "id": 3, "title": "Logo", "phase-id": "2", "position": 0, "priority": "LOW" },
        { "_id": "t4", "title": "Hosting", "phase": { "_id": "3" }, "attachments": [{ "name": "plan.pdf" }] }
    ])
}

async fn list_tasks(State(backend): State<Arc<Backend>>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    backend.last_query.lock().unwrap().insert("GET /task".into(), pairs.join("&"));
    Json(tasks_json())
}

async fn get_task(Path(id): Path<String>) -> Response {
    let tasks = tasks_json();
    let found = tasks
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t.get("_id").or_else(|| t.get("id")).map(|v| v.to_string().trim_matches('"').to_string()) == Some(id.clone()))
        .cloned();
    match found {
        Some(task) => Json(task).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "Task not found" }))).into_response(),
    }
}

async fn create_task(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Json<Value> {
    backend.last_body.lock().unwrap().insert("POST /task".into(), body.clone());
    let mut task = body;
    task["_id"] = json!("t9");
    Json(task)
}

async fn update_task(State(backend): State<Arc<Backend>>, Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    backend.last_body.lock().unwrap().insert("PUT /task/{id}".into(), body.clone());
    let mut task = body;
    task["_id"] = json!(id);
    Json(task)
}

async fn move_task(State(backend): State<Arc<Backend>>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    backend.last_body.lock().unwrap().insert("PATCH /task/{id}/move".into(), body.clone());
    if backend.move_fails.load(Ordering::SeqCst) {
        return (StatusCode::CONFLICT, Json(json!({ "error": "Phase is at its WIP limit" }))).into_response();
    }
    Json(json!({ "_id": id, "title": "Moved", "phase_id": body["phase_id"], "position": body["position"] })).into_response()
}

async fn list_notifies(State(backend): State<Arc<Backend>>) -> Json<Value> {
    Json(Value::Array(backend.notifies.lock().unwrap().clone()))
}

async fn delete_notify(State(backend): State<Arc<Backend>>, Path(id): Path<String>) -> StatusCode {
    backend
        .notifies
        .lock()
        .unwrap()
        .retain(|n| n.get("_id").or_else(|| n.get("id")).map(|v| v.to_string().trim_matches('"').to_string()) != Some(id.clone()));
    StatusCode::NO_CONTENT
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/user/register", post(register))
        .route("/user", put(edit_user))
        .route("/user/change-password", put(change_password))
        .route("/project", get(list_projects).post(create_project))
        .route("/project/{id}", get(get_project).put(update_project).delete(no_content))
        .route("/phase", post(create_phase))
        .route("/phase/{id}", get(list_phases).put(rename_phase).delete(no_content))
        .route("/task", get(list_tasks).post(create_task))
        .route("/task/{id}", get(get_task).put(update_task).delete(no_content))
        .route("/task/{id}/move", patch(move_task))
        .route("/notify", get(list_notifies))
        .route("/notify/{id}", axum::routing::delete(delete_notify))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&backend), gatekeeper))
        .with_state(backend)
}

/// A fake backend on an ephemeral port plus a client pointed at it.
pub struct TestApp {
    pub server_url: String,
    pub backend: Arc<Backend>,
    pub store: Arc<MemoryStore>,
    pub client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        setup_tracing();

        let backend = Arc::new(Backend::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let app = router(Arc::clone(&backend));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let store = Arc::new(MemoryStore::new());
        let client = Self::client_for(&server_url, store.clone());
        Self { server_url, backend, store, client }
    }

    /// Spawns and logs in with the valid credentials.
    pub async fn logged_in() -> Self {
        let app = Self::spawn().await;
        app.client.session.login(USER_EMAIL, USER_PASSWORD).await.unwrap();
        app
    }

    pub fn client_for(server_url: &str, store: Arc<dyn KeyValueStore>) -> Client {
        let config = ApiConfig { api_url: server_url.to_string(), request_timeout_secs: 5 };
        Client::with_store(&config, store).unwrap()
    }
}
