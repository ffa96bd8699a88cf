#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use msgstore::{
    directory::HttpDirectoryClient,
    message::{InMemoryMessageRepository, MessageService},
    routes::create_router,
    state::{AppState, Config, StorageBackend},
};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Clone)]
struct Directory {
    users: Arc<Vec<String>>,
    groups: Arc<HashMap<String, Vec<String>>>,
}

async fn get_user(State(dir): State<Directory>, Path(id): Path<String>) -> impl IntoResponse {
    if dir.users.contains(&id) {
        (StatusCode::OK, Json(json!({ "id": id }))).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn get_group(State(dir): State<Directory>, Path(id): Path<String>) -> impl IntoResponse {
    match dir.groups.get(&id) {
        Some(members) => {
            (StatusCode::OK, Json(json!({ "groupname": id, "usernames": members }))).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn broken() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

/// Starts a stand-in user-admin service with users alice, tester, user1, user2
/// and group tstgroup = [user1, user2]. `/broken/...` always answers 503.
pub async fn spawn_user_service() -> SocketAddr {
    let directory = Directory {
        users: Arc::new(
            ["alice", "tester", "user1", "user2"]
                .iter()
                .map(|u| u.to_string())
                .collect(),
        ),
        groups: Arc::new(HashMap::from([(
            "tstgroup".to_string(),
            vec!["user1".to_string(), "user2".to_string()],
        )])),
    };

    let app = Router::new()
        .route("/users/:id", get(get_user))
        .route("/groups/:id", get(get_group))
        .route("/broken/users/:id", get(broken))
        .route("/broken/groups/:id", get(broken))
        .with_state(directory);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn app() -> Router {
    let addr = spawn_user_service().await;
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        user_service_url: format!("http://{}", addr),
        storage_backend: StorageBackend::Memory,
        database_url: None,
        database_max_connections: 1,
    };

    let service = MessageService::new(
        Arc::new(InMemoryMessageRepository::new()),
        Arc::new(HttpDirectoryClient::new(config.user_service_url.clone())),
    );

    create_router(AppState {
        config: Arc::new(config),
        message_service: service,
    })
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
