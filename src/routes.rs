use crate::{
    message::{
        message_dto::{MessageCreatedResponse, SendMessageRequest},
        message_handlers,
        message_models::{MessageResponse, Recipient},
    },
    state::AppState,
};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::message::message_handlers::send_message,
        crate::message::message_handlers::send_reply,
        crate::message::message_handlers::get_message,
        crate::message::message_handlers::get_replies,
        crate::message::message_handlers::get_mailbox,
    ),
    components(
        schemas(
            SendMessageRequest,
            MessageCreatedResponse,
            MessageResponse,
            Recipient,
        )
    ),
    tags(
        (name = "messages", description = "Message store endpoints")
    )
)]
struct ApiDoc;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let message_routes = Router::new()
        .route("/", post(message_handlers::send_message))
        .route("/:msgid", get(message_handlers::get_message))
        .route(
            "/:msgid/replies",
            get(message_handlers::get_replies).post(message_handlers::send_reply),
        );

    let user_routes = Router::new().route("/:userid/mailbox", get(message_handlers::get_mailbox));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/messages", message_routes)
        .nest("/users", user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
