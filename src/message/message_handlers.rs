use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    message::{
        message_dto::{MessageCreatedResponse, SendMessageRequest},
        message_models::Recipient,
    },
    middleware::AppJson,
    state::AppState,
};

/// Send a message to a user or a group
#[utoipa::path(
    post,
    path = "/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageCreatedResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Sender, recipient or group not found")
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    match &payload.recipient {
        Some(Recipient::User(name)) | Some(Recipient::Group(name)) if !name.is_empty() => {}
        _ => {
            return Err(AppError::BadRequest(
                "a username or groupname recipient is required".to_string(),
            ))
        }
    }

    let id = state
        .message_service
        .store_message(payload.into_input(None))
        .await?;

    Ok((StatusCode::CREATED, Json(MessageCreatedResponse { id })))
}

/// Reply to a message; recipients are derived from the original
#[utoipa::path(
    post,
    path = "/messages/{msgid}/replies",
    tag = "messages",
    params(
        ("msgid" = Uuid, Path, description = "Id of the message being replied to")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Reply stored", body = MessageCreatedResponse),
        (status = 400, description = "Invalid input or recipient supplied"),
        (status = 404, description = "Sender or original message not found")
    )
)]
pub async fn send_reply(
    State(state): State<AppState>,
    Path(msgid): Path<Uuid>,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    if payload.recipient.is_some() {
        return Err(AppError::BadRequest(
            "replies must not name a recipient".to_string(),
        ));
    }

    let id = state
        .message_service
        .store_message(payload.into_input(Some(msgid)))
        .await?;

    Ok((StatusCode::CREATED, Json(MessageCreatedResponse { id })))
}

/// Get a message by id
#[utoipa::path(
    get,
    path = "/messages/{msgid}",
    tag = "messages",
    params(
        ("msgid" = Uuid, Path, description = "Message id")
    ),
    responses(
        (status = 200, description = "Message", body = MessageResponse),
        (status = 404, description = "Message not found")
    )
)]
pub async fn get_message(
    State(state): State<AppState>,
    Path(msgid): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let message = state.message_service.get_message(msgid).await?;

    Ok((StatusCode::OK, Json(message)))
}

/// Get the replies to a message
#[utoipa::path(
    get,
    path = "/messages/{msgid}/replies",
    tag = "messages",
    params(
        ("msgid" = Uuid, Path, description = "Id of the original message")
    ),
    responses(
        (status = 200, description = "Replies in the order they were stored", body = Vec<MessageResponse>),
        (status = 404, description = "Message not found")
    )
)]
pub async fn get_replies(
    State(state): State<AppState>,
    Path(msgid): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let replies = state.message_service.get_replies(msgid).await?;

    Ok((StatusCode::OK, Json(replies)))
}

/// Get every message addressed to a user
#[utoipa::path(
    get,
    path = "/users/{userid}/mailbox",
    tag = "messages",
    params(
        ("userid" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Messages addressed to the user", body = Vec<MessageResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_mailbox(
    State(state): State<AppState>,
    Path(userid): Path<String>,
) -> Result<impl IntoResponse> {
    let messages = state.message_service.get_messages(&userid).await?;

    Ok((StatusCode::OK, Json(messages)))
}
