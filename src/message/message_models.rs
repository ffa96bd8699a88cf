use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A persisted message. Group-addressed messages keep the expanded member
/// list in `recipients` and the group they were sent to in `group_id`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub reply_to_id: Option<Uuid>,
    pub sender: String,
    pub recipients: Vec<String>,
    pub group_id: Option<String>,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A message ready to be stored; id and timestamp are assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub reply_to_id: Option<Uuid>,
    pub sender: String,
    pub recipients: Vec<String>,
    pub group_id: Option<String>,
    pub subject: String,
    pub body: String,
}

impl NewMessage {
    pub fn into_message(self, id: Uuid, created_at: DateTime<Utc>) -> Message {
        Message {
            id,
            reply_to_id: self.reply_to_id,
            sender: self.sender,
            recipients: self.recipients,
            group_id: self.group_id,
            subject: self.subject,
            body: self.body,
            created_at,
        }
    }
}

/// Addressee of a message as seen by clients: a single user or a group,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Recipient {
    #[serde(rename = "username")]
    User(String),
    #[serde(rename = "groupname")]
    Group(String),
}

/// Service input for a new message or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    pub re: Option<Uuid>,
    pub sender: String,
    pub recipient: Option<Recipient>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re: Option<Uuid>,
    pub sender: String,
    pub recipient: Recipient,
    pub subject: String,
    pub body: String,
    #[serde(rename = "sentAt")]
    pub sent_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        let recipient = match message.group_id {
            Some(group) => Recipient::Group(group),
            None => Recipient::User(message.recipients.into_iter().next().unwrap_or_default()),
        };

        Self {
            id: message.id,
            re: message.reply_to_id,
            sender: message.sender,
            recipient,
            subject: message.subject,
            body: message.body,
            sent_at: message.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
