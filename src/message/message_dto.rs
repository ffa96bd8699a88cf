use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::message_models::{MessageInput, Recipient};

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    pub sender: String,
    pub recipient: Option<Recipient>,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub body: String,
}

impl SendMessageRequest {
    pub fn into_input(self, re: Option<Uuid>) -> MessageInput {
        MessageInput {
            re,
            sender: self.sender,
            recipient: self.recipient,
            subject: self.subject,
            body: self.body,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageCreatedResponse {
    pub id: Uuid,
}
