use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::directory::DirectoryClient;
use crate::error::{AppError, Result};
use crate::message::message_models::{MessageInput, MessageResponse, NewMessage, Recipient};
use crate::message::message_repository::MessageRepository;

#[derive(Clone)]
pub struct MessageService {
    repo: Arc<dyn MessageRepository>,
    directory: Arc<dyn DirectoryClient>,
}

impl MessageService {
    pub fn new(repo: Arc<dyn MessageRepository>, directory: Arc<dyn DirectoryClient>) -> Self {
        Self { repo, directory }
    }

    /// Stores a top-level message or, when `input.re` is set, a reply whose
    /// recipients are derived from the original message.
    pub async fn store_message(&self, input: MessageInput) -> Result<Uuid> {
        self.ensure_user(&input.sender).await?;

        if let Some(original_id) = input.re {
            return self.store_reply(original_id, input).await;
        }

        let (recipients, group_id) = match input.recipient {
            Some(Recipient::Group(group)) => {
                let members = self.directory.group_members(&group).await?;
                if members.is_empty() {
                    return Err(AppError::BadRequest(format!("group {} has no members", group)));
                }
                (members, Some(group))
            }
            Some(Recipient::User(user)) => {
                self.ensure_user(&user).await?;
                (vec![user], None)
            }
            None => return Err(AppError::BadRequest("recipient is required".to_string())),
        };

        let id = self
            .repo
            .store_message(NewMessage {
                reply_to_id: None,
                sender: input.sender,
                recipients,
                group_id,
                subject: input.subject,
                body: input.body,
            })
            .await?;

        tracing::info!("stored message {}", id);
        Ok(id)
    }

    async fn store_reply(&self, original_id: Uuid, input: MessageInput) -> Result<Uuid> {
        let original = self.repo.get_message(original_id).await?;

        let mut recipients = BTreeSet::new();
        if let Some(group) = &original.group_id {
            recipients.extend(self.directory.group_members(group).await?);
        }
        recipients.insert(original.sender);

        let id = self
            .repo
            .store_message(NewMessage {
                reply_to_id: Some(original_id),
                sender: input.sender,
                recipients: recipients.into_iter().collect(),
                group_id: original.group_id,
                subject: input.subject,
                body: input.body,
            })
            .await?;

        tracing::info!("stored reply {} to message {}", id, original_id);
        Ok(id)
    }

    pub async fn get_message(&self, id: Uuid) -> Result<MessageResponse> {
        let message = self.repo.get_message(id).await?;
        Ok(message.into())
    }

    /// Mailbox of `user_id`: every message the user is a recipient of.
    pub async fn get_messages(&self, user_id: &str) -> Result<Vec<MessageResponse>> {
        self.ensure_user(user_id).await?;

        let messages = self.repo.get_user_messages(user_id).await?;
        tracing::debug!("{} messages for user {}", messages.len(), user_id);

        Ok(messages.into_iter().map(MessageResponse::from).collect())
    }

    pub async fn get_replies(&self, id: Uuid) -> Result<Vec<MessageResponse>> {
        self.repo.get_message(id).await?;

        let replies = self.repo.get_reply_messages(id).await?;
        Ok(replies.into_iter().map(MessageResponse::from).collect())
    }

    async fn ensure_user(&self, user_id: &str) -> Result<()> {
        if self.directory.user_exists(user_id).await? {
            Ok(())
        } else {
            tracing::debug!("unknown user {}", user_id);
            Err(AppError::UserNotFound)
        }
    }
}
