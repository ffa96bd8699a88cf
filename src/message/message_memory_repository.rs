use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::message_models::{Message, NewMessage};
use super::message_repository::{MessageRepository, RepositoryError, RepositoryResult};

/// Process-local backend. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<DashMap<Uuid, Message>>,
    replies: Arc<DashMap<Uuid, Vec<Uuid>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn store_message(&self, message: NewMessage) -> RepositoryResult<Uuid> {
        let parent_id = message.reply_to_id;
        if let Some(parent_id) = parent_id {
            if !self.messages.contains_key(&parent_id) {
                tracing::warn!("reply references unknown message {}", parent_id);
                return Err(RepositoryError::NotFound(parent_id));
            }
        }

        let id = Uuid::new_v4();
        self.messages.insert(id, message.into_message(id, Utc::now()));

        if let Some(parent_id) = parent_id {
            // The entry guard holds the shard lock across read and append.
            self.replies.entry(parent_id).or_default().push(id);
        }

        tracing::debug!("stored message {}", id);
        Ok(id)
    }

    async fn get_message(&self, id: Uuid) -> RepositoryResult<Message> {
        self.messages
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn get_user_messages(&self, user_id: &str) -> RepositoryResult<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|entry| entry.recipients.iter().any(|r| r == user_id))
            .map(|entry| entry.value().clone())
            .collect();

        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn get_reply_messages(&self, id: Uuid) -> RepositoryResult<Vec<Message>> {
        if !self.messages.contains_key(&id) {
            return Err(RepositoryError::NotFound(id));
        }

        let reply_ids = self
            .replies
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        Ok(reply_ids
            .iter()
            .filter_map(|reply_id| self.messages.get(reply_id).map(|m| m.value().clone()))
            .collect())
    }

    async fn purge(&self) -> RepositoryResult<()> {
        let count = self.messages.len();
        self.replies.clear();
        self.messages.clear();
        tracing::info!("purged {} messages", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(sender: &str, recipients: &[&str], reply_to_id: Option<Uuid>) -> NewMessage {
        NewMessage {
            reply_to_id,
            sender: sender.to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            group_id: None,
            subject: "test".to_string(),
            body: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn store_then_get_assigns_id_and_timestamp() {
        let repo = InMemoryMessageRepository::new();
        let before = Utc::now();

        let id = repo.store_message(draft("tester", &["user1"], None)).await.unwrap();
        let stored = repo.get_message(id).await.unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.sender, "tester");
        assert_eq!(stored.recipients, vec!["user1".to_string()]);
        assert!(stored.created_at >= before);
        assert_eq!(repo.get_message(id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let repo = InMemoryMessageRepository::new();
        let id = Uuid::new_v4();

        assert!(matches!(repo.get_message(id).await, Err(RepositoryError::NotFound(x)) if x == id));
        assert!(matches!(
            repo.get_reply_messages(id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reply_to_missing_parent_writes_nothing() {
        let repo = InMemoryMessageRepository::new();

        let err = repo
            .store_message(draft("user1", &["tester"], Some(Uuid::new_v4())))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound(_)));
        assert!(repo.get_user_messages("tester").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replies_are_indexed_in_store_order() {
        let repo = InMemoryMessageRepository::new();
        let original = repo.store_message(draft("tester", &["user1"], None)).await.unwrap();

        assert!(repo.get_reply_messages(original).await.unwrap().is_empty());

        let first = repo.store_message(draft("user1", &["tester"], Some(original))).await.unwrap();
        let second = repo.store_message(draft("user2", &["tester"], Some(original))).await.unwrap();

        let replies: Vec<Uuid> = repo
            .get_reply_messages(original)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(replies, vec![first, second]);

        // Replies to a reply get their own entry.
        assert!(repo.get_reply_messages(first).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_replies_are_not_lost() {
        let repo = InMemoryMessageRepository::new();
        let original = repo.store_message(draft("tester", &["user1"], None)).await.unwrap();

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.store_message(draft("user1", &["tester"], Some(original)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        assert_eq!(repo.get_reply_messages(original).await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn user_messages_filter_by_recipient() {
        let repo = InMemoryMessageRepository::new();
        repo.store_message(draft("tester", &["user1"], None)).await.unwrap();
        repo.store_message(draft("tester", &["user1", "user2"], None)).await.unwrap();
        repo.store_message(draft("tester", &["user3"], None)).await.unwrap();

        assert_eq!(repo.get_user_messages("user1").await.unwrap().len(), 2);
        assert_eq!(repo.get_user_messages("user2").await.unwrap().len(), 1);
        assert!(repo.get_user_messages("nobody").await.unwrap().is_empty());

        let first = repo.get_user_messages("user1").await.unwrap();
        let again = repo.get_user_messages("user1").await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn purge_removes_messages_and_index() {
        let repo = InMemoryMessageRepository::new();
        let original = repo.store_message(draft("tester", &["user1"], None)).await.unwrap();
        repo.store_message(draft("user1", &["tester"], Some(original))).await.unwrap();

        repo.purge().await.unwrap();

        assert!(repo.get_user_messages("user1").await.unwrap().is_empty());
        assert!(repo.get_user_messages("tester").await.unwrap().is_empty());
        assert!(matches!(
            repo.get_reply_messages(original).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
