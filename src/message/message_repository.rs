use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::message_models::{Message, NewMessage};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("message {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Storage port for messages and the reply index that maps an original
/// message to the replies addressed to it.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Stores a message and returns its generated id. A reply must name a
    /// message that already exists; the parent's reply index is extended in
    /// the same unit of work as the insert.
    async fn store_message(&self, message: NewMessage) -> RepositoryResult<Uuid>;

    async fn get_message(&self, id: Uuid) -> RepositoryResult<Message>;

    /// All messages whose recipients include `user_id`, oldest first.
    async fn get_user_messages(&self, user_id: &str) -> RepositoryResult<Vec<Message>>;

    /// Replies to `id` in the order they were stored. Empty when there are none.
    async fn get_reply_messages(&self, id: Uuid) -> RepositoryResult<Vec<Message>>;

    /// Deletes every message and reply index entry. Test/reset use only.
    async fn purge(&self) -> RepositoryResult<()>;
}

/// PostgreSQL backend: `messages` plus `message_replies(original_id, reply_ids[])`.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn store_message(&self, message: NewMessage) -> RepositoryResult<Uuid> {
        let mut tx = self.pool.begin().await?;

        if let Some(parent_id) = message.reply_to_id {
            // Lock the parent row so it cannot vanish before the insert lands.
            let parent: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM messages WHERE id = $1 FOR SHARE")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            if parent.is_none() {
                tracing::warn!("reply references unknown message {}", parent_id);
                return Err(RepositoryError::NotFound(parent_id));
            }
        }

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO messages (id, reply_to_id, sender, recipients, group_id, subject, body)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(message.reply_to_id)
        .bind(&message.sender)
        .bind(&message.recipients)
        .bind(&message.group_id)
        .bind(&message.subject)
        .bind(&message.body)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(parent_id) = message.reply_to_id {
            sqlx::query(
                "INSERT INTO message_replies (original_id, reply_ids)
                 VALUES ($1, ARRAY[$2]::UUID[])
                 ON CONFLICT (original_id)
                 DO UPDATE SET reply_ids = message_replies.reply_ids || EXCLUDED.reply_ids",
            )
            .bind(parent_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!("stored message {}", id);
        Ok(id)
    }

    async fn get_message(&self, id: Uuid) -> RepositoryResult<Message> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn get_user_messages(&self, user_id: &str) -> RepositoryResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE $1 = ANY(recipients)
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn get_reply_messages(&self, id: Uuid) -> RepositoryResult<Vec<Message>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM messages WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if !exists {
            return Err(RepositoryError::NotFound(id));
        }

        let replies = sqlx::query_as::<_, Message>(
            "SELECT m.* FROM message_replies r
             CROSS JOIN LATERAL unnest(r.reply_ids) WITH ORDINALITY AS u(reply_id, position)
             JOIN messages m ON m.id = u.reply_id
             WHERE r.original_id = $1
             ORDER BY u.position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(replies)
    }

    async fn purge(&self) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let replies = sqlx::query("DELETE FROM message_replies")
            .execute(&mut *tx)
            .await?;
        let messages = sqlx::query("DELETE FROM messages")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "purged {} messages and {} reply index entries",
            messages.rows_affected(),
            replies.rows_affected()
        );
        Ok(())
    }
}
