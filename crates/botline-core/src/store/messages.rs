use super::BotStore;
use crate::error::{Error, Result};
use crate::types::{Sender, StoredMessage};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl BotStore {
    // ── Messages ────────────────────────────────────────────────

    /// Append one message to a bot's conversation history.
    pub async fn append_message(
        &self,
        bot_id: &str,
        sender: Sender,
        body: &str,
    ) -> Result<StoredMessage> {
        let message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            bot_id: bot_id.to_string(),
            sender,
            body: body.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO messages (id, bot_id, sender, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(&message.bot_id)
        .bind(message.sender.as_str())
        .bind(&message.body)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(message)
    }

    /// The last `limit` messages for a bot, in chronological order.
    ///
    /// Callers always want "recent history, oldest first" for prompting, so
    /// the descending-limit query and the reversal both stay inside the
    /// store. Rowid breaks ties between same-timestamp rows (insertion
    /// order).
    pub async fn recent_messages(&self, bot_id: &str, limit: u32) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT id, bot_id, sender, body, created_at
             FROM messages WHERE bot_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )
        .bind(bot_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<StoredMessage> = rows
            .iter()
            .map(Self::row_to_message)
            .collect::<Result<_>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// Number of stored messages for a bot.
    pub async fn message_count(&self, bot_id: &str) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) as n FROM messages WHERE bot_id = ?1")
            .bind(bot_id)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<StoredMessage> {
        let sender_str: String = row.try_get("sender")?;
        let created_str: String = row.try_get("created_at")?;
        Ok(StoredMessage {
            id: row.try_get("id")?,
            bot_id: row.try_get("bot_id")?,
            sender: Sender::parse(&sender_str),
            body: row.try_get("body")?,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map_err(|e| Error::Internal(format!("bad created_at: {e}")))?
                .with_timezone(&Utc),
        })
    }
}
