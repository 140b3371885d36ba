use super::BotStore;
use crate::error::{Error, Result};
use crate::types::{Bot, BotUpdate, NewBot};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

const BOT_COLUMNS: &str =
    "id, owner, name, system_prompt, language, whatsapp_number, instance_id, api_token, created_at";

impl BotStore {
    // ── Bots ────────────────────────────────────────────────────

    /// Create a bot. Fails with [`Error::DuplicateNumber`] when another bot
    /// already claims the WhatsApp number.
    pub async fn create_bot(&self, new: NewBot) -> Result<Bot> {
        let bot = Bot {
            id: Uuid::new_v4().to_string(),
            owner: new.owner,
            name: new.name,
            system_prompt: new.system_prompt,
            language: new.language,
            whatsapp_number: new.whatsapp_number,
            instance_id: new.instance_id,
            api_token: new.api_token,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            "INSERT INTO bots
             (id, owner, name, system_prompt, language, whatsapp_number, instance_id, api_token, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&bot.id)
        .bind(&bot.owner)
        .bind(&bot.name)
        .bind(&bot.system_prompt)
        .bind(&bot.language)
        .bind(&bot.whatsapp_number)
        .bind(&bot.instance_id)
        .bind(&bot.api_token)
        .bind(bot.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(bot),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(Error::DuplicateNumber(bot.whatsapp_number))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All bots owned by a principal, newest first.
    pub async fn list_bots(&self, owner: &str) -> Result<Vec<Bot>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOT_COLUMNS} FROM bots WHERE owner = ?1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_bot).collect()
    }

    /// Get a bot by ID.
    pub async fn get_bot(&self, id: &str) -> Result<Option<Bot>> {
        let row = sqlx::query(&format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_bot).transpose()
    }

    /// Exact-match lookup by configured WhatsApp number (zero-or-one result,
    /// backed by the unique index).
    pub async fn find_by_whatsapp_number(&self, number: &str) -> Result<Option<Bot>> {
        let row = sqlx::query(&format!(
            "SELECT {BOT_COLUMNS} FROM bots WHERE whatsapp_number = ?1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_bot).transpose()
    }

    /// Apply a partial update. Returns the updated bot, or `None` when the
    /// bot does not exist.
    pub async fn update_bot(&self, id: &str, update: BotUpdate) -> Result<Option<Bot>> {
        let Some(mut bot) = self.get_bot(id).await? else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            bot.name = name;
        }
        if let Some(system_prompt) = update.system_prompt {
            bot.system_prompt = system_prompt;
        }
        if let Some(language) = update.language {
            bot.language = language;
        }
        if let Some(whatsapp_number) = update.whatsapp_number {
            bot.whatsapp_number = whatsapp_number;
        }
        if let Some(instance_id) = update.instance_id {
            bot.instance_id = instance_id;
        }
        if let Some(api_token) = update.api_token {
            bot.api_token = api_token;
        }

        let result = sqlx::query(
            "UPDATE bots SET name = ?2, system_prompt = ?3, language = ?4,
             whatsapp_number = ?5, instance_id = ?6, api_token = ?7
             WHERE id = ?1",
        )
        .bind(&bot.id)
        .bind(&bot.name)
        .bind(&bot.system_prompt)
        .bind(&bot.language)
        .bind(&bot.whatsapp_number)
        .bind(&bot.instance_id)
        .bind(&bot.api_token)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Some(bot)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(Error::DuplicateNumber(bot.whatsapp_number))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a bot and its conversation history. Returns `false` when the
    /// bot did not exist.
    pub async fn delete_bot(&self, id: &str) -> Result<bool> {
        sqlx::query("DELETE FROM messages WHERE bot_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM bots WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub(crate) fn row_to_bot(row: &sqlx::sqlite::SqliteRow) -> Result<Bot> {
        let created_str: String = row.try_get("created_at")?;
        Ok(Bot {
            id: row.try_get("id")?,
            owner: row.try_get("owner")?,
            name: row.try_get("name")?,
            system_prompt: row.try_get("system_prompt")?,
            language: row.try_get("language")?,
            whatsapp_number: row.try_get("whatsapp_number")?,
            instance_id: row.try_get("instance_id")?,
            api_token: row.try_get("api_token")?,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map_err(|e| Error::Internal(format!("bad created_at: {e}")))?
                .with_timezone(&Utc),
        })
    }
}
