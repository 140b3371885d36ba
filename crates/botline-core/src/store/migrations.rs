use super::BotStore;
use crate::error::Result;

impl BotStore {
    pub(crate) async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bots (
                id              TEXT PRIMARY KEY,
                owner           TEXT NOT NULL,
                name            TEXT NOT NULL,
                system_prompt   TEXT NOT NULL,
                language        TEXT NOT NULL,
                whatsapp_number TEXT NOT NULL,
                instance_id     TEXT NOT NULL,
                api_token       TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // At most one bot per WhatsApp number
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_bots_whatsapp_number
             ON bots(whatsapp_number)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bots_owner ON bots(owner)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id         TEXT PRIMARY KEY,
                bot_id     TEXT NOT NULL REFERENCES bots(id),
                sender     TEXT NOT NULL,
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_bot
             ON messages(bot_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
