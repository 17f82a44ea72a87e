use chrono::Utc;
use sqlx::Row;

use automarket_core::domain::user::ChatId;
use automarket_core::i18n::Lang;

use super::{RepositoryError, UserStore};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for SqlUserRepository {
    async fn lang_or_default(&self, chat_id: ChatId) -> Result<Lang, RepositoryError> {
        let row = sqlx::query("SELECT lang FROM users WHERE chat_id = ?")
            .bind(chat_id.0)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let raw = row.try_get::<String, _>("lang")?;
            return Ok(Lang::parse_lenient(&raw));
        }

        let lang = Lang::default();
        sqlx::query(
            "INSERT INTO users (chat_id, lang, created_at) VALUES (?, ?, ?)
             ON CONFLICT(chat_id) DO NOTHING",
        )
        .bind(chat_id.0)
        .bind(lang.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(lang)
    }

    async fn set_lang(&self, chat_id: ChatId, lang: Lang) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO users (chat_id, lang, created_at) VALUES (?, ?, ?)
             ON CONFLICT(chat_id) DO UPDATE SET lang = excluded.lang",
        )
        .bind(chat_id.0)
        .bind(lang.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
