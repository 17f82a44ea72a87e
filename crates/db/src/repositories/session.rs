use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use automarket_core::domain::lead::LeadField;
use automarket_core::domain::user::ChatId;
use automarket_core::flows::{SellSession, SellStep};
use automarket_core::i18n::Lang;

use super::{RepositoryError, SessionStore};
use crate::DbPool;

/// Questionnaire snapshots keyed by chat. Collected answers travel as a JSON
/// array so the column set stays stable while the questionnaire evolves.
pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for SqlSessionRepository {
    async fn get(&self, chat_id: ChatId) -> Result<Option<SellSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT lang, step, fields_json FROM sell_sessions WHERE chat_id = ?",
        )
        .bind(chat_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(session_from_row).transpose()
    }

    async fn put(&self, chat_id: ChatId, session: &SellSession) -> Result<(), RepositoryError> {
        let fields_json = serde_json::to_string(&session.fields)
            .map_err(|error| RepositoryError::Decode(format!("encode session fields: {error}")))?;

        sqlx::query(
            "INSERT INTO sell_sessions (chat_id, lang, step, fields_json, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(chat_id) DO UPDATE SET
                lang = excluded.lang,
                step = excluded.step,
                fields_json = excluded.fields_json,
                updated_at = excluded.updated_at",
        )
        .bind(chat_id.0)
        .bind(session.lang.as_str())
        .bind(session.step.as_str())
        .bind(fields_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, chat_id: ChatId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sell_sessions WHERE chat_id = ?")
            .bind(chat_id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn session_from_row(row: SqliteRow) -> Result<SellSession, RepositoryError> {
    let lang = Lang::parse_lenient(&row.try_get::<String, _>("lang")?);

    let step_raw = row.try_get::<String, _>("step")?;
    let step = SellStep::from_str_lenient(&step_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown sell step `{step_raw}`")))?;

    let fields_raw = row.try_get::<String, _>("fields_json")?;
    let fields: Vec<(LeadField, String)> = serde_json::from_str(&fields_raw)
        .map_err(|error| RepositoryError::Decode(format!("decode session fields: {error}")))?;

    Ok(SellSession { lang, step, fields })
}

#[cfg(test)]
mod tests {
    use automarket_core::domain::lead::LeadField;
    use automarket_core::domain::user::ChatId;
    use automarket_core::flows::{SellSession, SellStep};
    use automarket_core::i18n::Lang;

    use super::SqlSessionRepository;
    use crate::repositories::{RepositoryError, SessionStore};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn session_round_trips_with_collected_answers() {
        let pool = setup_pool().await;
        let repo = SqlSessionRepository::new(pool.clone());
        let chat_id = ChatId(100);

        assert!(repo.get(chat_id).await.expect("empty lookup").is_none());

        let session = SellSession {
            lang: Lang::Uz,
            step: SellStep::Year,
            fields: vec![
                (LeadField::Brand, "Chevrolet".to_string()),
                (LeadField::Model, "Cobalt".to_string()),
            ],
        };
        repo.put(chat_id, &session).await.expect("store session");

        let found = repo.get(chat_id).await.expect("lookup").expect("stored session");
        assert_eq!(found, session);

        repo.clear(chat_id).await.expect("clear session");
        assert!(repo.get(chat_id).await.expect("lookup after clear").is_none());
        repo.clear(chat_id).await.expect("clear is idempotent");

        pool.close().await;
    }

    #[tokio::test]
    async fn put_overwrites_previous_snapshot() {
        let pool = setup_pool().await;
        let repo = SqlSessionRepository::new(pool.clone());
        let chat_id = ChatId(200);

        let mut session = SellSession {
            lang: Lang::Ru,
            step: SellStep::Brand,
            fields: Vec::new(),
        };
        repo.put(chat_id, &session).await.expect("store first snapshot");

        session.step = SellStep::Model;
        session.fields.push((LeadField::Brand, "Kia".to_string()));
        repo.put(chat_id, &session).await.expect("store second snapshot");

        let found = repo.get(chat_id).await.expect("lookup").expect("stored session");
        assert_eq!(found, session);

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_step_token_is_a_decode_error() {
        let pool = setup_pool().await;
        let repo = SqlSessionRepository::new(pool.clone());

        sqlx::query(
            "INSERT INTO sell_sessions (chat_id, lang, step, fields_json, updated_at)
             VALUES (300, 'ru', 'haggling', '[]', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("insert corrupt row");

        let error = repo.get(ChatId(300)).await.expect_err("corrupt step should fail");
        assert!(matches!(error, RepositoryError::Decode(_)));

        pool.close().await;
    }
}
