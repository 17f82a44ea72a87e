use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use automarket_core::domain::lead::{LeadDraft, LeadId, LeadStatus, SellLead};
use automarket_core::i18n::Lang;

use super::{LeadStore, RepositoryError};
use crate::DbPool;

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LeadStore for SqlLeadRepository {
    async fn insert(&self, draft: &LeadDraft) -> Result<LeadId, RepositoryError> {
        draft.validate()?;

        let result = sqlx::query(
            "INSERT INTO sell_leads (
                lang,
                full_name,
                phone,
                brand_text,
                model_text,
                year,
                color,
                price_wanted,
                condition,
                created_at,
                status
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(draft.lang.as_str())
        .bind(&draft.full_name)
        .bind(&draft.phone)
        .bind(&draft.brand_text)
        .bind(&draft.model_text)
        .bind(&draft.year)
        .bind(&draft.color)
        .bind(&draft.price_wanted)
        .bind(&draft.condition)
        .bind(Utc::now().to_rfc3339())
        .bind(LeadStatus::New.as_str())
        .execute(&self.pool)
        .await?;

        Ok(LeadId(result.last_insert_rowid()))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SellLead>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                lang,
                full_name,
                phone,
                brand_text,
                model_text,
                year,
                color,
                price_wanted,
                condition,
                created_at,
                status
             FROM sell_leads
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(lead_from_row).collect()
    }

    async fn set_status(&self, id: LeadId, status: LeadStatus) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE sell_leads SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn lead_from_row(row: SqliteRow) -> Result<SellLead, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = status_raw
        .parse::<LeadStatus>()
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    Ok(SellLead {
        id: LeadId(row.try_get("id")?),
        lang: Lang::parse_lenient(&row.try_get::<String, _>("lang")?),
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        brand_text: row.try_get("brand_text")?,
        model_text: row.try_get("model_text")?,
        year: row.try_get("year")?,
        color: row.try_get("color")?,
        price_wanted: row.try_get("price_wanted")?,
        condition: row.try_get("condition")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        status,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

#[cfg(test)]
mod tests {
    use automarket_core::domain::lead::{LeadDraft, LeadStatus};
    use automarket_core::i18n::Lang;

    use super::SqlLeadRepository;
    use crate::repositories::{LeadStore, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn draft(full_name: &str) -> LeadDraft {
        LeadDraft {
            lang: Lang::Ru,
            full_name: full_name.to_string(),
            phone: "+998901234567".to_string(),
            brand_text: "Chevrolet".to_string(),
            model_text: "Cobalt".to_string(),
            year: "2020".to_string(),
            color: "белый".to_string(),
            price_wanted: "150 млн".to_string(),
            condition: "отличное".to_string(),
        }
    }

    #[tokio::test]
    async fn inserted_lead_comes_back_with_new_status() {
        let pool = setup_pool().await;
        let repo = SqlLeadRepository::new(pool.clone());

        let id = repo.insert(&draft("Алишер")).await.expect("insert lead");

        let leads = repo.recent(200).await.expect("list leads");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].id, id);
        assert_eq!(leads[0].full_name, "Алишер");
        assert_eq!(leads[0].status, LeadStatus::New);

        pool.close().await;
    }

    #[tokio::test]
    async fn incomplete_draft_is_rejected_before_touching_storage() {
        let pool = setup_pool().await;
        let repo = SqlLeadRepository::new(pool.clone());

        let mut incomplete = draft("Алишер");
        incomplete.phone = "звоните".to_string();

        let error = repo.insert(&incomplete).await.expect_err("invalid phone should fail");
        assert!(matches!(error, RepositoryError::Domain(_)));
        assert!(repo.recent(200).await.expect("list leads").is_empty());

        pool.close().await;
    }

    #[tokio::test]
    async fn recent_returns_newest_first_and_respects_limit() {
        let pool = setup_pool().await;
        let repo = SqlLeadRepository::new(pool.clone());

        for name in ["первый", "второй", "третий"] {
            repo.insert(&draft(name)).await.expect("insert lead");
        }

        let leads = repo.recent(2).await.expect("list leads");
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].full_name, "третий");
        assert_eq!(leads[1].full_name, "второй");

        pool.close().await;
    }

    #[tokio::test]
    async fn set_status_reports_whether_a_lead_was_touched() {
        let pool = setup_pool().await;
        let repo = SqlLeadRepository::new(pool.clone());

        let id = repo.insert(&draft("Алишер")).await.expect("insert lead");

        assert!(repo.set_status(id, LeadStatus::Contacted).await.expect("update status"));
        let leads = repo.recent(1).await.expect("list leads");
        assert_eq!(leads[0].status, LeadStatus::Contacted);

        let missing = automarket_core::domain::lead::LeadId(9999);
        assert!(!repo.set_status(missing, LeadStatus::Closed).await.expect("missing lead"));

        pool.close().await;
    }
}
