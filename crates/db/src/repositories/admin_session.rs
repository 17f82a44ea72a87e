use chrono::{Duration, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::RepositoryError;
use crate::DbPool;

/// Opaque bearer tokens for the admin panel. Tokens live in the database so a
/// restart does not log every operator out.
pub struct SqlAdminSessionRepository {
    pool: DbPool,
}

impl SqlAdminSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, ttl_hours: u64) -> Result<String, RepositoryError> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::hours(ttl_hours as i64);

        sqlx::query(
            "INSERT INTO admin_sessions (token, created_at, expires_at) VALUES (?, ?, ?)",
        )
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    /// Checks the token and drops any sessions past their expiry while here.
    pub async fn validate(&self, token: &str) -> Result<bool, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?")
            .bind(&now)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM admin_sessions WHERE token = ? AND expires_at > ?",
        )
        .bind(token)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get::<i64, _>("count")? > 0)
    }

    pub async fn revoke(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM admin_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqlAdminSessionRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn fresh_token_validates_until_revoked() {
        let pool = setup_pool().await;
        let repo = SqlAdminSessionRepository::new(pool.clone());

        let token = repo.create(720).await.expect("create session");
        assert!(repo.validate(&token).await.expect("validate"));
        assert!(!repo.validate("not-a-token").await.expect("validate unknown"));

        repo.revoke(&token).await.expect("revoke");
        assert!(!repo.validate(&token).await.expect("validate after revoke"));

        pool.close().await;
    }

    #[tokio::test]
    async fn expired_token_is_rejected_and_purged() {
        let pool = setup_pool().await;
        let repo = SqlAdminSessionRepository::new(pool.clone());

        sqlx::query(
            "INSERT INTO admin_sessions (token, created_at, expires_at)
             VALUES ('stale', '2020-01-01T00:00:00Z', '2020-01-02T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("insert stale session");

        assert!(!repo.validate("stale").await.expect("validate stale"));

        let remaining = sqlx::query("SELECT COUNT(*) AS count FROM admin_sessions")
            .fetch_one(&pool)
            .await
            .expect("count sessions");
        use sqlx::Row;
        assert_eq!(remaining.get::<i64, _>("count"), 0);

        pool.close().await;
    }
}
