use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_BRAND_IDS: &[i64] = &[9001, 9002];
const SEED_CATEGORY_IDS: &[i64] = &[9001, 9002];
const SEED_MANAGER_IDS: &[i64] = &[9001, 9002];
const SEED_CAR_IDS: &[i64] = &[9001, 9002, 9003];
const SEED_PHOTO_IDS: &[i64] = &[9001, 9002, 9003];
const SEED_LEAD_IDS: &[i64] = &[9001];

/// Deterministic demo catalog plus one captured lead. Reloading is safe:
/// every row carries a fixed id and is re-upserted as is.
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            brands: SEED_BRAND_IDS.len(),
            price_categories: SEED_CATEGORY_IDS.len(),
            managers: SEED_MANAGER_IDS.len(),
            cars: SEED_CAR_IDS.len(),
            leads: SEED_LEAD_IDS.len(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        checks.push(("brands", count_by_ids(pool, "brands", SEED_BRAND_IDS).await?));
        checks.push((
            "price-categories",
            count_by_ids(pool, "price_categories", SEED_CATEGORY_IDS).await?,
        ));
        checks.push(("managers", count_by_ids(pool, "managers", SEED_MANAGER_IDS).await?));
        checks.push(("cars", count_by_ids(pool, "cars", SEED_CAR_IDS).await?));
        checks.push(("car-photos", count_by_ids(pool, "car_photos", SEED_PHOTO_IDS).await?));
        checks.push(("leads", count_by_ids(pool, "sell_leads", SEED_LEAD_IDS).await?));

        let hidden_car: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cars WHERE id = 9003 AND active = 0)")
                .fetch_one(pool)
                .await?;
        checks.push(("hidden-demo-car", hidden_car == 1));

        let lead_status: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sell_leads WHERE id = 9001 AND status = 'new')",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("demo-lead-status", lead_status == 1));

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::query(&delete_by_ids("sell_leads", SEED_LEAD_IDS)).execute(&mut *tx).await?;
        sqlx::query(&delete_by_ids("car_photos", SEED_PHOTO_IDS)).execute(&mut *tx).await?;
        sqlx::query(&delete_by_ids("cars", SEED_CAR_IDS)).execute(&mut *tx).await?;
        sqlx::query(&delete_by_ids("managers", SEED_MANAGER_IDS)).execute(&mut *tx).await?;
        sqlx::query(&delete_by_ids("price_categories", SEED_CATEGORY_IDS))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&delete_by_ids("brands", SEED_BRAND_IDS)).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn count_by_ids(pool: &DbPool, table: &str, ids: &[i64]) -> Result<bool, RepositoryError> {
    let placeholders = sql_id_list(ids);
    let count: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table} WHERE id IN {placeholders}"))
            .fetch_one(pool)
            .await?;
    Ok(count == ids.len() as i64)
}

fn delete_by_ids(table: &str, ids: &[i64]) -> String {
    format!("DELETE FROM {table} WHERE id IN {}", sql_id_list(ids))
}

fn sql_id_list(ids: &[i64]) -> String {
    let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    format!("({joined})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub brands: usize,
    pub price_categories: usize,
    pub managers: usize,
    pub cars: usize,
    pub leads: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::DemoDataset;
    use crate::{connect_with_settings, migrations, DbPool};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoDataset::SQL.is_empty());
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn seed_loads_verifies_and_reloads_idempotently() {
        let pool = setup_pool().await;

        let first = DemoDataset::load(&pool).await.expect("load fixtures");
        assert_eq!(first.cars, 3);

        let verification = DemoDataset::verify(&pool).await.expect("verify fixtures");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);

        DemoDataset::load(&pool).await.expect("reload fixtures");
        let second_verification = DemoDataset::verify(&pool).await.expect("re-verify fixtures");
        assert_eq!(verification.checks, second_verification.checks);

        pool.close().await;
    }

    #[tokio::test]
    async fn clean_removes_every_seeded_row() {
        let pool = setup_pool().await;

        DemoDataset::load(&pool).await.expect("load fixtures");
        DemoDataset::clean(&pool).await.expect("clean fixtures");

        let verification = DemoDataset::verify(&pool).await.expect("verify after clean");
        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, present)| !present));

        pool.close().await;
    }
}
