use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use automarket_core::domain::catalog::{
    Brand, BrandId, Car, CarDetail, CarId, CarPhoto, CarSummary, Manager, ManagerId,
    PriceCategory, PriceCategoryId,
};

use super::{CatalogReader, RepositoryError};
use crate::DbPool;

/// Inventory write payload. Photos are attached separately so the car row and
/// its gallery land in one transaction.
#[derive(Clone, Debug)]
pub struct NewCar {
    pub brand_id: BrandId,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub price_category_id: Option<PriceCategoryId>,
    pub description_ru: Option<String>,
    pub description_uz: Option<String>,
}

/// Catalog reads for the bot and the site plus the admin mutations. Prices
/// are stored as decimal strings because SQLite has no decimal column type.
pub struct SqlCatalogRepository {
    pool: DbPool,
}

const SUMMARY_SELECT: &str = "SELECT
    cars.id,
    cars.brand_id,
    cars.model,
    cars.year,
    cars.price,
    cars.price_category_id,
    cars.description_ru,
    cars.description_uz,
    cars.active,
    cars.created_at,
    brands.name_ru AS brand_name_ru,
    brands.name_uz AS brand_name_uz,
    price_categories.label_ru AS category_label_ru,
    price_categories.label_uz AS category_label_uz,
    (SELECT file_path FROM car_photos
     WHERE car_photos.car_id = cars.id
     ORDER BY car_photos.sort ASC, car_photos.id ASC
     LIMIT 1) AS cover_photo
 FROM cars
 JOIN brands ON brands.id = cars.brand_id
 LEFT JOIN price_categories ON price_categories.id = cars.price_category_id";

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Active cars for the public site, newest first, optionally narrowed to
    /// one brand.
    pub async fn active_listing(
        &self,
        brand_id: Option<BrandId>,
    ) -> Result<Vec<CarSummary>, RepositoryError> {
        let rows = if let Some(brand_id) = brand_id {
            sqlx::query(&format!(
                "{SUMMARY_SELECT}
                 WHERE cars.active = 1 AND cars.brand_id = ?
                 ORDER BY cars.created_at DESC, cars.id DESC",
            ))
            .bind(brand_id.0)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!(
                "{SUMMARY_SELECT}
                 WHERE cars.active = 1
                 ORDER BY cars.created_at DESC, cars.id DESC",
            ))
            .fetch_all(&self.pool)
            .await?
        };

        rows.into_iter().map(summary_from_row).collect()
    }

    /// Every car regardless of visibility, for the admin inventory table.
    pub async fn all_for_admin(&self) -> Result<Vec<CarSummary>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SUMMARY_SELECT}
             ORDER BY cars.created_at DESC, cars.id DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(summary_from_row).collect()
    }

    pub async fn price_categories(&self) -> Result<Vec<PriceCategory>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, label_ru, label_uz, sort FROM price_categories
             ORDER BY sort ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(category_from_row).collect()
    }

    pub async fn all_managers(&self) -> Result<Vec<Manager>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, phone, active, sort FROM managers
             ORDER BY sort ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(manager_from_row).collect()
    }

    pub async fn insert_brand(
        &self,
        name_ru: &str,
        name_uz: &str,
    ) -> Result<BrandId, RepositoryError> {
        let result = sqlx::query("INSERT INTO brands (name_ru, name_uz) VALUES (?, ?)")
            .bind(name_ru)
            .bind(name_uz)
            .execute(&self.pool)
            .await?;

        Ok(BrandId(result.last_insert_rowid()))
    }

    pub async fn delete_brand(&self, id: BrandId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM brands WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_price_category(
        &self,
        label_ru: &str,
        label_uz: &str,
        sort: i64,
    ) -> Result<PriceCategoryId, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO price_categories (label_ru, label_uz, sort) VALUES (?, ?, ?)")
                .bind(label_ru)
                .bind(label_uz)
                .bind(sort)
                .execute(&self.pool)
                .await?;

        Ok(PriceCategoryId(result.last_insert_rowid()))
    }

    pub async fn delete_price_category(&self, id: PriceCategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM price_categories WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_manager(
        &self,
        name: &str,
        phone: &str,
        sort: i64,
    ) -> Result<ManagerId, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO managers (name, phone, active, sort) VALUES (?, ?, 1, ?)")
                .bind(name)
                .bind(phone)
                .bind(sort)
                .execute(&self.pool)
                .await?;

        Ok(ManagerId(result.last_insert_rowid()))
    }

    pub async fn set_manager_active(
        &self,
        id: ManagerId,
        active: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE managers SET active = ? WHERE id = ?")
            .bind(i64::from(active))
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_manager(&self, id: ManagerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM managers WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_car_with_photos(
        &self,
        car: NewCar,
        photo_paths: &[String],
    ) -> Result<CarId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO cars (
                brand_id,
                model,
                year,
                price,
                price_category_id,
                description_ru,
                description_uz,
                active,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(car.brand_id.0)
        .bind(&car.model)
        .bind(i64::from(car.year))
        .bind(car.price.to_string())
        .bind(car.price_category_id.map(|id| id.0))
        .bind(car.description_ru.as_deref())
        .bind(car.description_uz.as_deref())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let car_id = result.last_insert_rowid();

        for (sort, path) in photo_paths.iter().enumerate() {
            sqlx::query("INSERT INTO car_photos (car_id, file_path, sort) VALUES (?, ?, ?)")
                .bind(car_id)
                .bind(path)
                .bind(sort as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(CarId(car_id))
    }

    pub async fn set_car_active(&self, id: CarId, active: bool) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE cars SET active = ? WHERE id = ?")
            .bind(i64::from(active))
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes the car and its gallery rows. Photo files on disk are the
    /// caller's concern.
    pub async fn delete_car(&self, id: CarId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM car_photos WHERE car_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl CatalogReader for SqlCatalogRepository {
    async fn brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name_ru, name_uz FROM brands ORDER BY name_ru ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(brand_from_row).collect()
    }

    async fn cars_of_brand(&self, brand_id: BrandId) -> Result<Vec<Car>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                brand_id,
                model,
                year,
                price,
                price_category_id,
                description_ru,
                description_uz,
                active,
                created_at
             FROM cars
             WHERE active = 1 AND brand_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(brand_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| car_from_row(&row)).collect()
    }

    async fn car_detail(&self, car_id: CarId) -> Result<Option<CarDetail>, RepositoryError> {
        let row = sqlx::query(&format!("{SUMMARY_SELECT} WHERE cars.id = ?"))
            .bind(car_id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let summary = summary_from_row(row)?;

        let photos = sqlx::query(
            "SELECT id, car_id, file_path, sort FROM car_photos
             WHERE car_id = ?
             ORDER BY sort ASC, id ASC",
        )
        .bind(car_id.0)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(photo_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CarDetail {
            car: summary.car,
            brand_name_ru: summary.brand_name_ru,
            brand_name_uz: summary.brand_name_uz,
            category_label_ru: summary.category_label_ru,
            category_label_uz: summary.category_label_uz,
            photos,
        }))
    }

    async fn active_managers(&self) -> Result<Vec<Manager>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, phone, active, sort FROM managers
             WHERE active = 1
             ORDER BY sort ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(manager_from_row).collect()
    }
}

fn brand_from_row(row: SqliteRow) -> Result<Brand, RepositoryError> {
    Ok(Brand {
        id: BrandId(row.try_get("id")?),
        name_ru: row.try_get("name_ru")?,
        name_uz: row.try_get("name_uz")?,
    })
}

fn category_from_row(row: SqliteRow) -> Result<PriceCategory, RepositoryError> {
    Ok(PriceCategory {
        id: PriceCategoryId(row.try_get("id")?),
        label_ru: row.try_get("label_ru")?,
        label_uz: row.try_get("label_uz")?,
        sort: row.try_get("sort")?,
    })
}

fn manager_from_row(row: SqliteRow) -> Result<Manager, RepositoryError> {
    Ok(Manager {
        id: ManagerId(row.try_get("id")?),
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        active: row.try_get::<i64, _>("active")? != 0,
        sort: row.try_get("sort")?,
    })
}

fn photo_from_row(row: SqliteRow) -> Result<CarPhoto, RepositoryError> {
    Ok(CarPhoto {
        id: row.try_get("id")?,
        car_id: CarId(row.try_get("car_id")?),
        file_path: row.try_get("file_path")?,
        sort: row.try_get("sort")?,
    })
}

fn car_from_row(row: &SqliteRow) -> Result<Car, RepositoryError> {
    let year_raw = row.try_get::<i64, _>("year")?;
    let year = i32::try_from(year_raw)
        .map_err(|_| RepositoryError::Decode(format!("year out of range: {year_raw}")))?;

    Ok(Car {
        id: CarId(row.try_get("id")?),
        brand_id: BrandId(row.try_get("brand_id")?),
        model: row.try_get("model")?,
        year,
        price: parse_price(row.try_get("price")?)?,
        price_category_id: row.try_get::<Option<i64>, _>("price_category_id")?.map(PriceCategoryId),
        description_ru: row.try_get("description_ru")?,
        description_uz: row.try_get("description_uz")?,
        active: row.try_get::<i64, _>("active")? != 0,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn summary_from_row(row: SqliteRow) -> Result<CarSummary, RepositoryError> {
    let car = car_from_row(&row)?;

    Ok(CarSummary {
        car,
        brand_name_ru: row.try_get("brand_name_ru")?,
        brand_name_uz: row.try_get("brand_name_uz")?,
        category_label_ru: row.try_get("category_label_ru")?,
        category_label_uz: row.try_get("category_label_uz")?,
        cover_photo: row.try_get("cover_photo")?,
    })
}

fn parse_price(value: String) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(&value)
        .map_err(|error| RepositoryError::Decode(format!("invalid price `{value}`: {error}")))
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
