use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::i18n::Lang;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrandId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceCategoryId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagerId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name_ru: String,
    pub name_uz: String,
}

impl Brand {
    pub fn name(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ru => &self.name_ru,
            Lang::Uz => &self.name_uz,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCategory {
    pub id: PriceCategoryId,
    pub label_ru: String,
    pub label_uz: String,
    pub sort: i64,
}

impl PriceCategory {
    pub fn label(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ru => &self.label_ru,
            Lang::Uz => &self.label_uz,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manager {
    pub id: ManagerId,
    pub name: String,
    pub phone: String,
    pub active: bool,
    pub sort: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub brand_id: BrandId,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub price_category_id: Option<PriceCategoryId>,
    pub description_ru: Option<String>,
    pub description_uz: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Car {
    pub fn description(&self, lang: Lang) -> Option<&str> {
        let raw = match lang {
            Lang::Ru => self.description_ru.as_deref(),
            Lang::Uz => self.description_uz.as_deref(),
        };
        raw.filter(|text| !text.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarPhoto {
    pub id: i64,
    pub car_id: CarId,
    pub file_path: String,
    pub sort: i64,
}

/// Listing row: the car joined with its brand, optional tier label, and the
/// first photo when one exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarSummary {
    pub car: Car,
    pub brand_name_ru: String,
    pub brand_name_uz: String,
    pub category_label_ru: Option<String>,
    pub category_label_uz: Option<String>,
    pub cover_photo: Option<String>,
}

impl CarSummary {
    pub fn brand_name(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ru => &self.brand_name_ru,
            Lang::Uz => &self.brand_name_uz,
        }
    }

    pub fn category_label(&self, lang: Lang) -> &str {
        let label = match lang {
            Lang::Ru => self.category_label_ru.as_deref(),
            Lang::Uz => self.category_label_uz.as_deref(),
        };
        label.unwrap_or("—")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarDetail {
    pub car: Car,
    pub brand_name_ru: String,
    pub brand_name_uz: String,
    pub category_label_ru: Option<String>,
    pub category_label_uz: Option<String>,
    pub photos: Vec<CarPhoto>,
}

impl CarDetail {
    pub fn brand_name(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ru => &self.brand_name_ru,
            Lang::Uz => &self.brand_name_uz,
        }
    }

    pub fn category_label(&self, lang: Lang) -> &str {
        let label = match lang {
            Lang::Ru => self.category_label_ru.as_deref(),
            Lang::Uz => self.category_label_uz.as_deref(),
        };
        label.unwrap_or("—")
    }
}
