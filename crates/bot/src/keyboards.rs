//! Inline keyboard builders, one per bot screen.
//!
//! Callback data uses the `lang:` / `menu:` / `brand:` / `car:` /
//! `car_contact:` namespaces that the handlers route on.

use serde::Serialize;

use automarket_core::domain::catalog::{Brand, Car, CarId};
use automarket_core::i18n::{text, Lang, MessageKey};
use automarket_core::money::format_price;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self { text: text.into(), callback_data: Some(data.into()), url: None }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { text: text.into(), callback_data: None, url: Some(url.into()) }
    }
}

pub fn kb_lang() -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![
            vec![InlineButton::callback("🇷🇺 Русский", "lang:ru")],
            vec![InlineButton::callback("🇺🇿 O‘zbek", "lang:uz")],
        ],
    }
}

pub fn kb_main(lang: Lang, site_url: &str) -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![
            vec![InlineButton::callback(text(lang, MessageKey::MenuCatalog), "menu:catalog")],
            vec![InlineButton::callback(text(lang, MessageKey::MenuManagers), "menu:managers")],
            vec![InlineButton::callback(text(lang, MessageKey::MenuSell), "menu:sell")],
            vec![InlineButton::link(text(lang, MessageKey::MenuSite), site_url)],
            vec![InlineButton::callback("🌐 RU / UZ", "menu:lang")],
        ],
    }
}

pub fn kb_back(lang: Lang, target: &str) -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![vec![InlineButton::callback(text(lang, MessageKey::Back), target)]],
    }
}

pub fn kb_brands(lang: Lang, brands: &[Brand]) -> InlineKeyboard {
    let mut rows: Vec<Vec<InlineButton>> = brands
        .iter()
        .map(|brand| vec![InlineButton::callback(brand.name(lang), format!("brand:{}", brand.id.0))])
        .collect();
    rows.push(vec![InlineButton::callback(text(lang, MessageKey::Back), "menu:home")]);
    InlineKeyboard { inline_keyboard: rows }
}

pub fn kb_cars(lang: Lang, cars: &[Car]) -> InlineKeyboard {
    let mut rows: Vec<Vec<InlineButton>> = cars
        .iter()
        .map(|car| {
            let label = format!("🚗 {} • {} • {}", car.model, car.year, format_price(car.price));
            vec![InlineButton::callback(label, format!("car:{}", car.id.0))]
        })
        .collect();
    rows.push(vec![InlineButton::callback(text(lang, MessageKey::Back), "menu:catalog")]);
    InlineKeyboard { inline_keyboard: rows }
}

pub fn kb_car_actions(lang: Lang, car_id: CarId, site_url: &str) -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![
            vec![InlineButton::callback(
                text(lang, MessageKey::CarContact),
                format!("car_contact:{}", car_id.0),
            )],
            vec![InlineButton::link(
                text(lang, MessageKey::OpenSite),
                format!("{site_url}/car/{}", car_id.0),
            )],
            vec![InlineButton::callback(text(lang, MessageKey::Back), "menu:catalog")],
        ],
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use automarket_core::domain::catalog::{Brand, BrandId, Car, CarId};
    use automarket_core::i18n::Lang;

    use super::{kb_brands, kb_cars, kb_lang, kb_main};

    #[test]
    fn main_menu_has_five_rows_with_site_link() {
        let keyboard = kb_main(Lang::Ru, "https://automarket.example");
        assert_eq!(keyboard.inline_keyboard.len(), 5);
        let site_row = &keyboard.inline_keyboard[3][0];
        assert_eq!(site_row.url.as_deref(), Some("https://automarket.example"));
        assert!(site_row.callback_data.is_none());
    }

    #[test]
    fn lang_keyboard_serializes_to_bot_api_shape() {
        let json = serde_json::to_value(kb_lang()).expect("serialize keyboard");
        assert_eq!(json["inline_keyboard"][0][0]["callback_data"], "lang:ru");
        assert_eq!(json["inline_keyboard"][1][0]["callback_data"], "lang:uz");
        assert!(json["inline_keyboard"][0][0].get("url").is_none());
    }

    #[test]
    fn brand_rows_carry_localized_names() {
        let brands = vec![Brand {
            id: BrandId(3),
            name_ru: "Шевроле".to_string(),
            name_uz: "Chevrolet".to_string(),
        }];
        let keyboard = kb_brands(Lang::Uz, &brands);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "Chevrolet");
        assert_eq!(keyboard.inline_keyboard[0][0].callback_data.as_deref(), Some("brand:3"));
        assert_eq!(keyboard.inline_keyboard[1][0].callback_data.as_deref(), Some("menu:home"));
    }

    #[test]
    fn car_button_shows_model_year_and_price() {
        let cars = vec![Car {
            id: CarId(8),
            brand_id: BrandId(3),
            model: "Cobalt".to_string(),
            year: 2021,
            price: Decimal::new(145_000_000, 0),
            price_category_id: None,
            description_ru: None,
            description_uz: None,
            active: true,
            created_at: Utc::now(),
        }];
        let keyboard = kb_cars(Lang::Ru, &cars);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "🚗 Cobalt • 2021 • 145 000 000 сум");
        assert_eq!(keyboard.inline_keyboard[0][0].callback_data.as_deref(), Some("car:8"));
    }
}
