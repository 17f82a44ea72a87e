//! Bilingual message table for the bot surface.
//!
//! Every user-visible bot string lives here, keyed by [`MessageKey`] and
//! resolved per [`Lang`]. `text` is total over the key set; `lookup` is the
//! dynamic variant for wire-level keys and echoes unknown keys back.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ru,
    Uz,
}

impl Lang {
    /// Lenient parse: `uz` selects Uzbek, anything else falls back to Russian.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("uz") {
            Self::Uz
        } else {
            Self::Ru
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::Uz => "uz",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    ChooseLang,
    MenuTitle,
    MenuCatalog,
    MenuManagers,
    MenuSell,
    MenuSite,
    Back,
    CatalogChooseBrand,
    CatalogEmpty,
    BrandEmpty,
    CarContact,
    ManagersTitle,
    ManagersEmpty,
    SellIntro,
    AskBrand,
    AskModel,
    AskYear,
    AskColor,
    AskPrice,
    AskCondition,
    AskName,
    AskPhone,
    SellDone,
    InvalidPhone,
    SellSaveFailed,
    OpenSite,
    Price,
    Year,
    NoDescription,
}

impl MessageKey {
    pub fn wire_key(self) -> &'static str {
        match self {
            Self::ChooseLang => "choose_lang",
            Self::MenuTitle => "menu_title",
            Self::MenuCatalog => "menu_catalog",
            Self::MenuManagers => "menu_managers",
            Self::MenuSell => "menu_sell",
            Self::MenuSite => "menu_site",
            Self::Back => "back",
            Self::CatalogChooseBrand => "catalog_choose_brand",
            Self::CatalogEmpty => "catalog_empty",
            Self::BrandEmpty => "brand_empty",
            Self::CarContact => "car_contact",
            Self::ManagersTitle => "managers_title",
            Self::ManagersEmpty => "managers_empty",
            Self::SellIntro => "sell_intro",
            Self::AskBrand => "sell_q_brand",
            Self::AskModel => "sell_q_model",
            Self::AskYear => "sell_q_year",
            Self::AskColor => "sell_q_color",
            Self::AskPrice => "sell_q_price",
            Self::AskCondition => "sell_q_condition",
            Self::AskName => "sell_q_name",
            Self::AskPhone => "sell_q_phone",
            Self::SellDone => "sell_done",
            Self::InvalidPhone => "invalid_phone",
            Self::SellSaveFailed => "sell_save_failed",
            Self::OpenSite => "open_site",
            Self::Price => "price",
            Self::Year => "year",
            Self::NoDescription => "no_desc",
        }
    }

    pub fn from_wire_key(raw: &str) -> Option<Self> {
        ALL_KEYS.iter().copied().find(|key| key.wire_key() == raw)
    }
}

const ALL_KEYS: &[MessageKey] = &[
    MessageKey::ChooseLang,
    MessageKey::MenuTitle,
    MessageKey::MenuCatalog,
    MessageKey::MenuManagers,
    MessageKey::MenuSell,
    MessageKey::MenuSite,
    MessageKey::Back,
    MessageKey::CatalogChooseBrand,
    MessageKey::CatalogEmpty,
    MessageKey::BrandEmpty,
    MessageKey::CarContact,
    MessageKey::ManagersTitle,
    MessageKey::ManagersEmpty,
    MessageKey::SellIntro,
    MessageKey::AskBrand,
    MessageKey::AskModel,
    MessageKey::AskYear,
    MessageKey::AskColor,
    MessageKey::AskPrice,
    MessageKey::AskCondition,
    MessageKey::AskName,
    MessageKey::AskPhone,
    MessageKey::SellDone,
    MessageKey::InvalidPhone,
    MessageKey::SellSaveFailed,
    MessageKey::OpenSite,
    MessageKey::Price,
    MessageKey::Year,
    MessageKey::NoDescription,
];

pub fn text(lang: Lang, key: MessageKey) -> &'static str {
    let (ru, uz) = strings(key);
    match lang {
        Lang::Ru => ru,
        Lang::Uz => uz,
    }
}

/// Resolve a raw wire key; unknown keys echo back unchanged.
pub fn lookup(lang: Lang, raw_key: &str) -> String {
    match MessageKey::from_wire_key(raw_key) {
        Some(key) => text(lang, key).to_string(),
        None => raw_key.to_string(),
    }
}

fn strings(key: MessageKey) -> (&'static str, &'static str) {
    match key {
        MessageKey::ChooseLang => {
            ("🌐 Выберите язык / Tilni tanlang", "🌐 Tilni tanlang / Выберите язык")
        }
        MessageKey::MenuTitle => ("✨ Главное меню", "✨ Asosiy menyu"),
        MessageKey::MenuCatalog => ("🚗 Каталог авто", "🚗 Avto katalogi"),
        MessageKey::MenuManagers => ("📞 Менеджеры", "📞 Menejerlar"),
        MessageKey::MenuSell => ("📝 Продать авто", "📝 Avto sotish"),
        MessageKey::MenuSite => ("🌐 Открыть сайт", "🌐 Saytni ochish"),
        MessageKey::Back => ("⬅️ Назад", "⬅️ Orqaga"),
        MessageKey::CatalogChooseBrand => ("🏷️ Выберите бренд:", "🏷️ Brendni tanlang:"),
        MessageKey::CatalogEmpty => {
            ("Пока нет активных объявлений 😔", "Hozircha faol e'lonlar yo‘q 😔")
        }
        MessageKey::BrandEmpty => {
            ("По этому бренду пока нет авто 🙌", "Bu brend bo‘yicha hozircha avto yo‘q 🙌")
        }
        MessageKey::CarContact => {
            ("📞 Связаться с менеджером", "📞 Menejer bilan bog‘lanish")
        }
        MessageKey::ManagersTitle => ("👥 Активные менеджеры:", "👥 Faol menejerlar:"),
        MessageKey::ManagersEmpty => {
            ("Активных менеджеров пока нет.", "Hozircha faol menejerlar yo‘q.")
        }
        MessageKey::SellIntro => (
            "📝 Давайте оформим заявку на продажу авто.\nОтвечайте по шагам.",
            "📝 Avto sotish uchun ariza to‘ldiramiz.\nBosqichma-bosqich javob bering.",
        ),
        MessageKey::AskBrand => (
            "🏷️ Марка авто (например: Chevrolet):",
            "🏷️ Avto markasi (masalan: Chevrolet):",
        ),
        MessageKey::AskModel => {
            ("🚙 Модель авто (например: Cobalt):", "🚙 Avto modeli (masalan: Cobalt):")
        }
        MessageKey::AskYear => (
            "📅 Год выпуска (например: 2020):",
            "📅 Ishlab chiqarilgan yil (masalan: 2020):",
        ),
        MessageKey::AskColor => ("🎨 Цвет:", "🎨 Rangi:"),
        MessageKey::AskPrice => ("💰 Какую цену хотите?", "💰 Qancha narx xohlaysiz?"),
        MessageKey::AskCondition => (
            "🧰 Состояние (например: отличное/среднее/требует ремонта):",
            "🧰 Holati (masalan: zo‘r/o‘rtacha/ta'mir kerak):",
        ),
        MessageKey::AskName => ("👤 Ваше имя:", "👤 Ismingiz:"),
        MessageKey::AskPhone => (
            "📞 Ваш номер телефона (например: +998901234567):",
            "📞 Telefon raqamingiz (masalan: +998901234567):",
        ),
        MessageKey::SellDone => (
            "✅ Заявка принята! Менеджер свяжется с вами в ближайшее время.",
            "✅ Ariza qabul qilindi! Tez orada menejer bog‘lanadi.",
        ),
        MessageKey::InvalidPhone => (
            "Номер выглядит некорректно. Пример: +998901234567",
            "Raqam noto‘g‘ri ko‘rinadi. Masalan: +998901234567",
        ),
        MessageKey::SellSaveFailed => (
            "⚠️ Не удалось сохранить заявку. Отправьте номер ещё раз.",
            "⚠️ Arizani saqlab bo‘lmadi. Raqamni yana yuboring.",
        ),
        MessageKey::OpenSite => ("Открыть сайт", "Saytni ochish"),
        MessageKey::Price => ("Цена", "Narx"),
        MessageKey::Year => ("Год", "Yil"),
        MessageKey::NoDescription => ("Описание отсутствует.", "Tavsif yo‘q."),
    }
}

#[cfg(test)]
mod tests {
    use super::{lookup, text, Lang, MessageKey, ALL_KEYS};

    #[test]
    fn lang_parse_is_lenient() {
        assert_eq!(Lang::parse_lenient("uz"), Lang::Uz);
        assert_eq!(Lang::parse_lenient(" UZ "), Lang::Uz);
        assert_eq!(Lang::parse_lenient("ru"), Lang::Ru);
        assert_eq!(Lang::parse_lenient("en"), Lang::Ru);
        assert_eq!(Lang::parse_lenient(""), Lang::Ru);
    }

    #[test]
    fn every_key_has_distinct_wire_key_and_non_empty_text() {
        for key in ALL_KEYS {
            assert!(!text(Lang::Ru, *key).is_empty());
            assert!(!text(Lang::Uz, *key).is_empty());
            assert_eq!(MessageKey::from_wire_key(key.wire_key()), Some(*key));
        }
    }

    #[test]
    fn lookup_resolves_known_keys() {
        assert_eq!(lookup(Lang::Ru, "menu_title"), "✨ Главное меню");
        assert_eq!(lookup(Lang::Uz, "menu_title"), "✨ Asosiy menyu");
    }

    #[test]
    fn lookup_echoes_unknown_keys() {
        assert_eq!(lookup(Lang::Ru, "not_a_key"), "not_a_key");
    }
}
