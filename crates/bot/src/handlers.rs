//! Update routing.
//!
//! Callback data namespaces:
//! `lang:<code>`, `menu:<screen>`, `brand:<id>`, `car:<id>`,
//! `car_contact:<id>`. Unknown data is answered and dropped.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use automarket_core::domain::catalog::{BrandId, CarDetail, CarId, Manager};
use automarket_core::domain::user::ChatId;
use automarket_core::flows::SellEvent;
use automarket_core::i18n::{text, Lang, MessageKey};
use automarket_core::money::format_price;
use automarket_db::repositories::{CatalogReader, RepositoryError, UserStore};

use crate::api::{ApiError, TelegramApi};
use crate::conversation::{ConversationError, SellConversation};
use crate::keyboards::{
    kb_back, kb_brands, kb_car_actions, kb_cars, kb_lang, kb_main, InlineKeyboard,
};
use crate::update::{BotEvent, Update};

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Storage(#[from] RepositoryError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

pub struct BotRouter {
    api: Arc<dyn TelegramApi>,
    users: Arc<dyn UserStore>,
    catalog: Arc<dyn CatalogReader>,
    conversation: Arc<SellConversation>,
    site_url: String,
}

impl BotRouter {
    pub fn new(
        api: Arc<dyn TelegramApi>,
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogReader>,
        conversation: Arc<SellConversation>,
        site_url: String,
    ) -> Self {
        Self { api, users, catalog, conversation, site_url }
    }

    pub async fn handle_update(&self, update: Update) -> Result<(), RouterError> {
        match update.classify() {
            BotEvent::Command { chat_id, command } => self.handle_command(chat_id, &command).await,
            BotEvent::Text { chat_id, text } => {
                let lang = self.users.lang_or_default(chat_id).await?;
                self.conversation.handle(chat_id, lang, SellEvent::Reply(text)).await?;
                Ok(())
            }
            BotEvent::Callback { chat_id, callback_id, message_id, data } => {
                self.api.answer_callback_query(&callback_id).await?;
                self.handle_callback(chat_id, message_id, &data).await
            }
            BotEvent::Unsupported => Ok(()),
        }
    }

    async fn handle_command(&self, chat_id: ChatId, command: &str) -> Result<(), RouterError> {
        if command != "/start" {
            debug!(chat_id = chat_id.0, command, "ignoring unknown command");
            return Ok(());
        }

        // Registers the user on first contact.
        let lang = self.users.lang_or_default(chat_id).await?;
        self.api
            .send_message(chat_id, text(lang, MessageKey::ChooseLang), Some(kb_lang()))
            .await?;
        Ok(())
    }

    async fn handle_callback(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        data: &str,
    ) -> Result<(), RouterError> {
        let mut lang = self.users.lang_or_default(chat_id).await?;

        if let Some(code) = data.strip_prefix("lang:") {
            lang = Lang::parse_lenient(code);
            self.users.set_lang(chat_id, lang).await?;
            return self.show_menu(chat_id, message_id, lang).await;
        }

        match data {
            "menu:home" => {
                self.conversation.reset(chat_id, lang).await?;
                self.show_menu(chat_id, message_id, lang).await
            }
            "menu:lang" => {
                self.edit_or_send(
                    chat_id,
                    message_id,
                    text(lang, MessageKey::ChooseLang),
                    Some(kb_lang()),
                )
                .await
            }
            "menu:catalog" => self.show_brands(chat_id, message_id, lang).await,
            "menu:managers" => {
                let managers = self.catalog.active_managers().await?;
                self.edit_or_send(
                    chat_id,
                    message_id,
                    &managers_text(lang, &managers),
                    Some(kb_back(lang, "menu:home")),
                )
                .await
            }
            "menu:sell" => {
                self.conversation.handle(chat_id, lang, SellEvent::Start).await?;
                Ok(())
            }
            _ => {
                if let Some(brand_id) = parse_id(data, "brand:") {
                    return self.show_brand_cars(chat_id, message_id, lang, BrandId(brand_id)).await;
                }
                if let Some(car_id) = parse_id(data, "car:") {
                    return self.show_car(chat_id, lang, CarId(car_id)).await;
                }
                if let Some(_car_id) = parse_id(data, "car_contact:") {
                    let managers = self.catalog.active_managers().await?;
                    self.api
                        .send_message(
                            chat_id,
                            &managers_text(lang, &managers),
                            Some(kb_back(lang, "menu:home")),
                        )
                        .await?;
                    return Ok(());
                }
                debug!(chat_id = chat_id.0, data, "ignoring unknown callback data");
                Ok(())
            }
        }
    }

    async fn show_menu(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        lang: Lang,
    ) -> Result<(), RouterError> {
        self.edit_or_send(
            chat_id,
            message_id,
            text(lang, MessageKey::MenuTitle),
            Some(kb_main(lang, &self.site_url)),
        )
        .await
    }

    async fn show_brands(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        lang: Lang,
    ) -> Result<(), RouterError> {
        let brands = self.catalog.brands().await?;
        if brands.is_empty() {
            return self
                .edit_or_send(
                    chat_id,
                    message_id,
                    text(lang, MessageKey::CatalogEmpty),
                    Some(kb_back(lang, "menu:home")),
                )
                .await;
        }

        self.edit_or_send(
            chat_id,
            message_id,
            text(lang, MessageKey::CatalogChooseBrand),
            Some(kb_brands(lang, &brands)),
        )
        .await
    }

    async fn show_brand_cars(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        lang: Lang,
        brand_id: BrandId,
    ) -> Result<(), RouterError> {
        let cars = self.catalog.cars_of_brand(brand_id).await?;
        if cars.is_empty() {
            return self
                .edit_or_send(
                    chat_id,
                    message_id,
                    text(lang, MessageKey::BrandEmpty),
                    Some(kb_back(lang, "menu:catalog")),
                )
                .await;
        }

        self.edit_or_send(
            chat_id,
            message_id,
            text(lang, MessageKey::MenuCatalog),
            Some(kb_cars(lang, &cars)),
        )
        .await
    }

    async fn show_car(
        &self,
        chat_id: ChatId,
        lang: Lang,
        car_id: CarId,
    ) -> Result<(), RouterError> {
        let Some(detail) = self.catalog.car_detail(car_id).await? else {
            debug!(chat_id = chat_id.0, car_id = car_id.0, "callback for missing car");
            return Ok(());
        };

        let card = car_card_text(lang, &detail);
        let keyboard = kb_car_actions(lang, car_id, &self.site_url);

        match detail.photos.first() {
            Some(photo) => {
                let photo_url =
                    format!("{}/{}", self.site_url, photo.file_path.trim_start_matches('/'));
                self.api.send_photo(chat_id, &photo_url, &card, Some(keyboard)).await?;
            }
            None => {
                self.api.send_message(chat_id, &card, Some(keyboard)).await?;
            }
        }
        Ok(())
    }

    async fn edit_or_send(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), RouterError> {
        match message_id {
            Some(message_id) => {
                self.api.edit_message_text(chat_id, message_id, text, keyboard).await?
            }
            None => self.api.send_message(chat_id, text, keyboard).await?,
        }
        Ok(())
    }
}

fn parse_id(data: &str, prefix: &str) -> Option<i64> {
    data.strip_prefix(prefix)?.parse().ok()
}

fn managers_text(lang: Lang, managers: &[Manager]) -> String {
    if managers.is_empty() {
        return text(lang, MessageKey::ManagersEmpty).to_string();
    }

    let mut lines = vec![text(lang, MessageKey::ManagersTitle).to_string()];
    for manager in managers {
        lines.push(format!("👤 <b>{}</b>\n📞 {}", manager.name, manager.phone));
    }
    lines.join("\n\n")
}

fn car_card_text(lang: Lang, detail: &CarDetail) -> String {
    let description =
        detail.car.description(lang).unwrap_or(text(lang, MessageKey::NoDescription));
    format!(
        "🚗 <b>{} {}</b>\n📅 <b>{}:</b> {}\n💰 <b>{}:</b> {}\n🏷️ <b>{}</b>\n\n📝 {}",
        detail.brand_name(lang),
        detail.car.model,
        text(lang, MessageKey::Year),
        detail.car.year,
        text(lang, MessageKey::Price),
        format_price(detail.car.price),
        detail.category_label(lang),
        description,
    )
}
