use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;

use automarket_core::domain::user::ChatId;

use crate::keyboards::InlineKeyboard;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("telegram transport error: {0}")]
    Transport(String),
    #[error("telegram rejected the call: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BotProfile {
    pub id: i64,
    pub username: String,
}

/// Outgoing Bot API surface. Handlers depend on this trait so tests can run
/// against the recording double instead of the network.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError>;

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError>;

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), ApiError>;

    async fn set_webhook(&self, url: &str) -> Result<(), ApiError>;

    async fn delete_webhook(&self) -> Result<(), ApiError>;

    async fn get_me(&self) -> Result<BotProfile, ApiError>;
}

/// HTTPS client against `api.telegram.org`. Every text goes out with HTML
/// parse mode, matching how the message table is written.
pub struct HttpTelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTelegramApi {
    pub fn new(bot_token: &SecretString) -> Self {
        Self::with_api_root(bot_token, "https://api.telegram.org")
    }

    pub fn with_api_root(bot_token: &SecretString, api_root: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/bot{}", api_root.trim_end_matches('/'), bot_token.expose_secret()),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T, ApiError> {
        let url = format!("{}/{method}", self.base_url);
        let response = self.client.post(&url).json(&payload).send().await?;
        let body: ApiResponse<T> = response.json().await?;

        if !body.ok {
            return Err(ApiError::Rejected(
                body.description.unwrap_or_else(|| format!("{method} failed without description")),
            ));
        }
        body.result.ok_or_else(|| ApiError::Rejected(format!("{method} returned no result")))
    }
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "Option::default")]
    result: Option<T>,
}

#[async_trait]
impl TelegramApi for HttpTelegramApi {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError> {
        let mut payload = json!({
            "chat_id": chat_id.0,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|error| ApiError::Transport(error.to_string()))?;
        }

        self.call::<Value>("sendMessage", payload).await.map(|_| ())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError> {
        let mut payload = json!({
            "chat_id": chat_id.0,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|error| ApiError::Transport(error.to_string()))?;
        }

        self.call::<Value>("editMessageText", payload).await.map(|_| ())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError> {
        let mut payload = json!({
            "chat_id": chat_id.0,
            "photo": photo_url,
            "caption": caption,
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|error| ApiError::Transport(error.to_string()))?;
        }

        self.call::<Value>("sendPhoto", payload).await.map(|_| ())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), ApiError> {
        self.call::<Value>(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_query_id }),
        )
        .await
        .map(|_| ())
    }

    async fn set_webhook(&self, url: &str) -> Result<(), ApiError> {
        self.call::<Value>("setWebhook", json!({ "url": url })).await.map(|_| ())
    }

    async fn delete_webhook(&self) -> Result<(), ApiError> {
        self.call::<Value>("deleteWebhook", json!({})).await.map(|_| ())
    }

    async fn get_me(&self) -> Result<BotProfile, ApiError> {
        self.call("getMe", json!({})).await
    }
}

/// Every outgoing call a test double observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    Message { chat_id: i64, text: String, keyboard: Option<InlineKeyboard> },
    Edit { chat_id: i64, message_id: i64, text: String, keyboard: Option<InlineKeyboard> },
    Photo { chat_id: i64, photo_url: String, caption: String, keyboard: Option<InlineKeyboard> },
    CallbackAnswered(String),
    WebhookSet(String),
    WebhookDeleted,
}

#[derive(Default)]
pub struct RecordingTelegramApi {
    calls: Mutex<Vec<ApiCall>>,
}

impl RecordingTelegramApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().await.clone()
    }

    /// Texts of plain messages sent to one chat, in order.
    pub async fn texts_for(&self, chat_id: ChatId) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                ApiCall::Message { chat_id: target, text, .. } if *target == chat_id.0 => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TelegramApi for RecordingTelegramApi {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError> {
        self.calls.lock().await.push(ApiCall::Message {
            chat_id: chat_id.0,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError> {
        self.calls.lock().await.push(ApiCall::Edit {
            chat_id: chat_id.0,
            message_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), ApiError> {
        self.calls.lock().await.push(ApiCall::Photo {
            chat_id: chat_id.0,
            photo_url: photo_url.to_string(),
            caption: caption.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), ApiError> {
        self.calls.lock().await.push(ApiCall::CallbackAnswered(callback_query_id.to_string()));
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> Result<(), ApiError> {
        self.calls.lock().await.push(ApiCall::WebhookSet(url.to_string()));
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), ApiError> {
        self.calls.lock().await.push(ApiCall::WebhookDeleted);
        Ok(())
    }

    async fn get_me(&self) -> Result<BotProfile, ApiError> {
        Ok(BotProfile { id: 42, username: "automarket_demo_bot".to_string() })
    }
}
