//! Telegram bot interface for automarket.
//!
//! - **Bot API client** (`api`) - thin HTTPS wrapper plus a recording double
//! - **Updates** (`update`) - webhook payload parsing into bot events
//! - **Keyboards** (`keyboards`) - inline keyboard builders for every screen
//! - **Conversation** (`conversation`) - the sell-my-car questionnaire driver
//! - **Handlers** (`handlers`) - routing of commands, texts and callbacks
//! - **Notify** (`notify`) - best-effort staff notifications for new leads
//!
//! Updates arrive over the webhook served by the HTTP crate; this crate only
//! decides what to answer and through which Bot API calls.

pub mod api;
pub mod conversation;
pub mod handlers;
pub mod keyboards;
pub mod notify;
pub mod update;

pub use api::{ApiCall, ApiError, BotProfile, HttpTelegramApi, RecordingTelegramApi, TelegramApi};
pub use conversation::{ConversationError, SellConversation};
pub use handlers::{BotRouter, RouterError};
pub use keyboards::{InlineButton, InlineKeyboard};
pub use notify::AdminNotifier;
pub use update::{BotEvent, Update};
