//! Driver for the sell-my-car questionnaire.
//!
//! The pure transition function decides what happens; this module supplies
//! the side effects around it: loading and persisting the per-chat session,
//! inserting the finished lead, messaging the customer, and pinging staff.
//! The lead is written before the session is cleared, so a storage failure
//! leaves the questionnaire waiting at the phone step for another attempt.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use automarket_core::domain::user::ChatId;
use automarket_core::flows::{transition, SellEffect, SellEvent, SellSession};
use automarket_core::i18n::{text, Lang, MessageKey};
use automarket_db::repositories::{LeadStore, RepositoryError, SessionStore};

use crate::api::{ApiError, TelegramApi};
use crate::keyboards::kb_main;
use crate::notify::AdminNotifier;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Storage(#[from] RepositoryError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct SellConversation {
    sessions: Arc<dyn SessionStore>,
    leads: Arc<dyn LeadStore>,
    api: Arc<dyn TelegramApi>,
    notifier: Arc<AdminNotifier>,
    site_url: String,
    // One lock per chat keeps a user's updates strictly ordered even when
    // Telegram delivers them concurrently.
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SellConversation {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        leads: Arc<dyn LeadStore>,
        api: Arc<dyn TelegramApi>,
        notifier: Arc<AdminNotifier>,
        site_url: String,
    ) -> Self {
        Self { sessions, leads, api, notifier, site_url, locks: Mutex::new(HashMap::new()) }
    }

    pub async fn handle(
        &self,
        chat_id: ChatId,
        lang: Lang,
        event: SellEvent,
    ) -> Result<(), ConversationError> {
        let lock = self.chat_lock(chat_id).await;
        let _guard = lock.lock().await;

        let mut session =
            self.sessions.get(chat_id).await?.unwrap_or_else(|| SellSession::idle(lang));
        // The language picker may have been used mid-questionnaire.
        session.lang = lang;

        let (next, effects) = transition(session, event);

        let completed = effects.iter().find_map(|effect| match effect {
            SellEffect::CompleteLead(draft) => Some(draft.clone()),
            SellEffect::Say(_) => None,
        });

        if let Some(draft) = completed {
            match self.leads.insert(&draft).await {
                Ok(lead_id) => {
                    self.sessions.put(chat_id, &next).await?;
                    info!(chat_id = chat_id.0, lead_id = lead_id.0, "sell lead captured");
                    self.notifier.lead_captured(&draft).await;
                }
                Err(error) => {
                    warn!(chat_id = chat_id.0, error = %error, "failed to store sell lead");
                    self.api
                        .send_message(chat_id, text(lang, MessageKey::SellSaveFailed), None)
                        .await?;
                    return Ok(());
                }
            }
        } else {
            self.sessions.put(chat_id, &next).await?;
        }

        for effect in &effects {
            if let SellEffect::Say(key) = effect {
                let keyboard = (*key == MessageKey::MenuTitle)
                    .then(|| kb_main(lang, &self.site_url));
                self.api.send_message(chat_id, text(lang, *key), keyboard).await?;
            }
        }

        Ok(())
    }

    /// Drops any in-flight questionnaire without messaging the user. The
    /// caller renders whatever screen replaces it.
    pub async fn reset(&self, chat_id: ChatId, lang: Lang) -> Result<(), ConversationError> {
        let lock = self.chat_lock(chat_id).await;
        let _guard = lock.lock().await;

        self.sessions.put(chat_id, &SellSession::idle(lang)).await?;
        Ok(())
    }

    async fn chat_lock(&self, chat_id: ChatId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(chat_id.0).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}
