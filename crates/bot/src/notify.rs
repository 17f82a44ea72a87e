use std::sync::Arc;

use tracing::warn;

use automarket_core::domain::lead::{LeadDraft, SellLead};
use automarket_core::domain::user::ChatId;

use crate::api::TelegramApi;

/// Best-effort staff notifications. A failed delivery is logged and swallowed
/// so the customer flow never stalls on an admin chat being unreachable.
pub struct AdminNotifier {
    api: Arc<dyn TelegramApi>,
    admin_chat_ids: Vec<i64>,
    leads_url: String,
}

impl AdminNotifier {
    pub fn new(api: Arc<dyn TelegramApi>, admin_chat_ids: Vec<i64>, leads_url: String) -> Self {
        Self { api, admin_chat_ids, leads_url }
    }

    pub async fn lead_captured(&self, draft: &LeadDraft) {
        let text = SellLead::notification_text(draft, &self.leads_url);
        for &chat_id in &self.admin_chat_ids {
            if let Err(error) = self.api.send_message(ChatId(chat_id), &text, None).await {
                warn!(admin_chat_id = chat_id, error = %error, "failed to notify admin about lead");
            }
        }
    }
}
