//! Webhook payload parsing.
//!
//! Telegram posts one `Update` per webhook call. Only private-chat text
//! messages, `/start`, and inline-keyboard callbacks matter here; everything
//! else classifies as `Unsupported` and is dropped by the router.

use serde::Deserialize;

use automarket_core::domain::user::ChatId;

#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotEvent {
    Command { chat_id: ChatId, command: String },
    Text { chat_id: ChatId, text: String },
    Callback { chat_id: ChatId, callback_id: String, message_id: Option<i64>, data: String },
    Unsupported,
}

impl Update {
    pub fn classify(self) -> BotEvent {
        if let Some(callback) = self.callback_query {
            let Some(data) = callback.data else {
                return BotEvent::Unsupported;
            };
            let chat_id = callback
                .message
                .as_ref()
                .map(|message| message.chat.id)
                .unwrap_or(callback.from.id);
            return BotEvent::Callback {
                chat_id: ChatId(chat_id),
                callback_id: callback.id,
                message_id: callback.message.map(|message| message.message_id),
                data,
            };
        }

        if let Some(message) = self.message {
            let Some(text) = message.text else {
                return BotEvent::Unsupported;
            };
            let chat_id = ChatId(message.chat.id);
            if let Some(command) = parse_command(&text) {
                return BotEvent::Command { chat_id, command };
            }
            return BotEvent::Text { chat_id, text };
        }

        BotEvent::Unsupported
    }
}

/// First token of a `/command`, with any `@botname` suffix stripped.
fn parse_command(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let token = trimmed.split_whitespace().next().unwrap_or(trimmed);
    let command = token.split('@').next().unwrap_or(token);
    Some(command.to_string())
}

#[cfg(test)]
mod tests {
    use automarket_core::domain::user::ChatId;

    use super::{BotEvent, Update};

    fn parse(json: &str) -> Update {
        serde_json::from_str(json).expect("valid update payload")
    }

    #[test]
    fn start_command_classifies_with_bot_suffix_stripped() {
        let update = parse(
            r#"{"update_id":1,"message":{"message_id":10,"chat":{"id":555},"text":"/start@automarket_bot"}}"#,
        );
        assert_eq!(
            update.classify(),
            BotEvent::Command { chat_id: ChatId(555), command: "/start".to_string() },
        );
    }

    #[test]
    fn plain_text_classifies_as_reply() {
        let update = parse(
            r#"{"update_id":2,"message":{"message_id":11,"chat":{"id":555},"text":"Cobalt"}}"#,
        );
        assert_eq!(
            update.classify(),
            BotEvent::Text { chat_id: ChatId(555), text: "Cobalt".to_string() },
        );
    }

    #[test]
    fn callback_carries_chat_and_message_of_the_pressed_keyboard() {
        let update = parse(
            r#"{"update_id":3,"callback_query":{"id":"cb-7","from":{"id":999},
                "message":{"message_id":12,"chat":{"id":555}},"data":"menu:catalog"}}"#,
        );
        assert_eq!(
            update.classify(),
            BotEvent::Callback {
                chat_id: ChatId(555),
                callback_id: "cb-7".to_string(),
                message_id: Some(12),
                data: "menu:catalog".to_string(),
            },
        );
    }

    #[test]
    fn callback_without_message_falls_back_to_sender_chat() {
        let update = parse(
            r#"{"update_id":4,"callback_query":{"id":"cb-8","from":{"id":999},"data":"menu:home"}}"#,
        );
        match update.classify() {
            BotEvent::Callback { chat_id, message_id, .. } => {
                assert_eq!(chat_id, ChatId(999));
                assert_eq!(message_id, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn stickers_and_joins_are_unsupported() {
        let update =
            parse(r#"{"update_id":5,"message":{"message_id":13,"chat":{"id":555}}}"#);
        assert_eq!(update.classify(), BotEvent::Unsupported);

        let update = parse(r#"{"update_id":6}"#);
        assert_eq!(update.classify(), BotEvent::Unsupported);
    }
}
