//! Two-slot chat UI on top of a linear Telegram transcript.
//!
//! Each chat gets at most one live *content* message (edited in place as the
//! member steps through a flow) and one live *keyboard* message carrying the
//! bottom-anchored reply keyboard. Centralizing the edit-or-replace dance
//! here keeps the fallback logic out of every step handler.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, KeyboardMarkup, MessageId, ReplyMarkup};
use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("chat api request failed: {0}")]
pub struct ChatApiError(pub String);

/// The narrow messaging capability the synchronizer needs. Production code
/// wraps the Telegram [`Bot`]; tests use a recording mock.
///
/// Every failure mode of an edit (not found, too old, deleted, rate
/// limited) is reported the same way; callers treat them all as "the
/// message must be recreated".
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId, ChatApiError>;

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), ChatApiError>;

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), ChatApiError>;
}

/// [`ChatApi`] backed by the Telegram Bot API.
pub struct TelegramChat {
    bot: Bot,
}

impl TelegramChat {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatApi for TelegramChat {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId, ChatApiError> {
        let request = self.bot.send_message(chat, text);
        let sent = match markup {
            Some(markup) => request.reply_markup(markup).await,
            None => request.await,
        }
        .map_err(|err| ChatApiError(err.to_string()))?;
        Ok(sent.id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), ChatApiError> {
        let request = self.bot.edit_message_text(chat, message, text);
        let result = match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await,
            None => request.await,
        };
        match result {
            Ok(_) => Ok(()),
            // Identical content leaves a perfectly good message behind; no
            // reason to recreate it.
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(err) => Err(ChatApiError(err.to_string())),
        }
    }

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), ChatApiError> {
        self.bot
            .delete_message(chat, message)
            .await
            .map(|_| ())
            .map_err(|err| ChatApiError(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct UiSlots {
    content: Option<MessageId>,
    keyboard: Option<MessageId>,
}

/// Per-chat synchronizer for the content and keyboard message slots.
///
/// Tracked ids are mutated only while handling that chat's current update,
/// so the map lock is held for field access only, never across an await.
pub struct ChatScreen<A> {
    api: A,
    slots: Mutex<HashMap<ChatId, UiSlots>>,
}

impl<A: ChatApi> ChatScreen<A> {
    pub fn new(api: A) -> Self {
        Self { api, slots: Mutex::new(HashMap::new()) }
    }

    fn slot(&self, chat: ChatId) -> UiSlots {
        self.slots.lock().unwrap().get(&chat).copied().unwrap_or_default()
    }

    /// Drops any previously tracked messages (best effort) and sends a fresh
    /// content placeholder plus the reply-keyboard message, recording both
    /// ids. Called whenever a member (re)enters the top-level menu.
    pub async fn init(
        &self,
        chat: ChatId,
        content_text: &str,
        nav_text: &str,
        nav: KeyboardMarkup,
    ) -> Result<(), ChatApiError> {
        let old = self.slots.lock().unwrap().remove(&chat).unwrap_or_default();
        for id in [old.content, old.keyboard].into_iter().flatten() {
            self.discard(chat, id).await;
        }

        let content = self.api.send_text(chat, content_text, None).await?;
        let keyboard = self
            .api
            .send_text(chat, nav_text, Some(ReplyMarkup::Keyboard(nav)))
            .await?;
        self.slots
            .lock()
            .unwrap()
            .insert(chat, UiSlots { content: Some(content), keyboard: Some(keyboard) });
        Ok(())
    }

    /// Edits the tracked content message in place. On any edit failure the
    /// stale message is discarded and a fresh one sent in its place; only a
    /// failure of that follow-up send reaches the caller.
    pub async fn update_content(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), ChatApiError> {
        if let Some(id) = self.slot(chat).content {
            match self.api.edit_text(chat, id, text, keyboard.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    debug!(chat = chat.0, msg_id = id.0, %err, "content edit failed, replacing");
                    self.discard(chat, id).await;
                }
            }
        }

        let markup = keyboard.map(ReplyMarkup::InlineKeyboard);
        let new_id = self.api.send_text(chat, text, markup).await?;
        self.slots.lock().unwrap().entry(chat).or_default().content = Some(new_id);
        Ok(())
    }

    /// Swaps the reply keyboard, e.g. when registration unlocks the full
    /// menu. Reply keyboards cannot be edited in place, so the tracked
    /// message is always replaced.
    pub async fn update_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        nav: KeyboardMarkup,
    ) -> Result<(), ChatApiError> {
        if let Some(id) = self.slot(chat).keyboard {
            self.discard(chat, id).await;
        }
        let new_id = self
            .api
            .send_text(chat, text, Some(ReplyMarkup::Keyboard(nav)))
            .await?;
        self.slots.lock().unwrap().entry(chat).or_default().keyboard = Some(new_id);
        Ok(())
    }

    /// Best-effort deletion of both tracked messages; the ids are cleared
    /// regardless of the outcome.
    pub async fn cleanup(&self, chat: ChatId) {
        let old = self.slots.lock().unwrap().remove(&chat).unwrap_or_default();
        for id in [old.content, old.keyboard].into_iter().flatten() {
            self.discard(chat, id).await;
        }
    }

    /// Best-effort deletion of an inbound user message, keeping the visible
    /// transcript down to the two managed messages.
    pub async fn delete_user_message(&self, chat: ChatId, message: MessageId) {
        self.discard(chat, message).await;
    }

    async fn discard(&self, chat: ChatId, message: MessageId) {
        if let Err(err) = self.api.delete(chat, message).await {
            debug!(chat = chat.0, msg_id = message.0, %err, "message delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use teloxide::types::KeyboardButton;

    const CHAT: ChatId = ChatId(42);

    #[derive(Clone, Default)]
    struct RecordingApi {
        state: Arc<Mutex<MockState>>,
    }

    #[derive(Default)]
    struct MockState {
        next_id: i32,
        fail_edits: bool,
        messages: Vec<MockMessage>,
    }

    #[derive(Clone)]
    struct MockMessage {
        id: i32,
        text: String,
        deleted: bool,
    }

    impl RecordingApi {
        fn fail_edits(&self, fail: bool) {
            self.state.lock().unwrap().fail_edits = fail;
        }

        fn live(&self) -> Vec<MockMessage> {
            self.state
                .lock()
                .unwrap()
                .messages
                .iter()
                .filter(|m| !m.deleted)
                .cloned()
                .collect()
        }

        fn text_of(&self, id: MessageId) -> Option<String> {
            self.state
                .lock()
                .unwrap()
                .messages
                .iter()
                .find(|m| m.id == id.0 && !m.deleted)
                .map(|m| m.text.clone())
        }

        fn total_sent(&self) -> usize {
            self.state.lock().unwrap().messages.len()
        }
    }

    #[async_trait]
    impl ChatApi for RecordingApi {
        async fn send_text(
            &self,
            _chat: ChatId,
            text: &str,
            _markup: Option<ReplyMarkup>,
        ) -> Result<MessageId, ChatApiError> {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.messages.push(MockMessage { id, text: text.to_string(), deleted: false });
            Ok(MessageId(id))
        }

        async fn edit_text(
            &self,
            _chat: ChatId,
            message: MessageId,
            text: &str,
            _keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<(), ChatApiError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_edits {
                return Err(ChatApiError("edit refused".into()));
            }
            match state.messages.iter_mut().find(|m| m.id == message.0 && !m.deleted) {
                Some(found) => {
                    found.text = text.to_string();
                    Ok(())
                }
                None => Err(ChatApiError("message to edit not found".into())),
            }
        }

        async fn delete(&self, _chat: ChatId, message: MessageId) -> Result<(), ChatApiError> {
            let mut state = self.state.lock().unwrap();
            match state.messages.iter_mut().find(|m| m.id == message.0 && !m.deleted) {
                Some(found) => {
                    found.deleted = true;
                    Ok(())
                }
                None => Err(ChatApiError("message to delete not found".into())),
            }
        }
    }

    fn screen() -> (ChatScreen<RecordingApi>, RecordingApi) {
        let api = RecordingApi::default();
        (ChatScreen::new(api.clone()), api)
    }

    fn nav() -> KeyboardMarkup {
        KeyboardMarkup::new(vec![vec![KeyboardButton::new("Menu")]])
    }

    #[tokio::test]
    async fn init_tracks_two_distinct_messages() {
        let (screen, api) = screen();
        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();

        let slots = screen.slot(CHAT);
        let content = slots.content.unwrap();
        let keyboard = slots.keyboard.unwrap();
        assert_ne!(content, keyboard);
        assert_eq!(api.live().len(), 2);
    }

    #[tokio::test]
    async fn reinit_discards_previous_messages() {
        let (screen, api) = screen();
        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();
        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();

        assert_eq!(api.total_sent(), 4);
        assert_eq!(api.live().len(), 2);
    }

    #[tokio::test]
    async fn update_content_edits_in_place() {
        let (screen, api) = screen();
        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();
        let before = screen.slot(CHAT).content.unwrap();

        screen.update_content(CHAT, "Step 1", None).await.unwrap();

        let after = screen.slot(CHAT).content.unwrap();
        assert_eq!(before, after);
        assert_eq!(api.total_sent(), 2, "no new message was sent");
        assert_eq!(api.text_of(after).as_deref(), Some("Step 1"));
    }

    #[tokio::test]
    async fn update_content_falls_back_to_send_on_edit_failure() {
        let (screen, api) = screen();
        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();
        let before = screen.slot(CHAT).content.unwrap();

        api.fail_edits(true);
        screen.update_content(CHAT, "Step 2", None).await.unwrap();

        let after = screen.slot(CHAT).content.unwrap();
        assert_ne!(before, after);
        assert!(api.text_of(before).is_none(), "stale content message was discarded");
        assert_eq!(api.text_of(after).as_deref(), Some("Step 2"));
        // Content slot invariant: the keyboard message plus exactly one
        // content message remain live.
        assert_eq!(api.live().len(), 2);
    }

    #[tokio::test]
    async fn update_content_without_tracked_message_sends_new() {
        let (screen, api) = screen();
        screen.update_content(CHAT, "Hello", None).await.unwrap();

        assert!(screen.slot(CHAT).content.is_some());
        assert_eq!(api.live().len(), 1);
    }

    #[tokio::test]
    async fn update_keyboard_replaces_tracked_message() {
        let (screen, api) = screen();
        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();
        let before = screen.slot(CHAT).keyboard.unwrap();

        screen.update_keyboard(CHAT, "Menu", nav()).await.unwrap();

        let after = screen.slot(CHAT).keyboard.unwrap();
        assert_ne!(before, after);
        assert!(api.text_of(before).is_none());
        assert_eq!(api.live().len(), 2);
    }

    #[tokio::test]
    async fn cleanup_deletes_and_clears_both_slots() {
        let (screen, api) = screen();
        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();

        screen.cleanup(CHAT).await;

        let slots = screen.slot(CHAT);
        assert!(slots.content.is_none());
        assert!(slots.keyboard.is_none());
        assert!(api.live().is_empty());
    }

    #[tokio::test]
    async fn delete_user_message_swallows_failures() {
        let (screen, _api) = screen();
        // Nothing with this id exists; the failure must not surface.
        screen.delete_user_message(CHAT, MessageId(999)).await;
    }

    #[tokio::test]
    async fn full_session_flow() {
        let (screen, api) = screen();

        screen.init(CHAT, "Loading...", "Menu", nav()).await.unwrap();
        let slots = screen.slot(CHAT);
        let first_content = slots.content.unwrap();
        assert_ne!(first_content, slots.keyboard.unwrap());

        screen.update_content(CHAT, "Step 1", None).await.unwrap();
        assert_eq!(screen.slot(CHAT).content.unwrap(), first_content);

        api.fail_edits(true);
        screen.update_content(CHAT, "Step 2", None).await.unwrap();
        let second_content = screen.slot(CHAT).content.unwrap();
        assert_ne!(second_content, first_content);
        let live = api.live();
        assert_eq!(live.len(), 2);
        assert!(live.iter().any(|m| m.text == "Step 2"));

        screen.cleanup(CHAT).await;
        let slots = screen.slot(CHAT);
        assert!(slots.content.is_none() && slots.keyboard.is_none());
        assert!(api.live().is_empty());
    }
}
