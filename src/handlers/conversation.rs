//! Conversation manager
//!
//! Drives the per-chat webhook flows: menu selections start a flow, free text
//! is validated against the current step, and the final step dispatches one
//! call to the remote webhook gateway. Every outcome, including every remote
//! failure, becomes a [`Reply`]; nothing here fails towards the transport.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, info, warn};
use crate::i18n::{I18n, TranslationParams};
use crate::services::{DeleteOutcome, ServiceFactory, WebhookInfo};
use crate::state::{Flow, ScenarioManager, StateStorage, Transition, WebhookRequest};
use crate::utils::errors::ConversationError;
use crate::utils::helpers::{format_timestamp, mask_token, truncate_text};
use crate::utils::logging::{log_gateway_call, log_user_action};
use super::keyboards::{self, callback_data};

/// Remote error descriptions are cut to this many characters in replies
const MAX_DETAIL_CHARS: usize = 300;

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    SetWebhook,
    DeleteWebhook,
    WebhookInfo,
    Support,
    About,
}

impl MenuAction {
    /// Parse the callback data attached to a main menu button
    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            callback_data::SET_WEBHOOK => Some(MenuAction::SetWebhook),
            callback_data::DELETE_WEBHOOK => Some(MenuAction::DeleteWebhook),
            callback_data::INFO_WEBHOOK => Some(MenuAction::WebhookInfo),
            callback_data::SUPPORT_US => Some(MenuAction::Support),
            callback_data::ABOUT_BOT => Some(MenuAction::About),
            _ => None,
        }
    }

    pub fn callback_data(&self) -> &'static str {
        match self {
            MenuAction::SetWebhook => callback_data::SET_WEBHOOK,
            MenuAction::DeleteWebhook => callback_data::DELETE_WEBHOOK,
            MenuAction::WebhookInfo => callback_data::INFO_WEBHOOK,
            MenuAction::Support => callback_data::SUPPORT_US,
            MenuAction::About => callback_data::ABOUT_BOT,
        }
    }

    /// The flow this entry starts; informational entries start none
    pub fn flow(&self) -> Option<Flow> {
        match self {
            MenuAction::SetWebhook => Some(Flow::SetWebhook),
            MenuAction::DeleteWebhook => Some(Flow::DeleteWebhook),
            MenuAction::WebhookInfo => Some(Flow::GetInfo),
            MenuAction::Support | MenuAction::About => None,
        }
    }
}

/// A message to send back to the chat
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Message text, or the photo caption when `photo` is set
    pub text: String,
    pub photo: Option<Vec<u8>>,
    pub keyboard: Option<InlineKeyboardMarkup>,
    /// The conversation error this reply reports, if any
    pub error: Option<ConversationError>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photo: None,
            keyboard: None,
            error: None,
        }
    }

    pub fn photo(bytes: Vec<u8>, caption: impl Into<String>) -> Self {
        Self {
            photo: Some(bytes),
            ..Self::text(caption)
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    fn with_error(mut self, error: ConversationError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Owns the conversation state of every chat and the flows driving it
#[derive(Clone)]
pub struct ConversationManager {
    storage: StateStorage,
    scenarios: ScenarioManager,
    services: ServiceFactory,
    i18n: Arc<I18n>,
}

impl ConversationManager {
    pub fn new(
        storage: StateStorage,
        scenarios: ScenarioManager,
        services: ServiceFactory,
        i18n: Arc<I18n>,
    ) -> Self {
        Self {
            storage,
            scenarios,
            services,
            i18n,
        }
    }

    pub fn storage(&self) -> &StateStorage {
        &self.storage
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    /// Language to answer a Telegram user in
    pub fn language_for(&self, telegram_lang: Option<&str>) -> String {
        self.i18n.detect_user_language(telegram_lang)
    }

    /// `/start`: discard any form and show the main menu
    pub fn start(&self, chat_id: i64, lang: &str) -> Reply {
        self.storage.delete_context(chat_id);
        log_user_action(chat_id, "start", None);

        Reply::text(self.i18n.t("menu.welcome", lang, None)).with_keyboard(self.menu(lang))
    }

    /// `/cancel`: discard any form, whatever step it is at, without calling the gateway
    pub fn cancel(&self, chat_id: i64, lang: &str) -> Reply {
        let summary = self.storage.load_context(chat_id).summary();
        self.storage.delete_context(chat_id);
        log_user_action(chat_id, "cancel", Some(summary.flow.as_str()));

        Reply::text(self.i18n.t("menu.cancelled", lang, None)).with_keyboard(self.menu(lang))
    }

    /// `/help`
    pub fn help(&self, lang: &str) -> Reply {
        Reply::text(self.i18n.t("menu.help", lang, None))
    }

    /// A main menu button was pressed. Any form in progress is discarded first.
    pub async fn select_menu(&self, chat_id: i64, lang: &str, action: MenuAction) -> Reply {
        log_user_action(chat_id, "menu", Some(action.callback_data()));

        let Some(flow) = action.flow() else {
            self.storage.delete_context(chat_id);
            return match action {
                MenuAction::Support => self.support(lang).await,
                _ => Reply::text(self.i18n.t("menu.about", lang, None)).with_keyboard(self.menu(lang)),
            };
        };

        let prompt_key = self.storage.update(chat_id, |state| {
            state.reset();
            self.scenarios.start_flow(state, flow).map(|step| step.prompt_key)
        });

        match prompt_key {
            Some(key) => Reply::text(self.i18n.t(key, lang, None)),
            None => {
                warn!(chat_id = chat_id, flow = %flow, "No scenario registered for flow");
                self.error_reply(lang, flow, ConversationError::UnknownConversationState)
            }
        }
    }

    /// Free text from the chat, interpreted by the current step
    pub async fn handle_text(&self, chat_id: i64, lang: &str, text: &str) -> Reply {
        debug!(chat_id = chat_id, text_len = text.len(), "Handling text input");

        let (transition, next_prompt) = self.storage.update(chat_id, |state| {
            let transition = self.scenarios.apply_input(state, text);
            let prompt = self.scenarios.current_step(state).map(|step| step.prompt_key);
            (transition, prompt)
        });

        match transition {
            Transition::NoActiveFlow => {
                Reply::text(self.i18n.t("menu.hint", lang, None)).with_keyboard(self.menu(lang))
            }
            Transition::Rejected(error) => self.error_reply(lang, Flow::None, error),
            Transition::Advanced { step } => match next_prompt {
                Some(key) => Reply::text(self.i18n.t(key, lang, None)),
                None => {
                    warn!(chat_id = chat_id, step = %step, "Advanced to a step without a prompt");
                    self.storage.delete_context(chat_id);
                    self.error_reply(lang, Flow::None, ConversationError::UnknownConversationState)
                }
            },
            Transition::Ready { request, generation } => {
                self.dispatch(chat_id, lang, request, generation).await
            }
            Transition::UnknownState { .. } => {
                self.error_reply(lang, Flow::None, ConversationError::UnknownConversationState)
            }
        }
    }

    /// Perform the remote call of a completed form.
    ///
    /// The chat's state is reset when `_reset` goes out of scope, on every path
    /// out of this function including a panic inside the gateway.
    async fn dispatch(&self, chat_id: i64, lang: &str, request: WebhookRequest, generation: u64) -> Reply {
        let _reset = self.storage.reset_guard(chat_id, generation);
        let flow = request.flow();
        let bot = mask_token(request.token());
        let gateway = &self.services.gateway;

        info!(chat_id = chat_id, flow = %flow, bot = %bot, "Dispatching webhook request");
        let started = Instant::now();

        let outcome = match &request {
            WebhookRequest::Set { token, url, drop_pending } => gateway
                .set_webhook(token, url, *drop_pending)
                .await
                .map(|info| self.render_set_result(lang, url, &info)),
            WebhookRequest::Delete { token, drop_pending } => gateway
                .delete_webhook(token, *drop_pending)
                .await
                .map(|outcome| self.render_delete_result(lang, &outcome)),
            WebhookRequest::Info { token } => gateway
                .get_webhook_info(token)
                .await
                .map(|info| self.render_info_result(lang, &info)),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(text) => {
                log_gateway_call(chat_id, flow.as_str(), &bot, duration_ms, Ok(()));
                Reply::text(text).with_keyboard(self.menu(lang))
            }
            Err(error) => {
                log_gateway_call(chat_id, flow.as_str(), &bot, duration_ms, Err(&error.to_string()));
                self.error_reply(lang, flow, ConversationError::from(error))
            }
        }
    }

    async fn support(&self, lang: &str) -> Reply {
        let caption = self.i18n.t("menu.support.caption", lang, None);
        match self.services.banner.load().await {
            Some(bytes) => Reply::photo(bytes, caption),
            None => Reply::text(format!(
                "{}\n{}",
                caption,
                self.i18n.t("menu.support.banner_missing", lang, None)
            )),
        }
    }

    fn menu(&self, lang: &str) -> InlineKeyboardMarkup {
        keyboards::main_menu(&self.i18n, lang)
    }

    /// Localized message for an error; `flow` selects the wording of remote rejections
    fn error_reply(&self, lang: &str, flow: Flow, error: ConversationError) -> Reply {
        let key = error.message_key();
        let text = match &error {
            ConversationError::RateLimited(seconds) => self.i18n.tp(key, lang, i64::from(*seconds), None),
            ConversationError::RemoteRejected(detail) => {
                let key = format!("{}.{}", key, flow.as_str());
                self.i18n.t(&key, lang, Some(&params([("detail", truncate_text(detail, MAX_DETAIL_CHARS))])))
            }
            ConversationError::TransportFailure { detail, .. } | ConversationError::RemoteOther(detail) => {
                self.i18n.t(key, lang, Some(&params([("detail", truncate_text(detail, MAX_DETAIL_CHARS))])))
            }
            _ => self.i18n.t(key, lang, None),
        };

        let reply = Reply::text(text);
        let reply = if matches!(error, ConversationError::UnknownConversationState) {
            reply.with_keyboard(self.menu(lang))
        } else {
            reply
        };
        reply.with_error(error)
    }

    fn render_set_result(&self, lang: &str, requested_url: &str, info: &WebhookInfo) -> String {
        let url = info.registered_url().unwrap_or(requested_url);
        self.i18n.t(
            "results.set_webhook",
            lang,
            Some(&params([
                ("url", url.to_string()),
                ("custom_cert", self.yes_no(lang, info.has_custom_certificate)),
                ("pending", info.pending_update_count.to_string()),
            ])),
        )
    }

    fn render_delete_result(&self, lang: &str, outcome: &DeleteOutcome) -> String {
        let status_key = if outcome.accepted {
            "results.delete_webhook.accepted"
        } else {
            "results.delete_webhook.requested"
        };
        let details = self.i18n.t(
            "results.delete_webhook.details",
            lang,
            Some(&params([
                ("url", self.url_or_none(lang, &outcome.info)),
                ("pending", outcome.info.pending_update_count.to_string()),
            ])),
        );

        format!("{}\n{}", self.i18n.t(status_key, lang, None), details)
    }

    fn render_info_result(&self, lang: &str, info: &WebhookInfo) -> String {
        let mut text = self.i18n.t(
            "results.get_info",
            lang,
            Some(&params([
                ("url", self.url_or_none(lang, info)),
                ("custom_cert", self.yes_no(lang, info.has_custom_certificate)),
                ("pending", info.pending_update_count.to_string()),
            ])),
        );

        if let Some((date, message)) = info.last_error() {
            let last_error = self.i18n.t(
                "results.last_error",
                lang,
                Some(&params([
                    ("message", message.to_string()),
                    ("epoch", date.timestamp().to_string()),
                    ("date", format_timestamp(date)),
                ])),
            );
            text.push('\n');
            text.push_str(&last_error);
        }

        text
    }

    fn url_or_none(&self, lang: &str, info: &WebhookInfo) -> String {
        match info.registered_url() {
            Some(url) => url.to_string(),
            None => self.i18n.t("values.none", lang, None),
        }
    }

    fn yes_no(&self, lang: &str, value: bool) -> String {
        self.i18n.t(if value { "values.yes" } else { "values.no" }, lang, None)
    }
}

impl std::fmt::Debug for ConversationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationManager")
            .field("storage", &self.storage)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

fn params<const N: usize>(pairs: [(&str, String); N]) -> TranslationParams {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect::<HashMap<_, _>>()
}
