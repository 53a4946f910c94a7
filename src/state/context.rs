//! Conversation context management
//!
//! This module holds the per-chat conversation state: which flow the chat is
//! in, which field it is waiting for, and the values collected so far.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, Duration};

/// A multi-step conversational task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Flow {
    #[default]
    None,
    SetWebhook,
    DeleteWebhook,
    GetInfo,
}

impl Flow {
    /// Stable identifier used in logs and translation keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::None => "none",
            Flow::SetWebhook => "set_webhook",
            Flow::DeleteWebhook => "delete_webhook",
            Flow::GetInfo => "get_info",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The field a flow is currently waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Step {
    #[default]
    Idle,
    AwaitToken,
    AwaitUrl,
    AwaitDropFlag,
    /// The form was handed to the remote call; no further input is accepted
    Dispatching,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Idle => "idle",
            Step::AwaitToken => "await_token",
            Step::AwaitUrl => "await_url",
            Step::AwaitDropFlag => "await_drop_flag",
            Step::Dispatching => "dispatching",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flow generations are unique process-wide, so a chat whose entry was dropped
/// and recreated never reuses one
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Conversation state of a single chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Chat this state belongs to
    pub chat_id: i64,
    pub flow: Flow,
    pub step: Step,
    pub collected_token: Option<String>,
    pub collected_url: Option<String>,
    pub collected_drop_flag: Option<bool>,
    /// Unique per started flow; lets a late reset recognize a newer flow
    pub generation: u64,
    /// When an unfinished form is abandoned
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create an idle state for a chat
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            flow: Flow::None,
            step: Step::Idle,
            collected_token: None,
            collected_url: None,
            collected_drop_flag: None,
            generation: 0,
            expires_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Start a flow, discarding anything collected before
    pub fn start_flow(&mut self, flow: Flow, initial_step: Step, ttl: Duration) {
        self.clear_form();
        self.flow = flow;
        self.step = initial_step;
        self.generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        self.expires_at = Some(Utc::now() + ttl);
        self.updated_at = Utc::now();
    }

    /// Move to the next step of the current flow
    pub fn advance(&mut self, step: Step) {
        self.step = step;
        self.updated_at = Utc::now();
    }

    /// Hand the completed form over to the remote call.
    ///
    /// The generation is kept so the reset that follows the call still matches.
    pub fn mark_dispatched(&mut self) {
        self.clear_form();
        self.step = Step::Dispatching;
        self.updated_at = Utc::now();
    }

    /// Check if the completed form is waiting on its remote call
    pub fn is_dispatching(&self) -> bool {
        self.step == Step::Dispatching
    }

    /// Return to `{flow: None, step: Idle}` with no collected values
    pub fn reset(&mut self) {
        self.clear_form();
        self.flow = Flow::None;
        self.step = Step::Idle;
        self.expires_at = None;
        self.updated_at = Utc::now();
    }

    fn clear_form(&mut self) {
        self.collected_token = None;
        self.collected_url = None;
        self.collected_drop_flag = None;
    }

    /// Check if no flow is active
    pub fn is_idle(&self) -> bool {
        self.flow == Flow::None && self.step == Step::Idle && !self.has_collected_data()
    }

    /// Check if any form value survives in this state
    pub fn has_collected_data(&self) -> bool {
        self.collected_token.is_some() || self.collected_url.is_some() || self.collected_drop_flag.is_some()
    }

    /// Check if the unfinished form has expired
    pub fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Utc::now() > expires_at
        } else {
            false
        }
    }

    /// Check if the chat is in a specific flow and step
    pub fn is_at(&self, flow: Flow, step: Step) -> bool {
        self.flow == flow && self.step == step
    }

    /// Create a summary of the state for logging; never includes the token
    pub fn summary(&self) -> StateSummary {
        StateSummary {
            chat_id: self.chat_id,
            flow: self.flow,
            step: self.step,
            has_token: self.collected_token.is_some(),
            has_url: self.collected_url.is_some(),
            drop_flag: self.collected_drop_flag,
            updated_at: self.updated_at,
        }
    }
}

/// State summary for logging and debugging
#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    pub chat_id: i64,
    pub flow: Flow,
    pub step: Step,
    pub has_token: bool,
    pub has_url: bool,
    pub drop_flag: Option<bool>,
    pub updated_at: DateTime<Utc>,
}
