//! Conversation scenarios implementation
//!
//! This module defines the three webhook flows as ordered lists of input
//! steps and drives a chat's state through them one validated input at a time.

use std::collections::HashMap;
use std::fmt;
use chrono::Duration;
use tracing::{debug, warn};
use crate::utils::errors::ConversationError;
use crate::utils::helpers::{is_valid_token, is_valid_webhook_url, parse_drop_flag, mask_token};
use super::context::{ConversationState, Flow, Step};

/// Represents a conversation scenario (one flow)
#[derive(Debug, Clone)]
pub struct Scenario {
    pub flow: Flow,
    /// Steps in the order they are collected; the last one dispatches the request
    pub steps: Vec<ScenarioStep>,
}

/// Represents a step within a scenario
#[derive(Debug, Clone)]
pub struct ScenarioStep {
    pub step: Step,
    pub input_type: InputType,
    /// Translation key of the prompt asking for this step's input
    pub prompt_key: &'static str,
}

/// Types of input expected in a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    BotToken,
    HttpsUrl,
    DropFlag,
}

/// A validated step input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepValue {
    Token(String),
    Url(String),
    DropFlag(bool),
}

/// A fully collected form, ready for the remote webhook API
#[derive(Clone, PartialEq, Eq)]
pub enum WebhookRequest {
    Set { token: String, url: String, drop_pending: bool },
    Delete { token: String, drop_pending: bool },
    Info { token: String },
}

impl WebhookRequest {
    /// Build the request for the state's flow, if every required field is present
    pub fn from_state(state: &ConversationState) -> Option<Self> {
        let token = state.collected_token.clone()?;
        match state.flow {
            Flow::SetWebhook => Some(WebhookRequest::Set {
                token,
                url: state.collected_url.clone()?,
                drop_pending: state.collected_drop_flag?,
            }),
            Flow::DeleteWebhook => Some(WebhookRequest::Delete {
                token,
                drop_pending: state.collected_drop_flag?,
            }),
            Flow::GetInfo => Some(WebhookRequest::Info { token }),
            Flow::None => None,
        }
    }

    pub fn flow(&self) -> Flow {
        match self {
            WebhookRequest::Set { .. } => Flow::SetWebhook,
            WebhookRequest::Delete { .. } => Flow::DeleteWebhook,
            WebhookRequest::Info { .. } => Flow::GetInfo,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            WebhookRequest::Set { token, .. }
            | WebhookRequest::Delete { token, .. }
            | WebhookRequest::Info { token } => token,
        }
    }
}

impl fmt::Debug for WebhookRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookRequest::Set { token, url, drop_pending } => f
                .debug_struct("Set")
                .field("token", &mask_token(token))
                .field("url", url)
                .field("drop_pending", drop_pending)
                .finish(),
            WebhookRequest::Delete { token, drop_pending } => f
                .debug_struct("Delete")
                .field("token", &mask_token(token))
                .field("drop_pending", drop_pending)
                .finish(),
            WebhookRequest::Info { token } => f
                .debug_struct("Info")
                .field("token", &mask_token(token))
                .finish(),
        }
    }
}

/// What a single inbound text did to a chat's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No flow is active; state untouched
    NoActiveFlow,
    /// Input failed the step's predicate; state untouched
    Rejected(ConversationError),
    /// Input stored, flow moved to `step`
    Advanced { step: Step },
    /// Final input stored; the request must be dispatched and the state reset afterwards
    Ready { request: WebhookRequest, generation: u64 },
    /// State did not match its flow; it has already been reset
    UnknownState { flow: Flow, step: Step },
}

/// Scenario manager for handling all conversation scenarios
#[derive(Debug, Clone)]
pub struct ScenarioManager {
    scenarios: HashMap<Flow, Scenario>,
    ttl: Duration,
}

impl ScenarioManager {
    /// Create a new scenario manager with the webhook flows registered
    pub fn new(ttl: Duration) -> Self {
        let mut manager = Self {
            scenarios: HashMap::new(),
            ttl,
        };

        manager.register_scenario(create_set_webhook_scenario());
        manager.register_scenario(create_delete_webhook_scenario());
        manager.register_scenario(create_webhook_info_scenario());
        manager
    }

    /// Register a new scenario
    pub fn register_scenario(&mut self, scenario: Scenario) {
        self.scenarios.insert(scenario.flow, scenario);
    }

    /// Get a scenario by flow
    pub fn get_scenario(&self, flow: Flow) -> Option<&Scenario> {
        self.scenarios.get(&flow)
    }

    /// Definition of the step a chat is currently at
    pub fn current_step(&self, state: &ConversationState) -> Option<&ScenarioStep> {
        self.get_scenario(state.flow)?
            .steps
            .iter()
            .find(|s| s.step == state.step)
    }

    /// Start a flow for a chat, unconditionally replacing whatever was in progress
    pub fn start_flow(&self, state: &mut ConversationState, flow: Flow) -> Option<&ScenarioStep> {
        let first = self.get_scenario(flow)?.steps.first()?;
        state.start_flow(flow, first.step, self.ttl);
        debug!(chat_id = state.chat_id, flow = %flow, step = %first.step, "Flow started");
        Some(first)
    }

    /// Feed one text input into the chat's current step
    pub fn apply_input(&self, state: &mut ConversationState, input: &str) -> Transition {
        if state.flow == Flow::None && state.step == Step::Idle {
            return Transition::NoActiveFlow;
        }
        // The final input already ended the flow; its call is still in flight
        if state.is_dispatching() {
            debug!(chat_id = state.chat_id, flow = %state.flow, "Input while the request is in flight");
            return Transition::NoActiveFlow;
        }

        let (flow, step) = (state.flow, state.step);
        let Some(scenario) = self.get_scenario(flow) else {
            return self.unknown_state(state);
        };
        let Some(position) = scenario.steps.iter().position(|s| s.step == step) else {
            return self.unknown_state(state);
        };
        let definition = &scenario.steps[position];

        let value = match Self::validate_input(definition.input_type, input) {
            Ok(value) => value,
            Err(error) => {
                debug!(chat_id = state.chat_id, flow = %flow, step = %step, "Input rejected");
                return Transition::Rejected(error);
            }
        };

        match value {
            StepValue::Token(token) => state.collected_token = Some(token),
            StepValue::Url(url) => state.collected_url = Some(url),
            StepValue::DropFlag(drop) => state.collected_drop_flag = Some(drop),
        }

        match scenario.steps.get(position + 1) {
            Some(next) => {
                state.advance(next.step);
                Transition::Advanced { step: next.step }
            }
            None => match WebhookRequest::from_state(state) {
                Some(request) => {
                    state.mark_dispatched();
                    Transition::Ready {
                        request,
                        generation: state.generation,
                    }
                }
                None => self.unknown_state(state),
            },
        }
    }

    /// Validate input against the predicate of an input type
    pub fn validate_input(input_type: InputType, input: &str) -> Result<StepValue, ConversationError> {
        let input = input.trim();
        match input_type {
            InputType::BotToken => {
                if is_valid_token(input) {
                    Ok(StepValue::Token(input.to_string()))
                } else {
                    Err(ConversationError::InvalidToken)
                }
            }
            InputType::HttpsUrl => {
                if is_valid_webhook_url(input) {
                    Ok(StepValue::Url(input.to_string()))
                } else {
                    Err(ConversationError::InvalidUrl)
                }
            }
            InputType::DropFlag => parse_drop_flag(input)
                .map(StepValue::DropFlag)
                .ok_or(ConversationError::InvalidFlagInput),
        }
    }

    fn unknown_state(&self, state: &mut ConversationState) -> Transition {
        let (flow, step) = (state.flow, state.step);
        warn!(chat_id = state.chat_id, flow = %flow, step = %step, "Unknown conversation state, resetting");
        state.reset();
        Transition::UnknownState { flow, step }
    }
}

/// Create the set-webhook scenario: token → URL → drop flag
fn create_set_webhook_scenario() -> Scenario {
    Scenario {
        flow: Flow::SetWebhook,
        steps: vec![
            ScenarioStep {
                step: Step::AwaitToken,
                input_type: InputType::BotToken,
                prompt_key: "prompts.set_webhook.token",
            },
            ScenarioStep {
                step: Step::AwaitUrl,
                input_type: InputType::HttpsUrl,
                prompt_key: "prompts.set_webhook.url",
            },
            ScenarioStep {
                step: Step::AwaitDropFlag,
                input_type: InputType::DropFlag,
                prompt_key: "prompts.drop_flag",
            },
        ],
    }
}

/// Create the delete-webhook scenario: token → drop flag
fn create_delete_webhook_scenario() -> Scenario {
    Scenario {
        flow: Flow::DeleteWebhook,
        steps: vec![
            ScenarioStep {
                step: Step::AwaitToken,
                input_type: InputType::BotToken,
                prompt_key: "prompts.delete_webhook.token",
            },
            ScenarioStep {
                step: Step::AwaitDropFlag,
                input_type: InputType::DropFlag,
                prompt_key: "prompts.drop_flag",
            },
        ],
    }
}

/// Create the webhook-info scenario: token only
fn create_webhook_info_scenario() -> Scenario {
    Scenario {
        flow: Flow::GetInfo,
        steps: vec![ScenarioStep {
            step: Step::AwaitToken,
            input_type: InputType::BotToken,
            prompt_key: "prompts.get_info.token",
        }],
    }
}

impl Default for ScenarioManager {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}
