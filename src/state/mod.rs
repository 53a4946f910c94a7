//! State management module
//!
//! This module handles per-chat conversation state and the webhook flows

pub mod context;
pub mod scenarios;
pub mod storage;

// Re-export commonly used state components
pub use context::{ConversationState, Flow, Step};
pub use scenarios::{Scenario, ScenarioManager, ScenarioStep, InputType, StepValue, Transition, WebhookRequest};
pub use storage::{StateStorage, StateStorageManager, StorageStats, ResetGuard};
