//! In-process gateway double that records every call

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use tokio::sync::Notify;
use webhook_manager::services::{DeleteOutcome, WebhookGateway, WebhookInfo};
use webhook_manager::utils::errors::{GatewayError, GatewayResult};

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Set { token: String, url: String, drop_pending: bool },
    Delete { token: String, drop_pending: bool },
    Info { token: String },
}

/// Pauses a call until the test releases it
#[derive(Debug, Clone, Default)]
pub struct CallGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    info: Mutex<WebhookInfo>,
    failure: Mutex<Option<GatewayError>>,
    delete_refused: AtomicBool,
    panic_on_call: AtomicBool,
    gate: Mutex<Option<CallGate>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Registration returned by every successful call
    pub fn set_info(&self, info: WebhookInfo) {
        *self.info.lock().unwrap() = info;
    }

    /// Make every following call fail with `error`
    pub fn fail_with(&self, error: GatewayError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Report deletes as not accepted
    pub fn refuse_deletes(&self) {
        self.delete_refused.store(true, Ordering::SeqCst);
    }

    pub fn panic_on_call(&self) {
        self.panic_on_call.store(true, Ordering::SeqCst);
    }

    /// Hold the next calls until `gate.release` is notified
    pub fn hold_calls(&self) -> CallGate {
        let gate = CallGate::default();
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn record(&self, call: GatewayCall) -> GatewayResult<WebhookInfo> {
        self.calls.lock().unwrap().push(call);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.panic_on_call.load(Ordering::SeqCst) {
            panic!("gateway exploded");
        }

        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(error) => Err(error),
            None => Ok(self.info.lock().unwrap().clone()),
        }
    }
}

#[async_trait]
impl WebhookGateway for RecordingGateway {
    async fn set_webhook(&self, token: &str, url: &str, drop_pending: bool) -> GatewayResult<WebhookInfo> {
        self.record(GatewayCall::Set {
            token: token.to_string(),
            url: url.to_string(),
            drop_pending,
        })
        .await
    }

    async fn delete_webhook(&self, token: &str, drop_pending: bool) -> GatewayResult<DeleteOutcome> {
        let info = self
            .record(GatewayCall::Delete {
                token: token.to_string(),
                drop_pending,
            })
            .await?;

        Ok(DeleteOutcome {
            accepted: !self.delete_refused.load(Ordering::SeqCst),
            info,
        })
    }

    async fn get_webhook_info(&self, token: &str) -> GatewayResult<WebhookInfo> {
        self.record(GatewayCall::Info { token: token.to_string() }).await
    }
}
