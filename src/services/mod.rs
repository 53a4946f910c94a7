//! Services module
//!
//! This module contains the collaborators the conversation layer calls out to

pub mod banner;
pub mod gateway;

// Re-export commonly used services
pub use banner::BannerService;
pub use gateway::{WebhookGateway, TelegramGateway, WebhookInfo, DeleteOutcome};

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::utils::errors::Result;

/// Service factory for creating and sharing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub gateway: Arc<dyn WebhookGateway>,
    pub banner: BannerService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory backed by the Telegram Bot API
    pub fn new(settings: &Settings) -> Result<Self> {
        let gateway = TelegramGateway::new(&settings.gateway)?;
        let banner = BannerService::new(&settings.bot.banner_path);

        Ok(Self::with_gateway(Arc::new(gateway), banner))
    }

    /// Create a ServiceFactory around an existing gateway
    pub fn with_gateway(gateway: Arc<dyn WebhookGateway>, banner: BannerService) -> Self {
        Self { gateway, banner }
    }
}

impl std::fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFactory")
            .field("banner", &self.banner)
            .finish_non_exhaustive()
    }
}
