//! Conversation manager wired to test doubles

use std::path::PathBuf;
use std::sync::Arc;
use webhook_manager::config::Settings;
use webhook_manager::services::{BannerService, ServiceFactory};
use webhook_manager::state::{ScenarioManager, StateStorage};
use webhook_manager::{ConversationManager, I18n};
use super::RecordingGateway;

pub struct TestContext {
    pub manager: ConversationManager,
    pub gateway: Arc<RecordingGateway>,
    pub storage: StateStorage,
}

/// Translations shipped with the crate
pub async fn load_i18n() -> I18n {
    let mut config = Settings::default().i18n;
    config.translations_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/translations").to_string();

    let mut i18n = I18n::new(&config);
    i18n.load_translations().await.expect("bundled translations");
    i18n
}

impl TestContext {
    /// Manager with a recording gateway and no banner file
    pub async fn new() -> Self {
        Self::with_banner(PathBuf::from("/nonexistent/banner.jpg")).await
    }

    pub async fn with_banner(banner_path: PathBuf) -> Self {
        let gateway = RecordingGateway::new();
        let storage = StateStorage::new();
        let services = ServiceFactory::with_gateway(gateway.clone(), BannerService::new(banner_path));

        let manager = ConversationManager::new(
            storage.clone(),
            ScenarioManager::default(),
            services,
            Arc::new(load_i18n().await),
        );

        Self { manager, gateway, storage }
    }
}
