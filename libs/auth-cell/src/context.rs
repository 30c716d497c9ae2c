use std::sync::Arc;

use shared_config::PortalConfig;
use shared_gateway::ApiClient;
use shared_models::auth::UserProfile;
use shared_models::error::AppError;
use shared_utils::storage::KeyValueStore;

use notification_cell::{Notifier, ToastService};

use crate::session::SessionStore;

/// Everything a screen needs, built once at start-up and shared by every
/// cell router.
pub struct PortalContext {
    pub config: PortalConfig,
    pub session: Arc<SessionStore>,
    pub api: ApiClient,
    pub toasts: Arc<ToastService>,
}

impl PortalContext {
    pub fn new(config: PortalConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let session = Arc::new(SessionStore::new(store));
        let api = ApiClient::new(&config, session.clone());
        let toasts = Arc::new(ToastService::new(config.toast_ttl()));

        Self {
            config,
            session,
            api,
            toasts,
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        self.session.store()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.toasts.clone()
    }

    /// The logged-in user, for screens the guard layer already admitted.
    pub fn current_user(&self) -> Result<UserProfile, AppError> {
        self.session
            .user()
            .ok_or_else(|| AppError::Auth("Please log in to continue".to_string()))
    }
}
