use std::sync::Arc;

use crate::config::Config;
use crate::services::message_store::MessageStore;
use crate::services::status_tracker::StatusTracker;
use crate::websocket::router::NotificationHub;
use crate::websocket::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MessageStore>,
    pub registry: ConnectionRegistry,
    pub hub: NotificationHub,
    pub tracker: StatusTracker,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the hub components once; everything downstream receives them by
    /// injection rather than reaching for globals.
    pub fn new(store: Arc<dyn MessageStore>, config: Arc<Config>) -> Self {
        let registry = ConnectionRegistry::new();
        let hub = NotificationHub::new(registry.clone(), store.clone());
        let tracker = StatusTracker::new(store.clone(), hub.clone());
        Self {
            store,
            registry,
            hub,
            tracker,
            config,
        }
    }
}
