use crossbeam_queue::ArrayQueue;
use std::sync::Arc;

use crate::clients::{NameRegistry, SmsSender, WalletProvider};
use crate::config::AppConfig;
use crate::db::Database;
use crate::dispatch::{Dispatcher, Notification};
use crate::store::Store;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    /// Persistent workflow state
    pub store: Arc<dyn Store>,
    /// Custodial wallet provider
    pub wallet: Arc<dyn WalletProvider>,
    /// Onchain name registry
    pub names: Arc<dyn NameRegistry>,
    /// Outbound SMS gateway
    pub sms: Arc<dyn SmsSender>,
    /// Command dispatcher
    pub dispatcher: Arc<Dispatcher>,
    /// Queue drained by the notify service
    pub notify_queue: Arc<ArrayQueue<Notification>>,
    /// Database handle (health ping), absent in store-only test setups
    pub db: Option<Arc<Database>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn Store>,
        wallet: Arc<dyn WalletProvider>,
        names: Arc<dyn NameRegistry>,
        sms: Arc<dyn SmsSender>,
        dispatcher: Arc<Dispatcher>,
        notify_queue: Arc<ArrayQueue<Notification>>,
        db: Option<Arc<Database>>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            wallet,
            names,
            sms,
            dispatcher,
            notify_queue,
            db,
            config,
        }
    }
}
