//! Shared application state.

use std::sync::Arc;

use domain::{CartService, InMemoryCatalog, OrderService};
use journal::Journal;
use lifecycle::{LifecycleEngine, TracingNotificationSink};
use query::OrderQueryService;

use crate::config::Config;

/// The lifecycle engine as wired into the server.
pub type Lifecycle<J> = LifecycleEngine<J, TracingNotificationSink>;

/// Services shared by all handlers.
pub struct AppState<J: Journal> {
    pub carts: CartService<J, InMemoryCatalog>,
    pub orders: OrderService<J, Arc<Lifecycle<J>>>,
    pub lifecycle: Arc<Lifecycle<J>>,
    pub queries: OrderQueryService<J>,
}

impl<J: Journal + Clone> AppState<J> {
    /// Wires every service over one journal and catalog.
    pub fn new(journal: J, catalog: InMemoryCatalog, config: &Config) -> Self {
        let timeouts = config.timeouts();
        let lifecycle = Arc::new(LifecycleEngine::new(
            journal.clone(),
            TracingNotificationSink,
            config.lifecycle(),
            timeouts,
        ));

        Self {
            carts: CartService::new(
                journal.clone(),
                catalog,
                timeouts,
                config.stale_cart_entries,
            ),
            orders: OrderService::new(journal.clone(), Arc::clone(&lifecycle), timeouts),
            lifecycle,
            queries: OrderQueryService::new(journal, timeouts),
        }
    }
}
