use std::sync::Arc;

use crate::clock::Clock;
use crate::identity::IdentityProvider;
use crate::store::DocumentStore;

/// Collaborators every handler receives explicitly.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            identity,
            clock,
        }
    }
}
