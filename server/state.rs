use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use familiar_workshop::{AiGateway, FamiliarStore, MatteEngine, UreqClient};

// ---------------------------------------------------------------------------
// Main state struct
// ---------------------------------------------------------------------------

pub struct ServerState {
    /// Familiar records. Lock only around store calls, never across network I/O.
    store: Mutex<FamiliarStore>,
    /// Analysis and image generation with offline fallbacks.
    pub gateway: AiGateway<UreqClient>,
    /// Background removal.
    pub matte: MatteEngine<UreqClient>,
    /// The user this deployment acts for.
    pub owner_id: String,
}

impl ServerState {
    pub fn new(
        store: FamiliarStore,
        gateway: AiGateway<UreqClient>,
        matte: MatteEngine<UreqClient>,
        owner_id: String,
    ) -> Self {
        ServerState { store: Mutex::new(store), gateway, matte, owner_id }
    }

    /// Locks the store. Every mutation is a single call, so a lock poisoned
    /// by a panicking request still guards a consistent map.
    pub fn store(&self) -> MutexGuard<'_, FamiliarStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared state handed to every request thread.
pub type SharedState = Arc<ServerState>;
