//! In-memory store.

use tokio::sync::Mutex;
use tracing::trace;

use super::{ConfigSnapshot, ConfigStore, Coupon, CouponStore, StoreState, merge};
use crate::error::ConsoleResult;
use crate::namespace::ConfigDocument;

/// Store holding the document and coupons in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_document(config: ConfigDocument) -> Self {
        Self {
            state: Mutex::new(StoreState {
                config,
                ..StoreState::default()
            }),
        }
    }
}

impl ConfigStore for MemoryStore {
    async fn load(&self) -> ConsoleResult<ConfigSnapshot> {
        let state = self.state.lock().await;
        Ok(ConfigSnapshot::new(state.config.clone()))
    }

    async fn save(&self, partial: ConfigDocument) -> ConsoleResult<ConfigSnapshot> {
        let mut state = self.state.lock().await;
        trace!(target: "atmconsole::store", keys = partial.len(), "Merging partial document");
        merge(&mut state.config, partial);
        Ok(ConfigSnapshot::new(state.config.clone()))
    }
}

impl CouponStore for MemoryStore {
    async fn coupons(&self) -> ConsoleResult<Vec<Coupon>> {
        Ok(self.state.lock().await.coupons.list().to_vec())
    }

    async fn create_coupon(&self, code: &str, discount: i64) -> ConsoleResult<Coupon> {
        self.state.lock().await.coupons.insert(code, discount)
    }

    async fn delete_coupon(&self, id: &str) -> ConsoleResult<Coupon> {
        self.state.lock().await.coupons.remove(id)
    }
}
