//! JSON file store.
//!
//! The whole [`StoreState`] lives in one pretty-printed JSON file:
//! `{ "config": { "ns.field": ... }, "coupons": [ ... ] }`.
//!
//! Behavior:
//! - A missing file reads as an empty document with no coupons.
//! - Writes go to a sibling `*.tmp` file first, then replace the target by rename.
//! - A corrupt file is reported as `ConsoleError::Store`; it is never overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ConfigSnapshot, ConfigStore, Coupon, CouponStore, StoreState, merge};
use crate::error::{ConsoleError, ConsoleResult};
use crate::namespace::ConfigDocument;

/// Store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state without taking the write lock.
    pub async fn read_state(&self) -> ConsoleResult<StoreState> {
        read_state(&self.path).await
    }

    async fn write_state(&self, state: &StoreState) -> ConsoleResult<()> {
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = tmp_path(&self.path);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(target: "atmconsole::store", path = %self.path.display(), "Store file written");
        Ok(())
    }

    /// Apply `f` to the state under the lock and persist the result.
    async fn modify<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> ConsoleResult<T>,
    ) -> ConsoleResult<T> {
        let _guard = self.lock.lock().await;
        let mut state = self.read_state().await?;
        let out = f(&mut state)?;
        self.write_state(&state).await?;
        Ok(out)
    }
}

/// Read a store file; a missing file yields the empty state.
pub async fn read_state(path: &Path) -> ConsoleResult<StoreState> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            ConsoleError::Store(format!("failed to parse {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(target: "atmconsole::store", path = %path.display(), "Store file missing; starting empty");
            Ok(StoreState::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl ConfigStore for JsonFileStore {
    async fn load(&self) -> ConsoleResult<ConfigSnapshot> {
        Ok(ConfigSnapshot::new(self.read_state().await?.config))
    }

    async fn save(&self, partial: ConfigDocument) -> ConsoleResult<ConfigSnapshot> {
        let keys = partial.len();
        let config = self
            .modify(|state| {
                merge(&mut state.config, partial);
                Ok(state.config.clone())
            })
            .await?;
        info!(target: "atmconsole::store", path = %self.path.display(), keys, "Configuration saved");
        Ok(ConfigSnapshot::new(config))
    }
}

impl CouponStore for JsonFileStore {
    async fn coupons(&self) -> ConsoleResult<Vec<Coupon>> {
        Ok(self.read_state().await?.coupons.list().to_vec())
    }

    async fn create_coupon(&self, code: &str, discount: i64) -> ConsoleResult<Coupon> {
        self.modify(|state| state.coupons.insert(code, discount))
            .await
    }

    async fn delete_coupon(&self, id: &str) -> ConsoleResult<Coupon> {
        self.modify(|state| state.coupons.remove(id)).await
    }
}
