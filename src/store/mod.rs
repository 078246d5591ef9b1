/*!
Configuration store module.

Panels never touch the persisted document directly. They receive an immutable
[`ConfigSnapshot`] and hand partial documents back to a [`ConfigStore`], which
merges them (shallow key overwrite) and returns the fresh snapshot.

Implementations:
- `memory.rs` -> `MemoryStore`   (in-process, used by tests and embedders)
- `file.rs`   -> `JsonFileStore` (single JSON file on disk)
- `watch.rs`  -> `watch_document` (reload snapshots when the file changes)

Coupons are kept next to the configuration document and exposed through the
separate [`CouponStore`] trait.
*/

#![allow(async_fn_in_trait)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConsoleResult;
use crate::namespace::{self, ConfigDocument, FieldMap, Namespace};

pub mod coupons;
pub mod file;
pub mod memory;
pub mod watch;

pub use coupons::{Coupon, CouponBook};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use watch::watch_document;

/// Immutable view of the configuration document at one point in time.
///
/// Cloning is cheap; every panel built from the same load shares one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSnapshot(Arc<ConfigDocument>);

impl ConfigSnapshot {
    pub fn new(document: ConfigDocument) -> Self {
        Self(Arc::new(document))
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field map of one namespace (empty when the namespace is unconfigured).
    pub fn namespace(&self, ns: &Namespace) -> FieldMap {
        namespace::from_namespace(ns, &self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ConfigDocument> for ConfigSnapshot {
    fn from(document: ConfigDocument) -> Self {
        Self::new(document)
    }
}

/// Shallow merge: every key of `partial` overwrites the same key of `document`.
pub fn merge(document: &mut ConfigDocument, partial: ConfigDocument) {
    document.extend(partial);
}

/// Persisted shape shared by the stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub config: ConfigDocument,
    #[serde(default)]
    pub coupons: CouponBook,
}

/// Fetch/save collaborator for the configuration document.
pub trait ConfigStore: Send + Sync {
    /// Load the full document.
    async fn load(&self) -> ConsoleResult<ConfigSnapshot>;

    /// Merge `partial` into the persisted document and return the result.
    ///
    /// Implementations run the read-modify-write under a lock, so concurrent
    /// saves never lose each other's keys.
    async fn save(&self, partial: ConfigDocument) -> ConsoleResult<ConfigSnapshot>;
}

/// Coupon collection collaborator.
pub trait CouponStore: Send + Sync {
    async fn coupons(&self) -> ConsoleResult<Vec<Coupon>>;

    /// Fails with `ConsoleError::DuplicateCoupon` when the code already exists.
    async fn create_coupon(&self, code: &str, discount: i64) -> ConsoleResult<Coupon>;

    async fn delete_coupon(&self, id: &str) -> ConsoleResult<Coupon>;
}
