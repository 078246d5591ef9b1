#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! atmconsole: configuration console for a crypto ATM network.
//!
//! The operator's configuration is one flat document of namespaced keys
//! (`operatorInfo.email`, `wallets.BTC.ticker`, ...). This crate converts
//! between that document and per-panel field maps, validates panel edits and
//! persists them through a store:
//! - `namespace`: Namespace identifiers and the flatten/unflatten codec.
//! - `store`: Immutable snapshots, config/coupon stores (memory, JSON file) and file watching.
//! - `panels`: Operator info, wallet settings and coupon panels.
//! - `fields`: Declarative field descriptors and the generic table builder.
//! - `config`: Settings of the console itself (models, loader, schema helpers).
//! - `error`: Error type with stable error codes.
//!
//! Use `atmconsole::prelude::*` to bring commonly used items into scope quickly.

/// Public module: console settings (models, loader, schema helpers).
pub mod config;
/// Public module: error type and codes.
pub mod error;
/// Public module: field descriptors and table rendering.
pub mod fields;
/// Public module: namespaces and the namespace codec.
pub mod namespace;
/// Public module: configuration panels.
pub mod panels;
/// Public module: snapshots and stores.
pub mod store;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a level name (trace|debug|info|warn|error), case-insensitively.
pub fn parse_level(s: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - `level` wins when given and valid.
/// - Otherwise honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .and_then(parse_level)
        .or_else(|| std::env::var("RUST_LOG").ok().as_deref().and_then(parse_level))
        .unwrap_or(tracing::Level::INFO);

    // Logs go to stderr so command output on stdout stays machine-readable.
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use atmconsole::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use crate::error::{ConsoleError, ConsoleResult, ErrorCode};

    // Serialization
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Core types
    pub use crate::namespace::{
        ConfigDocument, DELIMITER, FieldMap, Namespace, from_namespace, to_namespace,
    };
    pub use crate::store::{ConfigSnapshot, ConfigStore, CouponStore, JsonFileStore, MemoryStore};

    // Frequently used internal modules
    pub use crate::{config, fields, panels};
}
