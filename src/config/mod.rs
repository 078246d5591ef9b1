//! Console settings.
//!
//! Settings models plus the loading/validation helpers. These describe the
//! console itself (store location, catalogues), not the operator's
//! configuration document, which lives behind `store`.
//!
//! Example:
//! use atmconsole::config::{ConsoleConfig, load_from_path};
//!
//! let cfg = load_from_path("atmconsole.settings.json")?;

pub mod loader;
pub mod models;

// Re-export core data models
pub use models::{
    Account, AccountClass, ConsoleConfig, CryptoCurrency, StoreConfig, WatchConfig,
    default_accounts, default_cryptocurrencies, filter_class, filter_coins,
};

// Re-export loader utilities
pub use loader::{
    generate_schema, load_from_path, load_from_path_async, load_from_reader, load_from_str,
    load_or_default_async, validate_config, write_schema_to_writer,
};
