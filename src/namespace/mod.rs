//! Configuration namespaces.
//!
//! The persisted configuration is one flat document whose keys are
//! `namespace.field`. Panels work on bare field maps; the codec in
//! [`codec`] converts between the two shapes.
//!
//! Example:
//! use atmconsole::namespace::{self, Namespace};
//!
//! let fields = namespace::from_namespace(&Namespace::OPERATOR_INFO, &document);

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ConsoleError, ConsoleResult};

pub mod codec;

pub use codec::{from_namespace, to_namespace};

/// Separator between a namespace and a field name.
pub const DELIMITER: &str = ".";

/// Full persisted configuration: namespaced key -> JSON value.
pub type ConfigDocument = BTreeMap<String, Value>;

/// Bare field name -> value, the state of a single panel.
pub type FieldMap = BTreeMap<String, Value>;

/// A validated namespace identifier (non-empty, delimiter-free).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Namespace(std::borrow::Cow<'static, str>);

impl Namespace {
    pub const OPERATOR_INFO: Namespace = Namespace::from_static("operatorInfo");
    pub const WALLETS: Namespace = Namespace::from_static("wallets");
    pub const LOCALE: Namespace = Namespace::from_static("locale");
    pub const COMMISSIONS: Namespace = Namespace::from_static("commissions");
    pub const NOTIFICATIONS: Namespace = Namespace::from_static("notifications");
    pub const COMPLIANCE: Namespace = Namespace::from_static("compliance");
    pub const RECEIPT: Namespace = Namespace::from_static("receipt");
    pub const COIN_ATM_RADAR: Namespace = Namespace::from_static("coinAtmRadar");
    pub const TERMS_CONDITIONS: Namespace = Namespace::from_static("termsConditions");
    pub const CASH_OUT: Namespace = Namespace::from_static("cashOut");

    /// Every namespace the console knows about.
    pub const KNOWN: [Namespace; 10] = [
        Namespace::OPERATOR_INFO,
        Namespace::WALLETS,
        Namespace::LOCALE,
        Namespace::COMMISSIONS,
        Namespace::NOTIFICATIONS,
        Namespace::COMPLIANCE,
        Namespace::RECEIPT,
        Namespace::COIN_ATM_RADAR,
        Namespace::TERMS_CONDITIONS,
        Namespace::CASH_OUT,
    ];

    const fn from_static(s: &'static str) -> Self {
        Namespace(std::borrow::Cow::Borrowed(s))
    }

    /// Validate and build a namespace from an arbitrary identifier.
    pub fn new(id: impl Into<String>) -> ConsoleResult<Self> {
        let id = id.into();
        if id.is_empty() || id.contains(DELIMITER) {
            return Err(ConsoleError::InvalidNamespace(id));
        }
        Ok(Namespace(std::borrow::Cow::Owned(id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"<namespace>."`, the prefix shared by all keys of this namespace.
    pub fn prefix(&self) -> String {
        let mut p = String::with_capacity(self.0.len() + DELIMITER.len());
        p.push_str(&self.0);
        p.push_str(DELIMITER);
        p
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Namespace {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::new(s)
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Namespace::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_delimited_ids() {
        assert!(Namespace::new("").is_err());
        assert!(Namespace::new("wallets.BTC").is_err());
        assert_eq!(Namespace::new("BTC").unwrap().as_str(), "BTC");
    }

    #[test]
    fn test_prefix_and_display() {
        assert_eq!(Namespace::OPERATOR_INFO.prefix(), "operatorInfo.");
        assert_eq!(Namespace::WALLETS.to_string(), "wallets");
    }

    #[test]
    fn test_deserialize_validates() {
        let ns: Namespace = serde_json::from_str("\"locale\"").unwrap();
        assert_eq!(ns, Namespace::LOCALE);
        assert!(serde_json::from_str::<Namespace>("\"a.b\"").is_err());
    }

    #[test]
    fn test_known_namespaces_are_valid() {
        for ns in Namespace::KNOWN {
            assert!(Namespace::new(ns.as_str()).is_ok(), "{ns}");
        }
    }
}
