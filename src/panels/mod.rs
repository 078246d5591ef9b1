/*!
Configuration panels.

Each panel is built from an explicit [`ConfigSnapshot`](crate::store::ConfigSnapshot)
(or from a coupon listing), exposes its initial form values and field
descriptors, validates edits and writes them back through a store:

- `operator_info.rs` -> `OperatorInfoPanel` (contact info card, namespace `operatorInfo`)
- `wallet.rs`        -> `WalletPanel`       (per-crypto wallet settings, `wallets.<CODE>`)
- `coupons.rs`       -> `CouponsPanel`      (loyalty discount coupons)
*/

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_valid::Validate;

use crate::error::{ConsoleError, ConsoleResult};
use crate::namespace::FieldMap;

pub mod coupons;
pub mod operator_info;
pub mod wallet;

pub use coupons::{CouponsPanel, NewCoupon};
pub use operator_info::{FormField, OperatorInfo, OperatorInfoPanel};
pub use wallet::{AdvancedWalletSettings, CURRENCY_MAX, WalletPanel, WalletSettings};

/// Edit mode of a panel. Only one edit session may be open at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditState {
    editing: bool,
}

impl EditState {
    pub fn new(editing: bool) -> Self {
        Self { editing }
    }

    pub fn is_editing(self) -> bool {
        self.editing
    }

    /// Enter edit mode; fails if a session is already open.
    pub fn begin(&mut self, panel: &'static str) -> ConsoleResult<()> {
        if self.editing {
            return Err(ConsoleError::EditInProgress(panel));
        }
        self.editing = true;
        Ok(())
    }

    pub fn finish(&mut self) {
        self.editing = false;
    }
}

/// Serialize a form struct into a bare field map.
pub(crate) fn to_field_map<T: Serialize>(value: &T) -> ConsoleResult<FieldMap> {
    let v = serde_json::to_value(value)?;
    Ok(serde_json::from_value(v)?)
}

/// Parse a field map into a form struct; shape errors count as validation errors.
pub(crate) fn from_field_map<T: DeserializeOwned>(
    panel: &'static str,
    fields: &FieldMap,
) -> ConsoleResult<T> {
    let v = serde_json::to_value(fields)?;
    serde_json::from_value(v).map_err(|e| ConsoleError::validation(panel, None, e.to_string()))
}

/// Run the serde_valid rules of a form.
pub(crate) fn check<T: Validate>(panel: &'static str, value: &T) -> ConsoleResult<()> {
    value
        .validate()
        .map_err(|e| ConsoleError::validation(panel, None, e.to_string()))
}
