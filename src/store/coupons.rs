//! Coupon collection shared by the stores.
//!
//! Codes are unique ignoring case and surrounding whitespace.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ConsoleError, ConsoleResult};

/// A loyalty coupon: `discount` percent off commissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount: i64,
}

/// Ordered list of coupons with the uniqueness constraint on codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponBook(Vec<Coupon>);

impl CouponBook {
    pub fn list(&self) -> &[Coupon] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Find a coupon by code, ignoring case.
    pub fn find_code(&self, code: &str) -> Option<&Coupon> {
        let code = code.trim();
        self.0.iter().find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// Add a coupon with a fresh id.
    pub fn insert(&mut self, code: &str, discount: i64) -> ConsoleResult<Coupon> {
        let code = code.trim();
        if self.find_code(code).is_some() {
            return Err(ConsoleError::DuplicateCoupon {
                code: code.to_string(),
            });
        }
        let coupon = Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            discount,
        };
        debug!(target: "atmconsole::coupons", id = %coupon.id, code, discount, "Coupon created");
        self.0.push(coupon.clone());
        Ok(coupon)
    }

    pub fn remove(&mut self, id: &str) -> ConsoleResult<Coupon> {
        let idx = self
            .0
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ConsoleError::CouponNotFound(id.to_string()))?;
        Ok(self.0.remove(idx))
    }
}
