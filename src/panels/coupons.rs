//! Loyalty coupons panel.
//!
//! Lists discount coupons, adds new ones and deletes them. A failed add keeps
//! an inline message for the add form; listing is refreshed after every
//! successful change.

use serde_json::Value;
use serde_valid::Validate;
use tracing::{info, warn};

use super::check;
use crate::error::{ConsoleError, ConsoleResult};
use crate::fields::{self, Align, Cell, FieldDescriptor, RenderContext, ViewKind};
use crate::namespace::FieldMap;
use crate::store::{Coupon, CouponStore};

const PANEL: &str = "coupons";
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const GENERATED_CODE_LEN: usize = 8;

pub const DUPLICATE_COUPON: &str = "There is already a coupon with that code!";
pub const NO_COUPONS: &str = "Currently, there are no active coupon codes on your network.";

/// Input of the add-coupon form.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewCoupon {
    #[validate(min_length = 1)]
    pub code: String,
    /// Percent off commissions.
    #[validate(minimum = 0)]
    #[validate(maximum = 100)]
    pub discount: i64,
}

impl NewCoupon {
    pub fn new(code: &str, discount: i64) -> Self {
        Self {
            code: code.trim().to_string(),
            discount,
        }
    }
}

/// Random coupon code from an unambiguous uppercase alphabet.
pub fn generate_code() -> String {
    (0..GENERATED_CODE_LEN)
        .map(|_| CODE_ALPHABET[rand::random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Coupon listing and add-form state.
#[derive(Debug, Clone, Default)]
pub struct CouponsPanel {
    coupons: Vec<Coupon>,
    error: Option<&'static str>,
}

impl CouponsPanel {
    pub async fn load<S: CouponStore>(store: &S) -> ConsoleResult<Self> {
        Ok(Self {
            coupons: store.coupons().await?,
            error: None,
        })
    }

    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// Inline message of the add form.
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Close the add form.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn elements() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::read_only("code", "Coupon Code", 300, ViewKind::Raw),
            FieldDescriptor::read_only("discount", "Discount", 220, ViewKind::Percent),
            FieldDescriptor::read_only("id", "Delete", 100, ViewKind::Action { label: "Delete" })
                .with_align(Align::Center),
        ]
    }

    pub fn rows(&self) -> Vec<FieldMap> {
        self.coupons
            .iter()
            .map(|c| {
                FieldMap::from_iter([
                    ("id".to_string(), Value::String(c.id.clone())),
                    ("code".to_string(), Value::String(c.code.clone())),
                    ("discount".to_string(), Value::from(c.discount)),
                ])
            })
            .collect()
    }

    pub fn render(&self) -> Vec<Vec<Cell>> {
        let ctx = RenderContext {
            cryptocurrencies: &[],
            accounts: &[],
        };
        fields::render_rows(&Self::elements(), &self.rows(), &ctx)
    }

    /// Validate and create a coupon, then refresh the listing.
    ///
    /// A duplicate code sets the inline message and returns the error.
    pub async fn add_coupon<S: CouponStore>(
        &mut self,
        store: &S,
        coupon: NewCoupon,
    ) -> ConsoleResult<Coupon> {
        self.error = None;
        check(PANEL, &coupon)?;
        match store.create_coupon(&coupon.code, coupon.discount).await {
            Ok(created) => {
                info!(target: "atmconsole::panels", panel = PANEL, code = %created.code, "Coupon added");
                self.coupons = store.coupons().await?;
                Ok(created)
            }
            Err(e) => {
                if e.is_duplicate() {
                    warn!(target: "atmconsole::panels", panel = PANEL, code = %coupon.code, "Duplicate coupon code");
                    self.error = Some(DUPLICATE_COUPON);
                }
                Err(e)
            }
        }
    }

    pub async fn delete_coupon<S: CouponStore>(&mut self, store: &S, id: &str) -> ConsoleResult<Coupon> {
        let removed = store.delete_coupon(id).await?;
        info!(target: "atmconsole::panels", panel = PANEL, code = %removed.code, "Coupon deleted");
        self.coupons = store.coupons().await?;
        Ok(removed)
    }

    /// Find a coupon by exact id or, failing that, by code.
    pub fn resolve(&self, id_or_code: &str) -> ConsoleResult<&Coupon> {
        self.coupons
            .iter()
            .find(|c| c.id == id_or_code)
            .or_else(|| {
                self.coupons
                    .iter()
                    .find(|c| c.code.eq_ignore_ascii_case(id_or_code.trim()))
            })
            .ok_or_else(|| ConsoleError::CouponNotFound(id_or_code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::store::MemoryStore;

    #[test]
    fn test_generated_codes() {
        let code = generate_code();
        assert_eq!(code.len(), GENERATED_CODE_LEN);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_new_coupon_rules() {
        assert!(NewCoupon::new("SPRING", 10).validate().is_ok());
        assert!(NewCoupon::new("   ", 10).validate().is_err());
        assert!(NewCoupon::new("X", 101).validate().is_err());
        assert!(NewCoupon::new("X", -1).validate().is_err());
        assert_eq!(NewCoupon::new("  X  ", 0).code, "X");
    }

    #[tokio::test]
    async fn test_empty_store_shows_empty_panel() {
        let store = MemoryStore::new();
        let panel = CouponsPanel::load(&store).await.unwrap();
        assert!(panel.is_empty());
        assert!(panel.render().is_empty());
    }

    #[tokio::test]
    async fn test_add_refreshes_listing() {
        let store = MemoryStore::new();
        let mut panel = CouponsPanel::load(&store).await.unwrap();
        let created = panel
            .add_coupon(&store, NewCoupon::new("SPRING", 10))
            .await
            .unwrap();
        assert_eq!(panel.coupons(), &[created.clone()]);

        let table = panel.render();
        assert_eq!(table[0][0].text, "SPRING");
        assert_eq!(table[0][1].text, "10 % in commissions");
        assert_eq!(table[0][2].text, "Delete");
        assert_eq!(CouponsPanel::elements()[2].align, Align::Center);

        assert_eq!(panel.resolve("spring").unwrap().id, created.id);
        assert_eq!(panel.resolve(&created.id).unwrap().code, "SPRING");
    }

    #[tokio::test]
    async fn test_duplicate_sets_inline_error() {
        let store = MemoryStore::new();
        let mut panel = CouponsPanel::load(&store).await.unwrap();
        panel
            .add_coupon(&store, NewCoupon::new("SPRING", 10))
            .await
            .unwrap();
        let err = panel
            .add_coupon(&store, NewCoupon::new("Spring", 20))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateCoupon);
        assert_eq!(panel.error(), Some(DUPLICATE_COUPON));
        assert_eq!(panel.coupons().len(), 1);

        panel.clear_error();
        assert!(panel.error().is_none());
    }

    #[tokio::test]
    async fn test_invalid_discount_is_validation_error() {
        let store = MemoryStore::new();
        let mut panel = CouponsPanel::default();
        let err = panel
            .add_coupon(&store, NewCoupon::new("BIG", 150))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
        assert!(panel.error().is_none());
    }

    #[tokio::test]
    async fn test_delete_refreshes_listing() {
        let store = MemoryStore::new();
        let mut panel = CouponsPanel::load(&store).await.unwrap();
        let c = panel
            .add_coupon(&store, NewCoupon::new("A1", 1))
            .await
            .unwrap();
        panel.delete_coupon(&store, &c.id).await.unwrap();
        assert!(panel.is_empty());
        assert_eq!(
            panel.delete_coupon(&store, &c.id).await.unwrap_err().code(),
            ErrorCode::CouponNotFound
        );
    }
}
