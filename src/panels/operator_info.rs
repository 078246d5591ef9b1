//! Operator contact info panel.
//!
//! Backs the info card customers see on the machines. All values live under
//! the `operatorInfo` namespace; the `active` switch is saved on its own.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_valid::Validate;
use tracing::{info, warn};

use super::{EditState, check, from_field_map, to_field_map};
use crate::error::{ConsoleError, ConsoleResult};
use crate::fields::FieldDescriptor;
use crate::namespace::{FieldMap, Namespace, to_namespace};
use crate::store::{ConfigSnapshot, ConfigStore};

const PANEL: &str = "operatorInfo";
const FIELD_WIDTH: u16 = 280;

pub const EMAIL_REQUIRED: &str = "An email is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const SAVE_FAILED: &str = "Failed to save changes";

/// Form values of the info card.
///
/// Stored values are read leniently: null becomes the empty value, numbers and
/// booleans in text fields are stringified, `active` follows truthiness.
/// Arrays and objects are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OperatorInfo {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub active: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(custom = email_rule)]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub website: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_number: String,
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!("expected a string, got {other}"))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_string(deserializer).map(Option::unwrap_or_default)
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => Ok(!s.is_empty()),
        other => Err(D::Error::custom(format!("expected a boolean, got {other}"))),
    }
}

/// Inline message for an email value, if it is not acceptable.
pub fn email_error(email: &str) -> Option<&'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Some(EMAIL_REQUIRED);
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    };
    (!valid).then_some(EMAIL_INVALID)
}

#[allow(clippy::ptr_arg)]
fn email_rule(email: &String) -> Result<(), serde_valid::validation::Error> {
    match email_error(email) {
        Some(msg) => Err(serde_valid::validation::Error::Custom(msg.to_string())),
        None => Ok(()),
    }
}

/// A form input: its descriptor and current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub descriptor: FieldDescriptor,
    pub value: Value,
}

/// Contact info panel state.
#[derive(Debug, Clone)]
pub struct OperatorInfoPanel {
    snapshot: ConfigSnapshot,
    info: OperatorInfo,
    edit: EditState,
    save_error: Option<&'static str>,
}

impl OperatorInfoPanel {
    /// Build the panel; `None` when `operatorInfo` is not configured yet.
    ///
    /// Use this only to tell a fresh install apart. To show the card, use
    /// [`new_or_default`](Self::new_or_default), which renders empty values.
    /// Wizard mode opens directly in edit mode.
    pub fn new(snapshot: ConfigSnapshot, wizard: bool) -> ConsoleResult<Option<Self>> {
        let Some(info) = parse_info(&snapshot)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            snapshot,
            info,
            edit: EditState::new(wizard),
            save_error: None,
        }))
    }

    /// Build the panel, with empty initial values when nothing is configured.
    ///
    /// This is the constructor to use for displaying and editing the card.
    pub fn new_or_default(snapshot: ConfigSnapshot, wizard: bool) -> ConsoleResult<Self> {
        let info = parse_info(&snapshot)?.unwrap_or_default();
        Ok(Self {
            snapshot,
            info,
            edit: EditState::new(wizard),
            save_error: None,
        })
    }

    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Initial form values.
    pub fn initial_values(&self) -> &OperatorInfo {
        &self.info
    }

    pub fn is_active(&self) -> bool {
        self.info.active
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_editing()
    }

    /// Message of the last failed save, if any.
    pub fn save_error(&self) -> Option<&'static str> {
        self.save_error
    }

    pub fn begin_edit(&mut self) -> ConsoleResult<()> {
        self.edit.begin(PANEL)
    }

    /// Leave edit mode and clear the save error.
    pub fn cancel(&mut self) {
        self.edit.finish();
        self.save_error = None;
    }

    /// Editable inputs of the card, in display order.
    pub fn fields(&self) -> Vec<FormField> {
        let text = |s: &str| Value::String(s.to_string());
        vec![
            FormField {
                descriptor: FieldDescriptor::text("name", "Full name", FIELD_WIDTH),
                value: text(&self.info.name),
            },
            FormField {
                descriptor: FieldDescriptor::text("phone", "Phone number", FIELD_WIDTH),
                value: self.info.phone.as_deref().map(text).unwrap_or(Value::Null),
            },
            FormField {
                descriptor: FieldDescriptor::text("email", "Email", FIELD_WIDTH),
                value: text(&self.info.email),
            },
            FormField {
                descriptor: FieldDescriptor::text("website", "Website", FIELD_WIDTH),
                value: text(&self.info.website),
            },
            FormField {
                descriptor: FieldDescriptor::text("companyNumber", "Company number", FIELD_WIDTH),
                value: text(&self.info.company_number),
            },
        ]
    }

    pub fn find_field(&self, name: &str) -> Option<FormField> {
        self.fields().into_iter().find(|f| f.descriptor.name == name)
    }

    /// Inline message to show under the form for `values`.
    pub fn error_message(values: &OperatorInfo) -> Option<&'static str> {
        email_error(&values.email)
    }

    /// Validate and save the whole card. Leaves edit mode on success.
    pub async fn save_form<S: ConfigStore>(
        &mut self,
        store: &S,
        values: &OperatorInfo,
    ) -> ConsoleResult<()> {
        if let Some(msg) = Self::error_message(values) {
            return Err(ConsoleError::validation(PANEL, Some("email".to_string()), msg));
        }
        check(PANEL, values)?;
        let fields = to_field_map(values)?;
        self.save_fields(store, fields).await?;
        self.edit.finish();
        Ok(())
    }

    /// Toggle the info card without touching the other fields.
    pub async fn set_active<S: ConfigStore>(&mut self, store: &S, active: bool) -> ConsoleResult<()> {
        let fields = FieldMap::from_iter([("active".to_string(), Value::Bool(active))]);
        self.save_fields(store, fields).await
    }

    async fn save_fields<S: ConfigStore>(&mut self, store: &S, fields: FieldMap) -> ConsoleResult<()> {
        self.save_error = None;
        match store.save(to_namespace(&Namespace::OPERATOR_INFO, &fields)).await {
            Ok(snapshot) => {
                info!(target: "atmconsole::panels", panel = PANEL, keys = fields.len(), "Saved");
                self.snapshot = snapshot;
                self.info = parse_info(&self.snapshot)?.unwrap_or_default();
                Ok(())
            }
            Err(e) => {
                warn!(target: "atmconsole::panels", panel = PANEL, error = %e, "Save failed");
                self.save_error = Some(SAVE_FAILED);
                Err(e)
            }
        }
    }
}

fn parse_info(snapshot: &ConfigSnapshot) -> ConsoleResult<Option<OperatorInfo>> {
    let fields = snapshot.namespace(&Namespace::OPERATOR_INFO);
    if fields.is_empty() {
        return Ok(None);
    }
    from_field_map(PANEL, &fields).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::namespace::ConfigDocument;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn snapshot(v: Value) -> ConfigSnapshot {
        let doc: ConfigDocument = serde_json::from_value(v).unwrap();
        ConfigSnapshot::new(doc)
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(email_error(""), Some(EMAIL_REQUIRED));
        assert_eq!(email_error("   "), Some(EMAIL_REQUIRED));
        assert_eq!(email_error("nobody"), Some(EMAIL_INVALID));
        assert_eq!(email_error("a@b"), Some(EMAIL_INVALID));
        assert_eq!(email_error("a b@c.com"), Some(EMAIL_INVALID));
        assert_eq!(email_error("a@@c.com"), Some(EMAIL_INVALID));
        assert_eq!(email_error("a@b.com"), None);
        assert_eq!(email_error("ops@atm.example.org"), None);
    }

    #[test]
    fn test_unconfigured_namespace_yields_none() {
        let snap = snapshot(json!({"locale.country": "PT"}));
        assert!(OperatorInfoPanel::new(snap.clone(), false).unwrap().is_none());
        let panel = OperatorInfoPanel::new_or_default(snap, false).unwrap();
        assert_eq!(panel.initial_values(), &OperatorInfo::default());
    }

    #[test]
    fn test_initial_values_default_to_empty_strings() {
        let snap = snapshot(json!({
            "operatorInfo.active": true,
            "operatorInfo.email": "a@b.com",
            "wallets.BTC.ticker": "kraken"
        }));
        let panel = OperatorInfoPanel::new(snap, false).unwrap().unwrap();
        let info = panel.initial_values();
        assert!(info.active);
        assert_eq!(info.email, "a@b.com");
        assert_eq!(info.name, "");
        assert_eq!(info.company_number, "");
        assert_eq!(info.phone, None);
        assert_eq!(panel.find_field("phone").unwrap().value, Value::Null);
        assert_eq!(panel.find_field("email").unwrap().descriptor.header, "Email");
        assert_eq!(panel.fields().len(), 5);
    }

    #[tokio::test]
    async fn test_save_form_writes_namespaced_keys() {
        let store = MemoryStore::new();
        let mut panel = OperatorInfoPanel::new_or_default(store.load().await.unwrap(), false).unwrap();
        panel.begin_edit().unwrap();

        let values = OperatorInfo {
            active: true,
            name: "Satoshi ATMs".into(),
            phone: Some("+351 910 000 000".into()),
            email: "ops@satoshi.example".into(),
            website: "https://satoshi.example".into(),
            company_number: "PT-123".into(),
        };
        panel.save_form(&store, &values).await.unwrap();
        assert!(!panel.is_editing());
        assert_eq!(panel.initial_values(), &values);

        let doc = store.load().await.unwrap();
        assert_eq!(doc.get("operatorInfo.companyNumber"), Some(&json!("PT-123")));
        assert_eq!(doc.get("operatorInfo.active"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_invalid_email_blocks_save() {
        let store = MemoryStore::new();
        let mut panel = OperatorInfoPanel::new_or_default(store.load().await.unwrap(), true).unwrap();
        assert!(panel.is_editing());
        let values = OperatorInfo {
            email: "not-an-email".into(),
            ..OperatorInfo::default()
        };
        let err = panel.save_form(&store, &values).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
        assert_eq!(err.to_string(), format!("operatorInfo: {EMAIL_INVALID}"));
        assert!(panel.is_editing());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_active_only_touches_switch() {
        let store = MemoryStore::with_document(
            serde_json::from_value(json!({
                "operatorInfo.email": "a@b.com",
                "operatorInfo.name": "Op"
            }))
            .unwrap(),
        );
        let mut panel = OperatorInfoPanel::new(store.load().await.unwrap(), false)
            .unwrap()
            .unwrap();
        assert!(!panel.is_active());
        panel.set_active(&store, true).await.unwrap();
        assert!(panel.is_active());
        let doc = store.load().await.unwrap();
        assert_eq!(doc.get("operatorInfo.name"), Some(&json!("Op")));
        assert_eq!(doc.document().len(), 3);
    }

    #[test]
    fn test_stored_values_are_read_leniently() {
        let snap = snapshot(json!({
            "operatorInfo.email": "a@b.com",
            "operatorInfo.name": null,
            "operatorInfo.phone": 351910000000u64,
            "operatorInfo.companyNumber": 42,
            "operatorInfo.active": null
        }));
        let panel = OperatorInfoPanel::new(snap, false).unwrap().unwrap();
        let info = panel.initial_values();
        assert_eq!(info.name, "");
        assert_eq!(info.phone.as_deref(), Some("351910000000"));
        assert_eq!(info.company_number, "42");
        assert!(!info.active);

        let null_phone = snapshot(json!({"operatorInfo.phone": null, "operatorInfo.active": 1}));
        let panel = OperatorInfoPanel::new_or_default(null_phone, false).unwrap();
        assert_eq!(panel.initial_values().phone, None);
        assert!(panel.is_active());
    }

    #[test]
    fn test_structured_values_are_rejected() {
        let snap = snapshot(json!({"operatorInfo.website": ["a", "b"]}));
        let err = OperatorInfoPanel::new_or_default(snap, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
    }

    #[tokio::test]
    async fn test_snapshot_follows_save_even_if_reparse_fails() {
        let store = MemoryStore::with_document(
            serde_json::from_value(json!({"operatorInfo.website": {"url": "x"}})).unwrap(),
        );
        let mut panel = OperatorInfoPanel::new_or_default(ConfigSnapshot::default(), false).unwrap();
        assert!(panel.set_active(&store, true).await.is_err());
        assert_eq!(panel.snapshot(), &store.load().await.unwrap());
        assert_eq!(panel.snapshot().get("operatorInfo.active"), Some(&json!(true)));
    }

    struct FailingStore;

    impl ConfigStore for FailingStore {
        async fn load(&self) -> ConsoleResult<ConfigSnapshot> {
            Ok(ConfigSnapshot::default())
        }

        async fn save(&self, _partial: ConfigDocument) -> ConsoleResult<ConfigSnapshot> {
            Err(ConsoleError::Store("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_failed_save_sets_message() {
        let mut panel = OperatorInfoPanel::new_or_default(ConfigSnapshot::default(), false).unwrap();
        panel.begin_edit().unwrap();
        let values = OperatorInfo {
            email: "a@b.com".into(),
            ..OperatorInfo::default()
        };
        let err = panel.save_form(&FailingStore, &values).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Store);
        assert_eq!(panel.save_error(), Some(SAVE_FAILED));
        assert!(panel.is_editing());

        panel.cancel();
        assert!(panel.save_error().is_none());
        assert!(!panel.is_editing());
    }

    #[test]
    fn test_serde_valid_rule_matches_email_check() {
        let info = OperatorInfo {
            email: "x@y.io".into(),
            ..OperatorInfo::default()
        };
        assert!(info.validate().is_ok());
        let bad = OperatorInfo::default();
        assert!(bad.validate().is_err());
    }
}
