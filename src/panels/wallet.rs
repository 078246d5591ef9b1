//! Wallet settings per cryptocurrency.
//!
//! Settings of one crypto live in the child namespace `wallets.<CODE>`:
//! `wallets.BTC.ticker`, `wallets.BTC.zeroConfLimit`, ...

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_valid::Validate;
use tracing::info;

use super::{check, from_field_map, to_field_map};
use crate::config::{
    Account, AccountClass, ConsoleConfig, CryptoCurrency, filter_class, filter_coins,
};
use crate::error::{ConsoleError, ConsoleResult};
use crate::fields::{
    self, Cell, Editable, FieldDescriptor, InputKind, Locked, OptionSource, RenderContext,
    ViewKind,
};
use crate::namespace::{FieldMap, Namespace, from_namespace, to_namespace};
use crate::store::{ConfigSnapshot, ConfigStore};

const PANEL: &str = "wallets";

/// Upper bound of any fiat amount entered in the console.
pub const CURRENCY_MAX: i64 = 9_999_999;

/// The only crypto supporting transaction batching.
const BATCHING_CRYPTO: &str = "BTC";
/// Crypto whose zero-conf limit is fixed.
const FIXED_ZERO_CONF_CRYPTO: &str = "ETH";
const WIZARD_WIDTH_ADJUST: u16 = 11;

pub const ZERO_CONF_LIMIT_REQUIRED: &str = "Zero Conf Limit is a required field";

/// Main wallet settings of one crypto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WalletSettings {
    #[serde(default)]
    #[validate(min_length = 1)]
    pub ticker: String,
    #[serde(default)]
    #[validate(min_length = 1)]
    pub wallet: String,
    #[serde(default)]
    #[validate(min_length = 1)]
    pub exchange: String,
    #[serde(default)]
    #[validate(min_length = 1)]
    pub zero_conf: String,
    /// Accepts numbers and numeric strings; `""` counts as missing.
    #[serde(default, deserialize_with = "lenient_integer", skip_serializing_if = "Option::is_none")]
    #[validate(custom = zero_conf_limit_rule)]
    pub zero_conf_limit: Option<i64>,
}

/// Advanced wallet settings of one crypto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedWalletSettings {
    #[serde(default)]
    #[validate(min_length = 1)]
    pub crypto_units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = required_bool)]
    pub allow_transaction_batching: Option<bool>,
}

fn zero_conf_limit_rule(limit: &Option<i64>) -> Result<(), serde_valid::validation::Error> {
    match limit {
        None => Err(serde_valid::validation::Error::Custom(
            ZERO_CONF_LIMIT_REQUIRED.to_string(),
        )),
        Some(n) if !(0..=CURRENCY_MAX).contains(n) => Err(serde_valid::validation::Error::Custom(
            format!("Zero Conf Limit must be between 0 and {CURRENCY_MAX}"),
        )),
        Some(_) => Ok(()),
    }
}

fn required_bool(value: &Option<bool>) -> Result<(), serde_valid::validation::Error> {
    match value {
        Some(_) => Ok(()),
        None => Err(serde_valid::validation::Error::Custom(
            "allowTransactionBatching is a required field".to_string(),
        )),
    }
}

/// Integer from a JSON number or numeric string; null and blank strings are `None`.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    fn from_f64<E: Error>(f: f64) -> Result<i64, E> {
        if f.fract() == 0.0 && f.is_finite() && f.abs() <= i64::MAX as f64 {
            Ok(f as i64)
        } else {
            Err(E::custom(format!("zeroConfLimit must be an integer, got {f}")))
        }
    }

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Some(i)),
            (None, Some(f)) => from_f64(f).map(Some),
            (None, None) => Err(D::Error::custom("zeroConfLimit is out of range")),
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Some(i));
            }
            let f: f64 = s
                .parse()
                .map_err(|_| D::Error::custom(format!("zeroConfLimit must be a number, got '{s}'")))?;
            from_f64(f).map(Some)
        }
        other => Err(D::Error::custom(format!(
            "zeroConfLimit must be a number, got {other}"
        ))),
    }
}

/// Wallet table over every configured cryptocurrency.
#[derive(Debug, Clone)]
pub struct WalletPanel<'a> {
    snapshot: ConfigSnapshot,
    cryptocurrencies: &'a [CryptoCurrency],
    accounts: &'a [Account],
    wizard: bool,
}

impl<'a> WalletPanel<'a> {
    pub fn new(snapshot: ConfigSnapshot, settings: &'a ConsoleConfig) -> Self {
        Self {
            snapshot,
            cryptocurrencies: &settings.cryptocurrencies,
            accounts: &settings.accounts,
            wizard: settings.wizard,
        }
    }

    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    fn context(&self) -> RenderContext<'a> {
        RenderContext {
            cryptocurrencies: self.cryptocurrencies,
            accounts: self.accounts,
        }
    }

    fn crypto_namespace(&self, crypto: &str) -> ConsoleResult<Namespace> {
        if !self.cryptocurrencies.iter().any(|c| c.code == crypto) {
            return Err(ConsoleError::validation(
                PANEL,
                Some("id".to_string()),
                format!("unknown cryptocurrency '{crypto}'"),
            ));
        }
        Namespace::new(crypto)
    }

    /// Raw stored fields of one crypto (empty when unconfigured).
    pub fn fields_of(&self, crypto: &str) -> ConsoleResult<FieldMap> {
        let ns = self.crypto_namespace(crypto)?;
        let wallets = self.snapshot.namespace(&Namespace::WALLETS);
        Ok(from_namespace(&ns, &wallets))
    }

    pub fn is_configured(&self, crypto: &str) -> ConsoleResult<bool> {
        Ok(!self.fields_of(crypto)?.is_empty())
    }

    pub fn settings(&self, crypto: &str) -> ConsoleResult<WalletSettings> {
        from_field_map(PANEL, &self.fields_of(crypto)?)
    }

    pub fn advanced_settings(&self, crypto: &str) -> ConsoleResult<AdvancedWalletSettings> {
        from_field_map(PANEL, &self.fields_of(crypto)?)
    }

    /// One row per cryptocurrency: stored fields plus `id`.
    pub fn rows(&self) -> ConsoleResult<Vec<FieldMap>> {
        self.cryptocurrencies
            .iter()
            .map(|c| {
                let mut row = self.fields_of(&c.code)?;
                row.insert("id".to_string(), Value::String(c.code.clone()));
                Ok(row)
            })
            .collect()
    }

    /// Columns of the main wallet table.
    pub fn elements(&self) -> Vec<FieldDescriptor> {
        let adjust = if self.wizard { WIZARD_WIDTH_ADJUST } else { 0 };
        let account_column = |name: &'static str, header: &'static str, class, width| {
            FieldDescriptor::text(name, header, width)
                .striped()
                .with_view(ViewKind::AccountDisplay { class })
                .with_input(InputKind::Autocomplete {
                    options: OptionSource::Accounts { class },
                })
        };
        vec![
            FieldDescriptor::read_only("id", "Cryptocurrency", 150, ViewKind::CryptoDisplay),
            account_column("ticker", "Ticker", AccountClass::Ticker, 175),
            account_column("wallet", "Wallet", AccountClass::Wallet, 175),
            account_column("exchange", "Exchange", AccountClass::Exchange, 175),
            account_column("zeroConf", "Confidence Checking", AccountClass::ZeroConf, 210),
            FieldDescriptor::text("zeroConfLimit", "0-conf Limit", 145)
                .striped()
                .with_input(InputKind::Number { decimal_places: 0 })
                .editable_when(
                    Editable::ExceptFor(FIXED_ZERO_CONF_CRYPTO),
                    Some(Locked::Dim),
                ),
        ]
        .into_iter()
        .map(|f| f.narrowed(adjust))
        .collect()
    }

    /// Columns of the advanced wallet table.
    pub fn advanced_elements(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::read_only("id", "Cryptocurrency", 180, ViewKind::CryptoDisplay),
            FieldDescriptor::text("cryptoUnits", "Crypto Units", 190)
                .striped()
                .with_input(InputKind::Autocomplete {
                    options: OptionSource::CryptoUnits,
                }),
            FieldDescriptor::text("allowTransactionBatching", "Allow Transaction Batching", 250)
                .striped()
                .with_input(InputKind::Checkbox)
                .with_view(ViewKind::YesNo)
                .editable_when(
                    Editable::OnlyFor(BATCHING_CRYPTO),
                    Some(Locked::Text("No")),
                ),
        ]
    }

    pub fn render(&self) -> ConsoleResult<Vec<Vec<Cell>>> {
        Ok(fields::render_rows(&self.elements(), &self.rows()?, &self.context()))
    }

    pub fn render_advanced(&self) -> ConsoleResult<Vec<Vec<Cell>>> {
        Ok(fields::render_rows(
            &self.advanced_elements(),
            &self.rows()?,
            &self.context(),
        ))
    }

    /// Autocomplete options of column `name` for `crypto`.
    pub fn options(&self, crypto: &str, name: &str) -> Vec<fields::SelectOption> {
        let row = FieldMap::from_iter([("id".to_string(), Value::String(crypto.to_string()))]);
        self.elements()
            .into_iter()
            .chain(self.advanced_elements())
            .find(|f| f.name == name)
            .map(|f| fields::options_for(&f, &row, &self.context()))
            .unwrap_or_default()
    }

    /// Validate and save the main settings of `crypto`.
    ///
    /// The zero-conf limit of a fixed crypto keeps its stored value (0 when unset).
    pub async fn save<S: ConfigStore>(
        &mut self,
        store: &S,
        crypto: &str,
        mut settings: WalletSettings,
    ) -> ConsoleResult<()> {
        if crypto == FIXED_ZERO_CONF_CRYPTO {
            settings.zero_conf_limit = Some(self.stored_zero_conf_limit(crypto)?.unwrap_or(0));
        }
        check(PANEL, &settings)?;
        self.ensure_supported(crypto, AccountClass::Ticker, &settings.ticker)?;
        self.ensure_supported(crypto, AccountClass::Wallet, &settings.wallet)?;
        self.ensure_supported(crypto, AccountClass::Exchange, &settings.exchange)?;
        self.ensure_supported(crypto, AccountClass::ZeroConf, &settings.zero_conf)?;
        let fields = to_field_map(&settings)?;
        self.write(store, crypto, fields).await
    }

    /// Validate and save the advanced settings of `crypto`.
    pub async fn save_advanced<S: ConfigStore>(
        &mut self,
        store: &S,
        crypto: &str,
        settings: AdvancedWalletSettings,
    ) -> ConsoleResult<()> {
        check(PANEL, &settings)?;
        if crypto != BATCHING_CRYPTO && settings.allow_transaction_batching == Some(true) {
            return Err(ConsoleError::validation(
                PANEL,
                Some("allowTransactionBatching".to_string()),
                format!("Transaction batching is only available for {BATCHING_CRYPTO}"),
            ));
        }
        let units_ok = self
            .cryptocurrencies
            .iter()
            .find(|c| c.code == crypto)
            .is_some_and(|c| c.units.contains(&settings.crypto_units));
        if !units_ok {
            return Err(ConsoleError::validation(
                PANEL,
                Some("cryptoUnits".to_string()),
                format!("'{}' is not a unit of {crypto}", settings.crypto_units),
            ));
        }
        let fields = to_field_map(&settings)?;
        self.write(store, crypto, fields).await
    }

    /// Stored `zeroConfLimit` of `crypto`, read on its own so other fields of
    /// the row do not affect it. An unreadable value is an error.
    fn stored_zero_conf_limit(&self, crypto: &str) -> ConsoleResult<Option<i64>> {
        match self.fields_of(crypto)?.remove("zeroConfLimit") {
            None => Ok(None),
            Some(value) => lenient_integer(value).map_err(|e| {
                ConsoleError::validation(PANEL, Some("zeroConfLimit".to_string()), e.to_string())
            }),
        }
    }

    fn ensure_supported(&self, crypto: &str, class: AccountClass, code: &str) -> ConsoleResult<()> {
        if filter_coins(crypto, filter_class(class, self.accounts)).any(|a| a.code == code) {
            return Ok(());
        }
        Err(ConsoleError::validation(
            PANEL,
            Some(class.field().to_string()),
            format!("'{code}' is not a {class} option for {crypto}"),
        ))
    }

    async fn write<S: ConfigStore>(
        &mut self,
        store: &S,
        crypto: &str,
        fields: FieldMap,
    ) -> ConsoleResult<()> {
        let ns = self.crypto_namespace(crypto)?;
        let partial = to_namespace(&Namespace::WALLETS, &to_namespace(&ns, &fields));
        self.snapshot = store.save(partial).await?;
        info!(target: "atmconsole::panels", panel = PANEL, crypto, "Saved");
        Ok(())
    }
}
