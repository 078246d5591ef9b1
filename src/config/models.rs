use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::fmt;

/// Root settings of the console itself.
///
/// Deserialized from a JSON settings file. It describes:
/// - where the configuration document is persisted (`store`)
/// - whether panels run in first-run `wizard` mode
/// - the cryptocurrency and account catalogues used to build wallet options
/// - file watch tuning (`watch`)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub store: StoreConfig,

    /// Wizard mode: panels open in edit mode and tables are narrower.
    #[serde(default)]
    pub wizard: bool,

    /// Supported cryptocurrencies, one wallet row each.
    #[serde(default = "default_cryptocurrencies")]
    pub cryptocurrencies: Vec<CryptoCurrency>,

    /// Third-party accounts that can serve as ticker, wallet, exchange or
    /// zero-confirmation checker.
    #[serde(default = "default_accounts")]
    pub accounts: Vec<Account>,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            wizard: false,
            cryptocurrencies: default_cryptocurrencies(),
            accounts: default_accounts(),
            watch: WatchConfig::default(),
        }
    }
}

/// Location of the persisted configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct StoreConfig {
    /// Path of the JSON store file.
    #[serde(default = "default_store_path")]
    #[validate(min_length = 1)]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WatchConfig {
    /// Quiet period after the last file event before reloading (default: 250).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// A cryptocurrency the machines can trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CryptoCurrency {
    /// Ticker symbol, e.g. "BTC". Used as the wallet child namespace.
    #[validate(min_length = 1)]
    pub code: String,
    /// Human-readable name, e.g. "Bitcoin".
    pub display: String,
    /// Display units selectable for the crypto (e.g. "full", "mill").
    #[serde(default)]
    pub units: Vec<String>,
}

/// Role an account can play for a wallet.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum AccountClass {
    Ticker,
    Wallet,
    Exchange,
    ZeroConf,
}

impl AccountClass {
    /// Wallet field this class provides options for.
    pub fn field(self) -> &'static str {
        match self {
            AccountClass::Ticker => "ticker",
            AccountClass::Wallet => "wallet",
            AccountClass::Exchange => "exchange",
            AccountClass::ZeroConf => "zeroConf",
        }
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Third-party account entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Account {
    #[validate(min_length = 1)]
    pub code: String,
    pub display: String,
    pub class: AccountClass,
    /// Crypto codes this account supports.
    #[serde(default)]
    pub cryptos: Vec<String>,
}

/// Accounts of one class.
pub fn filter_class(class: AccountClass, accounts: &[Account]) -> impl Iterator<Item = &Account> {
    accounts.iter().filter(move |a| a.class == class)
}

/// Accounts supporting `crypto`.
pub fn filter_coins<'a>(
    crypto: &'a str,
    accounts: impl Iterator<Item = &'a Account>,
) -> impl Iterator<Item = &'a Account> {
    accounts.filter(move |a| a.cryptos.iter().any(|c| c == crypto))
}

fn default_store_path() -> String {
    "atmconsole.json".to_string()
}

fn default_debounce_ms() -> u64 {
    250
}

fn crypto(code: &str, display: &str, units: &[&str]) -> CryptoCurrency {
    CryptoCurrency {
        code: code.to_string(),
        display: display.to_string(),
        units: units.iter().map(|u| u.to_string()).collect(),
    }
}

fn account(code: &str, display: &str, class: AccountClass, cryptos: &[&str]) -> Account {
    Account {
        code: code.to_string(),
        display: display.to_string(),
        class,
        cryptos: cryptos.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn default_cryptocurrencies() -> Vec<CryptoCurrency> {
    vec![
        crypto("BTC", "Bitcoin", &["full", "mill"]),
        crypto("ETH", "Ethereum", &["full", "gwei"]),
        crypto("LTC", "Litecoin", &["full", "mill"]),
        crypto("DASH", "Dash", &["full", "mill"]),
        crypto("BCH", "Bitcoin Cash", &["full", "mill"]),
    ]
}

pub fn default_accounts() -> Vec<Account> {
    use AccountClass::*;
    const ALL_COINS: &[&str] = &["BTC", "ETH", "LTC", "DASH", "BCH"];
    vec![
        account("kraken", "Kraken", Ticker, ALL_COINS),
        account("bitpay", "Bitpay", Ticker, &["BTC", "BCH"]),
        account("bitcoind", "bitcoind", Wallet, &["BTC"]),
        account("geth", "geth", Wallet, &["ETH"]),
        account("litecoind", "litecoind", Wallet, &["LTC"]),
        account("dashd", "dashd", Wallet, &["DASH"]),
        account("bitcoincashd", "bitcoincashd", Wallet, &["BCH"]),
        account("kraken", "Kraken", Exchange, ALL_COINS),
        account("no-exchange", "No exchange", Exchange, ALL_COINS),
        account("none", "Always pass", ZeroConf, ALL_COINS),
        account("blockcypher", "Blockcypher", ZeroConf, &["BTC"]),
    ]
}
