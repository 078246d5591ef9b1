use anyhow::{Context, Result, anyhow, bail};
use schemars::{Schema, schema_for};
use serde_valid::Validate;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::models::ConsoleConfig;

/// Load settings from a string slice.
pub fn load_from_str(s: &str) -> Result<ConsoleConfig> {
    let cfg: ConsoleConfig =
        serde_json::from_str(s).context("Failed to parse JSON settings string")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load settings from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<ConsoleConfig> {
    let cfg: ConsoleConfig =
        serde_json::from_reader(reader).context("Failed to parse JSON settings from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load settings from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ConsoleConfig> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open settings file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)?;
    debug!("Loaded settings from {}", path_ref.display());
    Ok(cfg)
}

/// Load settings from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<ConsoleConfig> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read settings file {}", path_ref.display()))?;
    let cfg: ConsoleConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON settings from {}", path_ref.display()))?;
    validate_config(&cfg)?;
    debug!("Loaded settings from {}", path_ref.display());
    Ok(cfg)
}

/// Like `load_from_path_async`, but a missing file yields the defaults.
pub async fn load_or_default_async<P: AsRef<Path>>(path: P) -> Result<ConsoleConfig> {
    let path_ref = path.as_ref();
    match tokio::fs::metadata(path_ref).await {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                path = %path_ref.display(),
                "Settings file not found; using defaults"
            );
            Ok(ConsoleConfig::default())
        }
        _ => load_from_path_async(path_ref).await,
    }
}

/// Generate the JSON Schema for the settings model.
pub fn generate_schema() -> Schema {
    schema_for!(ConsoleConfig)
}

/// Write the JSON Schema for the settings model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Field-level rules (serde_valid) plus catalogue cross-references:
/// - crypto codes are unique
/// - every account lists only known cryptos
/// - an account code appears at most once per class
pub fn validate_config(cfg: &ConsoleConfig) -> Result<()> {
    cfg.store
        .validate()
        .map_err(|e| anyhow!("Invalid settings: store: {e}"))?;

    let mut codes = BTreeSet::new();
    for (idx, crypto) in cfg.cryptocurrencies.iter().enumerate() {
        crypto
            .validate()
            .map_err(|e| anyhow!("Invalid cryptocurrency at index {idx}: {e}"))?;
        if !codes.insert(crypto.code.as_str()) {
            bail!("Duplicate cryptocurrency code '{}'", crypto.code);
        }
    }

    let mut seen = BTreeSet::new();
    for (idx, account) in cfg.accounts.iter().enumerate() {
        account
            .validate()
            .map_err(|e| anyhow!("Invalid account at index {idx}: {e}"))?;
        if !seen.insert((account.class, account.code.as_str())) {
            bail!(
                "Account '{}' is listed twice for class '{}'",
                account.code,
                account.class
            );
        }
        for c in &account.cryptos {
            if !codes.contains(c.as_str()) {
                bail!(
                    "Account '{}' refers to unknown cryptocurrency '{}'",
                    account.code,
                    c
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let cfg = load_from_str("{}").unwrap();
        assert_eq!(cfg.store.path, "atmconsole.json");
        assert!(!cfg.wizard);
        assert_eq!(cfg.watch.debounce_ms, 250);
        assert!(cfg.cryptocurrencies.iter().any(|c| c.code == "BTC"));
    }

    #[test]
    fn test_rejects_unknown_crypto_reference() {
        let s = r#"{
            "cryptocurrencies": [{"code": "BTC", "display": "Bitcoin"}],
            "accounts": [{"code": "geth", "display": "geth", "class": "wallet", "cryptos": ["ETH"]}]
        }"#;
        let err = load_from_str(s).unwrap_err();
        assert!(err.to_string().contains("unknown cryptocurrency 'ETH'"));
    }

    #[test]
    fn test_rejects_duplicate_crypto() {
        let s = r#"{
            "cryptocurrencies": [
                {"code": "BTC", "display": "Bitcoin"},
                {"code": "BTC", "display": "Bitcoin again"}
            ],
            "accounts": []
        }"#;
        assert!(load_from_str(s).is_err());
    }

    #[test]
    fn test_same_code_allowed_across_classes() {
        let s = r#"{
            "cryptocurrencies": [{"code": "BTC", "display": "Bitcoin"}],
            "accounts": [
                {"code": "kraken", "display": "Kraken", "class": "ticker", "cryptos": ["BTC"]},
                {"code": "kraken", "display": "Kraken", "class": "exchange", "cryptos": ["BTC"]}
            ]
        }"#;
        assert!(load_from_str(s).is_ok());
    }

    #[test]
    fn test_rejects_empty_store_path() {
        let err = load_from_str(r#"{"store": {"path": ""}}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid settings"));
    }

    #[test]
    fn test_defaults_are_consistent() {
        validate_config(&ConsoleConfig::default()).unwrap();
    }

    #[test]
    fn test_schema_mentions_fields() {
        let mut out = Vec::new();
        write_schema_to_writer(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("cryptocurrencies"));
        assert!(text.contains("debounce_ms"));
    }

    #[test]
    fn test_load_from_reader_validates() {
        let ok = r#"{"wizard": true, "watch": {"debounce_ms": 10}}"#;
        let cfg = load_from_reader(ok.as_bytes()).unwrap();
        assert!(cfg.wizard);
        assert_eq!(cfg.watch.debounce_ms, 10);

        let dup = r#"{"cryptocurrencies": [
            {"code": "BTC", "display": "a"}, {"code": "BTC", "display": "b"}
        ], "accounts": []}"#;
        assert!(load_from_reader(dup.as_bytes()).is_err());
    }

    #[test]
    fn test_load_from_path_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"store": {"path": "/var/lib/atm/doc.json"}}"#).unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.store.path, "/var/lib/atm/doc.json");

        let err = load_from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open settings file"));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = load_or_default_async(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(cfg.store.path, "atmconsole.json");
    }
}
