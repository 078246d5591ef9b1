//! Namespace codec: flat field maps <-> namespaced document slices.
//!
//! Both directions are pure and shallow; values are cloned as-is.
//!
//! Field names must not contain [`DELIMITER`](super::DELIMITER). This is not
//! checked: such a name is prefixed like any other and becomes ambiguous on a
//! later read. Composing the functions gives nested namespaces, e.g.
//! `from_namespace(&btc, &from_namespace(&Namespace::WALLETS, &doc))`.

use super::{ConfigDocument, FieldMap, Namespace};

/// Prefix every key of `fields` with `namespace.`.
///
/// The returned partial document has exactly as many keys as `fields`.
pub fn to_namespace(namespace: &Namespace, fields: &FieldMap) -> ConfigDocument {
    let prefix = namespace.prefix();
    fields
        .iter()
        .map(|(k, v)| {
            let mut key = String::with_capacity(prefix.len() + k.len());
            key.push_str(&prefix);
            key.push_str(k);
            (key, v.clone())
        })
        .collect()
}

/// Collect the entries of `document` under `namespace.`, prefix stripped.
///
/// Keys outside the namespace are skipped. An empty map means the namespace is
/// not configured yet.
pub fn from_namespace(namespace: &Namespace, document: &ConfigDocument) -> FieldMap {
    let prefix = namespace.prefix();
    // Keys sharing a prefix are contiguous in a BTreeMap.
    document
        .range(prefix.clone()..)
        .map_while(|(k, v)| k.strip_prefix(prefix.as_str()).map(|f| (f.to_string(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn map(v: Value) -> FieldMap {
        match v {
            Value::Object(m) => m.into_iter().collect(),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_to_namespace_prefixes_keys() {
        let fields = map(json!({"email": "a@b.com", "active": true}));
        let out = to_namespace(&Namespace::OPERATOR_INFO, &fields);
        assert_eq!(
            out,
            map(json!({"operatorInfo.email": "a@b.com", "operatorInfo.active": true}))
        );
    }

    #[test]
    fn test_to_namespace_empty() {
        assert!(to_namespace(&Namespace::LOCALE, &FieldMap::new()).is_empty());
    }

    #[test]
    fn test_from_namespace_skips_other_namespaces() {
        let doc = map(json!({
            "operatorInfo.email": "a@b.com",
            "operatorInfo.active": true,
            "wallet.ticker": "BTC"
        }));
        let out = from_namespace(&Namespace::OPERATOR_INFO, &doc);
        assert_eq!(out, map(json!({"email": "a@b.com", "active": true})));
    }

    #[test]
    fn test_from_namespace_mixed_document() {
        let wallet = Namespace::new("wallet").unwrap();
        let doc = map(json!({
            "operatorInfo.email": "x",
            "wallet.ticker": "BTC",
            "wallet.exchange": "kraken"
        }));
        assert_eq!(
            from_namespace(&wallet, &doc),
            map(json!({"ticker": "BTC", "exchange": "kraken"}))
        );
    }

    #[test]
    fn test_from_namespace_requires_full_prefix() {
        // "walletsX.a" and bare "wallets" must not match "wallets."
        let doc = map(json!({"wallets": 1, "walletsX.a": 2, "wallets.b": 3}));
        assert_eq!(from_namespace(&Namespace::WALLETS, &doc), map(json!({"b": 3})));
    }

    #[test]
    fn test_from_namespace_empty_when_unconfigured() {
        let doc = map(json!({"locale.country": "PT"}));
        let out = from_namespace(&Namespace::OPERATOR_INFO, &doc);
        assert!(out.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_nested_values() {
        let fields = map(json!({
            "name": "Op",
            "limits": {"daily": 100, "tiers": [1, 2, 3]},
            "phone": null
        }));
        let ns = Namespace::COMPLIANCE;
        assert_eq!(from_namespace(&ns, &to_namespace(&ns, &fields)), fields);
    }

    #[test]
    fn test_reencode_reproduces_namespace_slice() {
        let doc = map(json!({
            "locale.country": "PT",
            "locale.languages": ["pt-PT", "en-US"],
            "receipt.active": false
        }));
        let slice = to_namespace(&Namespace::LOCALE, &from_namespace(&Namespace::LOCALE, &doc));
        let expected: ConfigDocument = doc
            .iter()
            .filter(|(k, _)| k.starts_with("locale."))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(slice, expected);
    }

    #[test]
    fn test_nested_composition() {
        let btc = Namespace::new("BTC").unwrap();
        let fields = map(json!({"ticker": "kraken", "zeroConfLimit": 50}));
        let doc = to_namespace(&Namespace::WALLETS, &to_namespace(&btc, &fields));
        assert!(doc.contains_key("wallets.BTC.ticker"));
        let back = from_namespace(&btc, &from_namespace(&Namespace::WALLETS, &doc));
        assert_eq!(back, fields);
    }

    #[test]
    fn test_delimited_field_name_is_prefixed_unchecked() {
        let fields = map(json!({"a.b": 1}));
        let doc = to_namespace(&Namespace::RECEIPT, &fields);
        assert_eq!(doc, map(json!({"receipt.a.b": 1})));

        // The key now also reads as field `b` of a nested `a` namespace.
        let a = Namespace::new("a").unwrap();
        let nested = from_namespace(&a, &from_namespace(&Namespace::RECEIPT, &doc));
        assert_eq!(nested, map(json!({"b": 1})));
    }
}
