/*!
Declarative field descriptors and the generic table builder.

Panels describe their columns/inputs as plain [`FieldDescriptor`] values:
what to show (`ViewKind`), how to edit (`InputKind`) and when editing is
allowed (`Editable`). [`render_rows`] turns descriptors plus row data into
display cells; [`options_for`] resolves autocomplete options for a cell.

Descriptors carry no closures; everything a renderer needs is in the tags and
the [`RenderContext`].
*/

use serde::Serialize;
use serde_json::Value;

use crate::config::{Account, AccountClass, CryptoCurrency, filter_class, filter_coins};
use crate::namespace::FieldMap;

/// Horizontal alignment of a column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Where autocomplete options come from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OptionSource {
    /// Accounts of a class that support the row's crypto.
    Accounts { class: AccountClass },
    /// Display units of the row's crypto.
    CryptoUnits,
}

/// Input widget used while editing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    /// Read-only column.
    None,
    Text,
    Number { decimal_places: u8 },
    Checkbox,
    Autocomplete { options: OptionSource },
}

/// How a value is turned into display text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewKind {
    /// The value itself (strings unquoted, missing as empty).
    Raw,
    /// Crypto code -> crypto display name.
    CryptoDisplay,
    /// Account code -> account display name within a class.
    AccountDisplay { class: AccountClass },
    /// `<n> % in commissions`.
    Percent,
    /// Boolean as `Yes` / `No`.
    YesNo,
    /// A row action button with a fixed label (e.g. delete).
    Action { label: &'static str },
}

/// Per-row editability rule, keyed on the row `id`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "id", rename_all = "snake_case")]
pub enum Editable {
    Always,
    Never,
    OnlyFor(&'static str),
    ExceptFor(&'static str),
}

impl Editable {
    pub fn allows(self, row_id: Option<&str>) -> bool {
        match self {
            Editable::Always => true,
            Editable::Never => false,
            Editable::OnlyFor(id) => row_id == Some(id),
            Editable::ExceptFor(id) => row_id != Some(id),
        }
    }
}

/// Rendering of a cell whose row forbids editing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Locked {
    /// Same text, shown disabled.
    Dim,
    /// Fixed text, shown disabled.
    Text(&'static str),
}

/// One column of a table or one input of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Column header or form label.
    pub header: &'static str,
    pub width: u16,
    pub align: Align,
    pub stripe: bool,
    pub input: InputKind,
    pub view: ViewKind,
    pub editable: Editable,
    /// Cell rendering when `editable` rejects the row.
    pub locked: Option<Locked>,
}

impl FieldDescriptor {
    /// Editable text field with a label.
    pub fn text(name: &'static str, header: &'static str, width: u16) -> Self {
        Self {
            name,
            header,
            width,
            align: Align::Left,
            stripe: false,
            input: InputKind::Text,
            view: ViewKind::Raw,
            editable: Editable::Always,
            locked: None,
        }
    }

    /// Read-only column.
    pub fn read_only(name: &'static str, header: &'static str, width: u16, view: ViewKind) -> Self {
        Self {
            input: InputKind::None,
            view,
            editable: Editable::Never,
            ..Self::text(name, header, width)
        }
    }

    pub fn with_input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }

    pub fn with_view(mut self, view: ViewKind) -> Self {
        self.view = view;
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn striped(mut self) -> Self {
        self.stripe = true;
        self
    }

    pub fn editable_when(mut self, editable: Editable, locked: Option<Locked>) -> Self {
        self.editable = editable;
        self.locked = locked;
        self
    }

    /// Narrow the column, saturating at zero.
    pub fn narrowed(mut self, by: u16) -> Self {
        self.width = self.width.saturating_sub(by);
        self
    }
}

/// Catalogues the renderer resolves display names and options against.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub cryptocurrencies: &'a [CryptoCurrency],
    pub accounts: &'a [Account],
}

/// A rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    pub editable: bool,
    pub disabled: bool,
}

/// A selectable option of an autocomplete input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub code: String,
    pub display: String,
}

fn row_id(row: &FieldMap) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Plain text of a JSON value: strings unquoted, null/missing empty.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn view_text(view: ViewKind, value: Option<&Value>, ctx: &RenderContext<'_>) -> String {
    match view {
        ViewKind::Raw => value_text(value),
        ViewKind::CryptoDisplay => {
            let code = value_text(value);
            ctx.cryptocurrencies
                .iter()
                .find(|c| c.code == code)
                .map(|c| c.display.clone())
                .unwrap_or_default()
        }
        ViewKind::AccountDisplay { class } => {
            let code = value_text(value);
            filter_class(class, ctx.accounts)
                .find(|a| a.code == code)
                .map(|a| a.display.clone())
                .unwrap_or_default()
        }
        ViewKind::Percent => format!("{} % in commissions", value_text(value)),
        ViewKind::YesNo => {
            if value.and_then(Value::as_bool).unwrap_or(false) {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
        ViewKind::Action { label } => label.to_string(),
    }
}

/// Render one cell of `row` for `field`.
pub fn render_cell(field: &FieldDescriptor, row: &FieldMap, ctx: &RenderContext<'_>) -> Cell {
    let editable = field.input != InputKind::None && field.editable.allows(row_id(row));
    let value = row.get(field.name);
    match (editable, field.locked) {
        (false, Some(Locked::Text(text))) => Cell {
            text: text.to_string(),
            editable: false,
            disabled: true,
        },
        (false, Some(Locked::Dim)) => Cell {
            text: view_text(field.view, value, ctx),
            editable: false,
            disabled: true,
        },
        _ => Cell {
            text: view_text(field.view, value, ctx),
            editable,
            disabled: false,
        },
    }
}

/// Render every row against every descriptor, in descriptor order.
pub fn render_rows(
    fields: &[FieldDescriptor],
    rows: &[FieldMap],
    ctx: &RenderContext<'_>,
) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|row| fields.iter().map(|f| render_cell(f, row, ctx)).collect())
        .collect()
}

/// Header line of a table.
pub fn headers(fields: &[FieldDescriptor]) -> Vec<&'static str> {
    fields.iter().map(|f| f.header).collect()
}

/// Autocomplete options for `field` on `row` (empty for other inputs).
pub fn options_for(
    field: &FieldDescriptor,
    row: &FieldMap,
    ctx: &RenderContext<'_>,
) -> Vec<SelectOption> {
    let Some(crypto) = row_id(row) else {
        return Vec::new();
    };
    match field.input {
        InputKind::Autocomplete {
            options: OptionSource::Accounts { class },
        } => filter_coins(crypto, filter_class(class, ctx.accounts))
            .map(|a| SelectOption {
                code: a.code.clone(),
                display: a.display.clone(),
            })
            .collect(),
        InputKind::Autocomplete {
            options: OptionSource::CryptoUnits,
        } => ctx
            .cryptocurrencies
            .iter()
            .find(|c| c.code == crypto)
            .map(|c| {
                c.units
                    .iter()
                    .map(|u| SelectOption {
                        code: u.clone(),
                        display: u.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_accounts, default_cryptocurrencies};
    use serde_json::json;

    fn row(v: Value) -> FieldMap {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_editable_rules() {
        assert!(Editable::Always.allows(None));
        assert!(!Editable::Never.allows(Some("BTC")));
        assert!(Editable::OnlyFor("BTC").allows(Some("BTC")));
        assert!(!Editable::OnlyFor("BTC").allows(Some("ETH")));
        assert!(!Editable::ExceptFor("ETH").allows(Some("ETH")));
        assert!(Editable::ExceptFor("ETH").allows(None));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(None), "");
        assert_eq!(value_text(Some(&Value::Null)), "");
        assert_eq!(value_text(Some(&json!("abc"))), "abc");
        assert_eq!(value_text(Some(&json!(12))), "12");
    }

    #[test]
    fn test_locked_cells() {
        let cryptos = default_cryptocurrencies();
        let accounts = default_accounts();
        let ctx = RenderContext {
            cryptocurrencies: &cryptos,
            accounts: &accounts,
        };
        let field = FieldDescriptor::text("flag", "Flag", 100)
            .with_input(InputKind::Checkbox)
            .with_view(ViewKind::YesNo)
            .editable_when(Editable::OnlyFor("BTC"), Some(Locked::Text("No")));

        let btc = render_cell(&field, &row(json!({"id": "BTC", "flag": true})), &ctx);
        assert_eq!(btc, Cell { text: "Yes".into(), editable: true, disabled: false });

        let eth = render_cell(&field, &row(json!({"id": "ETH", "flag": true})), &ctx);
        assert_eq!(eth, Cell { text: "No".into(), editable: false, disabled: true });
    }

    #[test]
    fn test_display_lookups() {
        let cryptos = default_cryptocurrencies();
        let accounts = default_accounts();
        let ctx = RenderContext {
            cryptocurrencies: &cryptos,
            accounts: &accounts,
        };
        let fields = vec![
            FieldDescriptor::read_only("id", "Cryptocurrency", 150, ViewKind::CryptoDisplay),
            FieldDescriptor::text("wallet", "Wallet", 175).with_view(ViewKind::AccountDisplay {
                class: AccountClass::Wallet,
            }),
            FieldDescriptor::read_only("discount", "Discount", 220, ViewKind::Percent),
        ];
        let rows = vec![row(json!({"id": "BTC", "wallet": "bitcoind", "discount": 5}))];
        let out = render_rows(&fields, &rows, &ctx);
        assert_eq!(out[0][0].text, "Bitcoin");
        assert!(!out[0][0].editable);
        assert_eq!(out[0][1].text, "bitcoind");
        assert_eq!(out[0][2].text, "5 % in commissions");
        assert_eq!(headers(&fields), vec!["Cryptocurrency", "Wallet", "Discount"]);
    }

    #[test]
    fn test_options_filter_by_class_and_coin() {
        let cryptos = default_cryptocurrencies();
        let accounts = default_accounts();
        let ctx = RenderContext {
            cryptocurrencies: &cryptos,
            accounts: &accounts,
        };
        let wallet = FieldDescriptor::text("wallet", "Wallet", 175).with_input(InputKind::Autocomplete {
            options: OptionSource::Accounts {
                class: AccountClass::Wallet,
            },
        });
        let opts = options_for(&wallet, &row(json!({"id": "ETH"})), &ctx);
        assert_eq!(
            opts,
            vec![SelectOption {
                code: "geth".into(),
                display: "geth".into()
            }]
        );

        let units = FieldDescriptor::text("cryptoUnits", "Units", 190).with_input(InputKind::Autocomplete {
            options: OptionSource::CryptoUnits,
        });
        let codes: Vec<_> = options_for(&units, &row(json!({"id": "BTC"})), &ctx)
            .into_iter()
            .map(|o| o.code)
            .collect();
        assert_eq!(codes, vec!["full", "mill"]);

        assert!(options_for(&units, &row(json!({})), &ctx).is_empty());
    }

    #[test]
    fn test_narrowed_saturates() {
        assert_eq!(FieldDescriptor::text("a", "A", 5).narrowed(11).width, 0);
        assert_eq!(FieldDescriptor::text("a", "A", 150).narrowed(11).width, 139);
    }
}
