use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use atmconsole::config::{self as cfg, ConsoleConfig};
use atmconsole::fields::{self, Cell};
use atmconsole::namespace::{FieldMap, Namespace, to_namespace};
use atmconsole::panels::{
    AdvancedWalletSettings, CouponsPanel, NewCoupon, OperatorInfoPanel, WalletPanel,
    WalletSettings, coupons,
};
use atmconsole::store::{self, ConfigStore, JsonFileStore};

/// atmconsole CLI
#[derive(Debug, Parser)]
#[command(
    name = atmconsole::PKG_NAME,
    version = atmconsole::PKG_VERSION,
    about = "Manage the configuration of a crypto ATM network"
)]
struct Args {
    /// Path to the JSON settings file (defaults apply when it does not exist)
    #[arg(short = 'c', long = "config", default_value = "atmconsole.settings.json")]
    config: PathBuf,

    /// Override the store file path from the settings
    #[arg(long = "store")]
    store: Option<PathBuf>,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the settings file and exit
    #[arg(long = "print-schema")]
    print_schema: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the fields of a namespace as JSON
    Show { namespace: Namespace },
    /// Set fields of a namespace: key=value (values parsed as JSON, else strings)
    Set {
        namespace: Namespace,
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Operator contact info card
    #[command(subcommand)]
    Operator(OperatorCommand),
    /// Wallet settings per cryptocurrency
    #[command(subcommand)]
    Wallet(WalletCommand),
    /// Loyalty discount coupons
    #[command(subcommand)]
    Coupons(CouponCommand),
    /// Print a namespace every time the store file changes (until Ctrl+C)
    Watch { namespace: Namespace },
}

#[derive(Debug, Subcommand)]
enum OperatorCommand {
    Show,
    /// Show the info card on the machines
    Enable,
    /// Hide the info card
    Disable,
    /// Edit the info card; unspecified fields keep their value
    Edit(OperatorEdit),
}

#[derive(Debug, ClapArgs)]
struct OperatorEdit {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long = "company-number")]
    company_number: Option<String>,
}

#[derive(Debug, Subcommand)]
enum WalletCommand {
    /// Main wallet table
    List,
    /// Advanced wallet table
    Advanced,
    /// Set the main settings of one crypto
    Set(WalletSet),
    /// Set the advanced settings of one crypto
    SetAdvanced {
        crypto: String,
        #[arg(long = "units")]
        units: String,
        #[arg(long = "batching")]
        batching: Option<bool>,
    },
    /// List the selectable options of a column for one crypto
    Options { crypto: String, field: String },
}

#[derive(Debug, ClapArgs)]
struct WalletSet {
    crypto: String,
    #[arg(long)]
    ticker: Option<String>,
    #[arg(long)]
    wallet: Option<String>,
    #[arg(long)]
    exchange: Option<String>,
    #[arg(long = "zero-conf")]
    zero_conf: Option<String>,
    #[arg(long = "zero-conf-limit")]
    zero_conf_limit: Option<i64>,
}

#[derive(Debug, Subcommand)]
enum CouponCommand {
    List,
    Add {
        /// Coupon code (omit with --generate)
        code: Option<String>,
        /// Percent off commissions (0-100)
        #[arg(short, long)]
        discount: i64,
        /// Generate a random code
        #[arg(long)]
        generate: bool,
    },
    /// Delete by id or code
    Delete { coupon: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    atmconsole::init_tracing(args.log_level.as_deref());

    if args.print_schema {
        let schema = cfg::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    let Some(command) = args.command else {
        bail!("No command given; see --help");
    };

    let settings = cfg::load_or_default_async(&args.config).await?;
    let store_path = args
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.store.path));
    info!(
        version = atmconsole::PKG_VERSION,
        settings = %args.config.display(),
        store = %store_path.display(),
        "Starting atmconsole"
    );
    let store = JsonFileStore::new(&store_path);

    match command {
        Command::Show { namespace } => {
            let snapshot = store.load().await?;
            let fields = snapshot.namespace(&namespace);
            if fields.is_empty() {
                info!(%namespace, "Namespace is not configured yet");
            }
            print_json(&fields)?;
        }
        Command::Set { namespace, pairs } => {
            let fields = parse_pairs(&pairs)?;
            let snapshot = store.save(to_namespace(&namespace, &fields)).await?;
            print_json(&snapshot.namespace(&namespace))?;
        }
        Command::Operator(cmd) => run_operator(&store, &settings, cmd).await?,
        Command::Wallet(cmd) => run_wallet(&store, &settings, cmd).await?,
        Command::Coupons(cmd) => run_coupons(&store, cmd).await?,
        Command::Watch { namespace } => run_watch(&store, &settings, namespace).await?,
    }

    debug!("atmconsole exited");
    Ok(())
}

async fn run_operator(
    store: &JsonFileStore,
    settings: &ConsoleConfig,
    cmd: OperatorCommand,
) -> anyhow::Result<()> {
    let snapshot = store.load().await?;
    let mut panel = OperatorInfoPanel::new_or_default(snapshot.clone(), settings.wizard)?;
    match cmd {
        OperatorCommand::Show => {
            if snapshot.namespace(&Namespace::OPERATOR_INFO).is_empty() {
                println!("Operator info is not configured yet.");
                return Ok(());
            }
            println!(
                "Info card enabled? {}",
                if panel.is_active() { "Yes" } else { "No" }
            );
            for field in panel.fields() {
                println!(
                    "{:<16} {}",
                    field.descriptor.header,
                    fields::value_text(Some(&field.value))
                );
            }
        }
        OperatorCommand::Enable => panel.set_active(store, true).await?,
        OperatorCommand::Disable => panel.set_active(store, false).await?,
        OperatorCommand::Edit(edit) => {
            let mut values = panel.initial_values().clone();
            if let Some(v) = edit.name {
                values.name = v;
            }
            if let Some(v) = edit.phone {
                values.phone = Some(v);
            }
            if let Some(v) = edit.email {
                values.email = v;
            }
            if let Some(v) = edit.website {
                values.website = v;
            }
            if let Some(v) = edit.company_number {
                values.company_number = v;
            }
            if !panel.is_editing() {
                panel.begin_edit()?;
            }
            if let Err(e) = panel.save_form(store, &values).await {
                if let Some(msg) = panel.save_error() {
                    error!("{msg}");
                }
                return Err(e.into());
            }
            println!("Saved.");
        }
    }
    Ok(())
}

async fn run_wallet(
    store: &JsonFileStore,
    settings: &ConsoleConfig,
    cmd: WalletCommand,
) -> anyhow::Result<()> {
    let mut panel = WalletPanel::new(store.load().await?, settings);
    match cmd {
        WalletCommand::List => {
            let elements = panel.elements();
            print_table(&fields::headers(&elements), &panel.render()?);
        }
        WalletCommand::Advanced => {
            let elements = panel.advanced_elements();
            print_table(&fields::headers(&elements), &panel.render_advanced()?);
        }
        WalletCommand::Set(set) => {
            let current = panel.settings(&set.crypto)?;
            let updated = WalletSettings {
                ticker: set.ticker.unwrap_or(current.ticker),
                wallet: set.wallet.unwrap_or(current.wallet),
                exchange: set.exchange.unwrap_or(current.exchange),
                zero_conf: set.zero_conf.unwrap_or(current.zero_conf),
                zero_conf_limit: set.zero_conf_limit.or(current.zero_conf_limit),
            };
            panel.save(store, &set.crypto, updated).await?;
            println!("Saved {}.", set.crypto);
        }
        WalletCommand::SetAdvanced {
            crypto,
            units,
            batching,
        } => {
            let current = panel.advanced_settings(&crypto)?;
            let updated = AdvancedWalletSettings {
                crypto_units: units,
                allow_transaction_batching: batching
                    .or(current.allow_transaction_batching)
                    .or(Some(false)),
            };
            panel.save_advanced(store, &crypto, updated).await?;
            println!("Saved {crypto}.");
        }
        WalletCommand::Options { crypto, field } => {
            for option in panel.options(&crypto, &field) {
                println!("{}\t{}", option.code, option.display);
            }
        }
    }
    Ok(())
}

async fn run_coupons(store: &JsonFileStore, cmd: CouponCommand) -> anyhow::Result<()> {
    let mut panel = CouponsPanel::load(store).await?;
    match cmd {
        CouponCommand::List => {
            if panel.is_empty() {
                println!("{}", coupons::NO_COUPONS);
            } else {
                print_table(&fields::headers(&CouponsPanel::elements()), &panel.render());
            }
        }
        CouponCommand::Add {
            code,
            discount,
            generate,
        } => {
            let code = match (code, generate) {
                (Some(code), false) => code,
                (None, true) => coupons::generate_code(),
                (Some(_), true) => bail!("Give either a code or --generate, not both"),
                (None, false) => bail!("A coupon code is required (or use --generate)"),
            };
            match panel.add_coupon(store, NewCoupon::new(&code, discount)).await {
                Ok(created) => println!("{}\t{}", created.id, created.code),
                Err(e) => {
                    if let Some(msg) = panel.error() {
                        error!("{msg}");
                    }
                    return Err(e.into());
                }
            }
        }
        CouponCommand::Delete { coupon } => {
            let id = panel.resolve(&coupon)?.id.clone();
            let removed = panel.delete_coupon(store, &id).await?;
            println!("Deleted {}.", removed.code);
        }
    }
    Ok(())
}

async fn run_watch(
    store: &JsonFileStore,
    settings: &ConsoleConfig,
    namespace: Namespace,
) -> anyhow::Result<()> {
    let mut last = store.load().await?.namespace(&namespace);
    print_json(&last)?;

    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(store::watch_document(
        store.path().to_path_buf(),
        Duration::from_millis(settings.watch.debounce_ms),
        tx,
        cancel.clone(),
    ));

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                let fields = snapshot.namespace(&namespace);
                if fields != last {
                    print_json(&fields)?;
                    last = fields;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    cancel.cancel();
    match watcher.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Watcher ended with an error"),
        Err(e) => warn!(error = %e, "Watcher task failed"),
    }
    Ok(())
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<FieldMap> {
    pairs
        .iter()
        .map(|pair| {
            let (key, raw) = pair
                .split_once('=')
                .with_context(|| format!("Expected key=value, got '{pair}'"))?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Ok((key.trim().to_string(), value))
        })
        .collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table(headers: &[&str], rows: &[Vec<Cell>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.text.len() + usize::from(cell.disabled));
        }
    }
    let line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    println!("{}", line.join("  "));
    for row in rows {
        // Locked cells are marked with a trailing '*'.
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| {
                let text = if c.disabled {
                    format!("{}*", c.text)
                } else {
                    c.text.clone()
                };
                format!("{text:<w$}")
            })
            .collect();
        println!("{}", line.join("  "));
    }
}
