use std::env;
use std::net::SocketAddr;

use contracts::{BudgetAction, BudgetState, FiscalSummary, LedgerSide, NarrativeEvent};
use fiscal_api::{serve, ServerConfig};
use fiscal_core::{ApplyOutcome, FiscalStore};
use tracing::info;

fn print_usage() {
    println!("fiscal-cli <command>");
    println!("commands:");
    println!("  state");
    println!("    print the baseline budget and its summary");
    println!("  apply <expenditure|revenue> <id> <value> [seed]");
    println!("    apply one edit to the baseline and print the headlines");
    println!("  replay <actions.json> [seed]");
    println!("    apply a JSON array of actions in order");
    println!("  serve [addr]");
    println!("    default addr: FISCAL_BIND, else 0.0.0.0:$PORT, else 0.0.0.0:3001");
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn parse_side(value: Option<&String>) -> Result<LedgerSide, String> {
    match value.map(String::as_str) {
        Some("expenditure") => Ok(LedgerSide::Expenditure),
        Some("revenue") => Ok(LedgerSide::Revenue),
        Some(other) => Err(format!("invalid side: {other}")),
        None => Err("missing side".to_string()),
    }
}

fn parse_f64(value: Option<&String>, label: &str) -> Result<f64, String> {
    let raw = value.ok_or_else(|| format!("missing {label}"))?;
    raw.parse::<f64>()
        .map_err(|_| format!("invalid {label}: {raw}"))
}

fn parse_optional_seed(value: Option<&String>) -> Result<Option<u64>, String> {
    value
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| format!("invalid seed: {raw}"))
        })
        .transpose()
}

fn store_for(seed: Option<u64>) -> FiscalStore {
    match seed {
        Some(seed) => FiscalStore::with_seed(seed),
        None => FiscalStore::new(),
    }
}

fn print_state(state: &BudgetState) {
    for side in [LedgerSide::Expenditure, LedgerSide::Revenue] {
        println!("{side}:");
        for item in state.items(side) {
            println!("  {:<18} {:>8.1}", item.id, item.value);
        }
    }
    println!(
        "gdp={:.1} inflation={:.2} gilt_yield={:.2} mood={:.1} confidence={:.1} capital={:.1} pending={} tick={}",
        state.gdp,
        state.inflation,
        state.gilt_yield,
        state.public_mood,
        state.market_confidence,
        state.political_capital,
        state.pending_impacts.len(),
        state.tick_count
    );
    println!("{}", FiscalSummary::of(state));
}

fn print_events(events: &[NarrativeEvent]) {
    for event in events {
        println!("  [{:?}] {}", event.kind, event.text);
    }
}

fn print_outcome(action: &BudgetAction, outcome: &ApplyOutcome) {
    println!("tick {} {action} (diff {:+.1})", outcome.state.tick_count, outcome.diff);
    if let Some(violation) = &outcome.recovered_from {
        println!("  reset after invariant violation: {violation}");
    }
    print_events(&outcome.events);
    println!("  {}", FiscalSummary::of(&outcome.state));
}

fn run_apply(args: &[String]) -> Result<(), String> {
    let side = parse_side(args.get(2))?;
    let id = args.get(3).cloned().ok_or_else(|| "missing id".to_string())?;
    let value = parse_f64(args.get(4), "value")?;
    let seed = parse_optional_seed(args.get(5))?;

    let action = BudgetAction::new(side, id, value);
    let mut store = store_for(seed);
    let outcome = store.apply(&action).map_err(|err| err.to_string())?;
    print_outcome(&action, &outcome);
    Ok(())
}

fn run_replay(args: &[String]) -> Result<(), String> {
    let path = args
        .get(2)
        .ok_or_else(|| "missing actions file".to_string())?;
    let seed = parse_optional_seed(args.get(3))?;

    let raw = std::fs::read_to_string(path).map_err(|err| format!("failed to read {path}: {err}"))?;
    let actions: Vec<BudgetAction> =
        serde_json::from_str(&raw).map_err(|err| format!("invalid actions file {path}: {err}"))?;

    let mut store = store_for(seed);
    let mut rejected = 0_usize;
    for action in &actions {
        match store.apply(action) {
            Ok(outcome) => print_outcome(action, &outcome),
            Err(err) => {
                rejected += 1;
                println!("rejected {action}: {err}");
            }
        }
    }

    println!(
        "replayed {} action(s), {} rejected",
        actions.len(),
        rejected
    );
    print_state(store.current());
    Ok(())
}

fn server_config(addr: Option<&String>) -> Result<ServerConfig, String> {
    let mut config = ServerConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(raw) = addr {
        config.bind = raw
            .parse::<SocketAddr>()
            .map_err(|_| format!("invalid addr: {raw}"))?;
    }
    Ok(config)
}

fn exit_with_usage(err: String) -> ! {
    eprintln!("error: {err}");
    print_usage();
    std::process::exit(2);
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("state") => {
            print_state(&FiscalStore::with_seed(0).init());
        }
        Some("apply") => {
            if let Err(err) = run_apply(&args) {
                exit_with_usage(err);
            }
        }
        Some("replay") => {
            if let Err(err) = run_replay(&args) {
                exit_with_usage(err);
            }
        }
        Some("serve") => match server_config(args.get(2)) {
            Ok(config) => {
                info!(addr = %config.bind, "serving fiscal api");
                if let Err(err) = serve(config).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => exit_with_usage(err),
        },
        _ => print_usage(),
    }
}
