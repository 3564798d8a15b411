use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use starnotary_core::*;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starnotary-cli")]
#[command(about = "Star Notary CLI - mint, trade and look up stars in an in-memory registry")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted end-to-end marketplace demo
    Demo,

    /// Apply a JSON script of operations to a fresh notary
    Run {
        /// Path to a JSON file holding an array of operations
        #[arg(short, long)]
        script: PathBuf,
    },
}

/// One scripted operation. Scripts are JSON arrays of single-key objects,
/// e.g. `{"create": {"id": 1, "name": "Vega", "caller": "alice"}}`.
/// External tagging keeps the `u128` amounts deserializable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptOp {
    Seed {
        account: Address,
        balance: Amount,
    },
    Create {
        id: StarId,
        name: String,
        #[serde(default)]
        symbol: Option<String>,
        caller: Address,
    },
    Sell {
        id: StarId,
        price: Amount,
        caller: Address,
    },
    Buy {
        id: StarId,
        caller: Address,
        value: Amount,
    },
    Transfer {
        id: StarId,
        to: Address,
        caller: Address,
    },
    Exchange {
        id_a: StarId,
        id_b: StarId,
        caller: Address,
    },
    LookUp {
        id: StarId,
    },
    Owner {
        id: StarId,
    },
    Balance {
        account: Address,
    },
    History {
        id: StarId,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Demo => handle_demo(),
        Commands::Run { script } => handle_run(script),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn handle_demo() -> anyhow::Result<()> {
    let notary = Notary::new();
    let alice = CallContext::new("alice");
    let bob = CallContext::new("bob");

    println!("Seeding carol with balance 300");
    notary.ledger().set_balance(&"carol".to_string(), 300);

    println!("Minting star 1 \"Vega\" for alice");
    notary.create_star(1, "Vega".to_string(), Some("VEG".to_string()), &alice)?;

    println!("Minting star 2 \"Sirius\" for bob");
    notary.create_star(2, "Sirius".to_string(), Some("SIR".to_string()), &bob)?;

    println!("Exchanging stars 1 and 2 (triggered by alice)");
    notary.exchange_stars(1, 2, &alice)?;
    println!("  star 1 owner: {}", notary.registry().owner_of(1)?);
    println!("  star 2 owner: {}", notary.registry().owner_of(2)?);

    println!("Listing star 1 for 100 (bob)");
    notary.put_up_for_sale(1, 100, &bob)?;

    println!("Buying star 1 as carol with attached value 150");
    let purchase = notary.buy_star(1, &CallContext::new("carol").with_value(150))?;
    println!(
        "  {} paid {} to {}; only the listed price moved",
        purchase.buyer, purchase.price, purchase.seller
    );

    println!("Transferring star 2 from alice to dave");
    notary.transfer_star(2, "dave".to_string(), &alice)?;

    println!("Looking up star 1: {}", notary.look_up(1)?);

    println!("\nEvent log:");
    for event in notary.registry().events() {
        println!("  {}", event);
    }

    println!("\nHistory of star 1:");
    for event in notary.registry().events_for(1) {
        println!("  {}", event);
    }

    println!("\nFinal balances:");
    for (account, balance) in notary.ledger().get_all_balances() {
        println!("  {}: {}", account, balance);
    }

    println!("\nState root: {}", notary.registry().state_root());
    Ok(())
}

fn handle_run(script: PathBuf) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let ops: Vec<ScriptOp> = serde_json::from_str(&raw).context("invalid script JSON")?;

    let notary = Notary::new();
    for (i, op) in ops.into_iter().enumerate() {
        match apply_op(&notary, op) {
            Ok(outcome) => println!("[{}] ok: {}", i + 1, outcome),
            Err(e) => println!("[{}] error: {}", i + 1, e),
        }
    }

    println!();
    println!("State root: {}", notary.registry().state_root());
    Ok(())
}

fn apply_op(notary: &Notary, op: ScriptOp) -> Result<String> {
    match op {
        ScriptOp::Seed { account, balance } => {
            notary.ledger().set_balance(&account, balance);
            Ok(format!("seeded {} with balance {}", account, balance))
        }
        ScriptOp::Create {
            id,
            name,
            symbol,
            caller,
        } => {
            let ctx = CallContext::new(caller);
            notary.create_star(id, name, symbol, &ctx)?;
            Ok(format!("minted star {} for {}", id, ctx.caller))
        }
        ScriptOp::Sell { id, price, caller } => {
            notary.put_up_for_sale(id, price, &CallContext::new(caller))?;
            Ok(format!("listed star {} for {}", id, price))
        }
        ScriptOp::Buy { id, caller, value } => {
            let ctx = CallContext::new(caller).with_value(value);
            let purchase = notary.buy_star(id, &ctx)?;
            Ok(format!(
                "star {} sold by {} to {} for {}",
                purchase.id, purchase.seller, purchase.buyer, purchase.price
            ))
        }
        ScriptOp::Transfer { id, to, caller } => {
            notary.transfer_star(id, to.clone(), &CallContext::new(caller))?;
            Ok(format!("transferred star {} to {}", id, to))
        }
        ScriptOp::Exchange { id_a, id_b, caller } => {
            notary.exchange_stars(id_a, id_b, &CallContext::new(caller))?;
            Ok(format!("exchanged stars {} and {}", id_a, id_b))
        }
        ScriptOp::LookUp { id } => {
            let name = notary.look_up(id)?;
            Ok(format!("star {} is named {:?}", id, name))
        }
        ScriptOp::Owner { id } => {
            let owner = notary.registry().owner_of(id)?;
            Ok(format!("star {} is owned by {}", id, owner))
        }
        ScriptOp::Balance { account } => {
            let balance = notary.ledger().balance_of(&account);
            Ok(format!("{} has balance {}", account, balance))
        }
        ScriptOp::History { id } => {
            let events = notary.registry().events_for(id);
            if events.is_empty() {
                return Ok(format!("star {} has no recorded events", id));
            }
            let lines: Vec<String> = events.iter().map(|e| e.to_string()).collect();
            Ok(format!("star {} history: {}", id, lines.join("; ")))
        }
    }
}
