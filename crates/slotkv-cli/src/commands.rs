use std::io::{self, BufReader};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};
use slotkv_store::{ConcurrentStore, FlushOutcome, SlotTable};

use crate::cli::*;
use crate::config::SlotkvConfig;
use crate::shell::{run_session, Reply, SessionSummary};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => SlotkvConfig::load(path)?,
        None => SlotkvConfig::default(),
    }
    .with_overrides(cli.capacity, cli.snapshot.clone());
    tracing::debug!(?config, "configuration resolved");

    match cli.command {
        Command::Shell(args) => {
            let stdin = io::stdin();
            cmd_session(&config, stdin.lock(), args.persist_on_exit)
        }
        Command::Run(args) => {
            let file = std::fs::File::open(&args.script)
                .with_context(|| format!("opening script {}", args.script.display()))?;
            cmd_session(&config, BufReader::new(file), args.persist_on_exit)
        }
        Command::Inspect(args) => {
            let path = args.snapshot.unwrap_or_else(|| config.snapshot_path.clone());
            cmd_inspect(&path, &cli.format)
        }
    }
}

fn open_store(config: &SlotkvConfig) -> anyhow::Result<ConcurrentStore<Value>> {
    let policy = config.persist.build::<Value>();
    let store = ConcurrentStore::open(config.store_options(), move |t: &SlotTable<Value>| {
        policy.should_persist(t)
    })?;
    Ok(store)
}

fn cmd_session(
    config: &SlotkvConfig,
    input: impl io::BufRead,
    persist_on_exit: bool,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stdout = io::stdout();
    let SessionSummary { commands, errors } =
        run_session(&store, input, stdout.lock(), render_reply)?;

    if persist_on_exit {
        let bytes = store.persist()?;
        println!(
            "{} Snapshot written to {} ({} bytes)",
            "✓".green().bold(),
            config.snapshot_path.display().to_string().bold(),
            bytes
        );
    }
    if errors > 0 {
        eprintln!("{} {} of {} commands failed", "!".red().bold(), errors, commands);
    }
    Ok(())
}

fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Error(_) => reply.to_string().red().to_string(),
        Reply::Stored { flush: FlushOutcome::Failed(_), .. } => reply.to_string().yellow().to_string(),
        Reply::Stored { .. } | Reply::Persisted { .. } => reply.to_string().green().to_string(),
        Reply::Empty { .. } | Reply::Mismatch { .. } => reply.to_string().dimmed().to_string(),
        _ => reply.to_string(),
    }
}

fn cmd_inspect(path: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let table = SlotTable::<Value>::load(path)
        .with_context(|| format!("loading snapshot {}", path.display()))?;

    match format {
        OutputFormat::Json => {
            let report = inspect_report(&table);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Snapshot {}", path.display().to_string().bold());
            println!("  Capacity: {}", table.capacity());
            println!("  Occupied: {} (load factor {:.3})", table.occupied(), table.load_factor());
            for (index, entry) in table.iter() {
                println!("  [{}] {} = {}", index.to_string().yellow(), entry.key().cyan(), entry.value());
            }
        }
    }
    Ok(())
}

fn inspect_report(table: &SlotTable<Value>) -> Value {
    let entries: Vec<Value> = table
        .iter()
        .map(|(index, e)| json!({ "index": index, "key": e.key(), "value": e.value() }))
        .collect();
    json!({
        "capacity": table.capacity(),
        "occupied": table.occupied(),
        "load_factor": table.load_factor(),
        "entries": entries,
    })
}
