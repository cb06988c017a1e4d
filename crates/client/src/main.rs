//! `cokins-reconcile`: interactive stock count reconciliation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use cokins_client::{
    ApiError, ClientConfig, HttpStockMovementApi, Notice, Outcome, ReconcileError,
    ReconciliationSession, StockMovementApi,
};
use cokins_core::MovementId;
use cokins_stock::CountPolicy;

/// Command-line arguments for cokins-reconcile
#[derive(Parser, Debug)]
#[command(name = "cokins-reconcile")]
#[command(about = "Reconcile physical stock counts against recorded stock movements")]
#[command(version)]
struct Args {
    /// Backend base URL
    #[arg(long, env = "COKINS_API_URL")]
    api_url: Option<String>,

    /// Bearer token issued by the session layer
    #[arg(long, env = "COKINS_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "COKINS_REQUEST_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// What to do with a count that is not a whole number: coerce (to 0) or reject
    #[arg(long, env = "COKINS_COUNT_POLICY")]
    count_policy: Option<CountPolicy>,

    /// JSON object of `{ "<movementId>": "<count>" }` to use instead of prompting
    #[arg(long)]
    counts: Option<PathBuf>,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    cokins_observability::init_pretty();

    let args = Args::parse();
    let config = build_config(&args)?;
    tracing::info!(api_url = %config.api_url, "starting reconciliation");

    let api = HttpStockMovementApi::new(&config).context("failed to build HTTP client")?;
    let mut session = ReconciliationSession::new(api, config.count_policy);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if let Err(e) = session.load().await {
        println!("{}", Notice::from(&e));
        return Err(e).context("could not load stock movements");
    }
    if session.movements().is_empty() {
        println!("No stock movements recorded.");
        return Ok(());
    }

    match &args.counts {
        Some(path) => apply_counts_file(&mut session, path)?,
        None => prompt_counts(&mut session, &mut input).await?,
    }

    print_discrepancies(&session);
    run_reconciliation(&mut session, &mut input).await
}

fn build_config(args: &Args) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("invalid client configuration")?;
    if let Some(url) = &args.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(token) = &args.token {
        config.auth_token = Some(token.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config.request_timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(policy) = args.count_policy {
        config.count_policy = policy;
    }
    Ok(config)
}

fn apply_counts_file<A>(session: &mut ReconciliationSession<A>, path: &Path) -> Result<()>
where
    A: StockMovementApi,
{
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read counts file {}", path.display()))?;
    let counts: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&raw).context("counts file must be a JSON object")?;

    for (id, value) in counts {
        let text = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        let movement_id: MovementId = id.parse()?;
        if let Err(e) = session.set_count(&movement_id, &text) {
            println!("{}", Notice::from(&e));
        }
    }
    Ok(())
}

async fn prompt_counts<A>(session: &mut ReconciliationSession<A>, input: &mut Input) -> Result<()>
where
    A: StockMovementApi,
{
    println!("Enter the physical count for each movement (blank keeps the system quantity).");
    let rows: Vec<(MovementId, String)> = session
        .movements()
        .iter()
        .map(|m| {
            let label = format!(
                "{:<26} {:<24} {:<12} {:<9} system={}",
                m.movement_id.as_str(),
                m.description,
                m.category,
                m.adjustment_type.as_str(),
                m.quantity
            );
            (m.movement_id.clone(), label)
        })
        .collect();

    for (movement_id, label) in rows {
        loop {
            let line = prompt(input, &format!("{label} > ")).await?;
            let Some(line) = line else { return Ok(()) };
            if line.trim().is_empty() {
                break;
            }
            match session.set_count(&movement_id, &line) {
                Ok(_) => break,
                Err(e) => println!("{}", Notice::from(&e)),
            }
        }
    }
    Ok(())
}

fn print_discrepancies<A>(session: &ReconciliationSession<A>)
where
    A: StockMovementApi,
{
    let report = session.discrepancies();
    let mismatched: Vec<_> = report.iter().filter(|d| !d.is_match()).collect();
    if mismatched.is_empty() {
        println!("All counts match system records.");
        return;
    }

    println!("Discrepancies:");
    for d in mismatched {
        println!(
            "  {:<26} system={:<6} counted={:<6} diff={:+}",
            d.movement_id.as_str(),
            d.system,
            d.counted,
            d.delta
        );
    }
}

async fn run_reconciliation<A>(
    session: &mut ReconciliationSession<A>,
    input: &mut Input,
) -> Result<()>
where
    A: StockMovementApi,
{
    let mut step = session.request_reconciliation().await;

    loop {
        match step {
            Ok(Outcome::Reconciled(receipt)) => {
                let message = receipt
                    .ack
                    .message
                    .clone()
                    .unwrap_or_else(|| "Stock movements reconciled.".to_string());
                println!("{}", Notice::success(message));
                return Ok(());
            }
            Ok(Outcome::NeedsExplanation(movement_id)) => {
                let diff = session.discrepancy(&movement_id).unwrap_or_default();
                let question = format!(
                    "Explain the discrepancy of {diff:+} for {movement_id} (blank cancels) > "
                );
                match prompt(input, &question).await? {
                    Some(text) if !text.trim().is_empty() => {
                        step = session.save_explanation(&text).await;
                    }
                    _ => {
                        session.cancel();
                        println!("Reconciliation cancelled; already saved corrections are kept.");
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                println!("{}", Notice::from(&e));
                if matches!(e, ReconcileError::BulkWrite(ApiError::Conflict(_))) {
                    println!("Stock movements were reloaded; your counts are kept.");
                }
                let retry = prompt(input, "Retry? [y/N] > ").await?;
                if !matches!(retry.as_deref().map(str::trim), Some("y") | Some("Y")) {
                    session.cancel();
                    return Ok(());
                }
                let pending = session.pending_explanation().map(|m| m.movement_id.clone());
                step = match pending {
                    Some(movement_id) => Ok(Outcome::NeedsExplanation(movement_id)),
                    None => session.request_reconciliation().await,
                };
            }
        }
    }
}

/// Print `question` and read one line; `None` at end of input.
async fn prompt(input: &mut Input, question: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}
