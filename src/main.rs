// Lineup optimizer entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not the terminal; stdout carries
//    the result JSON)
// 2. Load config
// 3. Dispatch: `import` loads a pool CSV; otherwise the argument is a
//    request JSON file to optimize
// 4. Run the optimizer under a request-scoped timeout, print the result

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use tracing::info;

use lineup_optimizer::config;
use lineup_optimizer::db::Database;
use lineup_optimizer::optimizer::{self, OptimizationParameters, OptimizationResult};
use lineup_optimizer::strategy::StrategyBook;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Lineup optimizer starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} roster slots, {} salary cap",
        config.roster.slots.len(),
        config.roster.salary_cap
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("import") => {
            let [_, csv_path, draft_group, date, games] = args.as_slice() else {
                bail!("usage: lineupopt import <pool.csv> <draft-group> <YYYY-MM-DD> <games>");
            };
            let date: NaiveDate = date.parse().context("invalid slate date")?;
            let games: u32 = games.parse().context("invalid game count")?;
            let db = Database::open(&config.db_path).context("failed to open database")?;
            let imported = db
                .import_pool_csv(&PathBuf::from(csv_path), draft_group, date, games)
                .context("pool import failed")?;
            info!("Imported {imported} players into draft group {draft_group}");
            println!("imported {imported} players");
            Ok(())
        }
        Some(request_path) => {
            let result = run_request(&config, request_path).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        None => bail!("usage: lineupopt <request.json> | lineupopt import <pool.csv> <draft-group> <YYYY-MM-DD> <games>"),
    }
}

/// Parse a request file and run the optimizer under the configured timeout.
///
/// The search itself is synchronous, so it runs on its own thread; a slate
/// that blows past the deadline comes back as a timed-out failure result
/// rather than a partial lineup.
async fn run_request(
    config: &config::Config,
    request_path: &str,
) -> anyhow::Result<OptimizationResult> {
    let text = std::fs::read_to_string(request_path)
        .with_context(|| format!("failed to read request file {request_path}"))?;
    let mut params: OptimizationParameters =
        serde_json::from_str(&text).context("failed to parse request JSON")?;

    // Requests may omit the roster shape; fall back to the site defaults.
    if params.slots.is_empty() {
        params.slots = config.roster.slots.clone();
    }
    if params.salary_cap == 0 {
        params.salary_cap = config.roster.salary_cap;
    }

    let strategy = StrategyBook::new(config.stacking.clone());
    let timeout = std::time::Duration::from_secs(config.request_timeout_secs);

    let db_path = config.db_path.clone();
    run_with_deadline(timeout, move || {
        let db = Database::open(&db_path).context("failed to open database")?;
        match optimizer::optimize(&params, &db, &db, &strategy) {
            Ok(result) => Ok(result),
            Err(optimizer::OptimizerError::InvalidParameters(msg)) => {
                bail!("invalid parameters: {msg}")
            }
            Err(optimizer::OptimizerError::Source(e)) => Err(e),
        }
    })
    .await
}

/// Run `task` on its own thread with a hard deadline.
///
/// A plain OS thread rather than a runtime blocking task: the runtime waits
/// for blocking tasks on shutdown, which would keep the process alive until
/// the stale search finished anyway. A detached thread lets the timed-out
/// result reach stdout and the process exit; the abandoned search dies with
/// the process.
async fn run_with_deadline<F>(
    deadline: std::time::Duration,
    task: F,
) -> anyhow::Result<OptimizationResult>
where
    F: FnOnce() -> anyhow::Result<OptimizationResult> + Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(task());
    });

    match tokio::time::timeout(deadline, rx).await {
        Ok(received) => received.context("optimizer task panicked")?,
        Err(_) => Ok(OptimizationResult::failure(format!(
            "optimization timed out after {}s",
            deadline.as_secs()
        ))),
    }
}

/// Initialize tracing to log to a file (stdout is reserved for result JSON).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("lineup-optimizer.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lineup_optimizer=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
