//! # loopruled: looprule daemon
//!
//! Composition root that wires all adapters together, runs the rule engine
//! and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and install logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the repository, the virtual pump and the notifier (adapters)
//! - Construct the rule service, the action executor and the rule engine
//! - Merge the startup rule set, if one is configured
//! - Evaluate rules on a fixed interval
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use looprule_adapter_http_axum::state::AppState;
use looprule_adapter_storage_sqlite_sqlx::SqliteRuleRepository;
use looprule_adapter_virtual::{LogNotifier, VirtualLoop};
use looprule_app::event_bus::InProcessEventBus;
use looprule_app::executor::ActionExecutor;
use looprule_app::ports::RuleRepository;
use looprule_app::rule_engine::{RuleEngine, RulePhase};
use looprule_app::services::rule_service::RuleService;

use crate::config::Config;

type Engine = RuleEngine<
    Arc<SqliteRuleRepository>,
    VirtualLoop,
    VirtualLoop,
    LogNotifier,
    Arc<InProcessEventBus>,
>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = looprule_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let repo = Arc::new(SqliteRuleRepository::new(db.pool().clone()));

    // Services
    let rule_service = Arc::new(RuleService::new(Arc::clone(&repo)));
    if let Some(path) = &config.rules.import_path {
        import_rule_set(&rule_service, path).await;
    }

    // Virtual pump
    let pump = VirtualLoop::new(config.pump_latency());
    let glucose = config
        .pump
        .simulate_glucose
        .then(|| pump.spawn_glucose_simulation(Duration::from_secs(60)));

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let event_log = spawn_event_log(&event_bus);

    // Engine
    let executor = ActionExecutor::new(pump.clone(), pump, LogNotifier);
    let engine = Arc::new(RuleEngine::new(repo, executor, event_bus));
    let evaluation = spawn_evaluation_loop(engine, config.evaluation_interval());

    // HTTP
    let state = AppState::from_arc(rule_service);
    let app = looprule_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "loopruled listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    evaluation.abort();
    event_log.abort();
    if let Some(task) = glucose {
        task.abort();
    }
    tracing::info!("loopruled stopped");
    Ok(())
}

async fn import_rule_set<R>(service: &RuleService<R>, path: &std::path::Path)
where
    R: RuleRepository,
{
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "cannot read rule set");
            return;
        }
    };
    match service.import_rules(&text).await {
        Ok(summary) => tracing::info!(
            path = %path.display(),
            created = summary.created,
            updated = summary.updated,
            invalid = summary.invalid,
            "rule set imported"
        ),
        Err(err) => tracing::warn!(path = %path.display(), error = %err, "rule set rejected"),
    }
}

/// Run a pass every `every`. Each pass is its own task so a rule waiting on
/// the pump does not hold back evaluation of the others.
fn spawn_evaluation_loop(engine: Arc<Engine>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                match engine.run_pass().await {
                    Ok(runs) => {
                        for run in runs.iter().filter(|run| run.phase == RulePhase::Failed) {
                            tracing::warn!(rule = %run.rule_name, "rule did not complete");
                        }
                    }
                    Err(err) => tracing::error!(error = %err, "evaluation pass failed"),
                }
            });
        }
    })
}

fn spawn_event_log(bus: &InProcessEventBus) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    event_type = %event.event_type,
                    rule_id = ?event.rule_id.map(|id| id.to_string()),
                    data = %event.data,
                    "event"
                ),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
