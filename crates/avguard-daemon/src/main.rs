use std::sync::Arc;

use tracing::{info, warn};

use avguard_core::config::{AvguardConfig, AVGUARD_PACKAGE_ID};
use avguard_events::{LifecycleBus, LifecycleEvent};
use avguard_scheduler::listener::LISTENER_NAME;
use avguard_scheduler::{
    ContextProbe, ScanJobEngine, ScanJobSchedulerListener, Schedule, SqliteGateway, SCAN_JOB,
};

/// The daemon's wiring runs after subsystem construction, so an operation
/// context is always available by the time the listener initializes.
struct SteadyState;

impl ContextProbe for SteadyState {
    fn context_available(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "avguard=info".into()),
        )
        .init();

    // load config: explicit path via AVGUARD_CONFIG > ~/.avguard/avguard.toml
    let config_path = std::env::var("AVGUARD_CONFIG").ok();
    let config = AvguardConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        AvguardConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    avguard_scheduler::db::init_db(&db)?;
    drop(db);

    // Gateway over the job store — the reconciliation listener's only effect
    // channel. Its own connection, separate from the engine's.
    let gateway = Arc::new(SqliteGateway::new(rusqlite::Connection::open(db_path)?)?);

    // Seed the scan-job definition (no trigger yet). A fresh insert means
    // this is a first install of the package.
    let schedule = Schedule::Daily {
        hour: config.scan_job.hour,
        minute: config.scan_job.minute,
    };
    let freshly_installed = gateway.seed(&SCAN_JOB, "Scheduled full scan", &schedule)?;

    // Fired-notice channel: ScanJobEngine → scan dispatch task
    let (fired_tx, mut fired_rx) = tokio::sync::mpsc::channel(16);
    let engine = ScanJobEngine::new(rusqlite::Connection::open(db_path)?, Some(fired_tx))?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(engine.run(shutdown_rx));

    // Scan dispatch: receives fired notices and hands them to the configured
    // engine. The scanning itself lives behind this boundary.
    let antivirus = config.antivirus.clone();
    tokio::spawn(async move {
        while let Some(fired) = fired_rx.recv().await {
            if !antivirus.is_enabled() {
                info!(job_id = %fired.job_id, "scanning disabled; skipping fired scan job");
                continue;
            }
            info!(
                job_id = %fired.job_id,
                run = fired.run_count,
                engine = antivirus.default_engine_name(),
                max_file_size_mb = antivirus.max_file_size_mb(),
                always_send_report = antivirus.always_send_report(),
                "dispatching scheduled scan"
            );
        }
    });

    // Component initialization: the listener's post-init recheck runs here.
    // A recheck failure is fatal to startup by design.
    let listener = ScanJobSchedulerListener::initialize(gateway.clone(), &SteadyState)?;

    let bus = Arc::new(LifecycleBus::new());
    bus.register(LISTENER_NAME, listener)?;

    // First boot of a freshly installed package: deliver the install event
    // the host would have emitted.
    if freshly_installed {
        info!(package = AVGUARD_PACKAGE_ID, "fresh install detected");
        bus.emit(&LifecycleEvent::ComponentInstalled {
            package_id: AVGUARD_PACKAGE_ID.to_string(),
        });
    }

    let job = gateway.job(&SCAN_JOB)?;
    info!(
        job_id = %job.id,
        state = %job.state,
        next_run = job.next_run.as_deref().unwrap_or("-"),
        "scan job ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    shutdown_tx.send(true)?;

    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
}
