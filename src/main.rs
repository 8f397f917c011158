//! Ward admission demo runner.
//!
//! Loads `.env`, reads an optional JSON configuration from `WARD_CONFIG`,
//! applies `WARD_*` overrides, admits a generated batch and prints the
//! summary.

use std::time::Duration;

use anyhow::{anyhow, Context};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use ward_admission::builders::build_simulated_orchestrator;
use ward_admission::config::AdmissionConfig;
use ward_admission::core::AppResult;
use ward_admission::demo::generate_patients;
use ward_admission::report::{Reporter, TextReporter};
use ward_admission::util::init_tracing;

/// Extra time granted past the batch deadline for cleanup and fan-in.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Bound on waiting for blocking tasks (parked bed waiters) at exit.
const RUNTIME_SHUTDOWN: Duration = Duration::from_secs(1);

fn load_config() -> AppResult<AdmissionConfig> {
    let mut cfg = match std::env::var("WARD_CONFIG") {
        Ok(path) => AdmissionConfig::from_json_file(&path).map_err(|e| anyhow!(e))?,
        Err(_) => AdmissionConfig::default(),
    };
    cfg.apply_env_overrides().map_err(|e| anyhow!(e))?;
    Ok(cfg)
}

fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = load_config().context("loading configuration")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("ward-runtime")
        .build()
        .context("building tokio runtime")?;
    let outcome = runtime.block_on(run(&cfg));
    // Cancelled bed waiters may still be parked on the blocking pool.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN);
    outcome
}

async fn run(cfg: &AdmissionConfig) -> AppResult<()> {
    info!(batch_size = cfg.batch_size, seed = ?cfg.seed, "ward admission system starting");

    let orchestrator = build_simulated_orchestrator(cfg).context("building orchestrator")?;
    let mut rng = cfg.seed.map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);
    let patients = generate_patients(cfg.batch_size, &mut rng);

    let run_timeout = cfg.deadline() + SHUTDOWN_GRACE;
    let result = tokio::time::timeout(run_timeout, orchestrator.run(patients)).await;
    orchestrator.context().diagnosis.shutdown();

    match result {
        Ok(batch) => {
            println!("{}", TextReporter.render(&batch)?);
            info!("ward admission system finished");
            Ok(())
        }
        Err(_) => {
            error!(timeout_ms = run_timeout.as_millis(), "run timeout exceeded");
            Err(anyhow!("run stopped after {run_timeout:?}"))
        }
    }
}
