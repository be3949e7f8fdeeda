// src/main.rs

use anyhow::Result;
use grasp_evaluation::{batch, Config};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "GRASP_EVAL_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("grasp_evaluation={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🖐️ Grasp Evaluation Starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Thresholds: min_consecutive={}, max_failed={}, min_time={:.2}s ({:.0}%), max_switch={:.2}",
        config.evaluation.min_consecutive_detections,
        config.evaluation.max_consecutive_failed_detections,
        config.evaluation.min_achievable_time,
        config.evaluation.min_achievable_time_ratio * 100.0,
        config.evaluation.max_switch_ratio
    );

    if config.devices.is_empty() {
        warn!("No capture device configured, nothing to evaluate");
        return Ok(());
    }

    let stats = batch::run(&config).await?;

    info!("\n========================================");
    info!("✓ Evaluation complete");
    info!("  Analysis files: {}", stats.trials_found);
    info!("  Evaluated trials: {}", stats.records);
    info!("  Unevaluable trials: {}", stats.unevaluable);
    if stats.failed > 0 {
        warn!("  ⚠️  Failed trials: {}", stats.failed);
    }
    info!("  Results in {}", config.paths.evaluation_dir);
    info!("========================================");

    Ok(())
}
