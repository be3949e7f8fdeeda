// src/batch.rs
//
// Batch runner: for every configured device, evaluate each participant's
// trials, write the per-participant tables, then the global summary.
// Trials are evaluated on the blocking pool and gathered in label order.

use crate::aggregation::{global_summary, summarize, ParticipantSummary, Table};
use crate::evaluation::{EvaluationRecord, TrialCheck, TrialEvaluator};
use crate::report_writer;
use crate::trial_loader::{self, TrialFile};
use crate::types::Config;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub trials_found: usize,
    pub records: usize,
    pub unevaluable: usize,
    pub failed: usize,
}

/// Evaluate every trial of one participant for one device and write its
/// evaluation and summary files. `Ok(None)` when no analysis file matches.
pub async fn evaluate_participant(
    config: &Config,
    evaluator: Arc<TrialEvaluator>,
    pseudo: &str,
    device_id: &str,
) -> Result<Option<(ParticipantSummary, BatchStats)>> {
    let dir = Path::new(&config.paths.analysis_dir).join(pseudo);
    let files = trial_loader::find_trial_files(&dir, device_id)?;
    if files.is_empty() {
        warn!("No analysis files found for device {} in {}", device_id, dir.display());
        return Ok(None);
    }

    let checks = trial_loader::load_trials_check(&trial_loader::trials_check_path(
        Path::new(&config.paths.pre_processing_dir),
        pseudo,
    ))?;

    let mut stats = BatchStats {
        trials_found: files.len(),
        ..Default::default()
    };

    let handles: Vec<_> = files
        .into_iter()
        .map(|file| {
            let evaluator = Arc::clone(&evaluator);
            let device_id = device_id.to_string();
            let label = file.label.clone();
            let handle =
                tokio::task::spawn_blocking(move || evaluate_file(&evaluator, &file, &device_id));
            (label, handle)
        })
        .collect();

    let mut records: Vec<EvaluationRecord> = Vec::new();
    for (label, handle) in handles {
        let outcome = handle
            .await
            .with_context(|| format!("evaluation task for {label} panicked"))?;
        match outcome {
            Ok(Some(mut record)) => {
                record.check = lookup_check(checks.as_ref(), &label);
                records.push(record);
            }
            Ok(None) => stats.unevaluable += 1,
            Err(e) => {
                warn!("Skipping trial {}: {:#}", label, e);
                stats.failed += 1;
            }
        }
    }
    stats.records = records.len();

    let out_dir = Path::new(&config.paths.evaluation_dir);
    report_writer::save_table(
        &report_writer::evaluation_path(out_dir, pseudo, device_id),
        &Table::from_records(&records),
    )?;

    let summary = summarize(
        pseudo,
        device_id,
        &records,
        stats.trials_found,
        &config.aggregation,
    );
    report_writer::save_summary(
        &report_writer::summary_path(out_dir, pseudo, device_id),
        &summary,
    )?;

    Ok(Some((summary, stats)))
}

fn evaluate_file(
    evaluator: &TrialEvaluator,
    file: &TrialFile,
    device_id: &str,
) -> Result<Option<EvaluationRecord>> {
    let trial = trial_loader::load_trial(file, device_id)?;
    debug!("Evaluating trial {} ({} frames)", trial.label, trial.frames.len());
    let record = evaluator
        .evaluate(&trial)
        .with_context(|| format!("evaluating {}", file.path.display()))?;
    Ok(record)
}

fn lookup_check(checks: Option<&HashMap<String, TrialCheck>>, label: &str) -> Option<TrialCheck> {
    let checks = checks?;
    let check = checks.get(label).copied();
    if check.is_none() {
        warn!("{} has no entry in the trials check table", label);
    }
    check
}

/// Participants from the configuration, or every analysis sub-folder
pub fn participants(config: &Config) -> Result<Vec<String>> {
    if !config.participants.is_empty() {
        return Ok(config.participants.clone());
    }
    trial_loader::discover_participants(Path::new(&config.paths.analysis_dir))
}

/// Evaluate all participants for every configured device
pub async fn run(config: &Config) -> Result<BatchStats> {
    let pseudos = participants(config)?;
    let evaluator = Arc::new(TrialEvaluator::new(
        config.evaluation.clone(),
        config.devices.clone(),
    ));

    let mut devices: Vec<&String> = config.devices.keys().collect();
    devices.sort();

    let mut totals = BatchStats::default();
    for device_id in devices {
        info!("📷 Device {}: {} participant(s)", device_id, pseudos.len());

        let mut summaries = Vec::new();
        for pseudo in &pseudos {
            match evaluate_participant(config, Arc::clone(&evaluator), pseudo, device_id).await {
                Ok(Some((summary, stats))) => {
                    info!(
                        "✓ {}: {} record(s) from {} trial(s), {} unevaluable, {} failed",
                        pseudo, stats.records, stats.trials_found, stats.unevaluable, stats.failed
                    );
                    totals.trials_found += stats.trials_found;
                    totals.records += stats.records;
                    totals.unevaluable += stats.unevaluable;
                    totals.failed += stats.failed;
                    summaries.push(summary);
                }
                Ok(None) => {}
                Err(e) => warn!("Participant {} failed for device {}: {:#}", pseudo, device_id, e),
            }
        }

        if summaries.is_empty() {
            warn!("No summary produced for device {}", device_id);
            continue;
        }
        report_writer::save_transposed(
            &report_writer::global_summary_path(Path::new(&config.paths.evaluation_dir), device_id),
            &global_summary(&summaries),
        )?;
    }

    Ok(totals)
}
