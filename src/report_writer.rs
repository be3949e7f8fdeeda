// src/report_writer.rs
//
// CSV output of the evaluation, participant and global summary tables.
// Missing values are written as empty cells.

use crate::aggregation::session::PARTICIPANT_HEADER;
use crate::aggregation::{ParticipantSummary, Table};
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn evaluation_path(dir: &Path, pseudo: &str, device_id: &str) -> PathBuf {
    dir.join(format!("{pseudo}_{device_id}_evaluation.csv"))
}

pub fn summary_path(dir: &Path, pseudo: &str, device_id: &str) -> PathBuf {
    dir.join(format!("{pseudo}_{device_id}_summary.csv"))
}

pub fn global_summary_path(dir: &Path, device_id: &str) -> PathBuf {
    dir.join(format!("global_summary_{device_id}.csv"))
}

/// Row-per-trial table, first column holding the trial label
pub fn write_table<W: io::Write>(writer: W, table: &Table) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(table.columns.iter().cloned());
    csv.write_record(&header)?;

    for (label, values) in &table.rows {
        let mut record = vec![label.clone()];
        record.extend(values.iter().map(|v| v.to_string()));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Two columns: metric name, value
pub fn write_summary<W: io::Write>(writer: W, summary: &ParticipantSummary) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["metric", "value"])?;
    for (name, value) in &summary.metrics {
        let value = value.map(|v| v.to_string()).unwrap_or_default();
        csv.write_record([name.as_str(), value.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Transposed table without header: one line per column, the first line
/// carrying the row labels
pub fn write_transposed<W: io::Write>(writer: W, table: &Table) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut labels = vec![PARTICIPANT_HEADER.to_string()];
    labels.extend(table.rows.iter().map(|(label, _)| label.clone()));
    csv.write_record(&labels)?;

    for (col, name) in table.columns.iter().enumerate() {
        let mut record = vec![name.clone()];
        record.extend(table.column_values(col).map(|v| v.to_string()));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::File::create(path).with_context(|| format!("creating {}", path.display()))
}

pub fn save_table(path: &Path, table: &Table) -> Result<()> {
    write_table(create(path)?, table).with_context(|| format!("writing {}", path.display()))?;
    info!("💾 Saved {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

pub fn save_summary(path: &Path, summary: &ParticipantSummary) -> Result<()> {
    write_summary(create(path)?, summary)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("💾 Saved summary of {} to {}", summary.pseudo, path.display());
    Ok(())
}

pub fn save_transposed(path: &Path, table: &Table) -> Result<()> {
    write_transposed(create(path)?, table)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("💾 Saved global summary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::FieldValue;

    fn table() -> Table {
        Table {
            columns: vec!["task_target".to_string(), "is_trial_valid".to_string(), "margin".to_string()],
            rows: vec![
                (
                    "t01".to_string(),
                    vec![
                        FieldValue::Text("cup".into()),
                        FieldValue::Bool(true),
                        FieldValue::Float(0.5),
                    ],
                ),
                (
                    "t02".to_string(),
                    vec![
                        FieldValue::Text("bowl".into()),
                        FieldValue::Bool(false),
                        FieldValue::Missing,
                    ],
                ),
            ],
        }
    }

    #[test]
    fn test_write_table() {
        let mut out = Vec::new();
        write_table(&mut out, &table()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            ",task_target,is_trial_valid,margin\nt01,cup,True,0.5\nt02,bowl,False,\n"
        );
    }

    #[test]
    fn test_write_summary() {
        let summary = ParticipantSummary {
            pseudo: "p01".to_string(),
            device_id: "cam".to_string(),
            metrics: vec![
                ("nb_trials".to_string(), Some(12.0)),
                ("mean_movement_duration".to_string(), None),
            ],
        };
        let mut out = Vec::new();
        write_summary(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "metric,value\nnb_trials,12\nmean_movement_duration,\n");
    }

    #[test]
    fn test_write_transposed() {
        let mut out = Vec::new();
        write_transposed(&mut out, &table()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Participant,t01,t02\ntask_target,cup,bowl\nis_trial_valid,True,False\nmargin,0.5,\n"
        );
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = evaluation_path(&dir.path().join("out"), "p01", "cam");
        save_table(&path, &table()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(",task_target"));
    }
}
