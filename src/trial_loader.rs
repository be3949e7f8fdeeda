// src/trial_loader.rs
//
// Reads the replay-analysis CSV files of one participant into `Trial`s and
// the pre-processing trials-check table into `TrialCheck`s.

use crate::evaluation::TrialCheck;
use crate::types::{FrameRecord, MovementPart, Side, TargetMetric, TimeToImpact, Trial, TrialLabels};
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const CAM_SEPARATOR: &str = "_cam";

const CHECK_TRIAL_FOLDER: &str = "Trial Folder";
const CHECK_COMBINATION_OK: &str = "Combination OK";
const CHECK_FACE_OK: &str = "Face OK";

/// One analysis file found on disk, with the trial label taken from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialFile {
    pub path: PathBuf,
    pub label: String,
}

/// Participant pseudos, one per sub-folder of the analysis directory, sorted
pub fn discover_participants(analysis_dir: &Path) -> Result<Vec<String>> {
    if !analysis_dir.is_dir() {
        bail!("analysis directory {} does not exist", analysis_dir.display());
    }

    let mut pseudos: Vec<String> = WalkDir::new(analysis_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    pseudos.sort();

    info!("Found {} participants in {}", pseudos.len(), analysis_dir.display());
    Ok(pseudos)
}

/// CSV files of a participant folder whose name mentions `device_id`,
/// ordered by trial label
pub fn find_trial_files(dir: &Path, device_id: &str) -> Result<Vec<TrialFile>> {
    if !dir.is_dir() {
        bail!("participant directory {} does not exist", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if !name.contains(device_id) {
            continue;
        }
        files.push(TrialFile {
            path: path.to_path_buf(),
            label: trial_label(name),
        });
    }
    files.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.path.cmp(&b.path)));

    debug!(
        "Found {} analysis files for device {} in {}",
        files.len(),
        device_id,
        dir.display()
    );
    Ok(files)
}

/// Trial label of an analysis file: everything before `_cam`
pub fn trial_label(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".csv").unwrap_or(file_name);
    stem.split(CAM_SEPARATOR).next().unwrap_or(stem).to_string()
}

/// Ground truth encoded in a trial label:
/// `<pseudo>_<session>_<trial>_<target>_<hand>_<grip>_<mode>[_...]`
pub fn parse_labels(label: &str) -> Option<TrialLabels> {
    let parts: Vec<&str> = label.split('_').collect();
    if parts.len() < 7 {
        return None;
    }
    Some(TrialLabels {
        task_target: parts[3].to_string(),
        task_hand: Side::parse(parts[4]),
        task_grip: parts[5].to_string(),
        movement_mode: parts[6].to_string(),
    })
}

pub fn load_trial(file: &TrialFile, device_id: &str) -> Result<Trial> {
    let labels = parse_labels(&file.label)
        .with_context(|| format!("trial label '{}' has too few fields", file.label))?;
    if labels.task_hand.is_none() {
        warn!("{}: unknown task hand, camera position will be unknown", file.label);
    }

    let reader = std::fs::File::open(&file.path)
        .with_context(|| format!("opening analysis file {}", file.path.display()))?;
    let frames = read_frames(reader)
        .with_context(|| format!("reading analysis file {}", file.path.display()))?;

    Ok(Trial {
        label: file.label.clone(),
        device_id: device_id.to_string(),
        labels,
        frames,
    })
}

/// Column positions of the frame fields, resolved once from the header
struct FrameColumns {
    timestamp: usize,
    hand_found: usize,
    object_found: usize,
    grip_found: usize,
    targets: [usize; 6],
    velocity: usize,
    time_to_impact: usize,
    movement_part: Option<usize>,
}

impl FrameColumns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).with_context(|| format!("missing column '{name}'"));

        // header order
        let timestamp = require("timestamp")?;
        let hand_found = require("task_hand_found")?;
        let object_found = require("task_object_found")?;
        let grip_found = require("task_grip_found")?;

        let mut targets = [0usize; 6];
        for metric in TargetMetric::ALL {
            targets[metric.index()] = require(metric.column())?;
        }

        Ok(Self {
            timestamp,
            hand_found,
            object_found,
            grip_found,
            targets,
            velocity: require("hand_scalar_velocity")?,
            time_to_impact: require("estimated_target_time_to_impact")?,
            movement_part: find("movement_part"),
        })
    }
}

pub fn read_frames<R: io::Read>(reader: R) -> Result<Vec<FrameRecord>> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = FrameColumns::resolve(csv.headers()?)?;

    let mut frames = Vec::new();
    for (row, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("row {row}"))?;
        let cell = |i: usize| record.get(i).unwrap_or("").trim();

        let timestamp = cell(columns.timestamp)
            .parse::<f64>()
            .with_context(|| format!("row {row}: bad timestamp '{}'", cell(columns.timestamp)))?;

        let mut targets: [String; 6] = Default::default();
        for (slot, &i) in targets.iter_mut().zip(columns.targets.iter()) {
            *slot = cell(i).to_string();
        }

        frames.push(FrameRecord {
            timestamp,
            task_hand_found: parse_bool(cell(columns.hand_found)),
            task_object_found: parse_bool(cell(columns.object_found)),
            task_grip_found: parse_bool(cell(columns.grip_found)),
            targets,
            hand_scalar_velocity: cell(columns.velocity).parse().unwrap_or(f64::NAN),
            estimated_target_time_to_impact: TimeToImpact::parse(cell(columns.time_to_impact)),
            movement_part: columns
                .movement_part
                .map_or(MovementPart::Other, |i| MovementPart::parse(cell(i))),
        });
    }
    Ok(frames)
}

/// `<pre_processing_dir>/<pseudo>/<pseudo>_trials_check.csv`
pub fn trials_check_path(pre_processing_dir: &Path, pseudo: &str) -> PathBuf {
    pre_processing_dir
        .join(pseudo)
        .join(format!("{pseudo}_trials_check.csv"))
}

/// Trial label -> manual check flags. `Ok(None)` when the participant has no
/// check table.
pub fn load_trials_check(path: &Path) -> Result<Option<HashMap<String, TrialCheck>>> {
    if !path.is_file() {
        warn!("Trials check file not found in {}", path.display());
        return Ok(None);
    }
    let reader = std::fs::File::open(path)
        .with_context(|| format!("opening trials check file {}", path.display()))?;
    let checks = read_trials_check(reader)
        .with_context(|| format!("reading trials check file {}", path.display()))?;
    Ok(Some(checks))
}

pub fn read_trials_check<R: io::Read>(reader: R) -> Result<HashMap<String, TrialCheck>> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();
    let require = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("missing column '{name}'"))
    };
    let folder = require(CHECK_TRIAL_FOLDER)?;
    let combi = require(CHECK_COMBINATION_OK)?;
    let face = require(CHECK_FACE_OK)?;

    let mut checks = HashMap::new();
    for (row, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("row {row}"))?;
        let cell = |i: usize| record.get(i).unwrap_or("").trim();
        // first entry wins, as a label lookup would
        checks.entry(cell(folder).to_string()).or_insert(TrialCheck {
            combi_ok: parse_bool(cell(combi)),
            face_ok: parse_bool(cell(face)),
        });
    }
    Ok(checks)
}

fn parse_bool(s: &str) -> bool {
    matches!(s, "True" | "true" | "TRUE" | "1" | "1.0")
}
