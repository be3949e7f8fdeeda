// src/evaluation/validity.rs
//
// Decides whether a trial can be evaluated at all and whether it is valid.
//
// The achievable window starts once BOTH hand and object have been detected
// for `min_consecutive_detections` frames in a row. Every identification
// statistic downstream is computed over [achievable_index, N).

use super::run_length::{first_run_of_at_least, longest_false_run};
use crate::types::{EvaluationConfig, FrameRecord};
use tracing::debug;

pub const REASON_ABSOLUTE_TIME_OK: &str = "achievable absolute time enough";
pub const REASON_ABSOLUTE_TIME_KO: &str = "achievable absolute time not enough";
pub const REASON_RELATIVE_TIME_OK: &str = "achievable relative time enough";
pub const REASON_RELATIVE_TIME_KO: &str = "achievable relative time not enough";
pub const REASON_HAND_DROPOUT_OK: &str = "not too many consecutive failed hand detections";
pub const REASON_HAND_DROPOUT_KO: &str = "too many consecutive failed hand detections";
pub const REASON_OBJECT_DROPOUT_OK: &str = "not too many consecutive failed object detections";
pub const REASON_OBJECT_DROPOUT_KO: &str = "too many consecutive failed object detections";

/// Detection statistics for one tracked entity (task hand or task object)
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSummary {
    pub nb_found: usize,
    pub ratio_found: f64,
    /// Start of the first stable detection run, `N-1` when there is none
    pub idx_first_consecutive_found: usize,
    pub first_found_timestamp: f64,
    /// Detected on every frame from `idx_first_consecutive_found` onward
    pub is_estimation_continuous: bool,
    /// Dropout longer than allowed inside the achievable window
    pub too_many_consecutive_failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialValidity {
    pub trial_nb_frames: usize,
    pub trial_duration: f64,
    pub hand: DetectionSummary,
    pub object: DetectionSummary,
    pub achievable_index: usize,
    pub achievable_timestamp: f64,
    pub achievable_time: f64,
    pub nb_achievable_task_detections: usize,
    pub is_trial_valid: bool,
    pub valid_reasons: Vec<&'static str>,
    pub not_valid_reasons: Vec<&'static str>,
}

/// Classify a trial. Returns `None` when hand or object never stabilised,
/// in which case no evaluation is produced.
pub fn classify(frames: &[FrameRecord], config: &EvaluationConfig) -> Option<TrialValidity> {
    let n = frames.len();
    if n == 0 {
        return None;
    }
    let last = n - 1;
    let min_run = config.min_consecutive_detections;

    let idx_hand = first_run_of_at_least(frames.iter().map(|f| f.task_hand_found), min_run)
        .unwrap_or(last);
    let idx_object = first_run_of_at_least(frames.iter().map(|f| f.task_object_found), min_run)
        .unwrap_or(last);

    let achievable_index = idx_hand.max(idx_object);
    if achievable_index == last {
        debug!(
            "Trial unevaluable: hand stable at {}, object stable at {}, {} frames",
            idx_hand, idx_object, n
        );
        return None;
    }

    let trial_duration = frames[last].timestamp - frames[0].timestamp;
    let achievable_timestamp = frames[achievable_index].timestamp;
    let achievable_time = frames[last].timestamp - achievable_timestamp;
    let nb_achievable_task_detections = n - achievable_index;

    let hand = summarize(
        frames,
        |f| f.task_hand_found,
        idx_hand,
        achievable_index,
        config.max_consecutive_failed_detections,
    );
    let object = summarize(
        frames,
        |f| f.task_object_found,
        idx_object,
        achievable_index,
        config.max_consecutive_failed_detections,
    );

    let absolute_ok = achievable_time > config.min_achievable_time;
    let relative_ok = achievable_time > config.min_achievable_time_ratio * trial_duration;

    let is_trial_valid = (absolute_ok || relative_ok)
        && !hand.too_many_consecutive_failed
        && !object.too_many_consecutive_failed;

    let mut valid_reasons = Vec::new();
    let mut not_valid_reasons = Vec::new();
    for (ok, pass, fail) in [
        (absolute_ok, REASON_ABSOLUTE_TIME_OK, REASON_ABSOLUTE_TIME_KO),
        (relative_ok, REASON_RELATIVE_TIME_OK, REASON_RELATIVE_TIME_KO),
        (
            !hand.too_many_consecutive_failed,
            REASON_HAND_DROPOUT_OK,
            REASON_HAND_DROPOUT_KO,
        ),
        (
            !object.too_many_consecutive_failed,
            REASON_OBJECT_DROPOUT_OK,
            REASON_OBJECT_DROPOUT_KO,
        ),
    ] {
        if ok {
            valid_reasons.push(pass);
        } else {
            not_valid_reasons.push(fail);
        }
    }

    if !is_trial_valid {
        debug!("Trial not valid: {}", not_valid_reasons.join("; "));
    }

    Some(TrialValidity {
        trial_nb_frames: n,
        trial_duration,
        hand,
        object,
        achievable_index,
        achievable_timestamp,
        achievable_time,
        nb_achievable_task_detections,
        is_trial_valid,
        valid_reasons,
        not_valid_reasons,
    })
}

fn summarize<F>(
    frames: &[FrameRecord],
    found: F,
    idx_first_consecutive_found: usize,
    achievable_index: usize,
    max_failed: usize,
) -> DetectionSummary
where
    F: Fn(&FrameRecord) -> bool,
{
    let n = frames.len();
    let nb_found = frames.iter().filter(|&f| found(f)).count();
    let is_estimation_continuous = frames[idx_first_consecutive_found..].iter().all(&found);
    let dropout = longest_false_run(frames[achievable_index..].iter().map(&found));

    DetectionSummary {
        nb_found,
        ratio_found: nb_found as f64 / n as f64,
        idx_first_consecutive_found,
        first_found_timestamp: frames[idx_first_consecutive_found].timestamp,
        is_estimation_continuous,
        too_many_consecutive_failed: dropout > max_failed,
    }
}
