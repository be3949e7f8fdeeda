// src/evaluation/identification.rs
//
// Target and grip identification quality.
//
// Every metric is judged the same way: the "stable identification" point is
// the start of the longest run of correct frames inside the achievable window
// (a lucky early single-frame guess does not count), and identification is
// successful when the metric stays correct on enough of the remaining frames.

use super::run_length::{longest_run, switch_ratio};
use super::validity::TrialValidity;
use crate::types::{EvaluationConfig, FrameRecord, MovementPart, TargetMetric};
use tracing::debug;

/// Identification result of one boolean "prediction is correct" column
#[derive(Debug, Clone, PartialEq)]
pub struct MetricIdentification {
    /// Correct frames inside the achievable window
    pub nb_correct: usize,
    /// Absolute frame index of the stable identification, `None` if never correct
    pub idx_first_found: Option<usize>,
    pub longest_run_len: usize,
    pub first_found_timestamp: Option<f64>,
    /// Fraction of wrong frames from the stable identification onward
    pub ratio_switch: Option<f64>,
    pub successful: bool,
}

impl MetricIdentification {
    fn from_column(
        correct: &[bool],
        frames: &[FrameRecord],
        achievable_index: usize,
        max_switch_ratio: f64,
    ) -> Self {
        let window = &correct[achievable_index..];
        let nb_correct = window.iter().filter(|c| **c).count();

        match longest_run(window.iter().copied()) {
            Some(run) => {
                let idx = achievable_index + run.start;
                let ratio = switch_ratio(correct, idx);
                Self {
                    nb_correct,
                    idx_first_found: Some(idx),
                    longest_run_len: run.len,
                    first_found_timestamp: Some(frames[idx].timestamp),
                    ratio_switch: Some(ratio),
                    successful: ratio < max_switch_ratio,
                }
            }
            None => Self {
                nb_correct,
                idx_first_found: None,
                longest_run_len: 0,
                first_found_timestamp: None,
                ratio_switch: None,
                successful: false,
            },
        }
    }
}

/// Frames where an individual metric was right although `max_metric` was wrong
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescueCounts {
    pub total: usize,
    pub beginning: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetIdentification {
    /// Indexed by `TargetMetric::index()`
    pub metrics: Vec<MetricIdentification>,
    /// Indexed like `TargetMetric::INDIVIDUAL`
    pub correct_when_most_probable_wrong: [RescueCounts; 5],
    pub nb_target_not_found_but_individual_metrics_correct: usize,
    pub ratio_target_not_found_but_individual_metrics_correct: f64,
    pub most_trustworthy_metric: TargetMetric,
    pub target_found_ratio: f64,
}

impl TargetIdentification {
    pub fn metric(&self, metric: TargetMetric) -> &MetricIdentification {
        &self.metrics[metric.index()]
    }

    /// The composite `max_metric` vote, used as the trial's main identification
    pub fn main(&self) -> &MetricIdentification {
        self.metric(TargetMetric::MaxMetric)
    }

    pub fn rescued_by(&self, metric: TargetMetric) -> RescueCounts {
        TargetMetric::INDIVIDUAL
            .iter()
            .position(|m| *m == metric)
            .map(|i| self.correct_when_most_probable_wrong[i])
            .unwrap_or_default()
    }
}

/// Grip identification. `nb_grips_found` counts grip frames inside the
/// achievable window only, not over the whole trial.
#[derive(Debug, Clone, PartialEq)]
pub struct GripIdentification {
    pub found: MetricIdentification,
    pub grip_found_ratio: f64,
}

impl GripIdentification {
    pub fn nb_grips_found(&self) -> usize {
        self.found.nb_correct
    }
}

fn is_correct(vote: &str, task_target: &str) -> bool {
    !vote.is_empty() && vote == task_target
}

/// Ratio with an explicit zero-denominator guard
pub(crate) fn guarded_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn identify_target(
    frames: &[FrameRecord],
    task_target: &str,
    validity: &TrialValidity,
    config: &EvaluationConfig,
) -> TargetIdentification {
    let start = validity.achievable_index;
    let nb_achievable = validity.nb_achievable_task_detections;

    let columns: Vec<Vec<bool>> = TargetMetric::ALL
        .iter()
        .map(|m| {
            frames
                .iter()
                .map(|f| is_correct(f.target_from(*m), task_target))
                .collect()
        })
        .collect();

    let metrics: Vec<MetricIdentification> = columns
        .iter()
        .map(|c| MetricIdentification::from_column(c, frames, start, config.max_switch_ratio))
        .collect();

    let main_column = &columns[TargetMetric::MaxMetric.index()];
    let mut rescued = [RescueCounts::default(); 5];
    let mut nb_rescued_frames = 0;

    for idx in start..frames.len() {
        if main_column[idx] {
            continue;
        }
        let part = frames[idx].movement_part;
        let mut any_correct = false;
        for (slot, metric) in TargetMetric::INDIVIDUAL.iter().enumerate() {
            if !columns[metric.index()][idx] {
                continue;
            }
            any_correct = true;
            let counts = &mut rescued[slot];
            counts.total += 1;
            match part {
                MovementPart::Begin => counts.beginning += 1,
                MovementPart::End => counts.end += 1,
                MovementPart::Other => {}
            }
        }
        if any_correct {
            nb_rescued_frames += 1;
        }
    }

    // Whole-trial totals; the first metric in declaration order wins ties
    let most_trustworthy_metric = TargetMetric::INDIVIDUAL
        .iter()
        .map(|m| (*m, columns[m.index()].iter().filter(|c| **c).count()))
        .fold(None, |best: Option<(TargetMetric, usize)>, (m, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((m, count)),
        })
        .map(|(m, _)| m)
        .unwrap_or(TargetMetric::Impacts);

    let main = &metrics[TargetMetric::MaxMetric.index()];
    let target_found_ratio = guarded_ratio(main.nb_correct, nb_achievable);

    debug!(
        "Target '{}': stable at {:?}, switch ratio {:?}, most trustworthy {}",
        task_target,
        main.idx_first_found,
        main.ratio_switch,
        most_trustworthy_metric.as_str()
    );

    TargetIdentification {
        metrics,
        correct_when_most_probable_wrong: rescued,
        nb_target_not_found_but_individual_metrics_correct: nb_rescued_frames,
        ratio_target_not_found_but_individual_metrics_correct: guarded_ratio(
            nb_rescued_frames,
            nb_achievable,
        ),
        most_trustworthy_metric,
        target_found_ratio,
    }
}

pub fn identify_grip(
    frames: &[FrameRecord],
    validity: &TrialValidity,
    config: &EvaluationConfig,
) -> GripIdentification {
    let column: Vec<bool> = frames.iter().map(|f| f.task_grip_found).collect();
    let found = MetricIdentification::from_column(
        &column,
        frames,
        validity.achievable_index,
        config.max_switch_ratio,
    );
    let grip_found_ratio = guarded_ratio(found.nb_correct, validity.nb_achievable_task_detections);

    GripIdentification {
        found,
        grip_found_ratio,
    }
}
