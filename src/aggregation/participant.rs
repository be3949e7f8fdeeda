// src/aggregation/participant.rs
//
// Per-participant, per-device summary over the evaluation records of one batch.
// Mode and camera counts see every record; everything else only sees trials
// that are valid and correctly combined.

use super::stats::{mean, sample_std};
use crate::evaluation::identification::guarded_ratio;
use crate::evaluation::EvaluationRecord;
use crate::types::{AggregationConfig, CamHandPosition, TargetMetric};
use std::collections::BTreeSet;

const EXECUTED: &str = "executed";
const SIMULATED: &str = "simulated";

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantSummary {
    pub pseudo: String,
    pub device_id: String,
    /// Ordered `(metric, value)` pairs; `None` when there was nothing to average
    pub metrics: Vec<(String, Option<f64>)>,
}

impl ParticipantSummary {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }
}

/// Success counts of one subset of trials
#[derive(Debug, Default, Clone, Copy)]
struct SubsetCounts {
    valid: usize,
    target_successful: usize,
    grip_successful: usize,
}

impl SubsetCounts {
    fn tally<'a>(records: impl Iterator<Item = &'a EvaluationRecord>) -> Self {
        let mut counts = Self::default();
        for r in records {
            counts.valid += 1;
            if r.task_target_identification_successful() {
                counts.target_successful += 1;
            }
            if r.task_grip_identification_successful() {
                counts.grip_successful += 1;
            }
        }
        counts
    }

    fn target_ratio(&self) -> f64 {
        guarded_ratio(self.target_successful, self.valid)
    }

    fn grip_ratio(&self) -> f64 {
        guarded_ratio(self.grip_successful, self.valid)
    }
}

struct Summary {
    metrics: Vec<(String, Option<f64>)>,
}

impl Summary {
    fn count(&mut self, name: impl Into<String>, value: usize) {
        self.metrics.push((name.into(), Some(value as f64)));
    }

    fn value(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.push((name.into(), Some(value)));
    }

    fn maybe(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.metrics.push((name.into(), value));
    }

    /// `sum_`, `mean_` and `sd_` rows over the present values
    fn spread(&mut self, name: &str, values: &[f64]) {
        self.value(format!("sum_{name}"), values.iter().sum());
        self.maybe(format!("mean_{name}"), mean(values));
        self.maybe(format!("sd_{name}"), sample_std(values));
    }
}

fn present<'a, F>(records: &[&'a EvaluationRecord], f: F) -> Vec<f64>
where
    F: Fn(&'a EvaluationRecord) -> Option<f64>,
{
    records
        .iter()
        .filter_map(|&r| f(r))
        .filter(|v| !v.is_nan())
        .collect()
}

fn total(records: &[&EvaluationRecord], f: impl Fn(&EvaluationRecord) -> usize) -> usize {
    records.iter().map(|&r| f(r)).sum()
}

fn count_where(records: &[&EvaluationRecord], pred: impl Fn(&EvaluationRecord) -> bool) -> usize {
    records.iter().filter(|&&r| pred(r)).count()
}

/// Summarize one participant's records for one device.
///
/// `nb_trials` is the number of analysis files found, including those that
/// produced no record.
pub fn summarize(
    pseudo: &str,
    device_id: &str,
    records: &[EvaluationRecord],
    nb_trials: usize,
    config: &AggregationConfig,
) -> ParticipantSummary {
    let mut s = Summary {
        metrics: Vec::with_capacity(160),
    };

    let cam = |p: CamHandPosition| records.iter().filter(|r| r.cam_hand_position == p).count();
    let mode = |m: &str| records.iter().filter(|r| r.labels.movement_mode == m).count();

    s.count("nb_trials", nb_trials);
    s.count("nb_cam_same", cam(CamHandPosition::Same));
    s.count("nb_cam_opposite", cam(CamHandPosition::Opposite));
    s.count("nb_executed", mode(EXECUTED));
    s.count("nb_simulated", mode(SIMULATED));

    let kept: Vec<&EvaluationRecord> = records
        .iter()
        .filter(|r| r.is_trial_valid() && r.combi_ok())
        .collect();

    let all = SubsetCounts::tally(kept.iter().copied());
    let cam_same =
        SubsetCounts::tally(kept.iter().copied().filter(|r| r.cam_hand_position == CamHandPosition::Same));
    let cam_opposite = SubsetCounts::tally(
        kept.iter()
            .copied()
            .filter(|r| r.cam_hand_position == CamHandPosition::Opposite),
    );
    let executed = SubsetCounts::tally(kept.iter().copied().filter(|r| r.labels.movement_mode == EXECUTED));
    let simulated = SubsetCounts::tally(kept.iter().copied().filter(|r| r.labels.movement_mode == SIMULATED));

    s.count("nb_trials_valid", all.valid);
    s.count("nb_valid_and_cam_same", cam_same.valid);
    s.count("nb_valid_and_cam_opposite", cam_opposite.valid);
    s.count("nb_valid_and_executed", executed.valid);
    s.count("nb_valid_and_simulated", simulated.valid);

    s.count("nb_target_successful", all.target_successful);
    for metric in TargetMetric::ALL {
        s.count(
            format!("nb_target_successful_{}", metric.as_str()),
            kept.iter().filter(|r| r.target_successful(metric)).count(),
        );
    }
    s.count("nb_target_successful_and_cam_same", cam_same.target_successful);
    s.count("nb_target_successful_and_cam_opposite", cam_opposite.target_successful);
    s.count("nb_target_successful_and_executed", executed.target_successful);
    s.count("nb_target_successful_and_simulated", simulated.target_successful);

    // Frame-level totals
    let total_frames = total(&kept, |r| r.validity.trial_nb_frames);
    let total_achievable = total(&kept, |r| r.validity.nb_achievable_task_detections);
    let total_found = total(&kept, |r| r.target.main().nb_correct);
    let total_not_found = total_achievable.saturating_sub(total_found);

    s.count("total_nb_frames", total_frames);
    s.count("total_nb_achievable_frames", total_achievable);
    s.count("total_nb_frames_target_found", total_found);
    s.count("total_nb_frames_target_not_found", total_not_found);
    s.count(
        "nb_target_not_found_but_individual_metrics_correct",
        total(&kept, |r| r.target.nb_target_not_found_but_individual_metrics_correct),
    );

    let mut metric_correct = [0usize; 6];
    for metric in TargetMetric::ALL {
        metric_correct[metric.index()] = total(&kept, |r| r.target.metric(metric).nb_correct);
        s.count(
            format!("nb_{}_correct", metric.as_str()),
            metric_correct[metric.index()],
        );
    }

    let mut rescued = [0usize; 5];
    for (suffix, pick) in [("", 0usize), ("_beginning", 1), ("_end", 2)] {
        for metric in TargetMetric::INDIVIDUAL {
            let n = total(&kept, |r| {
                let c = r.target.rescued_by(metric);
                match pick {
                    0 => c.total,
                    1 => c.beginning,
                    _ => c.end,
                }
            });
            if pick == 0 {
                rescued[metric.index()] = n;
            }
            s.count(
                format!("nb_{}_correct_when_target_not_found{suffix}", metric.as_str()),
                n,
            );
        }
    }

    for metric in TargetMetric::INDIVIDUAL {
        s.value(
            format!("ratio_{}_correct", metric.as_str()),
            guarded_ratio(metric_correct[metric.index()], total_achievable),
        );
    }
    for metric in TargetMetric::INDIVIDUAL {
        s.value(
            format!("ratio_{}_correct_when_target_not_found", metric.as_str()),
            guarded_ratio(rescued[metric.index()], total_not_found),
        );
    }

    s.value("ratio_target_successful", all.target_ratio());
    s.value("ratio_target_successful_and_cam_same", cam_same.target_ratio());
    s.value("ratio_target_successful_and_cam_opposite", cam_opposite.target_ratio());

    s.count("nb_grip_successful", all.grip_successful);
    s.count("nb_grip_successful_and_cam_same", cam_same.grip_successful);
    s.count("nb_grip_successful_and_cam_opposite", cam_opposite.grip_successful);
    s.count("nb_grip_successful_and_executed", executed.grip_successful);
    s.count("nb_grip_successful_and_simulated", simulated.grip_successful);

    s.value("ratio_grip_successful", all.grip_ratio());
    s.value("ratio_grip_successful_and_cam_same", cam_same.grip_ratio());
    s.value("ratio_grip_successful_and_cam_opposite", cam_opposite.grip_ratio());
    s.value("ratio_grip_successful_and_executed", executed.grip_ratio());
    s.value("ratio_grip_successful_and_simulated", simulated.grip_ratio());

    // Always 0 over the kept subset; carried for column compatibility
    s.count(
        "nb_trials_invalid_and_target_successful",
        kept.iter()
            .filter(|r| !r.is_trial_valid() && r.task_target_identification_successful())
            .count(),
    );
    s.count(
        "nb_trials_invalid_and_grip_successful",
        kept.iter()
            .filter(|r| !r.is_trial_valid() && r.task_grip_identification_successful())
            .count(),
    );

    // Margins and delays, over the trials where identification succeeded
    let target_found: Vec<&EvaluationRecord> = kept
        .iter()
        .copied()
        .filter(|r| r.task_target_identification_successful())
        .collect();
    let grip_found: Vec<&EvaluationRecord> = kept
        .iter()
        .copied()
        .filter(|r| r.task_grip_identification_successful())
        .collect();

    let main = TargetMetric::MaxMetric;
    s.spread(
        "target_found_margin",
        &present(&target_found, |r| r.timing.target(main).margin),
    );
    s.spread("grip_found_margin", &present(&grip_found, |r| r.timing.grip.margin));
    s.spread(
        "target_found_delay",
        &present(&target_found, |r| r.timing.target(main).delay),
    );
    s.spread("grip_found_delay", &present(&grip_found, |r| r.timing.grip.delay));

    for metric in TargetMetric::ALL {
        let found: Vec<&EvaluationRecord> = kept
            .iter()
            .copied()
            .filter(|r| r.target_successful(metric))
            .collect();
        s.value(
            format!("sum_target_found_margin_{}", metric.as_str()),
            present(&found, |r| r.timing.target(metric).margin).iter().sum(),
        );
        s.value(
            format!("sum_target_found_delay_{}", metric.as_str()),
            present(&found, |r| r.timing.target(metric).delay).iter().sum(),
        );
    }

    s.spread(
        "trial_duration",
        &present(&kept, |r| Some(r.validity.trial_duration)),
    );
    s.spread(
        "movement_duration",
        &present(&kept, |r| Some(r.movement.movement_duration)),
    );
    s.maybe(
        "mean_time_to_target_rmse",
        mean(&present(&kept, |r| r.time_to_target_rmse)),
    );

    // Per-object and per-grip breakdowns
    let objects: Vec<String> = if config.expected_objects.is_empty() {
        records
            .iter()
            .map(|r| r.labels.task_target.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    } else {
        config.expected_objects.clone()
    };

    let target_ok = |r: &EvaluationRecord| r.task_target_identification_successful();
    let grip_ok = |r: &EvaluationRecord| r.task_grip_identification_successful();

    for obj in &objects {
        s.count(
            format!("nb_trials_valid_for_{obj}"),
            count_where(&kept, |r| &r.labels.task_target == obj),
        );
    }
    for grip in &config.grips {
        s.count(
            format!("nb_trials_valid_for_{grip}"),
            count_where(&kept, |r| &r.labels.task_grip == grip),
        );
    }
    for obj in &objects {
        s.count(
            format!("nb_target_found_{obj}"),
            count_where(&kept, |r| &r.labels.task_target == obj && target_ok(r)),
        );
    }
    for obj in &objects {
        s.count(
            format!("nb_grip_found_{obj}"),
            count_where(&kept, |r| &r.labels.task_target == obj && grip_ok(r)),
        );
    }
    for grip in &config.grips {
        s.count(
            format!("nb_grip_found_{grip}"),
            count_where(&kept, |r| &r.labels.task_grip == grip && grip_ok(r)),
        );
    }

    ParticipantSummary {
        pseudo: pseudo.to_string(),
        device_id: device_id.to_string(),
        metrics: s.metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::test_support::FrameBuilder;
    use crate::evaluation::{TrialCheck, TrialEvaluator};
    use crate::types::{EvaluationConfig, Side, Trial, TrialLabels};
    use std::collections::HashMap;

    const RIGHT_CAM: &str = "cam-right";

    fn evaluator() -> TrialEvaluator {
        let mut devices = HashMap::new();
        devices.insert(RIGHT_CAM.to_string(), Side::Right);
        TrialEvaluator::new(EvaluationConfig::default(), devices)
    }

    /// 10 frames at 10 Hz, hand/object stable from frame 2.
    /// `hit` decides whether the max metric votes for the task target.
    fn record(target: &str, hand: Side, mode: &str, hit: bool) -> EvaluationRecord {
        let velocity = [0.0, 0.0, 10.0, 40.0, 90.0, 120.0, 60.0, 20.0, 5.0, 0.0];
        let frames = (0..10)
            .map(|i| {
                let found = i >= 2;
                let vote = if hit && i >= 3 { target } else { "other" };
                FrameBuilder::at(i as f64 * 0.1)
                    .hand(found)
                    .object(found)
                    .target(TargetMetric::MaxMetric, vote)
                    .grip(i >= 4)
                    .velocity(velocity[i])
                    .build()
            })
            .collect();
        let trial = Trial {
            label: format!("p01_s1_t01_{target}_{}_palmar_{mode}", hand.as_str()),
            device_id: RIGHT_CAM.to_string(),
            labels: TrialLabels {
                task_target: target.to_string(),
                task_hand: Some(hand),
                task_grip: "palmar".to_string(),
                movement_mode: mode.to_string(),
            },
            frames,
        };
        evaluator().evaluate(&trial).unwrap().unwrap()
    }

    #[test]
    fn test_counts_and_ratios() {
        let records = vec![
            record("cup", Side::Right, EXECUTED, true),
            record("cup", Side::Left, SIMULATED, false),
            record("bowl", Side::Right, EXECUTED, true),
        ];
        let summary = summarize("p01", RIGHT_CAM, &records, 4, &AggregationConfig::default());

        assert_eq!(summary.get("nb_trials"), Some(4.0));
        assert_eq!(summary.get("nb_cam_same"), Some(2.0));
        assert_eq!(summary.get("nb_cam_opposite"), Some(1.0));
        assert_eq!(summary.get("nb_trials_valid"), Some(3.0));
        assert_eq!(summary.get("nb_target_successful"), Some(2.0));
        assert_eq!(summary.get("nb_target_successful_and_simulated"), Some(0.0));
        assert_eq!(summary.get("ratio_target_successful_and_cam_same"), Some(1.0));
        assert_eq!(summary.get("ratio_target_successful_and_cam_opposite"), Some(0.0));
        assert_eq!(summary.get("nb_grip_successful"), Some(3.0));
        assert_eq!(summary.get("nb_target_found_cup"), Some(1.0));
        assert_eq!(summary.get("nb_target_found_bowl"), Some(1.0));
        assert_eq!(summary.get("nb_trials_valid_for_palmar"), Some(3.0));
        assert_eq!(summary.get("nb_trials_valid_for_pinch"), Some(0.0));

        let ratio = summary.get("ratio_target_successful").unwrap();
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_combinations_are_excluded() {
        let mut rejected = record("cup", Side::Right, EXECUTED, true);
        rejected.check = Some(TrialCheck {
            combi_ok: false,
            face_ok: true,
        });
        let records = vec![rejected, record("cup", Side::Right, EXECUTED, true)];
        let summary = summarize("p01", RIGHT_CAM, &records, 2, &AggregationConfig::default());

        assert_eq!(summary.get("nb_executed"), Some(2.0));
        assert_eq!(summary.get("nb_trials_valid"), Some(1.0));
        assert_eq!(summary.get("nb_target_successful"), Some(1.0));
    }

    #[test]
    fn test_empty_batch_guards_ratios() {
        let summary = summarize("p01", RIGHT_CAM, &[], 0, &AggregationConfig::default());
        assert_eq!(summary.get("ratio_target_successful"), Some(0.0));
        assert_eq!(summary.get("ratio_grip_successful_and_simulated"), Some(0.0));
        assert_eq!(summary.get("ratio_impacts_correct"), Some(0.0));
        assert_eq!(summary.get("sum_trial_duration"), Some(0.0));
        assert_eq!(summary.get("mean_trial_duration"), None);
        assert_eq!(summary.get("sd_target_found_margin"), None);
        assert_eq!(summary.get("mean_time_to_target_rmse"), None);
    }

    #[test]
    fn test_margin_spread_over_successful_trials() {
        let records = vec![
            record("cup", Side::Right, EXECUTED, true),
            record("cup", Side::Right, EXECUTED, true),
            record("cup", Side::Right, EXECUTED, false),
        ];
        let summary = summarize("p01", RIGHT_CAM, &records, 3, &AggregationConfig::default());

        // found at 0.3s, movement ends at 0.8s in both successful trials
        let sum = summary.get("sum_target_found_margin").unwrap();
        assert!((sum - 1.0).abs() < 1e-9);
        let mean = summary.get("mean_target_found_margin").unwrap();
        assert!((mean - 0.5).abs() < 1e-9);
        assert!(summary.get("sd_target_found_margin").unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_expected_objects_from_config() {
        let config = AggregationConfig {
            expected_objects: vec!["mustard".to_string()],
            grips: vec!["palmar".to_string()],
        };
        let records = vec![record("cup", Side::Right, EXECUTED, true)];
        let summary = summarize("p01", RIGHT_CAM, &records, 1, &config);

        assert_eq!(summary.get("nb_trials_valid_for_mustard"), Some(0.0));
        assert!(summary
            .metrics
            .iter()
            .all(|(name, _)| name != "nb_trials_valid_for_cup"));
    }
}
