// src/evaluation/evaluator.rs
//
// Composes validity -> identification -> kinematics -> timing -> time-to-target
// into one EvaluationRecord per (trial, device). Holds configuration only; no
// state is carried from one trial to the next.

use super::identification::{identify_grip, identify_target};
use super::kinematics::segment;
use super::record::EvaluationRecord;
use super::time_to_target::time_to_target_rmse;
use super::timing::TimingMargins;
use super::validity::classify;
use crate::error::EvaluationError;
use crate::types::{CamHandPosition, EvaluationConfig, FrameRecord, Side, Trial};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TrialEvaluator {
    config: EvaluationConfig,
    devices: HashMap<String, Side>,
}

impl TrialEvaluator {
    pub fn new(config: EvaluationConfig, devices: HashMap<String, Side>) -> Self {
        Self { config, devices }
    }

    /// Evaluate one trial.
    ///
    /// `Ok(None)` means hand or object were never stably detected: the trial
    /// cannot be evaluated and produces no record. Malformed frame series
    /// (empty, non-finite or decreasing timestamps, no velocity) are errors.
    pub fn evaluate(&self, trial: &Trial) -> Result<Option<EvaluationRecord>, EvaluationError> {
        let frames = &trial.frames;
        check_frames(frames)?;

        let validity = match classify(frames, &self.config) {
            Some(v) => v,
            None => {
                debug!("{} [{}]: unevaluable, skipped", trial.label, trial.device_id);
                return Ok(None);
            }
        };

        let target = identify_target(frames, &trial.labels.task_target, &validity, &self.config);
        let grip = identify_grip(frames, &validity, &self.config);

        let movement = segment(
            frames,
            validity.achievable_timestamp,
            frames[frames.len() - 1].timestamp,
            self.config.velocity_threshold_ratio,
        )?;

        let timing = TimingMargins::compute(&target, &grip, &movement);
        let rmse = time_to_target_rmse(
            frames,
            target.main().idx_first_found,
            movement.idx_end_movement,
        );

        let cam_hand_position = CamHandPosition::classify(
            self.devices.get(&trial.device_id).copied(),
            trial.labels.task_hand,
        );

        debug!(
            "{} [{}]: valid={} target_ok={} grip_ok={} rmse={:?}",
            trial.label,
            trial.device_id,
            validity.is_trial_valid,
            target.main().successful,
            grip.found.successful,
            rmse
        );

        Ok(Some(EvaluationRecord {
            trial_label: trial.label.clone(),
            device_id: trial.device_id.clone(),
            labels: trial.labels.clone(),
            cam_hand_position,
            validity,
            target,
            grip,
            movement,
            timing,
            time_to_target_rmse: rmse,
            check: None,
        }))
    }
}

fn check_frames(frames: &[FrameRecord]) -> Result<(), EvaluationError> {
    if frames.is_empty() {
        return Err(EvaluationError::EmptyTrial);
    }
    let mut previous: Option<f64> = None;
    for (index, frame) in frames.iter().enumerate() {
        let current = frame.timestamp;
        if !current.is_finite() {
            return Err(EvaluationError::NonFiniteTimestamp { index });
        }
        if let Some(previous) = previous {
            if current < previous {
                return Err(EvaluationError::NonMonotonicTimestamps {
                    index,
                    previous,
                    current,
                });
            }
        }
        previous = Some(current);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::test_support::FrameBuilder;
    use crate::types::{TargetMetric, TimeToImpact, TrialLabels};

    const TARGET: &str = "mustard";
    const RIGHT_CAM: &str = "1944301011EA1F1300";

    fn evaluator() -> TrialEvaluator {
        let mut devices = HashMap::new();
        devices.insert(RIGHT_CAM.to_string(), Side::Right);
        TrialEvaluator::new(EvaluationConfig::default(), devices)
    }

    fn trial(frames: Vec<FrameRecord>) -> Trial {
        Trial {
            label: "p01_s1_t03_mustard_right_palmar_executed".to_string(),
            device_id: RIGHT_CAM.to_string(),
            labels: TrialLabels {
                task_target: TARGET.to_string(),
                task_hand: Some(Side::Right),
                task_grip: "palmar".to_string(),
                movement_mode: "executed".to_string(),
            },
            frames,
        }
    }

    /// 10 frames at 10 Hz: hand/object stable from 2, target from 3, grip from 4
    fn reference_trial() -> Trial {
        let found = "FFTTTTTTTT";
        let target = "FFFTTTTTTT";
        let grip = "FFFFTTTTTT";
        let velocity = [0.0, 0.0, 10.0, 40.0, 90.0, 120.0, 60.0, 20.0, 5.0, 0.0];

        let frames = (0..10)
            .map(|i| {
                let on = |s: &str| s.as_bytes()[i] == b'T';
                FrameBuilder::at(i as f64 * 0.1)
                    .hand(on(found))
                    .object(on(found))
                    .target(
                        TargetMetric::MaxMetric,
                        if on(target) { TARGET } else { "bowl" },
                    )
                    .grip(on(grip))
                    .velocity(velocity[i])
                    .time_to_impact(TimeToImpact::Estimate(i as f64 * 0.1 - 0.8))
                    .build()
            })
            .collect();
        trial(frames)
    }

    #[test]
    fn test_end_to_end_reference_trial() {
        let record = evaluator().evaluate(&reference_trial()).unwrap().unwrap();

        assert_eq!(record.validity.achievable_index, 2);
        assert!(record.is_trial_valid());
        assert_eq!(record.target.main().idx_first_found, Some(3));
        assert!(record.target_successful(TargetMetric::MaxMetric));
        assert!(record.task_target_identification_successful());
        assert_eq!(record.grip.nb_grips_found(), 6);
        assert_eq!(record.grip.found.idx_first_found, Some(4));
        assert_eq!(record.cam_hand_position, CamHandPosition::Same);

        // peak 120 at 5, onset first > 12 at 3, offset first < 12 after peak at 8
        assert_eq!(record.movement.idx_begin_movement, 3);
        assert_eq!(record.movement.idx_end_movement, 8);

        // estimates equal the true time to movement end on every frame
        let rmse = record.time_to_target_rmse.unwrap();
        assert!(rmse.abs() < 1e-9);

        let margin = record.timing.target(TargetMetric::MaxMetric).margin.unwrap();
        assert!((margin - 0.5).abs() < 1e-9);
        let delay = record.timing.target(TargetMetric::MaxMetric).delay.unwrap();
        assert!((delay - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = evaluator();
        let trial = reference_trial();
        let first = evaluator.evaluate(&trial).unwrap().unwrap();
        let second = evaluator.evaluate(&trial).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.columns(), second.columns());
    }

    #[test]
    fn test_unevaluable_trial_produces_no_record() {
        let frames = (0..10)
            .map(|i| {
                FrameBuilder::at(i as f64 * 0.1)
                    .hand(i % 3 != 2)
                    .object(i % 3 != 2)
                    .build()
            })
            .collect();
        assert_eq!(evaluator().evaluate(&trial(frames)).unwrap(), None);
    }

    #[test]
    fn test_empty_trial_is_an_error() {
        assert_eq!(
            evaluator().evaluate(&trial(Vec::new())),
            Err(EvaluationError::EmptyTrial)
        );
    }

    #[test]
    fn test_decreasing_timestamps_are_an_error() {
        let frames = [0.0, 0.1, 0.05, 0.2]
            .iter()
            .map(|t| FrameBuilder::at(*t).detected().build())
            .collect();
        assert!(matches!(
            evaluator().evaluate(&trial(frames)),
            Err(EvaluationError::NonMonotonicTimestamps { index: 2, .. })
        ));
    }

    #[test]
    fn test_nan_timestamp_is_an_error() {
        let frames = [0.0, 0.1, f64::NAN, 0.3]
            .iter()
            .map(|t| FrameBuilder::at(*t).detected().build())
            .collect();
        assert_eq!(
            evaluator().evaluate(&trial(frames)),
            Err(EvaluationError::NonFiniteTimestamp { index: 2 })
        );
    }

    #[test]
    fn test_offset_trial_matches_zero_based_trial() {
        let zero = evaluator().evaluate(&reference_trial()).unwrap().unwrap();
        let mut shifted = reference_trial();
        for frame in shifted.frames.iter_mut() {
            frame.timestamp += 100.0;
        }
        let offset = evaluator().evaluate(&shifted).unwrap().unwrap();

        assert_eq!(offset.is_trial_valid(), zero.is_trial_valid());
        assert!((offset.validity.achievable_time - zero.validity.achievable_time).abs() < 1e-9);
        assert!((offset.movement.resting_time - zero.movement.resting_time).abs() < 1e-9);
        assert!(offset.movement.resting_time >= 0.0);
    }

    #[test]
    fn test_unknown_device_has_unknown_camera_position() {
        let mut t = reference_trial();
        t.device_id = "not-configured".to_string();
        let record = evaluator().evaluate(&t).unwrap().unwrap();
        assert_eq!(record.cam_hand_position, CamHandPosition::Unknown);
    }

    #[test]
    fn test_columns_carry_stable_names() {
        let record = evaluator().evaluate(&reference_trial()).unwrap().unwrap();
        let columns = record.columns();
        let names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();

        for expected in [
            "task_target",
            "is_trial_valid",
            "idx_first_target_found",
            "task_target_idenfication_successful_max_metric",
            "task_target_idenfication_successful_direction",
            "nb_direction_correct_when_most_probable_wrong_end",
            "target_found_margin_future_distance",
            "target_found_delay_impacts",
            "nb_grips_found",
            "time_to_target_rmse",
        ] {
            assert!(names.contains(&expected), "missing column {expected}");
        }

        let unique: std::collections::HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len(), "duplicate column names");
        assert!(!names.contains(&"combi_ok"));
    }
}
