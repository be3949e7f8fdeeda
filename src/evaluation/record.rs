// src/evaluation/record.rs
//
// The per-(trial, device) evaluation output and its flat column view.
// Column names are the wire format read by the summary and plotting tools.

use super::identification::{GripIdentification, TargetIdentification};
use super::kinematics::MovementSegmentation;
use super::timing::TimingMargins;
use super::validity::TrialValidity;
use crate::types::{CamHandPosition, TargetMetric, TrialLabels};
use std::fmt;

/// Manual per-trial check flags from the pre-processing stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialCheck {
    pub combi_ok: bool,
    pub face_ok: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub trial_label: String,
    pub device_id: String,
    pub labels: TrialLabels,
    pub cam_hand_position: CamHandPosition,
    pub validity: TrialValidity,
    pub target: TargetIdentification,
    pub grip: GripIdentification,
    pub movement: MovementSegmentation,
    pub timing: TimingMargins,
    pub time_to_target_rmse: Option<f64>,
    pub check: Option<TrialCheck>,
}

/// One cell of the flat evaluation table
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Count(usize),
    Float(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    fn float(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => Self::Float(v),
            _ => Self::Missing,
        }
    }

    fn index(value: Option<usize>) -> Self {
        value.map_or(Self::Missing, Self::Count)
    }

    /// Numeric view used by column statistics; booleans count as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Count(c) => Some(*c as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) | Self::Missing => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Count(c) => write!(f, "{c}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Missing => Ok(()),
        }
    }
}

impl EvaluationRecord {
    pub fn is_trial_valid(&self) -> bool {
        self.validity.is_trial_valid
    }

    /// Trials without a check table entry are considered correctly combined
    pub fn combi_ok(&self) -> bool {
        self.check.map_or(true, |c| c.combi_ok)
    }

    pub fn target_successful(&self, metric: TargetMetric) -> bool {
        self.target.metric(metric).successful
    }

    /// Main (`max_metric`) identification success
    pub fn task_target_identification_successful(&self) -> bool {
        self.target.main().successful
    }

    pub fn task_grip_identification_successful(&self) -> bool {
        self.grip.found.successful
    }

    /// Flat, ordered `(column, value)` view of the record
    pub fn columns(&self) -> Vec<(String, FieldValue)> {
        use FieldValue::{Bool, Count, Float, Text};

        let v = &self.validity;
        let t = &self.target;
        let main = t.main();
        let g = &self.grip.found;
        let m = &self.movement;
        let main_timing = self.timing.target(TargetMetric::MaxMetric);

        let mut cols: Vec<(String, FieldValue)> = Vec::with_capacity(160);
        let mut push = |name: &str, value: FieldValue| cols.push((name.to_string(), value));

        push("task_target", Text(self.labels.task_target.clone()));
        push("task_grip", Text(self.labels.task_grip.clone()));
        push("cam_hand_position", Text(self.cam_hand_position.as_str().to_string()));
        push("movement_mode", Text(self.labels.movement_mode.clone()));
        push("trial_nb_frames", Count(v.trial_nb_frames));
        push(
            "trial_nb_achievable_task_detections",
            Count(v.nb_achievable_task_detections),
        );

        push("idx_first_hand_found", Count(v.hand.idx_first_consecutive_found));
        push("nb_hand_found", Count(v.hand.nb_found));
        push("ratio_hand_found", Float(v.hand.ratio_found));
        push(
            "is_hand_estimation_continuous",
            Bool(v.hand.is_estimation_continuous),
        );
        push("idx_first_object_found", Count(v.object.idx_first_consecutive_found));
        push("nb_object_found", Count(v.object.nb_found));
        push("ratio_object_found", Float(v.object.ratio_found));
        push(
            "is_object_estimation_continuous",
            Bool(v.object.is_estimation_continuous),
        );
        push("first_hand_found", Float(v.hand.first_found_timestamp));
        push("first_object_found", Float(v.object.first_found_timestamp));
        push("first_target_found", FieldValue::float(main.first_found_timestamp));

        push("is_trial_valid", Bool(v.is_trial_valid));
        push("not_valid_reasons", Text(v.not_valid_reasons.join("; ")));
        push("valid_reasons", Text(v.valid_reasons.join("; ")));

        push("nb_target_found", Count(main.nb_correct));
        for metric in TargetMetric::ALL {
            push(
                &format!("nb_{}_correct", metric.as_str()),
                Count(t.metric(metric).nb_correct),
            );
        }
        for (suffix, pick) in [
            ("", 0usize),
            ("_beginning", 1usize),
            ("_end", 2usize),
        ] {
            for metric in TargetMetric::INDIVIDUAL {
                let counts = t.rescued_by(metric);
                let value = match pick {
                    0 => counts.total,
                    1 => counts.beginning,
                    _ => counts.end,
                };
                push(
                    &format!("nb_{}_correct_when_most_probable_wrong{suffix}", metric.as_str()),
                    Count(value),
                );
            }
        }
        push(
            "most_trustworthy_metric",
            Text(t.most_trustworthy_metric.as_str().to_string()),
        );
        push(
            "ratio_target_not_found_but_individual_metrics_correct",
            Float(t.ratio_target_not_found_but_individual_metrics_correct),
        );
        push(
            "nb_target_not_found_but_individual_metrics_correct",
            Count(t.nb_target_not_found_but_individual_metrics_correct),
        );

        push("target_found_ratio", Float(t.target_found_ratio));
        push("idx_first_target_found", FieldValue::index(main.idx_first_found));
        push(
            "idx_start_longest_consecutive_target_found",
            FieldValue::index(main.idx_first_found),
        );
        push("ratio_target_switch", FieldValue::float(main.ratio_switch));
        push("task_target_idenfication_successful", Bool(main.successful));
        for metric in TargetMetric::ALL {
            push(
                &format!("task_target_idenfication_successful_{}", metric.as_str()),
                Bool(t.metric(metric).successful),
            );
        }
        for metric in TargetMetric::ALL {
            push(
                &format!("ratio_target_switch_{}", metric.as_str()),
                FieldValue::float(t.metric(metric).ratio_switch),
            );
        }

        push("nb_grips_found", Count(self.grip.nb_grips_found()));
        push("grip_found_ratio", Float(self.grip.grip_found_ratio));
        push("ratio_grip_switch", FieldValue::float(g.ratio_switch));
        push("task_grip_idenfication_successful", Bool(g.successful));

        push("max_velocity", Float(m.max_velocity));
        push("min_velocity", Float(m.min_velocity));
        push("delta_velocity", Float(m.delta_velocity));
        push("velocity_threshold_beginning", Float(m.velocity_threshold_beginning));
        push("velocity_threshold_end", Float(m.velocity_threshold_end));
        push("idx_max_velocity", Count(m.idx_max_velocity));
        push("idx_min_velocity", Count(m.idx_min_velocity));
        push("idx_begin_movement", Count(m.idx_begin_movement));
        push("idx_end_movement", Count(m.idx_end_movement));

        push("trial_duration", Float(v.trial_duration));
        push("movement_duration", Float(m.movement_duration));
        push("begin_movement_timestamp", Float(m.begin_movement_timestamp));
        push("achievable_index", Count(v.achievable_index));
        push("achievable_timestamp", Float(v.achievable_timestamp));
        push("achievable_time", Float(v.achievable_time));
        push("end_movement_timestamp", Float(m.end_movement_timestamp));
        push("delay_time", Float(m.delay_time));
        push("grip_found_margin", FieldValue::float(self.timing.grip.margin));
        push("grip_found_delay", FieldValue::float(self.timing.grip.delay));

        push(
            "target_found_timestamp_global",
            FieldValue::float(main.first_found_timestamp),
        );
        for metric in TargetMetric::ALL {
            push(
                &format!("target_found_timestamp_{}", metric.as_str()),
                FieldValue::float(t.metric(metric).first_found_timestamp),
            );
        }
        push("first_grip_found", FieldValue::float(g.first_found_timestamp));
        push("idx_first_grip_found", FieldValue::index(g.idx_first_found));

        push("target_found_index_global", FieldValue::index(main.idx_first_found));
        for metric in TargetMetric::ALL {
            push(
                &format!("target_found_index_{}", metric.as_str()),
                FieldValue::index(t.metric(metric).idx_first_found),
            );
        }

        push("target_found_margin", FieldValue::float(main_timing.margin));
        push("target_found_delay", FieldValue::float(main_timing.delay));
        for metric in TargetMetric::ALL {
            let timing = self.timing.target(metric);
            push(
                &format!("target_found_margin_{}", metric.as_str()),
                FieldValue::float(timing.margin),
            );
            push(
                &format!("target_found_delay_{}", metric.as_str()),
                FieldValue::float(timing.delay),
            );
        }

        push("resting_time", Float(m.resting_time));
        push("time_to_target_rmse", FieldValue::float(self.time_to_target_rmse));

        if let Some(check) = self.check {
            push("combi_ok", Bool(check.combi_ok));
            push("face_ok", Bool(check.face_ok));
        }

        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_rendering() {
        assert_eq!(FieldValue::Bool(true).to_string(), "True");
        assert_eq!(FieldValue::Count(12).to_string(), "12");
        assert_eq!(FieldValue::Float(0.25).to_string(), "0.25");
        assert_eq!(FieldValue::Missing.to_string(), "");
        assert_eq!(FieldValue::float(Some(f64::NAN)), FieldValue::Missing);
        assert_eq!(FieldValue::index(None), FieldValue::Missing);
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(FieldValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(FieldValue::Count(3).as_f64(), Some(3.0));
        assert_eq!(FieldValue::Text("cup".into()).as_f64(), None);
        assert_eq!(FieldValue::Missing.as_f64(), None);
    }
}
