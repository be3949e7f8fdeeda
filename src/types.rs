use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub evaluation: EvaluationConfig,
    /// Capture device id -> side of the table the camera sits on
    pub devices: HashMap<String, Side>,
    pub paths: PathsConfig,
    /// Participant pseudos to evaluate. Empty means every folder under `analysis_dir`.
    pub participants: Vec<String>,
    pub aggregation: AggregationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Consecutive detections needed before hand/object count as stably found
    pub min_consecutive_detections: usize,
    /// Dropout run length (in frames) above which the trial is rejected
    pub max_consecutive_failed_detections: usize,
    /// Seconds of achievable window required (absolute condition)
    pub min_achievable_time: f64,
    /// Fraction of the trial duration required (relative condition)
    pub min_achievable_time_ratio: f64,
    /// Identification fails when the post-detection switch ratio reaches this
    pub max_switch_ratio: f64,
    /// Fraction of the velocity span used for movement onset/offset thresholds
    pub velocity_threshold_ratio: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_consecutive_detections: 3,
            max_consecutive_failed_detections: 3,
            min_achievable_time: 0.5,
            min_achievable_time_ratio: 0.5,
            max_switch_ratio: 0.3,
            velocity_threshold_ratio: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// One sub-folder per participant holding the replay analysis CSV files
    pub analysis_dir: String,
    /// One sub-folder per participant holding `<pseudo>_trials_check.csv`
    pub pre_processing_dir: String,
    pub evaluation_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            analysis_dir: "data/analysis".to_string(),
            pre_processing_dir: "data/pre_processing".to_string(),
            evaluation_dir: "data/evaluation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Objects broken out in the per-object summary counts. Empty = every target seen.
    pub expected_objects: Vec<String>,
    pub grips: Vec<String>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            expected_objects: Vec::new(),
            grips: vec!["palmar".to_string(), "pinch".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// FRAME RECORDS
// ============================================================================

/// Competing target-identification metrics produced by the replay analysis.
/// Declaration order is also the tie-break priority for `most_trustworthy_metric`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetMetric {
    Impacts,
    Distance,
    FutureDistance,
    DistanceDerivative,
    Direction,
    MaxMetric,
}

impl TargetMetric {
    pub const ALL: [TargetMetric; 6] = [
        Self::Impacts,
        Self::Distance,
        Self::FutureDistance,
        Self::DistanceDerivative,
        Self::Direction,
        Self::MaxMetric,
    ];

    /// The individual metrics, without the `max_metric` composite
    pub const INDIVIDUAL: [TargetMetric; 5] = [
        Self::Impacts,
        Self::Distance,
        Self::FutureDistance,
        Self::DistanceDerivative,
        Self::Direction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Impacts => "impacts",
            Self::Distance => "distance",
            Self::FutureDistance => "future_distance",
            Self::DistanceDerivative => "distance_derivative",
            Self::Direction => "direction",
            Self::MaxMetric => "max_metric",
        }
    }

    /// Column holding this metric's per-frame target vote
    pub fn column(&self) -> &'static str {
        match self {
            Self::Impacts => "target_from_impacts",
            Self::Distance => "target_from_distance",
            Self::FutureDistance => "target_from_future_distance",
            Self::DistanceDerivative => "target_from_distance_derivative",
            Self::Direction => "target_from_direction",
            Self::MaxMetric => "target_max_metric_confidence",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Coarse movement phase label attached to each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementPart {
    Begin,
    End,
    #[default]
    Other,
}

impl MovementPart {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "begin" => Self::Begin,
            "end" => Self::End,
            _ => Self::Other,
        }
    }
}

/// Live time-to-impact estimate. The non-numeric variants are "no estimate".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeToImpact {
    Estimate(f64),
    NoSignSwitch,
    NoPolyFit,
    NoRealPositiveRoot,
    Missing,
}

impl TimeToImpact {
    pub const NO_SIGN_SWITCH: &'static str = "NO_SIGN_SWITCH";
    pub const NO_POLY_FIT: &'static str = "NO_POLY_FIT";
    pub const NO_REAL_POSITIVE_ROOT: &'static str = "NO_REAL_POSITIVE_ROOT";

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            Self::NO_SIGN_SWITCH => Self::NoSignSwitch,
            Self::NO_POLY_FIT => Self::NoPolyFit,
            Self::NO_REAL_POSITIVE_ROOT => Self::NoRealPositiveRoot,
            "" => Self::Missing,
            other => match other.parse::<f64>() {
                Ok(v) if v.is_finite() => Self::Estimate(v),
                _ => Self::Missing,
            },
        }
    }

    /// Estimate in seconds, or `None` for sentinels and missing values
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Estimate(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

/// One processed video frame of a trial, seen by one capture device
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub timestamp: f64,
    pub task_hand_found: bool,
    pub task_object_found: bool,
    pub task_grip_found: bool,
    /// Target label voted by each metric, indexed by `TargetMetric::index()`
    pub targets: [String; 6],
    pub hand_scalar_velocity: f64,
    pub estimated_target_time_to_impact: TimeToImpact,
    pub movement_part: MovementPart,
}

impl FrameRecord {
    pub fn target_from(&self, metric: TargetMetric) -> &str {
        &self.targets[metric.index()]
    }
}

// ============================================================================
// TRIAL LABELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Where the camera sits relative to the hand performing the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CamHandPosition {
    Same,
    Opposite,
    Unknown,
}

impl CamHandPosition {
    pub fn classify(device_side: Option<Side>, task_hand: Option<Side>) -> Self {
        match (device_side, task_hand) {
            (Some(cam), Some(hand)) if cam == hand => Self::Same,
            (Some(_), Some(_)) => Self::Opposite,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Same => "same",
            Self::Opposite => "opposite",
            Self::Unknown => "unknown",
        }
    }
}

/// Ground-truth labels of a trial, constant across its frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialLabels {
    pub task_target: String,
    pub task_hand: Option<Side>,
    pub task_grip: String,
    pub movement_mode: String,
}

/// One trial as seen by one capture device
#[derive(Debug, Clone)]
pub struct Trial {
    pub label: String,
    pub device_id: String,
    pub labels: TrialLabels,
    pub frames: Vec<FrameRecord>,
}
