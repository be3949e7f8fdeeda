// src/evaluation/kinematics.rs
//
// Movement onset/offset from the hand speed profile.
//
// Rise/fall threshold detector around the single dominant velocity peak:
//   onset  = first frame up to the peak with v > ratio * v_max
//   offset = first frame from the peak with v < v_min + ratio * (v_max - v_min)
// where v_min is the slowest frame after the peak. Trials with several
// reach/correct sub-movements are segmented around the highest peak only.

use crate::error::EvaluationError;
use crate::types::FrameRecord;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct MovementSegmentation {
    pub idx_max_velocity: usize,
    pub max_velocity: f64,
    pub idx_min_velocity: usize,
    pub min_velocity: f64,
    pub delta_velocity: f64,
    pub velocity_threshold_beginning: f64,
    pub velocity_threshold_end: f64,
    pub idx_begin_movement: usize,
    pub idx_end_movement: usize,
    pub begin_movement_timestamp: f64,
    pub end_movement_timestamp: f64,
    pub movement_duration: f64,
    pub resting_time: f64,
    /// Earliest instant identification could start: movement onset or the
    /// start of the achievable window, whichever comes first
    pub delay_time: f64,
}

/// First index of the extreme value (NaN samples are skipped)
fn arg_extreme<F>(values: &[f64], better: F) -> Option<usize>
where
    F: Fn(f64, f64) -> bool,
{
    let mut best: Option<usize> = None;
    for (idx, v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if !better(*v, values[b]) => {}
            _ => best = Some(idx),
        }
    }
    best
}

pub fn segment(
    frames: &[FrameRecord],
    achievable_timestamp: f64,
    trial_end_timestamp: f64,
    threshold_ratio: f64,
) -> Result<MovementSegmentation, EvaluationError> {
    let velocity: Vec<f64> = frames.iter().map(|f| f.hand_scalar_velocity).collect();

    let idx_max_velocity =
        arg_extreme(&velocity, |a, b| a > b).ok_or(EvaluationError::NoVelocitySamples)?;
    let max_velocity = velocity[idx_max_velocity];

    let after = &velocity[idx_max_velocity..];
    // the peak itself is a valid sample, so this cannot be empty
    let idx_min_velocity =
        idx_max_velocity + arg_extreme(after, |a, b| a < b).unwrap_or_default();
    let min_velocity = velocity[idx_min_velocity];

    let delta_velocity = max_velocity - min_velocity;
    let velocity_threshold_beginning = threshold_ratio * max_velocity;
    let velocity_threshold_end = min_velocity + threshold_ratio * delta_velocity;

    // Motionless trial: nothing crosses the onset threshold, movement starts at the peak
    let idx_begin_movement = velocity[..=idx_max_velocity]
        .iter()
        .position(|v| *v > velocity_threshold_beginning)
        .unwrap_or(idx_max_velocity);

    // Flat tail: nothing drops below the offset threshold, use the slowest frame
    let idx_end_movement = after
        .iter()
        .position(|v| *v < velocity_threshold_end)
        .map(|offset| idx_max_velocity + offset)
        .unwrap_or(idx_min_velocity);

    let begin_movement_timestamp = frames[idx_begin_movement].timestamp;
    let end_movement_timestamp = frames[idx_end_movement].timestamp;

    debug!(
        "Movement: peak {:.1} at frame {}, begin {} ({:.3}s), end {} ({:.3}s)",
        max_velocity,
        idx_max_velocity,
        idx_begin_movement,
        begin_movement_timestamp,
        idx_end_movement,
        end_movement_timestamp
    );

    Ok(MovementSegmentation {
        idx_max_velocity,
        max_velocity,
        idx_min_velocity,
        min_velocity,
        delta_velocity,
        velocity_threshold_beginning,
        velocity_threshold_end,
        idx_begin_movement,
        idx_end_movement,
        begin_movement_timestamp,
        end_movement_timestamp,
        movement_duration: end_movement_timestamp - begin_movement_timestamp,
        resting_time: trial_end_timestamp - end_movement_timestamp,
        delay_time: begin_movement_timestamp.min(achievable_timestamp),
    })
}
