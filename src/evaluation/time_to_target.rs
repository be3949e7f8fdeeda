// src/evaluation/time_to_target.rs
//
// Error of the live time-to-impact estimate against the actual time
// remaining until movement end, from stable target identification onward.

use crate::types::FrameRecord;

/// RMSE between `timestamp[i] - timestamp[idx_end_movement]` and the live estimate.
///
/// Returns `None` when the target was never stably identified, when the
/// movement ended before identification, or when no frame carries a usable
/// estimate. Sentinel estimates are skipped, never treated as numbers.
pub fn time_to_target_rmse(
    frames: &[FrameRecord],
    idx_first_target_found: Option<usize>,
    idx_end_movement: usize,
) -> Option<f64> {
    let start = idx_first_target_found?;
    if idx_end_movement < start {
        return None;
    }
    let end_timestamp = frames.get(idx_end_movement)?.timestamp;

    let (sum_sq, count) = frames[start..]
        .iter()
        .filter_map(|f| {
            let estimate = f.estimated_target_time_to_impact.seconds()?;
            let time_to_target = f.timestamp - end_timestamp;
            Some(time_to_target - estimate)
        })
        .fold((0.0, 0usize), |(sum, n), err| (sum + err * err, n + 1));

    if count == 0 {
        None
    } else {
        Some((sum_sq / count as f64).sqrt())
    }
}
