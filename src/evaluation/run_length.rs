// src/evaluation/run_length.rs
//
// Boolean-column scans shared by the validity checks and the
// target/grip stability checks.

/// A contiguous run of `true` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub len: usize,
}

/// Longest contiguous run of `true`. Ties keep the earliest run.
pub fn longest_run<I>(column: I) -> Option<Run>
where
    I: IntoIterator<Item = bool>,
{
    let mut best: Option<Run> = None;
    let mut current_start = 0;
    let mut current_len = 0;

    for (idx, value) in column.into_iter().enumerate() {
        if value {
            if current_len == 0 {
                current_start = idx;
            }
            current_len += 1;
            if best.map_or(true, |b| current_len > b.len) {
                best = Some(Run {
                    start: current_start,
                    len: current_len,
                });
            }
        } else {
            current_len = 0;
        }
    }

    best
}

/// Start of the first run of at least `min_len` consecutive `true`
pub fn first_run_of_at_least<I>(column: I, min_len: usize) -> Option<usize>
where
    I: IntoIterator<Item = bool>,
{
    // a zero-length run would point one past the frame it was found on
    let min_len = min_len.max(1);
    let mut consecutive = 0;
    for (idx, value) in column.into_iter().enumerate() {
        if value {
            consecutive += 1;
        } else {
            consecutive = 0;
        }
        if consecutive >= min_len {
            return Some(idx + 1 - min_len);
        }
    }
    None
}

/// Length of the longest contiguous run of `false`
pub fn longest_false_run<I>(column: I) -> usize
where
    I: IntoIterator<Item = bool>,
{
    longest_run(column.into_iter().map(|v| !v)).map_or(0, |r| r.len)
}

/// Fraction of `false` in `column[start..]`. An empty slice yields 0.
pub fn switch_ratio(column: &[bool], start: usize) -> f64 {
    let tail = column.get(start..).unwrap_or(&[]);
    if tail.is_empty() {
        return 0.0;
    }
    let misses = tail.iter().filter(|v| !**v).count();
    misses as f64 / tail.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(pattern: &str) -> Vec<bool> {
        pattern.chars().map(|c| c == 'T').collect()
    }

    #[test]
    fn test_longest_run_prefers_longer_later_run_over_earlier_short() {
        let column = col("FFTTTFTTF");
        let run = longest_run(column.iter().copied()).unwrap();
        assert_eq!(run, Run { start: 2, len: 3 });
    }

    #[test]
    fn test_longest_run_tie_keeps_earliest() {
        let run = longest_run(col("TTFTT")).unwrap();
        assert_eq!(run.start, 0);
        assert_eq!(run.len, 2);
    }

    #[test]
    fn test_longest_run_none_when_all_false() {
        assert_eq!(longest_run(col("FFFF")), None);
        assert_eq!(longest_run(Vec::<bool>::new()), None);
    }

    #[test]
    fn test_first_run_of_at_least() {
        assert_eq!(first_run_of_at_least(col("TTFTTTT"), 3), Some(3));
        assert_eq!(first_run_of_at_least(col("TTTFF"), 3), Some(0));
        assert_eq!(first_run_of_at_least(col("TTFTTF"), 3), None);
    }

    #[test]
    fn test_zero_min_len_behaves_like_one() {
        assert_eq!(first_run_of_at_least(col("FT"), 0), Some(1));
        assert_eq!(first_run_of_at_least(col("T"), 0), Some(0));
        assert_eq!(first_run_of_at_least(col("FF"), 0), None);
    }

    #[test]
    fn test_longest_false_run() {
        assert_eq!(longest_false_run(col("TFFTFFFFT")), 4);
        assert_eq!(longest_false_run(col("TTT")), 0);
    }

    #[test]
    fn test_switch_ratio_bounds() {
        let column = col("FFTTTT");
        assert_eq!(switch_ratio(&column, 2), 0.0);

        let column = col("TFFFF");
        assert_eq!(switch_ratio(&column, 1), 1.0);

        let column = col("TTFT");
        assert!((switch_ratio(&column, 0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_switch_ratio_empty_slice_is_zero() {
        let column = col("TT");
        assert_eq!(switch_ratio(&column, 2), 0.0);
        assert_eq!(switch_ratio(&column, 10), 0.0);
    }
}
