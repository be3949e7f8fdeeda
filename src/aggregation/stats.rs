// src/aggregation/stats.rs
//
// Missing-aware descriptive statistics. Missing values are skipped, never
// counted as zero.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    /// Sum of present values, 0 when none are present
    pub sum: f64,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1), needs two values
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn describe<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let present: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();

        Self {
            sum: present.iter().sum(),
            mean: mean(&present),
            std: sample_std(&present),
            min: present.iter().copied().reduce(f64::min),
            max: present.iter().copied().reduce(f64::max),
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}
