use crate::types::{Config, Side};
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config file {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let eval = &self.evaluation;
        if eval.min_consecutive_detections == 0 {
            bail!("evaluation.min_consecutive_detections must be at least 1");
        }
        if !(0.0..=1.0).contains(&eval.max_switch_ratio) {
            bail!(
                "evaluation.max_switch_ratio must be within [0, 1], got {}",
                eval.max_switch_ratio
            );
        }
        if !(0.0..=1.0).contains(&eval.velocity_threshold_ratio) {
            bail!(
                "evaluation.velocity_threshold_ratio must be within [0, 1], got {}",
                eval.velocity_threshold_ratio
            );
        }
        Ok(())
    }

    /// Side of the table a capture device is mounted on, if configured
    pub fn device_side(&self, device_id: &str) -> Option<Side> {
        self.devices.get(device_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
devices:
  "1944301011EA1F1300": right
  "19443010910F481300": left
evaluation:
  max_switch_ratio: 0.25
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.evaluation.max_switch_ratio, 0.25);
        assert_eq!(config.evaluation.min_consecutive_detections, 3);
        assert_eq!(config.device_side("1944301011EA1F1300"), Some(Side::Right));
        assert_eq!(config.device_side("19443010910F481300"), Some(Side::Left));
        assert_eq!(config.device_side("unknown"), None);
        assert_eq!(config.aggregation.grips, vec!["palmar", "pinch"]);
    }

    #[test]
    fn test_rejects_out_of_range_ratio() {
        let mut config = Config::default();
        config.evaluation.max_switch_ratio = 1.5;
        assert!(config.validate().is_err());
    }
}
