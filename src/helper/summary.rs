use std::error::Error;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use getset::{Getters, Setters};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, Max, Min, OrderStatistics};

use crate::helper::normalization::{GroupNorm, NormalizedTable};

pub const SUMMARY_FILE: &str = "normalization_summary.json";

#[derive(Debug, Clone, Serialize, Deserialize, Getters, Setters)]
pub struct NormalizationSummary {
    #[getset(get = "pub", set = "pub")]
    process_start_time: DateTime<Local>,
    #[getset(get = "pub", set = "pub")]
    process_end_time: DateTime<Local>,
    #[getset(get = "pub", set = "pub")]
    current_version: String,
    #[getset(get = "pub", set = "pub")]
    input_directory: String,
    #[getset(get = "pub", set = "pub")]
    output_directory: String,
    #[getset(get = "pub", set = "pub")]
    experimental_genome: String,
    #[getset(get = "pub", set = "pub")]
    spike_in_genome: String,
    #[getset(get = "pub", set = "pub")]
    library_count: usize,
    #[getset(get = "pub", set = "pub")]
    groups: Vec<GroupNorm>,
    #[getset(get = "pub", set = "pub")]
    spike_in_proportion: ProportionStats,
    #[getset(get = "pub", set = "pub")]
    warnings: Vec<String>,
}

impl NormalizationSummary {
    pub fn new() -> Self {
        NormalizationSummary {
            process_start_time: Local::now(),
            process_end_time: Local::now(),
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            input_directory: String::new(),
            output_directory: String::new(),
            experimental_genome: String::new(),
            spike_in_genome: String::new(),
            library_count: 0,
            groups: Vec::new(),
            spike_in_proportion: ProportionStats::default(),
            warnings: Vec::new(),
        }
    }

    pub fn from_normalized_table(table: &NormalizedTable) -> Self {
        let mut summary = NormalizationSummary::new();
        summary.set_library_count(table.records().len());
        summary.set_groups(table.groups().to_vec());

        let proportions: Vec<f64> = table
            .records()
            .iter()
            .map(|r| *r.proportion_spike())
            .collect();
        summary.set_spike_in_proportion(ProportionStats::from_values(&proportions));
        summary
    }

    pub fn write_json(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Spread of the spike-in read proportion across libraries.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
pub struct ProportionStats {
    #[getset(get = "pub")]
    mean: f64,
    #[getset(get = "pub")]
    median: f64,
    #[getset(get = "pub")]
    min: f64,
    #[getset(get = "pub")]
    max: f64,
    #[getset(get = "pub")]
    standard_deviation: f64,
}

impl ProportionStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return ProportionStats::default();
        }
        let mut data = Data::new(values.to_vec());

        ProportionStats {
            mean: data.mean().unwrap_or(0.0),
            median: data.median(),
            min: data.min(),
            max: data.max(),
            standard_deviation: if values.len() > 1 {
                data.std_dev().unwrap_or(0.0)
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportion_stats() {
        let stats = ProportionStats::from_values(&[0.02, 0.04, 0.06, 0.08]);
        assert!((stats.mean() - 0.05).abs() < 1e-12);
        assert!((stats.median() - 0.05).abs() < 1e-12);
        assert_eq!(*stats.min(), 0.02);
        assert_eq!(*stats.max(), 0.08);
        // sample standard deviation
        assert!((stats.standard_deviation() - 0.025819889).abs() < 1e-6);

        let single = ProportionStats::from_values(&[0.1]);
        assert_eq!(*single.standard_deviation(), 0.0);
        assert_eq!(ProportionStats::from_values(&[]), ProportionStats::default());
    }

    #[test]
    fn test_summary_json_round_trip() {
        let mut summary = NormalizationSummary::new();
        summary.set_library_count(16);
        summary.set_warnings(vec!["name mismatch".to_string()]);

        let json = serde_json::to_string(&summary).unwrap();
        let back: NormalizationSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(*back.library_count(), 16);
        assert_eq!(back.current_version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(back.warnings().len(), 1);
    }
}
