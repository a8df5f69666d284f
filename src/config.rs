//! Detection tuning knobs
//!
//! The scan depths, the mostly-blank threshold, and the fallback
//! coordinates are empirical values tuned against one observed template
//! family. They are deliberately configuration, not invariants: a new
//! template family gets a YAML file, not a code change.

use crate::error::IntakeResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds driving header detection and layout resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Rows scanned when hunting the header row (and the question header
    /// during format detection)
    pub max_scan_rows: u32,
    /// Rows scanned for inventory terms during format detection
    pub format_scan_rows: u32,
    /// Inventory-term hits required to call a sheet column-based
    pub inventory_min_matches: usize,
    /// Populated cells required before a row can be a column-based header
    pub hint_min_populated: usize,
    /// Short-hint hits required to accept a column-based header row
    pub hint_min_matches: usize,
    /// Rows probed below a reference row when hunting a mostly-blank row
    pub blank_scan_rows: u32,
    /// Leading columns sampled by the mostly-blank test
    pub blank_probe_cols: u32,
    /// A row is blank when fewer than this fraction of sampled cells are
    /// populated
    pub blank_ratio: f64,
    /// Header row assumed when no strategy matches
    pub fallback_header_row: u32,
    /// Question column assumed when no question header is present
    /// (column 1 often holds a merged title)
    pub fallback_question_col: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_scan_rows: 10,
            format_scan_rows: 6,
            inventory_min_matches: 3,
            hint_min_populated: 3,
            hint_min_matches: 2,
            blank_scan_rows: 20,
            blank_probe_cols: 20,
            blank_ratio: 0.2,
            fallback_header_row: 3,
            fallback_question_col: 2,
        }
    }
}

impl ScanConfig {
    /// Load overrides from a YAML file; absent keys keep their defaults,
    /// unknown keys are rejected
    pub fn load<P: AsRef<Path>>(path: P) -> IntakeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScanConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_observed_template_family() {
        let config = ScanConfig::default();
        assert_eq!(config.max_scan_rows, 10);
        assert_eq!(config.format_scan_rows, 6);
        assert_eq!(config.blank_ratio, 0.2);
        assert_eq!(config.fallback_header_row, 3);
        assert_eq!(config.fallback_question_col, 2);
    }

    #[test]
    fn test_partial_yaml_overrides_keep_other_defaults() {
        let config: ScanConfig =
            serde_yaml::from_str("max_scan_rows: 25\nblank_ratio: 0.5\n").unwrap();
        assert_eq!(config.max_scan_rows, 25);
        assert_eq!(config.blank_ratio, 0.5);
        assert_eq!(config.fallback_header_row, 3);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<ScanConfig, _> = serde_yaml::from_str("scan_depth: 12\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("scan.yaml");
        std::fs::write(&path, "fallback_header_row: 1\n").unwrap();
        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.fallback_header_row, 1);
    }
}
