use crate::models::roi::RegionLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with a condition no evaluation rule recognizes.
///
/// Fail-open matches the reference behavior: with OCR noise common, an
/// unreadable condition counts as satisfied rather than silently dropping
/// the effect. Fail-closed is the strict opposite for consumers that prefer
/// under-counting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    FailOpen,
    FailClosed,
}

impl Default for Strictness {
    fn default() -> Self {
        Self::FailOpen
    }
}

/// Analyzer tuning knobs. Defaults reproduce the reference setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerConfig {
    pub layout: RegionLayout,
    /// Candidate template scales for die faces.
    pub dice_scales: Vec<f32>,
    /// Candidate template scales for site icons (before the search upscale).
    pub site_scales: Vec<f32>,
    /// The site region is small; both it and the site templates are
    /// upscaled by this factor before matching.
    pub site_upscale: f32,
    /// Match score threshold for die candidates.
    pub dice_threshold: f32,
    /// Match score threshold for site candidates.
    pub site_threshold: f32,
    /// IoU above which NMS suppresses the lower-scoring box.
    pub nms_iou: f64,
    /// Upscale applied to the attribute region before OCR.
    pub ocr_upscale: f32,
    /// Re-run OCR only when at least this many attribute pixels changed.
    pub ocr_diff_threshold: u32,
    /// Delay between analysis passes, measured from pass completion.
    pub pass_interval_ms: u64,
    /// Delay before the first pass after capture starts.
    pub startup_delay_ms: u64,
    pub strictness: Strictness,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            layout: RegionLayout::default(),
            dice_scales: vec![0.8, 0.9, 1.0, 1.1, 1.2],
            site_scales: vec![0.9, 1.0, 1.1],
            site_upscale: 2.5,
            dice_threshold: 0.75,
            site_threshold: 0.6,
            nms_iou: 0.4,
            ocr_upscale: 4.0,
            ocr_diff_threshold: 50,
            pass_interval_ms: 500,
            startup_delay_ms: 300,
            strictness: Strictness::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path.as_ref(), json).map_err(|e| format!("Failed to write config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_setup() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.dice_scales, vec![0.8, 0.9, 1.0, 1.1, 1.2]);
        assert_eq!(config.site_scales, vec![0.9, 1.0, 1.1]);
        assert_eq!(config.site_upscale, 2.5);
        assert_eq!(config.dice_threshold, 0.75);
        assert_eq!(config.site_threshold, 0.6);
        assert_eq!(config.nms_iou, 0.4);
        assert_eq!(config.ocr_diff_threshold, 50);
        assert_eq!(config.pass_interval_ms, 500);
        assert_eq!(config.strictness, Strictness::FailOpen);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = AnalyzerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_config_save_load() {
        let dir = std::env::temp_dir().join("frontier-tracker-test-config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("analyzer.json");

        let mut config = AnalyzerConfig::default();
        config.strictness = Strictness::FailClosed;
        config.save(&path).unwrap();

        let loaded = AnalyzerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = AnalyzerConfig::load("/nonexistent/frontier.json");
        assert!(result.is_err());
    }
}
