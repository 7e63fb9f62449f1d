use crate::models::config::AnalyzerConfig;
use crate::models::detection::{sort_left_to_right, DieFace, SiteIcon, TemplateKind};
use crate::models::effect::{EvaluatedEffect, ParsedEffect, ScoreBreakdown};
use crate::models::roi::Roi;
use crate::services::condition::ConditionEvaluator;
use crate::services::detector::Detector;
use crate::services::ocr::{parse_effects, OcrEngine, OcrParams, TextPreprocessor};
use crate::services::rarity::sample_rarity;
use crate::services::templates::TemplateLibrary;
use crate::services::{nms, score};
use image::{imageops, DynamicImage, GrayImage, RgbImage};
use serde::Serialize;
use tracing::{debug, warn};

/// Rule-text regions smaller than this cannot hold legible text; OCR is
/// skipped for them.
const MIN_TEXT_WIDTH: u32 = 20;
const MIN_TEXT_HEIGHT: u32 = 10;

/// Everything one analysis pass extracted from a frame.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub dice: Vec<DieFace>,
    pub sites: Vec<SiteIcon>,
    pub raw_text: String,
    pub effects: Vec<EvaluatedEffect>,
    pub score: ScoreBreakdown,
}

#[derive(Debug, Clone)]
struct OcrOutcome {
    raw_text: String,
    effects: Vec<ParsedEffect>,
}

/// One analysis session over a stream of frames.
///
/// Holds the per-stream caches: the locked-on dice scale and the last seen
/// rule-text region, so steady frames skip the scale sweep and the OCR call
/// entirely.
pub struct AnalyzerSession {
    config: AnalyzerConfig,
    library: TemplateLibrary,
    evaluator: ConditionEvaluator,
    preprocessor: TextPreprocessor,
    ocr_params: OcrParams,
    last_dice_scale: Option<f32>,
    last_text_region: Option<GrayImage>,
    last_ocr: Option<OcrOutcome>,
}

impl AnalyzerSession {
    pub fn new(config: AnalyzerConfig, library: TemplateLibrary) -> Self {
        let evaluator = ConditionEvaluator::new(config.strictness);
        let preprocessor = TextPreprocessor::new(config.ocr_upscale);
        Self {
            config,
            library,
            evaluator,
            preprocessor,
            ocr_params: OcrParams::default(),
            last_dice_scale: None,
            last_text_region: None,
            last_ocr: None,
        }
    }

    /// The dice scale locked on by the previous pass, if any.
    pub fn cached_scale(&self) -> Option<f32> {
        self.last_dice_scale
    }

    /// Drop all per-stream caches; the next pass starts cold.
    pub fn reset(&mut self) {
        self.last_dice_scale = None;
        self.last_text_region = None;
        self.last_ocr = None;
    }

    /// Run one full pass over a frame.
    pub fn analyze(
        &mut self,
        frame: &RgbImage,
        ocr: &dyn OcrEngine,
    ) -> Result<AnalysisResult, String> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err("Empty frame".to_string());
        }

        let layout = self.config.layout;
        let dice_region = layout.dice.to_pixels(frame.width(), frame.height());
        let site_region = layout.site.to_pixels(frame.width(), frame.height());
        let text_region = layout.attribute.to_pixels(frame.width(), frame.height());

        let dice = self.detect_dice(frame, dice_region);
        let sites = self.detect_sites(frame, site_region);
        let outcome = self.recognize_rules(frame, text_region, ocr);

        let values: Vec<u8> = dice.iter().map(|d| d.value).collect();
        let effects: Vec<EvaluatedEffect> = outcome
            .effects
            .iter()
            .map(|effect| EvaluatedEffect {
                is_active: self.evaluator.evaluate(&effect.condition, &values),
                effect: effect.clone(),
            })
            .collect();

        let score = score::compose(&values, &sites, &effects);

        Ok(AnalysisResult {
            dice,
            sites,
            raw_text: outcome.raw_text,
            effects,
            score,
        })
    }

    fn detect_dice(&mut self, frame: &RgbImage, region: Roi) -> Vec<DieFace> {
        if !region.is_valid() {
            return Vec::new();
        }
        let crop = crop_rgb(frame, region);
        let gray = DynamicImage::ImageRgb8(crop).to_luma8();

        let scales: Vec<f32> = match self.last_dice_scale {
            Some(scale) => vec![scale],
            None => self.config.dice_scales.clone(),
        };

        let detector = Detector::new(&self.library, &self.config);
        let candidates = detector.detect_dice(&gray, region, &scales);
        let kept = nms::suppress(candidates, self.config.nms_iou);

        let mut dice: Vec<DieFace> = kept
            .into_iter()
            .filter_map(|c| match c.template {
                TemplateKind::Die(value) => Some(DieFace {
                    value,
                    score: c.score,
                    bbox: c.bbox,
                    scale: c.scale,
                }),
                TemplateKind::Site { .. } => None,
            })
            .collect();
        sort_left_to_right(&mut dice, |d| d.bbox.x);

        // Lock onto the leftmost die's scale once the roll is clearly in
        // view; a sparse result invalidates the lock so the next pass
        // sweeps again
        if dice.len() >= 2 {
            self.last_dice_scale = Some(dice[0].scale);
        } else {
            self.last_dice_scale = None;
        }

        dice
    }

    fn detect_sites(&self, frame: &RgbImage, region: Roi) -> Vec<SiteIcon> {
        if !region.is_valid() {
            return Vec::new();
        }
        let crop = crop_rgb(frame, region);

        let detector = Detector::new(&self.library, &self.config);
        let candidates = detector.detect_sites(&crop, region);
        let kept = nms::suppress(candidates, self.config.nms_iou);

        let mut sites: Vec<SiteIcon> = kept
            .into_iter()
            .filter_map(|c| match c.template {
                TemplateKind::Site { kind, rarity } => {
                    let (sampled_rarity, sampled_color) = sample_rarity(frame, &c.bbox);
                    Some(SiteIcon {
                        kind,
                        rarity,
                        score: c.score,
                        bbox: c.bbox,
                        scale: c.scale,
                        sampled_color,
                        sampled_rarity,
                    })
                }
                TemplateKind::Die(_) => None,
            })
            .collect();
        sort_left_to_right(&mut sites, |s| s.bbox.x);
        sites
    }

    fn recognize_rules(&mut self, frame: &RgbImage, region: Roi, ocr: &dyn OcrEngine) -> OcrOutcome {
        let empty = OcrOutcome {
            raw_text: String::new(),
            effects: Vec::new(),
        };
        if region.width <= MIN_TEXT_WIDTH || region.height <= MIN_TEXT_HEIGHT {
            return empty;
        }

        let crop = crop_rgb(frame, region);
        let gray = DynamicImage::ImageRgb8(crop.clone()).to_luma8();

        if let (Some(previous), Some(cached)) = (&self.last_text_region, &self.last_ocr) {
            if changed_pixels(previous, &gray) < self.config.ocr_diff_threshold {
                debug!("rule text unchanged, reusing cached OCR result");
                return cached.clone();
            }
        }

        let outcome = match self
            .preprocessor
            .prepare(&crop)
            .and_then(|prepared| ocr.recognize(&prepared, &self.ocr_params))
        {
            Ok(raw_text) => {
                let effects = parse_effects(&raw_text);
                let outcome = OcrOutcome { raw_text, effects };
                // Only a successful read updates the caches; a failed one
                // is retried on the next pass
                self.last_text_region = Some(gray);
                self.last_ocr = Some(outcome.clone());
                outcome
            }
            Err(e) => {
                warn!(error = %e, "text recognition failed");
                empty
            }
        };
        outcome
    }
}

fn crop_rgb(frame: &RgbImage, region: Roi) -> RgbImage {
    imageops::crop_imm(frame, region.x, region.y, region.width, region.height).to_image()
}

/// Number of pixels that differ between two equally sized grayscale crops.
/// Mismatched dimensions count as fully changed.
fn changed_pixels(a: &GrayImage, b: &GrayImage) -> u32 {
    if a.dimensions() != b.dimensions() {
        return u32::MAX;
    }
    a.pixels()
        .zip(b.pixels())
        .filter(|(pa, pb)| pa[0] != pb[0])
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::Strictness;
    use crate::models::detection::{Rarity, SiteKind};
    use crate::models::roi::{RegionLayout, RoiPct};
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubOcr {
        text: String,
        calls: AtomicUsize,
    }

    impl StubOcr {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OcrEngine for StubOcr {
        fn recognize(&self, _image: &DynamicImage, _params: &OcrParams) -> Result<String, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    struct FailingOcr;

    impl OcrEngine for FailingOcr {
        fn recognize(&self, _image: &DynamicImage, _params: &OcrParams) -> Result<String, String> {
            Err("worker not ready".to_string())
        }
    }

    fn noise(x: u32, y: u32) -> u8 {
        ((x.wrapping_mul(31) ^ y.wrapping_mul(57)).wrapping_mul(119) % 251) as u8
    }

    /// 200x100 frame: dice band on top, rule text in the middle, site strip
    /// at the bottom.
    fn test_layout() -> RegionLayout {
        RegionLayout {
            dice: RoiPct {
                x: 0.0,
                y: 0.0,
                w: 1.0,
                h: 0.4,
            },
            attribute: RoiPct {
                x: 0.0,
                y: 0.4,
                w: 1.0,
                h: 0.3,
            },
            site: RoiPct {
                x: 0.0,
                y: 0.7,
                w: 1.0,
                h: 0.3,
            },
        }
    }

    fn test_config() -> AnalyzerConfig {
        AnalyzerConfig {
            layout: test_layout(),
            dice_scales: vec![1.0],
            site_scales: vec![1.0],
            ..AnalyzerConfig::default()
        }
    }

    /// Frame with pseudo-noise everywhere, plus a purple-tinted site icon in
    /// the site strip. Returns the frame and the two die patches.
    fn build_frame() -> (RgbImage, DynamicImage, DynamicImage, DynamicImage) {
        let mut frame = RgbImage::from_fn(200, 100, |x, y| {
            let n = noise(x, y);
            Rgb([n, noise(x + 1, y), noise(x, y + 1)])
        });

        // Site icon: purple-dominant with texture so correlation is defined
        for y in 0..8 {
            for x in 0..8 {
                let jitter = noise(x, y) % 20;
                frame.put_pixel(
                    80 + x,
                    76 + y,
                    Rgb([145 + jitter / 2, 100 + jitter, 155 - jitter / 2]),
                );
            }
        }

        let die_a = imageops::crop_imm(&frame, 10, 12, 10, 10).to_image();
        let die_b = imageops::crop_imm(&frame, 60, 12, 10, 10).to_image();
        let site = imageops::crop_imm(&frame, 80, 76, 8, 8).to_image();
        (
            frame,
            DynamicImage::ImageRgb8(die_a),
            DynamicImage::ImageRgb8(die_b),
            DynamicImage::ImageRgb8(site),
        )
    }

    fn build_session(with_site: bool) -> (AnalyzerSession, RgbImage) {
        let config = test_config();
        let (frame, die_a, die_b, site) = build_frame();
        let mut templates = vec![
            (TemplateKind::Die(3), die_a),
            (TemplateKind::Die(5), die_b),
        ];
        if with_site {
            templates.push((
                TemplateKind::Site {
                    kind: SiteKind::Multiplier,
                    rarity: Rarity::Epic,
                },
                site,
            ));
        }
        let library = TemplateLibrary::from_images(templates, &config).unwrap();
        (AnalyzerSession::new(config, library), frame)
    }

    #[test]
    fn test_dice_detected_and_ordered_left_to_right() {
        let (mut session, frame) = build_session(false);
        let ocr = StubOcr::new("");
        let result = session.analyze(&frame, &ocr).unwrap();

        let values: Vec<u8> = result.dice.iter().map(|d| d.value).collect();
        assert_eq!(values, vec![3, 5]);
        assert!(result.dice[0].bbox.x < result.dice[1].bbox.x);
        assert_eq!(result.score.base_sum, 8);
    }

    #[test]
    fn test_scale_locks_after_full_detection() {
        let (mut session, frame) = build_session(false);
        let ocr = StubOcr::new("");
        assert_eq!(session.cached_scale(), None);

        session.analyze(&frame, &ocr).unwrap();
        assert_eq!(session.cached_scale(), Some(1.0));

        // A blank frame finds nothing and drops the lock
        let blank = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
        session.analyze(&blank, &ocr).unwrap();
        assert_eq!(session.cached_scale(), None);
    }

    #[test]
    fn test_site_icon_detected_with_rarity_sample() {
        let (mut session, frame) = build_session(true);
        let ocr = StubOcr::new("");
        let result = session.analyze(&frame, &ocr).unwrap();

        assert_eq!(result.sites.len(), 1);
        let site = &result.sites[0];
        assert_eq!(site.kind, SiteKind::Multiplier);
        assert_eq!(site.rarity, Rarity::Epic);
        assert_eq!(site.sampled_rarity, Rarity::Epic);
        // Multiplier x Epic contributes no flat bonus
        assert_eq!(result.score.total_bonus, 0);
        assert_eq!(result.score.final_multiplier, 1.6);
    }

    #[test]
    fn test_effects_evaluated_against_detected_dice() {
        let (mut session, frame) = build_session(false);
        let ocr = StubOcr::new("If a die rolls a 3, Dice Total: +2");
        let result = session.analyze(&frame, &ocr).unwrap();

        assert_eq!(result.effects.len(), 1);
        assert!(result.effects[0].is_active);
        assert_eq!(result.score.total_bonus, 2);
        // (3 + 5 + 2) * 1.0
        assert_eq!(result.score.final_score, 10);
    }

    #[test]
    fn test_unchanged_text_region_reuses_ocr() {
        let (mut session, frame) = build_session(false);
        let ocr = StubOcr::new("Dice Total: +3");

        let first = session.analyze(&frame, &ocr).unwrap();
        let second = session.analyze(&frame, &ocr).unwrap();
        assert_eq!(ocr.call_count(), 1);
        assert_eq!(first.raw_text, second.raw_text);
        assert_eq!(second.effects.len(), 1);
    }

    #[test]
    fn test_changed_text_region_reruns_ocr() {
        let (mut session, mut frame) = build_session(false);
        let ocr = StubOcr::new("Dice Total: +3");

        session.analyze(&frame, &ocr).unwrap();
        // Rewrite a band of the rule-text region
        for y in 45..60 {
            for x in 20..180 {
                frame.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        session.analyze(&frame, &ocr).unwrap();
        assert_eq!(ocr.call_count(), 2);
    }

    #[test]
    fn test_ocr_failure_yields_empty_effects_and_retries() {
        let (mut session, frame) = build_session(false);

        let result = session.analyze(&frame, &FailingOcr).unwrap();
        assert!(result.raw_text.is_empty());
        assert!(result.effects.is_empty());

        // The failure was not cached; a healthy engine gets called
        let ocr = StubOcr::new("Dice Total: +1");
        let result = session.analyze(&frame, &ocr).unwrap();
        assert_eq!(ocr.call_count(), 1);
        assert_eq!(result.effects.len(), 1);
    }

    #[test]
    fn test_reset_clears_caches() {
        let (mut session, frame) = build_session(false);
        let ocr = StubOcr::new("Dice Total: +3");

        session.analyze(&frame, &ocr).unwrap();
        session.reset();
        assert_eq!(session.cached_scale(), None);

        session.analyze(&frame, &ocr).unwrap();
        assert_eq!(ocr.call_count(), 2);
    }

    #[test]
    fn test_tiny_text_region_skips_ocr() {
        let mut config = test_config();
        config.layout.attribute = RoiPct {
            x: 0.0,
            y: 0.4,
            w: 0.05,
            h: 0.05,
        };
        let (frame, die_a, die_b, _) = build_frame();
        let library = TemplateLibrary::from_images(
            vec![(TemplateKind::Die(3), die_a), (TemplateKind::Die(5), die_b)],
            &config,
        )
        .unwrap();
        let mut session = AnalyzerSession::new(config, library);

        let ocr = StubOcr::new("Dice Total: +3");
        let result = session.analyze(&frame, &ocr).unwrap();
        assert_eq!(ocr.call_count(), 0);
        assert!(result.raw_text.is_empty());
    }

    #[test]
    fn test_empty_frame_is_error() {
        let (mut session, _) = build_session(false);
        let ocr = StubOcr::new("");
        assert!(session.analyze(&RgbImage::new(0, 0), &ocr).is_err());
    }

    #[test]
    fn test_fail_closed_strictness_flows_through() {
        let mut config = test_config();
        config.strictness = Strictness::FailClosed;
        let (frame, die_a, die_b, _) = build_frame();
        let library = TemplateLibrary::from_images(
            vec![(TemplateKind::Die(3), die_a), (TemplateKind::Die(5), die_b)],
            &config,
        )
        .unwrap();
        let mut session = AnalyzerSession::new(config, library);

        let ocr = StubOcr::new("If the stars align, Dice Total: +50");
        let result = session.analyze(&frame, &ocr).unwrap();
        assert_eq!(result.effects.len(), 1);
        assert!(!result.effects[0].is_active);
        assert_eq!(result.score.total_bonus, 0);
    }
}
