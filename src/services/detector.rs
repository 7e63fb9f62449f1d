use crate::models::config::AnalyzerConfig;
use crate::models::detection::{BoundingBox, Candidate};
use crate::models::roi::Roi;
use crate::services::matcher::{self, ScoreGrid};
use crate::services::templates::{Template, TemplateLibrary, TemplatePixels};
use image::imageops::FilterType;
use image::{imageops, GrayImage, RgbImage};
use rayon::prelude::*;

/// Grid walk stride. Half-density sampling of the score grid is enough to
/// hit every real icon while halving the scan cost on both axes.
const GRID_STRIDE: usize = 2;

/// Multi-scale template search over the dice and site regions.
///
/// Candidate order is deterministic: library order, then scale order, then
/// row-major grid order. NMS relies on that for stable tie-breaking.
pub struct Detector<'a> {
    library: &'a TemplateLibrary,
    config: &'a AnalyzerConfig,
}

impl<'a> Detector<'a> {
    pub fn new(library: &'a TemplateLibrary, config: &'a AnalyzerConfig) -> Self {
        Self { library, config }
    }

    /// Search the grayscale dice region at the given base scales.
    ///
    /// `scales` is the full sweep normally, or the single cached scale once
    /// a prior pass locked on (see `AnalyzerSession`). Coordinates are
    /// offset by the region origin; no scale inversion is involved.
    pub fn detect_dice(&self, dice_gray: &GrayImage, region: Roi, scales: &[f32]) -> Vec<Candidate> {
        let templates: Vec<&Template> = self.library.dice().collect();
        let threshold = self.config.dice_threshold;

        templates
            .par_iter()
            .map(|template| {
                let mut found = Vec::new();
                for &scale in scales {
                    let Some(TemplatePixels::Gray(variant)) = template.variant(scale) else {
                        continue;
                    };
                    if !matcher::fits(dice_gray.dimensions(), variant.dimensions()) {
                        continue;
                    }
                    let grid = matcher::match_gray(dice_gray, variant);
                    found.extend(collect_candidates(&grid, threshold, |col, row, score| {
                        Candidate {
                            template: template.kind,
                            score,
                            bbox: BoundingBox::new(
                                col + region.x,
                                row + region.y,
                                variant.width(),
                                variant.height(),
                            ),
                            scale,
                        }
                    }));
                }
                found
            })
            .flatten()
            .collect()
    }

    /// Search the color site region.
    ///
    /// The cropped region is first upscaled (site icons are small, so the
    /// search happens in an enlarged space); matches are mapped back to
    /// frame coordinates through the inverse factor plus the region origin.
    pub fn detect_sites(&self, site_rgb: &RgbImage, region: Roi) -> Vec<Candidate> {
        let upscale = self.config.site_upscale;
        let enlarged_w = (site_rgb.width() as f32 * upscale).round() as u32;
        let enlarged_h = (site_rgb.height() as f32 * upscale).round() as u32;
        if enlarged_w == 0 || enlarged_h == 0 {
            return Vec::new();
        }
        let enlarged = imageops::resize(site_rgb, enlarged_w, enlarged_h, FilterType::CatmullRom);

        let templates: Vec<&Template> = self.library.sites().collect();
        let threshold = self.config.site_threshold;
        let down = 1.0 / upscale;

        templates
            .par_iter()
            .map(|template| {
                let mut found = Vec::new();
                for scale in template.scales().collect::<Vec<_>>() {
                    let Some(TemplatePixels::Color(variant)) = template.variant(scale) else {
                        continue;
                    };
                    if !matcher::fits(enlarged.dimensions(), variant.dimensions()) {
                        continue;
                    }
                    let grid = matcher::match_color(&enlarged, variant);
                    found.extend(collect_candidates(&grid, threshold, |col, row, score| {
                        Candidate {
                            template: template.kind,
                            score,
                            bbox: BoundingBox::new(
                                (col as f32 * down).round() as u32 + region.x,
                                (row as f32 * down).round() as u32 + region.y,
                                (variant.width() as f32 * down).round() as u32,
                                (variant.height() as f32 * down).round() as u32,
                            ),
                            scale,
                        }
                    }));
                }
                found
            })
            .flatten()
            .collect()
    }
}

fn collect_candidates<F: Fn(u32, u32, f32) -> Candidate>(
    grid: &ScoreGrid,
    threshold: f32,
    build: F,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for row in (0..grid.height()).step_by(GRID_STRIDE) {
        for col in (0..grid.width()).step_by(GRID_STRIDE) {
            let score = grid.get_pixel(col, row)[0];
            if score > threshold {
                out.push(build(col, row, score));
            }
        }
    }
    out
}
