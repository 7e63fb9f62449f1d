use image::imageops::FilterType;
use image::{imageops, DynamicImage, GrayImage, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;

/// Blur radius applied before binarization; knocks out aliasing fringes on
/// the glyph edges without eating thin strokes.
const BLUR_SIGMA: f32 = 0.8;

/// Turns a raw rule-text crop into the high-contrast image the recognition
/// engine wants: upscale, grayscale, slight blur, Otsu binarize, invert to
/// dark-on-light.
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    upscale: f32,
}

impl TextPreprocessor {
    pub fn new(upscale: f32) -> Self {
        Self { upscale }
    }

    pub fn prepare(&self, crop: &RgbImage) -> Result<DynamicImage, String> {
        let width = (crop.width() as f32 * self.upscale).round() as u32;
        let height = (crop.height() as f32 * self.upscale).round() as u32;
        if width == 0 || height == 0 {
            return Err("Empty text region".to_string());
        }

        let enlarged = imageops::resize(crop, width, height, FilterType::CatmullRom);
        let gray: GrayImage = DynamicImage::ImageRgb8(enlarged).to_luma8();
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);

        let level = otsu_level(&blurred);
        let mut binary = threshold(&blurred, level, ThresholdType::Binary);
        imageops::invert(&mut binary);

        Ok(DynamicImage::ImageLuma8(binary))
    }
}
