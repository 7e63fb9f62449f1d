use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::definitions::Image;

/// Similarity grid for every valid template placement inside a search
/// image. Entry `(col, row)` scores the placement with its top-left corner
/// at that pixel; dimensions are `search - template + 1` per axis.
pub type ScoreGrid = Image<Luma<f32>>;

/// Correlation coefficient of a grayscale template over a grayscale search
/// image, in `[-1, 1]`.
///
/// Both the template and each search window are mean-centered before
/// correlating, so uniform brightness contributes nothing: a bright flat
/// region scores 0, not ~1 as plain normalized cross-correlation would.
/// Windows with zero variance (or a flat template) score 0.
///
/// Caller must guarantee the template fits inside the search image.
pub fn match_gray(search: &GrayImage, template: &GrayImage) -> ScoreGrid {
    let (search_w, search_h) = search.dimensions();
    let (template_w, template_h) = template.dimensions();
    let out_w = search_w - template_w + 1;
    let out_h = search_h - template_h + 1;
    let n = (template_w * template_h) as f32;

    let template_mean = template.pixels().map(|p| p[0] as f32).sum::<f32>() / n;
    let centered: Vec<f32> = template
        .pixels()
        .map(|p| p[0] as f32 - template_mean)
        .collect();
    let template_norm_sq: f32 = centered.iter().map(|v| v * v).sum();

    ImageBuffer::from_fn(out_w, out_h, |ox, oy| {
        let mut dot = 0.0f32;
        let mut sum = 0.0f32;
        let mut sum_sq = 0.0f32;
        for ty in 0..template_h {
            for tx in 0..template_w {
                let value = search.get_pixel(ox + tx, oy + ty)[0] as f32;
                // The template side is already centered, so this dot
                // product equals the fully mean-centered numerator
                dot += value * centered[(ty * template_w + tx) as usize];
                sum += value;
                sum_sq += value * value;
            }
        }
        let window_var = sum_sq - sum * sum / n;
        let denom = (window_var * template_norm_sq).sqrt();
        let score = if denom > f32::EPSILON { dot / denom } else { 0.0 };
        Luma([score])
    })
}

/// Color template match: the coefficient is computed per RGB channel and
/// the three grids are averaged.
pub fn match_color(search: &RgbImage, template: &RgbImage) -> ScoreGrid {
    let grids: Vec<ScoreGrid> = (0..3)
        .map(|c| match_gray(&channel_plane(search, c), &channel_plane(template, c)))
        .collect();

    let (w, h) = grids[0].dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let sum: f32 = grids.iter().map(|g| g.get_pixel(x, y)[0]).sum();
        Luma([sum / 3.0])
    })
}

/// Does the template fit inside the search image?
pub fn fits(search: (u32, u32), template: (u32, u32)) -> bool {
    template.0 <= search.0 && template.1 <= search.1
}

fn channel_plane(img: &RgbImage, channel: usize) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([img.get_pixel(x, y)[channel]])
    })
}
