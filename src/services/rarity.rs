use crate::models::detection::{BoundingBox, Rarity};
use image::RgbImage;

/// Reference mean colors sampled from the site icon art, one per rarity.
pub const RARITY_COLORS: [(Rarity, [u8; 3]); 5] = [
    (Rarity::Common, [120, 120, 110]),
    (Rarity::Unique, [215, 140, 60]),
    (Rarity::Legendry, [80, 190, 80]),
    (Rarity::Rare, [80, 150, 155]),
    (Rarity::Epic, [145, 100, 155]),
];

/// Classify a detected site icon by the mean color of its central window.
///
/// The window is a half-size box centered inside the detection, which keeps
/// the border art out of the average. Returns the nearest reference rarity
/// (Euclidean distance in RGB) along with the sampled mean. Degenerate
/// windows fall back to Common with a zero sample.
pub fn sample_rarity(frame: &RgbImage, bbox: &BoundingBox) -> (Rarity, [u8; 3]) {
    let inner_w = (bbox.width as f64 * 0.5).floor() as u32;
    let inner_h = (bbox.height as f64 * 0.5).floor() as u32;
    let inner_x = bbox.x + (bbox.width - inner_w) / 2;
    let inner_y = bbox.y + (bbox.height - inner_h) / 2;

    let x_end = (inner_x + inner_w).min(frame.width());
    let y_end = (inner_y + inner_h).min(frame.height());
    if inner_x >= x_end || inner_y >= y_end {
        return (Rarity::Common, [0, 0, 0]);
    }

    let mut sums = [0f64; 3];
    let mut count = 0f64;
    for y in inner_y..y_end {
        for x in inner_x..x_end {
            let px = frame.get_pixel(x, y);
            sums[0] += px[0] as f64;
            sums[1] += px[1] as f64;
            sums[2] += px[2] as f64;
            count += 1.0;
        }
    }

    let mean = [
        (sums[0] / count).round() as u8,
        (sums[1] / count).round() as u8,
        (sums[2] / count).round() as u8,
    ];
    (classify(mean), mean)
}

/// Nearest reference rarity for a mean color.
pub fn classify(color: [u8; 3]) -> Rarity {
    let mut best = Rarity::Common;
    let mut best_dist = f64::MAX;
    for (rarity, reference) in RARITY_COLORS {
        let dist = distance_sq(color, reference);
        if dist < best_dist {
            best_dist = dist;
            best = rarity;
        }
    }
    best
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> f64 {
    (0..3)
        .map(|i| {
            let d = a[i] as f64 - b[i] as f64;
            d * d
        })
        .sum()
}
