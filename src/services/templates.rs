use crate::models::config::AnalyzerConfig;
use crate::models::detection::{Rarity, SiteKind, TemplateKind};
use image::imageops::FilterType;
use image::{imageops, DynamicImage, GrayImage, RgbImage};
use std::path::Path;
use tracing::warn;

/// Template pixel data. Die faces are matched in grayscale, site icons in
/// color (their rarity variants differ mostly by hue).
#[derive(Debug, Clone)]
pub enum TemplatePixels {
    Gray(GrayImage),
    Color(RgbImage),
}

impl TemplatePixels {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            TemplatePixels::Gray(img) => img.dimensions(),
            TemplatePixels::Color(img) => img.dimensions(),
        }
    }

    fn resized(&self, width: u32, height: u32) -> TemplatePixels {
        match self {
            TemplatePixels::Gray(img) => TemplatePixels::Gray(imageops::resize(
                img,
                width,
                height,
                FilterType::CatmullRom,
            )),
            TemplatePixels::Color(img) => TemplatePixels::Color(imageops::resize(
                img,
                width,
                height,
                FilterType::CatmullRom,
            )),
        }
    }
}

/// One reference image with its pre-resized variants, keyed by base scale.
#[derive(Debug, Clone)]
pub struct Template {
    pub kind: TemplateKind,
    variants: Vec<(f32, TemplatePixels)>,
}

impl Template {
    /// Pixels pre-resized for the given base scale, if it was precomputed.
    pub fn variant(&self, scale: f32) -> Option<&TemplatePixels> {
        self.variants
            .iter()
            .find(|(s, _)| *s == scale)
            .map(|(_, pixels)| pixels)
    }

    pub fn scales(&self) -> impl Iterator<Item = f32> + '_ {
        self.variants.iter().map(|(s, _)| *s)
    }
}

/// Fixed catalog of reference images, loaded once per session and immutable
/// afterwards.
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

/// Asset file name for a die face template
pub fn die_file_name(value: u8) -> String {
    format!("dice_{}.png", value)
}

/// Asset file name for a site icon template
pub fn site_file_name(kind: SiteKind, rarity: Rarity) -> String {
    let color = match rarity {
        Rarity::Common => "gray",
        Rarity::Rare => "blue",
        Rarity::Epic => "purple",
        Rarity::Unique => "orange",
        Rarity::Legendry => "green",
    };
    match kind {
        SiteKind::Bonus => format!("blessed_{}_dice.png", color),
        SiteKind::BonusMultiplier => format!("{}_holy_rollers.png", color),
        SiteKind::Multiplier => format!("swift_rolling_{}_dice.png", color),
        SiteKind::PenaltyMultiplier => format!("sharp_edged_{}_dice.png", color),
    }
}

impl TemplateLibrary {
    /// Load the full catalog (6 die faces + 20 site icons) from a directory.
    ///
    /// A file that is missing or fails to decode is logged and skipped; an
    /// entirely empty library is an error.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P, config: &AnalyzerConfig) -> Result<Self, String> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(format!("Template directory not found: {:?}", dir));
        }

        let mut sources: Vec<(TemplateKind, String)> = Vec::new();
        for value in 1..=6u8 {
            sources.push((TemplateKind::Die(value), die_file_name(value)));
        }
        for kind in SiteKind::ALL {
            for rarity in Rarity::ALL {
                sources.push((
                    TemplateKind::Site { kind, rarity },
                    site_file_name(kind, rarity),
                ));
            }
        }

        let mut images = Vec::new();
        for (kind, file_name) in sources {
            let path = dir.join(&file_name);
            match image::open(&path) {
                Ok(img) => images.push((kind, img)),
                Err(e) => {
                    warn!(template = %kind.id(), file = %file_name, error = %e, "skipping template");
                }
            }
        }

        Self::from_images(images, config)
    }

    /// Build a library from already-decoded images (test seam).
    pub fn from_images(
        images: Vec<(TemplateKind, DynamicImage)>,
        config: &AnalyzerConfig,
    ) -> Result<Self, String> {
        if images.is_empty() {
            return Err("No templates loaded".to_string());
        }

        let templates = images
            .into_iter()
            .map(|(kind, img)| {
                let base = if kind.is_site() {
                    TemplatePixels::Color(img.to_rgb8())
                } else {
                    TemplatePixels::Gray(img.to_luma8())
                };
                let scales: &[f32] = if kind.is_site() {
                    &config.site_scales
                } else {
                    &config.dice_scales
                };
                let variants = precompute_variants(&base, scales, kind.is_site(), config);
                Template { kind, variants }
            })
            .collect();

        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn dice(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter(|t| !t.kind.is_site())
    }

    pub fn sites(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter(|t| t.kind.is_site())
    }
}

/// Resize the base image once per candidate scale. Site templates bake in
/// the search-region upscale so matching happens 1:1 in the enlarged space.
fn precompute_variants(
    base: &TemplatePixels,
    scales: &[f32],
    is_site: bool,
    config: &AnalyzerConfig,
) -> Vec<(f32, TemplatePixels)> {
    let (base_w, base_h) = base.dimensions();

    scales
        .iter()
        .filter_map(|&scale| {
            let effective = if is_site {
                scale * config.site_upscale
            } else {
                scale
            };
            let width = (base_w as f32 * effective).round() as u32;
            let height = (base_h as f32 * effective).round() as u32;
            if width == 0 || height == 0 {
                return None;
            }
            Some((scale, base.resized(width, height)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn test_config() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    fn gray_die(size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(size, size, Luma([200u8])))
    }

    fn color_site(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([80, 150, 155])))
    }

    #[test]
    fn test_die_file_names() {
        assert_eq!(die_file_name(1), "dice_1.png");
        assert_eq!(die_file_name(6), "dice_6.png");
    }

    #[test]
    fn test_site_file_names() {
        assert_eq!(
            site_file_name(SiteKind::Bonus, Rarity::Common),
            "blessed_gray_dice.png"
        );
        assert_eq!(
            site_file_name(SiteKind::BonusMultiplier, Rarity::Rare),
            "blue_holy_rollers.png"
        );
        assert_eq!(
            site_file_name(SiteKind::Multiplier, Rarity::Legendry),
            "swift_rolling_green_dice.png"
        );
        assert_eq!(
            site_file_name(SiteKind::PenaltyMultiplier, Rarity::Unique),
            "sharp_edged_orange_dice.png"
        );
    }

    #[test]
    fn test_die_template_variants_use_dice_scales() {
        let config = test_config();
        let library =
            TemplateLibrary::from_images(vec![(TemplateKind::Die(3), gray_die(40))], &config)
                .unwrap();

        let template = library.dice().next().unwrap();
        let scales: Vec<f32> = template.scales().collect();
        assert_eq!(scales, config.dice_scales);

        // 40px base at scale 0.8 -> 32px, no site upscale involved
        let variant = template.variant(0.8).unwrap();
        assert_eq!(variant.dimensions(), (32, 32));
    }

    #[test]
    fn test_site_template_variants_bake_in_upscale() {
        let config = test_config();
        let kind = TemplateKind::Site {
            kind: SiteKind::Bonus,
            rarity: Rarity::Rare,
        };
        let library = TemplateLibrary::from_images(vec![(kind, color_site(20))], &config).unwrap();

        let template = library.sites().next().unwrap();
        // 20px base at scale 1.0 with 2.5x search upscale -> 50px
        let variant = template.variant(1.0).unwrap();
        assert_eq!(variant.dimensions(), (50, 50));
    }

    #[test]
    fn test_site_templates_stay_color_dice_stay_gray() {
        let config = test_config();
        let site = TemplateKind::Site {
            kind: SiteKind::Multiplier,
            rarity: Rarity::Epic,
        };
        let library = TemplateLibrary::from_images(
            vec![(TemplateKind::Die(1), gray_die(30)), (site, color_site(20))],
            &config,
        )
        .unwrap();

        assert_eq!(library.len(), 2);
        assert!(!library.is_empty());

        let die = library.dice().next().unwrap();
        assert!(matches!(die.variant(1.0), Some(TemplatePixels::Gray(_))));

        let site = library.sites().next().unwrap();
        assert!(matches!(site.variant(1.0), Some(TemplatePixels::Color(_))));
    }

    #[test]
    fn test_unknown_scale_has_no_variant() {
        let config = test_config();
        let library =
            TemplateLibrary::from_images(vec![(TemplateKind::Die(2), gray_die(30))], &config)
                .unwrap();
        let template = library.dice().next().unwrap();
        assert!(template.variant(3.0).is_none());
    }

    #[test]
    fn test_empty_library_is_error() {
        let config = test_config();
        assert!(TemplateLibrary::from_images(Vec::new(), &config).is_err());
    }

    #[test]
    fn test_missing_directory_is_error() {
        let config = test_config();
        let result = TemplateLibrary::load_from_dir("/nonexistent/templates", &config);
        assert!(result.is_err());
    }
}
