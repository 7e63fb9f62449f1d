use image::DynamicImage;

/// Recognition settings handed to the engine with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrParams {
    /// Characters the engine may emit; everything else is dropped
    pub char_whitelist: String,
    /// Treat the input as a single uniform block of text
    pub single_block: bool,
}

impl Default for OcrParams {
    fn default() -> Self {
        Self {
            char_whitelist:
                "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789:,.+- ".to_string(),
            single_block: true,
        }
    }
}

/// Text recognition backend. The engine itself (tesseract or otherwise)
/// lives outside this crate; implementations own their worker lifecycle
/// and are expected to stay warm between calls.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in an already-preprocessed image
    fn recognize(&self, image: &DynamicImage, params: &OcrParams) -> Result<String, String>;

    /// Whether the backend is ready to serve requests
    fn is_available(&self) -> bool {
        true
    }
}
