use image::RgbImage;

/// Frame source abstraction - the capture backend lives outside this crate.
///
/// Implementations are expected to return frames with stable dimensions for
/// the lifetime of a tracking session.
pub trait FrameSource: Send {
    /// Grab the current frame as RGB
    fn frame(&mut self) -> Result<RgbImage, String>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Result<RgbImage, String> + Send,
{
    fn frame(&mut self) -> Result<RgbImage, String> {
        self()
    }
}
