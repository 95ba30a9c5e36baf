use anyhow::Result;
use image::RgbImage;

use crate::detect::result::RawDetection;

/// Object detector capability.
///
/// A backend is loaded once at startup and shared read-only between analysis
/// runs, so `detect` takes `&self` and implementations must be `Send + Sync`.
///
/// Implementations MUST:
/// - Treat the frame as read-only and not retain it past the call
/// - Not write frames to disk or send them over the network
pub trait ObjectDetector: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB frame.
    ///
    /// Returned boxes are in the pixel coordinates of `frame`. An error concerns
    /// this frame only.
    fn detect(&self, frame: &RgbImage) -> Result<Vec<RawDetection>>;

    /// Optional warm-up hook, called once after loading.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}
