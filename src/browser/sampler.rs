use async_trait::async_trait;

/// Measures how bright the rendered page is, on a 0-100 scale.
///
/// `screenshot` is an optional pre-captured image (data URL or path) the
/// sampler may use instead of capturing a fresh one.
#[async_trait]
pub trait VisualSampler: Send + Sync {
    async fn brightness(&self, screenshot: Option<&str>) -> f64;
}

/// Sampler that always reports the same brightness.
#[derive(Debug, Clone, Copy)]
pub struct FixedBrightness(pub f64);

#[async_trait]
impl VisualSampler for FixedBrightness {
    async fn brightness(&self, _screenshot: Option<&str>) -> f64 {
        self.0
    }
}

/// Clamp a sampled value into `[0, 100]`; NaN reads as mid-grey.
pub fn clamp_brightness(value: f64) -> f64 {
    if value.is_nan() {
        50.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
