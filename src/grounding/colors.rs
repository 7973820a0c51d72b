use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Pages at or above this brightness count as light.
const DARK_THRESHOLD: f64 = 50.0;

pub fn is_dark(page_brightness: f64) -> bool {
    page_brightness < DARK_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Colours applied to one element's overlay boxes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub bg_color: String,
    pub text_color: String,
}

impl MarkerStyle {
    /// Light markers with black labels on dark pages, dark markers with
    /// white labels on light pages.
    pub fn contrasting(color: Hsl, page_brightness: f64) -> Self {
        let text_color = if is_dark(page_brightness) { "#000" } else { "#fff" };
        Self {
            bg_color: color.to_string(),
            text_color: text_color.to_string(),
        }
    }
}

/// Supplies marker colours. Lightness must contrast with the page.
pub trait ColorSource: Send {
    fn next_color(&mut self, page_brightness: f64) -> Hsl;
}

// ============================================================================
// RandomColorSource
// ============================================================================

pub struct RandomColorSource {
    rng: StdRng,
}

impl RandomColorSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 60-85 on dark pages, 15-40 on light ones.
    pub fn random_lightness(&mut self, page_brightness: f64) -> u8 {
        if is_dark(page_brightness) {
            self.rng.gen_range(60..=85)
        } else {
            self.rng.gen_range(15..=40)
        }
    }
}

impl Default for RandomColorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorSource for RandomColorSource {
    fn next_color(&mut self, page_brightness: f64) -> Hsl {
        Hsl {
            hue: self.rng.gen_range(0..360),
            saturation: self.rng.gen_range(0..=100),
            lightness: self.random_lightness(page_brightness),
        }
    }
}

// ============================================================================
// FixedColorSource
// ============================================================================

/// Always the same hue and saturation; lightness still follows the page.
#[derive(Debug, Clone, Copy)]
pub struct FixedColorSource {
    pub hue: u16,
    pub saturation: u8,
}

impl FixedColorSource {
    pub fn new(hue: u16, saturation: u8) -> Self {
        Self { hue, saturation }
    }
}

impl ColorSource for FixedColorSource {
    fn next_color(&mut self, page_brightness: f64) -> Hsl {
        Hsl {
            hue: self.hue,
            saturation: self.saturation,
            lightness: if is_dark(page_brightness) { 75 } else { 25 },
        }
    }
}
