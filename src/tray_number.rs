//! Layout and compositing of the desktop number drawn on the tray icon.
//!
//! The number is drawn on a 256x256 canvas and scaled down to the tray size
//! afterwards, so origins and font heights below are in canvas pixels.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};

pub const CANVAS_SIZE: u32 = 256;
pub const TRAY_ICON_SIZE: u32 = 32;

const BACKGROUND: Rgba<u8> = Rgba([32, 36, 44, 255]);
const BORDER: Rgba<u8> = Rgba([96, 160, 255, 255]);
const BORDER_WIDTH: u32 = 12;
pub const NUMBER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Font size class picked from the number of digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberTier {
    /// One digit.
    Large,
    /// Two digits.
    Medium,
    /// Three or more digits.
    Small,
}

impl NumberTier {
    pub fn for_number(number: usize) -> Self {
        match number {
            0..=9 => NumberTier::Large,
            10..=99 => NumberTier::Medium,
            _ => NumberTier::Small,
        }
    }

    /// Character cell height in canvas pixels.
    pub fn font_height(&self) -> i32 {
        match self {
            NumberTier::Large => 150,
            NumberTier::Medium => 120,
            NumberTier::Small => 75,
        }
    }

    /// Top-left corner of the text on the canvas.
    pub fn origin(&self) -> (i32, i32) {
        match self {
            NumberTier::Large => (100, 50),
            NumberTier::Medium => (75, 65),
            NumberTier::Small => (90, 100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLayout {
    pub text: String,
    pub tier: NumberTier,
    pub font_height: i32,
    pub origin: (i32, i32),
}

/// Layout for a 1-based desktop number.
pub fn layout_for(number: usize) -> NumberLayout {
    let tier = NumberTier::for_number(number);
    NumberLayout {
        text: number.to_string(),
        tier,
        font_height: tier.font_height(),
        origin: tier.origin(),
    }
}

/// The plain icon the number is drawn on: a dark tile with a coloured frame.
pub fn base_icon() -> RgbaImage {
    RgbaImage::from_fn(CANVAS_SIZE, CANVAS_SIZE, |x, y| {
        let edge = x < BORDER_WIDTH
            || y < BORDER_WIDTH
            || x >= CANVAS_SIZE - BORDER_WIDTH
            || y >= CANVAS_SIZE - BORDER_WIDTH;
        if edge {
            BORDER
        } else {
            BACKGROUND
        }
    })
}

/// Blend `color` into `base` weighted by `coverage` (0 = untouched,
/// 255 = solid). Both images must have the same dimensions.
pub fn compose_number(base: &RgbaImage, coverage: &GrayImage, color: Rgba<u8>) -> RgbaImage {
    let mut out = base.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let a = coverage.get_pixel(x, y).0[0] as u32;
        if a == 0 {
            continue;
        }
        for c in 0..3 {
            let under = pixel.0[c] as u32;
            pixel.0[c] = ((color.0[c] as u32 * a + under * (255 - a)) / 255) as u8;
        }
        pixel.0[3] = pixel.0[3].max(a as u8);
    }
    out
}

/// Scale a canvas down to the tray icon size.
pub fn to_tray_size(canvas: &RgbaImage) -> RgbaImage {
    imageops::resize(canvas, TRAY_ICON_SIZE, TRAY_ICON_SIZE, FilterType::Triangle)
}
