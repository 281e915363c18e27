//! Pixel value abstraction shared by the pyramid, blend and storage code.
//!
//! Algorithms are written once against [`Pixel`]; grayscale (`f32`) and
//! three-channel ([`Rgb`]) buffers both go through the same code paths.

use std::ops::{Add, AddAssign, Mul, Sub};

use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};

/// Channel layout of a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    Gray,
    Rgb,
}

impl std::fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gray => write!(f, "Grayscale"),
            Self::Rgb => write!(f, "RGB"),
        }
    }
}

pub trait Pixel:
    Copy
    + Default
    + PartialEq
    + Send
    + Sync
    + std::fmt::Debug
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + AddAssign
    + Zero
{
    /// Number of `f32` channels per pixel.
    const CHANNELS: usize;
    const LAYOUT: PixelLayout;

    /// Build a pixel from the first `CHANNELS` values of `channels`.
    fn from_channels(channels: &[f32]) -> Self;

    /// Write `CHANNELS` values into the front of `out`.
    fn write_channels(self, out: &mut [f32]);

    fn from_rgb(rgb: [f32; 3]) -> Self;

    fn to_rgb(self) -> [f32; 3];
}

impl Pixel for f32 {
    const CHANNELS: usize = 1;
    const LAYOUT: PixelLayout = PixelLayout::Gray;

    fn from_channels(channels: &[f32]) -> Self {
        channels[0]
    }

    fn write_channels(self, out: &mut [f32]) {
        out[0] = self;
    }

    fn from_rgb(rgb: [f32; 3]) -> Self {
        LUMINANCE_R * rgb[0] + LUMINANCE_G * rgb[1] + LUMINANCE_B * rgb[2]
    }

    fn to_rgb(self) -> [f32; 3] {
        [self; 3]
    }
}

/// Three floating-point channels (RGB or Lab, depending on context).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b])
    }

    /// Squared Euclidean norm over the three channels.
    pub fn norm_sqr(self) -> f32 {
        self.0.iter().map(|v| v * v).sum()
    }
}

impl Add for Rgb {
    type Output = Rgb;

    fn add(self, rhs: Rgb) -> Rgb {
        Rgb([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl Sub for Rgb {
    type Output = Rgb;

    fn sub(self, rhs: Rgb) -> Rgb {
        Rgb([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
        ])
    }
}

impl Mul<f32> for Rgb {
    type Output = Rgb;

    fn mul(self, rhs: f32) -> Rgb {
        Rgb([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

impl AddAssign for Rgb {
    fn add_assign(&mut self, rhs: Rgb) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl Zero for Rgb {
    fn zero() -> Self {
        Rgb([0.0; 3])
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

impl Pixel for Rgb {
    const CHANNELS: usize = 3;
    const LAYOUT: PixelLayout = PixelLayout::Rgb;

    fn from_channels(channels: &[f32]) -> Self {
        Rgb([channels[0], channels[1], channels[2]])
    }

    fn write_channels(self, out: &mut [f32]) {
        out[..3].copy_from_slice(&self.0);
    }

    fn from_rgb(rgb: [f32; 3]) -> Self {
        Rgb(rgb)
    }

    fn to_rgb(self) -> [f32; 3] {
        self.0
    }
}
