use std::path::Path;

use image::{ImageBuffer, ImageDecoder, ImageReader, Luma, LumaA, Rgba};
use ndarray::Array2;

use crate::engine::SourceImage;
use crate::error::{BlendError, Result};
use crate::pixel::{Pixel, PixelLayout};

/// Header information of an image file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub has_alpha: bool,
    pub bits_per_pixel: u16,
}

/// Read dimensions and channel layout without decoding pixel data.
pub fn probe(path: &Path) -> Result<ImageInfo> {
    let decoder = ImageReader::open(path)?.with_guessed_format()?.into_decoder()?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();
    Ok(ImageInfo {
        width,
        height,
        layout: if color.has_color() {
            PixelLayout::Rgb
        } else {
            PixelLayout::Gray
        },
        has_alpha: color.has_alpha(),
        bits_per_pixel: color.bits_per_pixel(),
    })
}

/// Decode an image placed at `(x, y)` in the panorama.
///
/// Pixels with non-zero alpha carry data; images without an alpha channel
/// are valid everywhere.
pub fn load_source<P: Pixel>(path: &Path, x: usize, y: usize) -> Result<SourceImage<P>> {
    let img = image::open(path)?;
    let has_alpha = img.color().has_alpha();
    let rgba = img.to_rgba32f();
    let (w, h) = rgba.dimensions();

    let mut data = Array2::from_elem((h as usize, w as usize), P::zero());
    let mut alpha = Array2::from_elem((h as usize, w as usize), true);
    for (col, row, px) in rgba.enumerate_pixels() {
        let (row, col) = (row as usize, col as usize);
        data[[row, col]] = P::from_rgb([px[0], px[1], px[2]]);
        if has_alpha {
            alpha[[row, col]] = px[3] > 0.0;
        }
    }

    SourceImage::new(data, alpha, x, y)
}

fn quantize16(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0).round() as u16
}

fn quantize8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Save a blended image with its alpha, choosing the format from the
/// extension: 8-bit PNG, otherwise 16-bit RGBA TIFF.
pub fn save_composite<P: Pixel>(data: &Array2<P>, alpha: &Array2<bool>, path: &Path) -> Result<()> {
    if data.dim() != alpha.dim() {
        return Err(BlendError::shape("save", 0, data.dim(), alpha.dim()));
    }
    let (h, w) = data.dim();
    let (w, h) = (w as u32, h as u32);
    let at = |x: u32, y: u32| {
        let idx = [y as usize, x as usize];
        (data[idx].to_rgb(), alpha[idx])
    };

    match extension(path).as_deref() {
        Some("png") if P::LAYOUT == PixelLayout::Gray => {
            ImageBuffer::from_fn(w, h, |x, y| {
                let (rgb, a) = at(x, y);
                LumaA([quantize8(rgb[0]), if a { u8::MAX } else { 0 }])
            })
            .save(path)?;
        }
        Some("png") => {
            ImageBuffer::from_fn(w, h, |x, y| {
                let (rgb, a) = at(x, y);
                let [r, g, b] = rgb.map(quantize8);
                Rgba([r, g, b, if a { u8::MAX } else { 0 }])
            })
            .save(path)?;
        }
        _ => {
            ImageBuffer::from_fn(w, h, |x, y| {
                let (rgb, a) = at(x, y);
                let [r, g, b] = rgb.map(quantize16);
                Rgba([r, g, b, if a { u16::MAX } else { 0 }])
            })
            .save(path)?;
        }
    }
    Ok(())
}

/// Save a scalar map in `[0, 1]` as 16-bit grayscale.
pub fn save_mask(mask: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = mask.dim();
    ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        Luma([quantize16(mask[[y as usize, x as usize]])])
    })
    .save(path)?;
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
