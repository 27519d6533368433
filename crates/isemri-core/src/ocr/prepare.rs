//! Image preparation for OCR.
//!
//! A fixed pipeline turns a raster page (or ROI crop) into a binarized,
//! deskewed image: grayscale, unsharp-mask sharpening, dual-candidate
//! binarization, light morphological opening, and engine-assisted skew
//! correction. Every step produces a new buffer; the source never mutates.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use super::RecognitionEngine;

/// Image preparer with fixed tuning matched to photographed service forms.
pub struct ImagePreparer {
    /// Gaussian sigma for the unsharp-mask blur.
    sharpen_sigma: f32,
    /// Weight of the original image in the unsharp combination.
    sharpen_weight: f32,
    /// Weight of the blurred image (negative) in the unsharp combination.
    blur_weight: f32,
    /// Adaptive threshold block size (odd).
    adaptive_block: u32,
    /// Adaptive threshold bias constant.
    adaptive_bias: i32,
}

impl ImagePreparer {
    pub fn new() -> Self {
        Self {
            sharpen_sigma: 2.0,
            sharpen_weight: 1.7,
            blur_weight: -0.7,
            adaptive_block: 31,
            adaptive_bias: 9,
        }
    }

    /// Run the full preparation pipeline.
    ///
    /// The engine is consulted only for the orientation query; a failed or
    /// empty answer leaves the image unrotated.
    pub fn prepare(&self, image: &DynamicImage, engine: &dyn RecognitionEngine) -> GrayImage {
        let gray = image.to_luma8();
        let sharp = self.unsharp_mask(&gray);

        // Two binarization candidates: a global-optimal cut and a local
        // adaptive one. Mixed lighting favors adaptive, uniform lighting
        // favors global; whichever keeps more text pixels wins.
        let global = binarize(&sharp, otsu_level(&sharp));
        let adaptive = self.adaptive_threshold(&sharp);
        let bw = if foreground_count(&adaptive) > foreground_count(&global) {
            adaptive
        } else {
            global
        };

        let opened = morphological_open(&bw);
        self.deskew(opened, engine)
    }

    /// Unsharp mask: combine the original with a blurred copy using fixed
    /// positive/negative weights to boost edge contrast.
    fn unsharp_mask(&self, gray: &GrayImage) -> GrayImage {
        let blurred = image::imageops::blur(gray, self.sharpen_sigma);
        let (width, height) = gray.dimensions();
        let mut out = GrayImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let orig = gray.get_pixel(x, y)[0] as f32;
                let blur = blurred.get_pixel(x, y)[0] as f32;
                let value = self.sharpen_weight * orig + self.blur_weight * blur;
                out.put_pixel(x, y, Luma([value.clamp(0.0, 255.0) as u8]));
            }
        }
        out
    }

    /// Local adaptive threshold: block mean minus a fixed bias, computed
    /// over an integral image so large pages stay tractable.
    fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut result = GrayImage::new(width, height);
        let integral = integral_image(image);
        let half = self.adaptive_block / 2;

        for y in 0..height {
            for x in 0..width {
                let x0 = x.saturating_sub(half);
                let y0 = y.saturating_sub(half);
                let x1 = (x + half + 1).min(width);
                let y1 = (y + half + 1).min(height);

                let count = ((x1 - x0) * (y1 - y0)) as i64;
                let sum = block_sum(&integral, width, x0, y0, x1, y1);
                let threshold = (sum / count) as i32 - self.adaptive_bias;

                let value = image.get_pixel(x, y)[0] as i32;
                let output = if value > threshold { 255 } else { 0 };
                result.put_pixel(x, y, Luma([output]));
            }
        }
        result
    }

    /// Rotate by the negative of the engine-reported skew angle.
    fn deskew(&self, bw: GrayImage, engine: &dyn RecognitionEngine) -> GrayImage {
        let angle = match engine.detect_orientation(&bw) {
            Some(angle) => angle.rem_euclid(360.0),
            None => return bw,
        };
        if angle == 0.0 {
            return bw;
        }

        debug!("deskewing by {:.1} degrees", -angle);
        rotate(&bw, -angle)
    }
}

impl Default for ImagePreparer {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a global threshold: text pixels go to 0, background to 255.
fn binarize(image: &GrayImage, level: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = if image.get_pixel(x, y)[0] > level { 255 } else { 0 };
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// Otsu's method: the histogram cut maximizing between-class variance.
fn otsu_level(image: &GrayImage) -> u8 {
    let mut histogram = [0u32; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = (image.width() * image.height()) as f64;
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_variance = 0.0f64;
    let mut background_count = 0.0f64;
    let mut background_sum = 0.0f64;

    for level in 0..256usize {
        background_count += histogram[level] as f64;
        if background_count == 0.0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0.0 {
            break;
        }

        background_sum += level as f64 * histogram[level] as f64;
        let background_mean = background_sum / background_count;
        let foreground_mean = (weighted_sum - background_sum) / foreground_count;

        let diff = background_mean - foreground_mean;
        let variance = background_count * foreground_count * diff * diff;
        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Text (foreground) pixel count in a binarized image.
fn foreground_count(image: &GrayImage) -> u32 {
    image.pixels().filter(|p| p[0] == 0).count() as u32
}

/// One-iteration 2x2 morphological opening: removes speckle noise without
/// eroding character strokes.
fn morphological_open(image: &GrayImage) -> GrayImage {
    dilate2x2(&erode2x2(image))
}

fn erode2x2(image: &GrayImage) -> GrayImage {
    kernel2x2(image, u8::min)
}

fn dilate2x2(image: &GrayImage) -> GrayImage {
    kernel2x2(image, u8::max)
}

fn kernel2x2(image: &GrayImage, combine: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut value = image.get_pixel(x, y)[0];
            for (dx, dy) in [(1, 0), (0, 1), (1, 1)] {
                let nx = (x + dx).min(width - 1);
                let ny = (y + dy).min(height - 1);
                value = combine(value, image.get_pixel(nx, ny)[0]);
            }
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// Rotate around the image center with bilinear interpolation and
/// edge-replicating borders.
fn rotate(image: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);

    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    for y in 0..height {
        for x in 0..width {
            // Inverse mapping: destination pixel back to source coordinates.
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let sx = cos * dx + sin * dy + cx;
            let sy = -sin * dx + cos * dy + cy;

            out.put_pixel(x, y, Luma([bilinear_sample(image, sx, sy)]));
        }
    }
    out
}

fn bilinear_sample(image: &GrayImage, x: f32, y: f32) -> u8 {
    let (width, height) = image.dimensions();
    let clamp_x = |v: i64| v.clamp(0, width as i64 - 1) as u32;
    let clamp_y = |v: i64| v.clamp(0, height as i64 - 1) as u32;

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = image.get_pixel(clamp_x(x0), clamp_y(y0))[0] as f32;
    let p10 = image.get_pixel(clamp_x(x0 + 1), clamp_y(y0))[0] as f32;
    let p01 = image.get_pixel(clamp_x(x0), clamp_y(y0 + 1))[0] as f32;
    let p11 = image.get_pixel(clamp_x(x0 + 1), clamp_y(y0 + 1))[0] as f32;

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

/// Summed-area table with a zero row/column of padding.
fn integral_image(image: &GrayImage) -> Vec<i64> {
    let (width, height) = image.dimensions();
    let stride = (width + 1) as usize;
    let mut table = vec![0i64; stride * (height + 1) as usize];

    for y in 0..height as usize {
        let mut row_sum = 0i64;
        for x in 0..width as usize {
            row_sum += image.get_pixel(x as u32, y as u32)[0] as i64;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }
    table
}

fn block_sum(integral: &[i64], width: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> i64 {
    let stride = (width + 1) as usize;
    let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);
    integral[y1 * stride + x1] + integral[y0 * stride + x0]
        - integral[y0 * stride + x1]
        - integral[y1 * stride + x0]
}
