// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR preprocessing — grayscale conversion, adaptive binarization, non-local
// means denoising, deskew, sharpening and polarity inversion.
//
// Every stage is a pure function of its input. Stage order is fixed: later
// stages assume the output distribution of earlier ones.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::filter::{filter3x3, separable_filter_equal};
use imageproc::geometry::min_area_rect;
use imageproc::map::map_colors;
use imageproc::point::Point;
use textwerk_core::PreprocessLevel;
use tracing::{debug, info, instrument};

/// Neighbourhood size for the adaptive threshold (odd).
pub const THRESHOLD_BLOCK_SIZE: u32 = 11;
/// Constant subtracted from the local Gaussian mean.
pub const THRESHOLD_C: i32 = 2;
/// Filter strength `h` of the non-local means denoiser.
pub const DENOISE_STRENGTH: f32 = 30.0;
/// Side of the patch compared by the denoiser (odd).
pub const DENOISE_TEMPLATE_WINDOW: u32 = 7;
/// Side of the area searched for similar patches (odd).
pub const DENOISE_SEARCH_WINDOW: u32 = 21;

/// 3x3 unsharp kernel, row-major: center 5, four-neighbours -1, corners 0.
const SHARPEN_KERNEL: [i32; 9] = [0, -1, 0, -1, 5, -1, 0, -1, 0];

/// Rec.601 luma weights scaled by `1 << LUMA_SHIFT`; they sum to exactly
/// `1 << LUMA_SHIFT`.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Bicubic coefficient used by the rotation stage.
const CUBIC_A: f32 = -0.75;

/// Turns raw raster units into recognition-ready grayscale images.
///
/// ```ignore
/// let prepared = Preprocessor::new(PreprocessLevel::Full).prepare(&page);
/// let text = recognizer.recognize(&prepared)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor {
    level: PreprocessLevel,
}

/// Intermediate images of one full-pipeline run, in stage order.
#[derive(Debug, Clone)]
pub struct FullStages {
    pub gray: GrayImage,
    pub binary: GrayImage,
    pub denoised: GrayImage,
    /// Raw rectangle angle of the foreground, `None` when there is none.
    pub raw_angle: Option<f32>,
    /// Normalized correction in degrees (counter-clockwise positive).
    pub correction: f32,
    /// Grayscale source rotated upright.
    pub deskewed_gray: GrayImage,
    pub sharpened: GrayImage,
    pub output: GrayImage,
}

impl Preprocessor {
    pub fn new(level: PreprocessLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> PreprocessLevel {
        self.level
    }

    /// Produce the recognition-ready image for `image`.
    #[instrument(skip_all, fields(level = ?self.level, width = image.width(), height = image.height()))]
    pub fn prepare(&self, image: &DynamicImage) -> GrayImage {
        match self.level {
            PreprocessLevel::Reduced => to_grayscale(image),
            PreprocessLevel::Full => run_full(image).output,
        }
    }
}

/// Run all six stages and keep every intermediate image.
pub fn run_full(image: &DynamicImage) -> FullStages {
    info!(
        width = image.width(),
        height = image.height(),
        "Running full preprocessing pipeline"
    );

    let gray = to_grayscale(image);
    let binary = adaptive_threshold(&gray, THRESHOLD_BLOCK_SIZE, THRESHOLD_C);
    let denoised = denoise_nl_means(
        &binary,
        DENOISE_STRENGTH,
        DENOISE_TEMPLATE_WINDOW,
        DENOISE_SEARCH_WINDOW,
    );

    let raw_angle = skew_angle(&binary);
    let correction = raw_angle.map(normalize_skew_angle).unwrap_or(0.0);
    debug!(?raw_angle, correction, "Skew measured");

    let deskewed_gray = rotate_replicate(&gray, correction);
    // The correction is carried onto the denoised image too so the final
    // output is upright.
    let deskewed_denoised = rotate_replicate(&denoised, correction);

    let sharpened = sharpen(&deskewed_denoised);
    let output = invert(&sharpened);

    FullStages {
        gray,
        binary,
        denoised,
        raw_angle,
        correction,
        deskewed_gray,
        sharpened,
        output,
    }
}

// -- Stage 1: grayscale -------------------------------------------------------

/// Drop chrominance, keep luminance.
///
/// Uses the Rec.601 weights (0.299, 0.587, 0.114) in 14-bit fixed point,
/// rounding half up. Single-channel 8-bit input is returned unchanged.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgb = image.to_rgb8();
    map_colors(&rgb, |pixel| {
        let [r, g, b] = pixel.0.map(u32::from);
        let luma = (r * LUMA_R + g * LUMA_G + b * LUMA_B + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT;
        Luma([luma.min(255) as u8])
    })
}

// -- Stage 2: adaptive binarization -------------------------------------------

/// Gaussian-weighted adaptive threshold.
///
/// A pixel becomes white (255) when it is brighter than its local weighted
/// mean minus `c`, black (0) otherwise. Borders replicate edge pixels.
pub fn adaptive_threshold(gray: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let mean = gaussian_mean(gray, block_size);
    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let value = gray.get_pixel(x, y).0[0] as i32;
        let local = mean.get_pixel(x, y).0[0] as i32;
        *pixel = if value - local > -c { Luma([255]) } else { Luma([0]) };
    }

    output
}

/// Sampled Gaussian weights for an odd window, normalized to sum 1.
///
/// Sigma follows the usual rule for a window-derived kernel:
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as i32;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|k| (-((k * k) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Separable Gaussian blur with replicated borders, rounded back to u8.
///
/// Filtering runs on `f32` samples so the mean is rounded once, not
/// truncated after each pass.
fn gaussian_mean(gray: &GrayImage, block_size: u32) -> GrayImage {
    let kernel = gaussian_kernel(block_size);
    let samples: ImageBuffer<Luma<f32>, Vec<f32>> = map_colors(gray, |p| Luma([p.0[0] as f32]));
    let blurred = separable_filter_equal(&samples, &kernel);
    map_colors(&blurred, |p| Luma([p.0[0].round().clamp(0.0, 255.0) as u8]))
}

// -- Stage 3: non-local means denoising ---------------------------------------

/// Non-local means filter.
///
/// Each output pixel is the weighted average of every pixel in its
/// `search_window` neighbourhood, weighted by `exp(-d / h²)` where `d` is the
/// mean squared difference between the two `template_window` patches.
/// Patch distances are computed per search offset with a summed-area table,
/// so the cost is independent of the template size.
pub fn denoise_nl_means(
    image: &GrayImage,
    strength: f32,
    template_window: u32,
    search_window: u32,
) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tr = (template_window / 2) as i64;
    let sr = (search_window / 2) as i64;
    let (w, h) = (width as i64, height as i64);
    let h2 = (strength * strength).max(f32::EPSILON);
    let template_area = ((2 * tr + 1) * (2 * tr + 1)) as f32;

    // Replicate-padded copy covering every template around every offset.
    let margin = tr + sr;
    let source = padded(image, margin as u32);
    let source_stride = (w + 2 * margin) as usize;
    let at = |x: i64, y: i64| -> i64 {
        source[(y + margin) as usize * source_stride + (x + margin) as usize] as i64
    };

    // Integral domain: the image grown by the template radius.
    let pw = w + 2 * tr;
    let ph = h + 2 * tr;
    let stride = (pw + 1) as usize;
    let mut integral = vec![0u64; stride * (ph + 1) as usize];

    let pixel_count = (width * height) as usize;
    let mut weight_sum = vec![0f32; pixel_count];
    let mut value_sum = vec![0f32; pixel_count];

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            // Summed-area table of squared differences for this offset.
            for py in 0..ph {
                let y = py - tr;
                let mut row_sum = 0u64;
                for px in 0..pw {
                    let x = px - tr;
                    let diff = at(x, y) - at(x + dx, y + dy);
                    row_sum += (diff * diff) as u64;
                    let idx = (py + 1) as usize * stride + (px + 1) as usize;
                    let above = py as usize * stride + (px + 1) as usize;
                    integral[idx] = row_sum + integral[above];
                }
            }

            for y in 0..h {
                for x in 0..w {
                    // Template centred on (x, y) spans padded [x, x + 2tr].
                    let x1 = x as usize;
                    let y1 = y as usize;
                    let x2 = (x + 2 * tr + 1) as usize;
                    let y2 = (y + 2 * tr + 1) as usize;
                    let sum = integral[y2 * stride + x2] + integral[y1 * stride + x1]
                        - integral[y1 * stride + x2]
                        - integral[y2 * stride + x1];

                    let distance = sum as f32 / template_area;
                    let weight = (-distance / h2).exp();
                    let idx = (y * w + x) as usize;
                    weight_sum[idx] += weight;
                    value_sum[idx] += weight * at(x + dx, y + dy) as f32;
                }
            }
        }
    }

    let mut output = GrayImage::new(width, height);
    for (idx, pixel) in output.pixels_mut().enumerate() {
        let value = if weight_sum[idx] > 0.0 {
            value_sum[idx] / weight_sum[idx]
        } else {
            0.0
        };
        *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }

    debug!(width, height, "Non-local means denoising complete");
    output
}

/// Row-major copy of `image` grown by `margin` on every side, edge pixels
/// replicated outward.
fn padded(image: &GrayImage, margin: u32) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let padded_width = width + 2 * margin;
    let padded_height = height + 2 * margin;
    let mut out = Vec::with_capacity((padded_width * padded_height) as usize);
    for py in 0..padded_height {
        let y = py.saturating_sub(margin).min(height - 1);
        for px in 0..padded_width {
            let x = px.saturating_sub(margin).min(width - 1);
            out.push(image.get_pixel(x, y).0[0]);
        }
    }
    out
}

// -- Stage 4: deskew ----------------------------------------------------------

/// Angle of the minimum-area rectangle enclosing every non-zero pixel.
///
/// Measured counter-clockwise with the y axis pointing up and reduced into
/// `(-90, 0]`. Returns `None` when fewer than three pixels are set.
pub fn skew_angle(binary: &GrayImage) -> Option<f32> {
    // Row extremes are enough: the enclosing rectangle only depends on the
    // convex hull, and every hull vertex is a leftmost or rightmost point of
    // its row.
    let mut points: Vec<Point<i32>> = Vec::new();
    for (y, row) in binary.enumerate_rows() {
        let mut first = None;
        let mut last = None;
        for (x, _, pixel) in row {
            if pixel.0[0] != 0 {
                first.get_or_insert(x);
                last = Some(x);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push(Point::new(first as i32, y as i32));
            if last != first {
                points.push(Point::new(last as i32, y as i32));
            }
        }
    }

    if points.len() < 3 {
        return None;
    }

    let corners = min_area_rect(&points);
    let origin = corners[0];

    // Pick the shortest non-degenerate side from the first corner; the
    // diagonal is always longer than either side.
    let side = corners[1..]
        .iter()
        .map(|corner| ((corner.x - origin.x) as f32, (corner.y - origin.y) as f32))
        .filter(|(dx, dy)| *dx != 0.0 || *dy != 0.0)
        .min_by(|a, b| {
            let la = a.0 * a.0 + a.1 * a.1;
            let lb = b.0 * b.0 + b.1 * b.1;
            la.partial_cmp(&lb).unwrap_or(std::cmp::Ordering::Equal)
        })?;

    // Image rows grow downwards, so the screen angle is the negated atan2.
    let screen_angle = side.1.atan2(side.0).to_degrees();
    Some(-screen_angle.rem_euclid(90.0))
}

/// Map a raw rectangle angle to the rotation that makes the page upright.
///
/// If the angle is below -45 degrees the correction is `-(90 + angle)`,
/// otherwise `-angle`. For raw angles in `[-90, 0]` the result lies in
/// `(-45, 45]`.
pub fn normalize_skew_angle(raw: f32) -> f32 {
    let corrected = if raw < -45.0 { -(90.0 + raw) } else { -raw };
    // Avoid a signed zero leaking into logs and comparisons.
    if corrected == 0.0 { 0.0 } else { corrected }
}

/// Rotate about the image centre by `degrees` (counter-clockwise positive)
/// with bicubic interpolation and replicated borders. Dimensions are kept.
pub fn rotate_replicate(image: &GrayImage, degrees: f32) -> GrayImage {
    if degrees == 0.0 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let (w, h) = (width as i64, height as i64);
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;
    let (sin, cos) = degrees.to_radians().sin_cos();

    let sample = |x: i64, y: i64| -> f32 {
        image.get_pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32).0[0] as f32
    };

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        // Inverse mapping: destination back into the source frame.
        let u = x as f32 - cx;
        let v = y as f32 - cy;
        let sx = cos * u - sin * v + cx;
        let sy = sin * u + cos * v + cy;

        let x0 = sx.floor();
        let y0 = sy.floor();
        let wx = cubic_weights(sx - x0);
        let wy = cubic_weights(sy - y0);

        let mut acc = 0.0;
        for (j, wyj) in wy.iter().enumerate() {
            let yy = y0 as i64 - 1 + j as i64;
            for (i, wxi) in wx.iter().enumerate() {
                let xx = x0 as i64 - 1 + i as i64;
                acc += wxi * wyj * sample(xx, yy);
            }
        }
        *pixel = Luma([acc.round().clamp(0.0, 255.0) as u8]);
    }

    debug!(degrees, "Rotation applied");
    output
}

/// Weights of the four taps around a fractional offset `t` in `[0, 1)`.
fn cubic_weights(t: f32) -> [f32; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let w2 = ((a + 2.0) * (1.0 - t) - (a + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

// -- Stage 5: sharpen ---------------------------------------------------------

/// Convolve with the fixed 3x3 unsharp kernel. Edge pixels are replicated
/// and results saturate to `[0, 255]`.
pub fn sharpen(image: &GrayImage) -> GrayImage {
    filter3x3::<_, i32, u8>(image, &SHARPEN_KERNEL)
}

// -- Stage 6: invert ----------------------------------------------------------

/// Bitwise complement of every pixel.
pub fn invert(image: &GrayImage) -> GrayImage {
    let mut output = image.clone();
    image::imageops::invert(&mut output);
    output
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn color_fixture() -> DynamicImage {
        let img = RgbImage::from_fn(24, 16, |x, y| {
            Rgb([(x * 10) as u8, (y * 15) as u8, ((x + y) * 5) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Filled rectangle (foreground 255 on 0) whose long side points along
    /// `screen_degrees` in image coordinates.
    fn tilted_rect(size: u32, half_long: f32, half_short: f32, screen_degrees: f32) -> GrayImage {
        let (sin, cos) = screen_degrees.to_radians().sin_cos();
        let c = size as f32 / 2.0;
        GrayImage::from_fn(size, size, |x, y| {
            let dx = x as f32 - c;
            let dy = y as f32 - c;
            let u = dx * cos + dy * sin;
            let v = -dx * sin + dy * cos;
            if u.abs() <= half_long && v.abs() <= half_short {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn reduced_path_is_idempotent() {
        let pre = Preprocessor::new(PreprocessLevel::Reduced);
        let input = color_fixture();
        let first = pre.prepare(&input);
        let second = pre.prepare(&input);
        assert_eq!(first.as_raw(), second.as_raw());
        assert_eq!(first.dimensions(), (24, 16));
    }

    #[test]
    fn reduced_path_keeps_gray_input_unchanged() {
        let gray = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 30 + y) as u8]));
        let out = Preprocessor::default().prepare(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(out, gray);
    }

    #[test]
    fn grayscale_uses_rec601_weights() {
        let img = RgbImage::from_fn(5, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            2 => Rgb([0, 0, 255]),
            3 => Rgb([255, 255, 255]),
            _ => Rgb([200, 100, 50]),
        });
        let gray = to_grayscale(&DynamicImage::ImageRgb8(img));
        let values: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
        // 0.299*200 + 0.587*100 + 0.114*50 = 124.2
        assert_eq!(values, vec![76, 150, 29, 255, 124]);
    }

    #[test]
    fn default_level_is_reduced() {
        assert_eq!(Preprocessor::default().level(), PreprocessLevel::Reduced);
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(11);
        assert_eq!(kernel.len(), 11);
        let total: f32 = kernel.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        for i in 0..5 {
            assert!((kernel[i] - kernel[10 - i]).abs() < 1e-6);
        }
        assert!(kernel[5] > kernel[4]);
    }

    #[test]
    fn gaussian_mean_rounds_instead_of_truncating() {
        for level in [1u8, 37, 128, 137, 254] {
            let flat = GrayImage::from_pixel(15, 13, Luma([level]));
            assert_eq!(gaussian_mean(&flat, THRESHOLD_BLOCK_SIZE), flat, "level {level}");
        }
    }

    #[test]
    fn gaussian_mean_replicates_borders() {
        // Columns left of 8 are 0, the rest 200; the edge column must see
        // only its own value replicated outward.
        let step = GrayImage::from_fn(16, 4, |x, _| if x < 8 { Luma([0]) } else { Luma([200]) });
        let mean = gaussian_mean(&step, THRESHOLD_BLOCK_SIZE);
        assert_eq!(mean.get_pixel(0, 0).0[0], 0);
        assert_eq!(mean.get_pixel(15, 3).0[0], 200);
        assert!(mean.get_pixel(7, 1).0[0] < mean.get_pixel(8, 1).0[0]);
    }

    #[test]
    fn threshold_output_is_binary() {
        let gray = to_grayscale(&color_fixture());
        let binary = adaptive_threshold(&gray, THRESHOLD_BLOCK_SIZE, THRESHOLD_C);
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn threshold_adapts_to_uneven_illumination() {
        // Background brightens left to right; a dark mark sits on the bright
        // side and is still brighter than the background on the dark side.
        let gray = GrayImage::from_fn(96, 32, |x, y| {
            let background = 40 + 2 * x;
            if (70..78).contains(&x) && (12..20).contains(&y) {
                Luma([(background - 70) as u8])
            } else {
                Luma([background as u8])
            }
        });
        assert!(gray.get_pixel(74, 16).0[0] > gray.get_pixel(10, 16).0[0]);

        let binary = adaptive_threshold(&gray, THRESHOLD_BLOCK_SIZE, THRESHOLD_C);
        assert_eq!(binary.get_pixel(74, 16).0[0], 0, "mark on bright side");
        assert_eq!(binary.get_pixel(10, 16).0[0], 255, "dark background");
        assert_eq!(binary.get_pixel(40, 4).0[0], 255, "mid background");
    }

    #[test]
    fn denoise_keeps_uniform_image() {
        let flat = GrayImage::from_pixel(12, 10, Luma([128]));
        let out = denoise_nl_means(&flat, DENOISE_STRENGTH, 7, 21);
        assert_eq!(out, flat);
    }

    #[test]
    fn denoise_removes_isolated_speck() {
        let mut img = GrayImage::from_pixel(31, 31, Luma([255]));
        img.put_pixel(15, 15, Luma([0]));
        let out = denoise_nl_means(&img, DENOISE_STRENGTH, 7, 21);
        assert!(out.get_pixel(15, 15).0[0] > 200, "got {}", out.get_pixel(15, 15).0[0]);
        assert!(out.get_pixel(2, 2).0[0] > 250);
    }

    #[test]
    fn padding_replicates_edge_pixels() {
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(10 * y + x) as u8]));
        let out = padded(&img, 2);
        let row = |r: usize| &out[r * 7..(r + 1) * 7];
        assert_eq!(row(0), &[0, 0, 0, 1, 2, 2, 2]);
        assert_eq!(row(2), &[0, 0, 0, 1, 2, 2, 2]);
        assert_eq!(row(3), &[10, 10, 10, 11, 12, 12, 12]);
        assert_eq!(row(5), &[10, 10, 10, 11, 12, 12, 12]);
    }

    #[test]
    fn denoise_handles_images_smaller_than_the_search_window() {
        let img = GrayImage::from_fn(3, 2, |x, _| Luma([if x == 1 { 0 } else { 255 }]));
        let out = denoise_nl_means(&img, DENOISE_STRENGTH, 7, 21);
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn normalized_angle_follows_rule() {
        assert_eq!(normalize_skew_angle(-80.0), -10.0);
        assert_eq!(normalize_skew_angle(-10.0), 10.0);
        assert_eq!(normalize_skew_angle(-45.0), 45.0);
        assert_eq!(normalize_skew_angle(-90.0), 0.0);
        assert_eq!(normalize_skew_angle(0.0), 0.0);
    }

    #[test]
    fn normalized_angle_stays_in_half_open_range() {
        let mut raw = -90.0f32;
        while raw <= 0.0 {
            let corrected = normalize_skew_angle(raw);
            assert!(
                corrected > -45.0 && corrected <= 45.0,
                "raw {raw} -> {corrected}"
            );
            raw += 0.25;
        }
    }

    #[test]
    fn skew_angle_of_empty_image_is_none() {
        assert_eq!(skew_angle(&GrayImage::new(20, 20)), None);
    }

    #[test]
    fn skew_angle_of_axis_aligned_block_needs_no_correction() {
        let img = tilted_rect(100, 40.0, 15.0, 0.0);
        let raw = skew_angle(&img).expect("foreground present");
        assert!(normalize_skew_angle(raw).abs() < 0.5, "raw {raw}");
    }

    #[test]
    fn skew_angle_measures_clockwise_tilt() {
        // Tilted 10 degrees clockwise on screen; correction is +10 (CCW).
        let img = tilted_rect(200, 70.0, 20.0, 10.0);
        let raw = skew_angle(&img).expect("foreground present");
        let correction = normalize_skew_angle(raw);
        assert!((correction - 10.0).abs() < 1.5, "raw {raw} correction {correction}");
    }

    #[test]
    fn skew_angle_measures_counter_clockwise_tilt() {
        let img = tilted_rect(200, 70.0, 20.0, -12.0);
        let raw = skew_angle(&img).expect("foreground present");
        let correction = normalize_skew_angle(raw);
        assert!((correction + 12.0).abs() < 1.5, "raw {raw} correction {correction}");
    }

    #[test]
    fn rotation_by_correction_makes_block_upright() {
        let img = tilted_rect(200, 70.0, 20.0, 8.0);
        let correction = normalize_skew_angle(skew_angle(&img).unwrap());
        let upright = rotate_replicate(&img, correction);
        let binary = GrayImage::from_fn(200, 200, |x, y| {
            if upright.get_pixel(x, y).0[0] > 127 { Luma([255]) } else { Luma([0]) }
        });
        let residual = normalize_skew_angle(skew_angle(&binary).unwrap());
        assert!(residual.abs() < 2.0, "residual {residual}");
        assert_eq!(upright.dimensions(), (200, 200));
    }

    #[test]
    fn zero_rotation_is_identity() {
        let img = GrayImage::from_fn(9, 7, |x, y| Luma([(x * 20 + y * 3) as u8]));
        assert_eq!(rotate_replicate(&img, 0.0), img);
    }

    #[test]
    fn rotation_replicates_edges() {
        // A uniform image has no blank corners after rotation.
        let img = GrayImage::from_pixel(40, 30, Luma([90]));
        let out = rotate_replicate(&img, 30.0);
        assert!(out.pixels().all(|p| p.0[0] == 90));
    }

    #[test]
    fn sharpen_leaves_flat_regions_and_boosts_edges() {
        let flat = GrayImage::from_pixel(5, 5, Luma([100]));
        assert_eq!(sharpen(&flat), flat);

        let step = GrayImage::from_fn(6, 3, |x, _| if x < 3 { Luma([100]) } else { Luma([150]) });
        let out = sharpen(&step);
        assert_eq!(out.get_pixel(2, 1).0[0], 50);
        assert_eq!(out.get_pixel(3, 1).0[0], 200);
    }

    #[test]
    fn invert_complements_every_pixel() {
        let img = GrayImage::from_fn(4, 4, |x, y| Luma([(x * 60 + y) as u8]));
        let out = invert(&img);
        for (a, b) in img.pixels().zip(out.pixels()) {
            assert_eq!(a.0[0], 255 - b.0[0]);
        }
    }

    #[test]
    fn full_pipeline_keeps_dimensions_and_binary_stage() {
        let mut page = GrayImage::from_pixel(48, 40, Luma([230]));
        for y in 15..22 {
            for x in 8..40 {
                page.put_pixel(x, y, Luma([20]));
            }
        }
        let stages = run_full(&DynamicImage::ImageLuma8(page));
        assert_eq!(stages.output.dimensions(), (48, 40));
        assert_eq!(stages.deskewed_gray.dimensions(), (48, 40));
        assert!(stages.binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert!(stages.correction > -45.0 && stages.correction <= 45.0);
        for (a, b) in stages.sharpened.pixels().zip(stages.output.pixels()) {
            assert_eq!(a.0[0], 255 - b.0[0]);
        }
    }
}
