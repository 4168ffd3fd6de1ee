use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::morphology;

use crate::config::PreprocessConfig;

/// Turn a photo into a binary mask where label content is 255 and the rest 0.
/// Deterministic for a given image and configuration.
pub fn prepare(img: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let gray = to_grayscale(img);
    let enhanced = equalize_local_contrast(&gray, config.clahe_clip_limit, config.clahe_tiles);
    let smoothed = bilateral_smooth(
        &enhanced,
        config.bilateral_diameter,
        config.bilateral_sigma_color,
        config.bilateral_sigma_space,
    );
    let binary = adaptive_threshold_inverted(
        &smoothed,
        config.threshold_block_size,
        config.threshold_offset,
    );
    remove_speckle(&binary)
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Contrast-limited adaptive histogram equalisation over a `tiles` x `tiles` grid.
///
/// Each tile gets its own clipped-histogram lookup table; output pixels are
/// bilinearly interpolated between the four nearest tile centres so tile
/// seams do not show up as edges in the mask. Sizes that do not divide evenly
/// are padded by reflection, so the grid never shrinks on small images.
pub fn equalize_local_contrast(img: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || tiles == 0 {
        return img.clone();
    }

    let tile_w = width.div_ceil(tiles);
    let tile_h = height.div_ceil(tiles);
    let (tiles_x, tiles_y) = (tiles, tiles);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut hist = [0u32; 256];
            for y in ty * tile_h..(ty + 1) * tile_h {
                for x in tx * tile_w..(tx + 1) * tile_w {
                    let px = img.get_pixel(reflect_101(x, width), reflect_101(y, height));
                    hist[px[0] as usize] += 1;
                }
            }
            luts.push(clipped_lut(&mut hist, tile_w * tile_h, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let value = img.get_pixel(x, y)[0] as usize;

        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = (fx.max(0.0) as u32).min(tiles_x - 1);
        let ty0 = (fy.max(0.0) as u32).min(tiles_y - 1);
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let ax = (fx - tx0 as f32).clamp(0.0, 1.0);
        let ay = (fy - ty0 as f32).clamp(0.0, 1.0);

        let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty0)[value] as f32 * ax;
        let bottom =
            lut_at(tx0, ty1)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty1)[value] as f32 * ax;
        let out = top * (1.0 - ay) + bottom * ay;

        Luma([out.round().clamp(0.0, 255.0) as u8])
    })
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge
fn reflect_101(i: u32, len: u32) -> u32 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let m = i % period;
    if m < len { m } else { period - m }
}

fn clipped_lut(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    // Clipped mass is spread evenly so the CDF still ends at `area`
    let batch = excess / 256;
    let residual = excess % 256;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += batch;
        if (i as u32) < residual {
            *bin += 1;
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (i, &bin) in hist.iter().enumerate() {
        cdf += bin;
        lut[i] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Edge-preserving smoothing over a circular neighbourhood of `diameter` pixels
pub fn bilateral_smooth(
    img: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let radius = (diameter / 2).max(1) as i32;
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq.sqrt() > radius as f32 {
                continue;
            }
            offsets.push((dx, dy, (dist_sq * space_coeff).exp()));
        }
    }

    let color_weights: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;

    GrayImage::from_fn(width, height, |x, y| {
        let center = img.get_pixel(x, y)[0] as i32;
        let mut sum = 0.0f32;
        let mut norm = 0.0f32;

        for &(dx, dy, space_weight) in &offsets {
            let sx = (x as i32 + dx).clamp(0, max_x) as u32;
            let sy = (y as i32 + dy).clamp(0, max_y) as u32;
            let value = img.get_pixel(sx, sy)[0] as i32;
            let weight = space_weight * color_weights[(value - center).unsigned_abs() as usize];
            sum += weight * value as f32;
            norm += weight;
        }

        Luma([(sum / norm).round().clamp(0.0, 255.0) as u8])
    })
}

/// Normalised Gaussian kernel using the sigma convention for a given size
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= total;
    }
    kernel
}

/// Gaussian-weighted local binarisation, inverted: a pixel becomes 255 when it
/// is darker than its neighbourhood mean minus `offset`, 0 otherwise.
pub fn adaptive_threshold_inverted(img: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    // Blurring in f32 keeps the mean unrounded until the comparison
    let kernel = gaussian_kernel(block_size);
    let levels: Image<Luma<f32>> = ImageBuffer::from_fn(width, height, |x, y| {
        Luma([img.get_pixel(x, y)[0] as f32])
    });
    let means = separable_filter_equal(&levels, &kernel);

    GrayImage::from_fn(width, height, |x, y| {
        let mean = means.get_pixel(x, y)[0].round();
        let value = img.get_pixel(x, y)[0] as f32;

        if value - mean > -offset {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// One 3x3 closing then one 3x3 opening
pub fn remove_speckle(binary: &GrayImage) -> GrayImage {
    let closed = morphology::close(binary, Norm::LInf, 1);
    morphology::open(&closed, Norm::LInf, 1)
}
