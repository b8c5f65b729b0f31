use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};

use super::GAUSSIAN_5;

/// Separable 5x5 blur.
///
/// A horizontal pass writes into a temporary buffer and a vertical pass reads
/// it back, each dividing by 10. Pixels within two rows or columns of the
/// border are copied from the source unchanged.
pub fn blur5x5_separable(src: &RgbImage) -> RgbImage {
    let (width, height) = (src.width() as usize, src.height() as usize);
    let radius = GAUSSIAN_5.radius();
    let mut dst = src.clone();
    if width <= 2 * radius || height <= 2 * radius {
        return dst;
    }

    let stride = width * 3;
    let input = src.as_raw();
    let mut temp = input.clone();

    // horizontal
    for y in 0..height {
        let row = &input[y * stride..(y + 1) * stride];
        for x in radius..width - radius {
            for c in 0..3 {
                let sum: i32 = GAUSSIAN_5
                    .horizontal
                    .iter()
                    .enumerate()
                    .map(|(i, w)| row[(x + i - radius) * 3 + c] as i32 * w)
                    .sum();
                temp[y * stride + x * 3 + c] = (sum / GAUSSIAN_5.divisor) as u8;
            }
        }
    }

    // vertical
    let out: &mut [u8] = &mut dst;
    for y in radius..height - radius {
        for x in radius..width - radius {
            for c in 0..3 {
                let sum: i32 = GAUSSIAN_5
                    .vertical
                    .iter()
                    .enumerate()
                    .map(|(i, w)| temp[(y + i - radius) * stride + x * 3 + c] as i32 * w)
                    .sum();
                out[y * stride + x * 3 + c] = (sum / GAUSSIAN_5.divisor) as u8;
            }
        }
    }

    dst
}

/// Direct 2D 5x5 convolution with the same kernel and border policy as
/// [`blur5x5_separable`]. Only kept to measure the cost of the naive approach.
pub fn blur5x5_naive(src: &RgbImage) -> RgbImage {
    let (width, height) = src.dimensions();
    let radius = GAUSSIAN_5.radius() as u32;
    let kernel = GAUSSIAN_5.outer();
    let norm = GAUSSIAN_5.divisor * GAUSSIAN_5.divisor;

    let mut dst = src.clone();
    if width <= 2 * radius || height <= 2 * radius {
        return dst;
    }

    for y in radius..height - radius {
        for x in radius..width - radius {
            let mut sums = [0i32; 3];
            for (ky, row) in kernel.iter().enumerate() {
                for (kx, w) in row.iter().enumerate() {
                    let px = src.get_pixel(x + kx as u32 - radius, y + ky as u32 - radius);
                    for (sum, v) in sums.iter_mut().zip(px.0) {
                        *sum += v as i32 * w;
                    }
                }
            }
            dst.put_pixel(x, y, Rgb(sums.map(|s| (s / norm) as u8)));
        }
    }

    dst
}

/// Posterise every channel into `levels` buckets of width `255 / levels`.
///
/// `levels` is clamped to 1..=255.
pub fn quantize(src: &RgbImage, levels: u32) -> RgbImage {
    let bucket = (255 / levels.clamp(1, 255)) as u8;
    let mut dst = src.clone();
    for v in dst.iter_mut() {
        *v = (*v / bucket) * bucket;
    }
    dst
}

/// Blur then quantize, the standard posterisation pipeline.
pub fn blur_quantize(src: &RgbImage, levels: u32) -> RgbImage {
    quantize(&blur5x5_separable(src), levels)
}

/// The two interchangeable blur implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurStrategy {
    Naive,
    Separable,
}

impl BlurStrategy {
    pub const ALL: [BlurStrategy; 2] = [BlurStrategy::Naive, BlurStrategy::Separable];

    pub fn apply(self, src: &RgbImage) -> RgbImage {
        match self {
            BlurStrategy::Naive => blur5x5_naive(src),
            BlurStrategy::Separable => blur5x5_separable(src),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlurStrategy::Naive => "naive 5x5",
            BlurStrategy::Separable => "separable 1x5",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlurComparison {
    pub iterations: u32,
    pub naive: Duration,
    pub separable: Duration,
    /// Largest per-channel difference between the two outputs.
    pub max_difference: u8,
}

impl BlurComparison {
    pub fn speedup(&self) -> f64 {
        self.naive.as_secs_f64() / self.separable.as_secs_f64().max(f64::EPSILON)
    }
}

/// Time both strategies over `iterations` runs on the same image.
pub fn compare_blur_strategies(src: &RgbImage, iterations: u32) -> BlurComparison {
    let iterations = iterations.max(1);
    let mut timings = [Duration::ZERO; 2];
    let mut outputs = Vec::with_capacity(2);

    for (timing, strategy) in timings.iter_mut().zip(BlurStrategy::ALL) {
        let start = Instant::now();
        let mut out = strategy.apply(src);
        for _ in 1..iterations {
            out = strategy.apply(src);
        }
        *timing = start.elapsed() / iterations;
        outputs.push(out);
    }

    let max_difference = outputs[0]
        .iter()
        .zip(outputs[1].iter())
        .map(|(a, b)| a.abs_diff(*b))
        .max()
        .unwrap_or(0);

    BlurComparison {
        iterations,
        naive: timings[0],
        separable: timings[1],
        max_difference,
    }
}
