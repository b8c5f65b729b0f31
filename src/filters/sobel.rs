use image::{Rgb, RgbImage};

use super::{GradientImage, SeparableKernel, SOBEL_X_3, SOBEL_Y_3};

fn separable_gradient(src: &RgbImage, kernel: &SeparableKernel<3>) -> GradientImage {
    let (width, height) = (src.width() as usize, src.height() as usize);
    let mut dst = GradientImage::new(src.width(), src.height());
    if width < 3 || height < 3 {
        return dst;
    }

    let stride = width * 3;
    let input = src.as_raw();
    let mut temp = vec![0i32; stride * height];

    for y in 0..height {
        for x in 1..width - 1 {
            for c in 0..3 {
                temp[y * stride + x * 3 + c] = kernel
                    .horizontal
                    .iter()
                    .enumerate()
                    .map(|(i, w)| input[y * stride + (x + i - 1) * 3 + c] as i32 * w)
                    .sum::<i32>()
                    / kernel.divisor;
            }
        }
    }

    let out: &mut [i16] = &mut dst;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            for c in 0..3 {
                let sum = kernel
                    .vertical
                    .iter()
                    .enumerate()
                    .map(|(i, w)| temp[(y + i - 1) * stride + x * 3 + c] * w)
                    .sum::<i32>()
                    / kernel.divisor;
                out[y * stride + x * 3 + c] = sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            }
        }
    }

    dst
}

/// Horizontal Sobel gradient. The outermost row and column stay zero.
pub fn sobel_x(src: &RgbImage) -> GradientImage {
    separable_gradient(src, &SOBEL_X_3)
}

/// Vertical Sobel gradient, positive upwards. The outermost row and column stay zero.
pub fn sobel_y(src: &RgbImage) -> GradientImage {
    separable_gradient(src, &SOBEL_Y_3)
}

/// Per-channel `sqrt(gx^2 + gy^2)`, saturated to u8.
pub fn magnitude(gx: &GradientImage, gy: &GradientImage) -> RgbImage {
    RgbImage::from_fn(gx.width(), gx.height(), |x, y| {
        let a = gx.get_pixel(x, y).0;
        let b = gy.get_pixel(x, y).0;
        let mut px = [0u8; 3];
        for c in 0..3 {
            let (dx, dy) = (a[c] as f32, b[c] as f32);
            px[c] = (dx * dx + dy * dy).sqrt().round().min(255.0) as u8;
        }
        Rgb(px)
    })
}

/// Absolute gradient value saturated to u8, for viewing a single gradient.
pub fn abs_saturate(gradient: &GradientImage) -> RgbImage {
    RgbImage::from_fn(gradient.width(), gradient.height(), |x, y| {
        Rgb(gradient.get_pixel(x, y).0.map(|v| v.unsigned_abs().min(255) as u8))
    })
}
