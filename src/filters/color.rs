use image::{GrayImage, Luma, Rgb, RgbImage};

/// Desaturation grayscale: each pixel becomes `(max + min) / 2` of its
/// channels, replicated over all three channels.
pub fn desaturate(src: &RgbImage) -> RgbImage {
    let mut dst = RgbImage::new(src.width(), src.height());
    for (out, px) in dst.pixels_mut().zip(src.pixels()) {
        let [r, g, b] = px.0;
        let max = r.max(g).max(b) as u16;
        let min = r.min(g).min(b) as u16;
        let grey = ((max + min) / 2) as u8;
        *out = Rgb([grey, grey, grey]);
    }
    dst
}

/// Rec. 601 luma, `(299 R + 587 G + 114 B) / 1000` rounded to nearest.
pub fn luma(src: &RgbImage) -> GrayImage {
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b] = src.get_pixel(x, y).0;
        let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// [`luma`] expanded back to three channels.
pub fn luma_grayscale(src: &RgbImage) -> RgbImage {
    let grey = luma(src);
    RgbImage::from_fn(src.width(), src.height(), |x, y| {
        let v = grey.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

const VIGNETTE_STRENGTH: f64 = 0.3;

/// Sepia tone with a radial vignette.
///
/// The colour matrix is applied first, then the result is scaled by
/// `max(0, 1 - 0.3 * d^2)` where `d` is the distance from the image centre with
/// each axis normalised to [-1, 1].
pub fn sepia(src: &RgbImage) -> RgbImage {
    let half_w = src.width() as f64 / 2.0;
    let half_h = src.height() as f64 / 2.0;

    let mut dst = RgbImage::new(src.width(), src.height());
    for (x, y, out) in dst.enumerate_pixels_mut() {
        let [r, g, b] = src.get_pixel(x, y).0.map(f32::from);

        let dx = (x as f64 - half_w) / half_w;
        let dy = (y as f64 - half_h) / half_h;
        let vignette = (1.0 - (dx * dx + dy * dy) * VIGNETTE_STRENGTH).max(0.0);

        let mut px = [0u8; 3];
        for (channel, row) in px.iter_mut().zip(SEPIA_MATRIX.iter()) {
            let mixed = row[0] * r + row[1] * g + row[2] * b;
            *channel = (mixed as f64 * vignette).round().clamp(0.0, 255.0) as u8;
        }
        *out = Rgb(px);
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x + y) * 11 % 256) as u8])
        })
    }

    #[test]
    fn desaturate_ties_channels_to_max_min_midpoint() {
        let src = gradient_image(17, 9);
        let dst = desaturate(&src);
        assert_eq!(dst.dimensions(), src.dimensions());
        for (px, out) in src.pixels().zip(dst.pixels()) {
            let max = *px.0.iter().max().unwrap() as u16;
            let min = *px.0.iter().min().unwrap() as u16;
            let expected = ((max + min) / 2) as u8;
            assert_eq!(out.0, [expected; 3]);
        }
    }

    #[test]
    fn desaturate_differs_from_luma() {
        let src = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        assert_eq!(desaturate(&src).get_pixel(0, 0).0, [127; 3]);
        assert_eq!(luma_grayscale(&src).get_pixel(0, 0).0, [76; 3]);
    }

    #[test]
    fn luma_uses_rec601_weights() {
        let src = RgbImage::from_fn(4, 1, |x, _| match x {
            0 => Rgb([0, 255, 0]),
            1 => Rgb([0, 0, 255]),
            2 => Rgb([255, 255, 255]),
            _ => Rgb([10, 20, 30]),
        });
        let grey = luma(&src);
        assert_eq!(grey.get_pixel(0, 0)[0], 150);
        assert_eq!(grey.get_pixel(1, 0)[0], 29);
        assert_eq!(grey.get_pixel(2, 0)[0], 255);
        // 2990 + 11740 + 3420 = 18150 -> 18.15
        assert_eq!(grey.get_pixel(3, 0)[0], 18);
    }

    #[test]
    fn sepia_mixing_constants_on_single_channel_frame() {
        // only the blue channel lit: each output channel picks up the blue column
        let src = RgbImage::from_pixel(4, 4, Rgb([0, 0, 255]));
        let dst = sepia(&src);
        // (2, 2) is the exact centre of a 4x4 image, so the vignette factor is 1
        assert_eq!(dst.get_pixel(2, 2).0, [48, 43, 33]);

        let red = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        assert_eq!(sepia(&red).get_pixel(2, 2).0, [100, 89, 69]);
    }

    #[test]
    fn sepia_vignette_darkens_towards_corners() {
        let src = RgbImage::from_pixel(64, 48, Rgb([200, 180, 160]));
        let dst = sepia(&src);
        let centre = dst.get_pixel(32, 24)[0];
        let corner = dst.get_pixel(0, 0)[0];
        assert!(corner < centre);
        // corner distance is sqrt(2): factor 1 - 0.3 * 2 = 0.4
        let expected_ratio = 0.4;
        let ratio = corner as f64 / centre as f64;
        assert!((ratio - expected_ratio).abs() < 0.02);
    }

    #[test]
    fn sepia_saturates_bright_input() {
        let src = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        let dst = sepia(&src);
        assert_eq!(dst.get_pixel(4, 4).0, [255, 255, 239]);
    }
}
