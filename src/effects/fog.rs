use image::{imageops, GrayImage, Rgb, RgbImage};

const FOG_DENSITY: f32 = 3.0;

/// Fog amount for a normalised depth value: `1 - exp(-depth / 255 * 3)`.
pub fn fog_factor(depth: u8) -> f32 {
    1.0 - (-(depth as f32) / 255.0 * FOG_DENSITY).exp()
}

/// Blend the frame towards white with exponential density driven by depth.
///
/// `depth` is expected at the frame's resolution; a map of another size is
/// resampled first.
pub fn digital_fog(src: &RgbImage, depth: &GrayImage) -> RgbImage {
    let resized;
    let depth = if depth.dimensions() == src.dimensions() {
        depth
    } else {
        resized = imageops::resize(
            depth,
            src.width(),
            src.height(),
            imageops::FilterType::Triangle,
        );
        &resized
    };

    // one blend factor per possible depth value
    let factors: Vec<f32> = (0..=255u8).map(fog_factor).collect();

    RgbImage::from_fn(src.width(), src.height(), |x, y| {
        let fog = factors[depth.get_pixel(x, y)[0] as usize];
        Rgb(src
            .get_pixel(x, y)
            .0
            .map(|v| (v as f32 * (1.0 - fog) + 255.0 * fog).round().clamp(0.0, 255.0) as u8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn scene() -> RgbImage {
        RgbImage::from_fn(9, 5, |x, y| Rgb([(x * 28) as u8, (y * 60) as u8, 13]))
    }

    #[test]
    fn near_depth_leaves_source_untouched() {
        let src = scene();
        let depth = GrayImage::from_pixel(9, 5, Luma([0]));
        assert_eq!(digital_fog(&src, &depth), src);
    }

    #[test]
    fn far_depth_approaches_white() {
        let src = scene();
        let depth = GrayImage::from_pixel(9, 5, Luma([255]));
        let dst = digital_fog(&src, &depth);
        let floor = (255.0 * fog_factor(255)).floor() as u8;
        assert!(dst.iter().all(|&v| v >= floor));
        assert!(floor >= 242);
        let white = RgbImage::from_pixel(3, 3, Rgb([255, 255, 255]));
        let far = GrayImage::from_pixel(3, 3, Luma([255]));
        assert_eq!(digital_fog(&white, &far), white);
    }

    #[test]
    fn fog_grows_with_depth() {
        let factors: Vec<f32> = (0..=255u8).map(fog_factor).collect();
        assert_eq!(factors[0], 0.0);
        assert!(factors.windows(2).all(|w| w[0] < w[1]));
        assert!((factors[255] - (1.0 - (-3.0f32).exp())).abs() < 1e-6);
    }

    #[test]
    fn mismatched_depth_is_resampled() {
        let src = scene();
        let depth = GrayImage::from_pixel(3, 2, Luma([0]));
        let dst = digital_fog(&src, &depth);
        assert_eq!(dst, src);
    }
}
