use image::{Rgb, RgbImage};

use super::edge_strength;
use crate::filters::blur_quantize;

/// Edge strength above which a pixel glows in the neon effect.
pub const NEON_EDGE_THRESHOLD: u8 = 30;
/// Edge strength above which a pixel is inked black in the cartoon effect.
pub const CARTOON_EDGE_THRESHOLD: u8 = 40;
pub const DEFAULT_CARTOON_LEVELS: u32 = 10;

const NEON_GAIN: f32 = 0.3;
// R, G, B
const NEON_OFFSET: [f32; 3] = [50.0, 200.0, 180.0];
const NEON_DARKEN: u8 = 8;

/// Bright tinted edges over a darkened frame.
pub fn neon_edges(src: &RgbImage) -> RgbImage {
    let edges = edge_strength(src);
    RgbImage::from_fn(src.width(), src.height(), |x, y| {
        let px = src.get_pixel(x, y).0;
        if edges.get_pixel(x, y)[0] > NEON_EDGE_THRESHOLD {
            let mut out = [0u8; 3];
            for c in 0..3 {
                out[c] = (px[c] as f32 * NEON_GAIN + NEON_OFFSET[c]).round().min(255.0) as u8;
            }
            Rgb(out)
        } else {
            Rgb(px.map(|v| v / NEON_DARKEN))
        }
    })
}

/// Posterised colours with black outlines on strong edges.
pub fn cartoon(src: &RgbImage, levels: u32) -> RgbImage {
    let base = blur_quantize(src, levels);
    let edges = edge_strength(src);
    RgbImage::from_fn(src.width(), src.height(), |x, y| {
        if edges.get_pixel(x, y)[0] > CARTOON_EDGE_THRESHOLD {
            Rgb([0, 0, 0])
        } else {
            *base.get_pixel(x, y)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_image(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| if x < width / 2 { Rgb(left) } else { Rgb(right) })
    }

    #[test]
    fn neon_darkens_flat_regions() {
        let src = RgbImage::from_pixel(8, 8, Rgb([80, 161, 255]));
        let dst = neon_edges(&src);
        assert!(dst.pixels().all(|p| p.0 == [10, 20, 31]));
    }

    #[test]
    fn neon_tints_edges() {
        let src = split_image(10, 6, [0, 0, 0], [100, 100, 100]);
        let dst = neon_edges(&src);
        // columns 4 and 5 straddle the edge
        assert_eq!(dst.get_pixel(4, 3).0, [50, 200, 180]);
        assert_eq!(dst.get_pixel(5, 3).0, [80, 230, 210]);
        assert_eq!(dst.get_pixel(8, 3).0, [12, 12, 12]);
    }

    #[test]
    fn neon_threshold_is_strict() {
        let weak = split_image(10, 6, [0, 0, 0], [8, 8, 7]);
        let dst = neon_edges(&weak);
        // mean of (32, 32, 28) = 30, not above the threshold
        assert_eq!(dst.get_pixel(4, 3).0, [0, 0, 0]);
    }

    #[test]
    fn cartoon_inks_edges_black() {
        let src = split_image(12, 10, [20, 20, 20], [220, 220, 220]);
        let dst = cartoon(&src, DEFAULT_CARTOON_LEVELS);
        assert_eq!(dst.get_pixel(5, 5).0, [0, 0, 0]);
        assert_eq!(dst.get_pixel(6, 5).0, [0, 0, 0]);
        // flat regions keep the quantised colour (bucket 25)
        assert_eq!(dst.get_pixel(1, 5).0, [0, 0, 0]);
        assert_eq!(dst.get_pixel(10, 5).0, [200, 200, 200]);
    }

    #[test]
    fn cartoon_with_single_level_is_near_binary() {
        let src = RgbImage::from_fn(16, 12, |x, y| Rgb([(x * 15) as u8, (y * 20) as u8, 255]));
        let dst = cartoon(&src, 1);
        for px in dst.pixels() {
            assert!(px.0.iter().all(|&v| v == 0 || v == 255));
        }
        assert_eq!(dst.dimensions(), src.dimensions());
    }
}
