//! Composite effects built from the pixel transforms in [`crate::filters`].
//!
//! Effects never fetch auxiliary signals themselves: face rectangles and depth
//! maps are handed in by the caller.

pub mod fog;
pub mod overlay;
pub mod spotlight;
pub mod stylize;

use image::{GrayImage, Luma, RgbImage};

use crate::filters::{magnitude, sobel_x, sobel_y};

pub use fog::digital_fog;
pub use overlay::{depth_view, draw_face_boxes, load_font, warning_overlay};
pub use spotlight::spotlight;
pub use stylize::{cartoon, neon_edges, DEFAULT_CARTOON_LEVELS};

/// Mean of the three Sobel magnitude channels at every pixel.
pub fn edge_strength(src: &RgbImage) -> GrayImage {
    let mag = magnitude(&sobel_x(src), &sobel_y(src));
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let sum: u32 = mag.get_pixel(x, y).0.iter().map(|&v| v as u32).sum();
        Luma([(sum / 3) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn edge_strength_is_zero_on_flat_input() {
        let src = RgbImage::from_pixel(10, 10, Rgb([12, 200, 99]));
        assert!(edge_strength(&src).iter().all(|&v| v == 0));
    }

    #[test]
    fn edge_strength_averages_channels() {
        // edge only in the red channel: 4 * 30 = 120 in red, 0 elsewhere -> 40
        let src = RgbImage::from_fn(6, 6, |x, _| {
            if x < 3 {
                Rgb([0, 0, 0])
            } else {
                Rgb([30, 0, 0])
            }
        });
        assert_eq!(edge_strength(&src).get_pixel(2, 2)[0], 40);
    }
}
