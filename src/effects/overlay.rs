use std::path::Path;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use tracing::warn;

use super::spotlight::clip_to_frame;

pub const FACE_BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const WARNING_BANNER_COLOR: Rgb<u8> = Rgb([200, 0, 0]);
pub const WARNING_TEXT: &str = "Depth model not loaded";

const WARNING_BANNER_HEIGHT: u32 = 40;
const WARNING_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Copy of the frame with a 2px green outline around every face.
pub fn draw_face_boxes(src: &RgbImage, faces: &[Rect]) -> RgbImage {
    let mut dst = src.clone();
    let (width, height) = src.dimensions();
    for face in faces.iter().filter_map(|f| clip_to_frame(f, width, height)) {
        draw_hollow_rect_mut(&mut dst, face, FACE_BOX_COLOR);
        if face.width() > 2 && face.height() > 2 {
            let inner = Rect::at(face.left() + 1, face.top() + 1)
                .of_size(face.width() - 2, face.height() - 2);
            draw_hollow_rect_mut(&mut dst, inner, FACE_BOX_COLOR);
        }
    }
    dst
}

/// Depth map shown as a three channel image.
pub fn depth_view(depth: &GrayImage) -> RgbImage {
    RgbImage::from_fn(depth.width(), depth.height(), |x, y| {
        let v = depth.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// Pass-through frame marked as degraded: a red banner along the top edge,
/// with [`WARNING_TEXT`] written on it when a font is available.
pub fn warning_overlay(src: &RgbImage, font: Option<&Font<'_>>) -> RgbImage {
    let mut dst = src.clone();
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 {
        return dst;
    }

    let banner = Rect::at(0, 0).of_size(width, WARNING_BANNER_HEIGHT.min(height));
    draw_filled_rect_mut(&mut dst, banner, WARNING_BANNER_COLOR);

    if let Some(font) = font {
        let scale = Scale::uniform(WARNING_BANNER_HEIGHT as f32 * 0.6);
        draw_text_mut(&mut dst, WARNING_TEXT_COLOR, 10, 8, scale, font, WARNING_TEXT);
    }
    dst
}

/// Load a TrueType font for overlay text.
pub fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read overlay font");
            return None;
        }
    };
    let font = Font::try_from_vec(bytes);
    if font.is_none() {
        warn!(path = %path.display(), "not a usable TrueType font");
    }
    font
}
