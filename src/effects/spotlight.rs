use image::RgbImage;
use imageproc::rect::Rect;

use crate::filters::desaturate;

/// Clip a rectangle to the bounds of a `width` x `height` frame.
pub fn clip_to_frame(rect: &Rect, width: u32, height: u32) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    rect.intersect(Rect::at(0, 0).of_size(width, height))
}

/// Grayscale frame with the face regions restored to their original colour.
pub fn spotlight(src: &RgbImage, faces: &[Rect]) -> RgbImage {
    let mut dst = desaturate(src);
    let (width, height) = src.dimensions();

    for face in faces.iter().filter_map(|f| clip_to_frame(f, width, height)) {
        let (left, top) = (face.left() as u32, face.top() as u32);
        for y in top..top + face.height() {
            for x in left..left + face.width() {
                dst.put_pixel(x, y, *src.get_pixel(x, y));
            }
        }
    }
    dst
}
