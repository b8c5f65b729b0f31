pub mod model_blazeface;

use image::GrayImage;
use imageproc::rect::Rect;

use crate::error::FaceDetectionError;

/// A model that finds faces in a single-channel intensity frame.
pub trait FaceDetectionModel {
    /// Face rectangles in frame coordinates.
    fn detect(&mut self, grey: &GrayImage) -> Result<Vec<Rect>, FaceDetectionError>;
}

/// Bounding box around a detected face, normalised to the square crop the
/// model was fed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub score: f32,
}

impl FaceBoundingBox {
    pub fn width(&self) -> f32 {
        (self.xmax - self.xmin).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.ymax - self.ymin).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &FaceBoundingBox) -> f32 {
        let w = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let h = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        let intersection = w * h;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Map the box back into frame pixels, given the `(x, y, side)` square that
    /// was cropped out of the frame.
    pub fn to_rect(&self, crop: (u32, u32, u32)) -> Option<Rect> {
        let (x0, y0, side) = crop;
        let side = side as f32;
        let width = (self.width() * side).round() as u32;
        let height = (self.height() * side).round() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        let x = x0 as f32 + self.xmin * side;
        let y = y0 as f32 + self.ymin * side;
        Some(Rect::at(x.round() as i32, y.round() as i32).of_size(width, height))
    }
}

/// Greedy non-maximum suppression: keep the best scoring box of every cluster
/// overlapping by more than `iou_threshold`.
pub fn non_max_suppression(
    mut boxes: Vec<FaceBoundingBox>,
    iou_threshold: f32,
) -> Vec<FaceBoundingBox> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<FaceBoundingBox> = Vec::new();
    for candidate in boxes {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
