use std::path::Path;

use image::{imageops, GrayImage, Luma, RgbImage};
use ndarray::prelude::*;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use super::DepthEstimationModel;
use crate::error::DepthError;
use crate::onnx;

/// Square input side the network is exported with.
const INPUT_SIZE: u32 = 518;
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Depth Anything V2 monocular depth estimator.
pub struct DepthAnythingModel {
    session: Session,
}

impl DepthAnythingModel {
    pub fn new(model_path: &Path) -> Result<DepthAnythingModel, DepthError> {
        if !model_path.exists() {
            return Err(DepthError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = onnx::load_session(model_path).map_err(DepthError::Session)?;
        info!(model = %model_path.display(), size = INPUT_SIZE, "depth model loaded");

        Ok(DepthAnythingModel { session })
    }
}

impl DepthEstimationModel for DepthAnythingModel {
    fn estimate(&mut self, frame: &RgbImage) -> Result<GrayImage, DepthError> {
        let resized = imageops::resize(
            frame,
            INPUT_SIZE,
            INPUT_SIZE,
            imageops::FilterType::Triangle,
        );

        let input = to_nchw(&resized);
        let shape = [1usize, 3, INPUT_SIZE as usize, INPUT_SIZE as usize];
        let tensor = Tensor::from_array((shape, input.into_raw_vec().into_boxed_slice()))?;
        let outputs = self.session.run(ort::inputs![tensor])?;

        let raw = onnx::owned_outputs::<DepthError>(&outputs)?
            .into_iter()
            .next()
            .ok_or_else(|| DepthError::UnexpectedOutput("model produced no output".to_string()))?;

        let shape = raw.shape().to_vec();
        if shape.len() < 2 {
            return Err(DepthError::UnexpectedOutput(format!("output shape {:?}", shape)));
        }
        let (out_h, out_w) = (shape[shape.len() - 2], shape[shape.len() - 1]);
        let plane = raw.into_shape((out_h, out_w))?;

        let depth = stretch_to_u8(plane.view());
        Ok(imageops::resize(
            &depth,
            frame.width(),
            frame.height(),
            imageops::FilterType::Triangle,
        ))
    }
}

/// RGB image to a normalised [1, 3, H, W] tensor.
pub(crate) fn to_nchw(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    Array4::from_shape_fn((1, 3, height as usize, width as usize), |(_, c, y, x)| {
        let v = image.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
        (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c]
    })
}

/// Min-max stretch to the full 8-bit range. A flat plane maps to zero.
pub(crate) fn stretch_to_u8(plane: ArrayView2<f32>) -> GrayImage {
    let (rows, cols) = plane.dim();
    let (min, max) = plane
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        if !(range > f32::EPSILON) {
            return Luma([0]);
        }
        let v = (plane[[y as usize, x as usize]] - min) * 255.0 / range;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use ndarray::array;

    #[test]
    fn nchw_layout_and_normalisation() {
        let mut image = RgbImage::new(3, 2);
        image.put_pixel(2, 1, Rgb([255, 0, 128]));
        let tensor = to_nchw(&image);
        assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
        assert!((tensor[[0, 0, 1, 2]] - (1.0 - 0.485) / 0.229).abs() < 1e-5);
        assert!((tensor[[0, 1, 1, 2]] - (-0.456 / 0.224)).abs() < 1e-5);
        assert!((tensor[[0, 0, 0, 0]] - (-0.485 / 0.229)).abs() < 1e-5);
    }

    #[test]
    fn stretch_spans_full_range() {
        let plane = array![[2.0f32, 4.0], [6.0, 10.0]];
        let depth = stretch_to_u8(plane.view());
        assert_eq!(depth.dimensions(), (2, 2));
        assert_eq!(depth.get_pixel(0, 0)[0], 0);
        assert_eq!(depth.get_pixel(1, 0)[0], 64);
        assert_eq!(depth.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn stretch_of_flat_plane_is_zero() {
        let plane = Array2::<f32>::from_elem((3, 4), 7.5);
        let depth = stretch_to_u8(plane.view());
        assert_eq!(depth.dimensions(), (4, 3));
        assert!(depth.iter().all(|&v| v == 0));
    }

    #[test]
    fn missing_model_is_reported() {
        let err = DepthAnythingModel::new(Path::new("/nonexistent/depth.onnx"));
        assert!(matches!(err, Err(DepthError::ModelNotFound(_))));
    }
}
