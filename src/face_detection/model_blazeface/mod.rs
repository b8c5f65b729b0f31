use std::cmp::min;
use std::fs::File;
use std::path::Path;

use image::{DynamicImage, GrayImage};
use imageproc::rect::Rect;
use ndarray::prelude::*;
use ndarray_npy::ReadNpyExt;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::error::FaceDetectionError;
use crate::face_detection::{non_max_suppression, FaceBoundingBox, FaceDetectionModel};
use crate::onnx;

const INPUT_SIZE: u32 = 256;
const SCORE_CLIP: f32 = 100.0;
const NMS_IOU_THRESHOLD: f32 = 0.3;
const SCORE_THRESHOLD: f32 = 0.75;

/// BlazeFace (back camera, 256x256) face detector running on ONNX Runtime.
pub struct BlazefaceModel {
    session: Session,
    anchors: Array2<f32>,
}

impl BlazefaceModel {
    pub fn new(
        model_path: &Path,
        anchors_path: &Path,
    ) -> Result<BlazefaceModel, FaceDetectionError> {
        for path in [model_path, anchors_path] {
            if !path.exists() {
                return Err(FaceDetectionError::ModelNotFound(path.to_path_buf()));
            }
        }

        let session = onnx::load_session(model_path).map_err(FaceDetectionError::Session)?;

        // anchors are stored as float64 [num_anchors, 4] (x_center, y_center, w, h)
        let anchors: Array2<f64> = Array2::<f64>::read_npy(File::open(anchors_path)?)?;
        if anchors.ncols() < 4 {
            return Err(FaceDetectionError::UnexpectedOutput(format!(
                "anchors need 4 columns, found {}",
                anchors.ncols()
            )));
        }
        let anchors = anchors.mapv(|x| x as f32);

        info!(model = %model_path.display(), anchors = anchors.nrows(), "face detector loaded");

        Ok(BlazefaceModel {
            session,
            anchors,
        })
    }
}

impl FaceDetectionModel for BlazefaceModel {
    fn detect(&mut self, grey: &GrayImage) -> Result<Vec<Rect>, FaceDetectionError> {
        let image = DynamicImage::ImageLuma8(grey.clone());

        // cut the largest centred square from the frame
        let smallest_side = min(image.width(), image.height());
        if smallest_side == 0 {
            return Ok(Vec::new());
        }
        let crop = (
            (image.width() - smallest_side) / 2,
            (image.height() - smallest_side) / 2,
            smallest_side,
        );

        let input = image
            .crop_imm(crop.0, crop.1, smallest_side, smallest_side)
            .resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let input: Vec<f32> = input
            .pixels()
            .flat_map(|p| p.0)
            .map(|v| v as f32 / 255.0)
            .collect();

        let shape = [1usize, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];
        let tensor = Tensor::from_array((shape, input.into_boxed_slice()))?;
        let outputs = self.session.run(ort::inputs![tensor])?;
        let arrays = onnx::owned_outputs::<FaceDetectionError>(&outputs)?;

        // the model splits its heads over two anchor layers: scores end in a
        // dimension of 1, box regressors in a dimension of 16
        let mut scores = Vec::new();
        let mut regressors = Vec::new();
        for array in arrays {
            if array.shape().last() == Some(&1) {
                scores.push(array);
            } else {
                regressors.push(array);
            }
        }
        let scores = concatenate_heads(&scores)?;
        let regressors = concatenate_heads(&regressors)?;

        let boxes = decode_boxes(&regressors, &scores, &self.anchors, SCORE_THRESHOLD);
        let kept = non_max_suppression(boxes, NMS_IOU_THRESHOLD);
        debug!(faces = kept.len(), "face detection done");

        Ok(kept.iter().filter_map(|b| b.to_rect(crop)).collect())
    }
}

fn concatenate_heads(heads: &[ArrayD<f32>]) -> Result<Array3<f32>, FaceDetectionError> {
    if heads.is_empty() {
        return Err(FaceDetectionError::UnexpectedOutput("missing output head".to_string()));
    }
    let views: Vec<ArrayViewD<f32>> = heads.iter().map(|h| h.view()).collect();
    let joined = ndarray::concatenate(Axis(1), &views)?;
    Ok(joined.into_dimensionality::<Ix3>()?)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Turn raw regressor rows into normalised boxes, dropping anchors whose
/// score is below `threshold`.
fn decode_boxes(
    regressors: &Array3<f32>,
    scores: &Array3<f32>,
    anchors: &Array2<f32>,
    threshold: f32,
) -> Vec<FaceBoundingBox> {
    let scale = INPUT_SIZE as f32;
    let count = regressors.shape()[1].min(scores.shape()[1]).min(anchors.nrows());

    (0..count)
        .filter_map(|i| {
            let score = sigmoid(scores[[0, i, 0]].clamp(-SCORE_CLIP, SCORE_CLIP));
            if score < threshold {
                return None;
            }

            let x_center = regressors[[0, i, 0]] / scale * anchors[[i, 2]] + anchors[[i, 0]];
            let y_center = regressors[[0, i, 1]] / scale * anchors[[i, 3]] + anchors[[i, 1]];
            let w = regressors[[0, i, 2]] / scale * anchors[[i, 2]];
            let h = regressors[[0, i, 3]] / scale * anchors[[i, 3]];

            Some(FaceBoundingBox {
                xmin: x_center - w / 2.0,
                ymin: y_center - h / 2.0,
                xmax: x_center + w / 2.0,
                ymax: y_center + h / 2.0,
                score,
            })
        })
        .collect()
}
