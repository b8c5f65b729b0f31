use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = VidfxError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum VidfxError {
    #[error("capture: {0}")]
    Capture(#[from] CaptureError),
    #[error("face detection: {0}")]
    FaceDetection(#[from] FaceDetectionError),
    #[error("depth estimation: {0}")]
    Depth(#[from] DepthError),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by frame sources.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("could not create capture context")]
    Context,
    #[error("camera {index} not found ({available} available)")]
    NoDevice { index: u32, available: u32 },
    #[error("camera {0} reports no usable format")]
    NoFormat(u32),
    #[error("unable to open stream on camera {0}")]
    StreamOpen(u32),
    #[error("no input images given")]
    NoImages,
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Errors raised by a face detection model. The dispatcher maps all of them to
/// an empty rectangle set.
#[derive(Debug, Error)]
pub enum FaceDetectionError {
    #[error("model file {0} not found")]
    ModelNotFound(PathBuf),
    #[error("could not create onnx session: {0}")]
    Session(String),
    #[error("onnx runtime: {0}")]
    Runtime(#[from] ort::Error),
    #[error("anchors: {0}")]
    Anchors(#[from] ndarray_npy::ReadNpyError),
    #[error("tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a depth estimation model. Any of them latches the depth
/// service as unavailable for the rest of the run.
#[derive(Debug, Error)]
pub enum DepthError {
    #[error("model file {0} not found")]
    ModelNotFound(PathBuf),
    #[error("no depth model could be loaded")]
    NoModel,
    #[error("could not create onnx session: {0}")]
    Session(String),
    #[error("onnx runtime: {0}")]
    Runtime(#[from] ort::Error),
    #[error("tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
}
