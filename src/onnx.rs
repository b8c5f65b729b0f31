//! ONNX Runtime plumbing shared by the face and depth models.

use std::path::Path;

use ndarray::{ArrayD, IxDyn, ShapeError};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionOutputs};

const INTRA_THREADS: usize = 4;

/// Build an optimised CPU session for `model_path`. Builder failures are
/// returned as their message.
pub(crate) fn load_session(model_path: &Path) -> Result<Session, String> {
    let builder = Session::builder().map_err(|err| err.to_string())?;
    let builder = builder
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|err| err.to_string())?;
    let mut builder = builder
        .with_intra_threads(INTRA_THREADS)
        .map_err(|err| err.to_string())?;
    builder
        .commit_from_file(model_path)
        .map_err(|err| err.to_string())
}

/// Copy every `f32` output of a run into an owned array, in output order.
pub(crate) fn owned_outputs<E>(outputs: &SessionOutputs<'_>) -> Result<Vec<ArrayD<f32>>, E>
where
    E: From<ort::Error> + From<ShapeError>,
{
    outputs
        .iter()
        .map(|(_name, value)| {
            let (shape, data) = value.try_extract_tensor::<f32>()?;
            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            Ok(ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())?)
        })
        .collect()
}
