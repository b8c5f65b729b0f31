//! Depth estimation service.
//!
//! The model is loaded at most once per run. A failed load, or a failed
//! inference, latches the service as unavailable; it is never retried.

pub mod model_depth_anything;

use std::path::PathBuf;

use image::{imageops, GrayImage, RgbImage};
use tracing::{info, warn};

use crate::error::DepthError;

pub use model_depth_anything::DepthAnythingModel;

pub trait DepthEstimationModel {
    /// Single-channel depth map, min-max stretched to [0, 255], at the frame's
    /// resolution.
    fn estimate(&mut self, frame: &RgbImage) -> Result<GrayImage, DepthError>;
}

pub type DepthLoader = Box<dyn FnOnce() -> Result<Box<dyn DepthEstimationModel>, DepthError>>;

enum DepthState {
    Uninitialized(DepthLoader),
    Ready(Box<dyn DepthEstimationModel>),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStatus {
    Uninitialized,
    Ready,
    Unavailable,
}

pub struct DepthService {
    state: DepthState,
}

impl DepthService {
    /// Service that runs `loader` the first time a depth map is requested.
    pub fn lazy<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn DepthEstimationModel>, DepthError> + 'static,
    {
        Self {
            state: DepthState::Uninitialized(Box::new(loader)),
        }
    }

    /// Lazily load the first of `candidates` that opens as a Depth Anything model.
    pub fn from_candidates(candidates: Vec<PathBuf>) -> Self {
        Self::lazy(move || {
            for path in candidates.iter() {
                match DepthAnythingModel::new(path) {
                    Ok(model) => return Ok(Box::new(model) as Box<dyn DepthEstimationModel>),
                    Err(err) => {
                        info!(path = %path.display(), %err, "depth model candidate rejected")
                    }
                }
            }
            Err(DepthError::NoModel)
        })
    }

    pub fn ready(model: Box<dyn DepthEstimationModel>) -> Self {
        Self {
            state: DepthState::Ready(model),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            state: DepthState::Unavailable,
        }
    }

    pub fn status(&self) -> DepthStatus {
        match self.state {
            DepthState::Uninitialized(_) => DepthStatus::Uninitialized,
            DepthState::Ready(_) => DepthStatus::Ready,
            DepthState::Unavailable => DepthStatus::Unavailable,
        }
    }

    fn ensure(&mut self) -> Option<&mut dyn DepthEstimationModel> {
        let state = std::mem::replace(&mut self.state, DepthState::Unavailable);
        self.state = match state {
            DepthState::Uninitialized(loader) => match loader() {
                Ok(model) => {
                    info!("depth model ready");
                    DepthState::Ready(model)
                }
                Err(err) => {
                    warn!(%err, "depth model unavailable, depth effects disabled for this run");
                    DepthState::Unavailable
                }
            },
            other => other,
        };

        match &mut self.state {
            DepthState::Ready(model) => Some(model.as_mut()),
            _ => None,
        }
    }

    /// Depth map for `frame`, or `None` when the service is unavailable.
    pub fn estimate(&mut self, frame: &RgbImage) -> Option<GrayImage> {
        let result = self.ensure()?.estimate(frame);
        match result {
            Ok(depth) if depth.dimensions() == frame.dimensions() => Some(depth),
            Ok(depth) => Some(imageops::resize(
                &depth,
                frame.width(),
                frame.height(),
                imageops::FilterType::Triangle,
            )),
            Err(err) => {
                warn!(%err, "depth estimation failed, depth effects disabled for this run");
                self.state = DepthState::Unavailable;
                None
            }
        }
    }
}
