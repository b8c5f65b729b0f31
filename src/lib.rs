pub mod app;
pub mod config;
pub mod depth;
pub mod dispatcher;
pub mod effects;
pub mod error;
pub mod face_detection;
pub mod filters;
pub mod mode;
mod onnx;
pub mod pipeline;
pub mod utils;
pub mod webcam;

pub use dispatcher::ModeDispatcher;
pub use error::{Result, VidfxError};
pub use mode::Mode;
