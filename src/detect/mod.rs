mod backend;
mod detector;
mod labels;
mod onnx;
mod postprocess;

pub use backend::{Backend, RawCandidate};
pub use detector::PersonDetector;
pub use labels::{Labels, LabelsError};
pub use onnx::OrtBackend;
pub use postprocess::{Detection, MIN_CONFIDENCE, NMS_THRESHOLD};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("inference session error: {0}")]
    Session(#[from] ort::Error),
    #[error("image processing error: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("frame data too small for network input")]
    FrameTooSmall,
}
