use ndarray::Array4;

use super::DetectError;

/// One candidate from one network output layer.
///
/// The box is in normalized center/width/height form relative to the network
/// input; `scores` is the per-class score vector with the objectness column
/// already stripped off.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub bbox: [f32; 4],
    pub scores: Vec<f32>,
}

/// The seam between the pipeline and the trained network.
///
/// Takes the NCHW input tensor, returns the candidates from every output
/// layer. Tests substitute a stub yielding injected candidates.
pub trait Backend: Send {
    fn infer(&mut self, input: Array4<f32>) -> Result<Vec<RawCandidate>, DetectError>;
}
