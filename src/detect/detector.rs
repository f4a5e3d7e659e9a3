use ndarray::Array4;
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;

use super::backend::Backend;
use super::postprocess::{collect_detections, Detection};
use super::DetectError;

/// Fixed square resolution the network was trained at.
pub const NETWORK_INPUT_SIZE: u32 = 416;

/// Per-frame pedestrian detector: preprocessing, backend inference, and
/// post-processing behind one call.
pub struct PersonDetector {
    backend: Box<dyn Backend>,
    person_class: usize,
}

impl PersonDetector {
    pub fn new(backend: Box<dyn Backend>, person_class: usize) -> Self {
        Self {
            backend,
            person_class,
        }
    }

    pub fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>, DetectError> {
        let rows = frame.rows();
        let cols = frame.cols();
        if rows == 0 || cols == 0 {
            return Ok(Vec::new());
        }

        let input = preprocess(frame)?;
        let candidates = self.backend.infer(input)?;

        Ok(collect_detections(
            &candidates,
            self.person_class,
            cols,
            rows,
        ))
    }
}

/// Resize to the square network input (no letterboxing: candidate boxes are
/// normalized and later scaled by the raw frame dimensions), swap BGR to
/// RGB, and scale pixels into [0, 1] as an NCHW tensor.
fn preprocess(frame: &Mat) -> Result<Array4<f32>, DetectError> {
    let input_size = NETWORK_INPUT_SIZE as i32;

    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(input_size, input_size),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(
        &resized,
        &mut rgb,
        imgproc::COLOR_BGR2RGB,
        0,
        opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    let data = rgb.data_bytes()?;
    let side = NETWORK_INPUT_SIZE as usize;
    if data.len() < side * side * 3 {
        return Err(DetectError::FrameTooSmall);
    }

    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for y in 0..side {
        for x in 0..side {
            let idx = (y * side + x) * 3;
            tensor[[0, 0, y, x]] = data[idx] as f32 / 255.0;
            tensor[[0, 1, y, x]] = data[idx + 1] as f32 / 255.0;
            tensor[[0, 2, y, x]] = data[idx + 2] as f32 / 255.0;
        }
    }

    Ok(tensor)
}
