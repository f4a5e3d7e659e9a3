use std::path::Path;

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("video decode error: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("failed to open video source: {0}")]
    Open(String),
}

/// Sequential frame source over a decoded video file. Frames are owned and
/// handed out one at a time; the capture is released on drop.
pub struct VideoFileSource {
    capture: VideoCapture,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| VideoError::Open(path.display().to_string()))?;

        let capture = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(VideoError::Open(path_str.to_string()));
        }

        Ok(Self { capture })
    }

    /// Next frame in sequence; `None` once the file is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Mat>, VideoError> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        let _ = self.capture.release();
    }
}
