use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use opencv::core::{Mat, Size};
use opencv::imgproc;
use tempfile::NamedTempFile;

use crate::detect::PersonDetector;
use crate::render;
use crate::store::{FrameStore, PipelineState};
use crate::video::VideoFileSource;

/// Process one uploaded video on a blocking worker thread: read, scale,
/// detect, render, publish, until the file is exhausted or the stop flag is
/// set. The worker owns the temp file, so the upload is removed from disk
/// when the run ends.
pub fn spawn_video_worker(
    video: NamedTempFile,
    detector: Arc<Mutex<PersonDetector>>,
    store: FrameStore,
    output_scale: f64,
    shutdown: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = run_video_loop(&video, detector, &store, output_scale, &shutdown) {
            tracing::error!(error = %e, "video worker failed");
        }
        store.set_state(PipelineState::Stopped);
    })
}

fn run_video_loop(
    video: &NamedTempFile,
    detector: Arc<Mutex<PersonDetector>>,
    store: &FrameStore,
    output_scale: f64,
    shutdown: &AtomicBool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut source = VideoFileSource::open(video.path())?;
    store.begin();
    tracing::info!(video = %video.path().display(), "video worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("stop requested");
            break;
        }

        let Some(frame) = source.next_frame()? else {
            break;
        };

        let mut frame = scale_frame(frame, output_scale)?;

        let detections = {
            let mut detector = detector.lock().map_err(|_| "detector lock poisoned")?;
            match detector.detect(&frame) {
                Ok(detections) => detections,
                Err(e) => {
                    tracing::warn!(error = %e, "inference failed, skipping frame");
                    continue;
                }
            }
        };

        tracing::debug!(persons = detections.len(), "frame processed");

        render::annotate(&mut frame, &detections)?;
        if let Some(jpeg) = render::encode_jpeg(&frame) {
            store.publish(jpeg, detections.len());
        }
    }

    tracing::info!(
        frames = store.status().frames_processed,
        "video worker stopped"
    );
    Ok(())
}

fn scale_frame(frame: Mat, scale: f64) -> opencv::Result<Mat> {
    if (scale - 1.0).abs() < f64::EPSILON {
        return Ok(frame);
    }
    let mut resized = Mat::default();
    imgproc::resize(
        &frame,
        &mut resized,
        Size::new(0, 0),
        scale,
        scale,
        imgproc::INTER_LINEAR,
    )?;
    Ok(resized)
}
