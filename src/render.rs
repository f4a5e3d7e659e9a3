use opencv::core::{Mat, Point, Rect, Scalar, Vector};
use opencv::imgcodecs;
use opencv::imgproc;

use crate::detect::Detection;

const BOX_THICKNESS: i32 = 2;

/// Draw one rectangle per detection plus the person-count overlay.
pub fn annotate(frame: &mut Mat, detections: &[Detection]) -> opencv::Result<()> {
    // Green, BGR order.
    let color = Scalar::new(0.0, 255.0, 0.0, 0.0);

    for det in detections {
        let rect = Rect::new(det.x1, det.y1, det.x2 - det.x1, det.y2 - det.y1);
        imgproc::rectangle(frame, rect, color, BOX_THICKNESS, imgproc::LINE_8, 0)?;
    }

    let label = format!("Total persons = {}", detections.len());
    imgproc::put_text(
        frame,
        &label,
        Point::new(20, 40),
        imgproc::FONT_HERSHEY_DUPLEX,
        1.0,
        color,
        2,
        imgproc::LINE_8,
        false,
    )?;

    Ok(())
}

pub fn encode_jpeg(mat: &Mat) -> Option<Vec<u8>> {
    let mut buf = Vector::<u8>::new();
    let params = Vector::<i32>::new();
    imgcodecs::imencode(".jpg", mat, &mut buf, &params).ok()?;
    Some(buf.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::CV_8UC3;

    #[test]
    fn annotate_and_encode_a_synthetic_frame() {
        let mut frame =
            Mat::new_rows_cols_with_default(240, 320, CV_8UC3, Scalar::all(0.0)).unwrap();
        let detections = vec![Detection {
            confidence: 0.9,
            x1: 50,
            y1: 40,
            x2: 150,
            y2: 200,
            cx: 100,
            cy: 120,
        }];

        annotate(&mut frame, &detections).unwrap();

        let jpeg = encode_jpeg(&frame).expect("jpeg encoding");
        // JPEG SOI marker.
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }
}
