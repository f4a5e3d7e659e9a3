use std::cmp::Ordering;

use super::backend::RawCandidate;

/// Confidence floor: candidates at or below this score are discarded.
pub const MIN_CONFIDENCE: f32 = 0.2;
/// Overlap ceiling for non-maximum suppression.
pub const NMS_THRESHOLD: f32 = 0.3;

/// One surviving person detection in a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub confidence: f32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub cx: i32,
    pub cy: i32,
}

// Top-left x/y, width, height in pixels.
type PixelBox = (i32, i32, i32, i32);

/// Reshape raw network candidates into the frame's person detections:
/// class filter, confidence floor, non-maximum suppression, then clamped
/// corner boxes with centroids.
pub fn collect_detections(
    candidates: &[RawCandidate],
    person_class: usize,
    frame_width: i32,
    frame_height: i32,
) -> Vec<Detection> {
    let w = frame_width as f32;
    let h = frame_height as f32;

    let mut boxes: Vec<PixelBox> = Vec::new();
    let mut confidences: Vec<f32> = Vec::new();
    let mut centroids: Vec<(i32, i32)> = Vec::new();

    for candidate in candidates {
        let mut max_score = 0.0f32;
        let mut max_class = 0usize;
        for (class_id, &score) in candidate.scores.iter().enumerate() {
            if score > max_score {
                max_score = score;
                max_class = class_id;
            }
        }

        if max_class != person_class || max_score <= MIN_CONFIDENCE {
            continue;
        }

        // Normalized center-form box scaled by the frame's actual size,
        // truncated to integer pixels.
        let cx = (candidate.bbox[0] * w) as i32;
        let cy = (candidate.bbox[1] * h) as i32;
        let bw = (candidate.bbox[2] * w) as i32;
        let bh = (candidate.bbox[3] * h) as i32;

        if bw <= 0 || bh <= 0 {
            continue;
        }

        boxes.push((cx - bw / 2, cy - bh / 2, bw, bh));
        confidences.push(max_score);
        centroids.push((cx, cy));
    }

    let keep = non_max_suppression(&boxes, &confidences, NMS_THRESHOLD);

    let mut detections = Vec::with_capacity(keep.len());
    for i in keep {
        let (x, y, bw, bh) = boxes[i];
        let x1 = x.clamp(0, frame_width);
        let y1 = y.clamp(0, frame_height);
        let x2 = (x + bw).clamp(0, frame_width);
        let y2 = (y + bh).clamp(0, frame_height);

        // A box fully outside the frame collapses when clamped.
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let (cx, cy) = centroids[i];
        detections.push(Detection {
            confidence: confidences[i],
            x1,
            y1,
            x2,
            y2,
            cx: cx.clamp(x1, x2),
            cy: cy.clamp(y1, y2),
        });
    }

    detections
}

/// Greedy suppression: walk boxes in descending score order, keeping each
/// box whose overlap with every already-kept box stays at or below the
/// threshold. Returns indices into the input slices.
pub fn non_max_suppression(
    boxes: &[PixelBox],
    scores: &[f32],
    overlap_threshold: f32,
) -> Vec<usize> {
    if boxes.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<usize> = Vec::new();
    for idx in order {
        if keep
            .iter()
            .all(|&kept| box_iou(boxes[idx], boxes[kept]) <= overlap_threshold)
        {
            keep.push(idx);
        }
    }
    keep
}

fn box_area((_, _, w, h): PixelBox) -> f32 {
    (w.max(0) * h.max(0)) as f32
}

fn box_iou(a: PixelBox, b: PixelBox) -> f32 {
    let x1 = a.0.max(b.0);
    let y1 = a.1.max(b.1);
    let x2 = (a.0 + a.2).min(b.0 + b.2);
    let y2 = (a.1 + a.3).min(b.1 + b.3);

    let inter_w = (x2 - x1).max(0) as f32;
    let inter_h = (y2 - y1).max(0) as f32;
    let inter_area = inter_w * inter_h;

    let union = box_area(a) + box_area(b) - inter_area;
    if union <= 0.0 {
        0.0
    } else {
        inter_area / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: usize = 0;

    /// A candidate over three classes with the person score at index 0.
    fn candidate(cx: f32, cy: f32, w: f32, h: f32, person_score: f32) -> RawCandidate {
        RawCandidate {
            bbox: [cx, cy, w, h],
            scores: vec![person_score, 0.01, 0.01],
        }
    }

    #[test]
    fn no_candidates_yields_empty_result() {
        let detections = collect_detections(&[], PERSON, 640, 480);
        assert!(detections.is_empty());
    }

    #[test]
    fn below_floor_and_wrong_class_are_filtered() {
        let low = candidate(0.5, 0.5, 0.2, 0.4, 0.15);
        let wrong_class = RawCandidate {
            bbox: [0.5, 0.5, 0.2, 0.4],
            scores: vec![0.01, 0.9, 0.01],
        };

        let detections = collect_detections(&[low, wrong_class], PERSON, 640, 480);
        assert!(detections.is_empty());
    }

    #[test]
    fn heavily_overlapping_boxes_keep_only_the_stronger() {
        let strong = candidate(0.5, 0.5, 0.2, 0.4, 0.9);
        let weak = candidate(0.51, 0.5, 0.2, 0.4, 0.6);

        let detections = collect_detections(&[weak, strong], PERSON, 640, 480);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].confidence, 0.9);
    }

    #[test]
    fn disjoint_boxes_both_survive() {
        let left = candidate(0.2, 0.5, 0.1, 0.3, 0.8);
        let right = candidate(0.8, 0.5, 0.1, 0.3, 0.7);

        let detections = collect_detections(&[left, right], PERSON, 640, 480);
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn detections_respect_frame_bounds_and_ordering() {
        // Center near the right edge so the raw box spills past the frame.
        let spilling = candidate(0.98, 0.5, 0.2, 0.4, 0.75);
        let inner = candidate(0.3, 0.3, 0.1, 0.2, 0.5);

        let detections = collect_detections(&[spilling, inner], PERSON, 640, 480);
        assert_eq!(detections.len(), 2);

        for det in &detections {
            assert!(det.confidence > MIN_CONFIDENCE && det.confidence <= 1.0);
            assert!(det.x1 < det.x2);
            assert!(det.y1 < det.y2);
            assert!(det.x1 >= 0 && det.x2 <= 640);
            assert!(det.y1 >= 0 && det.y2 <= 480);
            assert!(det.cx >= det.x1 && det.cx <= det.x2);
            assert!(det.cy >= det.y1 && det.cy <= det.y2);
        }
    }

    #[test]
    fn converted_box_matches_expected_pixels() {
        let detections =
            collect_detections(&[candidate(0.5, 0.5, 0.25, 0.5, 0.9)], PERSON, 640, 480);

        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        // cx=320, cy=240, w=160, h=240 -> corners (240, 120)..(400, 360)
        assert_eq!((det.x1, det.y1, det.x2, det.y2), (240, 120, 400, 360));
        assert_eq!((det.cx, det.cy), (320, 240));
    }

    #[test]
    fn nms_empty_input_is_empty() {
        assert!(non_max_suppression(&[], &[], NMS_THRESHOLD).is_empty());
    }

    #[test]
    fn nms_keeps_highest_score_first() {
        let boxes = vec![(0, 0, 100, 100), (10, 0, 100, 100), (300, 300, 50, 50)];
        let scores = vec![0.6, 0.9, 0.5];

        let keep = non_max_suppression(&boxes, &scores, 0.3);
        assert_eq!(keep, vec![1, 2]);
    }

    #[test]
    fn nms_below_threshold_overlap_keeps_both() {
        let boxes = vec![(0, 0, 100, 100), (80, 80, 100, 100)];
        let scores = vec![0.9, 0.8];

        // Overlap here is 400/19600, far under the ceiling.
        let keep = non_max_suppression(&boxes, &scores, 0.3);
        assert_eq!(keep.len(), 2);
    }

    #[test]
    fn iou_extremes() {
        let unit = (0, 0, 100, 100);
        assert_eq!(box_iou(unit, unit), 1.0);
        assert_eq!(box_iou(unit, (200, 200, 100, 100)), 0.0);
    }
}
