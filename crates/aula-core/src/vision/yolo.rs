//! Object detection with a YOLOv8 ONNX export.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ndarray::Array4;
use ort::logging::LogLevel;
use ort::session::{Session, SessionInputs};
use ort::value::TensorRef;
use tracing::debug;

use crate::error::{Error, Result};
use crate::vision::Detection;

/// Detections at or below this confidence are discarded.
pub const CONFIDENCE_THRESHOLD: f32 = 0.25;
const IOU_THRESHOLD: f32 = 0.45;
const INPUT_SIZE: u32 = 640;
const PAD_VALUE: f32 = 114.0 / 255.0;

pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// YOLOv8 session with letterbox pre- and NMS post-processing.
pub struct YoloDetector {
    session: Mutex<Session>,
}

/// Letterbox mapping from source pixels to model input space.
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone)]
struct Candidate {
    class: usize,
    confidence: f32,
    // xyxy in model input space
    bbox: [f32; 4],
}

impl YoloDetector {
    pub fn load(model_path: &Path) -> Result<Self> {
        let session = Session::builder()
            .and_then(|b| b.with_log_level(LogLevel::Error))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| Error::ModelLoad(format!("failed to load detector: {e}")))?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Detect objects, keeping only confidences above the fixed threshold.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (pixels, letterbox) = preprocess(image);

        let dims: Vec<i64> = pixels.shape().iter().map(|&d| d as i64).collect();
        let data = pixels
            .as_slice()
            .ok_or_else(|| Error::Inference("detector tensor is not contiguous".to_string()))?;
        let tensor = TensorRef::from_array_view((dims, data))
            .map_err(|e| Error::Inference(format!("bad detector tensor: {e}")))?;

        let inputs: SessionInputs<'_, '_, 0> =
            SessionInputs::ValueMap(vec![(Cow::Borrowed("images"), tensor.into())]);

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("detector session lock poisoned".to_string()))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::Inference(format!("detector forward pass failed: {e}")))?;

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("bad detector output: {e}")))?;

        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 || dims[1] < 5 {
            return Err(Error::Inference(format!(
                "unexpected detector output shape {dims:?}"
            )));
        }
        let num_classes = dims[1] - 4;
        let num_anchors = dims[2];

        let candidates = decode_predictions(data, num_anchors, num_classes, CONFIDENCE_THRESHOLD);
        let kept = non_max_suppression(candidates, IOU_THRESHOLD);

        let (width, height) = (image.width() as f32, image.height() as f32);
        let detections = kept
            .into_iter()
            .map(|c| Detection {
                object: COCO_CLASSES
                    .get(c.class)
                    .copied()
                    .unwrap_or("unknown")
                    .to_string(),
                confidence: c.confidence,
                position: letterbox.to_source(c.bbox, width, height),
            })
            .collect::<Vec<_>>();

        debug!(count = detections.len(), "detection done");
        Ok(detections)
    }
}

impl Letterbox {
    fn to_source(&self, bbox: [f32; 4], width: f32, height: f32) -> [f32; 4] {
        let map_x = |x: f32| ((x - self.dx) / self.scale).clamp(0.0, width);
        let map_y = |y: f32| ((y - self.dy) / self.scale).clamp(0.0, height);
        [map_x(bbox[0]), map_y(bbox[1]), map_x(bbox[2]), map_y(bbox[3])]
    }
}

/// Resize with preserved aspect ratio onto a gray 640x640 canvas.
fn preprocess(image: &DynamicImage) -> (Array4<f32>, Letterbox) {
    let (width, height) = (image.width(), image.height());
    let scale = (INPUT_SIZE as f32 / width as f32).min(INPUT_SIZE as f32 / height as f32);
    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);
    let dx = ((INPUT_SIZE - new_w) / 2) as f32;
    let dy = ((INPUT_SIZE - new_h) / 2) as f32;

    let resized = image
        .resize_exact(new_w, new_h, image::imageops::FilterType::Triangle)
        .to_rgb8();

    let size = INPUT_SIZE as usize;
    let mut pixels = Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (tx, ty) = ((x as f32 + dx) as usize, (y as f32 + dy) as usize);
        for channel in 0..3 {
            pixels[[0, channel, ty, tx]] = pixel.0[channel] as f32 / 255.0;
        }
    }

    (pixels, Letterbox { scale, dx, dy })
}

/// Decode the `[1, 4 + classes, anchors]` head output.
///
/// Keeps only candidates strictly above `threshold`, converting center boxes
/// to corner form in model input space.
fn decode_predictions(
    data: &[f32],
    num_anchors: usize,
    num_classes: usize,
    threshold: f32,
) -> Vec<Candidate> {
    let at = |row: usize, anchor: usize| data[row * num_anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..num_anchors {
        let mut best_class = 0;
        let mut best_score = 0.0f32;
        for class in 0..num_classes {
            let score = at(4 + class, anchor);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if best_score <= threshold {
            continue;
        }

        let (cx, cy) = (at(0, anchor), at(1, anchor));
        let (w, h) = (at(2, anchor), at(3, anchor));
        candidates.push(Candidate {
            class: best_class,
            confidence: best_score,
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        });
    }
    candidates
}

/// Class-wise greedy non-maximum suppression.
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let overlaps = kept.iter().any(|k| {
            k.class == candidate.class && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = ix * iy;
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Layout helper: rows are [cx, cy, w, h, class0, class1], columns anchors.
    fn head(rows: &[&[f32]]) -> Vec<f32> {
        rows.iter().flat_map(|r| r.iter().copied()).collect()
    }

    #[test]
    fn low_confidence_is_dropped() {
        // Two anchors; second sits exactly at the threshold and must go.
        let data = head(&[
            &[100.0, 200.0],
            &[100.0, 200.0],
            &[20.0, 20.0],
            &[20.0, 20.0],
            &[0.9, 0.25],
            &[0.1, 0.0],
        ]);
        let decoded = decode_predictions(&data, 2, 2, CONFIDENCE_THRESHOLD);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].class, 0);
        assert!((decoded[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn center_box_becomes_corners() {
        let data = head(&[&[100.0], &[100.0], &[40.0], &[20.0], &[0.8], &[0.0]]);
        let decoded = decode_predictions(&data, 1, 2, CONFIDENCE_THRESHOLD);
        assert_eq!(decoded[0].bbox, [80.0, 90.0, 120.0, 110.0]);
    }

    #[test]
    fn nms_keeps_best_of_overlapping_pair() {
        let near_duplicate = |confidence: f32| Candidate {
            class: 0,
            confidence,
            bbox: [0.0, 0.0, 10.0, 10.0],
        };
        let kept = non_max_suppression(
            vec![near_duplicate(0.5), near_duplicate(0.9)],
            IOU_THRESHOLD,
        );
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn nms_is_class_wise() {
        let boxed = |class: usize| Candidate {
            class,
            confidence: 0.8,
            bbox: [0.0, 0.0, 10.0, 10.0],
        };
        let kept = non_max_suppression(vec![boxed(0), boxed(1)], IOU_THRESHOLD);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(iou(&[0.0, 0.0, 1.0, 1.0], &[5.0, 5.0, 6.0, 6.0]), 0.0);
    }

    #[test]
    fn letterbox_round_trip() {
        let lb = Letterbox {
            scale: 0.5,
            dx: 0.0,
            dy: 140.0,
        };
        let mapped = lb.to_source([50.0, 190.0, 150.0, 240.0], 1280.0, 720.0);
        assert_eq!(mapped, [100.0, 100.0, 300.0, 200.0]);
    }
}
