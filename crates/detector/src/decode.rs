use crate::error::DetectError;
use crate::letterbox::LetterboxParams;

/// Values per row ahead of the class scores: cx, cy, w, h, objectness.
pub const BOX_FIELDS: usize = 5;

/// A labeled bounding box in original-image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// `objectness * best_class_score`, in `[0, 1]`.
    pub confidence: f32,
    pub class_id: usize,
}

impl Detection {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Decode a flat `[num_candidates, 5 + num_classes]` buffer into candidate
/// detections in original-image coordinates.
///
/// The buffer length is validated up front: a buffer shorter than the
/// declared shape fails with `CorruptOutput` before any row is decoded, so
/// no partial results escape. Zero candidates is a normal empty result.
pub fn decode(
    raw: &[f32],
    num_candidates: usize,
    num_classes: usize,
    params: &LetterboxParams,
    orig_width: u32,
    orig_height: u32,
    confidence_threshold: f32,
) -> Result<Vec<Detection>, DetectError> {
    let stride = BOX_FIELDS + num_classes;
    let expected = num_candidates * stride;
    if raw.len() < expected {
        return Err(DetectError::CorruptOutput {
            expected,
            actual: raw.len(),
        });
    }

    let max_x = orig_width as f32;
    let max_y = orig_height as f32;
    let mut detections = Vec::new();

    for row in raw[..expected].chunks_exact(stride) {
        // Objectness alone gates most rows before the class scan.
        let objectness = row[4];
        if objectness < confidence_threshold {
            continue;
        }

        // Argmax over class scores; first-seen wins on exact ties.
        let mut best_class_prob = 0.0f32;
        let mut class_id = 0usize;
        for (idx, &score) in row[BOX_FIELDS..].iter().enumerate() {
            if score > best_class_prob {
                best_class_prob = score;
                class_id = idx;
            }
        }

        let confidence = objectness * best_class_prob;
        if confidence < confidence_threshold {
            continue;
        }

        // Center-size box in model space, mapped back through the
        // letterbox and clamped to the original image.
        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let (x1, y1) = params.inverse(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = params.inverse(cx + w / 2.0, cy + h / 2.0);

        let x1 = x1.clamp(0.0, max_x);
        let y1 = y1.clamp(0.0, max_y);
        let x2 = x2.clamp(0.0, max_x);
        let y2 = y2.clamp(0.0, max_y);

        detections.push(Detection {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence,
            class_id,
        });
    }

    tracing::trace!(
        candidates = num_candidates,
        kept = detections.len(),
        "Decoded raw output"
    );

    Ok(detections)
}
