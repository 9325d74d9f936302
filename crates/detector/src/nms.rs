use crate::decode::Detection;

/// Whether overlapping boxes of different classes suppress each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NmsPolicy {
    /// A high-confidence box suppresses any overlapping box regardless of
    /// class. Default, matching the reference detector.
    #[default]
    CrossClass,
    /// Boxes only suppress other boxes of the same class.
    PerClass,
}

impl std::str::FromStr for NmsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cross-class" | "cross_class" => Ok(NmsPolicy::CrossClass),
            "per-class" | "per_class" => Ok(NmsPolicy::PerClass),
            other => Err(format!("unknown NMS policy: {other}")),
        }
    }
}

/// Greedy, confidence-ordered non-maximum suppression.
pub struct NonMaxSuppressor {
    pub iou_threshold: f32,
    pub policy: NmsPolicy,
}

impl NonMaxSuppressor {
    pub fn new(iou_threshold: f32, policy: NmsPolicy) -> Self {
        Self {
            iou_threshold,
            policy,
        }
    }

    /// Remove geometrically redundant detections.
    ///
    /// The result is in descending-confidence order; equal confidences
    /// keep their insertion order (the sort is stable), so the sweep is
    /// deterministic across platforms.
    pub fn suppress(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut suppressed = vec![false; detections.len()];
        let mut result = Vec::new();

        for i in 0..detections.len() {
            if suppressed[i] {
                continue;
            }

            for j in (i + 1)..detections.len() {
                if suppressed[j] {
                    continue;
                }
                if self.policy == NmsPolicy::PerClass
                    && detections[i].class_id != detections[j].class_id
                {
                    continue;
                }
                if iou(&detections[i], &detections[j]) > self.iou_threshold {
                    suppressed[j] = true;
                }
            }

            result.push(detections[i].clone());
        }

        result
    }
}

/// Intersection-over-union of two boxes; zero when the union area is zero,
/// so degenerate boxes never divide by zero.
pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = a.right().min(b.right());
    let y2 = a.bottom().min(b.bottom());

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;

    if union <= 0.0 { 0.0 } else { intersection / union }
}
