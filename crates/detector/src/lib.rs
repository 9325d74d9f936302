pub mod backend;
pub mod config;
pub mod decode;
pub mod detector;
pub mod error;
pub mod labels;
pub mod letterbox;
pub mod nms;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, RawOutput};
pub use config::DetectorConfig;
pub use decode::Detection;
pub use detector::Detector;
pub use error::DetectError;
pub use letterbox::{ColorFormat, Frame, Letterbox, LetterboxParams};
pub use nms::{NmsPolicy, NonMaxSuppressor};
