use crate::error::DetectError;
use common::span_debug;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use ndarray::{Array, IxDyn};

/// Channel order of a caller-supplied pixel buffer. BGR is the
/// conventional order at the boundary; both are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Rgb,
    Bgr,
}

/// Borrowed view of a caller-owned 8-bit, 3-channel image.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
}

/// Geometry of one letterbox mapping. Fully determines the forward and
/// inverse transform between original-image and model-space pixels for
/// a single (image, target-size) pair.
///
/// Invariants: `scale > 0`; `x_offset + round(src_w * scale) <= target_width`
/// (symmetric for height).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxParams {
    pub scale: f32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub target_width: u32,
    pub target_height: u32,
}

impl LetterboxParams {
    /// Map a model-space point back to original-image coordinates.
    ///
    /// No clamping here; the decoder clamps whole boxes.
    pub fn inverse(&self, model_x: f32, model_y: f32) -> (f32, f32) {
        (
            (model_x - self.x_offset as f32) / self.scale,
            (model_y - self.y_offset as f32) / self.scale,
        )
    }
}

/// Aspect-preserving resize into a fixed, zero-padded canvas, producing
/// the planar `[1, 3, H, W]` float tensor the network expects.
///
/// Internal buffers are reused across frames.
pub struct Letterbox {
    target: (u32, u32),
    rgb_buffer: Vec<u8>,
    canvas: Vec<u8>,
}

impl Letterbox {
    pub fn new(target: (u32, u32)) -> Self {
        Self {
            target,
            rgb_buffer: Vec::with_capacity(1920 * 1080 * 3),
            canvas: vec![0u8; (target.0 * target.1 * 3) as usize],
        }
    }

    /// Letterbox `frame` into the target canvas and lay it out as a
    /// normalized RGB tensor shaped `[1, 3, target_h, target_w]`.
    pub fn forward(
        &mut self,
        frame: &Frame,
    ) -> Result<(Array<f32, IxDyn>, LetterboxParams), DetectError> {
        let _s = span_debug!("letterbox_forward");

        if frame.width == 0 || frame.height == 0 {
            return Err(DetectError::InvalidInput {
                reason: format!("zero-area image ({}x{})", frame.width, frame.height),
            });
        }

        let expected = (frame.width * frame.height * 3) as usize;
        if frame.pixels.len() != expected {
            return Err(DetectError::InvalidInput {
                reason: format!(
                    "pixel buffer holds {} bytes, expected {} for {}x{} three-channel",
                    frame.pixels.len(),
                    expected,
                    frame.width,
                    frame.height
                ),
            });
        }

        tracing::trace!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Letterboxing frame"
        );

        self.copy_rgb_pixels(frame);
        let params = self.resize_and_pad(frame.width, frame.height)?;
        let tensor = self.normalize()?;

        Ok((tensor, params))
    }

    fn copy_rgb_pixels(&mut self, frame: &Frame) {
        self.rgb_buffer.clear();
        match frame.format {
            ColorFormat::Rgb => {
                self.rgb_buffer.extend_from_slice(frame.pixels);
            }
            ColorFormat::Bgr => {
                self.rgb_buffer.reserve(frame.pixels.len());
                for px in frame.pixels.chunks_exact(3) {
                    self.rgb_buffer.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
        }
    }

    fn resize_and_pad(&mut self, width: u32, height: u32) -> Result<LetterboxParams, DetectError> {
        let (target_w, target_h) = self.target;

        let scale = (target_w as f32 / width as f32).min(target_h as f32 / height as f32);
        let new_width = ((width as f32 * scale).round() as u32).min(target_w);
        let new_height = ((height as f32 * scale).round() as u32).min(target_h);

        let x_offset = (target_w - new_width) / 2;
        let y_offset = (target_h - new_height) / 2;

        let src = Image::from_slice_u8(width, height, &mut self.rgb_buffer, PixelType::U8x3)
            .map_err(|e| DetectError::InvalidInput {
                reason: e.to_string(),
            })?;

        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new()
            .resize(
                &src,
                &mut resized,
                &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            )
            .map_err(|e| DetectError::InvalidInput {
                reason: e.to_string(),
            })?;

        self.canvas.fill(0);

        let resized_data = resized.buffer();
        let stride = target_w * 3;

        for y in 0..new_height {
            let src_row = (y * new_width * 3) as usize;
            let dst_row = ((y + y_offset) * stride + x_offset * 3) as usize;

            self.canvas[dst_row..dst_row + (new_width * 3) as usize]
                .copy_from_slice(&resized_data[src_row..src_row + (new_width * 3) as usize]);
        }

        Ok(LetterboxParams {
            scale,
            x_offset,
            y_offset,
            target_width: target_w,
            target_height: target_h,
        })
    }

    fn normalize(&self) -> Result<Array<f32, IxDyn>, DetectError> {
        let (target_w, target_h) = self.target;
        let spatial = (target_w * target_h) as usize;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in self.canvas.chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Array::from_shape_vec(IxDyn(&[1, 3, target_h as usize, target_w as usize]), output)
            .map_err(|e| DetectError::InvalidInput {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(pixels: &[u8], width: u32, height: u32) -> Frame<'_> {
        Frame {
            pixels,
            width,
            height,
            format: ColorFormat::Rgb,
        }
    }

    #[test]
    fn output_tensor_has_model_shape() {
        let pixels = vec![128u8; 800 * 600 * 3];
        let mut letterbox = Letterbox::new((640, 640));

        let (tensor, _) = letterbox
            .forward(&gray_frame(&pixels, 800, 600))
            .expect("letterbox should succeed");

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
    }

    #[test]
    fn scale_and_offsets_preserve_aspect_ratio() {
        // 800x600 into 640x640: scale = min(640/800, 640/600) = 0.8,
        // resized 640x480, centered with a 80px vertical band.
        let pixels = vec![128u8; 800 * 600 * 3];
        let mut letterbox = Letterbox::new((640, 640));

        let (_, params) = letterbox
            .forward(&gray_frame(&pixels, 800, 600))
            .expect("letterbox should succeed");

        assert_eq!(params.scale, 0.8);
        assert_eq!(params.x_offset, 0);
        assert_eq!(params.y_offset, 80);
        assert_eq!(params.target_width, 640);
        assert_eq!(params.target_height, 640);
    }

    #[test]
    fn padding_band_is_zero_filled() {
        let pixels = vec![200u8; 800 * 600 * 3];
        let mut letterbox = Letterbox::new((640, 640));

        let (tensor, params) = letterbox
            .forward(&gray_frame(&pixels, 800, 600))
            .expect("letterbox should succeed");

        // Top band is padding, center row is image content.
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0, "padding should be zero");
        let center = tensor[[0, 0, 320, 320]];
        assert!(
            (center - 200.0 / 255.0).abs() < 0.02,
            "image content should survive resize (got {center})"
        );
        assert_eq!(params.y_offset, 80);
    }

    #[test]
    fn bgr_input_is_converted_to_rgb_planes() {
        // A pure-blue BGR image: B=255, G=0, R=0.
        let mut pixels = Vec::new();
        for _ in 0..4 * 4 {
            pixels.extend_from_slice(&[255, 0, 0]);
        }
        let frame = Frame {
            pixels: &pixels,
            width: 4,
            height: 4,
            format: ColorFormat::Bgr,
        };
        let mut letterbox = Letterbox::new((4, 4));

        let (tensor, _) = letterbox.forward(&frame).expect("letterbox should succeed");

        assert_eq!(tensor[[0, 0, 2, 2]], 0.0, "R plane should be empty");
        assert_eq!(tensor[[0, 1, 2, 2]], 0.0, "G plane should be empty");
        assert_eq!(tensor[[0, 2, 2, 2]], 1.0, "B plane should carry the signal");
    }

    #[test]
    fn inverse_recovers_forward_mapped_corners() {
        let pixels = vec![128u8; 1280 * 720 * 3];
        let mut letterbox = Letterbox::new((640, 640));

        let (_, params) = letterbox
            .forward(&gray_frame(&pixels, 1280, 720))
            .expect("letterbox should succeed");

        for (x, y) in [(0.0f32, 0.0f32), (1280.0, 0.0), (0.0, 720.0), (1280.0, 720.0)] {
            let model_x = x * params.scale + params.x_offset as f32;
            let model_y = y * params.scale + params.y_offset as f32;
            let (back_x, back_y) = params.inverse(model_x, model_y);
            assert!(
                (back_x - x).abs() < 1e-3 && (back_y - y).abs() < 1e-3,
                "corner ({x},{y}) came back as ({back_x},{back_y})"
            );
        }
    }

    #[test]
    fn zero_area_image_is_rejected() {
        let mut letterbox = Letterbox::new((640, 640));

        let result = letterbox.forward(&gray_frame(&[], 0, 480));

        assert!(matches!(result, Err(DetectError::InvalidInput { .. })));
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let pixels = vec![0u8; 100];
        let mut letterbox = Letterbox::new((640, 640));

        let result = letterbox.forward(&gray_frame(&pixels, 10, 10));

        assert!(matches!(result, Err(DetectError::InvalidInput { .. })));
    }

    #[test]
    fn square_image_at_target_size_is_identity_geometry() {
        let pixels = vec![100u8; 640 * 640 * 3];
        let mut letterbox = Letterbox::new((640, 640));

        let (_, params) = letterbox
            .forward(&gray_frame(&pixels, 640, 640))
            .expect("letterbox should succeed");

        assert_eq!(params.scale, 1.0);
        assert_eq!(params.x_offset, 0);
        assert_eq!(params.y_offset, 0);
    }
}
