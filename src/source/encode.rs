use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb};

use crate::source::adapter::FrameSource;
use crate::source::error::{Result, SourceError};
use crate::source::frame::Frame;

/// A still image captured from the stream, JPEG-encoded.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl EncodedImage {
    /// Raw JPEG bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Render as a `data:image/jpeg;base64,...` URL for direct embedding.
    pub fn to_data_url(&self) -> String {
        let encoded =
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &self.bytes);
        format!("data:image/jpeg;base64,{encoded}")
    }
}

/// Compress a raw RGB frame to JPEG at the given quality (1-100).
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<EncodedImage> {
    let img: ImageBuffer<Rgb<u8>, _> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.data.as_slice()).ok_or_else(
            || {
                SourceError::Encode(format!(
                    "buffer length {} does not match {}x{} RGB",
                    frame.data.len(),
                    frame.width,
                    frame.height
                ))
            },
        )?;

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| SourceError::Encode(e.to_string()))?;

    Ok(EncodedImage {
        bytes: buf,
        width: frame.width,
        height: frame.height,
    })
}

/// Capture the current frame as a JPEG still.
///
/// Returns `None` while the stream is not ready. Callable at any time the
/// stream is active, including immediately after stream start.
pub fn snapshot(source: &dyn FrameSource, quality: u8) -> Option<EncodedImage> {
    let frame = source.latest_frame()?;
    match encode_jpeg(&frame, quality) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!("snapshot encoding failed: {e}");
            None
        }
    }
}
