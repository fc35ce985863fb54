//! Image transcoding - bounds the fetched image to a size- and
//! quality-limited JPEG
//!
//! Decodes with format auto-detection, resizes preserving aspect ratio so
//! neither dimension exceeds the configured maximum, and re-encodes as JPEG.
//! The stage is optional: `PassThrough` serves the source bytes unmodified
//! behind the same interface.
//!
//! Uses `spawn_blocking` for the CPU-intensive work to avoid blocking the
//! async runtime.

use crate::error::TranscodeError;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Transcoded payload plus the content type it should be served with
#[derive(Debug, Clone)]
pub struct TranscodedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Transcoding stage of the pipeline
pub trait Transcoder: Send + Sync {
    /// Transform the fetched bytes into the payload to serve.
    /// `source_content_type` is the content type the upstream reported.
    fn transcode(
        &self,
        input: &[u8],
        source_content_type: Option<&str>,
    ) -> Result<TranscodedImage, TranscodeError>;

    /// Content type attributed to payloads read back from the binary cache,
    /// where the upstream content type is no longer known
    fn cached_content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Transcode variant: decode, shrink, re-encode as JPEG
#[derive(Clone, Debug)]
pub struct JpegShrinker {
    /// Maximum dimension (width or height) in pixels
    max_dimension: u32,
    /// JPEG quality (0-100)
    quality: u8,
}

impl JpegShrinker {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension,
            quality,
        }
    }

    /// Shrink the input so neither dimension exceeds the maximum and encode
    /// as JPEG. Images already within bounds are re-encoded without resizing.
    pub fn shrink(&self, input: &[u8]) -> Result<Bytes, TranscodeError> {
        let img = image::load_from_memory(input).map_err(TranscodeError::Decode)?;

        let (orig_w, orig_h) = img.dimensions();
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            "processing image"
        );

        let bounded = if orig_w <= self.max_dimension && orig_h <= self.max_dimension {
            img
        } else {
            img.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        };

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(bounded.to_rgb8());

        self.encode_jpeg(&rgb)
    }

    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Bytes, TranscodeError> {
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);

        img.write_to(&mut cursor, ImageOutputFormat::Jpeg(self.quality))
            .map_err(TranscodeError::Encode)?;

        Ok(Bytes::from(buf))
    }
}

impl Transcoder for JpegShrinker {
    fn transcode(
        &self,
        input: &[u8],
        _source_content_type: Option<&str>,
    ) -> Result<TranscodedImage, TranscodeError> {
        let bytes = self.shrink(input)?;
        debug!(size = bytes.len(), "image transcoded");

        Ok(TranscodedImage {
            bytes,
            content_type: "image/jpeg".to_string(),
        })
    }
}

/// Pass-through variant: source bytes are served unmodified with the
/// upstream content type
pub struct PassThrough;

impl Transcoder for PassThrough {
    fn transcode(
        &self,
        input: &[u8],
        source_content_type: Option<&str>,
    ) -> Result<TranscodedImage, TranscodeError> {
        Ok(TranscodedImage {
            bytes: Bytes::copy_from_slice(input),
            content_type: source_content_type.unwrap_or("image/jpeg").to_string(),
        })
    }
}

/// Run a transcoder on a dedicated blocking thread
pub async fn transcode_async(
    transcoder: Arc<dyn Transcoder>,
    input: Bytes,
    source_content_type: Option<String>,
) -> Result<TranscodedImage, TranscodeError> {
    let handle = tokio::task::spawn_blocking(move || {
        transcoder.transcode(&input, source_content_type.as_deref())
    });

    match handle.await {
        Ok(result) => result,
        Err(err) => Err(TranscodeError::Decode(image::ImageError::IoError(
            std::io::Error::new(std::io::ErrorKind::Other, format!("task panicked: {err}")),
        ))),
    }
}
