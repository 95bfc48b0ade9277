//! Lossless layer snapshots as PNG data URLs, and the asynchronous decoder
//! used to bring them back.

use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture, FutureExt};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pixel_buffer::PixelBuffer;

const PNG_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("not a PNG data URL")]
    InvalidDataUrl,

    #[error("bad base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("decode was cancelled")]
    Cancelled,
}

/// A PNG-encoded image carried as a `data:image/png;base64,...` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Encode to a PNG data URL.
pub fn encode_png(buffer: &PixelBuffer) -> Result<EncodedImage, CodecError> {
    let bytes = encode_bytes(buffer, ImageFormat::Png)?;
    let mut url = String::with_capacity(PNG_PREFIX.len() + bytes.len() * 4 / 3 + 4);
    url.push_str(PNG_PREFIX);
    STANDARD.encode_string(&bytes, &mut url);
    Ok(EncodedImage(url))
}

/// Encode to raw file bytes. JPEG output drops the alpha channel.
pub fn encode_bytes(buffer: &PixelBuffer, format: ImageFormat) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(buffer.as_image().clone()).into_rgb8();
            rgb.write_to(&mut Cursor::new(&mut bytes), format)?;
        }
        _ => buffer.as_image().write_to(&mut Cursor::new(&mut bytes), format)?,
    }
    Ok(bytes)
}

/// Decode a PNG data URL synchronously.
pub fn decode_data_url(image: &EncodedImage) -> Result<PixelBuffer, CodecError> {
    let payload = image
        .as_str()
        .strip_prefix(PNG_PREFIX)
        .ok_or(CodecError::InvalidDataUrl)?;
    let bytes = STANDARD.decode(payload.trim())?;
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?;
    Ok(PixelBuffer::from_image(decoded.into_rgba8()))
}

/// A pending decode that resolves to pixels, or fails.
///
/// Cancelling resolves the handle with [`CodecError::Cancelled`].
pub struct DecodeHandle {
    inner: Abortable<BoxFuture<'static, Result<PixelBuffer, CodecError>>>,
    abort: AbortHandle,
}

impl std::fmt::Debug for DecodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeHandle")
            .field("cancelled", &self.abort.is_aborted())
            .finish()
    }
}

impl DecodeHandle {
    pub fn new(future: BoxFuture<'static, Result<PixelBuffer, CodecError>>) -> Self {
        let (abort, registration) = AbortHandle::new_pair();
        Self {
            inner: Abortable::new(future, registration),
            abort,
        }
    }

    /// A handle that is already resolved.
    pub fn ready(result: Result<PixelBuffer, CodecError>) -> Self {
        Self::new(futures::future::ready(result).boxed())
    }

    pub fn cancel(&self) {
        self.abort.abort();
    }
}

impl Future for DecodeHandle {
    type Output = Result<PixelBuffer, CodecError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|result| match result {
            Ok(decoded) => decoded,
            Err(Aborted) => Err(CodecError::Cancelled),
        })
    }
}

/// Source of asynchronous snapshot decodes.
pub trait ImageDecoder: Send + Sync {
    fn submit(&self, image: &EncodedImage) -> DecodeHandle;
}

/// Decodes PNG data URLs in-process. The decode runs when the handle is first polled.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngDecoder;

impl ImageDecoder for PngDecoder {
    fn submit(&self, image: &EncodedImage) -> DecodeHandle {
        let image = image.clone();
        DecodeHandle::new(async move { decode_data_url(&image) }.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn sample() -> PixelBuffer {
        let mut buf = PixelBuffer::new(3, 2);
        buf.set(0, 0, [255, 0, 0, 255]);
        buf.set(2, 1, [1, 2, 3, 4]);
        buf
    }

    #[test]
    fn test_png_data_url_is_lossless() {
        let encoded = encode_png(&sample()).unwrap();
        assert!(encoded.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&encoded).unwrap(), sample());
    }

    #[test]
    fn test_rejects_foreign_data_url() {
        let bogus = EncodedImage::from_data_url("data:text/plain;base64,aGk=");
        assert!(matches!(decode_data_url(&bogus), Err(CodecError::InvalidDataUrl)));
        let broken = EncodedImage::from_data_url("data:image/png;base64,@@@");
        assert!(decode_data_url(&broken).is_err());
    }

    #[test]
    fn test_async_decoder() {
        let encoded = encode_png(&sample()).unwrap();
        let decoded = block_on(PngDecoder.submit(&encoded)).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_cancelled_handle() {
        let encoded = encode_png(&sample()).unwrap();
        let handle = PngDecoder.submit(&encoded);
        handle.cancel();
        assert!(matches!(block_on(handle), Err(CodecError::Cancelled)));
    }

    #[test]
    fn test_jpeg_export() {
        let bytes = encode_bytes(&sample(), ImageFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
