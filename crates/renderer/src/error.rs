//! Error types for raster encoding and decoding.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Pixel buffer of {len} bytes does not fit a {width}x{height} image")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("IDAT compression failed: {0}")]
    Compression(String),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Decode(err.to_string())
    }
}

impl From<rainbow_common::CommonError> for RenderError {
    fn from(err: rainbow_common::CommonError) -> Self {
        RenderError::Decode(err.to_string())
    }
}
