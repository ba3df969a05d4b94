use thiserror::Error;

/// Errors surfaced by file IO and the segmentation oracle.
///
/// Editing no-ops (clicks outside the image, no active label, empty undo
/// history) are not errors and never produce one of these.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to decode mask file: {0}")]
    MaskDecode(#[from] png::DecodingError),

    #[error("failed to encode mask file: {0}")]
    MaskEncode(#[from] png::EncodingError),

    #[error("unsupported mask file: {0}")]
    UnsupportedMask(String),

    #[error("no image is loaded")]
    NoImage,

    #[error("segmentation oracle is not ready")]
    OracleNotReady,

    #[error("segmentation oracle failed: {0}")]
    Oracle(String),

    #[error("oracle mask is {got_w}x{got_h}, raster is {want_w}x{want_h}")]
    MaskSizeMismatch {
        got_w: usize,
        got_h: usize,
        want_w: usize,
        want_h: usize,
    },
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
