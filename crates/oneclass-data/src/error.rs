use std::path::PathBuf;

/// All errors produced by the data layer.
///
/// Readers, image containers and the batching loader share this one type so
/// callers can propagate failures with `?` regardless of where they came from.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An IDX file started with the wrong magic number.
    #[error("invalid magic: expected {expected:#06x}, got {got:#06x}")]
    InvalidMagic { expected: u32, got: u32 },

    /// Image and label counts disagree.
    #[error("length mismatch: {images} images vs {labels} labels")]
    LengthMismatch { images: usize, labels: usize },

    /// A required dataset file does not exist (plain or `.gz`).
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A binary file is shorter than its header promises.
    #[error("truncated data: {0}")]
    Truncated(String),

    /// The ImageFolder root path is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// No class subdirectories under an ImageFolder root.
    #[error("no class subdirectories in {}", .0.display())]
    NoClasses(PathBuf),

    /// No image files under an ImageFolder root.
    #[error("no image files found in {}", .0.display())]
    NoImages(PathBuf),

    /// Image decoding failed.
    #[error("failed to decode {}: {1}", .0.display())]
    ImageDecode(PathBuf, String),

    /// Two images (or samples) that must agree on shape do not.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Concatenation was asked to join zero parts.
    #[error("cannot concatenate an empty list of image stores")]
    EmptyConcat,
}

impl DataError {
    pub(crate) fn truncated(msg: impl Into<String>) -> Self {
        DataError::Truncated(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DataError>;
