use oneclass_data::DataError;

/// Errors from re-partitioning and dataset preparation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure in the data layer (I/O, parsing, shape or length mismatch).
    #[error(transparent)]
    Data(#[from] DataError),

    /// The abnormal-sampling proportion lies outside `[0, 1]`.
    #[error("proportion must lie in [0, 1], got {0}")]
    InvalidProportion(f64),

    /// The requested class is not known to the dataset.
    #[error("unknown class {class:?} for dataset {dataset}")]
    UnknownClass { dataset: String, class: String },

    /// An option value that no dataset can be prepared with.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// The dataset needs a reader that was compiled out.
    #[error("dataset {0} requires the `image-folder` feature")]
    FeatureDisabled(String),
}

pub type Result<T> = std::result::Result<T, Error>;
