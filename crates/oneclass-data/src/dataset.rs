// Dataset trait — unified interface for any labeled image source

use std::fmt;

/// A single sample: a pair of (image features, label/target).
///
/// Both are stored flattened as `Vec<f64>` with their shapes so the loader
/// can stack them into batches. Images use `[C, H, W]` layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Pixel values (flattened, channel-first).
    pub features: Vec<f64>,
    /// Shape of one image, e.g. `[1, 28, 28]` for MNIST or `[3, 32, 32]` for CIFAR-10.
    pub feature_shape: Vec<usize>,
    /// Target value(s). For classification and anomaly labels this is a
    /// single-element vec holding the class id as `f64`.
    pub target: Vec<f64>,
    /// Shape of the target (`[1]` for a class id).
    pub target_shape: Vec<usize>,
}

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so the loader can fetch from several
/// threads when `num_workers > 0`.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// # Panics
    /// May panic if `index >= self.len()`.
    fn get(&self, index: usize) -> Sample;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Which partition of a dataset a reader should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// Directory / display name of the split.
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
