//! Dataset preparation options.
//!
//! [`Options`] doubles as the CLI argument group (flattened into the
//! `oneclass` binary) and as a plain config struct for library callers.

use std::fmt;
use std::path::PathBuf;

use clap::Args;

/// Which reader and anomaly policy `load_data` uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetKind {
    /// CIFAR-10, anomaly class given by name.
    Cifar10,
    /// MNIST, anomaly class given as a digit.
    Mnist,
    /// MNIST with the chosen digit as the only normal class.
    Mnist2,
    /// Any other name: an image folder with `train/` and `test/` subtrees.
    Folder(String),
}

impl DatasetKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "cifar10" => DatasetKind::Cifar10,
            "mnist" => DatasetKind::Mnist,
            "mnist2" => DatasetKind::Mnist2,
            other => DatasetKind::Folder(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DatasetKind::Cifar10 => "cifar10",
            DatasetKind::Mnist => "mnist",
            DatasetKind::Mnist2 => "mnist2",
            DatasetKind::Folder(name) => name,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Args)]
pub struct Options {
    /// Dataset name: cifar10, mnist, mnist2, or an image-folder name
    #[arg(long, default_value = "cifar10")]
    pub dataset: String,

    /// Dataset root directory (default: ./data/<dataset>)
    #[arg(long)]
    pub dataroot: Option<PathBuf>,

    /// Input image size
    #[arg(long = "isize", default_value_t = 32)]
    pub image_size: usize,

    /// Batch size
    #[arg(long = "batchsize", default_value_t = 64)]
    pub batch_size: usize,

    /// Number of parallel sample-fetch workers
    #[arg(long, default_value_t = 8)]
    pub workers: usize,

    /// Class treated as the anomaly (or, for mnist2, as the normal class)
    #[arg(long, default_value = "car")]
    pub anomaly_class: String,

    /// Share of abnormal test samples kept by mnist2, in [0, 1]
    #[arg(long, default_value_t = 0.1)]
    pub proportion: f64,

    /// Seed for the normal-pool reshuffle and every random draw
    #[arg(long = "manualseed")]
    pub manual_seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dataset: "cifar10".to_string(),
            dataroot: None,
            image_size: 32,
            batch_size: 64,
            workers: 8,
            anomaly_class: "car".to_string(),
            proportion: 0.1,
            manual_seed: None,
        }
    }
}

impl Options {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Self::default()
        }
    }

    pub fn dataroot(mut self, root: impl Into<PathBuf>) -> Self {
        self.dataroot = Some(root.into());
        self
    }

    pub fn image_size(mut self, size: usize) -> Self {
        self.image_size = size;
        self
    }

    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn anomaly_class(mut self, class: impl Into<String>) -> Self {
        self.anomaly_class = class.into();
        self
    }

    pub fn proportion(mut self, p: f64) -> Self {
        self.proportion = p;
        self
    }

    pub fn manual_seed(mut self, seed: u64) -> Self {
        self.manual_seed = Some(seed);
        self
    }

    pub fn kind(&self) -> DatasetKind {
        DatasetKind::parse(&self.dataset)
    }

    /// The data root, falling back to `./data/<dataset>` when unset.
    pub fn resolved_dataroot(&self) -> PathBuf {
        match &self.dataroot {
            Some(root) if !root.as_os_str().is_empty() => root.clone(),
            _ => PathBuf::from("./data").join(&self.dataset),
        }
    }
}
