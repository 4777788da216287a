//! # oneclass
//!
//! One-class anomaly-detection splits over labeled image datasets.
//!
//! A multi-class train/test pair is re-partitioned so that training holds
//! only "normal" samples (label 0) and testing holds normal samples plus
//! "abnormal" ones (label 1):
//!
//! ```ignore
//! use oneclass::{repartition, AnomalySplit};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let split = AnomalySplit::class_is_abnormal(1);
//! let derived = repartition(&train, &test, &split, &mut StdRng::seed_from_u64(0))?;
//! println!("{}", derived.summary());
//! ```
//!
//! [`load_data`] wires this to the MNIST, CIFAR-10 and image-folder readers
//! of `oneclass-data` and returns ready-to-iterate [`DataLoader`]s.
//!
//! [`DataLoader`]: oneclass_data::DataLoader

pub mod anomaly;
pub mod error;
pub mod loader;
pub mod logging;
pub mod options;

pub use anomaly::{
    repartition, AnomalyDataset, AnomalySplit, Policy, SplitSummary, ABNORMAL, NORMAL,
};
pub use error::{Error, Result};
pub use loader::{load_data, PreparedData};
pub use options::{DatasetKind, Options};

pub use oneclass_data as data;
