//! # oneclass-data
//!
//! Datasets, image containers, transforms and batching for oneclass.
//!
//! This crate provides:
//! - [`Dataset`] trait — unified interface for any labeled image source
//! - [`ImageStore`] — image containers with an array-backed ([`ImageArray`])
//!   and a tensor-backed ([`ImageTensor`]) implementation
//! - [`LabeledImageSet`] — images paired with index-aligned class labels
//! - [`DataLoader`] — batching, shuffling, parallel sample fetching
//   - Transforms — Resize, ToUnitRange, Normalize
//   - Built-in datasets: MNIST (IDX format, optionally gzipped), CIFAR-10 (binary batches)
//   - ImageFolder (directory-based image classification dataset)

pub mod cifar;
pub mod dataset;
pub mod error;
pub mod image_folder;
pub mod images;
pub mod loader;
pub mod mnist;
pub mod transform;

pub use cifar::{cifar10_class_index, Cifar10Dataset, CIFAR10_CLASSES};
pub use dataset::{Dataset, Sample, Split};
pub use error::{DataError, Result};
pub use images::{ImageArray, ImageStore, ImageTensor, LabeledImageSet};
pub use loader::{Batch, DataLoader, DataLoaderConfig};
pub use mnist::MnistDataset;
pub use transform::{Normalize, Resize, ToUnitRange, Transform};

#[cfg(feature = "image-folder")]
pub use image_folder::{ImageFolder, ImageFolderBuilder};
