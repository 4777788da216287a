// DataLoader — batching, shuffling, iteration

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use rayon::prelude::*;

use crate::dataset::{Dataset, Sample};
use crate::error::{DataError, Result};
use crate::transform::Transform;

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of parallel workers for sample fetching (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs.max(1);
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// One stacked batch.
///
/// `features` has shape `[batch, ...feature_shape]`, `targets` has shape
/// `[batch, ...target_shape]`, both flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub features: Vec<f64>,
    pub feature_shape: Vec<usize>,
    pub targets: Vec<f64>,
    pub target_shape: Vec<usize>,
}

impl Batch {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.feature_shape.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Targets read back as integer class ids (first target element per sample).
    pub fn labels(&self) -> Vec<usize> {
        let per_sample: usize = self.target_shape[1..].iter().product();
        self.targets
            .chunks(per_sample.max(1))
            .map(|t| t[0] as usize)
            .collect()
    }

    fn stack(samples: &[Sample]) -> Result<Self> {
        let first = &samples[0];
        let mut features = Vec::with_capacity(samples.len() * first.features.len());
        let mut targets = Vec::with_capacity(samples.len() * first.target.len());

        for s in samples {
            if s.feature_shape != first.feature_shape {
                return Err(DataError::ShapeMismatch {
                    expected: first.feature_shape.clone(),
                    got: s.feature_shape.clone(),
                });
            }
            if s.target_shape != first.target_shape {
                return Err(DataError::ShapeMismatch {
                    expected: first.target_shape.clone(),
                    got: s.target_shape.clone(),
                });
            }
            features.extend_from_slice(&s.features);
            targets.extend_from_slice(&s.target);
        }

        let mut feature_shape = vec![samples.len()];
        feature_shape.extend_from_slice(&first.feature_shape);
        let mut target_shape = vec![samples.len()];
        target_shape.extend_from_slice(&first.target_shape);

        Ok(Self {
            features,
            feature_shape,
            targets,
            target_shape,
        })
    }
}

/// A DataLoader wraps a shared Dataset and produces stacked batches.
///
/// The dataset is held via `Arc<dyn Dataset>` so loaders can be returned from
/// the function that built the dataset and handed to other threads.
pub struct DataLoader {
    dataset: Arc<dyn Dataset>,
    config: DataLoaderConfig,
    transforms: Vec<Box<dyn Transform>>,
    indices: Vec<usize>,
    rng: StdRng,
}

impl DataLoader {
    /// Create a new DataLoader over a dataset.
    pub fn new(dataset: Arc<dyn Dataset>, config: DataLoaderConfig) -> Self {
        let indices: Vec<usize> = (0..dataset.len()).collect();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            dataset,
            config,
            transforms: Vec::new(),
            indices,
            rng,
        }
    }

    /// Add a transform to apply to each sample.
    pub fn with_transform(mut self, t: Box<dyn Transform>) -> Self {
        self.transforms.push(t);
        self
    }

    pub fn config(&self) -> &DataLoaderConfig {
        &self.config
    }

    pub fn dataset(&self) -> &dyn Dataset {
        &*self.dataset
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Reshuffle indices (called at the start of each epoch).
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            self.indices.shuffle(&mut self.rng);
        }
    }

    fn load(&self, index: usize) -> Sample {
        let mut s = self.dataset.get(index);
        for t in &self.transforms {
            s = t.apply(s);
        }
        s
    }

    /// Fetch a slice of samples, in parallel via rayon when workers are enabled.
    fn fetch_samples(&self, indices: &[usize]) -> Vec<Sample> {
        if self.config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| self.load(i)).collect()
        } else {
            indices.iter().map(|&i| self.load(i)).collect()
        }
    }

    fn batch_at(&self, batch_idx: usize) -> Result<Batch> {
        let bs = self.config.batch_size;
        let start = batch_idx * bs;
        let end = (start + bs).min(self.indices.len());
        let samples = self.fetch_samples(&self.indices[start..end]);
        Batch::stack(&samples)
    }

    /// Produce all batches for one epoch.
    pub fn epoch_batches(&mut self) -> Result<Vec<Batch>> {
        self.reshuffle();
        (0..self.num_batches()).map(|b| self.batch_at(b)).collect()
    }

    /// Iterate over batches one at a time (lower memory than `epoch_batches`).
    pub fn iter_batches(&mut self) -> BatchIterator<'_> {
        self.reshuffle();
        BatchIterator {
            num_batches: self.num_batches(),
            loader: self,
            batch_idx: 0,
        }
    }
}

/// Iterator that yields one batch at a time.
pub struct BatchIterator<'l> {
    loader: &'l DataLoader,
    batch_idx: usize,
    num_batches: usize,
}

impl Iterator for BatchIterator<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.batch_idx >= self.num_batches {
            return None;
        }
        let batch = self.loader.batch_at(self.batch_idx);
        self.batch_idx += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.num_batches - self.batch_idx;
        (left, Some(left))
    }
}
