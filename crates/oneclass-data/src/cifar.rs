// CIFAR-10 dataset — binary batch format
//
// The binary distribution ships six files of 10,000 records each:
//   - data_batch_1.bin … data_batch_5.bin  (train, 50,000 images)
//   - test_batch.bin                       (test,  10,000 images)
//
// Record layout (3073 bytes):
//   label(u8) | red(1024) | green(1024) | blue(1024)
//
// Each colour plane is a 32×32 row-major image, so a record's pixel bytes are
// already in [C, H, W] order.

use std::fs;
use std::path::Path;

use crate::dataset::{Dataset, Sample, Split};
use crate::error::{DataError, Result};
use crate::images::{ImageArray, LabeledImageSet};

pub const CIFAR10_WIDTH: usize = 32;
pub const CIFAR10_HEIGHT: usize = 32;
pub const CIFAR10_CHANNELS: usize = 3;
const IMAGE_BYTES: usize = CIFAR10_CHANNELS * CIFAR10_HEIGHT * CIFAR10_WIDTH;
const RECORD_BYTES: usize = 1 + IMAGE_BYTES;

/// Short class names in label order.
pub const CIFAR10_CLASSES: [&str; 10] = [
    "plane", "car", "bird", "cat", "deer", "dog", "frog", "horse", "ship", "truck",
];

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILES: [&str; 1] = ["test_batch.bin"];

/// Index of a CIFAR-10 class given its short name (`"car"` → 1).
pub fn cifar10_class_index(name: &str) -> Option<usize> {
    CIFAR10_CLASSES.iter().position(|&c| c == name)
}

/// A loaded CIFAR-10 split, one pixel buffer per image.
#[derive(Debug, Clone)]
pub struct Cifar10Dataset {
    images: Vec<Vec<u8>>,
    labels: Vec<u8>,
    split: Split,
}

impl Cifar10Dataset {
    /// Load a split from `dir`, also searching the `cifar-10-batches-bin/`
    /// subdirectory produced by extracting the official archive.
    pub fn load(dir: impl AsRef<Path>, split: Split) -> Result<Self> {
        let dir = dir.as_ref();
        let nested = dir.join("cifar-10-batches-bin");
        let dir = if !dir.join(TEST_FILES[0]).exists() && nested.join(TEST_FILES[0]).exists() {
            nested
        } else {
            dir.to_path_buf()
        };

        let files: &[&str] = match split {
            Split::Train => &TRAIN_FILES,
            Split::Test => &TEST_FILES,
        };

        let mut images = Vec::new();
        let mut labels = Vec::new();
        for file in files {
            let path = dir.join(file);
            if !path.exists() {
                return Err(DataError::MissingFile(path));
            }
            let bytes = fs::read(&path)?;
            let (imgs, lbls) = parse_records(&bytes)?;
            images.extend(imgs);
            labels.extend(lbls);
        }

        tracing::info!(
            split = %split,
            samples = labels.len(),
            dir = %dir.display(),
            "loaded CIFAR-10"
        );
        Ok(Self {
            images,
            labels,
            split,
        })
    }

    /// Parse an in-memory batch file.
    pub fn from_raw(bytes: &[u8], split: Split) -> Result<Self> {
        let (images, labels) = parse_records(bytes)?;
        Ok(Self {
            images,
            labels,
            split,
        })
    }

    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn label(&self, i: usize) -> u8 {
        self.labels[i]
    }

    pub fn split(&self) -> Split {
        self.split
    }

    /// Convert into an array-backed labeled image set with item shape `[3, 32, 32]`.
    pub fn into_image_set(self) -> Result<LabeledImageSet<ImageArray>> {
        let name = self.name().to_string();
        let images = ImageArray::new(
            self.images,
            vec![CIFAR10_CHANNELS, CIFAR10_HEIGHT, CIFAR10_WIDTH],
        )?;
        let labels = self.labels.into_iter().map(usize::from).collect();
        Ok(LabeledImageSet::new(images, labels)?.with_name(name))
    }
}

impl Dataset for Cifar10Dataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Sample {
        Sample {
            features: self.images[index].iter().map(|&p| p as f64).collect(),
            feature_shape: vec![CIFAR10_CHANNELS, CIFAR10_HEIGHT, CIFAR10_WIDTH],
            target: vec![self.labels[index] as f64],
            target_shape: vec![1],
        }
    }

    fn name(&self) -> &str {
        match self.split {
            Split::Train => "CIFAR10-train",
            Split::Test => "CIFAR10-test",
        }
    }
}

fn parse_records(bytes: &[u8]) -> Result<(Vec<Vec<u8>>, Vec<u8>)> {
    if bytes.len() % RECORD_BYTES != 0 {
        return Err(DataError::truncated(format!(
            "CIFAR-10 batch of {} bytes is not a multiple of the {RECORD_BYTES}-byte record",
            bytes.len()
        )));
    }
    let n = bytes.len() / RECORD_BYTES;
    let mut images = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for record in bytes.chunks_exact(RECORD_BYTES) {
        labels.push(record[0]);
        images.push(record[1..].to_vec());
    }
    Ok((images, labels))
}

/// Build a CIFAR-10 binary record stream (useful for tests).
///
/// Each image must hold `3 * 32 * 32` bytes in `[C, H, W]` order.
pub fn build_cifar10_bytes(records: &[(u8, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records.len() * RECORD_BYTES);
    for (label, pixels) in records {
        assert_eq!(pixels.len(), IMAGE_BYTES, "CIFAR-10 image must be 3x32x32");
        buf.push(*label);
        buf.extend_from_slice(pixels);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageStore;

    #[test]
    fn class_lookup() {
        assert_eq!(cifar10_class_index("plane"), Some(0));
        assert_eq!(cifar10_class_index("car"), Some(1));
        assert_eq!(cifar10_class_index("truck"), Some(9));
        assert_eq!(cifar10_class_index("airplane"), None);
    }

    #[test]
    fn parse_two_records() {
        let a = vec![1u8; IMAGE_BYTES];
        let b = vec![2u8; IMAGE_BYTES];
        let bytes = build_cifar10_bytes(&[(3, &a[..]), (8, &b[..])]);
        let ds = Cifar10Dataset::from_raw(&bytes, Split::Test).unwrap();
        assert_eq!(ds.num_samples(), 2);
        assert_eq!(ds.label(1), 8);
        assert_eq!(ds.name(), "CIFAR10-test");
        assert_eq!(ds.split(), Split::Test);

        let s = ds.get(0);
        assert_eq!(s.feature_shape, vec![3, 32, 32]);
        assert_eq!(s.target, vec![3.0]);
    }

    #[test]
    fn reject_partial_record() {
        let bytes = vec![0u8; RECORD_BYTES + 10];
        let err = Cifar10Dataset::from_raw(&bytes, Split::Train).unwrap_err();
        assert!(matches!(err, DataError::Truncated(_)));
    }

    #[test]
    fn into_image_set_keeps_order() {
        let a = vec![10u8; IMAGE_BYTES];
        let b = vec![20u8; IMAGE_BYTES];
        let bytes = build_cifar10_bytes(&[(5, &a[..]), (1, &b[..])]);
        let set = Cifar10Dataset::from_raw(&bytes, Split::Train)
            .unwrap()
            .into_image_set()
            .unwrap();
        assert_eq!(set.labels(), &[5, 1]);
        assert_eq!(set.images().item_shape(), &[3, 32, 32]);
        assert_eq!(set.images().pixels(1)[0], 20);
    }
}
