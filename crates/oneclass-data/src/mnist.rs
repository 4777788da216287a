// MNIST dataset — IDX file format parser
//
// The MNIST database consists of 4 files:
//   - train-images-idx3-ubyte  (60,000  28×28 images)
//   - train-labels-idx1-ubyte  (60,000  labels 0-9)
//   - t10k-images-idx3-ubyte   (10,000  28×28 images)
//   - t10k-labels-idx1-ubyte   (10,000  labels 0-9)
//
// IDX format (all values big-endian):
//   images: magic(2051) | count(u32) | rows(u32) | cols(u32) | pixel_data(u8...)
//   labels: magic(2049) | count(u32) | label_data(u8...)
//
// Gzip-compressed files (.gz) are decompressed on the fly.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::dataset::{Dataset, Sample, Split};
use crate::error::{DataError, Result};
use crate::images::{ImageTensor, LabeledImageSet};

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// A loaded MNIST split stored in memory as one contiguous pixel buffer.
#[derive(Debug, Clone)]
pub struct MnistDataset {
    pixels: Vec<u8>,
    labels: Vec<u8>,
    rows: usize,
    cols: usize,
    split: Split,
}

impl MnistDataset {
    /// Load MNIST from the given directory.
    ///
    /// Expects the standard filenames (or `.gz` compressed versions):
    ///   - `train-images-idx3-ubyte` / `train-images-idx3-ubyte.gz`
    ///   - `train-labels-idx1-ubyte` / `train-labels-idx1-ubyte.gz`
    ///   - `t10k-images-idx3-ubyte`  / `t10k-images-idx3-ubyte.gz`
    ///   - `t10k-labels-idx1-ubyte`  / `t10k-labels-idx1-ubyte.gz`
    ///
    /// torchvision's `MNIST/raw/` subdirectory is also searched.
    pub fn load(dir: impl AsRef<Path>, split: Split) -> Result<Self> {
        let dir = dir.as_ref();
        let dir = if !has_mnist_files(dir) && has_mnist_files(&dir.join("MNIST").join("raw")) {
            dir.join("MNIST").join("raw")
        } else {
            dir.to_path_buf()
        };

        let (img_name, lbl_name) = file_names(split);
        let img_bytes = read_maybe_gz(&dir, img_name)?;
        let lbl_bytes = read_maybe_gz(&dir, lbl_name)?;

        let ds = Self::from_raw(&img_bytes, &lbl_bytes, split)?;
        tracing::info!(
            split = %split,
            samples = ds.num_samples(),
            dir = %dir.display(),
            "loaded MNIST"
        );
        Ok(ds)
    }

    /// Load from raw bytes (useful for embedded/testing).
    pub fn from_raw(image_bytes: &[u8], label_bytes: &[u8], split: Split) -> Result<Self> {
        let (pixels, count, rows, cols) = parse_idx3_images(image_bytes)?;
        let labels = parse_idx1_labels(label_bytes)?;

        if count != labels.len() {
            return Err(DataError::LengthMismatch {
                images: count,
                labels: labels.len(),
            });
        }

        Ok(Self {
            pixels,
            labels,
            rows,
            cols,
            split,
        })
    }

    /// Total number of samples.
    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    /// Image dimensions: (rows, cols).
    pub fn image_dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Get the raw pixel values for sample `i`.
    pub fn image_u8(&self, i: usize) -> &[u8] {
        let n = self.rows * self.cols;
        &self.pixels[i * n..(i + 1) * n]
    }

    /// Get the label for sample `i`.
    pub fn label(&self, i: usize) -> u8 {
        self.labels[i]
    }

    /// Which split this dataset represents.
    pub fn split(&self) -> Split {
        self.split
    }

    /// Convert into a tensor-backed labeled image set of shape `[N, 1, rows, cols]`.
    pub fn into_image_set(self) -> Result<LabeledImageSet<ImageTensor>> {
        let name = self.name().to_string();
        let n = self.labels.len();
        let images = ImageTensor::from_vec(self.pixels, n, &[1, self.rows, self.cols])?;
        let labels = self.labels.into_iter().map(usize::from).collect();
        Ok(LabeledImageSet::new(images, labels)?.with_name(name))
    }
}

impl Dataset for MnistDataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Sample {
        Sample {
            features: self.image_u8(index).iter().map(|&p| p as f64).collect(),
            feature_shape: vec![1, self.rows, self.cols],
            target: vec![self.labels[index] as f64],
            target_shape: vec![1],
        }
    }

    fn name(&self) -> &str {
        match self.split {
            Split::Train => "MNIST-train",
            Split::Test => "MNIST-test",
        }
    }
}

// IDX file format parsing

fn file_names(split: Split) -> (&'static str, &'static str) {
    match split {
        Split::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
        Split::Test => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
    }
}

fn has_mnist_files(dir: &Path) -> bool {
    let (img, _) = file_names(Split::Train);
    dir.join(img).exists() || dir.join(format!("{img}.gz")).exists()
}

/// Read a file, trying plain first then `.gz` extension.
fn read_maybe_gz(dir: &Path, base_name: &str) -> Result<Vec<u8>> {
    let plain = dir.join(base_name);
    let gz = dir.join(format!("{base_name}.gz"));

    if plain.exists() {
        Ok(fs::read(&plain)?)
    } else if gz.exists() {
        let mut decoder = GzDecoder::new(fs::File::open(&gz)?);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    } else {
        Err(DataError::MissingFile(plain))
    }
}

/// Parse an IDX3 file (images): magic=2051, count, rows, cols, data.
///
/// Returns the pixel buffer (exactly `count * rows * cols` bytes), count, rows, cols.
fn parse_idx3_images(data: &[u8]) -> Result<(Vec<u8>, usize, usize, usize)> {
    if data.len() < 16 {
        return Err(DataError::truncated("IDX3 file too short"));
    }

    let magic = read_u32_be(data, 0);
    if magic != IMAGES_MAGIC {
        return Err(DataError::InvalidMagic {
            expected: IMAGES_MAGIC,
            got: magic,
        });
    }

    let count = read_u32_be(data, 4) as usize;
    let rows = read_u32_be(data, 8) as usize;
    let cols = read_u32_be(data, 12) as usize;

    let expected_len = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .and_then(|n| n.checked_add(16))
        .ok_or_else(|| {
            DataError::truncated(format!(
                "IDX3 header claims {count} images of {rows}x{cols}, which overflows"
            ))
        })?;
    if data.len() < expected_len {
        return Err(DataError::truncated(format!(
            "IDX3 expected {expected_len} bytes, got {}",
            data.len()
        )));
    }

    Ok((data[16..expected_len].to_vec(), count, rows, cols))
}

/// Parse an IDX1 file (labels): magic=2049, count, data.
fn parse_idx1_labels(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 8 {
        return Err(DataError::truncated("IDX1 file too short"));
    }

    let magic = read_u32_be(data, 0);
    if magic != LABELS_MAGIC {
        return Err(DataError::InvalidMagic {
            expected: LABELS_MAGIC,
            got: magic,
        });
    }

    let count = read_u32_be(data, 4) as usize;
    let expected_len = 8 + count;
    if data.len() < expected_len {
        return Err(DataError::truncated(format!(
            "IDX1 expected {expected_len} bytes, got {}",
            data.len()
        )));
    }

    Ok(data[8..expected_len].to_vec())
}

/// Read a big-endian u32 from `data` at byte offset `off`.
fn read_u32_be(data: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

// Builder helpers

/// Build IDX3 image bytes from raw image data (useful for tests).
pub fn build_idx3_bytes(images: &[&[u8]], rows: u32, cols: u32) -> Vec<u8> {
    let count = images.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&rows.to_be_bytes());
    buf.extend_from_slice(&cols.to_be_bytes());
    for img in images {
        buf.extend_from_slice(img);
    }
    buf
}

/// Build IDX1 label bytes (useful for tests).
pub fn build_idx1_bytes(labels: &[u8]) -> Vec<u8> {
    let count = labels.len() as u32;
    let mut buf = Vec::new();
    buf.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(labels);
    buf
}
