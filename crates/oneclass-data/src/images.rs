// Image containers and labeled image sets
//
// Two interchangeable storage layouts:
//
//   ImageArray  — one owned pixel buffer per image (array-backed)
//   ImageTensor — one contiguous buffer of shape [N, C, H, W] (tensor-backed)
//
// Both implement `ImageStore`, so code that filters, selects and concatenates
// images is written once and behaves identically on either layout.

use crate::dataset::{Dataset, Sample};
use crate::error::{DataError, Result};

/// An ordered, index-addressable collection of equally shaped `u8` images.
pub trait ImageStore: Clone + Send + Sync {
    /// Number of images.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of a single image, `[C, H, W]`.
    fn item_shape(&self) -> &[usize];

    /// Raw pixels of image `index` in `[C, H, W]` order.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    fn pixels(&self, index: usize) -> &[u8];

    /// A new store holding the images at `indices`, in that order.
    ///
    /// # Panics
    /// Panics if any index is out of range.
    fn select(&self, indices: &[usize]) -> Self;

    /// Join stores end-to-end. All parts must share the same item shape.
    fn concat(parts: &[&Self]) -> Result<Self>;
}

fn check_item_shapes<'a>(mut shapes: impl Iterator<Item = &'a [usize]>) -> Result<Vec<usize>> {
    let first = shapes.next().ok_or(DataError::EmptyConcat)?.to_vec();
    for shape in shapes {
        if shape != first.as_slice() {
            return Err(DataError::ShapeMismatch {
                expected: first,
                got: shape.to_vec(),
            });
        }
    }
    Ok(first)
}

// ImageArray — array-backed storage

/// Array-backed image storage: each image owns its own buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArray {
    images: Vec<Vec<u8>>,
    item_shape: Vec<usize>,
}

impl ImageArray {
    /// Build from per-image buffers. Every buffer must hold exactly
    /// `item_shape.iter().product()` bytes.
    pub fn new(images: Vec<Vec<u8>>, item_shape: Vec<usize>) -> Result<Self> {
        let per_image: usize = item_shape.iter().product();
        if let Some(bad) = images.iter().find(|img| img.len() != per_image) {
            return Err(DataError::ShapeMismatch {
                expected: item_shape,
                got: vec![bad.len()],
            });
        }
        Ok(Self { images, item_shape })
    }
}

impl ImageStore for ImageArray {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn item_shape(&self) -> &[usize] {
        &self.item_shape
    }

    fn pixels(&self, index: usize) -> &[u8] {
        &self.images[index]
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self {
            images: indices.iter().map(|&i| self.images[i].clone()).collect(),
            item_shape: self.item_shape.clone(),
        }
    }

    fn concat(parts: &[&Self]) -> Result<Self> {
        let item_shape = check_item_shapes(parts.iter().map(|p| p.item_shape()))?;
        let total = parts.iter().map(|p| p.len()).sum();
        let mut images = Vec::with_capacity(total);
        for part in parts {
            images.extend(part.images.iter().cloned());
        }
        Ok(Self { images, item_shape })
    }
}

// ImageTensor — tensor-backed storage

/// Tensor-backed image storage: one contiguous buffer with shape `[N, C, H, W]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTensor {
    data: Vec<u8>,
    /// Full shape including the leading image dimension.
    shape: Vec<usize>,
}

impl ImageTensor {
    /// Build from a flat buffer holding `n` images of `item_shape`.
    pub fn from_vec(data: Vec<u8>, n: usize, item_shape: &[usize]) -> Result<Self> {
        let per_image: usize = item_shape.iter().product();
        if data.len() != n * per_image {
            let mut expected = vec![n];
            expected.extend_from_slice(item_shape);
            return Err(DataError::ShapeMismatch {
                expected,
                got: vec![data.len()],
            });
        }
        let mut shape = Vec::with_capacity(item_shape.len() + 1);
        shape.push(n);
        shape.extend_from_slice(item_shape);
        Ok(Self { data, shape })
    }

    /// Full shape, `[N, C, H, W]`.
    pub fn dims(&self) -> &[usize] {
        &self.shape
    }

    /// The whole pixel buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn stride(&self) -> usize {
        self.shape[1..].iter().product()
    }
}

impl ImageStore for ImageTensor {
    fn len(&self) -> usize {
        self.shape[0]
    }

    fn item_shape(&self) -> &[usize] {
        &self.shape[1..]
    }

    fn pixels(&self, index: usize) -> &[u8] {
        assert!(
            index < self.len(),
            "ImageTensor: index {index} out of range (len {})",
            self.len()
        );
        let stride = self.stride();
        &self.data[index * stride..(index + 1) * stride]
    }

    fn select(&self, indices: &[usize]) -> Self {
        let stride = self.stride();
        let mut data = Vec::with_capacity(indices.len() * stride);
        for &i in indices {
            data.extend_from_slice(self.pixels(i));
        }
        let mut shape = self.shape.clone();
        shape[0] = indices.len();
        Self { data, shape }
    }

    fn concat(parts: &[&Self]) -> Result<Self> {
        let item_shape = check_item_shapes(parts.iter().map(|p| p.item_shape()))?;
        let n: usize = parts.iter().map(|p| p.len()).sum();
        let mut data = Vec::with_capacity(parts.iter().map(|p| p.data.len()).sum());
        for part in parts {
            data.extend_from_slice(&part.data);
        }
        let mut shape = Vec::with_capacity(item_shape.len() + 1);
        shape.push(n);
        shape.extend(item_shape);
        Ok(Self { data, shape })
    }
}

// LabeledImageSet — images paired with integer class ids

/// Images and their class labels, index-aligned.
///
/// The only way to build one is through [`LabeledImageSet::new`], which
/// rejects mismatched lengths, so `images.len() == labels.len()` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImageSet<S: ImageStore> {
    images: S,
    labels: Vec<usize>,
    name: String,
}

impl<S: ImageStore> LabeledImageSet<S> {
    pub fn new(images: S, labels: Vec<usize>) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(DataError::LengthMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        Ok(Self {
            images,
            labels,
            name: "images".to_string(),
        })
    }

    /// Attach a display name (used as the `Dataset` name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn images(&self) -> &S {
        &self.images
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Positions whose label satisfies `pred`, in ascending order.
    pub fn indices_where(&self, pred: impl Fn(usize) -> bool) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| pred(label))
            .map(|(i, _)| i)
            .collect()
    }

    /// A new set with the samples at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            images: self.images.select(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            name: self.name.clone(),
        }
    }

    /// This set with every label replaced by `label`.
    pub fn into_relabeled(mut self, label: usize) -> Self {
        self.labels.iter_mut().for_each(|l| *l = label);
        self
    }

    /// Join sets end-to-end; images and labels keep the same order.
    pub fn concat(parts: &[&Self]) -> Result<Self> {
        let stores: Vec<&S> = parts.iter().map(|p| &p.images).collect();
        let images = S::concat(&stores)?;
        let labels: Vec<usize> = parts.iter().flat_map(|p| p.labels.iter().copied()).collect();
        let name = parts[0].name.clone();
        Ok(Self {
            images,
            labels,
            name,
        })
    }

    /// Number of samples carrying `label`.
    pub fn count_label(&self, label: usize) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }
}

impl<S: ImageStore> Dataset for LabeledImageSet<S> {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Sample {
        Sample {
            features: self.images.pixels(index).iter().map(|&p| p as f64).collect(),
            feature_shape: self.images.item_shape().to_vec(),
            target: vec![self.labels[index] as f64],
            target_shape: vec![1],
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(values: &[u8]) -> ImageArray {
        let images = values.iter().map(|&v| vec![v; 4]).collect();
        ImageArray::new(images, vec![1, 2, 2]).unwrap()
    }

    fn tensor(values: &[u8]) -> ImageTensor {
        let data = values.iter().flat_map(|&v| [v; 4]).collect();
        ImageTensor::from_vec(data, values.len(), &[1, 2, 2]).unwrap()
    }

    #[test]
    fn array_select_and_concat() {
        let a = array(&[10, 20, 30]);
        let sel = a.select(&[2, 0]);
        assert_eq!(sel.len(), 2);
        assert_eq!(sel.pixels(0), &[30; 4]);
        assert_eq!(sel.pixels(1), &[10; 4]);

        let joined = ImageArray::concat(&[&sel, &a]).unwrap();
        assert_eq!(joined.len(), 5);
        assert_eq!(joined.pixels(4), &[30; 4]);
    }

    #[test]
    fn tensor_select_and_concat() {
        let t = tensor(&[10, 20, 30]);
        assert_eq!(t.dims(), &[3, 1, 2, 2]);
        let sel = t.select(&[1]);
        assert_eq!(sel.dims(), &[1, 1, 2, 2]);
        assert_eq!(sel.pixels(0), &[20; 4]);

        let joined = ImageTensor::concat(&[&t, &sel]).unwrap();
        assert_eq!(joined.dims(), &[4, 1, 2, 2]);
        assert_eq!(joined.pixels(3), &[20; 4]);
    }

    #[test]
    fn select_empty_keeps_item_shape() {
        let t = tensor(&[1, 2]).select(&[]);
        assert!(t.is_empty());
        assert_eq!(t.item_shape(), &[1, 2, 2]);
        let a = array(&[1, 2]).select(&[]);
        assert_eq!(a.item_shape(), &[1, 2, 2]);
    }

    #[test]
    fn concat_rejects_shape_mismatch() {
        let a = array(&[1]);
        let b = ImageArray::new(vec![vec![0; 3]], vec![3, 1, 1]).unwrap();
        let err = ImageArray::concat(&[&a, &b]).unwrap_err();
        assert!(matches!(err, DataError::ShapeMismatch { .. }));
    }

    #[test]
    fn concat_of_nothing_fails() {
        let err = ImageTensor::concat(&[]).unwrap_err();
        assert!(matches!(err, DataError::EmptyConcat));
    }

    #[test]
    fn array_rejects_wrong_buffer_size() {
        let err = ImageArray::new(vec![vec![0; 5]], vec![1, 2, 2]).unwrap_err();
        assert!(matches!(err, DataError::ShapeMismatch { .. }));
    }

    #[test]
    fn labeled_set_requires_aligned_lengths() {
        let err = LabeledImageSet::new(array(&[1, 2]), vec![0]).unwrap_err();
        assert!(matches!(
            err,
            DataError::LengthMismatch {
                images: 2,
                labels: 1
            }
        ));
    }

    #[test]
    fn labeled_set_filter_select_relabel() {
        let set = LabeledImageSet::new(tensor(&[1, 2, 3, 4]), vec![0, 1, 0, 2]).unwrap();
        let idx = set.indices_where(|l| l != 1);
        assert_eq!(idx, vec![0, 2, 3]);

        let sub = set.select(&idx).into_relabeled(0);
        assert_eq!(sub.labels(), &[0, 0, 0]);
        assert_eq!(sub.images().pixels(2), &[4; 4]);
        // source untouched
        assert_eq!(set.labels(), &[0, 1, 0, 2]);
    }

    #[test]
    fn labeled_set_as_dataset() {
        let set = LabeledImageSet::new(array(&[7, 9]), vec![3, 5])
            .unwrap()
            .with_name("toy");
        assert_eq!(Dataset::len(&set), 2);
        assert_eq!(set.name(), "toy");
        let s = set.get(1);
        assert_eq!(s.features, vec![9.0; 4]);
        assert_eq!(s.feature_shape, vec![1, 2, 2]);
        assert_eq!(s.target, vec![5.0]);
    }
}
