// ImageFolder — Directory-based image classification dataset
//
// Loads images from a directory structure where each subdirectory is a class:
//
//   root/
//     class_a/
//       img_001.png
//       img_002.jpg
//     class_b/
//       img_003.png
//       ...
//
// Class labels are assigned as sorted indices of subdirectory names.
//
// The dataset returns samples with:
//   - features: pixel values in [C, H, W] layout, normalised to [0, 1]
//   - feature_shape: [C, H, W]
//   - target: [class_index as f64]
//   - target_shape: [1]
//
// USAGE:
//
//   let ds = ImageFolder::new("data/faces/train")
//       .resize(64)
//       .center_crop(64)
//       .build()?;
//   println!("{} images, {} classes", ds.len(), ds.class_names().len());
//
// Requires the `image-folder` feature (which brings in the `image` crate).

#[cfg(feature = "image-folder")]
pub use inner::*;

#[cfg(feature = "image-folder")]
mod inner {
    use std::path::{Path, PathBuf};

    use image::imageops::FilterType;
    use image::{DynamicImage, GenericImageView};

    use crate::dataset::{Dataset, Sample};
    use crate::error::{DataError, Result};

    /// Decoded images are always RGB.
    const CHANNELS: usize = 3;

    /// Supported image extensions (case-insensitive).
    const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Builder for [`ImageFolder`].
    pub struct ImageFolderBuilder {
        root: PathBuf,
        resize: Option<u32>,
        center_crop: Option<u32>,
    }

    impl ImageFolderBuilder {
        /// Create a builder rooted at the given directory.
        pub fn new<P: AsRef<Path>>(root: P) -> Self {
            ImageFolderBuilder {
                root: root.as_ref().to_path_buf(),
                resize: None,
                center_crop: None,
            }
        }

        /// Resize so the shorter side equals `size` (aspect ratio kept, bilinear).
        pub fn resize(mut self, size: u32) -> Self {
            self.resize = Some(size);
            self
        }

        /// Crop the central `size × size` region after resizing.
        pub fn center_crop(mut self, size: u32) -> Self {
            self.center_crop = Some(size);
            self
        }

        /// Scan the directory tree and build the dataset.
        pub fn build(self) -> Result<ImageFolder> {
            ImageFolder::scan(self.root, self.resize, self.center_crop)
        }
    }

    /// A directory-based image classification dataset.
    #[derive(Debug)]
    pub struct ImageFolder {
        root: PathBuf,
        /// Sorted class names (subdirectory names).
        class_names: Vec<String>,
        /// Per-sample metadata: (path, class_index).
        entries: Vec<(PathBuf, usize)>,
        resize: Option<u32>,
        center_crop: Option<u32>,
    }

    impl ImageFolder {
        /// Convenience entry-point: `ImageFolder::new(root)` returns a builder.
        pub fn new<P: AsRef<Path>>(root: P) -> ImageFolderBuilder {
            ImageFolderBuilder::new(root)
        }

        fn scan(root: PathBuf, resize: Option<u32>, center_crop: Option<u32>) -> Result<Self> {
            if !root.is_dir() {
                return Err(DataError::NotADirectory(root));
            }

            let mut class_dirs: Vec<(String, PathBuf)> = Vec::new();
            for entry in std::fs::read_dir(&root)? {
                let path = entry?.path();
                if path.is_dir() {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        class_dirs.push((name.to_string(), path));
                    }
                }
            }
            class_dirs.sort_by(|a, b| a.0.cmp(&b.0));

            if class_dirs.is_empty() {
                return Err(DataError::NoClasses(root));
            }

            let class_names: Vec<String> = class_dirs.iter().map(|(n, _)| n.clone()).collect();

            let mut entries: Vec<(PathBuf, usize)> = Vec::new();
            for (class_idx, (_name, dir)) in class_dirs.iter().enumerate() {
                let mut paths: Vec<PathBuf> = Vec::new();
                Self::collect_images(dir, &mut paths);
                paths.sort();
                entries.extend(paths.into_iter().map(|p| (p, class_idx)));
            }

            if entries.is_empty() {
                return Err(DataError::NoImages(root));
            }

            tracing::info!(
                root = %root.display(),
                classes = class_names.len(),
                images = entries.len(),
                "scanned image folder"
            );

            Ok(ImageFolder {
                root,
                class_names,
                entries,
                resize,
                center_crop,
            })
        }

        /// Recursively collect image files.
        fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) {
            if let Ok(rd) = std::fs::read_dir(dir) {
                for entry in rd.flatten() {
                    let path = entry.path();
                    if path.is_dir() {
                        Self::collect_images(&path, out);
                    } else if is_image(&path) {
                        out.push(path);
                    }
                }
            }
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        /// Get the class names (sorted).
        pub fn class_names(&self) -> &[String] {
            &self.class_names
        }

        pub fn num_classes(&self) -> usize {
            self.class_names.len()
        }

        /// Get the class index for the i-th sample.
        pub fn class_of(&self, index: usize) -> usize {
            self.entries[index].1
        }

        fn preprocess(&self, img: DynamicImage) -> DynamicImage {
            let img = match self.resize {
                Some(size) => {
                    let (w, h) = img.dimensions();
                    let (nw, nh) = if w <= h {
                        (size, ((size as u64 * h as u64) / w.max(1) as u64) as u32)
                    } else {
                        (((size as u64 * w as u64) / h.max(1) as u64) as u32, size)
                    };
                    img.resize_exact(nw.max(1), nh.max(1), FilterType::Triangle)
                }
                None => img,
            };
            match self.center_crop {
                Some(size) => {
                    let (w, h) = img.dimensions();
                    let cw = size.min(w);
                    let ch = size.min(h);
                    img.crop_imm((w - cw) / 2, (h - ch) / 2, cw, ch)
                }
                None => img,
            }
        }

        /// Load and decode an image, returning pixel data in [C, H, W] layout
        /// with values normalised to [0, 1].
        pub fn load_image(&self, index: usize) -> Result<(Vec<f64>, [usize; 3])> {
            let path = &self.entries[index].0;
            let img = image::open(path)
                .map_err(|e| DataError::ImageDecode(path.clone(), e.to_string()))?;
            let img = self.preprocess(img);

            let (w, h) = img.dimensions();
            let npix = (w * h) as usize;
            let rgb = img.to_rgb8();
            let raw = rgb.as_raw();
            // [H, W, C] interleaved to [C, H, W] planar
            let mut pixels = vec![0.0f64; CHANNELS * npix];
            for i in 0..npix {
                pixels[i] = raw[i * 3] as f64 / 255.0;
                pixels[npix + i] = raw[i * 3 + 1] as f64 / 255.0;
                pixels[2 * npix + i] = raw[i * 3 + 2] as f64 / 255.0;
            }

            Ok((pixels, [CHANNELS, h as usize, w as usize]))
        }
    }

    impl Dataset for ImageFolder {
        fn len(&self) -> usize {
            self.entries.len()
        }

        fn get(&self, index: usize) -> Sample {
            let target = vec![self.entries[index].1 as f64];
            match self.load_image(index) {
                Ok((features, shape)) => Sample {
                    features,
                    feature_shape: shape.to_vec(),
                    target,
                    target_shape: vec![1],
                },
                Err(e) => {
                    // Zero sample on error so batch iteration can continue.
                    tracing::warn!(error = %e, "ImageFolder: substituting a blank image");
                    let side = self.center_crop.or(self.resize).unwrap_or(1) as usize;
                    Sample {
                        features: vec![0.0; CHANNELS * side * side],
                        feature_shape: vec![CHANNELS, side, side],
                        target,
                        target_shape: vec![1],
                    }
                }
            }
        }

        fn name(&self) -> &str {
            "ImageFolder"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn write_png(path: &Path, w: u32, h: u32, value: u8) {
            let img = image::RgbImage::from_pixel(w, h, image::Rgb([value, value, value]));
            img.save(path).unwrap();
        }

        #[test]
        fn scans_classes_in_sorted_order() {
            let tmp = tempfile::tempdir().unwrap();
            for (class, n) in [("zebra", 1), ("ant", 2)] {
                let dir = tmp.path().join(class);
                std::fs::create_dir(&dir).unwrap();
                for i in 0..n {
                    write_png(&dir.join(format!("{i}.png")), 4, 4, 10);
                }
            }
            std::fs::write(tmp.path().join("ant").join("notes.txt"), "skip me").unwrap();

            let ds = ImageFolder::new(tmp.path()).build().unwrap();
            assert_eq!(ds.class_names(), &["ant".to_string(), "zebra".to_string()]);
            assert_eq!(ds.num_classes(), 2);
            assert_eq!(ds.root(), tmp.path());
            assert_eq!(ds.len(), 3);
            assert_eq!(ds.class_of(0), 0);
            assert_eq!(ds.class_of(2), 1);
        }

        #[test]
        fn resize_and_crop_produce_square() {
            let tmp = tempfile::tempdir().unwrap();
            let dir = tmp.path().join("only");
            std::fs::create_dir(&dir).unwrap();
            write_png(&dir.join("wide.png"), 16, 8, 255);

            let ds = ImageFolder::new(tmp.path())
                .resize(4)
                .center_crop(4)
                .build()
                .unwrap();
            let s = ds.get(0);
            assert_eq!(s.feature_shape, vec![3, 4, 4]);
            assert!(s.features.iter().all(|&v| (v - 1.0).abs() < 1e-9));
        }

        #[test]
        fn single_channel_files_decode_as_rgb() {
            let tmp = tempfile::tempdir().unwrap();
            let dir = tmp.path().join("only");
            std::fs::create_dir(&dir).unwrap();
            image::GrayImage::from_pixel(3, 3, image::Luma([51]))
                .save(dir.join("a.png"))
                .unwrap();

            let ds = ImageFolder::new(tmp.path()).build().unwrap();
            let s = ds.get(0);
            assert_eq!(s.feature_shape, vec![3, 3, 3]);
            assert!(s.features.iter().all(|&v| (v - 0.2).abs() < 1e-9));
        }

        #[test]
        fn missing_root_is_error() {
            let err = ImageFolder::new("/definitely/not/here").build().unwrap_err();
            assert!(matches!(err, DataError::NotADirectory(_)));
        }

        #[test]
        fn root_without_images_is_error() {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::create_dir(tmp.path().join("empty_class")).unwrap();
            let err = ImageFolder::new(tmp.path()).build().unwrap_err();
            assert!(matches!(err, DataError::NoImages(_)));
        }
    }
}
