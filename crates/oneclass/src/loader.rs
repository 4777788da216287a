// Dataset preparation — read a dataset, derive the anomaly split and wrap
// both halves in DataLoaders.
//
// Per dataset:
//
//   cifar10  class given by name is abnormal        shuffle test: no
//   mnist    class given as a digit is abnormal     shuffle test: yes
//   mnist2   digit is the only normal class, keep `proportion` abnormal
//   other    image folder <root>/train, <root>/test, labels unchanged
//
// Train loaders always shuffle and drop the last partial batch; test loaders
// keep it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use oneclass_data::{
    cifar10_class_index, Cifar10Dataset, DataLoader, DataLoaderConfig, Dataset, ImageStore,
    LabeledImageSet, MnistDataset, Normalize, Resize, Split, ToUnitRange,
};

use crate::anomaly::{repartition, AnomalySplit, SplitSummary};
use crate::error::{Error, Result};
use crate::options::{DatasetKind, Options};

const CIFAR10_MEAN: [f64; 3] = [0.5, 0.5, 0.5];
const CIFAR10_STD: [f64; 3] = [0.5, 0.5, 0.5];
const MNIST_MEAN: f64 = 0.1307;
const MNIST_STD: f64 = 0.3081;

/// Loaders and metadata produced by [`load_data`].
pub struct PreparedData {
    pub train: DataLoader,
    pub test: DataLoader,
    /// Image channel count.
    pub channels: usize,
    /// Directory the data was read from.
    pub dataroot: PathBuf,
    /// Normal/abnormal counts; `None` for image folders, which keep their labels.
    pub summary: Option<SplitSummary>,
}

/// Load the dataset named by `opts`, derive its anomaly split and build
/// train/test loaders.
pub fn load_data(opts: &Options) -> Result<PreparedData> {
    if opts.image_size == 0 {
        return Err(Error::InvalidOption("isize must be positive".to_string()));
    }

    let dataroot = opts.resolved_dataroot();
    let kind = opts.kind();
    let mut rng = match opts.manual_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!(
        dataset = %kind,
        dataroot = %dataroot.display(),
        anomaly_class = %opts.anomaly_class,
        "preparing dataset"
    );

    let prepared = match &kind {
        DatasetKind::Cifar10 => {
            let class_index = cifar10_class_index(&opts.anomaly_class)
                .ok_or_else(|| unknown_class(&kind, &opts.anomaly_class))?;
            let split = seeded(AnomalySplit::class_is_abnormal(class_index), opts);

            let train = Cifar10Dataset::load(&dataroot, Split::Train)?.into_image_set()?;
            let test = Cifar10Dataset::load(&dataroot, Split::Test)?.into_image_set()?;
            let derived = repartition(&train, &test, &split, &mut rng)?;
            let summary = derived.summary();

            let (train, test) = image_loaders(derived.train, derived.test, opts, false);
            PreparedData {
                train: with_pixel_transforms(train, opts, &CIFAR10_MEAN, &CIFAR10_STD),
                test: with_pixel_transforms(test, opts, &CIFAR10_MEAN, &CIFAR10_STD),
                channels: 3,
                dataroot,
                summary: Some(summary),
            }
        }
        DatasetKind::Mnist | DatasetKind::Mnist2 => {
            let class_index: usize = opts
                .anomaly_class
                .parse()
                .map_err(|_| unknown_class(&kind, &opts.anomaly_class))?;
            let split = if kind == DatasetKind::Mnist2 {
                AnomalySplit::class_is_normal(class_index, opts.proportion)
            } else {
                seeded(AnomalySplit::class_is_abnormal(class_index), opts)
            };

            let train = MnistDataset::load(&dataroot, Split::Train)?.into_image_set()?;
            let test = MnistDataset::load(&dataroot, Split::Test)?.into_image_set()?;
            let derived = repartition(&train, &test, &split, &mut rng)?;
            let summary = derived.summary();

            let (train, test) = image_loaders(derived.train, derived.test, opts, true);
            PreparedData {
                train: with_pixel_transforms(train, opts, &[MNIST_MEAN], &[MNIST_STD]),
                test: with_pixel_transforms(test, opts, &[MNIST_MEAN], &[MNIST_STD]),
                channels: 1,
                dataroot,
                summary: Some(summary),
            }
        }
        DatasetKind::Folder(name) => load_folder(name, &dataroot, opts)?,
    };

    if let Some(summary) = &prepared.summary {
        tracing::info!(
            train_normal = summary.train_normal,
            test_normal = summary.test_normal,
            test_abnormal = summary.test_abnormal,
            "anomaly split ready"
        );
    }
    Ok(prepared)
}

fn unknown_class(kind: &DatasetKind, class: &str) -> Error {
    Error::UnknownClass {
        dataset: kind.to_string(),
        class: class.to_string(),
    }
}

fn seeded(split: AnomalySplit, opts: &Options) -> AnomalySplit {
    match opts.manual_seed {
        Some(seed) => split.with_manual_seed(seed),
        None => split,
    }
}

fn loader_config(opts: &Options, shuffle: bool, drop_last: bool, stream: u64) -> DataLoaderConfig {
    let config = DataLoaderConfig::default()
        .batch_size(opts.batch_size)
        .shuffle(shuffle)
        .drop_last(drop_last)
        .num_workers(opts.workers);
    match opts.manual_seed {
        Some(seed) => config.seed(seed.wrapping_add(stream)),
        None => config,
    }
}

fn image_loaders<S: ImageStore + 'static>(
    train: LabeledImageSet<S>,
    test: LabeledImageSet<S>,
    opts: &Options,
    shuffle_test: bool,
) -> (DataLoader, DataLoader) {
    let train: Arc<dyn Dataset> = Arc::new(train.with_name("anomaly-train"));
    let test: Arc<dyn Dataset> = Arc::new(test.with_name("anomaly-test"));
    (
        DataLoader::new(train, loader_config(opts, true, true, 0)),
        DataLoader::new(test, loader_config(opts, shuffle_test, false, 1)),
    )
}

/// Resize, scale to `[0, 1]`, then normalize per channel.
fn with_pixel_transforms(loader: DataLoader, opts: &Options, mean: &[f64], std: &[f64]) -> DataLoader {
    loader
        .with_transform(Box::new(Resize::new(opts.image_size)))
        .with_transform(Box::new(ToUnitRange))
        .with_transform(Box::new(Normalize::new(mean.to_vec(), std.to_vec())))
}

#[cfg(feature = "image-folder")]
fn load_folder(_name: &str, dataroot: &Path, opts: &Options) -> Result<PreparedData> {
    use oneclass_data::ImageFolder;

    let size = opts.image_size as u32;
    let open = |split: Split| {
        ImageFolder::new(dataroot.join(split.as_str()))
            .resize(size)
            .center_crop(size)
            .build()
    };
    let train: Arc<dyn Dataset> = Arc::new(open(Split::Train)?);
    let test: Arc<dyn Dataset> = Arc::new(open(Split::Test)?);

    // decoded pixels are already in [0, 1]
    let normalize = || Box::new(Normalize::new(CIFAR10_MEAN.to_vec(), CIFAR10_STD.to_vec()));
    Ok(PreparedData {
        train: DataLoader::new(train, loader_config(opts, true, true, 0)).with_transform(normalize()),
        test: DataLoader::new(test, loader_config(opts, true, false, 1)).with_transform(normalize()),
        channels: 3,
        dataroot: dataroot.to_path_buf(),
        summary: None,
    })
}

#[cfg(not(feature = "image-folder"))]
fn load_folder(name: &str, _dataroot: &Path, _opts: &Options) -> Result<PreparedData> {
    Err(Error::FeatureDisabled(name.to_string()))
}
