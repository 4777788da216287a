// Anomaly re-partitioning — turn a multi-class train/test pair into a
// one-class "normal vs. abnormal" split.
//
// Layout of the derived dataset:
//
//   train
//     normal                       (label 0)
//   test
//     normal                       (label 0)
//     abnormal                     (label 1)
//
// Two policies decide which original samples are normal:
//
//   ClassIsAbnormal — the chosen class is the anomaly, everything else is
//                     normal. Abnormal samples from BOTH original splits go to
//                     the test set. Optionally the normal pool is reshuffled
//                     with a fixed seed and re-cut 80/20.
//   ClassIsNormal   — the chosen class is the only normal class. Only a random
//                     `proportion` of the abnormal test samples is kept;
//                     abnormal train samples are dropped.
//
// Inputs are borrowed and never modified; every output set owns fresh label
// vectors.

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use oneclass_data::{ImageStore, LabeledImageSet};

use crate::error::{Error, Result};

/// Binary label of a normal sample.
pub const NORMAL: usize = 0;
/// Binary label of an abnormal sample.
pub const ABNORMAL: usize = 1;

/// Share of the pooled normal samples that the seeded reshuffle puts in train.
pub const RESHUFFLE_TRAIN_FRACTION: f64 = 0.8;

/// Which side of the class predicate is "normal".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    /// `label == class_index` is abnormal.
    ClassIsAbnormal {
        /// When set, pool the normal samples of both splits and re-cut them
        /// with this seed.
        manual_seed: Option<u64>,
    },
    /// `label == class_index` is normal; keep `proportion` of the abnormal
    /// test samples.
    ClassIsNormal { proportion: f64 },
}

/// A re-partitioning request: the designated class plus the policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalySplit {
    pub class_index: usize,
    pub policy: Policy,
}

impl AnomalySplit {
    /// Treat `class_index` as the anomaly; no reshuffle.
    pub fn class_is_abnormal(class_index: usize) -> Self {
        Self {
            class_index,
            policy: Policy::ClassIsAbnormal { manual_seed: None },
        }
    }

    /// Treat `class_index` as the only normal class, keeping `proportion`
    /// of the abnormal test samples.
    pub fn class_is_normal(class_index: usize, proportion: f64) -> Self {
        Self {
            class_index,
            policy: Policy::ClassIsNormal { proportion },
        }
    }

    /// Enable the seeded reshuffle of the normal pool.
    ///
    /// Only meaningful for [`Policy::ClassIsAbnormal`]; other policies are
    /// returned unchanged.
    pub fn with_manual_seed(mut self, seed: u64) -> Self {
        if let Policy::ClassIsAbnormal { manual_seed } = &mut self.policy {
            *manual_seed = Some(seed);
        }
        self
    }

    /// Whether an original label counts as normal under this split.
    pub fn is_normal(&self, label: usize) -> bool {
        match self.policy {
            Policy::ClassIsAbnormal { .. } => label != self.class_index,
            Policy::ClassIsNormal { .. } => label == self.class_index,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Policy::ClassIsNormal { proportion } = self.policy {
            if !(0.0..=1.0).contains(&proportion) {
                return Err(Error::InvalidProportion(proportion));
            }
        }
        Ok(())
    }
}

/// The derived one-class dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyDataset<S: ImageStore> {
    pub train: LabeledImageSet<S>,
    pub test: LabeledImageSet<S>,
}

impl<S: ImageStore> AnomalyDataset<S> {
    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            train_normal: self.train.count_label(NORMAL),
            train_abnormal: self.train.count_label(ABNORMAL),
            test_normal: self.test.count_label(NORMAL),
            test_abnormal: self.test.count_label(ABNORMAL),
        }
    }
}

/// Normal/abnormal counts of a derived dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitSummary {
    pub train_normal: usize,
    pub train_abnormal: usize,
    pub test_normal: usize,
    pub test_abnormal: usize,
}

impl SplitSummary {
    pub fn train_len(&self) -> usize {
        self.train_normal + self.train_abnormal
    }

    pub fn test_len(&self) -> usize {
        self.test_normal + self.test_abnormal
    }
}

impl fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Anomaly split:")?;
        writeln!(
            f,
            "  train: {} samples ({} normal, {} abnormal)",
            self.train_len(),
            self.train_normal,
            self.train_abnormal
        )?;
        write!(
            f,
            "  test:  {} samples ({} normal, {} abnormal)",
            self.test_len(),
            self.test_normal,
            self.test_abnormal
        )
    }
}

/// Re-partition `train`/`test` into a one-class anomaly dataset.
///
/// `rng` drives the abnormal sampling of [`Policy::ClassIsNormal`]; the
/// reshuffle of [`Policy::ClassIsAbnormal`] uses its own generator seeded
/// from `manual_seed`, so it is reproducible regardless of `rng`.
///
/// A class index that matches no samples is not an error: the affected
/// subsets are simply empty.
pub fn repartition<S, R>(
    train: &LabeledImageSet<S>,
    test: &LabeledImageSet<S>,
    split: &AnomalySplit,
    rng: &mut R,
) -> Result<AnomalyDataset<S>>
where
    S: ImageStore,
    R: Rng + ?Sized,
{
    split.validate()?;

    let normal = |label: usize| split.is_normal(label);
    let abnormal = |label: usize| !split.is_normal(label);

    let nrm_trn = train
        .select(&train.indices_where(normal))
        .into_relabeled(NORMAL);
    let nrm_tst = test.select(&test.indices_where(normal)).into_relabeled(NORMAL);

    let derived = match split.policy {
        Policy::ClassIsAbnormal { manual_seed } => {
            let abn_trn = train
                .select(&train.indices_where(abnormal))
                .into_relabeled(ABNORMAL);
            let abn_tst = test
                .select(&test.indices_where(abnormal))
                .into_relabeled(ABNORMAL);

            let (nrm_trn, nrm_tst) = match manual_seed {
                Some(seed) => reshuffle_normals(&nrm_trn, &nrm_tst, seed)?,
                None => (nrm_trn, nrm_tst),
            };

            let test = LabeledImageSet::concat(&[&nrm_tst, &abn_trn, &abn_tst])?;
            AnomalyDataset {
                train: nrm_trn,
                test,
            }
        }
        Policy::ClassIsNormal { proportion } => {
            let mut abn_idx = test.indices_where(abnormal);
            abn_idx.shuffle(rng);
            abn_idx.truncate(keep_count(abn_idx.len(), proportion));
            let abn_tst = test.select(&abn_idx).into_relabeled(ABNORMAL);

            let test = LabeledImageSet::concat(&[&nrm_tst, &abn_tst])?;
            AnomalyDataset {
                train: nrm_trn,
                test,
            }
        }
    };

    let summary = derived.summary();
    tracing::debug!(
        class_index = split.class_index,
        policy = ?split.policy,
        train_normal = summary.train_normal,
        test_normal = summary.test_normal,
        test_abnormal = summary.test_abnormal,
        "re-partitioned dataset"
    );

    Ok(derived)
}

/// `floor(len * proportion)`, clamped to `len`.
fn keep_count(len: usize, proportion: f64) -> usize {
    ((len as f64 * proportion).floor() as usize).min(len)
}

/// Pool both normal subsets, shuffle with `seed` and re-cut them 80/20.
fn reshuffle_normals<S: ImageStore>(
    nrm_trn: &LabeledImageSet<S>,
    nrm_tst: &LabeledImageSet<S>,
    seed: u64,
) -> Result<(LabeledImageSet<S>, LabeledImageSet<S>)> {
    let pool = LabeledImageSet::concat(&[nrm_trn, nrm_tst])?;

    let mut idx: Vec<usize> = (0..pool.len()).collect();
    idx.shuffle(&mut StdRng::seed_from_u64(seed));

    let cut = (pool.len() as f64 * RESHUFFLE_TRAIN_FRACTION) as usize;
    Ok((pool.select(&idx[..cut]), pool.select(&idx[cut..])))
}
