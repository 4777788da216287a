// Properties of the anomaly re-partitioner over randomly labeled sets

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use oneclass::data::{ImageArray, ImageStore, ImageTensor, LabeledImageSet};
use oneclass::{repartition, AnomalySplit, Error, ABNORMAL, NORMAL};

const ITEM: [usize; 3] = [1, 2, 2];

fn random_labels(rng: &mut StdRng, n: usize, classes: usize) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..classes)).collect()
}

/// Image `i` is filled with `offset + i` so provenance survives re-partitioning.
fn tensor_set(labels: &[usize], offset: u16) -> LabeledImageSet<ImageTensor> {
    let data = (0..labels.len())
        .flat_map(|i| [((offset as usize + i) % 256) as u8; 4])
        .collect();
    let images = ImageTensor::from_vec(data, labels.len(), &ITEM).unwrap();
    LabeledImageSet::new(images, labels.to_vec()).unwrap()
}

fn array_set(labels: &[usize], offset: u16) -> LabeledImageSet<ImageArray> {
    let images = (0..labels.len())
        .map(|i| vec![((offset as usize + i) % 256) as u8; 4])
        .collect();
    let images = ImageArray::new(images, ITEM.to_vec()).unwrap();
    LabeledImageSet::new(images, labels.to_vec()).unwrap()
}

fn count(labels: &[usize], pred: impl Fn(usize) -> bool) -> usize {
    labels.iter().filter(|&&l| pred(l)).count()
}

#[test]
fn test_class_is_abnormal_lengths_and_labels() {
    let mut gen = StdRng::seed_from_u64(1);
    for class in 0..5 {
        let train_labels = random_labels(&mut gen, 60, 5);
        let test_labels = random_labels(&mut gen, 25, 5);
        let train = tensor_set(&train_labels, 0);
        let test = tensor_set(&test_labels, 100);

        let split = AnomalySplit::class_is_abnormal(class);
        let out = repartition(&train, &test, &split, &mut gen).unwrap();

        assert_eq!(out.train.images().len(), out.train.labels().len());
        assert_eq!(out.test.images().len(), out.test.labels().len());
        assert!(out.train.labels().iter().all(|&l| l == NORMAL));
        assert_eq!(out.train.len(), count(&train_labels, |l| l != class));

        // test = normal test + every abnormal sample from both splits
        let abnormal = count(&train_labels, |l| l == class) + count(&test_labels, |l| l == class);
        assert_eq!(
            out.test.len(),
            count(&test_labels, |l| l != class) + abnormal
        );
        assert_eq!(out.test.count_label(ABNORMAL), abnormal);

        // normals precede abnormals
        let first_abnormal = out.test.len() - abnormal;
        assert!(out.test.labels()[..first_abnormal].iter().all(|&l| l == NORMAL));
        assert!(out.test.labels()[first_abnormal..].iter().all(|&l| l == ABNORMAL));
    }
}

#[test]
fn test_class_is_normal_lengths_and_labels() {
    let mut gen = StdRng::seed_from_u64(2);
    for (class, proportion) in [(0, 0.1), (3, 0.25), (7, 0.5), (9, 1.0)] {
        let train_labels = random_labels(&mut gen, 80, 10);
        let test_labels = random_labels(&mut gen, 40, 10);
        let train = array_set(&train_labels, 0);
        let test = array_set(&test_labels, 100);

        let split = AnomalySplit::class_is_normal(class, proportion);
        let out = repartition(&train, &test, &split, &mut gen).unwrap();

        assert!(out.train.labels().iter().all(|&l| l == NORMAL));
        assert_eq!(out.train.len(), count(&train_labels, |l| l == class));

        let abnormal = count(&test_labels, |l| l != class);
        let kept = (abnormal as f64 * proportion).floor() as usize;
        assert_eq!(out.test.count_label(NORMAL), count(&test_labels, |l| l == class));
        assert_eq!(out.test.count_label(ABNORMAL), kept);
        assert_eq!(
            out.test.len(),
            count(&test_labels, |l| l == class) + kept
        );
    }
}

#[test]
fn test_abnormal_subsample_is_drawn_without_replacement() {
    let test_labels: Vec<usize> = (0..50).map(|i| if i < 10 { 0 } else { 1 + i % 4 }).collect();
    let test = tensor_set(&test_labels, 0);
    let train = tensor_set(&[0, 0], 200);

    let split = AnomalySplit::class_is_normal(0, 0.5);
    let out = repartition(&train, &test, &split, &mut StdRng::seed_from_u64(5)).unwrap();

    let mut ids: Vec<u8> = (10..out.test.len())
        .map(|i| out.test.images().pixels(i)[0])
        .collect();
    assert_eq!(ids.len(), 20);
    assert!(ids.iter().all(|&id| id >= 10), "abnormal ids must come from abnormal samples");
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[test]
fn test_unseeded_class_is_abnormal_is_idempotent() {
    let mut gen = StdRng::seed_from_u64(3);
    let train = tensor_set(&random_labels(&mut gen, 30, 4), 0);
    let test = tensor_set(&random_labels(&mut gen, 12, 4), 100);
    let split = AnomalySplit::class_is_abnormal(2);

    // the caller rng is not consulted by this policy
    let a = repartition(&train, &test, &split, &mut StdRng::seed_from_u64(10)).unwrap();
    let b = repartition(&train, &test, &split, &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_seeded_reshuffle_is_deterministic() {
    let mut gen = StdRng::seed_from_u64(4);
    let train = array_set(&random_labels(&mut gen, 40, 3), 0);
    let test = array_set(&random_labels(&mut gen, 20, 3), 100);
    let split = AnomalySplit::class_is_abnormal(1).with_manual_seed(1234);

    let a = repartition(&train, &test, &split, &mut StdRng::seed_from_u64(0)).unwrap();
    let b = repartition(&train, &test, &split, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a, b);

    let pooled = train.count_label(0) + train.count_label(2) + test.count_label(0) + test.count_label(2);
    let cut = (pooled as f64 * 0.8) as usize;
    assert_eq!(a.train.len(), cut);
    assert_eq!(a.test.count_label(NORMAL), pooled - cut);
    assert_eq!(
        a.test.count_label(ABNORMAL),
        train.count_label(1) + test.count_label(1)
    );
}

#[test]
fn test_different_seeds_reshuffle_differently() {
    let labels: Vec<usize> = (0..100).map(|i| i % 2).collect();
    let train = tensor_set(&labels, 0);
    let test = tensor_set(&labels, 100);

    let pick = |seed| {
        let split = AnomalySplit::class_is_abnormal(1).with_manual_seed(seed);
        repartition(&train, &test, &split, &mut StdRng::seed_from_u64(0)).unwrap()
    };
    assert_ne!(pick(1).train, pick(2).train);
}

#[test]
fn test_array_and_tensor_backends_agree() {
    let mut gen = StdRng::seed_from_u64(6);
    let train_labels = random_labels(&mut gen, 45, 6);
    let test_labels = random_labels(&mut gen, 30, 6);

    for split in [
        AnomalySplit::class_is_abnormal(4),
        AnomalySplit::class_is_abnormal(0).with_manual_seed(77),
        AnomalySplit::class_is_normal(5, 0.3),
    ] {
        let a = repartition(
            &array_set(&train_labels, 0),
            &array_set(&test_labels, 100),
            &split,
            &mut StdRng::seed_from_u64(8),
        )
        .unwrap();
        let t = repartition(
            &tensor_set(&train_labels, 0),
            &tensor_set(&test_labels, 100),
            &split,
            &mut StdRng::seed_from_u64(8),
        )
        .unwrap();

        assert_eq!(a.summary(), t.summary());
        for (x, y) in [(&a.train, &t.train), (&a.test, &t.test)] {
            assert_eq!(x.labels(), y.labels());
            for i in 0..x.len() {
                assert_eq!(x.images().pixels(i), y.images().pixels(i));
            }
        }
    }
}

#[test]
fn test_inputs_unchanged() {
    let mut gen = StdRng::seed_from_u64(9);
    let train = array_set(&random_labels(&mut gen, 20, 3), 0);
    let test = array_set(&random_labels(&mut gen, 10, 3), 100);
    let (train0, test0) = (train.clone(), test.clone());

    for split in [
        AnomalySplit::class_is_abnormal(0).with_manual_seed(1),
        AnomalySplit::class_is_normal(1, 0.6),
    ] {
        repartition(&train, &test, &split, &mut gen).unwrap();
        assert_eq!(train, train0);
        assert_eq!(test, test0);
    }
}

#[test]
fn test_empty_inputs() {
    let train = tensor_set(&[], 0);
    let test = tensor_set(&[], 0);
    let out = repartition(
        &train,
        &test,
        &AnomalySplit::class_is_abnormal(0).with_manual_seed(3),
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap();
    assert!(out.train.is_empty());
    assert!(out.test.is_empty());
    assert_eq!(out.test.images().item_shape(), &ITEM);
}

#[test]
fn test_mismatched_item_shapes_fail() {
    let train = tensor_set(&[0, 1], 0);
    let images = ImageTensor::from_vec(vec![0; 9], 1, &[1, 3, 3]).unwrap();
    let test = LabeledImageSet::new(images, vec![1]).unwrap();

    let err = repartition(
        &train,
        &test,
        &AnomalySplit::class_is_abnormal(1),
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Data(_)));
}

#[test]
fn test_invalid_proportion() {
    let set = tensor_set(&[0, 1, 2], 0);
    let err = repartition(
        &set,
        &set,
        &AnomalySplit::class_is_normal(0, 2.0),
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidProportion(p) if p == 2.0));
}
