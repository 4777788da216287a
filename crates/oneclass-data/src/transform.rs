// Transform — per-sample preprocessing pipeline
//
// All image transforms treat `Sample::features` as an image in [C, H, W]
// layout (channel-first, row-major). Samples whose feature shape is not
// rank 3 pass through unchanged.

use crate::dataset::Sample;

/// A transform applied to each sample before batching.
pub trait Transform: Send + Sync {
    /// Apply the transform to a sample, returning the modified sample.
    fn apply(&self, sample: Sample) -> Sample;
}

fn chw(sample: &Sample) -> Option<(usize, usize, usize)> {
    match sample.feature_shape.as_slice() {
        &[c, h, w] => Some((c, h, w)),
        _ => None,
    }
}

/// Map raw 8-bit pixel values into `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToUnitRange;

impl Transform for ToUnitRange {
    fn apply(&self, mut sample: Sample) -> Sample {
        for v in &mut sample.features {
            *v /= 255.0;
        }
        sample
    }
}

/// Per-channel standardisation: `(x - mean[c]) / std[c]`.
///
/// With a single mean/std pair the same values are used for every channel.
#[derive(Debug, Clone)]
pub struct Normalize {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Normalize {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Self {
        assert_eq!(
            mean.len(),
            std.len(),
            "Normalize: mean and std must have the same number of channels"
        );
        assert!(!mean.is_empty(), "Normalize: need at least one channel");
        Self { mean, std }
    }
}

impl Transform for Normalize {
    fn apply(&self, mut sample: Sample) -> Sample {
        let (c, h, w) = match chw(&sample) {
            Some(dims) => dims,
            None => (1, 1, sample.features.len()),
        };
        let plane = h * w;
        for ch in 0..c {
            let k = if self.mean.len() == 1 { 0 } else { ch };
            let (m, s) = (self.mean[k], self.std[k]);
            for v in &mut sample.features[ch * plane..(ch + 1) * plane] {
                *v = (*v - m) / s;
            }
        }
        sample
    }
}

/// Resize so the shorter side equals `size`, keeping the aspect ratio.
///
/// Uses bilinear interpolation with half-pixel centres.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub size: usize,
}

impl Resize {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "Resize: size must be positive");
        Self { size }
    }

    fn target_dims(&self, h: usize, w: usize) -> (usize, usize) {
        if h <= w {
            let nw = (self.size as f64 * w as f64 / h as f64).floor() as usize;
            (self.size, nw.max(1))
        } else {
            let nh = (self.size as f64 * h as f64 / w as f64).floor() as usize;
            (nh.max(1), self.size)
        }
    }
}

impl Transform for Resize {
    fn apply(&self, mut sample: Sample) -> Sample {
        let (c, h, w) = match chw(&sample) {
            Some(dims) => dims,
            None => return sample,
        };
        if h == 0 || w == 0 {
            return sample;
        }
        let (nh, nw) = self.target_dims(h, w);
        if (nh, nw) == (h, w) {
            return sample;
        }

        let sy = h as f64 / nh as f64;
        let sx = w as f64 / nw as f64;
        let mut out = vec![0.0; c * nh * nw];
        for ch in 0..c {
            let src = &sample.features[ch * h * w..(ch + 1) * h * w];
            for y in 0..nh {
                let fy = ((y as f64 + 0.5) * sy - 0.5).clamp(0.0, (h - 1) as f64);
                let y0 = fy.floor() as usize;
                let y1 = (y0 + 1).min(h - 1);
                let dy = fy - y0 as f64;
                for x in 0..nw {
                    let fx = ((x as f64 + 0.5) * sx - 0.5).clamp(0.0, (w - 1) as f64);
                    let x0 = fx.floor() as usize;
                    let x1 = (x0 + 1).min(w - 1);
                    let dx = fx - x0 as f64;
                    let top = src[y0 * w + x0] * (1.0 - dx) + src[y0 * w + x1] * dx;
                    let bottom = src[y1 * w + x0] * (1.0 - dx) + src[y1 * w + x1] * dx;
                    out[ch * nh * nw + y * nw + x] = top * (1.0 - dy) + bottom * dy;
                }
            }
        }
        sample.features = out;
        sample.feature_shape = vec![c, nh, nw];
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(c: usize, h: usize, w: usize, f: impl Fn(usize) -> f64) -> Sample {
        Sample {
            features: (0..c * h * w).map(f).collect(),
            feature_shape: vec![c, h, w],
            target: vec![0.0],
            target_shape: vec![1],
        }
    }

    #[test]
    fn resize_constant_image_stays_constant() {
        let s = image(1, 4, 4, |_| 7.0);
        let out = Resize::new(2).apply(s);
        assert_eq!(out.feature_shape, vec![1, 2, 2]);
        for v in out.features {
            assert!((v - 7.0).abs() < 1e-12);
        }
    }

    #[test]
    fn resize_keeps_aspect_ratio() {
        let s = image(3, 4, 8, |i| i as f64);
        let out = Resize::new(2).apply(s);
        assert_eq!(out.feature_shape, vec![3, 2, 4]);
        assert_eq!(out.features.len(), 3 * 2 * 4);
    }

    #[test]
    fn resize_same_size_is_identity() {
        let s = image(1, 3, 3, |i| i as f64);
        let out = Resize::new(3).apply(s.clone());
        assert_eq!(out, s);
    }

    #[test]
    fn normalize_per_channel() {
        let s = image(2, 1, 2, |i| if i < 2 { 1.0 } else { 0.0 });
        let out = Normalize::new(vec![0.5, 0.0], vec![0.5, 2.0]).apply(s);
        assert_eq!(out.features, vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn unit_range_then_normalize() {
        let s = image(1, 1, 3, |i| [0.0, 127.5, 255.0][i]);
        let out = Normalize::new(vec![0.5], vec![0.5]).apply(ToUnitRange.apply(s));
        assert!((out.features[0] + 1.0).abs() < 1e-9);
        assert!(out.features[1].abs() < 1e-9);
        assert!((out.features[2] - 1.0).abs() < 1e-9);
    }
}
