//! Structural similarity (SSIM).
//!
//! The frame is covered by 8x8 windows placed every `step` pixels (4 by
//! default, i.e. 50% overlap) in both directions. Each window contributes
//!
//! ```text
//!          (2*Sa*Sb + C1) * (2*n*Sab - 2*Sa*Sb + C2)
//! ssim = -------------------------------------------------------
//!        (Sa^2 + Sb^2 + C1) * (n*(Saa + Sbb) - Sa^2 - Sb^2 + C2)
//! ```
//!
//! where `n` is the window's sample count, `Sa`, `Sb` are pixel sums,
//! `Saa`, `Sbb` sums of squares and `Sab` the cross sum. This is the usual
//! mean/variance formula multiplied through by `n^2`, so the constants are
//! `C = n^2 * (k*255)^2`. Everything up to the final division is integer
//! arithmetic, which makes identical frames score exactly `1.0` and keeps
//! every dispatch path bit-identical.
//!
//! The frame score is the mean over windows. Frames narrower or shorter than
//! a window are scored with a single window clamped to the frame.
//!
//! # Example
//!
//! ```rust
//! use planecmp::calc_frame_ssim;
//!
//! let a: Vec<u8> = (0..64 * 64).map(|i| (i * 7 % 256) as u8).collect();
//! assert_eq!(calc_frame_ssim(&a, 64, &a, 64, 64, 64), 1.0);
//! ```

use crate::error::{Error, Result};
use crate::plane::I420;
use crate::simd::{fallback, Kernels, WindowSums, WINDOW_SIZE};

/// Tuning for [`calc_frame_ssim_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsimOptions {
    /// Distance between neighbouring window origins, in pixels.
    pub step: usize,
    /// Luminance stabilizer, relative to the 8-bit dynamic range.
    pub k1: f64,
    /// Contrast stabilizer, relative to the 8-bit dynamic range.
    pub k2: f64,
}

impl Default for SsimOptions {
    fn default() -> Self {
        Self {
            step: 4,
            k1: 0.01,
            k2: 0.03,
        }
    }
}

impl SsimOptions {
    /// Create a builder starting from the defaults.
    pub fn builder() -> SsimOptionsBuilder {
        SsimOptionsBuilder::new()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(Error::InvalidOption("step must be at least 1".into()));
        }
        for (name, k) in [("k1", self.k1), ("k2", self.k2)] {
            if !k.is_finite() || k <= 0.0 || k > 1.0 {
                return Err(Error::InvalidOption(format!("{name} must be in (0, 1], got {k}")));
            }
        }
        Ok(())
    }
}

/// Builder for [`SsimOptions`].
#[derive(Debug, Clone)]
pub struct SsimOptionsBuilder {
    options: SsimOptions,
}

impl SsimOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: SsimOptions::default(),
        }
    }

    /// Window origin spacing. Smaller steps sample more windows.
    pub fn step(mut self, step: usize) -> Self {
        self.options.step = step;
        self
    }

    pub fn k1(mut self, k1: f64) -> Self {
        self.options.k1 = k1;
        self
    }

    pub fn k2(mut self, k2: f64) -> Self {
        self.options.k2 = k2;
        self
    }

    /// Build the [`SsimOptions`], checking that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for a zero step or a stabilizer
    /// outside `(0, 1]`.
    pub fn try_build(self) -> Result<SsimOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

impl Default for SsimOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stabilizing constants scaled to a window's sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowConstants {
    count: i64,
    c1: i64,
    c2: i64,
}

impl WindowConstants {
    fn new(count: usize, options: &SsimOptions) -> Self {
        let scale = (count * count) as f64;
        let c1 = scale * (options.k1 * 255.0) * (options.k1 * 255.0);
        let c2 = scale * (options.k2 * 255.0) * (options.k2 * 255.0);
        Self {
            count: count as i64,
            c1: c1 as i64,
            c2: c2 as i64,
        }
    }

    fn score(&self, sums: &WindowSums) -> f64 {
        let sum_a = sums.sum_a as i64;
        let sum_b = sums.sum_b as i64;
        let sum_ab = sum_a * sum_b;
        let sq_a = sum_a * sum_a;
        let sq_b = sum_b * sum_b;

        let numerator = (2 * sum_ab + self.c1)
            * (2 * self.count * sums.sum_axb as i64 - 2 * sum_ab + self.c2);
        let denominator = (sq_a + sq_b + self.c1)
            * (self.count * (sums.sum_sq_a as i64 + sums.sum_sq_b as i64) - sq_a - sq_b + self.c2);

        if denominator == 0 {
            // Only reachable when both constants truncate to zero on flat input
            return 1.0;
        }
        numerator as f64 / denominator as f64
    }
}

/// SSIM between the `width x height` regions of two planes, default options.
pub fn calc_frame_ssim(
    a: &[u8],
    stride_a: usize,
    b: &[u8],
    stride_b: usize,
    width: usize,
    height: usize,
) -> f64 {
    Kernels::current().frame_ssim(
        a,
        stride_a,
        b,
        stride_b,
        width,
        height,
        &SsimOptions::default(),
    )
}

/// SSIM with explicit [`SsimOptions`].
pub fn calc_frame_ssim_with(
    a: &[u8],
    stride_a: usize,
    b: &[u8],
    stride_b: usize,
    width: usize,
    height: usize,
    options: &SsimOptions,
) -> f64 {
    Kernels::current().frame_ssim(a, stride_a, b, stride_b, width, height, options)
}

/// SSIM of two I420 frames: `0.8 * Y + 0.1 * U + 0.1 * V`.
pub fn i420_ssim(a: &I420<'_>, b: &I420<'_>) -> Result<f64> {
    Kernels::current().i420_ssim(a, b)
}

impl Kernels {
    /// [`calc_frame_ssim_with`] with this kernel table.
    ///
    /// `options.step` must be non-zero (asserted; a zero step is clamped to
    /// 1 in release builds).
    #[allow(clippy::too_many_arguments)]
    pub fn frame_ssim(
        &self,
        a: &[u8],
        stride_a: usize,
        b: &[u8],
        stride_b: usize,
        width: usize,
        height: usize,
        options: &SsimOptions,
    ) -> f64 {
        debug_assert!(stride_a >= width, "stride_a {stride_a} < width {width}");
        debug_assert!(stride_b >= width, "stride_b {stride_b} < width {width}");
        debug_assert!(options.step > 0, "ssim step must be non-zero");

        if width == 0 || height == 0 {
            return 1.0;
        }

        if width < WINDOW_SIZE || height < WINDOW_SIZE {
            let w = width.min(WINDOW_SIZE);
            let h = height.min(WINDOW_SIZE);
            let sums = fallback::window_sums(a, stride_a, b, stride_b, w, h);
            return WindowConstants::new(w * h, options).score(&sums);
        }

        let constants = WindowConstants::new(WINDOW_SIZE * WINDOW_SIZE, options);
        let step = options.step.max(1);
        let mut total = 0.0;
        let mut samples = 0u64;

        for y in (0..=height - WINDOW_SIZE).step_by(step) {
            let row_a = &a[y * stride_a..];
            let row_b = &b[y * stride_b..];
            for x in (0..=width - WINDOW_SIZE).step_by(step) {
                let sums = self.window_sums(&row_a[x..], stride_a, &row_b[x..], stride_b);
                total += constants.score(&sums);
                samples += 1;
            }
        }

        total / samples as f64
    }

    /// [`i420_ssim`] with this kernel table.
    pub fn i420_ssim(&self, a: &I420<'_>, b: &I420<'_>) -> Result<f64> {
        a.check_same_size(b)?;
        let options = SsimOptions::default();
        let [y, u, v] = [(a.y, b.y), (a.u, b.u), (a.v, b.v)].map(|(pa, pb)| {
            self.frame_ssim(
                pa.data(),
                pa.stride(),
                pb.data(),
                pb.stride(),
                pa.width(),
                pa.height(),
                &options,
            )
        });
        Ok(0.8 * y + 0.1 * (u + v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let constants = WindowConstants::new(64, &SsimOptions::default());
        assert_eq!(constants.c1, 26634);
        assert_eq!(constants.c2, 239708);
    }

    #[test]
    fn test_flat_identical_window_is_one() {
        let constants = WindowConstants::new(64, &SsimOptions::default());
        let sums = WindowSums::default();
        assert_eq!(constants.score(&sums), 1.0);
    }

    #[test]
    fn test_extreme_window_below_threshold() {
        let constants = WindowConstants::new(64, &SsimOptions::default());
        let sums = WindowSums {
            sum_a: 64 * 255,
            sum_sq_a: 64 * 65025,
            ..Default::default()
        };
        let score = constants.score(&sums);
        assert!(score > 0.0 && score < 0.0001, "score={score}");
    }

    #[test]
    fn test_identical_frames_score_one() {
        let (w, h, stride) = (37, 29, 48);
        let data: Vec<u8> = (0..stride * h).map(|i| (i * 131 % 256) as u8).collect();
        assert_eq!(calc_frame_ssim(&data, stride, &data, stride, w, h), 1.0);
    }

    #[test]
    fn test_tiny_frames_do_not_panic() {
        let a: Vec<u8> = (0..64).map(|i| (i * 3) as u8).collect();
        let b: Vec<u8> = (0..64).map(|i| (i * 5) as u8).collect();
        for (w, h) in [(1, 1), (3, 7), (7, 3), (7, 7), (8, 2), (2, 8)] {
            let score = calc_frame_ssim(&a, 8, &b, 8, w, h);
            assert!(score.is_finite(), "{w}x{h}: {score}");
            assert_eq!(calc_frame_ssim(&a, 8, &a, 8, w, h), 1.0, "{w}x{h}");
        }
    }

    #[test]
    fn test_empty_frame_scores_one() {
        assert_eq!(calc_frame_ssim(&[], 0, &[], 0, 0, 0), 1.0);
        assert_eq!(calc_frame_ssim(&[0; 8], 8, &[9; 8], 8, 8, 0), 1.0);
    }

    #[test]
    fn test_exact_window_frame() {
        // An 8x8 frame has exactly one window
        let a = vec![0u8; 64];
        let b = vec![1u8; 64];
        let expected = WindowConstants::new(64, &SsimOptions::default()).score(&WindowSums {
            sum_b: 64,
            sum_sq_b: 64,
            ..Default::default()
        });
        assert_eq!(calc_frame_ssim(&a, 8, &b, 8, 8, 8), expected);
    }

    #[test]
    fn test_step_changes_sampling() {
        let a: Vec<u8> = (0..32 * 32).map(|i| (i * 7 % 256) as u8).collect();
        let b: Vec<u8> = (0..32 * 32).map(|i| (i * 11 % 256) as u8).collect();
        let coarse = SsimOptions::builder().step(8).try_build().unwrap();
        let fine = SsimOptions::builder().step(1).try_build().unwrap();
        let s_coarse = calc_frame_ssim_with(&a, 32, &b, 32, 32, 32, &coarse);
        let s_fine = calc_frame_ssim_with(&a, 32, &b, 32, 32, 32, &fine);
        assert!(s_coarse.is_finite() && s_fine.is_finite());
        assert_ne!(s_coarse, s_fine);
    }

    #[test]
    fn test_builder_rejects_bad_options() {
        assert!(matches!(
            SsimOptions::builder().step(0).try_build(),
            Err(Error::InvalidOption(_))
        ));
        assert!(SsimOptions::builder().k1(0.0).try_build().is_err());
        assert!(SsimOptions::builder().k2(f64::NAN).try_build().is_err());
        assert!(SsimOptions::builder().k2(2.0).try_build().is_err());
        assert_eq!(
            SsimOptions::builder().try_build().unwrap(),
            SsimOptions::default()
        );
    }

    #[test]
    fn test_i420_ssim_weights() {
        use crate::Plane;

        let (w, h) = (16, 16);
        let y: Vec<u8> = (0..w * h).map(|i| (i * 5 % 256) as u8).collect();
        let u: Vec<u8> = (0..64).map(|i| (i * 9 % 256) as u8).collect();
        let v = u.clone();
        let v_other = vec![0u8; 64];

        let frame = I420::new(
            Plane::packed(&y, w, h).unwrap(),
            Plane::packed(&u, 8, 8).unwrap(),
            Plane::packed(&v, 8, 8).unwrap(),
        )
        .unwrap();
        let other = I420::new(
            Plane::packed(&y, w, h).unwrap(),
            Plane::packed(&u, 8, 8).unwrap(),
            Plane::packed(&v_other, 8, 8).unwrap(),
        )
        .unwrap();

        assert_eq!(i420_ssim(&frame, &frame).unwrap(), 0.8 + 0.1 * 2.0);
        let ssim_v = calc_frame_ssim(&v, 8, &v_other, 8, 8, 8);
        assert_eq!(i420_ssim(&frame, &other).unwrap(), 0.8 + 0.1 * (1.0 + ssim_v));
    }
}
