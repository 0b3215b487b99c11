//! Peak signal-to-noise ratio.
//!
//! PSNR is derived from the exact integer sum of squared errors, so every
//! dispatch path yields the same `f64`.
//!
//! # Example
//!
//! ```rust
//! use planecmp::{calc_frame_psnr, MAX_PSNR};
//!
//! let a = vec![0u8; 64 * 32];
//! let b = vec![255u8; 64 * 32];
//! assert_eq!(calc_frame_psnr(&a, 64, &a, 64, 64, 32), MAX_PSNR);
//! assert_eq!(calc_frame_psnr(&a, 64, &b, 64, 64, 32), 0.0);
//! ```

use crate::plane::I420;
use crate::simd::Kernels;

/// Score reported for identical frames.
///
/// Finite so that averaging and reporting code never meets infinity or NaN.
/// Computed scores are clamped to it, so it is never exceeded.
pub const MAX_PSNR: f64 = 128.0;

/// Convert a sum of squared errors over `count` samples into decibels.
///
/// Returns [`MAX_PSNR`] when `sse` or `count` is zero.
pub fn sum_square_error_to_psnr(sse: u64, count: u64) -> f64 {
    if sse == 0 || count == 0 {
        return MAX_PSNR;
    }
    let mse = sse as f64 / count as f64;
    let psnr = 10.0 * (255.0 * 255.0 / mse).log10();
    psnr.min(MAX_PSNR)
}

/// PSNR in decibels between the `width x height` regions of two planes.
pub fn calc_frame_psnr(
    a: &[u8],
    stride_a: usize,
    b: &[u8],
    stride_b: usize,
    width: usize,
    height: usize,
) -> f64 {
    Kernels::current().frame_psnr(a, stride_a, b, stride_b, width, height)
}

/// PSNR over all three planes of two I420 frames.
///
/// The squared errors of Y, U and V are pooled and divided by the total
/// sample count `w*h + 2 * ceil(w/2) * ceil(h/2)`.
pub fn i420_psnr(a: &I420<'_>, b: &I420<'_>) -> crate::Result<f64> {
    Kernels::current().i420_psnr(a, b)
}

impl Kernels {
    /// [`calc_frame_psnr`] with this kernel table.
    pub fn frame_psnr(
        &self,
        a: &[u8],
        stride_a: usize,
        b: &[u8],
        stride_b: usize,
        width: usize,
        height: usize,
    ) -> f64 {
        let sse = self.sum_square_error_plane(a, stride_a, b, stride_b, width, height);
        sum_square_error_to_psnr(sse, (width * height) as u64)
    }

    /// [`i420_psnr`] with this kernel table.
    pub fn i420_psnr(&self, a: &I420<'_>, b: &I420<'_>) -> crate::Result<f64> {
        a.check_same_size(b)?;
        let sse: u64 = a
            .planes()
            .iter()
            .zip(b.planes())
            .map(|(pa, pb)| {
                self.sum_square_error_plane(
                    pa.data(),
                    pa.stride(),
                    pb.data(),
                    pb.stride(),
                    pa.width(),
                    pa.height(),
                )
            })
            .sum();
        Ok(sum_square_error_to_psnr(sse, a.sample_count() as u64))
    }
}
