//! Scalar reference kernels.
//!
//! These define the results every vectorized kernel must reproduce exactly.
//! They are always compiled, with or without the `simd` feature.

use super::WindowSums;

/// DJB2 left fold: `hash = hash * 33 + byte`, wrapping at 32 bits.
#[inline]
pub fn hash_djb2(data: &[u8], seed: u32) -> u32 {
    data.iter()
        .fold(seed, |hash, &b| hash.wrapping_mul(33).wrapping_add(b as u32))
}

/// Sum of squared byte differences over the common length of `a` and `b`.
#[inline]
pub fn sum_square_error(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let diff = x as i32 - y as i32;
            (diff * diff) as u64
        })
        .sum()
}

/// Moments of an 8x8 window anchored at the start of `a` and `b`.
pub fn window_sums_8x8(a: &[u8], stride_a: usize, b: &[u8], stride_b: usize) -> WindowSums {
    window_sums(a, stride_a, b, stride_b, 8, 8)
}

/// Moments of a `width x height` window anchored at the start of `a` and `b`.
///
/// Used directly for frames smaller than a full window.
pub fn window_sums(
    a: &[u8],
    stride_a: usize,
    b: &[u8],
    stride_b: usize,
    width: usize,
    height: usize,
) -> WindowSums {
    let mut sums = WindowSums::default();
    for y in 0..height {
        let row_a = &a[y * stride_a..y * stride_a + width];
        let row_b = &b[y * stride_b..y * stride_b + width];
        for (&pa, &pb) in row_a.iter().zip(row_b) {
            let pa = pa as u32;
            let pb = pb as u32;
            sums.sum_a += pa;
            sums.sum_b += pb;
            sums.sum_sq_a += pa * pa;
            sums.sum_sq_b += pb * pb;
            sums.sum_axb += pa * pb;
        }
    }
    sums
}
