//! DJB2 buffer hashing.
//!
//! ```rust
//! use planecmp::{hash_djb2, DJB2_SEED};
//!
//! assert_eq!(hash_djb2(b"", DJB2_SEED), DJB2_SEED);
//! assert_eq!(hash_djb2(b"a", DJB2_SEED), DJB2_SEED * 33 + 97);
//! ```

use crate::simd::Kernels;

/// Conventional DJB2 starting value.
pub const DJB2_SEED: u32 = 5381;

/// Hash `data` with the DJB2 recurrence `hash = hash * 33 + byte`.
///
/// Wraps at 32 bits. An empty buffer returns `seed` unchanged. The result is
/// the same on every dispatch path and for every starting alignment.
pub fn hash_djb2(data: &[u8], seed: u32) -> u32 {
    Kernels::current().hash_djb2(data, seed)
}

/// Hash the visible pixels of a strided plane, row by row.
///
/// Padding bytes between `width` and `stride` do not participate; the result
/// equals [`hash_djb2`] over the packed rows.
pub fn hash_djb2_plane(data: &[u8], stride: usize, width: usize, height: usize, seed: u32) -> u32 {
    hash_plane_with(&Kernels::current(), data, stride, width, height, seed)
}

pub(crate) fn hash_plane_with(
    kernels: &Kernels,
    data: &[u8],
    stride: usize,
    width: usize,
    height: usize,
    seed: u32,
) -> u32 {
    debug_assert!(stride >= width, "stride {stride} < width {width}");
    if width == 0 || height == 0 {
        return seed;
    }
    if stride == width {
        return kernels.hash_djb2(&data[..width * height], seed);
    }
    (0..height).fold(seed, |hash, y| {
        kernels.hash_djb2(&data[y * stride..y * stride + width], hash)
    })
}
